use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Kind of balance-affecting event a ledger row documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Debit taken from the paying side of a transfer.
    Charge,
    /// Credit given to the receiving side of a booking settlement.
    Payment,
    /// Credit returned to the driver when a booking is refunded.
    Refund,
    /// Credit received by redeeming a promocode.
    PromocodeActivate,
    /// Debit spent minting a promocode.
    PromocodeGenerate,
}

impl TransactionType {
    /// True for types whose rows carry a negative amount.
    pub fn is_debit(&self) -> bool {
        matches!(self, TransactionType::Charge | TransactionType::PromocodeGenerate)
    }
}

/// Outcome recorded with a transaction row. Only terminal outcomes are
/// persisted; failed attempts never produce rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Completed,
    Failed,
}

/// An immutable row of the append-only transaction log.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TransactionRecord {
    pub id: i64,
    pub booking_id: Option<i64>,
    pub user_id: String,
    /// Signed amount in minor units: negative for debits, positive for credits.
    pub amount: i64,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Result of a charge or refund operation.
///
/// Business-rule failures (bad input, insufficient funds) come back as a
/// `failed` outcome with a human-readable message, not as an error; the
/// caller must branch on `status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionOutcome {
    pub transaction_id: Option<i64>,
    pub status: TransactionStatus,
    pub message: String,
}

impl TransactionOutcome {
    pub fn completed(transaction_id: i64, message: impl Into<String>) -> Self {
        Self {
            transaction_id: Some(transaction_id),
            status: TransactionStatus::Completed,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            transaction_id: None,
            status: TransactionStatus::Failed,
            message: message.into(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == TransactionStatus::Completed
    }
}
