use crate::error::{AppError, Result};
use crate::models::{Balance, TransactionOutcome, TransactionRecord, TransactionType};
use crate::observability::mask_user_id;
use crate::repositories::{BalanceRepository, TransactionRepository};
use crate::validation;
use sqlx::{PgConnection, PgPool};
use tracing::{info, warn};

/// Limit applied to transaction listings when the caller passes none.
const DEFAULT_TRANSACTIONS_LIMIT: i64 = 50;
const MAX_TRANSACTIONS_LIMIT: i64 = 500;

/// Orchestrates the money-moving ledger operations: booking charges,
/// refunds, balance lookups and the transaction history.
///
/// Every operation runs inside a single database transaction; all balance
/// rows it touches are read under row locks, and balance writes commit
/// together with the log rows that document them, or not at all.
pub struct LedgerService {
    pool: PgPool,
    balances: BalanceRepository,
    transactions: TransactionRepository,
}

impl LedgerService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            balances: BalanceRepository::new(pool.clone()),
            transactions: TransactionRepository::new(pool.clone()),
            pool,
        }
    }

    /// Returns the user's balance, creating a zero row on first lookup.
    pub async fn get_balance(&self, user_id: &str) -> Result<Balance> {
        validation::validate_user_id(user_id)?;
        self.balances.get_or_create(user_id).await
    }

    /// Returns the user's transaction history, most-recent-first.
    pub async fn get_transactions(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TransactionRecord>> {
        validation::validate_user_id(user_id)?;

        let limit = if limit <= 0 {
            DEFAULT_TRANSACTIONS_LIMIT
        } else {
            limit.min(MAX_TRANSACTIONS_LIMIT)
        };
        let offset = offset.max(0);

        self.transactions.list_by_user(user_id, limit, offset).await
    }

    /// Settles a confirmed booking: moves `amount` from the driver to the
    /// owner and writes the charge/payment row pair.
    ///
    /// Validation and business-rule failures come back as a `failed`
    /// outcome, not an error; only storage failures propagate as `AppError`.
    pub async fn process_transaction(
        &self,
        booking_id: i64,
        driver_id: &str,
        owner_id: &str,
        amount: i64,
    ) -> Result<TransactionOutcome> {
        if validation::validate_amount(amount).is_err() {
            return Ok(TransactionOutcome::failed("invalid amount"));
        }
        if validation::validate_user_id(driver_id).is_err() {
            return Ok(TransactionOutcome::failed("invalid driver ID"));
        }
        if validation::validate_user_id(owner_id).is_err() {
            return Ok(TransactionOutcome::failed("invalid owner ID"));
        }
        if validation::validate_booking_id(booking_id).is_err() {
            return Ok(TransactionOutcome::failed("invalid booking ID"));
        }
        if driver_id == owner_id {
            return Ok(TransactionOutcome::failed("driver and owner must be different"));
        }

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let (driver_balance, owner_balance) =
            lock_balance_pair(&mut tx, driver_id, owner_id).await?;

        if driver_balance < amount {
            tx.rollback().await.map_err(AppError::Database)?;
            return Ok(TransactionOutcome::failed("insufficient funds"));
        }

        let new_driver_balance = match validation::checked_debit(driver_balance, amount) {
            Ok(value) => value,
            Err(err) => {
                tx.rollback().await.map_err(AppError::Database)?;
                return Ok(TransactionOutcome::failed(err.public_message()));
            }
        };
        let new_owner_balance = match validation::checked_credit(owner_balance, amount) {
            Ok(value) => value,
            Err(_) => {
                tx.rollback().await.map_err(AppError::Database)?;
                return Ok(TransactionOutcome::failed("transaction failed"));
            }
        };

        BalanceRepository::set_amount(&mut tx, driver_id, new_driver_balance).await?;
        BalanceRepository::set_amount(&mut tx, owner_id, new_owner_balance).await?;

        let charge_id = TransactionRepository::append(
            &mut tx,
            Some(booking_id),
            driver_id,
            -amount,
            TransactionType::Charge,
            &format!("Charge for booking {}", booking_id),
        )
        .await?;
        TransactionRepository::append(
            &mut tx,
            Some(booking_id),
            owner_id,
            amount,
            TransactionType::Payment,
            &format!("Payment for booking {}", booking_id),
        )
        .await?;

        tx.commit().await.map_err(AppError::Database)?;

        info!(
            booking_id,
            driver = %mask_user_id(driver_id),
            owner = %mask_user_id(owner_id),
            "booking charge settled"
        );
        Ok(TransactionOutcome::completed(
            charge_id,
            "transaction completed successfully",
        ))
    }

    /// Reverses a settled booking: moves `amount` from the owner back to
    /// the driver and writes the refund/chargeback row pair.
    pub async fn process_refund(
        &self,
        booking_id: i64,
        driver_id: &str,
        owner_id: &str,
        amount: i64,
    ) -> Result<TransactionOutcome> {
        if validation::validate_amount(amount).is_err() {
            return Ok(TransactionOutcome::failed("invalid amount"));
        }
        if validation::validate_user_id(driver_id).is_err() {
            return Ok(TransactionOutcome::failed("invalid driver ID"));
        }
        if validation::validate_user_id(owner_id).is_err() {
            return Ok(TransactionOutcome::failed("invalid owner ID"));
        }
        if validation::validate_booking_id(booking_id).is_err() {
            return Ok(TransactionOutcome::failed("invalid booking ID"));
        }
        if driver_id == owner_id {
            return Ok(TransactionOutcome::failed("driver and owner must be different"));
        }

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let (driver_balance, owner_balance) =
            lock_balance_pair(&mut tx, driver_id, owner_id).await?;

        if owner_balance < amount {
            tx.rollback().await.map_err(AppError::Database)?;
            warn!(
                booking_id,
                owner = %mask_user_id(owner_id),
                "refund rejected: owner balance too low"
            );
            return Ok(TransactionOutcome::failed(
                "owner has insufficient funds for refund",
            ));
        }

        let new_owner_balance = match validation::checked_debit(owner_balance, amount) {
            Ok(value) => value,
            Err(err) => {
                tx.rollback().await.map_err(AppError::Database)?;
                return Ok(TransactionOutcome::failed(err.public_message()));
            }
        };
        let new_driver_balance = match validation::checked_credit(driver_balance, amount) {
            Ok(value) => value,
            Err(_) => {
                tx.rollback().await.map_err(AppError::Database)?;
                return Ok(TransactionOutcome::failed("refund failed"));
            }
        };

        BalanceRepository::set_amount(&mut tx, owner_id, new_owner_balance).await?;
        BalanceRepository::set_amount(&mut tx, driver_id, new_driver_balance).await?;

        let refund_id = TransactionRepository::append(
            &mut tx,
            Some(booking_id),
            driver_id,
            amount,
            TransactionType::Refund,
            &format!("Refund for booking {}", booking_id),
        )
        .await?;
        TransactionRepository::append(
            &mut tx,
            Some(booking_id),
            owner_id,
            -amount,
            TransactionType::Charge,
            &format!("Chargeback for booking {} refund", booking_id),
        )
        .await?;

        tx.commit().await.map_err(AppError::Database)?;

        info!(
            booking_id,
            driver = %mask_user_id(driver_id),
            owner = %mask_user_id(owner_id),
            "booking refund settled"
        );
        Ok(TransactionOutcome::completed(
            refund_id,
            "refund completed successfully",
        ))
    }

    /// Ledger consistency check: the user's balance equals the signed sum
    /// of their transaction rows, provided all funds entered through ledger
    /// operations.
    pub async fn verify_user_balance(&self, user_id: &str) -> Result<bool> {
        validation::validate_user_id(user_id)?;

        let balance = self
            .balances
            .find(user_id)
            .await?
            .map(|b| b.amount)
            .unwrap_or(0);
        let sum = self.transactions.sum_for_user(user_id).await?;

        Ok(balance == sum)
    }
}

/// Locks both balance rows in lexicographic user-id order, creating absent
/// rows, and returns the amounts as `(left, right)`. The total order is
/// independent of which party pays, so charges and refunds racing on the
/// same pair of users cannot deadlock.
async fn lock_balance_pair(
    conn: &mut PgConnection,
    left: &str,
    right: &str,
) -> Result<(i64, i64)> {
    if left <= right {
        let left_amount = BalanceRepository::lock_or_create(conn, left).await?;
        let right_amount = BalanceRepository::lock_or_create(conn, right).await?;
        Ok((left_amount, right_amount))
    } else {
        let right_amount = BalanceRepository::lock_or_create(conn, right).await?;
        let left_amount = BalanceRepository::lock_or_create(conn, left).await?;
        Ok((left_amount, right_amount))
    }
}
