use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const DEFAULT_CURRENCY: &str = "USD";

/// A user's spendable ledger balance in minor currency units.
///
/// One row per user, created lazily with a zero amount on first touch.
/// Committed amounts are never negative.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Balance {
    pub user_id: String,
    pub amount: i64,
    pub currency: String,
    pub updated_at: DateTime<Utc>,
}

impl Balance {
    /// Creates a zero balance in the ledger-wide currency.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            amount: 0,
            currency: DEFAULT_CURRENCY.to_string(),
            updated_at: Utc::now(),
        }
    }

    pub fn has_sufficient_funds(&self, amount: i64) -> bool {
        self.amount >= amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_balance_is_zero() {
        let balance = Balance::new("550e8400-e29b-41d4-a716-446655440000");
        assert_eq!(balance.amount, 0);
        assert_eq!(balance.currency, DEFAULT_CURRENCY);
    }

    #[test]
    fn test_has_sufficient_funds() {
        let mut balance = Balance::new("550e8400-e29b-41d4-a716-446655440000");
        balance.amount = 500;
        assert!(balance.has_sufficient_funds(500));
        assert!(balance.has_sufficient_funds(0));
        assert!(!balance.has_sufficient_funds(501));
    }

    #[test]
    fn test_serialization() {
        let balance = Balance::new("550e8400-e29b-41d4-a716-446655440000");
        let json = serde_json::to_string(&balance).unwrap();
        let deserialized: Balance = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.user_id, balance.user_id);
        assert_eq!(deserialized.amount, 0);
    }
}
