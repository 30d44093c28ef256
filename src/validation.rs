use crate::error::{AppError, Result};
use uuid::Uuid;

/// Largest amount the ledger will hold or move, in minor currency units.
pub const MAX_LEDGER_AMOUNT: i64 = 1_000_000_000_000;
/// Smallest amount an operation may move.
pub const MIN_AMOUNT: i64 = 1;
pub const MIN_PROMOCODE_LENGTH: usize = 4;
pub const MAX_PROMOCODE_LENGTH: usize = 100;
/// Upper bound on admin-chosen usage caps.
pub const MAX_PROMOCODE_USES: i32 = 1_000_000;

/// Checks that an amount is positive and within the ledger-wide maximum.
pub fn validate_amount(amount: i64) -> Result<()> {
    if amount < MIN_AMOUNT {
        return Err(AppError::Validation("amount must be positive".to_string()));
    }
    if amount > MAX_LEDGER_AMOUNT {
        return Err(AppError::Validation(
            "amount exceeds maximum allowed".to_string(),
        ));
    }
    Ok(())
}

/// User ids are Keycloak subjects: canonical lowercase hyphenated UUIDs.
pub fn validate_user_id(user_id: &str) -> Result<()> {
    if user_id.is_empty() {
        return Err(AppError::Validation("user ID cannot be empty".to_string()));
    }
    let parsed = Uuid::try_parse(user_id)
        .map_err(|_| AppError::Validation("user ID must be a valid UUID".to_string()))?;
    if parsed.as_hyphenated().to_string() != user_id {
        return Err(AppError::Validation(
            "user ID must be a canonical lowercase UUID".to_string(),
        ));
    }
    Ok(())
}

/// Promocodes are 4..=100 alphanumeric characters.
pub fn validate_promo_code(code: &str) -> Result<()> {
    if code.is_empty() {
        return Err(AppError::Validation(
            "promocode cannot be empty".to_string(),
        ));
    }
    let len = code.chars().count();
    if !(MIN_PROMOCODE_LENGTH..=MAX_PROMOCODE_LENGTH).contains(&len) {
        return Err(AppError::Validation(format!(
            "promocode length must be between {} and {} characters",
            MIN_PROMOCODE_LENGTH, MAX_PROMOCODE_LENGTH
        )));
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::Validation(
            "promocode must contain only alphanumeric characters".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_booking_id(booking_id: i64) -> Result<()> {
    if booking_id <= 0 {
        return Err(AppError::Validation(
            "booking ID must be positive".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_max_uses(max_uses: i32) -> Result<()> {
    if !(1..=MAX_PROMOCODE_USES).contains(&max_uses) {
        return Err(AppError::Validation(format!(
            "max_uses must be between 1 and {}",
            MAX_PROMOCODE_USES
        )));
    }
    Ok(())
}

/// Adds `amount` to a balance, rejecting negative amounts and results above
/// the ledger maximum. Overflow is a business failure, never a wrap.
pub fn checked_credit(current: i64, amount: i64) -> Result<i64> {
    if amount < 0 {
        return Err(AppError::Validation("amount must be positive".to_string()));
    }
    match current.checked_add(amount) {
        Some(next) if next <= MAX_LEDGER_AMOUNT => Ok(next),
        _ => Err(AppError::Validation(
            "balance would exceed maximum allowed value".to_string(),
        )),
    }
}

/// Subtracts `amount` from a balance; a result below zero is an
/// insufficient-funds failure.
pub fn checked_debit(current: i64, amount: i64) -> Result<i64> {
    if amount < 0 {
        return Err(AppError::Validation("amount must be positive".to_string()));
    }
    if current < amount {
        return Err(AppError::Validation("insufficient funds".to_string()));
    }
    Ok(current - amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_amount_bounds() {
        assert!(validate_amount(1).is_ok());
        assert!(validate_amount(MAX_LEDGER_AMOUNT).is_ok());
        assert!(validate_amount(0).is_err());
        assert!(validate_amount(-5).is_err());
        assert!(validate_amount(MAX_LEDGER_AMOUNT + 1).is_err());
    }

    #[test]
    fn test_validate_user_id() {
        assert!(validate_user_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_user_id("").is_err());
        assert!(validate_user_id("not-a-uuid").is_err());
        // Uppercase and braced forms parse as UUIDs but are not canonical.
        assert!(validate_user_id("550E8400-E29B-41D4-A716-446655440000").is_err());
        assert!(validate_user_id("{550e8400-e29b-41d4-a716-446655440000}").is_err());
    }

    #[test]
    fn test_validate_promo_code() {
        assert!(validate_promo_code("SUMMER2024").is_ok());
        assert!(validate_promo_code("ab1234cd5678ef90").is_ok());
        assert!(validate_promo_code("").is_err());
        assert!(validate_promo_code("abc").is_err());
        assert!(validate_promo_code(&"x".repeat(101)).is_err());
        assert!(validate_promo_code("bad code").is_err());
        assert!(validate_promo_code("code-1").is_err());
    }

    #[test]
    fn test_validate_booking_id() {
        assert!(validate_booking_id(1).is_ok());
        assert!(validate_booking_id(0).is_err());
        assert!(validate_booking_id(-7).is_err());
    }

    #[test]
    fn test_validate_max_uses() {
        assert!(validate_max_uses(1).is_ok());
        assert!(validate_max_uses(MAX_PROMOCODE_USES).is_ok());
        assert!(validate_max_uses(0).is_err());
        assert!(validate_max_uses(MAX_PROMOCODE_USES + 1).is_err());
    }

    #[test]
    fn test_checked_credit() {
        assert_eq!(checked_credit(100, 50).unwrap(), 150);
        assert_eq!(checked_credit(0, 0).unwrap(), 0);
        assert!(checked_credit(MAX_LEDGER_AMOUNT, 1).is_err());
        assert!(checked_credit(100, -1).is_err());
        // i64 overflow must surface as a failure, not wrap.
        assert!(checked_credit(i64::MAX, 1).is_err());
    }

    #[test]
    fn test_checked_debit() {
        assert_eq!(checked_debit(100, 50).unwrap(), 50);
        assert_eq!(checked_debit(100, 100).unwrap(), 0);
        assert!(checked_debit(100, 101).is_err());
        assert!(checked_debit(100, -1).is_err());
    }
}
