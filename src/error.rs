use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// Unified error type for the payment ledger.
///
/// Business failures (validation, not-found, conflict, forbidden) are normal
/// negative outcomes the caller branches on; infrastructure failures carry
/// context for logging and are sanitized before leaving the service.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Bounded random code generation ran out of attempts.
    #[error("failed to generate unique code")]
    CodeGeneration,

    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("internal error: {0}")]
    Internal(anyhow::Error),
}

impl AppError {
    /// True for failures a caller is expected to handle as a normal outcome.
    pub fn is_business(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_)
                | AppError::NotFound(_)
                | AppError::Conflict(_)
                | AppError::Forbidden(_)
        )
    }

    /// Message safe to surface to an end user. Infrastructure errors never
    /// leak raw driver text.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::Forbidden(msg) => msg.clone(),
            AppError::CodeGeneration => "failed to generate unique code".to_string(),
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => {
                "internal error".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_errors_are_flagged() {
        assert!(AppError::Validation("bad amount".into()).is_business());
        assert!(AppError::NotFound("promocode not found".into()).is_business());
        assert!(AppError::Conflict("promocode already exists".into()).is_business());
        assert!(AppError::Forbidden("admin access required".into()).is_business());
    }

    #[test]
    fn test_infrastructure_errors_are_not_business() {
        assert!(!AppError::Database(sqlx::Error::PoolClosed).is_business());
        assert!(!AppError::CodeGeneration.is_business());
        assert!(!AppError::Internal(anyhow::anyhow!("boom")).is_business());
    }

    #[test]
    fn test_public_message_sanitizes_internal_errors() {
        let err = AppError::Database(sqlx::Error::PoolClosed);
        assert_eq!(err.public_message(), "internal error");

        let err = AppError::Validation("insufficient funds".into());
        assert_eq!(err.public_message(), "insufficient funds");
    }
}
