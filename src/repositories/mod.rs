pub mod balance_repository;
pub mod promocode_repository;
pub mod transaction_repository;

pub use balance_repository::BalanceRepository;
pub use promocode_repository::PromocodeRepository;
pub use transaction_repository::TransactionRepository;

use sqlx::PgPool;

/// Database connection pool type alias.
pub type DbPool = PgPool;
