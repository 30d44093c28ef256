pub mod balance;
pub mod promocode;
pub mod transaction;
pub mod user;

pub use balance::Balance;
pub use promocode::{IssuedPromocode, Promocode, PromocodeInfo};
pub use transaction::{TransactionOutcome, TransactionRecord, TransactionStatus, TransactionType};
pub use user::{Caller, Role};
