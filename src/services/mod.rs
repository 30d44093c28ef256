pub mod ledger_service;
pub mod promocode_service;

pub use ledger_service::LedgerService;
pub use promocode_service::{CreatePromocodeRequest, PromocodeService};
