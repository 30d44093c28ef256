pub mod logging;

pub use logging::{init_logging, mask_amount, mask_sensitive, mask_user_id, LogConfig, LogFormat};
