pub mod account_service;
pub mod status;

pub use account_service::{AccountError, AccountService};
pub use status::{collect as collect_system_status, SystemStatus};
