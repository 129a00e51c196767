pub mod account;
pub mod audit;
pub mod customer_database;
pub mod website;

use serde::Serialize;

pub use account::{Account, NewAccount};
pub use audit::{AuditEntry, NewAuditEntry};
pub use customer_database::{CustomerDatabase, NewCustomerDatabase};
pub use website::{NewWebsite, Website};

/// Everything written for one provisioned customer, in a single transaction
#[derive(Debug, Clone)]
pub struct NewAccountGraph {
    pub account: NewAccount,
    pub website: NewWebsite,
    pub database: Option<NewCustomerDatabase>,
}

/// An account with its child records
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDetail {
    #[serde(flatten)]
    pub account: Account,
    pub websites: Vec<Website>,
    pub databases: Vec<CustomerDatabase>,
}
