// handlers/customers/mod.rs - Customer account handlers
//
// Provisioning creates the HestiaCP user, website, DNS record and
// optional database in one call. The remaining handlers operate on
// accounts that already exist.

use axum::extract::{rejection::PathRejection, Path};
use uuid::Uuid;

use crate::error::ApiError;

pub mod create;    // POST /api/customers
pub mod delete;    // DELETE /api/customers/:id
pub mod lifecycle; // POST /api/customers/:id/{suspend,unsuspend,billing/extend}
pub mod list;      // GET /api/customers
pub mod show;      // GET /api/customers/:id

pub use create::customer_create;
pub use delete::customer_delete;
pub use lifecycle::{customer_extend_billing, customer_suspend, customer_unsuspend};
pub use list::customer_list;
pub use show::customer_show;

/// Path ids must be UUIDs; anything else is a 400 in the usual envelope
pub(crate) fn customer_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|rejection| ApiError::bad_request(format!("Invalid customer id: {}", rejection.body_text())))
}
