// handlers/customers/delete.rs - DELETE /api/customers/:id handler

use axum::extract::{rejection::PathRejection, Path, State};
use serde_json::{json, Value};
use uuid::Uuid;

use super::customer_id;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;

/**
 * Delete a customer.
 *
 * Removing the HestiaCP user also removes its web domains, mail and
 * databases on the server. The DNS record for the subdomain is left in
 * place.
 */
pub async fn customer_delete(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Value> {
    let id = customer_id(path)?;
    state.accounts.delete(id).await?;
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}
