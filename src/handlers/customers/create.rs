// handlers/customers/create.rs - POST /api/customers handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::middleware::{ApiResponse, ApiResult};
use crate::provisioning::{ProvisioningOutcome, ProvisioningRequest};
use crate::server::AppState;

/**
 * Provision a new customer account.
 *
 * Validation failures answer 400 with per-field details before anything
 * remote is touched. Any later failure answers 500 with the underlying
 * message; resources created before the failure are rolled back, and
 * whatever could not be removed is listed under `details.orphans`.
 */
pub async fn customer_create(
    State(state): State<AppState>,
    payload: Result<Json<ProvisioningRequest>, JsonRejection>,
) -> ApiResult<ProvisioningOutcome> {
    let Json(request) = payload?;
    let outcome = state.provisioner.provision(&request).await?;
    Ok(ApiResponse::created(outcome))
}
