// handlers/customers/lifecycle.rs - suspend, unsuspend and billing handlers

use axum::extract::{
    rejection::{JsonRejection, PathRejection},
    Path, State,
};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use super::customer_id;
use crate::database::models::Account;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;

/// POST /api/customers/:id/suspend
pub async fn customer_suspend(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Account> {
    let id = customer_id(path)?;
    Ok(ApiResponse::success(state.accounts.suspend(id).await?))
}

/// POST /api/customers/:id/unsuspend
pub async fn customer_unsuspend(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Account> {
    let id = customer_id(path)?;
    Ok(ApiResponse::success(state.accounts.unsuspend(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct ExtendBilling {
    pub months: u32,
}

/// POST /api/customers/:id/billing/extend with `{ "months": n }`
pub async fn customer_extend_billing(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ExtendBilling>, JsonRejection>,
) -> ApiResult<Account> {
    let id = customer_id(path)?;
    let Json(body) = payload?;
    Ok(ApiResponse::success(state.accounts.extend_billing(id, body.months).await?))
}
