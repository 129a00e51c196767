// handlers/customers/list.rs - GET /api/customers handler

use axum::extract::State;

use crate::database::models::Account;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;

/// Every account, newest first. Stored passwords are never serialized.
pub async fn customer_list(State(state): State<AppState>) -> ApiResult<Vec<Account>> {
    let accounts = state.accounts.list().await?;
    Ok(ApiResponse::success(accounts))
}
