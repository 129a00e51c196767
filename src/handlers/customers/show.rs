// handlers/customers/show.rs - GET /api/customers/:id handler

use axum::extract::{rejection::PathRejection, Path, State};
use uuid::Uuid;

use super::customer_id;
use crate::database::models::AccountDetail;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;

pub async fn customer_show(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<AccountDetail> {
    let id = customer_id(path)?;
    let detail = state.accounts.get(id).await?;
    Ok(ApiResponse::success(detail))
}
