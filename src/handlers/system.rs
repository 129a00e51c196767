// handlers/system.rs - GET /api/system/status handler

use axum::extract::State;

use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;
use crate::services::{collect_system_status, SystemStatus};

/// Raw CPU, memory, disk and network probes from the HestiaCP host.
/// Individual probe failures are reported inline, not as an error.
pub async fn system_status(State(state): State<AppState>) -> ApiResult<SystemStatus> {
    Ok(ApiResponse::success(collect_system_status(state.hestia.as_ref()).await))
}
