// handlers/mod.rs - HTTP handlers
//
// Public endpoints live here; customer, catalog and server endpoints
// have their own modules. Every handler answers with the
// `{ success, data }` envelope or an ApiError.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::server::AppState;

pub mod customers; // /api/customers/*
pub mod packages;  // GET /api/packages
pub mod system;    // GET /api/system/status

/// GET / - service banner and endpoint index
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Hestia Panel API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Customer provisioning for HestiaCP hosting",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "customers": "/api/customers[/:id]",
                "lifecycle": "/api/customers/:id/{suspend,unsuspend,billing/extend}",
                "packages": "/api/packages",
                "system": "/api/system/status",
            }
        }
    }))
}

/// GET /health - 200 when the account store answers, 503 otherwise
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
