// HTTP API Error Types
use axum::{extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::database::StoreError;
use crate::hestia::HestiaError;
use crate::provisioning::ProvisionError;
use crate::services::AccountError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },
    InvalidJson(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError {
        message: String,
        details: Option<Value>,
    },

    // 502 Bad Gateway (control plane or DNS provider failed)
    BadGateway {
        message: String,
        details: Option<Value>,
    },

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::ValidationError { .. } => 400,
            ApiError::InvalidJson(_) => 400,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::InternalServerError { .. } => 500,
            ApiError::BadGateway { .. } => 502,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::InvalidJson(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::InternalServerError { message, .. } => message,
            ApiError::BadGateway { message, .. } => message,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError { .. } => "INTERNAL_SERVER_ERROR",
            ApiError::BadGateway { .. } => "BAD_GATEWAY",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to the failure envelope: `{ success: false, error, code, details? }`
    pub fn to_json(&self) -> Value {
        let mut response = json!({
            "success": false,
            "error": self.message(),
            "code": self.error_code()
        });

        let details = match self {
            ApiError::ValidationError { field_errors: Some(fields), .. } => Some(json!(fields)),
            ApiError::InternalServerError { details, .. } | ApiError::BadGateway { details, .. } => details.clone(),
            _ => None,
        };
        if let Some(details) = details {
            response["details"] = details;
        }

        response
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(message: impl Into<String>, field_errors: Option<HashMap<String, String>>) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError {
            message: message.into(),
            details: None,
        }
    }

    pub fn internal_with_details(message: impl Into<String>, details: Value) -> Self {
        ApiError::InternalServerError {
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn bad_gateway(message: impl Into<String>, details: Option<Value>) -> Self {
        ApiError::BadGateway {
            message: message.into(),
            details,
        }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError
impl From<ProvisionError> for ApiError {
    fn from(err: ProvisionError) -> Self {
        let kind = err.kind();
        match err {
            ProvisionError::Validation(fields) => ApiError::validation_error("Validation failed", Some(fields)),
            ProvisionError::Configuration(msg) => {
                tracing::error!("Provisioning configuration error: {}", msg);
                ApiError::internal_with_details(format!("Configuration error: {}", msg), json!({ "kind": kind }))
            }
            ProvisionError::RemoteAccount(ref source) => ApiError::internal_with_details(
                err.to_string(),
                json!({ "kind": kind, "returncode": source.return_code() }),
            ),
            ProvisionError::RemoteHost { ref source, ref orphans } => ApiError::internal_with_details(
                err.to_string(),
                json!({ "kind": kind, "returncode": source.return_code(), "orphans": orphans }),
            ),
            ProvisionError::Persistence { ref source, ref orphans } => {
                // Don't expose SQL errors to clients
                tracing::error!("Persistence failure during provisioning: {}", source);
                ApiError::internal_with_details(
                    "Failed to save account; remote resources were rolled back",
                    json!({ "kind": kind, "orphans": orphans }),
                )
            }
            ProvisionError::Internal { ref message, ref orphans } => {
                tracing::error!("Internal provisioning error: {}", message);
                ApiError::internal_with_details("Internal error", json!({ "kind": kind, "orphans": orphans }))
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => ApiError::not_found(msg),
            StoreError::Conflict(msg) => ApiError::conflict(msg),
            StoreError::Invalid(msg) => ApiError::bad_request(msg),
            StoreError::ConfigMissing(_) | StoreError::InvalidDatabaseUrl => {
                tracing::error!("Database misconfigured: {}", err);
                ApiError::service_unavailable("Database is not configured")
            }
            StoreError::Migrate(e) => {
                tracing::error!("Migration error: {}", e);
                ApiError::service_unavailable("Service is being updated, please try again later")
            }
            StoreError::Sqlx(e) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", e);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

impl From<HestiaError> for ApiError {
    fn from(err: HestiaError) -> Self {
        ApiError::bad_gateway(err.to_string(), Some(json!({ "returncode": err.return_code() })))
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::NotFound(id) => ApiError::not_found(format!("Customer {} not found", id)),
            AccountError::Remote(e) => e.into(),
            AccountError::Store(e) => e.into(),
            AccountError::Invalid(msg) => ApiError::bad_request(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_json(rejection.body_text())
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hestia::error::E_EXISTS;

    #[test]
    fn validation_error_lists_fields_as_details() {
        let mut fields = HashMap::new();
        fields.insert("email".to_string(), "Email address is not valid".to_string());
        let err = ApiError::from(ProvisionError::Validation(fields));

        assert_eq!(err.status_code(), 400);
        let body = err.to_json();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Validation failed");
        assert_eq!(body["details"]["email"], "Email address is not valid");
    }

    #[test]
    fn remote_failures_are_500_with_the_remote_message() {
        let err = ApiError::from(ProvisionError::RemoteAccount(HestiaError::remote(E_EXISTS)));
        assert_eq!(err.status_code(), 500);
        let body = err.to_json();
        assert!(body["error"].as_str().unwrap().contains("E_EXISTS"));
        assert_eq!(body["details"]["returncode"], E_EXISTS);
        assert_eq!(body["details"]["kind"], "remote_account");
    }

    #[test]
    fn persistence_failure_hides_sql() {
        let err = ApiError::from(ProvisionError::Persistence {
            source: StoreError::Sqlx(sqlx::Error::PoolTimedOut),
            orphans: Vec::new(),
        });
        assert_eq!(err.status_code(), 500);
        assert!(!err.message().contains("pool"));
    }

    #[test]
    fn store_not_found_maps_to_404() {
        let err = ApiError::from(StoreError::NotFound("account".into()));
        assert_eq!(err.status_code(), 404);
        assert!(err.to_json().get("details").is_none());
    }
}
