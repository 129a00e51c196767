use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::AuditOutcome;

pub mod actions {
    pub const PROVISION: &str = "customer.provision";
    pub const SUSPEND: &str = "customer.suspend";
    pub const UNSUSPEND: &str = "customer.unsuspend";
    pub const EXTEND_BILLING: &str = "customer.billing.extend";
    pub const DELETE: &str = "customer.delete";
}

/// One row of the append-only audit trail
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: Uuid,
    pub action: String,
    pub outcome: String,
    pub account_id: Option<Uuid>,
    pub subject: String,
    pub message: String,
    pub details: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub action: &'static str,
    pub outcome: AuditOutcome,
    pub account_id: Option<Uuid>,
    pub subject: String,
    pub message: String,
    pub details: Value,
}

impl NewAuditEntry {
    pub fn success(action: &'static str, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            action,
            outcome: AuditOutcome::Success,
            account_id: None,
            subject: subject.into(),
            message: message.into(),
            details: Value::Object(Default::default()),
        }
    }

    pub fn failure(action: &'static str, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            outcome: AuditOutcome::Failure,
            ..Self::success(action, subject, message)
        }
    }

    pub fn account(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }

    pub fn details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}
