use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::WebsiteStatus;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Website {
    pub id: Uuid,
    pub account_id: Uuid,
    pub subdomain: String,
    pub custom_domain: Option<String>,
    pub aliases: Vec<String>,
    pub ssl_enabled: bool,
    pub ssl_forced: bool,
    pub ssl_verified: bool,
    pub dns_configured: bool,
    pub php_version: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewWebsite {
    pub subdomain: String,
    pub custom_domain: Option<String>,
    pub aliases: Vec<String>,
    pub ssl_enabled: bool,
    pub ssl_forced: bool,
    pub dns_configured: bool,
    pub php_version: String,
    pub status: WebsiteStatus,
}
