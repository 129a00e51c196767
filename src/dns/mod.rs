//! aaPanel DNS API client.
//!
//! Requests are form POSTs to `<base>/<version>/dns/record/<op>`. Each carries
//! `request_time` (unix seconds) and `request_token = md5(request_time + md5(api_key))`
//! alongside the operation's own fields.

use std::time::Duration;

use async_trait::async_trait;
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::config::DnsConfig;
use crate::hestia::error::{transport_kind, TransportKind};

#[derive(Debug, Clone, Error)]
pub enum DnsError {
    #[error("DNS provider unreachable ({kind:?}): {message}")]
    Transport { kind: TransportKind, message: String },

    #[error("DNS provider returned HTTP {0}")]
    Http(u16),

    #[error("DNS provider rejected the request: {0}")]
    Rejected(String),

    #[error("Unexpected DNS provider reply: {0}")]
    Unexpected(String),
}

impl From<reqwest::Error> for DnsError {
    fn from(err: reqwest::Error) -> Self {
        DnsError::Transport {
            kind: transport_kind(&err),
            message: err.to_string(),
        }
    }
}

/// Handle to a record that was created, enough to remove it again
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecordRef {
    pub zone: String,
    pub host: String,
    pub record_type: String,
    pub value: String,
    pub id: Option<String>,
}

#[async_trait]
pub trait DnsApi: Send + Sync {
    async fn add_a_record(&self, zone: &str, host: &str, ip: &str, ttl: u32) -> Result<DnsRecordRef, DnsError>;

    async fn remove_record(&self, record: &DnsRecordRef) -> Result<(), DnsError>;
}

/// Token for one request: `md5(timestamp + md5(api_key))`, lowercase hex
pub fn request_token(request_time: i64, api_key: &str) -> String {
    let key_digest = format!("{:x}", Md5::digest(api_key.as_bytes()));
    let mut hasher = Md5::new();
    hasher.update(request_time.to_string().as_bytes());
    hasher.update(key_digest.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Deserialize)]
struct ProviderReply {
    status: bool,
    #[serde(default)]
    msg: Value,
    #[serde(default)]
    data: Option<Value>,
}

pub struct AaPanelDns {
    http: reqwest::Client,
    base: Url,
    version: String,
    api_key: String,
}

impl AaPanelDns {
    pub fn new(base: Url, version: impl Into<String>, api_key: impl Into<String>, timeout: Duration, accept_invalid_certs: bool) -> Result<Self, DnsError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;

        Ok(Self {
            http,
            base,
            version: version.into(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &DnsConfig) -> Result<Self, DnsError> {
        let base = Url::parse(&config.base_url())
            .map_err(|e| DnsError::Unexpected(format!("invalid DNS provider URL: {}", e)))?;
        if config.api_key.is_empty() {
            warn!("No aaPanel API key configured; DNS records will be rejected");
        }
        Self::new(
            base,
            config.api_version.clone(),
            config.api_key.clone(),
            Duration::from_secs(config.timeout_secs),
            config.accept_invalid_certs,
        )
    }

    fn operation_url(&self, op: &str) -> Result<Url, DnsError> {
        self.base
            .join(&format!("{}/dns/record/{}", self.version, op))
            .map_err(|e| DnsError::Unexpected(format!("invalid operation path: {}", e)))
    }

    async fn post(&self, op: &str, params: Vec<(&str, String)>) -> Result<Option<Value>, DnsError> {
        let request_time = chrono::Utc::now().timestamp();
        let mut form: Vec<(&str, String)> = vec![
            ("request_time", request_time.to_string()),
            ("request_token", request_token(request_time, &self.api_key)),
        ];
        form.extend(params);

        debug!("aaPanel DNS {}", op);

        let response = self.http.post(self.operation_url(op)?).form(&form).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DnsError::Http(status.as_u16()));
        }

        let body = response.text().await?;
        let reply: ProviderReply = serde_json::from_str(&body)
            .map_err(|e| DnsError::Unexpected(format!("{}: {}", e, body.chars().take(200).collect::<String>())))?;

        if !reply.status {
            let message = match reply.msg {
                Value::String(s) => s,
                Value::Null => "no reason given".to_string(),
                other => other.to_string(),
            };
            return Err(DnsError::Rejected(message));
        }

        Ok(reply.data)
    }
}

#[async_trait]
impl DnsApi for AaPanelDns {
    async fn add_a_record(&self, zone: &str, host: &str, ip: &str, ttl: u32) -> Result<DnsRecordRef, DnsError> {
        let data = self
            .post(
                "add",
                vec![
                    ("domain", zone.to_string()),
                    ("host", host.to_string()),
                    ("type", "A".to_string()),
                    ("value", ip.to_string()),
                    ("ttl", ttl.to_string()),
                ],
            )
            .await?;

        let id = data.as_ref().and_then(|d| d.get("id")).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });

        Ok(DnsRecordRef {
            zone: zone.to_string(),
            host: host.to_string(),
            record_type: "A".to_string(),
            value: ip.to_string(),
            id,
        })
    }

    async fn remove_record(&self, record: &DnsRecordRef) -> Result<(), DnsError> {
        let mut params = vec![
            ("domain", record.zone.clone()),
            ("host", record.host.clone()),
            ("type", record.record_type.clone()),
            ("value", record.value.clone()),
        ];
        if let Some(id) = &record.id {
            params.push(("id", id.clone()));
        }
        self.post("delete", params).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Path, routing::post, Form, Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn token_is_md5_of_time_and_key_digest() {
        // md5("") = d41d8cd98f00b204e9800998ecf8427e
        let expected = format!("{:x}", Md5::digest(b"1700000000d41d8cd98f00b204e9800998ecf8427e"));
        assert_eq!(request_token(1_700_000_000, ""), expected);
        assert_eq!(request_token(1_700_000_000, "").len(), 32);
        assert_ne!(request_token(1_700_000_000, "a"), request_token(1_700_000_001, "a"));
    }

    async fn stub() -> Url {
        async fn handle(Path(op): Path<String>, Form(fields): Form<HashMap<String, String>>) -> Json<Value> {
            let time: i64 = fields.get("request_time").and_then(|t| t.parse().ok()).unwrap_or_default();
            if fields.get("request_token") != Some(&request_token(time, "sekret")) {
                return Json(json!({ "status": false, "msg": "signature mismatch" }));
            }
            match (op.as_str(), fields.get("host").map(String::as_str)) {
                ("add", Some("taken")) => Json(json!({ "status": false, "msg": "record exists" })),
                ("add", _) => Json(json!({ "status": true, "msg": "ok", "data": { "id": 42 } })),
                _ => Json(json!({ "status": true, "msg": "deleted" })),
            }
        }

        let app = Router::new().route("/v1/dns/record/:op", post(handle));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{}/", addr)).unwrap()
    }

    #[tokio::test]
    async fn signed_request_creates_record() {
        let base = stub().await;
        let dns = AaPanelDns::new(base, "v1", "sekret", Duration::from_secs(5), false).unwrap();

        let record = dns.add_a_record("example.com", "acme-x1y2z3", "203.0.113.10", 600).await.unwrap();
        assert_eq!(record.id.as_deref(), Some("42"));
        assert_eq!(record.record_type, "A");

        dns.remove_record(&record).await.unwrap();
    }

    #[tokio::test]
    async fn provider_rejection_is_reported() {
        let base = stub().await;
        let dns = AaPanelDns::new(base, "v1", "sekret", Duration::from_secs(5), false).unwrap();

        let err = dns.add_a_record("example.com", "taken", "203.0.113.10", 600).await.unwrap_err();
        assert!(matches!(err, DnsError::Rejected(ref m) if m == "record exists"));
    }

    #[tokio::test]
    async fn wrong_key_fails_signature_check() {
        let base = stub().await;
        let dns = AaPanelDns::new(base, "v1", "wrong", Duration::from_secs(5), false).unwrap();

        let err = dns.add_a_record("example.com", "acme", "203.0.113.10", 600).await.unwrap_err();
        assert!(matches!(err, DnsError::Rejected(_)));
    }
}
