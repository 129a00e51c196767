use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};
use url::Url;

use super::command::HestiaCommand;
use super::error::HestiaError;
use super::reply::Reply;
use super::HestiaApi;
use crate::config::HestiaConfig;

/// Credentials sent as named form fields next to every command
#[derive(Debug, Clone)]
pub enum HestiaCredentials {
    Password { user: String, password: String },
    AccessKey { user: String, access_key: String, secret_key: String },
}

impl HestiaCredentials {
    /// Prefer an access key pair when both halves are configured
    pub fn from_config(config: &HestiaConfig) -> Self {
        match (&config.access_key, &config.secret_key) {
            (Some(access_key), Some(secret_key)) => HestiaCredentials::AccessKey {
                user: config.user.clone(),
                access_key: access_key.clone(),
                secret_key: secret_key.clone(),
            },
            _ => {
                if config.password.is_none() {
                    warn!("No HestiaCP password or access key configured; commands will be rejected");
                }
                HestiaCredentials::Password {
                    user: config.user.clone(),
                    password: config.password.clone().unwrap_or_default(),
                }
            }
        }
    }

    fn form_fields(&self) -> Vec<(String, String)> {
        match self {
            HestiaCredentials::Password { user, password } => vec![
                ("user".to_string(), user.clone()),
                ("password".to_string(), password.clone()),
            ],
            HestiaCredentials::AccessKey { user, access_key, secret_key } => vec![
                ("user".to_string(), user.clone()),
                ("access_key".to_string(), access_key.clone()),
                ("secret_key".to_string(), secret_key.clone()),
            ],
        }
    }
}

/// HTTP client for the HestiaCP command endpoint
pub struct HestiaClient {
    http: reqwest::Client,
    endpoint: Url,
    credentials: HestiaCredentials,
}

impl HestiaClient {
    pub fn new(
        endpoint: Url,
        credentials: HestiaCredentials,
        timeout: Duration,
        accept_invalid_certs: bool,
    ) -> Result<Self, HestiaError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .user_agent(concat!("hestia-panel-rust/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            endpoint,
            credentials,
        })
    }

    pub fn from_config(config: &HestiaConfig) -> Result<Self, HestiaError> {
        let endpoint = Url::parse(&config.api_url())
            .map_err(|e| HestiaError::Unexpected(format!("invalid HestiaCP endpoint: {}", e)))?;

        Self::new(
            endpoint,
            HestiaCredentials::from_config(config),
            Duration::from_secs(config.timeout_secs),
            config.accept_invalid_certs,
        )
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl HestiaApi for HestiaClient {
    async fn invoke(&self, command: HestiaCommand) -> Result<Reply, HestiaError> {
        let mut form = self.credentials.form_fields();
        form.extend(command.form_fields());

        debug!("HestiaCP command {} ({} args)", command.cmd, command.args.len());

        let response = self
            .http
            .post(self.endpoint.clone())
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("HestiaCP command {} failed with HTTP {}", command.cmd, status);
            return Err(HestiaError::Http {
                status: status.as_u16(),
                body: truncate(&body, 512),
            });
        }

        Reply::parse(&body).into_result()
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
