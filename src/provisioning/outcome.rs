use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::package::ResourceLimits;
use crate::types::{AccountStatus, WebsiteStatus};

pub const INSTRUCTION_TTL: u32 = 3600;

/// Payload returned to the caller after a successful provisioning run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningOutcome {
    pub customer: CustomerSummary,
    pub credentials: Credentials,
    pub website: WebsiteSummary,
    pub database: Option<DatabaseSummary>,
    pub resource_limits: ResourceLimits,
    pub next_steps: NextSteps,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub hestia_username: String,
    pub package: String,
    pub status: AccountStatus,
    pub next_billing_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub hestia_username: String,
    pub hestia_password: String,
    pub panel_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteSummary {
    pub id: Uuid,
    pub subdomain: String,
    pub custom_domain: Option<String>,
    pub aliases: Vec<String>,
    pub url: String,
    pub ssl_enabled: bool,
    pub ssl_forced: bool,
    pub dns_configured: bool,
    pub php_version: String,
    pub status: WebsiteStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSummary {
    pub name: String,
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextSteps {
    pub notes: Vec<String>,
    pub dns_records: Vec<DnsInstruction>,
}

/// A record the customer has to create at their own registrar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsInstruction {
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub value: String,
    pub ttl: u32,
}

/// Records that point a customer-owned domain at the platform
pub fn custom_domain_instructions(custom_domain: &str, subdomain: &str, edge_ip: &str) -> Vec<DnsInstruction> {
    vec![
        DnsInstruction {
            record_type: "CNAME".to_string(),
            name: format!("www.{}", custom_domain),
            value: subdomain.to_string(),
            ttl: INSTRUCTION_TTL,
        },
        DnsInstruction {
            record_type: "A".to_string(),
            name: custom_domain.to_string(),
            value: edge_ip.to_string(),
            ttl: INSTRUCTION_TTL,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instructions_point_www_at_the_subdomain() {
        let records = custom_domain_instructions("acme.test", "acme-co-abc123.example.com", "203.0.113.10");
        assert_eq!(records[0].record_type, "CNAME");
        assert_eq!(records[0].name, "www.acme.test");
        assert_eq!(records[0].value, "acme-co-abc123.example.com");
        assert_eq!(records[1].value, "203.0.113.10");

        let json = serde_json::to_value(&records[0]).unwrap();
        assert_eq!(json["type"], "CNAME");
        assert_eq!(json["ttl"], 3600);
    }
}
