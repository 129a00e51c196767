use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Field name to message, reported back to the caller on a 400
pub type FieldErrors = HashMap<String, String>;

pub const SUPPORTED_PHP_VERSIONS: &[&str] = &["7.4", "8.0", "8.1", "8.2", "8.3"];
pub const DEFAULT_PHP_VERSION: &str = "8.2";

const MAX_NAME_LEN: usize = 100;
const MAX_COMPANY_LEN: usize = 100;
const MAX_PHONE_LEN: usize = 32;

/// Resource tier a customer can order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageId {
    Starter,
    Business,
    Enterprise,
}

impl PackageId {
    pub const ALL: [PackageId; 3] = [PackageId::Starter, PackageId::Business, PackageId::Enterprise];

    pub fn as_str(&self) -> &'static str {
        match self {
            PackageId::Starter => "starter",
            PackageId::Business => "business",
            PackageId::Enterprise => "enterprise",
        }
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "starter" => Ok(PackageId::Starter),
            "business" => Ok(PackageId::Business),
            "enterprise" => Ok(PackageId::Enterprise),
            other => Err(format!("unknown package '{}'", other)),
        }
    }
}

/// Input of the customer provisioning endpoint, as submitted
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub custom_domain: Option<String>,
    #[serde(default)]
    pub package_id: String,
    #[serde(default)]
    pub php_version: Option<String>,
    #[serde(default)]
    pub need_database: bool,
}

/// A request that passed validation, with normalized values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub custom_domain: Option<String>,
    pub package: PackageId,
    pub php_version: String,
    pub need_database: bool,
}

impl ProvisioningRequest {
    /// Check every field and collect all problems before giving up
    pub fn validate(&self) -> Result<ValidRequest, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = self.name.trim().to_string();
        if name.is_empty() {
            errors.insert("name".into(), "Name is required".into());
        } else if name.chars().count() > MAX_NAME_LEN {
            errors.insert("name".into(), format!("Name must be at most {} characters", MAX_NAME_LEN));
        }

        let email = self.email.trim().to_lowercase();
        if email.is_empty() {
            errors.insert("email".into(), "Email is required".into());
        } else if !is_valid_email(&email) {
            errors.insert("email".into(), "Email address is not valid".into());
        }

        let phone = clean_optional(&self.phone);
        if let Some(phone) = &phone {
            let allowed = phone.chars().all(|c| c.is_ascii_digit() || " +-()".contains(c));
            if phone.len() > MAX_PHONE_LEN || !allowed {
                errors.insert("phone".into(), "Phone number is not valid".into());
            }
        }

        let company = clean_optional(&self.company);
        if let Some(company) = &company {
            if company.chars().count() > MAX_COMPANY_LEN {
                errors.insert("company".into(), format!("Company must be at most {} characters", MAX_COMPANY_LEN));
            }
        }

        let custom_domain = clean_optional(&self.custom_domain).map(|d| normalize_domain(&d));
        if let Some(domain) = &custom_domain {
            if !is_valid_hostname(domain) {
                errors.insert("customDomain".into(), "Custom domain is not a valid hostname".into());
            }
        }

        let package = match self.package_id.parse::<PackageId>() {
            Ok(package) => Some(package),
            Err(_) => {
                errors.insert(
                    "packageId".into(),
                    "Package must be one of: starter, business, enterprise".into(),
                );
                None
            }
        };

        let php_version = clean_optional(&self.php_version).unwrap_or_else(|| DEFAULT_PHP_VERSION.to_string());
        if !SUPPORTED_PHP_VERSIONS.contains(&php_version.as_str()) {
            errors.insert(
                "phpVersion".into(),
                format!("PHP version must be one of: {}", SUPPORTED_PHP_VERSIONS.join(", ")),
            );
        }

        match package {
            Some(package) if errors.is_empty() => Ok(ValidRequest {
                name,
                email,
                phone,
                company,
                custom_domain,
                package,
                php_version,
                need_database: self.need_database,
            }),
            _ => Err(errors),
        }
    }
}

fn clean_optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Lowercase, drop a trailing dot and a leading `www.`
pub fn normalize_domain(domain: &str) -> String {
    let lower = domain.trim().trim_end_matches('.').to_lowercase();
    match lower.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => lower,
    }
}

pub fn is_valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return false,
    };

    !local.is_empty()
        && local.len() <= 64
        && !local.starts_with('.')
        && !local.ends_with('.')
        && local.chars().all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c))
        && is_valid_hostname(domain)
}

pub fn is_valid_hostname(host: &str) -> bool {
    if host.is_empty() || host.len() > 253 {
        return false;
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });

    let tld = labels[labels.len() - 1];
    labels_ok && tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
}

/// HestiaCP backend template for a PHP version, e.g. `8.2` -> `PHP-8_2`
pub fn php_backend_template(version: &str) -> String {
    format!("PHP-{}", version.replace('.', "_"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ProvisioningRequest {
        ProvisioningRequest {
            name: "Acme Co".into(),
            email: "a@acme.test".into(),
            package_id: "starter".into(),
            ..Default::default()
        }
    }

    #[test]
    fn minimal_request_is_valid_with_defaults() {
        let valid = request().validate().unwrap();
        assert_eq!(valid.package, PackageId::Starter);
        assert_eq!(valid.php_version, DEFAULT_PHP_VERSION);
        assert!(!valid.need_database);
        assert!(valid.custom_domain.is_none());
    }

    #[test]
    fn all_field_errors_are_collected() {
        let req = ProvisioningRequest {
            name: "  ".into(),
            email: "not-an-email".into(),
            package_id: "platinum".into(),
            php_version: Some("5.6".into()),
            custom_domain: Some("bad domain".into()),
            ..Default::default()
        };
        let errors = req.validate().unwrap_err();
        for field in ["name", "email", "packageId", "phpVersion", "customDomain"] {
            assert!(errors.contains_key(field), "missing error for {}", field);
        }
    }

    #[test]
    fn custom_domain_is_normalized() {
        let mut req = request();
        req.custom_domain = Some("WWW.Example.COM.".into());
        assert_eq!(req.validate().unwrap().custom_domain.as_deref(), Some("example.com"));
    }

    #[test]
    fn blank_optionals_become_none() {
        let mut req = request();
        req.phone = Some("   ".into());
        req.company = Some("".into());
        let valid = req.validate().unwrap();
        assert!(valid.phone.is_none());
        assert!(valid.company.is_none());
    }

    #[test]
    fn email_rules() {
        assert!(is_valid_email("a@acme.test"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
        assert!(!is_valid_email("a@b@c.com"));
        assert!(!is_valid_email("@acme.test"));
        assert!(!is_valid_email("a@localhost"));
        assert!(!is_valid_email("a b@acme.test"));
    }

    #[test]
    fn package_ids_parse_case_insensitively() {
        assert_eq!("Business".parse::<PackageId>().unwrap(), PackageId::Business);
        assert!("gold".parse::<PackageId>().is_err());
    }

    #[test]
    fn request_deserializes_from_camel_case() {
        let req: ProvisioningRequest = serde_json::from_value(serde_json::json!({
            "name": "Acme Co",
            "email": "a@acme.test",
            "packageId": "starter",
            "needDatabase": true,
            "customDomain": "acme.test"
        }))
        .unwrap();
        assert!(req.need_database);
        assert_eq!(req.custom_domain.as_deref(), Some("acme.test"));
    }

    #[test]
    fn backend_template_name() {
        assert_eq!(php_backend_template("8.2"), "PHP-8_2");
    }
}
