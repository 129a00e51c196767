//! Package catalog: the resource limits each tier grants.
//!
//! The built-in table is the source of truth unless `PANEL_PACKAGES_FILE` points at a
//! YAML replacement. With `PANEL_LIVE_PACKAGES` set, quotas are refreshed from the
//! control plane's own package listing before each lookup.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::request::PackageId;
use crate::config::PlatformConfig;
use crate::hestia::{Table, TableRow};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read package file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid package file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Package file does not define '{0}'")]
    Missing(PackageId),
}

/// A numeric limit or no limit at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuotaRepr", into = "QuotaRepr")]
pub enum Quota {
    Limited(u64),
    Unlimited,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum QuotaRepr {
    Number(u64),
    Text(String),
}

impl TryFrom<QuotaRepr> for Quota {
    type Error = String;

    fn try_from(repr: QuotaRepr) -> Result<Self, Self::Error> {
        match repr {
            QuotaRepr::Number(n) => Ok(Quota::Limited(n)),
            QuotaRepr::Text(text) => text.parse(),
        }
    }
}

impl From<Quota> for QuotaRepr {
    fn from(quota: Quota) -> Self {
        match quota {
            Quota::Limited(n) => QuotaRepr::Number(n),
            Quota::Unlimited => QuotaRepr::Text("unlimited".to_string()),
        }
    }
}

impl std::str::FromStr for Quota {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("unlimited") {
            return Ok(Quota::Unlimited);
        }
        s.parse::<u64>()
            .map(Quota::Limited)
            .map_err(|_| format!("invalid quota '{}'", s))
    }
}

impl fmt::Display for Quota {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quota::Limited(n) => write!(f, "{}", n),
            Quota::Unlimited => f.write_str("unlimited"),
        }
    }
}

impl Quota {
    /// Count limits for humans ("5", "Unlimited")
    pub fn describe_count(&self) -> String {
        match self {
            Quota::Limited(n) => n.to_string(),
            Quota::Unlimited => "Unlimited".to_string(),
        }
    }

    /// Megabyte limits for humans ("5 GB", "512 MB", "Unlimited")
    pub fn describe_megabytes(&self) -> String {
        match self {
            Quota::Limited(mb) if *mb >= 1024 && mb % 1024 == 0 => format!("{} GB", mb / 1024),
            Quota::Limited(mb) => format!("{} MB", mb),
            Quota::Unlimited => "Unlimited".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub id: PackageId,
    /// Package name on the control plane, passed to `v-add-user`
    pub hestia_package: String,
    pub display_name: String,
    pub disk_quota_mb: Quota,
    pub bandwidth_mb: Quota,
    pub web_domains: Quota,
    pub databases: Quota,
    pub mail_accounts: Quota,
    pub monthly_price: Decimal,
}

/// Limits as shown to the customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceLimits {
    pub disk_quota: String,
    pub bandwidth: String,
    pub websites: String,
    pub databases: String,
    pub email_accounts: String,
}

impl Package {
    pub fn resource_limits(&self) -> ResourceLimits {
        ResourceLimits {
            disk_quota: self.disk_quota_mb.describe_megabytes(),
            bandwidth: self.bandwidth_mb.describe_megabytes(),
            websites: self.web_domains.describe_count(),
            databases: self.databases.describe_count(),
            email_accounts: self.mail_accounts.describe_count(),
        }
    }

    /// Copy quotas from one row of `v-list-user-packages`. Unknown or
    /// unparsable cells leave the current value alone.
    fn apply_row(&mut self, row: &TableRow) {
        let id = self.id;
        let mut changed = Vec::new();
        for (aliases, slot) in [
            (&["WEB", "WEB_DOMAINS"][..], &mut self.web_domains),
            (&["DB", "DATABASES"][..], &mut self.databases),
            (&["MAIL", "MAIL_ACCOUNTS"][..], &mut self.mail_accounts),
            (&["DISK", "DISK_QUOTA"][..], &mut self.disk_quota_mb),
            (&["BW", "BANDWIDTH"][..], &mut self.bandwidth_mb),
        ] {
            let Some(quota) = cell(row, aliases).and_then(|c| c.parse::<Quota>().ok()) else {
                continue;
            };
            if *slot != quota {
                *slot = quota;
                changed.push(aliases[0]);
            }
        }
        if !changed.is_empty() {
            debug!("Package {} updated from control plane: {:?}", id, changed);
        }
    }
}

fn cell<'a>(row: &'a TableRow, aliases: &[&str]) -> Option<&'a str> {
    aliases
        .iter()
        .find_map(|name| row.get(*name))
        .and_then(Value::as_str)
}

static BUILTIN_PACKAGES: Lazy<Vec<Package>> = Lazy::new(|| {
    vec![
        Package {
            id: PackageId::Starter,
            hestia_package: "starter".to_string(),
            display_name: "Starter".to_string(),
            disk_quota_mb: Quota::Limited(5 * 1024),
            bandwidth_mb: Quota::Limited(50 * 1024),
            web_domains: Quota::Limited(1),
            databases: Quota::Limited(1),
            mail_accounts: Quota::Limited(5),
            monthly_price: Decimal::new(499, 2),
        },
        Package {
            id: PackageId::Business,
            hestia_package: "business".to_string(),
            display_name: "Business".to_string(),
            disk_quota_mb: Quota::Limited(20 * 1024),
            bandwidth_mb: Quota::Limited(200 * 1024),
            web_domains: Quota::Limited(5),
            databases: Quota::Limited(5),
            mail_accounts: Quota::Limited(25),
            monthly_price: Decimal::new(1499, 2),
        },
        Package {
            id: PackageId::Enterprise,
            hestia_package: "enterprise".to_string(),
            display_name: "Enterprise".to_string(),
            disk_quota_mb: Quota::Limited(100 * 1024),
            bandwidth_mb: Quota::Unlimited,
            web_domains: Quota::Unlimited,
            databases: Quota::Unlimited,
            mail_accounts: Quota::Unlimited,
            monthly_price: Decimal::new(4999, 2),
        },
    ]
});

#[derive(Debug, Clone)]
pub struct PackageCatalog {
    packages: HashMap<PackageId, Package>,
}

impl PackageCatalog {
    pub fn builtin() -> Self {
        Self::from_packages(BUILTIN_PACKAGES.clone())
    }

    fn from_packages(packages: Vec<Package>) -> Self {
        Self {
            packages: packages.into_iter().map(|p| (p.id, p)).collect(),
        }
    }

    /// A YAML list of packages; every tier must be present
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        let packages: Vec<Package> = serde_yaml::from_str(yaml)?;
        let catalog = Self::from_packages(packages);
        for id in PackageId::ALL {
            if !catalog.packages.contains_key(&id) {
                return Err(CatalogError::Missing(id));
            }
        }
        Ok(catalog)
    }

    pub fn load(config: &PlatformConfig) -> Result<Self, CatalogError> {
        match &config.packages_file {
            Some(path) => {
                let yaml = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
                    path: path.clone(),
                    source,
                })?;
                Self::from_yaml_str(&yaml)
            }
            None => Ok(Self::builtin()),
        }
    }

    pub fn get(&self, id: PackageId) -> Option<&Package> {
        self.packages.get(&id)
    }

    /// All packages in tier order
    pub fn list(&self) -> Vec<&Package> {
        PackageId::ALL.iter().filter_map(|id| self.packages.get(id)).collect()
    }

    /// A copy with quotas taken from the control plane's listing, matched by
    /// package name. Packages missing from the listing keep their static limits.
    pub fn overlay(&self, listing: &Table) -> Self {
        let mut packages = self.packages.clone();
        for row in &listing.rows {
            let Some(name) = cell(row, &["PKG", "PACKAGE", "NAME"]) else {
                continue;
            };
            if let Some(package) = packages.values_mut().find(|p| p.hestia_package == name) {
                package.apply_row(row);
            }
        }
        Self { packages }
    }
}
