//! The customer provisioning workflow.
//!
//! Steps run strictly in order. Account creation and virtual-host creation are fatal:
//! once the account exists, a later fatal failure unwinds the compensation stack.
//! SSL, HTTPS redirect, PHP backend, DNS and database steps only degrade the result.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::Utc;
use futures::FutureExt;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use tracing::{error, info, warn};

use super::compensation::CompensationStack;
use super::error::ProvisionError;
use super::generate::{
    generate_database_names, generate_password, generate_subdomain, generate_username, MIN_PASSWORD_LENGTH,
};
use super::outcome::{
    custom_domain_instructions, Credentials, CustomerSummary, DatabaseSummary, NextSteps, ProvisioningOutcome,
    WebsiteSummary,
};
use super::package::{Package, PackageCatalog};
use super::request::{php_backend_template, ProvisioningRequest, ValidRequest};
use crate::config::AppConfig;
use crate::database::models::account::advance_billing_date;
use crate::database::models::audit::actions;
use crate::database::models::customer_database::{DEFAULT_DB_HOST, DEFAULT_DB_PORT};
use crate::database::models::{NewAccount, NewAccountGraph, NewAuditEntry, NewCustomerDatabase, NewWebsite};
use crate::database::AccountStore;
use crate::dns::DnsApi;
use crate::hestia::{HestiaApi, NewHestiaDatabase, NewHestiaUser};
use crate::types::{AccountStatus, WebsiteStatus};

/// Redraws allowed when a generated username or subdomain is already stored
const MAX_IDENTITY_ATTEMPTS: usize = 5;

#[derive(Debug, Clone)]
pub struct ProvisionerSettings {
    pub primary_domain: String,
    pub edge_ip: String,
    pub dns_zone: String,
    pub dns_ttl: u32,
    pub panel_url: String,
    pub password_length: usize,
    pub live_packages: bool,
}

impl ProvisionerSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            primary_domain: config.platform.primary_domain.clone(),
            edge_ip: config.platform.edge_ip.clone(),
            dns_zone: config.dns.zone.clone(),
            dns_ttl: config.dns.record_ttl,
            panel_url: config.platform.panel_url.clone(),
            password_length: config.platform.password_length,
            live_packages: config.platform.live_packages,
        }
    }
}

struct Identity {
    username: String,
    password: String,
    subdomain: String,
    database: Option<NewHestiaDatabase>,
}

pub struct Provisioner {
    hestia: Arc<dyn HestiaApi>,
    dns: Arc<dyn DnsApi>,
    store: Arc<dyn AccountStore>,
    catalog: PackageCatalog,
    settings: ProvisionerSettings,
}

impl Provisioner {
    pub fn new(
        hestia: Arc<dyn HestiaApi>,
        dns: Arc<dyn DnsApi>,
        store: Arc<dyn AccountStore>,
        catalog: PackageCatalog,
        settings: ProvisionerSettings,
    ) -> Self {
        Self {
            hestia,
            dns,
            store,
            catalog,
            settings,
        }
    }

    pub fn settings(&self) -> &ProvisionerSettings {
        &self.settings
    }

    /// Static catalog, refreshed from the control plane when live packages are enabled.
    /// A failed refresh falls back to the static limits.
    pub async fn current_catalog(&self) -> PackageCatalog {
        if !self.settings.live_packages {
            return self.catalog.clone();
        }
        match self.hestia.list_packages().await {
            Ok(listing) => self.catalog.overlay(&listing),
            Err(e) => {
                warn!("Could not load live package catalog, using static limits: {}", e);
                self.catalog.clone()
            }
        }
    }

    pub async fn provision(&self, request: &ProvisioningRequest) -> Result<ProvisioningOutcome, ProvisionError> {
        let mut rng = StdRng::from_entropy();
        self.provision_with_rng(request, &mut rng).await
    }

    /// Same as [`Provisioner::provision`] with a caller-supplied random source
    pub async fn provision_with_rng<R: Rng + Send>(
        &self,
        request: &ProvisioningRequest,
        rng: &mut R,
    ) -> Result<ProvisioningOutcome, ProvisionError> {
        let valid = request.validate().map_err(ProvisionError::Validation)?;
        info!("Provisioning {} on package {}", valid.email, valid.package);

        // The stack lives out here so a panic mid-run can still roll back committed steps
        let mut stack = CompensationStack::new();
        let caught = AssertUnwindSafe(self.run(&valid, rng, &mut stack))
            .catch_unwind()
            .await;
        let result = match caught {
            Ok(result) => result,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!("Provisioning for {} panicked: {}", valid.email, message);
                if !stack.is_empty() {
                    warn!("Rolling back {} completed step(s) for {}", stack.len(), valid.email);
                }
                let orphans = stack.unwind().await;
                Err(ProvisionError::Internal { message, orphans })
            }
        };

        match result {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                self.audit_failure(&valid.email, &err).await;
                Err(err)
            }
        }
    }

    /// Record an aborted run. Audit write failures are logged, never raised.
    async fn audit_failure(&self, subject: &str, err: &ProvisionError) {
        let orphans = err.orphans();
        if !orphans.is_empty() {
            error!("Provisioning for {} left {} orphaned resource(s): {:?}", subject, orphans.len(), orphans);
        }

        let entry = NewAuditEntry::failure(actions::PROVISION, subject, err.to_string())
            .details(json!({ "kind": err.kind(), "orphans": orphans }));
        if let Err(e) = self.store.append_audit(entry).await {
            error!("Failed to write audit entry for {}: {}", subject, e);
        }
    }

    async fn run<R: Rng + Send>(
        &self,
        req: &ValidRequest,
        rng: &mut R,
        stack: &mut CompensationStack,
    ) -> Result<ProvisioningOutcome, ProvisionError> {
        let package = self
            .current_catalog()
            .await
            .get(req.package)
            .cloned()
            .ok_or_else(|| ProvisionError::Configuration(format!("package '{}' is not defined", req.package)))?;

        let identity = self.draw_identity(req, rng).await?;
        let username = identity.username.clone();
        let subdomain = identity.subdomain.clone();
        let mut notes = vec![format!(
            "Log in to the control panel at {} with the credentials above.",
            self.settings.panel_url
        )];

        // Step A: hosting account
        self.hestia
            .create_user(&NewHestiaUser {
                username: username.clone(),
                password: identity.password.clone(),
                email: req.email.clone(),
                package: package.hestia_package.clone(),
                name: req.name.clone(),
            })
            .await
            .map_err(|e| {
                error!("Creating hosting account {} failed: {}", username, e);
                ProvisionError::RemoteAccount(e)
            })?;
        info!("Created hosting account {}", username);

        let hestia = self.hestia.clone();
        let owner = username.clone();
        stack.push(format!("delete hosting account {}", owner), move || async move {
            hestia.delete_user(&owner).await.map_err(|e| e.to_string())
        });

        // Step B: virtual host
        let aliases = website_aliases(&subdomain, req.custom_domain.as_deref());
        if let Err(e) = self.hestia.add_web_domain(&username, &subdomain, &aliases).await {
            error!("Creating website {} failed: {}", subdomain, e);
            let orphans = std::mem::take(stack).unwind().await;
            return Err(ProvisionError::RemoteHost { source: e, orphans });
        }
        info!("Created website {} for {}", subdomain, username);

        // Step C: certificate for the platform subdomain only; custom domains are not pointed here yet
        let ssl_enabled = match self.hestia.add_letsencrypt(&username, &subdomain, &[]).await {
            Ok(()) => true,
            Err(e) => {
                warn!("SSL issuance for {} failed, continuing without it: {}", subdomain, e);
                notes.push("SSL certificate is pending; request it again from the control panel once DNS has propagated.".to_string());
                false
            }
        };

        // Step D: HTTPS redirect
        let ssl_forced = ssl_enabled
            && match self.hestia.force_ssl(&username, &subdomain).await {
                Ok(()) => true,
                Err(e) => {
                    warn!("Forcing HTTPS on {} failed: {}", subdomain, e);
                    false
                }
            };

        let php_backend = match self
            .hestia
            .set_backend_template(&username, &subdomain, &php_backend_template(&req.php_version))
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!("Setting PHP {} on {} failed: {}", req.php_version, subdomain, e);
                notes.push(format!("PHP {} could not be selected; the server default is in use.", req.php_version));
                false
            }
        };

        // Step E: platform DNS
        let dns_result = match record_host(&subdomain, &self.settings.dns_zone) {
            Some(host) => self
                .dns
                .add_a_record(&self.settings.dns_zone, &host, &self.settings.edge_ip, self.settings.dns_ttl)
                .await
                .map_err(|e| e.to_string()),
            None => Err(format!("{} is outside DNS zone {}", subdomain, self.settings.dns_zone)),
        };
        let dns_configured = match dns_result {
            Ok(record) => {
                info!("DNS record {} -> {} created", subdomain, self.settings.edge_ip);
                let dns = self.dns.clone();
                stack.push(format!("remove DNS record {}", subdomain), move || async move {
                    dns.remove_record(&record).await.map_err(|e| e.to_string())
                });
                true
            }
            Err(e) => {
                warn!("DNS record for {} failed: {}", subdomain, e);
                notes.push(format!(
                    "DNS for {} could not be configured automatically; add an A record pointing to {}.",
                    subdomain, self.settings.edge_ip
                ));
                false
            }
        };

        // Step F: database
        let database = match identity.database {
            Some(db) => match self.hestia.add_database(&db).await {
                Ok(()) => {
                    info!("Created database {}", db.full_name());
                    Some(db)
                }
                Err(e) => {
                    warn!("Database creation for {} failed: {}", username, e);
                    notes.push("The database could not be created; add one from the control panel.".to_string());
                    None
                }
            },
            None => None,
        };

        let mut dns_records = Vec::new();
        if let Some(custom) = &req.custom_domain {
            notes.push(format!("Point {} at the platform using the DNS records below.", custom));
            dns_records = custom_domain_instructions(custom, &subdomain, &self.settings.edge_ip);
        }

        let website_status = if ssl_enabled {
            WebsiteStatus::Active
        } else {
            WebsiteStatus::SslPending
        };
        let today = Utc::now().date_naive();

        let graph = NewAccountGraph {
            account: NewAccount {
                name: req.name.clone(),
                email: req.email.clone(),
                phone: req.phone.clone(),
                company: req.company.clone(),
                hestia_username: username.clone(),
                hestia_password: identity.password.clone(),
                package_id: package.id.to_string(),
                status: AccountStatus::Active,
                monthly_price: package.monthly_price,
                next_billing_date: advance_billing_date(today, 1).unwrap_or(today),
            },
            website: NewWebsite {
                subdomain: subdomain.clone(),
                custom_domain: req.custom_domain.clone(),
                aliases: aliases.clone(),
                ssl_enabled,
                ssl_forced,
                dns_configured,
                php_version: req.php_version.clone(),
                status: website_status,
            },
            database: database.as_ref().map(|db| NewCustomerDatabase {
                name: db.full_name(),
                username: db.full_user(),
                password: db.password.clone(),
                host: DEFAULT_DB_HOST.to_string(),
                port: i32::from(DEFAULT_DB_PORT),
            }),
        };

        let detail = match self.store.create_account(graph).await {
            Ok(detail) => detail,
            Err(e) => {
                error!("Saving account {} failed, rolling back remote resources: {}", username, e);
                let orphans = std::mem::take(stack).unwind().await;
                return Err(ProvisionError::Persistence { source: e, orphans });
            }
        };
        std::mem::take(stack).commit();

        let account = &detail.account;
        let website_id = detail
            .websites
            .first()
            .map(|w| w.id)
            .ok_or_else(|| ProvisionError::internal("stored account has no website"))?;

        let audit = NewAuditEntry::success(actions::PROVISION, &req.email, format!("Provisioned {}", username))
            .account(account.id)
            .details(json!({
                "username": username,
                "subdomain": subdomain,
                "package": package.id,
                "steps": {
                    "ssl": ssl_enabled,
                    "sslForced": ssl_forced,
                    "phpBackend": php_backend,
                    "dns": dns_configured,
                    "database": if req.need_database { json!(database.is_some()) } else { json!(null) },
                },
            }));
        if let Err(e) = self.store.append_audit(audit).await {
            error!("Failed to write audit entry for {}: {}", username, e);
        }

        info!("Provisioned {} ({}) for {}", username, subdomain, req.email);

        Ok(ProvisioningOutcome {
            customer: CustomerSummary {
                id: account.id,
                name: account.name.clone(),
                email: account.email.clone(),
                company: account.company.clone(),
                hestia_username: username.clone(),
                package: package.id.to_string(),
                status: AccountStatus::Active,
                next_billing_date: account.next_billing_date,
            },
            credentials: Credentials {
                hestia_username: username,
                hestia_password: identity.password,
                panel_url: self.settings.panel_url.clone(),
            },
            website: WebsiteSummary {
                id: website_id,
                url: format!("https://{}", subdomain),
                subdomain,
                custom_domain: req.custom_domain.clone(),
                aliases,
                ssl_enabled,
                ssl_forced,
                dns_configured,
                php_version: req.php_version.clone(),
                status: website_status,
            },
            database: database.map(|db| DatabaseSummary {
                name: db.full_name(),
                username: db.full_user(),
                password: db.password,
                host: DEFAULT_DB_HOST.to_string(),
                port: DEFAULT_DB_PORT,
            }),
            resource_limits: Package::resource_limits(&package),
            next_steps: NextSteps { notes, dns_records },
        })
    }

    async fn draw_identity<R: Rng + Send>(&self, req: &ValidRequest, rng: &mut R) -> Result<Identity, ProvisionError> {
        let mut username = generate_username(&req.email, rng);
        let mut attempts = 1;
        while attempts < MAX_IDENTITY_ATTEMPTS && self.taken(self.store.username_exists(&username).await, &username) {
            username = generate_username(&req.email, rng);
            attempts += 1;
        }

        let mut subdomain = generate_subdomain(&req.name, &self.settings.primary_domain, rng);
        let mut attempts = 1;
        while attempts < MAX_IDENTITY_ATTEMPTS && self.taken(self.store.subdomain_exists(&subdomain).await, &subdomain) {
            subdomain = generate_subdomain(&req.name, &self.settings.primary_domain, rng);
            attempts += 1;
        }

        let length = self.settings.password_length;
        let mut password = || {
            generate_password(length, &mut *rng).ok_or_else(|| {
                ProvisionError::Configuration(format!(
                    "password length {} is below the minimum of {}",
                    length, MIN_PASSWORD_LENGTH
                ))
            })
        };
        let account_password = password()?;
        let database = if req.need_database {
            let database_password = password()?;
            let (name, user) = generate_database_names(rng);
            Some(NewHestiaDatabase {
                owner: username.clone(),
                name,
                user,
                password: database_password,
            })
        } else {
            None
        };

        Ok(Identity {
            username,
            password: account_password,
            subdomain,
            database,
        })
    }

    /// An unavailable store counts as "not taken"; the unique constraints still apply on insert
    fn taken(&self, check: Result<bool, crate::database::StoreError>, value: &str) -> bool {
        match check {
            Ok(taken) => {
                if taken {
                    warn!("Generated identifier {} already in use, drawing again", value);
                }
                taken
            }
            Err(e) => {
                warn!("Uniqueness check for {} unavailable: {}", value, e);
                false
            }
        }
    }
}

/// `www.<sub>`, plus the custom domain and its `www.` form when one was given
pub fn website_aliases(subdomain: &str, custom_domain: Option<&str>) -> Vec<String> {
    let mut aliases = vec![format!("www.{}", subdomain)];
    if let Some(custom) = custom_domain {
        aliases.push(custom.to_string());
        aliases.push(format!("www.{}", custom));
    }
    aliases
}

/// Record name relative to the zone, or `None` when `fqdn` is not strictly inside it
pub fn record_host(fqdn: &str, zone: &str) -> Option<String> {
    let suffix = format!(".{}", zone.trim_matches('.'));
    match fqdn.strip_suffix(&suffix) {
        Some(host) if !host.is_empty() => Some(host.to_string()),
        _ => None,
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
