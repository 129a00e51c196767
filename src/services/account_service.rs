use std::sync::Arc;

use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::database::models::audit::actions;
use crate::database::models::{Account, AccountDetail, NewAuditEntry};
use crate::database::{AccountStore, StoreError};
use crate::hestia::error::{E_SUSPENDED, E_UNSUSPENDED};
use crate::hestia::{HestiaApi, HestiaError};
use crate::types::AccountStatus;

pub const MAX_BILLING_EXTENSION_MONTHS: u32 = 36;

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("Account not found: {0}")]
    NotFound(Uuid),
    #[error("Control plane error: {0}")]
    Remote(#[from] HestiaError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Invalid request: {0}")]
    Invalid(String),
}

/// Lifecycle operations on accounts that already exist
pub struct AccountService {
    hestia: Arc<dyn HestiaApi>,
    store: Arc<dyn AccountStore>,
}

impl AccountService {
    pub fn new(hestia: Arc<dyn HestiaApi>, store: Arc<dyn AccountStore>) -> Self {
        Self { hestia, store }
    }

    pub async fn list(&self) -> Result<Vec<Account>, AccountError> {
        Ok(self.store.list_accounts().await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<AccountDetail, AccountError> {
        self.store.find_account(id).await?.ok_or(AccountError::NotFound(id))
    }

    /// Suspend on the control plane, then locally. Already-suspended is not an error.
    pub async fn suspend(&self, id: Uuid) -> Result<Account, AccountError> {
        let detail = self.get(id).await?;
        let username = &detail.account.hestia_username;

        match self.hestia.suspend_user(username).await {
            Ok(()) => {}
            Err(e) if e.return_code() == Some(E_SUSPENDED) => {
                warn!("{} was already suspended on the control plane", username);
            }
            Err(e) => {
                self.audit_failure(actions::SUSPEND, &detail, &e).await;
                return Err(e.into());
            }
        }

        let account = self.store.set_status(id, AccountStatus::Suspended).await?;
        info!("Suspended account {} ({})", id, username);
        self.audit(NewAuditEntry::success(actions::SUSPEND, username.as_str(), "Account suspended").account(id))
            .await;
        Ok(account)
    }

    pub async fn unsuspend(&self, id: Uuid) -> Result<Account, AccountError> {
        let detail = self.get(id).await?;
        let username = &detail.account.hestia_username;

        match self.hestia.unsuspend_user(username).await {
            Ok(()) => {}
            Err(e) if e.return_code() == Some(E_UNSUSPENDED) => {
                warn!("{} was not suspended on the control plane", username);
            }
            Err(e) => {
                self.audit_failure(actions::UNSUSPEND, &detail, &e).await;
                return Err(e.into());
            }
        }

        let account = self.store.set_status(id, AccountStatus::Active).await?;
        info!("Unsuspended account {} ({})", id, username);
        self.audit(NewAuditEntry::success(actions::UNSUSPEND, username.as_str(), "Account unsuspended").account(id))
            .await;
        Ok(account)
    }

    /// Move the next billing date forward by whole months
    pub async fn extend_billing(&self, id: Uuid, months: u32) -> Result<Account, AccountError> {
        if months == 0 || months > MAX_BILLING_EXTENSION_MONTHS {
            return Err(AccountError::Invalid(format!(
                "months must be between 1 and {}",
                MAX_BILLING_EXTENSION_MONTHS
            )));
        }

        let account = match self.store.extend_billing(id, months).await {
            Ok(account) => account,
            Err(StoreError::NotFound(_)) => return Err(AccountError::NotFound(id)),
            Err(e) => return Err(e.into()),
        };

        info!("Extended billing for {} by {} month(s)", id, months);
        self.audit(
            NewAuditEntry::success(
                actions::EXTEND_BILLING,
                account.hestia_username.as_str(),
                format!("Billing extended by {} month(s)", months),
            )
            .account(id)
            .details(json!({ "months": months, "nextBillingDate": account.next_billing_date })),
        )
        .await;
        Ok(account)
    }

    /// Remove the control-plane user (and with it every domain and database), then the local rows
    pub async fn delete(&self, id: Uuid) -> Result<(), AccountError> {
        let detail = self.get(id).await?;
        let username = &detail.account.hestia_username;

        match self.hestia.delete_user(username).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                warn!("{} no longer exists on the control plane; removing local records", username);
            }
            Err(e) => {
                self.audit_failure(actions::DELETE, &detail, &e).await;
                return Err(e.into());
            }
        }

        self.store.delete_account(id).await?;
        info!("Deleted account {} ({})", id, username);
        self.audit(
            NewAuditEntry::success(actions::DELETE, username.as_str(), "Account deleted")
                .account(id)
                .details(json!({ "subdomains": detail.websites.iter().map(|w| &w.subdomain).collect::<Vec<_>>() })),
        )
        .await;
        Ok(())
    }

    async fn audit_failure(&self, action: &'static str, detail: &AccountDetail, err: &HestiaError) {
        error!("{} failed for {}: {}", action, detail.account.hestia_username, err);
        self.audit(
            NewAuditEntry::failure(action, detail.account.hestia_username.as_str(), err.to_string())
                .account(detail.account.id)
                .details(json!({ "returncode": err.return_code() })),
        )
        .await;
    }

    async fn audit(&self, entry: NewAuditEntry) {
        if let Err(e) = self.store.append_audit(entry).await {
            error!("Failed to write audit entry: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hestia::error::E_LIMIT;
    use crate::provisioning::{PackageCatalog, Provisioner, ProvisionerSettings, ProvisioningRequest};
    use crate::testing::{FakeDns, FakeHestia, MemoryStore};

    async fn provisioned(hestia: FakeHestia) -> (Arc<FakeHestia>, Arc<MemoryStore>, AccountService, Uuid, String) {
        let hestia = Arc::new(hestia);
        let store = Arc::new(MemoryStore::new());
        let provisioner = Provisioner::new(
            hestia.clone(),
            Arc::new(FakeDns::new()),
            store.clone(),
            PackageCatalog::builtin(),
            ProvisionerSettings {
                primary_domain: "example.com".into(),
                edge_ip: "203.0.113.10".into(),
                dns_zone: "example.com".into(),
                dns_ttl: 600,
                panel_url: "https://cp.example.com:8083".into(),
                password_length: 16,
                live_packages: false,
            },
        );
        let outcome = provisioner
            .provision(&ProvisioningRequest {
                name: "Acme Co".into(),
                email: "a@acme.test".into(),
                package_id: "business".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        let service = AccountService::new(hestia.clone(), store.clone());
        (hestia, store, service, outcome.customer.id, outcome.customer.hestia_username)
    }

    #[tokio::test]
    async fn suspend_and_unsuspend_round_trip() {
        let (hestia, store, service, id, username) = provisioned(FakeHestia::new()).await;

        let account = service.suspend(id).await.unwrap();
        assert_eq!(account.status(), Some(AccountStatus::Suspended));
        assert!(hestia.is_suspended(&username));

        let account = service.unsuspend(id).await.unwrap();
        assert_eq!(account.status(), Some(AccountStatus::Active));
        assert!(!hestia.is_suspended(&username));

        let recorded: Vec<String> = store.audit_entries().into_iter().map(|e| e.action).collect();
        assert!(recorded.contains(&actions::SUSPEND.to_string()));
        assert!(recorded.contains(&actions::UNSUSPEND.to_string()));
    }

    #[tokio::test]
    async fn remote_suspend_failure_leaves_status_alone() {
        let (_, store, service, id, _) =
            provisioned(FakeHestia::new().failing("v-suspend-user", HestiaError::remote(E_LIMIT))).await;

        assert!(matches!(service.suspend(id).await, Err(AccountError::Remote(_))));
        assert_eq!(service.get(id).await.unwrap().account.status, "active");
        assert_eq!(store.audit_entries().last().unwrap().outcome, "failure");
    }

    #[tokio::test]
    async fn billing_extension_bounds() {
        let (_, _, service, id, _) = provisioned(FakeHestia::new()).await;
        let before = service.get(id).await.unwrap().account.next_billing_date;

        let account = service.extend_billing(id, 2).await.unwrap();
        assert!(account.next_billing_date > before);

        assert!(matches!(service.extend_billing(id, 0).await, Err(AccountError::Invalid(_))));
        assert!(matches!(service.extend_billing(id, 37).await, Err(AccountError::Invalid(_))));
        assert!(matches!(
            service.extend_billing(Uuid::new_v4(), 1).await,
            Err(AccountError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_tolerates_missing_remote_user() {
        let (hestia, store, service, id, username) =
            provisioned(FakeHestia::new().failing("v-delete-user", HestiaError::remote(3))).await;

        service.delete(id).await.unwrap();
        assert!(store.accounts().is_empty());
        assert!(hestia.commands().contains(&"v-delete-user".to_string()));
        assert!(matches!(service.get(id).await, Err(AccountError::NotFound(_))));
        assert_eq!(store.audit_entries().last().unwrap().subject, username);
    }
}
