//! In-memory stand-ins for the control plane, the DNS provider and the account store.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::database::models::account::{advance_billing_date, BILLING_CYCLE_MONTHLY};
use crate::database::models::{
    Account, AccountDetail, AuditEntry, CustomerDatabase, NewAccountGraph, NewAuditEntry, Website,
};
use crate::database::{AccountStore, StoreError};
use crate::dns::{DnsApi, DnsError, DnsRecordRef};
use crate::hestia::error::{E_ARGS, E_EXISTS, E_NOTEXIST};
use crate::hestia::{HestiaApi, HestiaCommand, HestiaError, Reply};
use crate::types::AccountStatus;

#[derive(Debug, Default, Clone)]
struct FakeUser {
    suspended: bool,
    domains: Vec<String>,
    databases: Vec<String>,
}

#[derive(Default)]
struct HestiaState {
    users: HashMap<String, FakeUser>,
    failures: HashMap<String, HestiaError>,
    panics: HashSet<String>,
    packages: String,
    log: Vec<HestiaCommand>,
}

/// Interprets HestiaCP commands against an in-memory user table
#[derive(Default)]
pub struct FakeHestia {
    state: Mutex<HestiaState>,
}

impl FakeHestia {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `cmd` with `err` every time
    pub fn failing(self, cmd: &str, err: HestiaError) -> Self {
        self.state.lock().unwrap().failures.insert(cmd.to_string(), err);
        self
    }

    pub fn panicking(self, cmd: &str) -> Self {
        self.state.lock().unwrap().panics.insert(cmd.to_string());
        self
    }

    /// Raw `v-list-user-packages shell` output
    pub fn with_packages(self, listing: &str) -> Self {
        self.state.lock().unwrap().packages = listing.to_string();
        self
    }

    pub fn with_user(self, username: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .users
            .insert(username.to_string(), FakeUser::default());
        self
    }

    pub fn has_user(&self, username: &str) -> bool {
        self.state.lock().unwrap().users.contains_key(username)
    }

    pub fn users(&self) -> Vec<String> {
        self.state.lock().unwrap().users.keys().cloned().collect()
    }

    pub fn is_suspended(&self, username: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .users
            .get(username)
            .map(|u| u.suspended)
            .unwrap_or(false)
    }

    pub fn domains(&self, username: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .users
            .get(username)
            .map(|u| u.domains.clone())
            .unwrap_or_default()
    }

    pub fn databases(&self, username: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .users
            .get(username)
            .map(|u| u.databases.clone())
            .unwrap_or_default()
    }

    /// First argument of every `v-add-user` received, whether or not the user still exists
    pub fn created_users(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .log
            .iter()
            .filter(|c| c.cmd == "v-add-user")
            .filter_map(|c| c.args.first().cloned())
            .collect()
    }

    /// Command names in the order they were received
    pub fn commands(&self) -> Vec<String> {
        self.state.lock().unwrap().log.iter().map(|c| c.cmd.clone()).collect()
    }
}

#[async_trait]
impl HestiaApi for FakeHestia {
    async fn invoke(&self, command: HestiaCommand) -> Result<Reply, HestiaError> {
        let mut state = self.state.lock().unwrap();
        state.log.push(command.clone());

        if state.panics.contains(&command.cmd) {
            // Release the lock first so rollback after the panic can still reach the fake
            drop(state);
            panic!("injected panic in {}", command.cmd);
        }
        if let Some(err) = state.failures.get(&command.cmd) {
            return Err(err.clone());
        }

        let arg = |i: usize| command.args.get(i).cloned().unwrap_or_default();
        let ok = Ok(Reply::ReturnCode(0));

        match command.cmd.as_str() {
            "v-add-user" => {
                if arg(0).is_empty() {
                    return Err(HestiaError::remote(E_ARGS));
                }
                if state.users.contains_key(&arg(0)) {
                    return Err(HestiaError::remote(E_EXISTS));
                }
                state.users.insert(arg(0), FakeUser::default());
                ok
            }
            "v-delete-user" => match state.users.remove(&arg(0)) {
                Some(_) => ok,
                None => Err(HestiaError::remote(E_NOTEXIST)),
            },
            "v-list-user" => {
                if state.users.contains_key(&arg(0)) {
                    ok
                } else {
                    Err(HestiaError::remote(E_NOTEXIST))
                }
            }
            "v-suspend-user" | "v-unsuspend-user" => {
                let suspend = command.cmd == "v-suspend-user";
                match state.users.get_mut(&arg(0)) {
                    Some(user) => {
                        user.suspended = suspend;
                        ok
                    }
                    None => Err(HestiaError::remote(E_NOTEXIST)),
                }
            }
            "v-add-web-domain" => match state.users.get_mut(&arg(0)) {
                Some(user) if user.domains.contains(&arg(1)) => Err(HestiaError::remote(E_EXISTS)),
                Some(user) => {
                    user.domains.push(arg(1));
                    ok
                }
                None => Err(HestiaError::remote(E_NOTEXIST)),
            },
            "v-add-letsencrypt-domain" | "v-add-web-domain-ssl-force" | "v-change-web-domain-backend-tpl" => {
                match state.users.get(&arg(0)) {
                    Some(user) if user.domains.contains(&arg(1)) => ok,
                    _ => Err(HestiaError::remote(E_NOTEXIST)),
                }
            }
            "v-add-database" => match state.users.get_mut(&arg(0)) {
                Some(user) => {
                    user.databases.push(format!("{}_{}", arg(0), arg(1)));
                    ok
                }
                None => Err(HestiaError::remote(E_NOTEXIST)),
            },
            "v-list-user-packages" => Ok(Reply::parse(&state.packages)),
            cmd if cmd.starts_with("v-list-sys-") => Ok(Reply::Text(format!("{} ok", cmd))),
            other => Err(HestiaError::Unexpected(format!("fake does not know {}", other))),
        }
    }
}

/// Keeps created records in memory
#[derive(Default)]
pub struct FakeDns {
    records: Mutex<Vec<DnsRecordRef>>,
    add_failure: Option<DnsError>,
}

impl FakeDns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_add(mut self, err: DnsError) -> Self {
        self.add_failure = Some(err);
        self
    }

    pub fn records(&self) -> Vec<DnsRecordRef> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl DnsApi for FakeDns {
    async fn add_a_record(&self, zone: &str, host: &str, ip: &str, _ttl: u32) -> Result<DnsRecordRef, DnsError> {
        if let Some(err) = &self.add_failure {
            return Err(err.clone());
        }
        let record = DnsRecordRef {
            zone: zone.to_string(),
            host: host.to_string(),
            record_type: "A".to_string(),
            value: ip.to_string(),
            id: Some(Uuid::new_v4().to_string()),
        };
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn remove_record(&self, record: &DnsRecordRef) -> Result<(), DnsError> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r != record);
        if records.len() == before {
            return Err(DnsError::Rejected("record not found".to_string()));
        }
        Ok(())
    }
}

#[derive(Default)]
struct StoreState {
    accounts: Vec<AccountDetail>,
    audit: Vec<AuditEntry>,
    reserved_usernames: HashSet<String>,
}

/// [`AccountStore`] over a vector, with optional write failure
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
    fail_create: bool,
    offline: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    /// Every call fails as if the database were unreachable
    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    pub fn reserve_username(&self, username: &str) {
        self.state.lock().unwrap().reserved_usernames.insert(username.to_string());
    }

    pub fn accounts(&self) -> Vec<AccountDetail> {
        self.state.lock().unwrap().accounts.clone()
    }

    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.state.lock().unwrap().audit.clone()
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline {
            Err(StoreError::Sqlx(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }

    fn update<F>(&self, id: Uuid, f: F) -> Result<Account, StoreError>
    where
        F: FnOnce(&mut Account) -> Result<(), StoreError>,
    {
        self.check_online()?;
        let mut state = self.state.lock().unwrap();
        let detail = state
            .accounts
            .iter_mut()
            .find(|d| d.account.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("account {}", id)))?;
        f(&mut detail.account)?;
        detail.account.updated_at = Utc::now();
        Ok(detail.account.clone())
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn username_exists(&self, username: &str) -> Result<bool, StoreError> {
        self.check_online()?;
        let state = self.state.lock().unwrap();
        Ok(state.reserved_usernames.contains(username)
            || state.accounts.iter().any(|d| d.account.hestia_username == username))
    }

    async fn subdomain_exists(&self, subdomain: &str) -> Result<bool, StoreError> {
        self.check_online()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .accounts
            .iter()
            .flat_map(|d| d.websites.iter())
            .any(|w| w.subdomain == subdomain))
    }

    async fn create_account(&self, graph: NewAccountGraph) -> Result<AccountDetail, StoreError> {
        self.check_online()?;
        if self.fail_create {
            return Err(StoreError::Sqlx(sqlx::Error::PoolTimedOut));
        }

        let now = Utc::now();
        let account_id = Uuid::new_v4();
        let NewAccountGraph {
            account,
            website,
            database,
        } = graph;

        let detail = AccountDetail {
            account: Account {
                id: account_id,
                name: account.name,
                email: account.email,
                phone: account.phone,
                company: account.company,
                hestia_username: account.hestia_username,
                hestia_password: account.hestia_password,
                package_id: account.package_id,
                status: account.status.to_string(),
                billing_cycle: BILLING_CYCLE_MONTHLY.to_string(),
                monthly_price: account.monthly_price,
                next_billing_date: account.next_billing_date,
                created_at: now,
                updated_at: now,
            },
            websites: vec![Website {
                id: Uuid::new_v4(),
                account_id,
                subdomain: website.subdomain,
                custom_domain: website.custom_domain,
                aliases: website.aliases,
                ssl_enabled: website.ssl_enabled,
                ssl_forced: website.ssl_forced,
                ssl_verified: false,
                dns_configured: website.dns_configured,
                php_version: website.php_version,
                status: website.status.to_string(),
                created_at: now,
            }],
            databases: database
                .into_iter()
                .map(|db| CustomerDatabase {
                    id: Uuid::new_v4(),
                    account_id,
                    name: db.name,
                    username: db.username,
                    password: db.password,
                    host: db.host,
                    port: db.port,
                    created_at: now,
                })
                .collect(),
        };

        let mut state = self.state.lock().unwrap();
        if state
            .accounts
            .iter()
            .any(|d| d.account.hestia_username == detail.account.hestia_username)
        {
            return Err(StoreError::Conflict("hestia_username already exists".to_string()));
        }
        state.accounts.push(detail.clone());
        Ok(detail)
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        self.check_online()?;
        let state = self.state.lock().unwrap();
        Ok(state.accounts.iter().rev().map(|d| d.account.clone()).collect())
    }

    async fn find_account(&self, id: Uuid) -> Result<Option<AccountDetail>, StoreError> {
        self.check_online()?;
        let state = self.state.lock().unwrap();
        Ok(state.accounts.iter().find(|d| d.account.id == id).cloned())
    }

    async fn set_status(&self, id: Uuid, status: AccountStatus) -> Result<Account, StoreError> {
        self.update(id, |account| {
            account.status = status.to_string();
            Ok(())
        })
    }

    async fn extend_billing(&self, id: Uuid, months: u32) -> Result<Account, StoreError> {
        self.update(id, |account| {
            account.next_billing_date = advance_billing_date(account.next_billing_date, months)
                .ok_or_else(|| StoreError::Invalid(format!("{} months is out of range", months)))?;
            Ok(())
        })
    }

    async fn delete_account(&self, id: Uuid) -> Result<(), StoreError> {
        self.check_online()?;
        let mut state = self.state.lock().unwrap();
        let before = state.accounts.len();
        state.accounts.retain(|d| d.account.id != id);
        if state.accounts.len() == before {
            return Err(StoreError::NotFound(format!("account {}", id)));
        }
        Ok(())
    }

    async fn append_audit(&self, entry: NewAuditEntry) -> Result<AuditEntry, StoreError> {
        self.check_online()?;
        let row = AuditEntry {
            id: Uuid::new_v4(),
            action: entry.action.to_string(),
            outcome: entry.outcome.as_str().to_string(),
            account_id: entry.account_id,
            subject: entry.subject,
            message: entry.message,
            details: entry.details,
            created_at: Utc::now(),
        };
        self.state.lock().unwrap().audit.push(row.clone());
        Ok(row)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_online()
    }
}
