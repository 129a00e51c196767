use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::manager::StoreError;
use super::models::{
    Account, AccountDetail, AuditEntry, CustomerDatabase, NewAccountGraph, NewAuditEntry, Website,
};
use crate::types::AccountStatus;

/// Persistence seam for accounts and the audit trail
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn username_exists(&self, username: &str) -> Result<bool, StoreError>;

    async fn subdomain_exists(&self, subdomain: &str) -> Result<bool, StoreError>;

    /// Insert account, website and optional database atomically
    async fn create_account(&self, graph: NewAccountGraph) -> Result<AccountDetail, StoreError>;

    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError>;

    async fn find_account(&self, id: Uuid) -> Result<Option<AccountDetail>, StoreError>;

    async fn set_status(&self, id: Uuid, status: AccountStatus) -> Result<Account, StoreError>;

    async fn extend_billing(&self, id: Uuid, months: u32) -> Result<Account, StoreError>;

    async fn delete_account(&self, id: Uuid) -> Result<(), StoreError>;

    async fn append_audit(&self, entry: NewAuditEntry) -> Result<AuditEntry, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn children(&self, account: Account) -> Result<AccountDetail, StoreError> {
        let websites = sqlx::query_as::<_, Website>(
            "SELECT * FROM websites WHERE account_id = $1 ORDER BY created_at",
        )
        .bind(account.id)
        .fetch_all(&self.pool)
        .await?;

        let databases = sqlx::query_as::<_, CustomerDatabase>(
            "SELECT * FROM customer_databases WHERE account_id = $1 ORDER BY created_at",
        )
        .bind(account.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(AccountDetail {
            account,
            websites,
            databases,
        })
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn username_exists(&self, username: &str) -> Result<bool, StoreError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM accounts WHERE hestia_username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn subdomain_exists(&self, subdomain: &str) -> Result<bool, StoreError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM websites WHERE subdomain = $1)")
                .bind(subdomain)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn create_account(&self, graph: NewAccountGraph) -> Result<AccountDetail, StoreError> {
        let NewAccountGraph {
            account,
            website,
            database,
        } = graph;
        let account_id = Uuid::new_v4();

        let mut tx = self.pool.begin().await?;

        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (
                id, name, email, phone, company, hestia_username, hestia_password,
                package_id, status, billing_cycle, monthly_price, next_billing_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(account_id)
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.phone)
        .bind(&account.company)
        .bind(&account.hestia_username)
        .bind(&account.hestia_password)
        .bind(&account.package_id)
        .bind(account.status.as_str())
        .bind(super::models::account::BILLING_CYCLE_MONTHLY)
        .bind(account.monthly_price)
        .bind(account.next_billing_date)
        .fetch_one(&mut *tx)
        .await?;

        let website = sqlx::query_as::<_, Website>(
            r#"
            INSERT INTO websites (
                id, account_id, subdomain, custom_domain, aliases, ssl_enabled,
                ssl_forced, ssl_verified, dns_configured, php_version, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, false, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(account_id)
        .bind(&website.subdomain)
        .bind(&website.custom_domain)
        .bind(&website.aliases)
        .bind(website.ssl_enabled)
        .bind(website.ssl_forced)
        .bind(website.dns_configured)
        .bind(&website.php_version)
        .bind(website.status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let mut databases = Vec::new();
        if let Some(db) = database {
            let row = sqlx::query_as::<_, CustomerDatabase>(
                r#"
                INSERT INTO customer_databases (id, account_id, name, username, password, host, port)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(account_id)
            .bind(&db.name)
            .bind(&db.username)
            .bind(&db.password)
            .bind(&db.host)
            .bind(db.port)
            .fetch_one(&mut *tx)
            .await?;
            databases.push(row);
        }

        tx.commit().await?;

        Ok(AccountDetail {
            account,
            websites: vec![website],
            databases,
        })
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        let accounts = sqlx::query_as::<_, Account>("SELECT * FROM accounts ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(accounts)
    }

    async fn find_account(&self, id: Uuid) -> Result<Option<AccountDetail>, StoreError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match account {
            Some(account) => Ok(Some(self.children(account).await?)),
            None => Ok(None),
        }
    }

    async fn set_status(&self, id: Uuid, status: AccountStatus) -> Result<Account, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            "UPDATE accounts SET status = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(account)
    }

    async fn extend_billing(&self, id: Uuid, months: u32) -> Result<Account, StoreError> {
        let months = i32::try_from(months)
            .map_err(|_| StoreError::Invalid(format!("{} months is out of range", months)))?;

        let account = sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts
            SET next_billing_date = (next_billing_date + make_interval(months => $2))::date,
                updated_at = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(months)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(account)
    }

    async fn delete_account(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("account {}", id)));
        }
        Ok(())
    }

    async fn append_audit(&self, entry: NewAuditEntry) -> Result<AuditEntry, StoreError> {
        let row = sqlx::query_as::<_, AuditEntry>(
            r#"
            INSERT INTO audit_log (id, action, outcome, account_id, subject, message, details)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.action)
        .bind(entry.outcome.as_str())
        .bind(entry.account_id)
        .bind(&entry.subject)
        .bind(&entry.message)
        .bind(&entry.details)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
