//! HestiaCP command API client.
//!
//! Every operation is a form POST of a command name plus positional arguments.
//! [`HestiaApi::invoke`] is the only transport-facing method; the typed helpers on the
//! trait build commands and interpret replies so fakes only need to answer commands.

pub mod client;
pub mod command;
pub mod error;
pub mod reply;

use async_trait::async_trait;

pub use client::{HestiaClient, HestiaCredentials};
pub use command::{CommandOutcome, HestiaCommand};
pub use error::{HestiaError, TransportKind};
pub use reply::{Reply, Table, TableRow};

/// Arguments for `v-add-user`
#[derive(Debug, Clone)]
pub struct NewHestiaUser {
    pub username: String,
    pub password: String,
    pub email: String,
    pub package: String,
    pub name: String,
}

/// Arguments for `v-add-database`; HestiaCP prefixes both names with `<owner>_`
#[derive(Debug, Clone)]
pub struct NewHestiaDatabase {
    pub owner: String,
    pub name: String,
    pub user: String,
    pub password: String,
}

impl NewHestiaDatabase {
    pub fn full_name(&self) -> String {
        format!("{}_{}", self.owner, self.name)
    }

    pub fn full_user(&self) -> String {
        format!("{}_{}", self.owner, self.user)
    }
}

/// Raw output of the system status commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusProbe {
    Cpu,
    Memory,
    Disk,
    Network,
}

impl StatusProbe {
    pub fn command(&self) -> &'static str {
        match self {
            StatusProbe::Cpu => "v-list-sys-cpu-status",
            StatusProbe::Memory => "v-list-sys-memory-status",
            StatusProbe::Disk => "v-list-sys-disk-status",
            StatusProbe::Network => "v-list-sys-network-status",
        }
    }
}

#[async_trait]
pub trait HestiaApi: Send + Sync {
    /// Send one command and normalize the reply
    async fn invoke(&self, command: HestiaCommand) -> Result<Reply, HestiaError>;

    async fn create_user(&self, user: &NewHestiaUser) -> Result<(), HestiaError> {
        self.invoke(
            HestiaCommand::action("v-add-user")
                .arg(&user.username)
                .arg(&user.password)
                .arg(&user.email)
                .arg(&user.package)
                .arg(&user.name),
        )
        .await
        .map(|_| ())
    }

    async fn delete_user(&self, username: &str) -> Result<(), HestiaError> {
        self.invoke(HestiaCommand::action("v-delete-user").arg(username))
            .await
            .map(|_| ())
    }

    async fn user_exists(&self, username: &str) -> Result<bool, HestiaError> {
        match self
            .invoke(HestiaCommand::action("v-list-user").arg(username).arg("json"))
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn suspend_user(&self, username: &str) -> Result<(), HestiaError> {
        self.invoke(HestiaCommand::action("v-suspend-user").arg(username).arg("yes"))
            .await
            .map(|_| ())
    }

    async fn unsuspend_user(&self, username: &str) -> Result<(), HestiaError> {
        self.invoke(HestiaCommand::action("v-unsuspend-user").arg(username).arg("yes"))
            .await
            .map(|_| ())
    }

    /// `v-add-web-domain USER DOMAIN [IP] [RESTART] [ALIASES]`; an empty IP selects the default
    async fn add_web_domain(&self, username: &str, domain: &str, aliases: &[String]) -> Result<(), HestiaError> {
        self.invoke(
            HestiaCommand::action("v-add-web-domain")
                .arg(username)
                .arg(domain)
                .arg("")
                .arg("yes")
                .arg(aliases.join(",")),
        )
        .await
        .map(|_| ())
    }

    async fn add_letsencrypt(&self, username: &str, domain: &str, aliases: &[String]) -> Result<(), HestiaError> {
        self.invoke(
            HestiaCommand::action("v-add-letsencrypt-domain")
                .arg(username)
                .arg(domain)
                .arg(aliases.join(",")),
        )
        .await
        .map(|_| ())
    }

    async fn force_ssl(&self, username: &str, domain: &str) -> Result<(), HestiaError> {
        self.invoke(
            HestiaCommand::action("v-add-web-domain-ssl-force")
                .arg(username)
                .arg(domain)
                .arg("yes"),
        )
        .await
        .map(|_| ())
    }

    async fn set_backend_template(&self, username: &str, domain: &str, template: &str) -> Result<(), HestiaError> {
        self.invoke(
            HestiaCommand::action("v-change-web-domain-backend-tpl")
                .arg(username)
                .arg(domain)
                .arg(template)
                .arg("yes"),
        )
        .await
        .map(|_| ())
    }

    async fn add_database(&self, database: &NewHestiaDatabase) -> Result<(), HestiaError> {
        self.invoke(
            HestiaCommand::action("v-add-database")
                .arg(&database.owner)
                .arg(&database.name)
                .arg(&database.user)
                .arg(&database.password)
                .arg("mysql")
                .arg("localhost"),
        )
        .await
        .map(|_| ())
    }

    /// Package catalog as a table (`v-list-user-packages shell`)
    async fn list_packages(&self) -> Result<Table, HestiaError> {
        let reply = self
            .invoke(HestiaCommand::new("v-list-user-packages").arg("shell"))
            .await?;
        match reply {
            Reply::Table(table) => Ok(table),
            Reply::Empty => Ok(Table { columns: Vec::new(), rows: Vec::new(), skipped: 0 }),
            other => Err(HestiaError::Unexpected(format!(
                "package listing is not a table: {:?}",
                other
            ))),
        }
    }

    async fn system_status(&self, probe: StatusProbe) -> Result<String, HestiaError> {
        let reply = self.invoke(HestiaCommand::new(probe.command())).await?;
        Ok(match reply {
            Reply::Text(text) => text,
            Reply::Empty => String::new(),
            other => other.to_data().map(|v| v.to_string()).unwrap_or_default(),
        })
    }
}
