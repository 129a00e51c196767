use clap::Subcommand;

use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::DatabaseManager;

#[derive(Subcommand)]
pub enum DbCommands {
    #[command(about = "Apply pending schema migrations")]
    Migrate,

    #[command(about = "Check that the account database answers")]
    Ping,
}

pub async fn handle(cmd: DbCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let database = DatabaseManager::new(&config.database)?;

    let result = match cmd {
        DbCommands::Migrate => database
            .migrate()
            .await
            .map(|_| "Migrations applied"),
        DbCommands::Ping => database.health_check().await.map(|_| "Database is reachable"),
    };
    database.close().await;

    match result {
        Ok(message) => output_success(&output_format, message, None),
        Err(e) => {
            output_error(&output_format, &e.to_string(), None)?;
            anyhow::bail!("database command failed")
        }
    }
}
