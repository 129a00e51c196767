pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "panel")]
#[command(about = "Hestia Panel CLI - operator tools for customer provisioning")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Provision a customer account end to end")]
    Provision(commands::provision::ProvisionArgs),

    #[command(about = "Show the hosting package catalog")]
    Packages {
        #[arg(long, help = "Refresh limits from HestiaCP before printing")]
        live: bool,
    },

    #[command(about = "Talk to the HestiaCP command API directly")]
    Hestia {
        #[command(subcommand)]
        cmd: commands::hestia::HestiaCommands,
    },

    #[command(about = "Account database maintenance")]
    Db {
        #[command(subcommand)]
        cmd: commands::db::DbCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = crate::config::config();

    match cli.command {
        Commands::Provision(args) => commands::provision::handle(args, config, output_format).await,
        Commands::Packages { live } => commands::packages::handle(live, config, output_format).await,
        Commands::Hestia { cmd } => commands::hestia::handle(cmd, config, output_format).await,
        Commands::Db { cmd } => commands::db::handle(cmd, config, output_format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provision_flags() {
        let cli = Cli::parse_from([
            "panel",
            "--json",
            "provision",
            "--name",
            "Acme Co",
            "--email",
            "a@acme.test",
            "--package",
            "starter",
            "--custom-domain",
            "acme.test",
            "--database",
        ]);
        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Json));
        match cli.command {
            Commands::Provision(args) => {
                let request = args.into_request();
                assert_eq!(request.package_id, "starter");
                assert_eq!(request.custom_domain.as_deref(), Some("acme.test"));
                assert!(request.need_database);
            }
            _ => panic!("expected provision"),
        }
    }

    #[test]
    fn parses_raw_hestia_invocation() {
        let cli = Cli::parse_from(["panel", "hestia", "invoke", "v-list-user", "admin", "json", "--returncode"]);
        match cli.command {
            Commands::Hestia {
                cmd: commands::hestia::HestiaCommands::Invoke { cmd, args, returncode },
            } => {
                assert_eq!(cmd, "v-list-user");
                assert_eq!(args, vec!["admin", "json"]);
                assert!(returncode);
            }
            _ => panic!("expected hestia invoke"),
        }
    }
}
