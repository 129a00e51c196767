use clap::Subcommand;

use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::hestia::{CommandOutcome, HestiaApi, HestiaClient, HestiaCommand};
use crate::services::collect_system_status;

#[derive(Subcommand)]
pub enum HestiaCommands {
    #[command(about = "Run one command against the HestiaCP API")]
    Invoke {
        #[arg(help = "Command name, e.g. v-list-users")]
        cmd: String,

        #[arg(help = "Positional arguments")]
        args: Vec<String>,

        #[arg(long, help = "Ask for a bare return code instead of output")]
        returncode: bool,
    },

    #[command(about = "Collect CPU, memory, disk and network status")]
    Status,
}

pub async fn handle(cmd: HestiaCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = HestiaClient::from_config(&config.hestia)?;

    match cmd {
        HestiaCommands::Invoke { cmd, args, returncode } => {
            let mut command = HestiaCommand::new(cmd).args(args);
            if returncode {
                command = command.returncode();
            }

            let outcome = CommandOutcome::from(client.invoke(command).await);
            match output_format {
                OutputFormat::Json => output_json(&outcome)?,
                OutputFormat::Text => match (&outcome.error, &outcome.data) {
                    (Some(error), _) => eprintln!("Error: {}", error),
                    (None, Some(data)) => output_json(data)?,
                    (None, None) => println!("✓ returncode {}", outcome.returncode.unwrap_or(0)),
                },
            }

            if !outcome.success {
                anyhow::bail!("command failed");
            }
            Ok(())
        }
        HestiaCommands::Status => {
            let status = collect_system_status(&client).await;
            match output_format {
                OutputFormat::Json => output_json(&status)?,
                OutputFormat::Text => {
                    for (name, probe) in [
                        ("cpu", &status.cpu),
                        ("memory", &status.memory),
                        ("disk", &status.disk),
                        ("network", &status.network),
                    ] {
                        println!("== {} ==", name);
                        match (&probe.output, &probe.error) {
                            (Some(output), _) => println!("{}", output.trim_end()),
                            (None, Some(error)) => println!("unavailable: {}", error),
                            (None, None) => println!("(empty)"),
                        }
                    }
                }
            }
            Ok(())
        }
    }
}
