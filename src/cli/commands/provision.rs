use clap::Args;
use serde_json::json;

use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::provisioning::{ProvisionError, ProvisioningRequest};
use crate::server::AppState;

#[derive(Args, Debug)]
pub struct ProvisionArgs {
    #[arg(long, help = "Customer full name")]
    pub name: String,

    #[arg(long, help = "Customer contact email")]
    pub email: String,

    #[arg(long, help = "Package id: starter, business or enterprise")]
    pub package: String,

    #[arg(long)]
    pub phone: Option<String>,

    #[arg(long)]
    pub company: Option<String>,

    #[arg(long, help = "Customer-owned domain to alias onto the website")]
    pub custom_domain: Option<String>,

    #[arg(long, help = "PHP version for the website backend")]
    pub php: Option<String>,

    #[arg(long, help = "Also create a MySQL database")]
    pub database: bool,
}

impl ProvisionArgs {
    pub fn into_request(self) -> ProvisioningRequest {
        ProvisioningRequest {
            name: self.name,
            email: self.email,
            phone: self.phone,
            company: self.company,
            custom_domain: self.custom_domain,
            package_id: self.package,
            php_version: self.php,
            need_database: self.database,
        }
    }
}

pub async fn handle(args: ProvisionArgs, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let state = AppState::from_config(config)?;
    let request = args.into_request();

    let outcome = match state.provisioner.provision(&request).await {
        Ok(outcome) => outcome,
        Err(ProvisionError::Validation(fields)) => {
            match output_format {
                OutputFormat::Json => output_json(&json!({
                    "success": false,
                    "error": "Validation failed",
                    "details": fields
                }))?,
                OutputFormat::Text => {
                    let mut fields: Vec<_> = fields.into_iter().collect();
                    fields.sort();
                    for (field, message) in fields {
                        eprintln!("{}: {}", field, message);
                    }
                }
            }
            anyhow::bail!("request rejected");
        }
        Err(e) => {
            output_error(&output_format, &e.to_string(), Some(e.kind()))?;
            if !e.orphans().is_empty() {
                eprintln!("Resources left behind: {:?}", e.orphans());
            }
            anyhow::bail!("provisioning failed");
        }
    };

    match output_format {
        OutputFormat::Json => output_json(&json!({ "success": true, "data": outcome }))?,
        OutputFormat::Text => {
            println!("✓ Provisioned {} ({})", outcome.customer.name, outcome.customer.id);
            println!("Username:  {}", outcome.credentials.hestia_username);
            println!("Password:  {}", outcome.credentials.hestia_password);
            println!("Panel:     {}", outcome.credentials.panel_url);
            println!("Website:   {} [{}]", outcome.website.url, outcome.website.status);
            if let Some(db) = &outcome.database {
                println!("Database:  {} / {} @ {}:{}", db.name, db.username, db.host, db.port);
            }
            for note in &outcome.next_steps.notes {
                println!("- {}", note);
            }
            for record in &outcome.next_steps.dns_records {
                println!("  {} {} -> {} (ttl {})", record.record_type, record.name, record.value, record.ttl);
            }
        }
    }
    Ok(())
}
