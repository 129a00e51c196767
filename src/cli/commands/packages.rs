use serde_json::json;
use tracing::warn;

use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::hestia::{HestiaApi, HestiaClient};
use crate::provisioning::PackageCatalog;

pub async fn handle(live: bool, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let mut catalog = PackageCatalog::load(&config.platform)?;

    if live {
        let client = HestiaClient::from_config(&config.hestia)?;
        match client.list_packages().await {
            Ok(listing) => catalog = catalog.overlay(&listing),
            Err(e) => warn!("Live package listing failed, showing static limits: {}", e),
        }
    }

    match output_format {
        OutputFormat::Json => {
            let packages: Vec<_> = catalog
                .list()
                .into_iter()
                .map(|p| {
                    json!({
                        "id": p.id,
                        "name": p.display_name,
                        "hestiaPackage": p.hestia_package,
                        "monthlyPrice": p.monthly_price,
                        "limits": p.resource_limits(),
                    })
                })
                .collect();
            output_json(&json!({ "packages": packages }))?;
        }
        OutputFormat::Text => {
            let rows: Vec<Vec<String>> = catalog
                .list()
                .into_iter()
                .map(|p| {
                    let limits = p.resource_limits();
                    vec![
                        p.id.to_string(),
                        p.hestia_package.clone(),
                        p.monthly_price.to_string(),
                        limits.disk_quota,
                        limits.bandwidth,
                        limits.websites,
                        limits.databases,
                        limits.email_accounts,
                    ]
                })
                .collect();
            output_table(
                &["ID", "HESTIA", "PRICE", "DISK", "BANDWIDTH", "WEB", "DB", "MAIL"],
                &rows,
            );
        }
    }
    Ok(())
}
