use std::sync::Arc;

use anyhow::Context;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::{ApiConfig, AppConfig};
use crate::database::{AccountStore, DatabaseManager, PgAccountStore};
use crate::dns::{AaPanelDns, DnsApi};
use crate::handlers;
use crate::hestia::{HestiaApi, HestiaClient};
use crate::provisioning::{PackageCatalog, Provisioner, ProvisionerSettings};
use crate::services::AccountService;

/// Shared handles for every request
#[derive(Clone)]
pub struct AppState {
    pub provisioner: Arc<Provisioner>,
    pub accounts: Arc<AccountService>,
    pub hestia: Arc<dyn HestiaApi>,
    pub store: Arc<dyn AccountStore>,
}

impl AppState {
    pub fn new(
        hestia: Arc<dyn HestiaApi>,
        dns: Arc<dyn DnsApi>,
        store: Arc<dyn AccountStore>,
        catalog: PackageCatalog,
        settings: ProvisionerSettings,
    ) -> Self {
        let provisioner = Provisioner::new(hestia.clone(), dns, store.clone(), catalog, settings);
        let accounts = AccountService::new(hestia.clone(), store.clone());

        Self {
            provisioner: Arc::new(provisioner),
            accounts: Arc::new(accounts),
            hestia,
            store,
        }
    }

    /// Construct the real clients from configuration. Nothing connects yet.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        config.validate().context("invalid configuration")?;
        let hestia = HestiaClient::from_config(&config.hestia).context("failed to build HestiaCP client")?;
        let dns = AaPanelDns::from_config(&config.dns).context("failed to build aaPanel DNS client")?;
        let database = DatabaseManager::new(&config.database).context("failed to configure database pool")?;
        let catalog = PackageCatalog::load(&config.platform).context("failed to load package catalog")?;

        info!("HestiaCP endpoint: {}", hestia.endpoint());

        Ok(Self::new(
            Arc::new(hestia),
            Arc::new(dns),
            Arc::new(PgAccountStore::new(database.pool().clone())),
            catalog,
            ProvisionerSettings::from_config(config),
        ))
    }
}

pub fn app(state: AppState, api: &ApiConfig) -> Router {
    let router = Router::new()
        // Public
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        // Customers
        .route(
            "/api/customers",
            get(handlers::customers::customer_list).post(handlers::customers::customer_create),
        )
        .route(
            "/api/customers/:id",
            get(handlers::customers::customer_show).delete(handlers::customers::customer_delete),
        )
        .route("/api/customers/:id/suspend", post(handlers::customers::customer_suspend))
        .route("/api/customers/:id/unsuspend", post(handlers::customers::customer_unsuspend))
        .route(
            "/api/customers/:id/billing/extend",
            post(handlers::customers::customer_extend_billing),
        )
        // Catalog and server
        .route("/api/packages", get(handlers::packages::package_list))
        .route("/api/system/status", get(handlers::system::system_status))
        .with_state(state)
        .layer(cors_layer(&api.cors_origins));

    if api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}
