// handlers/packages.rs - GET /api/packages handler

use axum::extract::State;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::middleware::{ApiResponse, ApiResult};
use crate::provisioning::{Package, ResourceLimits};
use crate::server::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageView {
    pub id: String,
    pub name: String,
    pub hestia_package: String,
    pub monthly_price: Decimal,
    pub limits: ResourceLimits,
}

impl From<&Package> for PackageView {
    fn from(package: &Package) -> Self {
        Self {
            id: package.id.to_string(),
            name: package.display_name.clone(),
            hestia_package: package.hestia_package.clone(),
            monthly_price: package.monthly_price,
            limits: package.resource_limits(),
        }
    }
}

/// Offered tiers in catalog order, with live limits when enabled
pub async fn package_list(State(state): State<AppState>) -> ApiResult<Vec<PackageView>> {
    let catalog = state.provisioner.current_catalog().await;
    Ok(ApiResponse::success(catalog.list().into_iter().map(PackageView::from).collect()))
}
