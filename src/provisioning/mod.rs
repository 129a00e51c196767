pub mod compensation;
pub mod error;
pub mod generate;
pub mod orchestrator;
pub mod outcome;
pub mod package;
pub mod request;

pub use compensation::{CompensationFailure, CompensationStack};
pub use error::ProvisionError;
pub use orchestrator::{Provisioner, ProvisionerSettings};
pub use outcome::ProvisioningOutcome;
pub use package::{Package, PackageCatalog, Quota, ResourceLimits};
pub use request::{FieldErrors, PackageId, ProvisioningRequest, ValidRequest};
