use thiserror::Error;

use super::compensation::CompensationFailure;
use super::request::FieldErrors;
use crate::database::StoreError;
use crate::hestia::HestiaError;

/// Why a provisioning run stopped
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to create hosting account: {0}")]
    RemoteAccount(#[source] HestiaError),

    #[error("Failed to create website: {source}")]
    RemoteHost {
        #[source]
        source: HestiaError,
        orphans: Vec<CompensationFailure>,
    },

    #[error("Failed to save account: {source}")]
    Persistence {
        #[source]
        source: StoreError,
        orphans: Vec<CompensationFailure>,
    },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        orphans: Vec<CompensationFailure>,
    },
}

impl ProvisionError {
    pub fn internal(message: impl Into<String>) -> Self {
        ProvisionError::Internal {
            message: message.into(),
            orphans: Vec::new(),
        }
    }

    /// Remote resources that could not be cleaned up
    pub fn orphans(&self) -> &[CompensationFailure] {
        match self {
            ProvisionError::RemoteHost { orphans, .. }
            | ProvisionError::Persistence { orphans, .. }
            | ProvisionError::Internal { orphans, .. } => orphans,
            _ => &[],
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ProvisionError::Validation(_) => "validation",
            ProvisionError::Configuration(_) => "configuration",
            ProvisionError::RemoteAccount(_) => "remote_account",
            ProvisionError::RemoteHost { .. } => "remote_host",
            ProvisionError::Persistence { .. } => "persistence",
            ProvisionError::Internal { .. } => "internal",
        }
    }
}
