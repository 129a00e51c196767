use std::future::Future;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Serialize;
use tracing::{info, warn};

type Undo = Box<dyn FnOnce() -> BoxFuture<'static, Result<(), String>> + Send>;

/// An undo action that could not be completed; the resource it names may be orphaned
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompensationFailure {
    pub step: String,
    pub error: String,
}

/// Undo actions for committed remote steps, run newest first on failure
#[derive(Default)]
pub struct CompensationStack {
    entries: Vec<(String, Undo)>,
}

impl CompensationStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<F, Fut>(&mut self, step: impl Into<String>, undo: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        self.entries.push((step.into(), Box::new(move || undo().boxed())));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run every undo action in reverse order. A failing action does not stop the rest.
    pub async fn unwind(self) -> Vec<CompensationFailure> {
        let mut failures = Vec::new();
        for (step, undo) in self.entries.into_iter().rev() {
            match undo().await {
                Ok(()) => info!("Compensated: {}", step),
                Err(error) => {
                    warn!("Compensation '{}' failed, resource may be orphaned: {}", step, error);
                    failures.push(CompensationFailure { step, error });
                }
            }
        }
        failures
    }

    /// Forget the undo actions once the workflow has succeeded
    pub fn commit(self) -> usize {
        self.entries.len()
    }
}
