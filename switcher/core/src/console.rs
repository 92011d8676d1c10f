//! Operator Console
//!
//! The control-room facade an operator UI drives: take content live, route
//! it to outputs, and walk the Q&A queue. All writes are fire-and-forget
//! against the content repository; a failed write is logged and dropped,
//! never retried, because the synchronization loop converges every output
//! to whatever state the store settles on.
//!
//! The console never touches render state directly. Pressing "go live"
//! mutates the store, and the outputs follow within one refresh cadence.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::content::{ContentId, LayoutVariant, OutputIndex};
use crate::repository::{ContentRepository, RepositoryError};
use crate::surface::OutputSurface;

/// Control facade over one event's content store
#[derive(Clone)]
pub struct OperatorConsole {
    repository: Arc<dyn ContentRepository>,
    config: EngineConfig,
}

impl OperatorConsole {
    /// Create a console over a repository
    #[must_use]
    pub fn new(repository: Arc<dyn ContentRepository>, config: EngineConfig) -> Self {
        Self { repository, config }
    }

    /// The repository this console writes to
    #[must_use]
    pub fn repository(&self) -> Arc<dyn ContentRepository> {
        Arc::clone(&self.repository)
    }

    /// Build a preview surface for any output
    #[must_use]
    pub fn preview(&self, output: OutputIndex) -> OutputSurface {
        OutputSurface::preview(Arc::clone(&self.repository), output, self.config.clone())
    }

    fn report(operation: &str, id: &ContentId, result: Result<(), RepositoryError>) {
        match result {
            Ok(()) => info!(%operation, %id, "operator action applied"),
            Err(error) => warn!(%operation, %id, %error, "operator action dropped"),
        }
    }

    /// Toggle an item's live eligibility
    pub async fn set_live(&self, id: &ContentId, live: bool) {
        let result = self.repository.set_active(id, live).await;
        Self::report(if live { "go live" } else { "take off" }, id, result);
    }

    /// Route one layout variant of an item to a set of outputs
    pub async fn assign(
        &self,
        id: &ContentId,
        variant: LayoutVariant,
        outputs: impl IntoIterator<Item = OutputIndex>,
    ) {
        let outputs: BTreeSet<OutputIndex> = outputs.into_iter().collect();
        let result = self.repository.set_assignment(id, variant, outputs).await;
        Self::report("assign", id, result);
    }

    /// Cue a question into the broadcast queue
    pub async fn cue(&self, id: &ContentId) {
        let result = self.repository.cue(id).await;
        Self::report("cue", id, result);
    }

    /// Take a question live
    pub async fn play(&self, id: &ContentId) {
        let result = self.repository.play(id).await;
        Self::report("play", id, result);
    }

    /// Retire the question and advance the queue
    pub async fn stop(&self, id: &ContentId) {
        let result = self.repository.stop(id).await;
        Self::report("stop", id, result);
    }

    /// Set or clear the Next marker on a question
    pub async fn set_next(&self, id: &ContentId, next: bool) {
        let result = self.repository.set_next(id, next).await;
        Self::report("set next", id, result);
    }
}
