//! Output Surfaces
//!
//! One [`OutputSurface`] per video output runs the live synchronization
//! loop: two independent interval cadences (poll vote freshness and Q&A
//! queue freshness) each refresh their half of the content cache, resolve
//! the winner, and hand any detected change to the animation orchestrator.
//!
//! Each cadence runs its full refresh-resolve-classify-dispatch pipeline
//! on every tick; the loops are peers, not a primary and a helper. The
//! orchestrator work is spawned so a long transition never blocks the next
//! tick, and its sequence guard resolves any overlap in favor of the
//! latest change.
//!
//! A preview surface is the same type pointed at any output index; there
//! is no separate preview pipeline to drift out of sync with program.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::animation::{FrameClock, Orchestrator, RenderState, TimerFrameClock};
use crate::config::EngineConfig;
use crate::content::OutputIndex;
use crate::repository::ContentRepository;
use crate::sync::{SyncChange, SyncState};

/// Live synchronization loop for one video output
pub struct OutputSurface {
    output: OutputIndex,
    repository: Arc<dyn ContentRepository>,
    orchestrator: Arc<Orchestrator>,
    config: EngineConfig,
}

impl OutputSurface {
    /// Create a surface for one output with a timer-driven frame clock
    #[must_use]
    pub fn new(
        repository: Arc<dyn ContentRepository>,
        output: OutputIndex,
        config: EngineConfig,
    ) -> Self {
        let clock: Arc<dyn FrameClock> = Arc::new(TimerFrameClock::new(config.frame_interval));
        Self::with_frame_clock(repository, output, config, clock)
    }

    /// Create a surface with an injected frame clock
    #[must_use]
    pub fn with_frame_clock(
        repository: Arc<dyn ContentRepository>,
        output: OutputIndex,
        config: EngineConfig,
        clock: Arc<dyn FrameClock>,
    ) -> Self {
        let orchestrator = Arc::new(Orchestrator::new(output, config.animation.clone(), clock));
        Self {
            output,
            repository,
            orchestrator,
            config,
        }
    }

    /// Create a preview surface for any output
    ///
    /// Identical to a program surface: the preview renders exactly what
    /// the selected output would show, via the same pipeline.
    #[must_use]
    pub fn preview(
        repository: Arc<dyn ContentRepository>,
        output: OutputIndex,
        config: EngineConfig,
    ) -> Self {
        Self::new(repository, output, config)
    }

    /// The output this surface renders
    #[must_use]
    pub fn output(&self) -> OutputIndex {
        self.output
    }

    /// Snapshot of the current render state
    #[must_use]
    pub fn render_state(&self) -> RenderState {
        self.orchestrator.render_state()
    }

    /// Spawn the synchronization loop, returning its control handle
    #[must_use]
    pub fn spawn(self) -> SurfaceHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let output = self.output;
        let state = self.orchestrator.shared_state();
        let join = tokio::spawn(self.run(shutdown_rx));
        SurfaceHandle {
            output,
            state,
            shutdown: shutdown_tx,
            join,
        }
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut sync = SyncState::new(self.output);

        let mut poll_tick = interval(self.config.poll_refresh);
        poll_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut qa_tick = interval(self.config.qa_refresh);
        qa_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            output = %self.output,
            poll_ms = self.config.poll_refresh.as_millis() as u64,
            qa_ms = self.config.qa_refresh.as_millis() as u64,
            "output surface started"
        );

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = poll_tick.tick() => {
                    sync.refresh_polls(self.repository.as_ref()).await;
                    self.dispatch(sync.evaluate());
                }
                _ = qa_tick.tick() => {
                    sync.refresh_qa(self.repository.as_ref()).await;
                    self.dispatch(sync.evaluate());
                }
            }
        }

        info!(output = %self.output, "output surface stopped");
    }

    fn dispatch(&self, change: SyncChange) {
        if matches!(change, SyncChange::Unchanged) {
            return;
        }
        debug!(output = %self.output, change = change.label(), "dispatching to orchestrator");
        // Admit synchronously so dispatch order is admission order; only
        // the transition itself runs on a spawned task.
        let Some(transition) = self.orchestrator.admit(change) else {
            return;
        };
        let orchestrator = Arc::clone(&self.orchestrator);
        tokio::spawn(async move { orchestrator.run(transition).await });
    }
}

/// Control handle for a spawned surface
///
/// Dropping the handle without calling [`SurfaceHandle::shutdown`] also
/// stops the loop (the shutdown channel closes), but detaches the task.
pub struct SurfaceHandle {
    output: OutputIndex,
    state: Arc<RwLock<RenderState>>,
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl SurfaceHandle {
    /// The output the surface renders
    #[must_use]
    pub fn output(&self) -> OutputIndex {
        self.output
    }

    /// Snapshot of the current render state
    #[must_use]
    pub fn render_state(&self) -> RenderState {
        self.state.read().clone()
    }

    /// Handle to the render state a renderer reads directly
    #[must_use]
    pub fn shared_state(&self) -> Arc<RwLock<RenderState>> {
        Arc::clone(&self.state)
    }

    /// Stop the synchronization loop and wait for it to finish
    ///
    /// In-flight orchestrator transitions complete against the detached
    /// render state; nothing reads it afterwards.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.join.await;
    }
}
