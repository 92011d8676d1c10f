//! Animation Orchestrator
//!
//! Sequences the two-phase enter/exit transitions for one output so that
//! swapping visible content never flickers or shows stale data.
//!
//! # Sequencing contract
//!
//! - Enter: mount the content in its hidden pre-transition state, wait
//!   until that state has been committed to the rendering surface (two
//!   chained frame boundaries - a single deferral can run before layout
//!   commits), wait the configurable enter delay, then flip to visible so
//!   the transition animates from a real starting point.
//! - Exit: flip to hidden immediately, then unmount after the fixed exit
//!   duration so the render tree never retains a ghost of the old item.
//! - Swap: the full exit completes before the new item mounts; two
//!   different items are never cross-faded.
//!
//! # Cancellation
//!
//! A change is admitted synchronously: [`Orchestrator::admit`] claims the
//! next sequence number and records the change's target content before any
//! transition task runs, so a later admission outranks an earlier one even
//! if the earlier task has not been polled yet. Every scheduled step
//! captures that sequence and the target item's identity, and re-validates
//! both before mutating the render state. Stale steps silently discard
//! themselves - the orchestrator always honors the latest requested
//! content. Timers are never cancelled, only out-validated, and a
//! torn-down surface leaves pending steps mutating an orphaned state
//! object, which is harmless.
//!
//! A data refresh arriving while a transition for the same item is still
//! in flight is folded into the recorded target, so the item mounts and
//! flips with the freshest data instead of the snapshot taken when the
//! transition was admitted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::content::OutputIndex;
use crate::resolver::ResolvedContent;
use crate::sync::SyncChange;

/// Fixed exit transition duration before the old item is unmounted
pub const EXIT_DURATION_MS: u64 = 500;

/// Fixed stagger between background and content when background-first is on
pub const BACKGROUND_STAGGER_MS: u64 = 300;

/// Frame boundaries to wait before the hidden state counts as committed
pub const COMMIT_FRAMES: u32 = 2;

/// Visual style of an enter or exit transition
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransitionStyle {
    /// Opacity fade
    #[default]
    Fade,
    /// Slide in/out toward the left edge
    SlideLeft,
    /// Slide in/out toward the right edge
    SlideRight,
    /// Slide in/out toward the top edge
    SlideUp,
    /// Slide in/out toward the bottom edge
    SlideDown,
    /// Scale from/to zero
    Scale,
}

/// Where the content layer currently is in its transition
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransitionPhase {
    /// Pre-enter or post-exit end state
    #[default]
    Hidden,
    /// Fully entered
    Visible,
}

/// Orchestrator tuning for one output
#[derive(Clone, Debug)]
pub struct AnimationConfig {
    /// Delay between the committed hidden paint and the visible flip
    pub enter_delay: Duration,
    /// Style the renderer applies on enter
    pub enter_style: TransitionStyle,
    /// Style the renderer applies on exit
    pub exit_style: TransitionStyle,
    /// Let the background layer reach visibility before the content flip
    pub background_first: bool,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            enter_delay: Duration::from_millis(100),
            enter_style: TransitionStyle::default(),
            exit_style: TransitionStyle::default(),
            background_first: false,
        }
    }
}

/// Abstract frame-boundary scheduler
///
/// "Wait N frame boundaries then apply" is the portable form of the
/// wait-for-paint trick; any event loop can implement it. The timer-based
/// implementation below approximates a boundary with one frame interval.
#[async_trait]
pub trait FrameClock: Send + Sync {
    /// Complete at the next frame boundary
    async fn frame_boundary(&self);
}

/// Timer-driven frame clock (one boundary per frame interval)
#[derive(Clone, Debug)]
pub struct TimerFrameClock {
    frame: Duration,
}

impl TimerFrameClock {
    /// Create a clock with the given frame interval
    #[must_use]
    pub fn new(frame: Duration) -> Self {
        Self { frame }
    }
}

impl Default for TimerFrameClock {
    fn default() -> Self {
        // ~60fps
        Self::new(Duration::from_millis(16))
    }
}

#[async_trait]
impl FrameClock for TimerFrameClock {
    async fn frame_boundary(&self) {
        tokio::time::sleep(self.frame).await;
    }
}

/// The per-output state a rendering surface reads
///
/// Owned by that output's surface instance and passed by reference into
/// orchestrator steps - never a shared singleton across outputs.
#[derive(Clone, Debug, Default)]
pub struct RenderState {
    /// Currently mounted content, if any
    pub content: Option<ResolvedContent>,
    /// Transition phase of the content layer
    pub phase: TransitionPhase,
    /// Whether the background layer is visible
    pub background_visible: bool,
}

impl RenderState {
    /// Whether the output is showing fully entered content
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.content.is_some() && self.phase == TransitionPhase::Visible
    }
}

/// An admitted transition: its sequence was claimed and its target
/// recorded synchronously, so a later admission outranks it even before
/// its task first runs
#[derive(Clone, Copy, Debug)]
pub struct Transition {
    sequence: u64,
    kind: TransitionKind,
}

#[derive(Clone, Copy, Debug)]
enum TransitionKind {
    Enter,
    Exit,
    Swap,
}

/// Two-phase transition sequencer for one output
pub struct Orchestrator {
    output: OutputIndex,
    state: Arc<RwLock<RenderState>>,
    clock: Arc<dyn FrameClock>,
    config: AnimationConfig,
    sequence: AtomicU64,
    // Latest requested content. Refreshes fold into it so an in-flight
    // transition mounts and flips with fresh data.
    target: RwLock<Option<ResolvedContent>>,
}

impl Orchestrator {
    /// Create an orchestrator with its own isolated render state
    #[must_use]
    pub fn new(output: OutputIndex, config: AnimationConfig, clock: Arc<dyn FrameClock>) -> Self {
        Self {
            output,
            state: Arc::new(RwLock::new(RenderState::default())),
            clock,
            config,
            sequence: AtomicU64::new(0),
            target: RwLock::new(None),
        }
    }

    /// Handle to the render state the surface's renderer reads
    #[must_use]
    pub fn shared_state(&self) -> Arc<RwLock<RenderState>> {
        Arc::clone(&self.state)
    }

    /// Snapshot of the current render state
    #[must_use]
    pub fn render_state(&self) -> RenderState {
        self.state.read().clone()
    }

    /// The configured transition styles and delay
    #[must_use]
    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    fn begin(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, sequence: u64) -> bool {
        self.sequence.load(Ordering::SeqCst) == sequence
    }

    /// Admit one classified change synchronously
    ///
    /// Refreshes are applied immediately and return `None`. Transitions
    /// claim the next sequence number and record their target content;
    /// run the returned [`Transition`] (spawned or awaited) to play it
    /// out. Admission order alone decides which change wins.
    pub fn admit(&self, change: SyncChange) -> Option<Transition> {
        let (kind, target) = match change {
            SyncChange::Unchanged => return None,
            SyncChange::Refresh(content) => {
                self.refresh(content);
                return None;
            }
            SyncChange::Enter(content) => (TransitionKind::Enter, Some(content)),
            SyncChange::Exit { .. } => (TransitionKind::Exit, None),
            SyncChange::Swap { next, .. } => (TransitionKind::Swap, Some(next)),
        };
        let sequence = self.begin();
        *self.target.write() = target;
        Some(Transition { sequence, kind })
    }

    /// Run an admitted transition to completion
    ///
    /// A transition admitted after this one invalidates its remaining
    /// steps.
    pub async fn run(&self, transition: Transition) {
        let Transition { sequence, kind } = transition;
        match kind {
            TransitionKind::Enter => self.enter(sequence).await,
            TransitionKind::Exit => self.exit(sequence).await,
            TransitionKind::Swap => {
                self.exit(sequence).await;
                if self.is_current(sequence) {
                    self.enter(sequence).await;
                }
            }
        }
    }

    /// Apply one classified change, admitting and running it in one call
    pub async fn apply(&self, change: SyncChange) {
        if let Some(transition) = self.admit(change) {
            self.run(transition).await;
        }
    }

    /// Silent data update: same item identity, no phase change
    ///
    /// Folds into the recorded target as well, so a refresh landing while
    /// the item's transition is still pending (mid-exit of a swap, or
    /// inside a long enter delay) is carried by the transition instead of
    /// being lost.
    fn refresh(&self, content: ResolvedContent) {
        {
            let mut target = self.target.write();
            if target.as_ref().is_some_and(|t| t.id() == content.id()) {
                *target = Some(content.clone());
            }
        }
        let mut state = self.state.write();
        let mounted = state
            .content
            .as_ref()
            .is_some_and(|current| current.id() == content.id());
        if mounted {
            state.content = Some(content);
            debug!(output = %self.output, "content refreshed in place");
        }
    }

    async fn enter(&self, sequence: u64) {
        let Some(content) = self.target.read().clone() else {
            return;
        };
        let id = content.id().clone();
        {
            if !self.is_current(sequence) {
                return;
            }
            let mut state = self.state.write();
            state.content = Some(content);
            state.phase = TransitionPhase::Hidden;
            state.background_visible = false;
        }
        debug!(output = %self.output, item = %id, "mounted hidden, awaiting paint commit");

        // The hidden state must survive at least one full paint cycle
        // before the visible flip, or the transition starts from nowhere.
        for _ in 0..COMMIT_FRAMES {
            self.clock.frame_boundary().await;
        }
        tokio::time::sleep(self.config.enter_delay).await;

        if !self.is_current(sequence) {
            debug!(output = %self.output, item = %id, "stale enter discarded");
            return;
        }

        if self.config.background_first {
            {
                let mut state = self.state.write();
                if state.content.as_ref().map(ResolvedContent::id) != Some(&id) {
                    return;
                }
                state.background_visible = true;
            }
            tokio::time::sleep(Duration::from_millis(BACKGROUND_STAGGER_MS)).await;
            if !self.is_current(sequence) {
                debug!(output = %self.output, item = %id, "stale enter discarded after background");
                return;
            }
        }

        // Flip with the freshest data: a refresh may have folded into the
        // target while this enter was waiting.
        let latest = self.target.read().clone();
        let mut state = self.state.write();
        if state.content.as_ref().map(ResolvedContent::id) != Some(&id) {
            return;
        }
        if let Some(latest) = latest.filter(|t| t.id() == &id) {
            state.content = Some(latest);
        }
        state.background_visible = true;
        state.phase = TransitionPhase::Visible;
        debug!(output = %self.output, item = %id, "content visible");
    }

    async fn exit(&self, sequence: u64) {
        {
            if !self.is_current(sequence) {
                return;
            }
            let mut state = self.state.write();
            state.phase = TransitionPhase::Hidden;
            state.background_visible = false;
        }
        debug!(output = %self.output, "exit transition started");

        tokio::time::sleep(Duration::from_millis(EXIT_DURATION_MS)).await;

        if !self.is_current(sequence) {
            return;
        }
        self.state.write().content = None;
        debug!(output = %self.output, "content unmounted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{LayoutVariant, OutputAssignment, Poll};
    use crate::resolver::ResolvedItem;

    fn resolved(question: &str) -> ResolvedContent {
        let poll = Poll::new(question)
            .with_option("Yes")
            .with_assignment(OutputAssignment::all_outputs(LayoutVariant::FullScreen))
            .active();
        ResolvedContent {
            item: ResolvedItem::Poll(poll),
            layout: LayoutVariant::FullScreen,
        }
    }

    fn orchestrator(config: AnimationConfig) -> Arc<Orchestrator> {
        Arc::new(Orchestrator::new(
            crate::content::OutputIndex::One,
            config,
            Arc::new(TimerFrameClock::default()),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_enter_flips_visible_after_commit_and_delay() {
        let orch = orchestrator(AnimationConfig::default());
        let content = resolved("P");

        let task = {
            let orch = Arc::clone(&orch);
            let change = SyncChange::Enter(content.clone());
            tokio::spawn(async move { orch.apply(change).await })
        };

        // Mounted hidden almost immediately.
        tokio::time::sleep(Duration::from_millis(5)).await;
        let state = orch.render_state();
        assert!(state.content.is_some());
        assert_eq!(state.phase, TransitionPhase::Hidden);

        // Two 16ms frames + 100ms delay: still hidden just before.
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(orch.render_state().phase, TransitionPhase::Hidden);

        tokio::time::sleep(Duration::from_millis(20)).await;
        let state = orch.render_state();
        assert_eq!(state.phase, TransitionPhase::Visible);
        assert!(state.background_visible);
        assert!(state.is_live());

        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_exit_unmounts_after_fixed_duration() {
        let orch = orchestrator(AnimationConfig::default());
        orch.apply(SyncChange::Enter(resolved("P"))).await;
        assert!(orch.render_state().is_live());

        let task = {
            let orch = Arc::clone(&orch);
            tokio::spawn(async move {
                orch.apply(SyncChange::Exit {
                    previous: crate::content::ContentId::new("p"),
                })
                .await;
            })
        };

        // Hidden immediately, but not yet unmounted.
        tokio::time::sleep(Duration::from_millis(5)).await;
        let state = orch.render_state();
        assert_eq!(state.phase, TransitionPhase::Hidden);
        assert!(!state.background_visible);
        assert!(state.content.is_some());

        tokio::time::sleep(Duration::from_millis(EXIT_DURATION_MS + 10)).await;
        assert!(orch.render_state().content.is_none());

        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_enter_never_applies_its_flip() {
        // Enter X pending; swap to Y detected before the
        // flip. X must never become visible; only Y completes.
        let orch = orchestrator(AnimationConfig::default());
        let x = resolved("X");
        let y = resolved("Y");
        let y_id = y.id().clone();

        {
            let orch = Arc::clone(&orch);
            let change = SyncChange::Enter(x.clone());
            tokio::spawn(async move { orch.apply(change).await });
        }

        // Let X mount, then swap before its 132ms flip can land.
        tokio::time::sleep(Duration::from_millis(10)).await;
        {
            let orch = Arc::clone(&orch);
            let change = SyncChange::Swap {
                previous: x.id().clone(),
                next: y.clone(),
            };
            tokio::spawn(async move { orch.apply(change).await });
        }

        // Past X's would-be flip time: still hidden (the stale enter was
        // discarded), exit is in progress.
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(orch.render_state().phase, TransitionPhase::Hidden);

        // After exit + commit + delay, Y is live.
        tokio::time::sleep(Duration::from_millis(600)).await;
        let state = orch.render_state();
        assert!(state.is_live());
        assert_eq!(state.content.unwrap().id(), &y_id);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_updates_data_without_phase_change() {
        let orch = orchestrator(AnimationConfig::default());
        let content = resolved("P");
        orch.apply(SyncChange::Enter(content.clone())).await;
        assert!(orch.render_state().is_live());

        let mut updated = content.clone();
        if let ResolvedItem::Poll(poll) = &mut updated.item {
            poll.options[0].votes = 42;
        }
        orch.apply(SyncChange::Refresh(updated)).await;

        let state = orch.render_state();
        assert_eq!(state.phase, TransitionPhase::Visible);
        match state.content.unwrap().item {
            ResolvedItem::Poll(poll) => assert_eq!(poll.options[0].votes, 42),
            ResolvedItem::Question(_) => panic!("expected poll"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_for_unmounted_item_is_ignored() {
        let orch = orchestrator(AnimationConfig::default());
        orch.apply(SyncChange::Refresh(resolved("ghost"))).await;
        assert!(orch.render_state().content.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_first_staggers_content() {
        let config = AnimationConfig {
            background_first: true,
            ..AnimationConfig::default()
        };
        let orch = orchestrator(config);

        {
            let orch = Arc::clone(&orch);
            let change = SyncChange::Enter(resolved("P"));
            tokio::spawn(async move { orch.apply(change).await });
        }

        // After commit + delay the background is up but content is not.
        tokio::time::sleep(Duration::from_millis(150)).await;
        let state = orch.render_state();
        assert!(state.background_visible);
        assert_eq!(state.phase, TransitionPhase::Hidden);

        // After the fixed stagger the content flips too.
        tokio::time::sleep(Duration::from_millis(BACKGROUND_STAGGER_MS)).await;
        assert!(orch.render_state().is_live());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_during_swap_exit_is_not_lost() {
        // A vote update for the incoming item arriving while the outgoing
        // item's exit is still playing must reach the screen when the
        // incoming item flips visible.
        let orch = orchestrator(AnimationConfig::default());
        let x = resolved("X");
        let y = resolved("Y");
        orch.apply(SyncChange::Enter(x.clone())).await;

        {
            let orch = Arc::clone(&orch);
            let change = SyncChange::Swap {
                previous: x.id().clone(),
                next: y.clone(),
            };
            tokio::spawn(async move { orch.apply(change).await });
        }

        // Mid-exit (500ms window): Y is not mounted yet.
        tokio::time::sleep(Duration::from_millis(200)).await;
        let mut updated = y.clone();
        if let ResolvedItem::Poll(poll) = &mut updated.item {
            poll.options[0].votes = 7;
        }
        orch.apply(SyncChange::Refresh(updated)).await;

        // Exit completes, Y enters and flips with the refreshed data.
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let state = orch.render_state();
        assert!(state.is_live());
        let content = state.content.unwrap();
        assert_eq!(content.id(), y.id());
        match content.item {
            ResolvedItem::Poll(poll) => assert_eq!(poll.options[0].votes, 7),
            ResolvedItem::Question(_) => panic!("expected poll"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_during_enter_delay_is_carried_by_the_flip() {
        let config = AnimationConfig {
            enter_delay: Duration::from_millis(2000),
            ..AnimationConfig::default()
        };
        let orch = orchestrator(config);
        let content = resolved("P");

        {
            let orch = Arc::clone(&orch);
            let change = SyncChange::Enter(content.clone());
            tokio::spawn(async move { orch.apply(change).await });
        }

        tokio::time::sleep(Duration::from_millis(500)).await;
        let mut updated = content.clone();
        if let ResolvedItem::Poll(poll) = &mut updated.item {
            poll.options[0].votes = 3;
        }
        orch.apply(SyncChange::Refresh(updated)).await;

        tokio::time::sleep(Duration::from_millis(2000)).await;
        let state = orch.render_state();
        assert!(state.is_live());
        match state.content.unwrap().item {
            ResolvedItem::Poll(poll) => assert_eq!(poll.options[0].votes, 3),
            ResolvedItem::Question(_) => panic!("expected poll"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_admission_order_decides_even_before_tasks_run() {
        // Two changes admitted back to back; the earlier one's task runs
        // first but must lose to the later admission.
        let orch = orchestrator(AnimationConfig::default());
        let x = resolved("X");
        let y = resolved("Y");

        let first = orch.admit(SyncChange::Enter(x)).unwrap();
        let second = orch.admit(SyncChange::Enter(y.clone())).unwrap();

        orch.run(first).await;
        assert!(orch.render_state().content.is_none());

        orch.run(second).await;
        let state = orch.render_state();
        assert!(state.is_live());
        assert_eq!(state.content.unwrap().id(), y.id());
    }

    #[tokio::test(start_paused = true)]
    async fn test_enter_with_zero_delay() {
        let config = AnimationConfig {
            enter_delay: Duration::ZERO,
            ..AnimationConfig::default()
        };
        let orch = orchestrator(config);
        orch.apply(SyncChange::Enter(resolved("P"))).await;
        assert!(orch.render_state().is_live());
    }
}
