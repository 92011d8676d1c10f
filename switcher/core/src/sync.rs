//! Live Synchronization
//!
//! Per-output polling state: fetch the event's content on two independent
//! cadences (poll vote freshness vs Q&A queue freshness), resolve the
//! winner for the tracked output, and classify the difference against what
//! is currently displayed. The classification drives the animation
//! orchestrator; this module itself never animates.
//!
//! # Failure semantics
//!
//! A failed fetch is logged and skipped: the previous cache and the
//! currently displayed content are retained (fail-open), so a repository
//! blip never blacks out an output. The next successful tick reconverges.

use tracing::{debug, warn};

use crate::content::{ContentId, OutputIndex, Poll, QaItem};
use crate::repository::ContentRepository;
use crate::resolver::{resolve, ResolvedContent};

/// Outcome of diffing one tick's winner against the displayed item
///
/// Equality for "same winner" is identity (`id`) comparison, not deep
/// equality: two items with coincidentally identical text are still a swap.
#[derive(Clone, Debug, PartialEq)]
pub enum SyncChange {
    /// Same winner, same data: nothing to do
    Unchanged,
    /// No previous item, new winner: play an enter transition
    Enter(ResolvedContent),
    /// Same winner identity with different mutable data: silent update,
    /// never a re-entrance
    Refresh(ResolvedContent),
    /// Previous winner, no new winner: play an exit transition, then clear
    Exit {
        /// The item leaving the output
        previous: ContentId,
    },
    /// Different winner: full exit completes before the new item mounts
    Swap {
        /// The item leaving the output
        previous: ContentId,
        /// The item entering after the exit completes
        next: ResolvedContent,
    },
}

impl SyncChange {
    /// Short label for logging
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Enter(_) => "enter",
            Self::Refresh(_) => "refresh",
            Self::Exit { .. } => "exit",
            Self::Swap { .. } => "swap",
        }
    }
}

/// Classify one tick's resolved winner against the displayed content
#[must_use]
pub fn classify(current: Option<&ResolvedContent>, winner: Option<ResolvedContent>) -> SyncChange {
    match (current, winner) {
        (None, None) => SyncChange::Unchanged,
        (None, Some(next)) => SyncChange::Enter(next),
        (Some(previous), None) => SyncChange::Exit {
            previous: previous.id().clone(),
        },
        (Some(previous), Some(next)) => {
            if previous.id() == next.id() {
                if *previous == next {
                    SyncChange::Unchanged
                } else {
                    SyncChange::Refresh(next)
                }
            } else {
                SyncChange::Swap {
                    previous: previous.id().clone(),
                    next,
                }
            }
        }
    }
}

/// Cached content and displayed-item tracking for one output
///
/// The two `refresh_*` operations are the only points that touch the
/// repository; they update independent halves of the cache so the two
/// cadences stay decoupled. [`SyncState::evaluate`] is pure over the cache.
pub struct SyncState {
    output: OutputIndex,
    polls: Vec<Poll>,
    qa_items: Vec<QaItem>,
    current: Option<ResolvedContent>,
}

impl SyncState {
    /// Create empty state for one output
    #[must_use]
    pub fn new(output: OutputIndex) -> Self {
        Self {
            output,
            polls: Vec::new(),
            qa_items: Vec::new(),
            current: None,
        }
    }

    /// The output this state tracks
    #[must_use]
    pub fn output(&self) -> OutputIndex {
        self.output
    }

    /// The item this output currently displays, as last decided
    #[must_use]
    pub fn current(&self) -> Option<&ResolvedContent> {
        self.current.as_ref()
    }

    /// Refresh the poll half of the cache
    ///
    /// Returns whether the fetch succeeded; on failure the previous cache
    /// is retained.
    pub async fn refresh_polls(&mut self, repository: &dyn ContentRepository) -> bool {
        match repository.list_polls().await {
            Ok(polls) => {
                self.polls = polls;
                true
            }
            Err(error) => {
                warn!(output = %self.output, %error, "poll fetch failed, keeping last known content");
                false
            }
        }
    }

    /// Refresh the Q&A half of the cache
    pub async fn refresh_qa(&mut self, repository: &dyn ContentRepository) -> bool {
        match repository.list_qa_items().await {
            Ok(items) => {
                self.qa_items = items;
                true
            }
            Err(error) => {
                warn!(output = %self.output, %error, "Q&A fetch failed, keeping last known content");
                false
            }
        }
    }

    /// Resolve the cache and classify against the displayed item
    ///
    /// Updates the displayed-item bookkeeping to the latest decision; the
    /// orchestrator independently re-validates identity before every
    /// animation step.
    pub fn evaluate(&mut self) -> SyncChange {
        let winner = resolve(&self.polls, &self.qa_items, self.output);
        let change = classify(self.current.as_ref(), winner);

        match &change {
            SyncChange::Unchanged => {}
            SyncChange::Enter(next) | SyncChange::Refresh(next) => {
                self.current = Some(next.clone());
            }
            SyncChange::Exit { .. } => {
                self.current = None;
            }
            SyncChange::Swap { next, .. } => {
                self.current = Some(next.clone());
            }
        }

        if change != SyncChange::Unchanged {
            debug!(
                output = %self.output,
                change = change.label(),
                item = self.current.as_ref().map(|c| c.id().as_str()).unwrap_or("-"),
                "content change detected"
            );
        }
        change
    }
}
