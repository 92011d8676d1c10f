//! Content Resolver
//!
//! The pure selection function deciding, for one output, which single
//! content item is visible and in which layout variant. No side effects,
//! callable at any rate; the live synchronization loop calls it on every
//! tick and diffs the result against what is currently displayed.
//!
//! # Selection rules
//!
//! 1. Polls always take priority over Q&A, regardless of recency.
//! 2. Within a kind, the first active item in authoring order whose
//!    assignment places any variant on the target output wins. The
//!    authoring-order tie-break is a deliberate, documented rule.
//! 3. The effective layout is the highest-priority variant whose
//!    assignment set contains the output: Full-Screen > Lower-Third > PIP
//!    for polls, with Split-Screen appended last for Q&A.
//! 4. Session containers are never displayable content.
//! 5. If nothing qualifies the output is blank - never stale content.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::content::{
    ContentId, LayoutVariant, OutputAssignment, OutputIndex, Poll, QaItem, QaQuestion,
};

/// Layout-variant priority for polls
pub const POLL_LAYOUT_PRIORITY: &[LayoutVariant] = &[
    LayoutVariant::FullScreen,
    LayoutVariant::LowerThird,
    LayoutVariant::Pip,
];

/// Layout-variant priority for Q&A questions
pub const QA_LAYOUT_PRIORITY: &[LayoutVariant] = &[
    LayoutVariant::FullScreen,
    LayoutVariant::LowerThird,
    LayoutVariant::Pip,
    LayoutVariant::SplitScreen,
];

/// The winning item for an output
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ResolvedItem {
    /// An audience poll won
    Poll(Poll),
    /// A Q&A question won
    Question(QaQuestion),
}

impl ResolvedItem {
    /// Identity of the winning item
    #[must_use]
    pub fn id(&self) -> &ContentId {
        match self {
            Self::Poll(p) => &p.id,
            Self::Question(q) => &q.id,
        }
    }

    /// Short kind label for logging
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Poll(_) => "poll",
            Self::Question(_) => "question",
        }
    }
}

/// The resolved view for one output: winning item plus effective layout
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedContent {
    /// The winning item
    pub item: ResolvedItem,
    /// The layout variant it should render in on this output
    pub layout: LayoutVariant,
}

impl ResolvedContent {
    /// Identity of the winning item
    #[must_use]
    pub fn id(&self) -> &ContentId {
        self.item.id()
    }
}

/// Pick the highest-priority variant that places the item on `output`
fn pick_layout(
    assignment: &OutputAssignment,
    output: OutputIndex,
    priority: &[LayoutVariant],
) -> Option<LayoutVariant> {
    priority
        .iter()
        .copied()
        .find(|variant| assignment.contains(*variant, output))
}

/// A question's own assignment, or its parent session's default
fn effective_assignment<'a>(
    question: &'a QaQuestion,
    qa_items: &'a [QaItem],
) -> Option<&'a OutputAssignment> {
    if let Some(own) = question.assignment.as_ref() {
        return Some(own);
    }
    let session_id = question.session_id.as_ref()?;
    qa_items
        .iter()
        .find_map(|item| item.as_session().filter(|s| &s.id == session_id))
        .and_then(|session| session.default_assignment.as_ref())
}

/// Resolve the single visible item for one output
///
/// Returns `None` when nothing qualifies; the rendering surface must show
/// a neutral blank state in that case. At most one item ever wins.
#[must_use]
pub fn resolve(
    polls: &[Poll],
    qa_items: &[QaItem],
    output: OutputIndex,
) -> Option<ResolvedContent> {
    // Polls first: a live poll beats any Q&A question on the same output.
    for poll in polls.iter().filter(|p| p.is_active) {
        let Some(assignment) = poll.assignment.as_ref() else {
            continue;
        };
        if let Some(layout) = pick_layout(assignment, output, POLL_LAYOUT_PRIORITY) {
            return Some(ResolvedContent {
                item: ResolvedItem::Poll(poll.clone()),
                layout,
            });
        }
    }

    for item in qa_items {
        let Some(question) = item.as_question() else {
            continue;
        };
        if !question.is_active {
            continue;
        }
        let Some(assignment) = effective_assignment(question, qa_items) else {
            continue;
        };
        if let Some(layout) = pick_layout(assignment, output, QA_LAYOUT_PRIORITY) {
            return Some(ResolvedContent {
                item: ResolvedItem::Question(question.clone()),
                layout,
            });
        }
    }

    None
}

/// The resolved per-output view across all four outputs
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LiveSnapshot(BTreeMap<OutputIndex, Option<ResolvedContent>>);

impl LiveSnapshot {
    /// Resolve every output against the given content
    #[must_use]
    pub fn capture(polls: &[Poll], qa_items: &[QaItem]) -> Self {
        Self(
            OutputIndex::ALL
                .into_iter()
                .map(|output| (output, resolve(polls, qa_items, output)))
                .collect(),
        )
    }

    /// The resolved content for one output, if any
    #[must_use]
    pub fn get(&self, output: OutputIndex) -> Option<&ResolvedContent> {
        self.0.get(&output).and_then(Option::as_ref)
    }

    /// Number of outputs currently showing content
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.0.values().filter(|v| v.is_some()).count()
    }
}
