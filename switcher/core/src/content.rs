//! Live Content Data Model
//!
//! Types for the content items an operator can take live: audience polls
//! and moderated Q&A questions, plus the output-assignment map that decides
//! which of the four broadcast outputs an item appears on and in which
//! layout variant.
//!
//! # Design Philosophy
//!
//! These are plain data structs mutated through the repository and the
//! lifecycle module. Lifecycle flags on [`QaQuestion`] are independent
//! booleans on purpose: the lifecycle module is the source of truth for
//! which combinations are legal, and the resolver tolerates anomalies by
//! deterministic single-winner selection.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

/// Opaque content item identifier, stable for the item's lifetime
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentId(pub String);

impl ContentId {
    /// Create an ID from an existing string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new unique ID (authoring time)
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One of the four independently addressable broadcast outputs
///
/// Serialized as the integer the operator sees (1-4).
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize_repr,
    Deserialize_repr,
)]
#[repr(u8)]
pub enum OutputIndex {
    /// Output 1
    One = 1,
    /// Output 2
    Two = 2,
    /// Output 3
    Three = 3,
    /// Output 4
    Four = 4,
}

impl OutputIndex {
    /// All four outputs in display order
    pub const ALL: [OutputIndex; 4] = [Self::One, Self::Two, Self::Three, Self::Four];

    /// Get the operator-facing number (1-4)
    #[must_use]
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for OutputIndex {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            4 => Ok(Self::Four),
            other => Err(other),
        }
    }
}

impl std::fmt::Display for OutputIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "output {}", self.as_u8())
    }
}

/// A named rendering mode an item can be assigned to per output
///
/// Polls support the first three variants; Q&A questions additionally
/// support [`LayoutVariant::SplitScreen`]. The per-kind priority orders
/// live in the resolver.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum LayoutVariant {
    /// Overlay fills the whole output
    FullScreen,
    /// Banner across the lower third of the output
    LowerThird,
    /// Picture-in-picture corner box
    Pip,
    /// Half-screen split (Q&A only)
    SplitScreen,
}

impl LayoutVariant {
    /// Human-readable label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::FullScreen => "Full-Screen",
            Self::LowerThird => "Lower-Third",
            Self::Pip => "PIP",
            Self::SplitScreen => "Split-Screen",
        }
    }
}

impl std::fmt::Display for LayoutVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Mapping from layout variant to the set of outputs it appears on
///
/// An explicit empty set means "assigned to no output" and is never
/// selected by the resolver. "Field absent" is modeled as
/// `Option<OutputAssignment>` being `None` on the owning item; authoring
/// may substitute [`OutputAssignment::all_outputs`] in that case.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputAssignment(BTreeMap<LayoutVariant, BTreeSet<OutputIndex>>);

impl OutputAssignment {
    /// Create an empty assignment (assigned to no output)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assignment placing `variant` on all four outputs
    #[must_use]
    pub fn all_outputs(variant: LayoutVariant) -> Self {
        Self::new().with(variant, OutputIndex::ALL)
    }

    /// Builder: add outputs for a variant
    #[must_use]
    pub fn with(mut self, variant: LayoutVariant, outputs: impl IntoIterator<Item = OutputIndex>) -> Self {
        self.set(variant, outputs);
        self
    }

    /// Replace the output set for a variant
    pub fn set(&mut self, variant: LayoutVariant, outputs: impl IntoIterator<Item = OutputIndex>) {
        self.0.insert(variant, outputs.into_iter().collect());
    }

    /// Whether `variant` is assigned to `output`
    #[must_use]
    pub fn contains(&self, variant: LayoutVariant, output: OutputIndex) -> bool {
        self.0.get(&variant).is_some_and(|set| set.contains(&output))
    }

    /// Whether any variant is assigned to `output`
    #[must_use]
    pub fn targets(&self, output: OutputIndex) -> bool {
        self.0.values().any(|set| set.contains(&output))
    }

    /// Outputs assigned under a variant (empty if the variant is unset)
    #[must_use]
    pub fn outputs_for(&self, variant: LayoutVariant) -> BTreeSet<OutputIndex> {
        self.0.get(&variant).cloned().unwrap_or_default()
    }

    /// Whether no output is assigned under any variant
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.values().all(BTreeSet::is_empty)
    }
}

/// One answer option of a poll, with its running vote count
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    /// Option text
    pub text: String,
    /// Votes received so far (mutable live data)
    pub votes: u64,
}

impl PollOption {
    /// Create an option with zero votes
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            votes: 0,
        }
    }
}

/// An audience poll
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    /// Unique identifier
    pub id: ContentId,
    /// Question text shown on the overlay
    pub question: String,
    /// Answer options with live vote counts
    pub options: Vec<PollOption>,
    /// Whether the poll is currently eligible to be shown live
    pub is_active: bool,
    /// Authored default layout variant
    pub layout_style: LayoutVariant,
    /// Per-variant output assignment; `None` means the field was never set
    pub assignment: Option<OutputAssignment>,
}

impl Poll {
    /// Create an inactive poll with a generated ID and no assignment
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            id: ContentId::generate(),
            question: question.into(),
            options: Vec::new(),
            is_active: false,
            layout_style: LayoutVariant::FullScreen,
            assignment: None,
        }
    }

    /// Builder: add an answer option
    #[must_use]
    pub fn with_option(mut self, text: impl Into<String>) -> Self {
        self.options.push(PollOption::new(text));
        self
    }

    /// Builder: set the output assignment
    #[must_use]
    pub fn with_assignment(mut self, assignment: OutputAssignment) -> Self {
        self.assignment = Some(assignment);
        self
    }

    /// Builder: mark the poll active
    #[must_use]
    pub fn active(mut self) -> Self {
        self.is_active = true;
        self
    }

    /// Total votes across all options
    #[must_use]
    pub fn total_votes(&self) -> u64 {
        self.options.iter().map(|o| o.votes).sum()
    }
}

/// A moderated Q&A question
///
/// The four lifecycle flags are mutually-informative but independent;
/// see the lifecycle module for the legal transitions between them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaQuestion {
    /// Unique identifier
    pub id: ContentId,
    /// Parent session, if the question belongs to one
    pub session_id: Option<ContentId>,
    /// Question text (mutable: moderators may edit wording live)
    pub question: String,
    /// Answer text, once one has been written (mutable live data)
    pub answer: Option<String>,
    /// In the cue slot, waiting to be played
    pub is_queued: bool,
    /// Currently live on its assigned outputs
    pub is_active: bool,
    /// Marked as the question to cue when the active one stops
    pub is_next: bool,
    /// Already broadcast and retired
    pub is_done: bool,
    /// Authored default layout variant
    pub layout_style: LayoutVariant,
    /// Per-variant output assignment; `None` inherits the parent session's
    pub assignment: Option<OutputAssignment>,
}

impl QaQuestion {
    /// Create a fresh approved question with a generated ID
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            id: ContentId::generate(),
            session_id: None,
            question: question.into(),
            answer: None,
            is_queued: false,
            is_active: false,
            is_next: false,
            is_done: false,
            layout_style: LayoutVariant::LowerThird,
            assignment: None,
        }
    }

    /// Builder: attach to a session
    #[must_use]
    pub fn in_session(mut self, session_id: ContentId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Builder: set the output assignment
    #[must_use]
    pub fn with_assignment(mut self, assignment: OutputAssignment) -> Self {
        self.assignment = Some(assignment);
        self
    }
}

/// A Q&A session: shared defaults for a set of questions
///
/// A session has a name but no question text and must never be treated as
/// displayable content; the resolver skips sessions entirely.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaSession {
    /// Unique identifier
    pub id: ContentId,
    /// Session name (operator-facing)
    pub name: String,
    /// Default output assignment inherited by member questions
    pub default_assignment: Option<OutputAssignment>,
    /// Default layout variant for member questions
    pub default_layout_style: LayoutVariant,
}

impl QaSession {
    /// Create a session with a generated ID and no defaults
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ContentId::generate(),
            name: name.into(),
            default_assignment: None,
            default_layout_style: LayoutVariant::LowerThird,
        }
    }

    /// Builder: set the default output assignment
    #[must_use]
    pub fn with_default_assignment(mut self, assignment: OutputAssignment) -> Self {
        self.default_assignment = Some(assignment);
        self
    }
}

/// A Q&A repository entry: either a session container or a question
///
/// Listings preserve authoring order, which is the documented tie-break
/// for the resolver's single-winner rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum QaItem {
    /// A session container (never displayable)
    Session(QaSession),
    /// A moderated question
    Question(QaQuestion),
}

impl QaItem {
    /// The entry's identifier
    #[must_use]
    pub fn id(&self) -> &ContentId {
        match self {
            Self::Session(s) => &s.id,
            Self::Question(q) => &q.id,
        }
    }

    /// View as a question, if this entry is one
    #[must_use]
    pub fn as_question(&self) -> Option<&QaQuestion> {
        match self {
            Self::Question(q) => Some(q),
            Self::Session(_) => None,
        }
    }

    /// Mutable view as a question, if this entry is one
    pub fn as_question_mut(&mut self) -> Option<&mut QaQuestion> {
        match self {
            Self::Question(q) => Some(q),
            Self::Session(_) => None,
        }
    }

    /// View as a session, if this entry is one
    #[must_use]
    pub fn as_session(&self) -> Option<&QaSession> {
        match self {
            Self::Session(s) => Some(s),
            Self::Question(_) => None,
        }
    }
}
