//! Content Repository Collaborator
//!
//! The document store holding an event's polls and Q&A items is an
//! external collaborator behind the [`ContentRepository`] trait. The core
//! treats reads as at-least-once and possibly stale, and writes as
//! fire-and-forget: failures are logged by callers, never retried here,
//! because the synchronization loop observes whatever state the store
//! settles on at its next tick.
//!
//! A repository handle is scoped to a single event at construction time.
//!
//! [`InMemoryRepository`] is the in-process implementation used by the
//! demo daemon and the test suite; it preserves authoring order, which is
//! the resolver's documented tie-break.

use std::collections::BTreeSet;

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;

use crate::content::{
    ContentId, LayoutVariant, OutputAssignment, OutputIndex, Poll, QaItem, QaQuestion, QaSession,
};
use crate::lifecycle;

/// Errors surfaced by repository operations
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The store could not be reached for this operation
    #[error("content repository unavailable: {0}")]
    Unavailable(String),

    /// The referenced item does not exist
    #[error("unknown content item: {0}")]
    UnknownItem(ContentId),

    /// The store rejected a write
    #[error("write rejected: {0}")]
    Rejected(String),
}

/// Read/write operations on one event's live content
///
/// Implement this trait to back the engine with a real document store.
/// Reads return items in authoring order.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// List the event's polls
    async fn list_polls(&self) -> Result<Vec<Poll>, RepositoryError>;

    /// List the event's Q&A entries (sessions and questions interleaved)
    async fn list_qa_items(&self) -> Result<Vec<QaItem>, RepositoryError>;

    /// Toggle an item's live eligibility
    async fn set_active(&self, id: &ContentId, active: bool) -> Result<(), RepositoryError>;

    /// Replace the output set for one layout variant of an item
    async fn set_assignment(
        &self,
        id: &ContentId,
        variant: LayoutVariant,
        outputs: BTreeSet<OutputIndex>,
    ) -> Result<(), RepositoryError>;

    /// Cue a question into the broadcast queue
    async fn cue(&self, id: &ContentId) -> Result<(), RepositoryError>;

    /// Take a question live
    async fn play(&self, id: &ContentId) -> Result<(), RepositoryError>;

    /// Retire the question and advance the queue
    async fn stop(&self, id: &ContentId) -> Result<(), RepositoryError>;

    /// Set or clear the Next marker on a question
    async fn set_next(&self, id: &ContentId, next: bool) -> Result<(), RepositoryError>;
}

/// In-process repository holding one event's content in authoring order
///
/// Lifecycle writes delegate to the [`lifecycle`] module, so this behaves
/// exactly like a remote store that applies the same transitions. The
/// `set_unavailable` toggle simulates an outage for fail-open tests.
#[derive(Default)]
pub struct InMemoryRepository {
    polls: RwLock<Vec<Poll>>,
    qa_items: RwLock<Vec<QaItem>>,
    unavailable: RwLock<bool>,
}

impl InMemoryRepository {
    /// Create an empty repository
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Author a poll, returning its ID
    pub fn insert_poll(&self, poll: Poll) -> ContentId {
        let id = poll.id.clone();
        self.polls.write().push(poll);
        id
    }

    /// Author a session, returning its ID
    pub fn insert_session(&self, session: QaSession) -> ContentId {
        let id = session.id.clone();
        self.qa_items.write().push(QaItem::Session(session));
        id
    }

    /// Author a question, returning its ID
    pub fn insert_question(&self, question: QaQuestion) -> ContentId {
        let id = question.id.clone();
        self.qa_items.write().push(QaItem::Question(question));
        id
    }

    /// Record a vote on a poll option (live mutable data)
    pub fn record_vote(&self, id: &ContentId, option: usize) -> Result<(), RepositoryError> {
        let mut polls = self.polls.write();
        let poll = polls
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| RepositoryError::UnknownItem(id.clone()))?;
        let option = poll
            .options
            .get_mut(option)
            .ok_or_else(|| RepositoryError::Rejected(format!("no option {option}")))?;
        option.votes += 1;
        Ok(())
    }

    /// Write the answer text on a question (live mutable data)
    pub fn set_answer(&self, id: &ContentId, answer: impl Into<String>) -> Result<(), RepositoryError> {
        let mut items = self.qa_items.write();
        let question = items
            .iter_mut()
            .find_map(|i| i.as_question_mut().filter(|q| &q.id == id))
            .ok_or_else(|| RepositoryError::UnknownItem(id.clone()))?;
        question.answer = Some(answer.into());
        Ok(())
    }

    /// Simulate the store being unreachable (fail-open tests)
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write() = unavailable;
    }

    fn check_available(&self) -> Result<(), RepositoryError> {
        if *self.unavailable.read() {
            Err(RepositoryError::Unavailable("simulated outage".into()))
        } else {
            Ok(())
        }
    }

    fn with_question<R>(
        &self,
        id: &ContentId,
        f: impl FnOnce(&mut Vec<QaItem>) -> R,
    ) -> Result<R, RepositoryError> {
        self.check_available()?;
        let mut items = self.qa_items.write();
        if !items.iter().any(|i| i.as_question().is_some_and(|q| &q.id == id)) {
            return Err(RepositoryError::UnknownItem(id.clone()));
        }
        Ok(f(&mut items))
    }
}

#[async_trait]
impl ContentRepository for InMemoryRepository {
    async fn list_polls(&self) -> Result<Vec<Poll>, RepositoryError> {
        self.check_available()?;
        Ok(self.polls.read().clone())
    }

    async fn list_qa_items(&self) -> Result<Vec<QaItem>, RepositoryError> {
        self.check_available()?;
        Ok(self.qa_items.read().clone())
    }

    async fn set_active(&self, id: &ContentId, active: bool) -> Result<(), RepositoryError> {
        self.check_available()?;
        {
            let mut polls = self.polls.write();
            if let Some(poll) = polls.iter_mut().find(|p| &p.id == id) {
                poll.is_active = active;
                return Ok(());
            }
        }
        let mut items = self.qa_items.write();
        let question = items
            .iter_mut()
            .find_map(|i| i.as_question_mut().filter(|q| &q.id == id))
            .ok_or_else(|| RepositoryError::UnknownItem(id.clone()))?;
        question.is_active = active;
        Ok(())
    }

    async fn set_assignment(
        &self,
        id: &ContentId,
        variant: LayoutVariant,
        outputs: BTreeSet<OutputIndex>,
    ) -> Result<(), RepositoryError> {
        self.check_available()?;
        {
            let mut polls = self.polls.write();
            if let Some(poll) = polls.iter_mut().find(|p| &p.id == id) {
                poll.assignment
                    .get_or_insert_with(OutputAssignment::new)
                    .set(variant, outputs);
                return Ok(());
            }
        }
        let mut items = self.qa_items.write();
        let question = items
            .iter_mut()
            .find_map(|i| i.as_question_mut().filter(|q| &q.id == id))
            .ok_or_else(|| RepositoryError::UnknownItem(id.clone()))?;
        question
            .assignment
            .get_or_insert_with(OutputAssignment::new)
            .set(variant, outputs);
        Ok(())
    }

    async fn cue(&self, id: &ContentId) -> Result<(), RepositoryError> {
        self.with_question(id, |items| {
            lifecycle::cue(items, id);
        })
    }

    async fn play(&self, id: &ContentId) -> Result<(), RepositoryError> {
        self.with_question(id, |items| {
            lifecycle::play(items, id);
        })
    }

    async fn stop(&self, id: &ContentId) -> Result<(), RepositoryError> {
        self.with_question(id, |items| {
            lifecycle::stop(items, id);
        })
    }

    async fn set_next(&self, id: &ContentId, next: bool) -> Result<(), RepositoryError> {
        self.with_question(id, |items| {
            lifecycle::set_next(items, id, next);
        })
    }
}
