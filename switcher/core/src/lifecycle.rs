//! Q&A Lifecycle State Machine
//!
//! Transitions moving a moderated question through the broadcast queue:
//! Approved -> Queued (cue) -> Active (play) -> Done (stop), plus the
//! parallel Next marker that is independent of the primary state.
//!
//! # Design Philosophy
//!
//! The machine is deliberately permissive: it does not enforce a single
//! Cued or a single Active question. Exclusivity is caller discipline (the
//! operator console exposes one cue slot by convention), and the resolver's
//! deterministic single-winner rule is the safety net when the data carries
//! an anomaly. All transitions are idempotent mutations, never errors;
//! the synchronization loop simply observes the corrected state on its
//! next tick.

use tracing::debug;

use crate::content::{ContentId, QaItem, QaQuestion};

fn find_question_mut<'a>(items: &'a mut [QaItem], id: &ContentId) -> Option<&'a mut QaQuestion> {
    items
        .iter_mut()
        .find_map(|item| item.as_question_mut().filter(|q| &q.id == id))
}

/// Cue a question: Approved -> Queued
///
/// Idempotent; cueing an already-queued question changes nothing. The
/// machine permits more than one question to be queued at once.
///
/// Returns whether the item was mutated.
pub fn cue(items: &mut [QaItem], id: &ContentId) -> bool {
    let Some(question) = find_question_mut(items, id) else {
        return false;
    };
    if question.is_queued {
        return false;
    }
    question.is_queued = true;
    debug!(id = %id, "question cued");
    true
}

/// Play a question: -> Active, clearing the cue slot
///
/// Legal on an unqueued question (it immediately becomes Active). If the
/// question has no output assignment of its own, the parent session's
/// default is backfilled so a freshly surfaced question is never invisible
/// by omission. Playing does not stop a previously active question;
/// callers must `stop` explicitly.
///
/// Returns whether the item was mutated.
pub fn play(items: &mut [QaItem], id: &ContentId) -> bool {
    // Resolve the inherited assignment before taking a mutable borrow.
    let inherited = items
        .iter()
        .find_map(|item| item.as_question().filter(|q| &q.id == id))
        .filter(|q| q.assignment.is_none())
        .and_then(|q| q.session_id.clone())
        .and_then(|session_id| {
            items
                .iter()
                .find_map(|item| item.as_session().filter(|s| s.id == session_id))
                .and_then(|session| session.default_assignment.clone())
        });

    let Some(question) = find_question_mut(items, id) else {
        return false;
    };

    let mut changed = false;
    if !question.is_active {
        question.is_active = true;
        changed = true;
    }
    if question.is_queued {
        question.is_queued = false;
        changed = true;
    }
    if question.assignment.is_none() {
        if let Some(assignment) = inherited {
            question.assignment = Some(assignment);
            changed = true;
        }
    }
    if changed {
        debug!(id = %id, "question playing");
    }
    changed
}

/// Stop a question: Active -> Done, advancing the queue by one
///
/// The first question marked Next (authoring order) is promoted
/// Next -> Queued; if none is marked, the cue slot stays empty. Repeated
/// stop on an already-Done question is a no-op, and no promotion runs.
///
/// Returns whether anything was mutated.
pub fn stop(items: &mut [QaItem], id: &ContentId) -> bool {
    {
        let Some(question) = find_question_mut(items, id) else {
            return false;
        };
        if question.is_done && !question.is_active {
            return false;
        }
        question.is_active = false;
        question.is_done = true;
        // A retired question cannot be next in line.
        question.is_next = false;
    }
    debug!(id = %id, "question stopped");

    if let Some(next) = items
        .iter_mut()
        .find_map(|item| item.as_question_mut().filter(|q| q.is_next))
    {
        next.is_next = false;
        next.is_queued = true;
        debug!(id = %next.id, "next question promoted to cue slot");
    }
    true
}

/// Set or clear the Next marker on a question
///
/// The marker is independent of the primary state: a question can be Next
/// while another is Active.
///
/// Returns whether the item was mutated.
pub fn set_next(items: &mut [QaItem], id: &ContentId, next: bool) -> bool {
    let Some(question) = find_question_mut(items, id) else {
        return false;
    };
    if question.is_next == next {
        return false;
    }
    question.is_next = next;
    true
}

/// First queued question in authoring order (the cue slot)
#[must_use]
pub fn cued(items: &[QaItem]) -> Option<&QaQuestion> {
    items
        .iter()
        .find_map(|item| item.as_question().filter(|q| q.is_queued))
}

/// First active question in authoring order
#[must_use]
pub fn active(items: &[QaItem]) -> Option<&QaQuestion> {
    items
        .iter()
        .find_map(|item| item.as_question().filter(|q| q.is_active))
}

/// First question marked Next in authoring order
#[must_use]
pub fn next_up(items: &[QaItem]) -> Option<&QaQuestion> {
    items
        .iter()
        .find_map(|item| item.as_question().filter(|q| q.is_next))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::content::{LayoutVariant, OutputAssignment, OutputIndex, QaSession};

    fn board(questions: Vec<QaQuestion>) -> Vec<QaItem> {
        questions.into_iter().map(QaItem::Question).collect()
    }

    fn get<'a>(items: &'a [QaItem], id: &ContentId) -> &'a QaQuestion {
        items
            .iter()
            .find_map(|i| i.as_question().filter(|q| &q.id == id))
            .unwrap()
    }

    #[test]
    fn test_cue_is_idempotent() {
        let q = QaQuestion::new("Q");
        let id = q.id.clone();
        let mut items = board(vec![q]);

        assert!(cue(&mut items, &id));
        assert!(!cue(&mut items, &id));
        assert!(get(&items, &id).is_queued);
    }

    #[test]
    fn test_play_clears_cue_slot() {
        let q = QaQuestion::new("Q");
        let id = q.id.clone();
        let mut items = board(vec![q]);

        cue(&mut items, &id);
        assert!(play(&mut items, &id));

        let q = get(&items, &id);
        assert!(q.is_active);
        assert!(!q.is_queued);
    }

    #[test]
    fn test_play_on_unqueued_question_is_legal() {
        let q = QaQuestion::new("Q");
        let id = q.id.clone();
        let mut items = board(vec![q]);

        assert!(play(&mut items, &id));
        assert!(get(&items, &id).is_active);
    }

    #[test]
    fn test_play_backfills_session_assignment() {
        let session = QaSession::new("Town hall").with_default_assignment(
            OutputAssignment::new().with(LayoutVariant::LowerThird, [OutputIndex::One]),
        );
        let q = QaQuestion::new("Q").in_session(session.id.clone());
        let id = q.id.clone();
        let mut items = vec![QaItem::Session(session), QaItem::Question(q)];

        play(&mut items, &id);

        let assignment = get(&items, &id).assignment.clone().unwrap();
        assert!(assignment.contains(LayoutVariant::LowerThird, OutputIndex::One));
    }

    #[test]
    fn test_play_keeps_own_assignment() {
        let session = QaSession::new("S").with_default_assignment(
            OutputAssignment::all_outputs(LayoutVariant::FullScreen),
        );
        let own = OutputAssignment::new().with(LayoutVariant::Pip, [OutputIndex::Three]);
        let q = QaQuestion::new("Q")
            .in_session(session.id.clone())
            .with_assignment(own.clone());
        let id = q.id.clone();
        let mut items = vec![QaItem::Session(session), QaItem::Question(q)];

        play(&mut items, &id);
        assert_eq!(get(&items, &id).assignment, Some(own));
    }

    #[test]
    fn test_stop_advances_queue_by_one() {
        // Active=A, Next=B -> stop(A) retires A and cues B.
        let mut a = QaQuestion::new("A");
        a.is_active = true;
        let mut b = QaQuestion::new("B");
        b.is_next = true;
        let (a_id, b_id) = (a.id.clone(), b.id.clone());
        let mut items = board(vec![a, b]);

        assert!(stop(&mut items, &a_id));

        let a = get(&items, &a_id);
        assert!(a.is_done);
        assert!(!a.is_active);
        let b = get(&items, &b_id);
        assert!(b.is_queued);
        assert!(!b.is_next);
    }

    #[test]
    fn test_stop_is_idempotent() {
        // The second stop is a no-op and runs no promotion.
        let mut a = QaQuestion::new("A");
        a.is_active = true;
        let mut b = QaQuestion::new("B");
        b.is_next = true;
        let (a_id, b_id) = (a.id.clone(), b.id.clone());
        let mut items = board(vec![a, b]);

        assert!(stop(&mut items, &a_id));
        // Re-mark B as next; a second stop must not promote it again.
        set_next(&mut items, &b_id, true);
        assert!(!stop(&mut items, &a_id));
        assert!(get(&items, &b_id).is_next);
        assert!(!get(&items, &b_id).is_queued);
    }

    #[test]
    fn test_stop_with_no_next_leaves_cue_empty() {
        let mut a = QaQuestion::new("A");
        a.is_active = true;
        let a_id = a.id.clone();
        let mut items = board(vec![a]);

        stop(&mut items, &a_id);
        assert!(cued(&items).is_none());
    }

    #[test]
    fn test_stop_promotes_first_next_in_authoring_order() {
        let mut a = QaQuestion::new("A");
        a.is_active = true;
        let mut b = QaQuestion::new("B");
        b.is_next = true;
        let mut c = QaQuestion::new("C");
        c.is_next = true;
        let (a_id, b_id, c_id) = (a.id.clone(), b.id.clone(), c.id.clone());
        let mut items = board(vec![a, b, c]);

        stop(&mut items, &a_id);

        assert!(get(&items, &b_id).is_queued);
        assert!(get(&items, &c_id).is_next);
        assert!(!get(&items, &c_id).is_queued);
    }

    #[test]
    fn test_two_active_questions_are_representable() {
        // The machine permits the anomaly; the resolver is the safety net.
        let a = QaQuestion::new("A");
        let b = QaQuestion::new("B");
        let (a_id, b_id) = (a.id.clone(), b.id.clone());
        let mut items = board(vec![a, b]);

        play(&mut items, &a_id);
        play(&mut items, &b_id);

        assert!(get(&items, &a_id).is_active);
        assert!(get(&items, &b_id).is_active);
        assert_eq!(active(&items).unwrap().id, a_id);
    }

    #[test]
    fn test_selectors() {
        let mut a = QaQuestion::new("A");
        a.is_queued = true;
        let mut b = QaQuestion::new("B");
        b.is_next = true;
        let (a_id, b_id) = (a.id.clone(), b.id.clone());
        let items = board(vec![a, b]);

        assert_eq!(cued(&items).unwrap().id, a_id);
        assert_eq!(next_up(&items).unwrap().id, b_id);
        assert!(active(&items).is_none());
    }

    #[test]
    fn test_unknown_id_is_a_no_op() {
        let mut items = board(vec![QaQuestion::new("A")]);
        let ghost = ContentId::new("ghost");

        assert!(!cue(&mut items, &ghost));
        assert!(!play(&mut items, &ghost));
        assert!(!stop(&mut items, &ghost));
        assert!(!set_next(&mut items, &ghost, true));
    }
}
