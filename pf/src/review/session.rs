//! ReviewSession - per-batch reconciliation state machine
//!
//! Holds the in-memory review state for one refinement batch: one
//! micro-task per model candidate, per-item status transitions, and the
//! aggregate predicates that gate finalization. Statuses only move
//! forward along the defined edges; an attempt outside the legal source
//! state is a no-op, never an error - review is final per item.

use tracing::{debug, warn};

use crate::domain::{FinalizedTask, MicroTask, RefinedGoalGroup, TaskStatus, needs_clarification};
use crate::refine::RefinementResult;

/// In-memory review state for one refinement batch
///
/// The session exclusively owns its micro-task graph. It is driven by
/// discrete user actions, one transition at a time; nothing here is
/// shared across threads.
pub struct ReviewSession {
    groups: Vec<RefinedGoalGroup>,

    /// The model's own clarification flag, as returned
    model_clarification: bool,

    /// Whether any candidate text was itself a question at construction
    derived_clarification: bool,

    /// Micro-task ids in the order they were approved
    approval_order: Vec<String>,
}

impl ReviewSession {
    /// Build a session from a normalized refinement result
    ///
    /// Groups and micro-tasks preserve model output order. Candidates
    /// whose text is a question start in `Edited` rather than `Pending`:
    /// they must be rewritten before they can enter the plan.
    pub fn new(result: &RefinementResult) -> Self {
        let groups: Vec<RefinedGoalGroup> = result
            .refined
            .iter()
            .map(|refined| RefinedGoalGroup {
                goal: refined.goal.clone(),
                micro_tasks: refined
                    .micro_tasks
                    .iter()
                    .map(|text| MicroTask::from_candidate(text.as_str(), refined.goal.as_str()))
                    .collect(),
            })
            .collect();

        let derived = result.derived_clarification();
        if derived != result.clarification_needed {
            // The model's flag and the item contents disagree; both are
            // kept and the caller surfaces the conflict to the user.
            warn!(
                model_flag = result.clarification_needed,
                derived_flag = derived,
                "review session: clarification signals disagree"
            );
        }

        Self {
            groups,
            model_clarification: result.clarification_needed,
            derived_clarification: derived,
            approval_order: Vec::new(),
        }
    }

    /// Goal groups in display order
    pub fn groups(&self) -> &[RefinedGoalGroup] {
        &self.groups
    }

    /// All micro-tasks in display order (group order, then model order)
    pub fn iter(&self) -> impl Iterator<Item = &MicroTask> {
        self.groups.iter().flat_map(|g| g.micro_tasks.iter())
    }

    /// Look up a micro-task by id
    pub fn task(&self, id: &str) -> Option<&MicroTask> {
        self.iter().find(|t| t.id == id)
    }

    fn task_mut(&mut self, id: &str) -> Option<&mut MicroTask> {
        self.groups
            .iter_mut()
            .flat_map(|g| g.micro_tasks.iter_mut())
            .find(|t| t.id == id)
    }

    /// Approve a micro-task; valid from `Pending` or `Edited`
    ///
    /// From `Edited` the current (possibly rewritten) text is what gets
    /// finalized. Returns whether the transition was applied.
    pub fn approve(&mut self, id: &str) -> bool {
        let Some(task) = self.task_mut(id) else { return false };
        match task.status {
            TaskStatus::Pending | TaskStatus::Edited => {
                task.status = TaskStatus::Approved;
                let id = task.id.clone();
                debug!(%id, "approve: applied");
                self.approval_order.push(id);
                true
            }
            TaskStatus::Approved | TaskStatus::Rejected => false,
        }
    }

    /// Reject a micro-task; valid from `Pending` only
    pub fn reject(&mut self, id: &str) -> bool {
        let Some(task) = self.task_mut(id) else { return false };
        match task.status {
            TaskStatus::Pending => {
                task.status = TaskStatus::Rejected;
                debug!(%id, "reject: applied");
                true
            }
            _ => false,
        }
    }

    /// Unlock a micro-task's text for editing; valid from `Pending` only
    pub fn begin_edit(&mut self, id: &str) -> bool {
        let Some(task) = self.task_mut(id) else { return false };
        match task.status {
            TaskStatus::Pending => {
                task.status = TaskStatus::Edited;
                debug!(%id, "begin_edit: applied");
                true
            }
            _ => false,
        }
    }

    /// Replace the text of a micro-task being edited; status unchanged
    pub fn update_text(&mut self, id: &str, new_text: &str) -> bool {
        let Some(task) = self.task_mut(id) else { return false };
        match task.status {
            TaskStatus::Edited => {
                task.text = new_text.to_string();
                true
            }
            _ => false,
        }
    }

    /// Try to settle an edit; valid from `Edited` only
    ///
    /// If the text is unchanged from the original candidate, or still
    /// reads as a question, the item stays `Edited` (unresolved).
    /// Otherwise it moves to `Approved`. Returns whether it was approved.
    pub fn commit_edit(&mut self, id: &str) -> bool {
        let Some(task) = self.task_mut(id) else { return false };
        match task.status {
            TaskStatus::Edited => {
                if task.text == task.original_text || needs_clarification(&task.text) {
                    debug!(%id, "commit_edit: unresolved, staying edited");
                    false
                } else {
                    task.status = TaskStatus::Approved;
                    let id = task.id.clone();
                    debug!(%id, "commit_edit: approved");
                    self.approval_order.push(id);
                    true
                }
            }
            _ => false,
        }
    }

    /// True iff every micro-task is approved or rejected
    ///
    /// An item still `Edited` - awaiting a satisfactory rewrite - blocks
    /// finalization: an ambiguous, half-edited task must never be
    /// persisted.
    pub fn all_reviewed(&self) -> bool {
        self.iter().all(|t| t.status.is_reviewed())
    }

    /// True while any item still needs a clarifying rewrite
    pub fn clarification_pending(&self) -> bool {
        self.iter()
            .any(|t| t.status == TaskStatus::Edited && needs_clarification(&t.text))
    }

    /// The model's own clarification flag
    pub fn model_clarification(&self) -> bool {
        self.model_clarification
    }

    /// Whether the model flag and the per-item signal disagreed
    pub fn clarification_conflict(&self) -> bool {
        self.model_clarification != self.derived_clarification
    }

    /// Approved tasks in the order they were approved
    pub fn approved_tasks(&self) -> Vec<FinalizedTask> {
        self.approval_order
            .iter()
            .filter_map(|id| self.task(id))
            .map(MicroTask::to_finalized)
            .collect()
    }

    /// Counts of (pending, approved, rejected, edited) for display
    pub fn status_counts(&self) -> (usize, usize, usize, usize) {
        let mut counts = (0, 0, 0, 0);
        for task in self.iter() {
            match task.status {
                TaskStatus::Pending => counts.0 += 1,
                TaskStatus::Approved => counts.1 += 1,
                TaskStatus::Rejected => counts.2 += 1,
                TaskStatus::Edited => counts.3 += 1,
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refine::normalize;

    fn session_from(raw: &str) -> ReviewSession {
        ReviewSession::new(&normalize(raw, &[]).unwrap())
    }

    fn two_task_session() -> ReviewSession {
        session_from(
            r#"{"refinedTasks": {"Learn Spanish": ["Sign up for app (15 min)", "Practice 20 min"]}, "clarificationNeeded": false}"#,
        )
    }

    fn ids(session: &ReviewSession) -> Vec<String> {
        session.iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn test_construction_preserves_order() {
        let session = session_from(
            r#"{"refinedTasks": {"B": ["b1", "b2"], "A": ["a1"]}, "clarificationNeeded": false}"#,
        );
        let texts: Vec<&str> = session.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["b1", "b2", "a1"]);
        assert_eq!(session.groups()[0].goal, "B");
    }

    #[test]
    fn test_approve_from_pending() {
        let mut session = two_task_session();
        let id = ids(&session)[0].clone();

        assert!(session.approve(&id));
        assert_eq!(session.task(&id).unwrap().status, TaskStatus::Approved);
    }

    #[test]
    fn test_approve_is_idempotent() {
        let mut session = two_task_session();
        let id = ids(&session)[0].clone();

        assert!(session.approve(&id));
        assert!(!session.approve(&id));
        assert_eq!(session.task(&id).unwrap().status, TaskStatus::Approved);
        // The second call did not duplicate the approval record
        assert_eq!(session.approved_tasks().len(), 1);
    }

    #[test]
    fn test_reject_only_from_pending() {
        let mut session = two_task_session();
        let [first, second]: [String; 2] = ids(&session).try_into().unwrap();

        session.approve(&first);
        assert!(!session.reject(&first));
        assert_eq!(session.task(&first).unwrap().status, TaskStatus::Approved);

        session.begin_edit(&second);
        assert!(!session.reject(&second));
        assert_eq!(session.task(&second).unwrap().status, TaskStatus::Edited);
    }

    #[test]
    fn test_reject_twice_is_noop() {
        let mut session = two_task_session();
        let id = ids(&session)[0].clone();

        assert!(session.reject(&id));
        assert!(!session.reject(&id));
        assert_eq!(session.task(&id).unwrap().status, TaskStatus::Rejected);
    }

    #[test]
    fn test_begin_edit_not_from_rejected() {
        let mut session = two_task_session();
        let id = ids(&session)[0].clone();

        session.reject(&id);
        assert!(!session.begin_edit(&id));
        assert_eq!(session.task(&id).unwrap().status, TaskStatus::Rejected);
    }

    #[test]
    fn test_update_text_only_while_edited() {
        let mut session = two_task_session();
        let id = ids(&session)[0].clone();

        assert!(!session.update_text(&id, "new text"));

        session.begin_edit(&id);
        assert!(session.update_text(&id, "Practice 30 min instead"));
        let task = session.task(&id).unwrap();
        assert_eq!(task.text, "Practice 30 min instead");
        assert_eq!(task.status, TaskStatus::Edited);
        assert_eq!(task.original_text, "Sign up for app (15 min)");
    }

    #[test]
    fn test_commit_edit_unchanged_text_stays_edited() {
        let mut session = two_task_session();
        let id = ids(&session)[0].clone();

        session.begin_edit(&id);
        assert!(!session.commit_edit(&id));
        assert_eq!(session.task(&id).unwrap().status, TaskStatus::Edited);
    }

    #[test]
    fn test_commit_edit_question_stays_edited() {
        let mut session = two_task_session();
        let id = ids(&session)[0].clone();

        session.begin_edit(&id);
        session.update_text(&id, "Should I use Duolingo or Babbel?");
        assert!(!session.commit_edit(&id));
        assert_eq!(session.task(&id).unwrap().status, TaskStatus::Edited);
    }

    #[test]
    fn test_commit_edit_resolves_to_approved() {
        let mut session = two_task_session();
        let id = ids(&session)[0].clone();

        session.begin_edit(&id);
        session.update_text(&id, "Sign up for Babbel (15 min)");
        assert!(session.commit_edit(&id));
        assert_eq!(session.task(&id).unwrap().status, TaskStatus::Approved);
    }

    #[test]
    fn test_approve_from_edited_keeps_current_text() {
        let mut session = two_task_session();
        let id = ids(&session)[0].clone();

        session.begin_edit(&id);
        session.update_text(&id, "Sign up for Babbel (15 min)");
        assert!(session.approve(&id));

        let finalized = session.approved_tasks();
        assert_eq!(finalized[0].text, "Sign up for Babbel (15 min)");
        assert_eq!(finalized[0].original_task, "Learn Spanish");
    }

    #[test]
    fn test_all_reviewed() {
        let mut session = two_task_session();
        let [first, second]: [String; 2] = ids(&session).try_into().unwrap();

        assert!(!session.all_reviewed());

        session.approve(&first);
        assert!(!session.all_reviewed());

        session.begin_edit(&second);
        assert!(!session.all_reviewed());

        session.update_text(&second, "Practice 30 min");
        session.commit_edit(&second);
        assert!(session.all_reviewed());
    }

    #[test]
    fn test_question_candidate_starts_edited_and_blocks() {
        let mut session = session_from(
            r#"{"refinedTasks": {"Learn a language": ["Sign up for app (15 min)", "What language?"]}, "clarificationNeeded": true}"#,
        );
        let [first, second]: [String; 2] = ids(&session).try_into().unwrap();

        assert_eq!(session.task(&second).unwrap().status, TaskStatus::Edited);
        assert!(session.clarification_pending());

        session.approve(&first);
        assert!(!session.all_reviewed());

        session.update_text(&second, "Learn Spanish basics for 20 min");
        assert!(session.commit_edit(&second));
        assert!(session.all_reviewed());
        assert!(!session.clarification_pending());
    }

    #[test]
    fn test_clarification_conflict_detected() {
        // Flag says false but an item contains a question
        let session = session_from(
            r#"{"refinedTasks": {"Learn a language": ["What language?"]}, "clarificationNeeded": false}"#,
        );
        assert!(session.clarification_conflict());

        let session = two_task_session();
        assert!(!session.clarification_conflict());
    }

    #[test]
    fn test_approved_tasks_follow_approval_order() {
        let mut session = two_task_session();
        let [first, second]: [String; 2] = ids(&session).try_into().unwrap();

        // Approve in reverse display order
        session.approve(&second);
        session.approve(&first);

        let approved = session.approved_tasks();
        assert_eq!(approved[0].id, second);
        assert_eq!(approved[1].id, first);
    }

    #[test]
    fn test_status_counts() {
        let mut session = session_from(
            r#"{"refinedTasks": {"G": ["a", "b", "c", "d"]}, "clarificationNeeded": false}"#,
        );
        let all = ids(&session);

        session.approve(&all[0]);
        session.reject(&all[1]);
        session.begin_edit(&all[2]);

        assert_eq!(session.status_counts(), (1, 1, 1, 1));
    }

    #[test]
    fn test_unknown_id_is_noop() {
        let mut session = two_task_session();
        assert!(!session.approve("no-such-id"));
        assert!(!session.reject("no-such-id"));
        assert!(!session.begin_edit("no-such-id"));
        assert!(!session.update_text("no-such-id", "x"));
        assert!(!session.commit_edit("no-such-id"));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::refine::normalize;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Action {
        Approve(usize),
        Reject(usize),
        BeginEdit(usize),
        UpdateText(usize, String),
        CommitEdit(usize),
    }

    fn action_strategy(task_count: usize) -> impl Strategy<Value = Action> {
        let idx = 0..task_count;
        prop_oneof![
            idx.clone().prop_map(Action::Approve),
            idx.clone().prop_map(Action::Reject),
            idx.clone().prop_map(Action::BeginEdit),
            (idx.clone(), "[a-z ?]{0,20}").prop_map(|(i, s)| Action::UpdateText(i, s)),
            idx.prop_map(Action::CommitEdit),
        ]
    }

    fn fresh_session() -> ReviewSession {
        let raw = r#"{"refinedTasks": {"G1": ["t1", "t2"], "G2": ["t3"]}, "clarificationNeeded": false}"#;
        ReviewSession::new(&normalize(raw, &[]).unwrap())
    }

    proptest! {
        /// No sequence of transitions can take a reviewed item out of its
        /// terminal status, and the aggregate predicate always agrees with
        /// the per-item statuses.
        #[test]
        fn transitions_never_leave_defined_edges(actions in proptest::collection::vec(action_strategy(3), 0..40)) {
            let mut session = fresh_session();
            let ids: Vec<String> = session.iter().map(|t| t.id.clone()).collect();
            let mut terminal: Vec<Option<TaskStatus>> = vec![None; ids.len()];

            for action in actions {
                match action {
                    Action::Approve(i) => { session.approve(&ids[i]); }
                    Action::Reject(i) => { session.reject(&ids[i]); }
                    Action::BeginEdit(i) => { session.begin_edit(&ids[i]); }
                    Action::UpdateText(i, text) => { session.update_text(&ids[i], &text); }
                    Action::CommitEdit(i) => { session.commit_edit(&ids[i]); }
                }

                for (i, id) in ids.iter().enumerate() {
                    let status = session.task(id).unwrap().status;
                    if let Some(frozen) = terminal[i] {
                        prop_assert_eq!(status, frozen);
                    } else if status.is_reviewed() {
                        terminal[i] = Some(status);
                    }
                }

                let expected = session.iter().all(|t| t.status.is_reviewed());
                prop_assert_eq!(session.all_reviewed(), expected);
            }
        }

        /// Approved task ids are unique regardless of the action sequence.
        #[test]
        fn approval_order_has_no_duplicates(actions in proptest::collection::vec(action_strategy(3), 0..40)) {
            let mut session = fresh_session();
            let ids: Vec<String> = session.iter().map(|t| t.id.clone()).collect();

            for action in actions {
                match action {
                    Action::Approve(i) => { session.approve(&ids[i]); }
                    Action::Reject(i) => { session.reject(&ids[i]); }
                    Action::BeginEdit(i) => { session.begin_edit(&ids[i]); }
                    Action::UpdateText(i, text) => { session.update_text(&ids[i], &text); }
                    Action::CommitEdit(i) => { session.commit_edit(&ids[i]); }
                }
            }

            let approved = session.approved_tasks();
            let mut seen = std::collections::HashSet::new();
            for task in &approved {
                prop_assert!(seen.insert(task.id.clone()));
            }
        }
    }
}
