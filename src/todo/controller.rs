//! TaskListController - single owner of the task collection.
//!
//! Every mutation goes through one of the operations below, and every
//! operation that changes the collection writes the whole collection to the
//! snapshot store before returning. Invalid input and unknown ids are no-ops.

use std::time::Duration;

use tokio::time::Instant;

use super::edit::{transition, EditEffect, EditEvent, EditState};
use super::store::{KeyValueStore, SnapshotStore};
use super::types::{EditSession, Task, TaskId, TaskStats};

/// Result of an `add` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// The task is built and will be committed at `ready_at`.
    Scheduled { id: TaskId, ready_at: Instant },
    /// Text was empty after trimming.
    Empty,
    /// Another add is still inside its delay window.
    Busy,
}

/// Result of a `commit_edit` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The trimmed draft replaced the task's text.
    Saved,
    /// The session closed without a write: the draft was blank or matched
    /// the current text.
    Unchanged,
    /// No edit session was open.
    NotEditing,
}

/// A task waiting out the add delay.
#[derive(Debug, Clone)]
struct PendingAdd {
    task: Task,
    ready_at: Instant,
}

pub struct TaskListController<S> {
    tasks: Vec<Task>,
    edit: EditState,
    pending: Option<PendingAdd>,
    add_delay: Duration,
    store: SnapshotStore<S>,
}

impl<S: KeyValueStore> TaskListController<S> {
    /// Loads the last snapshot (or nothing) and takes ownership of the store.
    pub fn open(store: SnapshotStore<S>, add_delay: Duration) -> Self {
        let tasks = store.load();
        tracing::info!(
            target: "todo",
            count = tasks.len(),
            add_delay_ms = add_delay.as_millis() as u64,
            "Task list opened"
        );

        Self {
            tasks,
            edit: EditState::Idle,
            pending: None,
            add_delay,
            store,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn find(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    fn find_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| &task.id == id)
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.tasks) {
            tracing::warn!(target: "todo", "Failed to persist task list: {}", e);
        }
    }

    // ------------------------------------------------------------------
    // Adding
    // ------------------------------------------------------------------

    /// Schedules a new task built from `raw_text`. The task joins the
    /// collection when `finish_add` runs at or after `ready_at`.
    pub fn add(&mut self, raw_text: &str) -> AddOutcome {
        let text = raw_text.trim();
        if text.is_empty() {
            return AddOutcome::Empty;
        }

        if self.pending.is_some() {
            tracing::debug!(target: "todo", "Add ignored, previous add still pending");
            return AddOutcome::Busy;
        }

        let task = Task::new(text.to_string());
        let id = task.id.clone();
        let ready_at = Instant::now() + self.add_delay;
        self.pending = Some(PendingAdd { task, ready_at });

        tracing::debug!(target: "todo", id = %id, "Add scheduled");
        AddOutcome::Scheduled { id, ready_at }
    }

    pub fn is_adding(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|pending| pending.ready_at)
    }

    /// Commits the pending task, newest first, and clears the adding flag.
    /// Returns the committed id, or `None` when nothing was pending.
    pub fn finish_add(&mut self) -> Option<TaskId> {
        let PendingAdd { task, .. } = self.pending.take()?;
        let id = task.id.clone();

        self.tasks.insert(0, task);
        self.persist();

        tracing::info!(target: "todo", id = %id, count = self.tasks.len(), "Task added");
        Some(id)
    }

    /// Commits the pending task only if its deadline is at or before `now`.
    pub fn finish_add_if_due(&mut self, now: Instant) -> Option<TaskId> {
        match self.pending_deadline() {
            Some(ready_at) if ready_at <= now => self.finish_add(),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Completion and removal
    // ------------------------------------------------------------------

    /// Flips `completed` on the matching task. Returns false for unknown ids.
    pub fn toggle(&mut self, id: &TaskId) -> bool {
        let Some(task) = self.find_mut(id) else {
            return false;
        };
        task.completed = !task.completed;
        let completed = task.completed;

        self.persist();
        tracing::debug!(target: "todo", id = %id, completed, "Task toggled");
        true
    }

    /// Deletes the matching task. An edit session on it is closed.
    pub fn remove(&mut self, id: &TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| &task.id != id);
        if self.tasks.len() == before {
            return false;
        }

        self.apply_edit(EditEvent::TargetRemoved(id.clone()));
        self.persist();
        tracing::info!(target: "todo", id = %id, "Task removed");
        true
    }

    /// Removes every completed task in one step. Returns how many went.
    pub fn clear_completed(&mut self) -> usize {
        let removed: Vec<TaskId> = self
            .tasks
            .iter()
            .filter(|task| task.completed)
            .map(|task| task.id.clone())
            .collect();
        if removed.is_empty() {
            return 0;
        }

        self.tasks.retain(|task| !task.completed);
        if let Some(target) = self.edit.target_id().cloned() {
            if removed.contains(&target) {
                self.apply_edit(EditEvent::TargetRemoved(target));
            }
        }

        self.persist();
        tracing::info!(target: "todo", removed = removed.len(), "Cleared completed tasks");
        removed.len()
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    /// Opens an edit session on `id` with `current_text` as the draft,
    /// abandoning any open session. Unknown ids are ignored.
    pub fn begin_edit(&mut self, id: &TaskId, current_text: &str) -> bool {
        if self.find(id).is_none() {
            return false;
        }

        if let Some(previous) = self.edit.target_id() {
            if previous != id {
                tracing::debug!(target: "todo", abandoned = %previous, "Edit session replaced");
            }
        }

        self.apply_edit(EditEvent::Begin {
            target_id: id.clone(),
            text: current_text.to_string(),
        });
        true
    }

    pub fn update_draft(&mut self, text: &str) -> bool {
        if !self.edit.is_editing() {
            return false;
        }
        self.apply_edit(EditEvent::UpdateDraft(text.to_string()));
        true
    }

    /// Closes the session, writing the trimmed draft to the task when it is
    /// non-empty.
    pub fn commit_edit(&mut self) -> CommitOutcome {
        if !self.edit.is_editing() {
            return CommitOutcome::NotEditing;
        }
        if self.apply_edit(EditEvent::Commit) {
            CommitOutcome::Saved
        } else {
            CommitOutcome::Unchanged
        }
    }

    pub fn cancel_edit(&mut self) -> bool {
        if !self.edit.is_editing() {
            return false;
        }
        self.apply_edit(EditEvent::Cancel);
        true
    }

    pub fn edit_session(&self) -> Option<EditSession> {
        self.edit.session()
    }

    pub fn is_editing(&self) -> bool {
        self.edit.is_editing()
    }

    /// Runs the edit state machine and applies its effect. Returns true
    /// when the collection changed.
    fn apply_edit(&mut self, event: EditEvent) -> bool {
        let state = std::mem::take(&mut self.edit);
        let (next, effect) = transition(state, event);
        self.edit = next;

        match effect {
            Some(EditEffect::ApplyText { target_id, text }) => {
                let Some(task) = self.find_mut(&target_id) else {
                    return false;
                };
                if task.text == text {
                    return false;
                }
                task.text = text;

                self.persist();
                tracing::debug!(target: "todo", id = %target_id, "Task text updated");
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Derived values
    // ------------------------------------------------------------------

    pub fn active_count(&self) -> usize {
        self.tasks.iter().filter(|task| !task.completed).count()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|task| task.completed).count()
    }

    pub fn stats(&self) -> TaskStats {
        TaskStats::of(&self.tasks)
    }
}
