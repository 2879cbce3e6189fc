//! TodoCoordinator - single owner actor for the task list.
//!
//! The coordinator owns the controller and is the only place that touches it.
//! Callers talk to it through a `TodoHandle`; each command runs to completion
//! before the next is read, so no two mutations ever interleave.
//!
//! The add delay is the one suspension point: while an add is pending the
//! loop also waits on the controller's deadline and commits when it fires.

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use super::controller::{AddOutcome, CommitOutcome, TaskListController};
use super::store::KeyValueStore;
use super::types::{EditSession, Task, TaskId};

const COMMAND_BUFFER: usize = 32;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TodoError {
    #[error("Task list coordinator is no longer running")]
    CoordinatorClosed,
}

/// Commands sent from handles to the coordinator.
#[derive(Debug)]
pub enum Command {
    Add {
        text: String,
        response_tx: oneshot::Sender<AddOutcome>,
    },
    Toggle {
        id: TaskId,
        response_tx: oneshot::Sender<bool>,
    },
    Remove {
        id: TaskId,
        response_tx: oneshot::Sender<bool>,
    },
    BeginEdit {
        id: TaskId,
        current_text: String,
        response_tx: oneshot::Sender<bool>,
    },
    UpdateDraft {
        text: String,
        response_tx: oneshot::Sender<bool>,
    },
    CommitEdit {
        response_tx: oneshot::Sender<CommitOutcome>,
    },
    CancelEdit {
        response_tx: oneshot::Sender<bool>,
    },
    ClearCompleted {
        response_tx: oneshot::Sender<usize>,
    },
    Snapshot {
        response_tx: oneshot::Sender<TodoSnapshot>,
    },
}

/// Everything a view needs to render the list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoSnapshot {
    pub tasks: Vec<Task>,
    pub editing: Option<EditSession>,
    pub is_adding: bool,
    pub active_count: usize,
    pub completed_count: usize,
}

pub struct TodoCoordinator<S> {
    controller: TaskListController<S>,
    command_rx: mpsc::Receiver<Command>,
}

impl<S: KeyValueStore> TodoCoordinator<S> {
    pub fn new(controller: TaskListController<S>) -> (Self, TodoHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);

        let coordinator = Self {
            controller,
            command_rx,
        };

        (coordinator, TodoHandle { command_tx })
    }

    /// Main event loop. Run this as a tokio task.
    ///
    /// Returns the controller once every handle is dropped and any pending
    /// add has been committed.
    pub async fn run(mut self) -> TaskListController<S> {
        tracing::info!(target: "todo::coordinator", "Starting event loop");

        loop {
            let deadline = self.controller.pending_deadline();

            tokio::select! {
                maybe_cmd = self.command_rx.recv() => {
                    match maybe_cmd {
                        Some(cmd) => {
                            // A command read after the deadline must see the commit
                            self.controller.finish_add_if_due(tokio::time::Instant::now());
                            self.handle_command(cmd);
                        }
                        None => {
                            tracing::info!(target: "todo::coordinator", "All handles dropped, shutting down");
                            break;
                        }
                    }
                }
                _ = wait_until(deadline), if deadline.is_some() => {
                    self.controller.finish_add();
                }
            }
        }

        // A scheduled add always commits
        if let Some(deadline) = self.controller.pending_deadline() {
            tokio::time::sleep_until(deadline).await;
            self.controller.finish_add();
        }

        self.controller
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Add { text, response_tx } => {
                let _ = response_tx.send(self.controller.add(&text));
            }
            Command::Toggle { id, response_tx } => {
                let _ = response_tx.send(self.controller.toggle(&id));
            }
            Command::Remove { id, response_tx } => {
                let _ = response_tx.send(self.controller.remove(&id));
            }
            Command::BeginEdit {
                id,
                current_text,
                response_tx,
            } => {
                let _ = response_tx.send(self.controller.begin_edit(&id, &current_text));
            }
            Command::UpdateDraft { text, response_tx } => {
                let _ = response_tx.send(self.controller.update_draft(&text));
            }
            Command::CommitEdit { response_tx } => {
                let _ = response_tx.send(self.controller.commit_edit());
            }
            Command::CancelEdit { response_tx } => {
                let _ = response_tx.send(self.controller.cancel_edit());
            }
            Command::ClearCompleted { response_tx } => {
                let _ = response_tx.send(self.controller.clear_completed());
            }
            Command::Snapshot { response_tx } => {
                let _ = response_tx.send(self.snapshot());
            }
        }
    }

    fn snapshot(&self) -> TodoSnapshot {
        let stats = self.controller.stats();
        TodoSnapshot {
            tasks: self.controller.tasks().to_vec(),
            editing: self.controller.edit_session(),
            is_adding: self.controller.is_adding(),
            active_count: stats.active,
            completed_count: stats.completed,
        }
    }
}

async fn wait_until(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Cloneable front end to a running coordinator.
#[derive(Debug, Clone)]
pub struct TodoHandle {
    command_tx: mpsc::Sender<Command>,
}

impl TodoHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, TodoError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.command_tx
            .send(build(response_tx))
            .await
            .map_err(|_| TodoError::CoordinatorClosed)?;
        response_rx.await.map_err(|_| TodoError::CoordinatorClosed)
    }

    pub async fn add(&self, text: impl Into<String>) -> Result<AddOutcome, TodoError> {
        let text = text.into();
        self.request(|response_tx| Command::Add { text, response_tx })
            .await
    }

    pub async fn toggle(&self, id: TaskId) -> Result<bool, TodoError> {
        self.request(|response_tx| Command::Toggle { id, response_tx })
            .await
    }

    pub async fn remove(&self, id: TaskId) -> Result<bool, TodoError> {
        self.request(|response_tx| Command::Remove { id, response_tx })
            .await
    }

    pub async fn begin_edit(
        &self,
        id: TaskId,
        current_text: impl Into<String>,
    ) -> Result<bool, TodoError> {
        let current_text = current_text.into();
        self.request(|response_tx| Command::BeginEdit {
            id,
            current_text,
            response_tx,
        })
        .await
    }

    pub async fn update_draft(&self, text: impl Into<String>) -> Result<bool, TodoError> {
        let text = text.into();
        self.request(|response_tx| Command::UpdateDraft { text, response_tx })
            .await
    }

    pub async fn commit_edit(&self) -> Result<CommitOutcome, TodoError> {
        self.request(|response_tx| Command::CommitEdit { response_tx })
            .await
    }

    pub async fn cancel_edit(&self) -> Result<bool, TodoError> {
        self.request(|response_tx| Command::CancelEdit { response_tx })
            .await
    }

    pub async fn clear_completed(&self) -> Result<usize, TodoError> {
        self.request(|response_tx| Command::ClearCompleted { response_tx })
            .await
    }

    pub async fn snapshot(&self) -> Result<TodoSnapshot, TodoError> {
        self.request(|response_tx| Command::Snapshot { response_tx })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::todo::store::{MemoryStore, SnapshotStore};
    use std::time::Duration;

    const DELAY: Duration = Duration::from_millis(300);

    fn spawn_coordinator(
        backend: MemoryStore,
    ) -> (
        TodoHandle,
        tokio::task::JoinHandle<TaskListController<MemoryStore>>,
    ) {
        let controller = TaskListController::open(SnapshotStore::new(backend, "todos"), DELAY);
        let (coordinator, handle) = TodoCoordinator::new(controller);
        (handle, tokio::spawn(coordinator.run()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_commits_after_delay() {
        let (handle, _join) = spawn_coordinator(MemoryStore::new());

        let outcome = handle.add("buy milk").await.unwrap();
        assert!(matches!(outcome, AddOutcome::Scheduled { .. }));

        let snapshot = handle.snapshot().await.unwrap();
        assert!(snapshot.is_adding);
        assert!(snapshot.tasks.is_empty());

        tokio::time::sleep(DELAY + Duration::from_millis(1)).await;

        let snapshot = handle.snapshot().await.unwrap();
        assert!(!snapshot.is_adding);
        assert_eq!(snapshot.tasks.len(), 1);
        assert_eq!(snapshot.tasks[0].text, "buy milk");
        assert_eq!(snapshot.active_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_add_inside_window_is_busy() {
        let (handle, _join) = spawn_coordinator(MemoryStore::new());

        handle.add("one").await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(handle.add("two").await.unwrap(), AddOutcome::Busy);

        tokio::time::sleep(DELAY).await;
        assert!(matches!(
            handle.add("three").await.unwrap(),
            AddOutcome::Scheduled { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_add_survives_shutdown() {
        let backend = MemoryStore::new();
        let (handle, join) = spawn_coordinator(backend.clone());

        handle.add("last words").await.unwrap();
        drop(handle);

        let controller = join.await.unwrap();
        assert_eq!(controller.tasks().len(), 1);
        assert!(!controller.is_adding());

        let reloaded = SnapshotStore::new(backend, "todos").load();
        assert_eq!(reloaded, controller.tasks());
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_coordinator_reports_error() {
        let (handle, join) = spawn_coordinator(MemoryStore::new());
        join.abort();
        let _ = join.await;

        assert_eq!(
            handle.toggle(TaskId::from(1)).await,
            Err(TodoError::CoordinatorClosed)
        );
    }
}
