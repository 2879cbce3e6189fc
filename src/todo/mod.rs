pub mod controller;
pub mod coordinator;
pub mod edit;
pub mod store;
pub mod types;

use std::path::Path;

use crate::app::settings::AppSettings;
use controller::TaskListController;
use store::{FileStore, SnapshotStore};

/// Opens the task list stored under `data_dir` with the given settings.
pub fn open_task_list(data_dir: &Path, settings: &AppSettings) -> TaskListController<FileStore> {
    let store = SnapshotStore::new(FileStore::new(data_dir), settings.storage_key.clone());
    let controller = TaskListController::open(store, settings.add_delay());
    tracing::info!(
        target: "todo",
        dir = %data_dir.display(),
        key = %settings.storage_key,
        "Task list store initialized"
    );
    controller
}
