use crate::shared::paths::{ensure_dir, get_log_dir};
use std::path::Path;
use thiserror::Error;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Target prefix whose events are routed to `todo.log`.
const TODO_TARGET: &str = "todo";

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Failed to create logs directory: {0}")]
    Directory(#[from] std::io::Error),
    #[error("Failed to set global tracing subscriber: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Keeps the non-blocking writers alive; drop flushes pending lines.
pub struct LoggingGuards {
    _guards: Vec<WorkerGuard>,
}

struct TargetWriter {
    todo_writer: NonBlocking,
    system_writer: NonBlocking,
}

impl<'a> MakeWriter<'a> for TargetWriter {
    type Writer = NonBlocking;

    fn make_writer(&'a self) -> Self::Writer {
        self.system_writer.clone()
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        if is_todo_target(meta.target()) {
            self.todo_writer.clone()
        } else {
            self.system_writer.clone()
        }
    }
}

fn is_todo_target(target: &str) -> bool {
    target == TODO_TARGET || target.starts_with(&format!("{}::", TODO_TARGET))
}

pub fn init_logging() -> Result<LoggingGuards, LoggingError> {
    init_logging_in(&get_log_dir())
}

pub fn init_logging_in(log_dir: &Path) -> Result<LoggingGuards, LoggingError> {
    ensure_dir(log_dir)?;

    let todo_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "todo.log");
    let (todo_writer, todo_guard) = tracing_appender::non_blocking(todo_appender);

    let system_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "system.log");
    let (system_writer, system_guard) = tracing_appender::non_blocking(system_appender);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(TargetWriter {
                todo_writer,
                system_writer,
            })
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false),
    );

    tracing::subscriber::set_global_default(subscriber)?;

    tracing::info!(target: "system", "Logging initialized at {:?}", log_dir);

    Ok(LoggingGuards {
        _guards: vec![todo_guard, system_guard],
    })
}
