//! Line-oriented front end for the task list.
//!
//! Reads one command per line and prints the list after each one. Tasks
//! are addressed by their 1-based position in the last printed listing.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::todo::controller::{AddOutcome, CommitOutcome};
use crate::todo::coordinator::{TodoError, TodoHandle, TodoSnapshot};
use crate::todo::types::Task;

pub const HELP: &str = "\
commands:
  add <text>     add a task
  toggle <n>     mark task n done / not done
  rm <n>         delete task n
  edit <n>       start editing task n
  draft <text>   replace the edit draft
  save           save the edit
  cancel         discard the edit
  clear          delete all completed tasks
  list           show the list
  help           show this help
  quit           exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Add(String),
    Toggle(usize),
    Remove(usize),
    Edit(usize),
    Draft(String),
    Save,
    Cancel,
    Clear,
    List,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

pub fn parse_line(line: &str) -> ShellCommand {
    let line = line.trim();
    if line.is_empty() {
        return ShellCommand::Empty;
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let position = |rest: &str| rest.parse::<usize>().ok().filter(|n| *n > 0);

    match word.to_lowercase().as_str() {
        "add" | "a" => ShellCommand::Add(rest.to_string()),
        "toggle" | "t" => position(rest).map_or_else(|| unknown(line), ShellCommand::Toggle),
        "rm" | "remove" | "delete" => {
            position(rest).map_or_else(|| unknown(line), ShellCommand::Remove)
        }
        "edit" | "e" => position(rest).map_or_else(|| unknown(line), ShellCommand::Edit),
        // Drafts keep their inner whitespace; trimming happens on save
        "draft" | "d" => ShellCommand::Draft(rest.to_string()),
        "save" => ShellCommand::Save,
        "cancel" => ShellCommand::Cancel,
        "clear" => ShellCommand::Clear,
        "list" | "ls" => ShellCommand::List,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" | "q" => ShellCommand::Quit,
        _ => unknown(line),
    }
}

fn unknown(line: &str) -> ShellCommand {
    ShellCommand::Unknown(line.to_string())
}

pub fn render(snapshot: &TodoSnapshot) -> String {
    let mut out = String::new();

    if snapshot.tasks.is_empty() {
        out.push_str("  (no tasks)\n");
    }

    for (index, task) in snapshot.tasks.iter().enumerate() {
        let mark = if task.completed { "x" } else { " " };
        out.push_str(&format!("[{}] {}. {}\n", mark, index + 1, task.text));

        if let Some(session) = &snapshot.editing {
            if session.target_id == task.id {
                out.push_str(&format!("      editing: {:?}\n", session.draft_text));
            }
        }
    }

    if snapshot.is_adding {
        out.push_str("  adding...\n");
    }

    out.push_str(&format!(
        "{} active, {} completed\n",
        snapshot.active_count, snapshot.completed_count
    ));
    out
}

fn task_at(snapshot: &TodoSnapshot, position: usize) -> Option<&Task> {
    position
        .checked_sub(1)
        .and_then(|index| snapshot.tasks.get(index))
}

/// Runs commands from `input` until it ends or `quit` is read.
///
/// Positions resolve against the listing printed before the command, not the
/// live list: an add that commits in between must not retarget `<n>`.
pub async fn run_shell<R, W>(handle: &TodoHandle, input: R, out: &mut W) -> Result<(), ShellError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut listing = print_listing(handle, out).await?;

    while let Some(line) = lines.next_line().await? {
        let command = parse_line(&line);
        tracing::debug!(target: "system", ?command, "Shell command");

        let message = match command {
            ShellCommand::Empty => continue,
            ShellCommand::Quit => break,
            ShellCommand::Help => Some(HELP.to_string()),
            ShellCommand::Unknown(raw) => Some(format!("unknown command: {}\n{}", raw, HELP)),
            ShellCommand::List => None,
            ShellCommand::Add(text) => match handle.add(text).await? {
                AddOutcome::Scheduled { .. } => None,
                AddOutcome::Empty => Some("nothing to add".to_string()),
                AddOutcome::Busy => Some("still adding the previous task".to_string()),
            },
            ShellCommand::Toggle(n) => match task_at(&listing, n) {
                Some(task) => missing_unless(handle.toggle(task.id.clone()).await?, n),
                None => Some(no_task(n)),
            },
            ShellCommand::Remove(n) => match task_at(&listing, n) {
                Some(task) => missing_unless(handle.remove(task.id.clone()).await?, n),
                None => Some(no_task(n)),
            },
            ShellCommand::Edit(n) => match task_at(&listing, n) {
                Some(task) => missing_unless(
                    handle.begin_edit(task.id.clone(), task.text.clone()).await?,
                    n,
                ),
                None => Some(no_task(n)),
            },
            ShellCommand::Draft(text) => {
                if handle.update_draft(text).await? {
                    None
                } else {
                    Some("not editing".to_string())
                }
            }
            ShellCommand::Save => match handle.commit_edit().await? {
                CommitOutcome::Saved => None,
                CommitOutcome::Unchanged => Some("no change".to_string()),
                CommitOutcome::NotEditing => Some("not editing".to_string()),
            },
            ShellCommand::Cancel => {
                if handle.cancel_edit().await? {
                    None
                } else {
                    Some("not editing".to_string())
                }
            }
            ShellCommand::Clear => {
                let removed = handle.clear_completed().await?;
                Some(format!("cleared {} completed", removed))
            }
        };

        if let Some(message) = message {
            writeln!(out, "{}", message)?;
        }
        listing = print_listing(handle, out).await?;
    }

    Ok(())
}

/// Prints the current list and returns the snapshot it was drawn from.
async fn print_listing<W: Write>(
    handle: &TodoHandle,
    out: &mut W,
) -> Result<TodoSnapshot, ShellError> {
    let snapshot = handle.snapshot().await?;
    write!(out, "{}", render(&snapshot))?;
    out.flush()?;
    Ok(snapshot)
}

fn no_task(n: usize) -> String {
    format!("no task {}", n)
}

fn missing_unless(applied: bool, n: usize) -> Option<String> {
    if applied {
        None
    } else {
        Some(no_task(n))
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ShellError {
    #[error("Shell I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Todo(#[from] TodoError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::todo::types::{EditSession, TaskId};

    #[test]
    fn test_parse_basic_commands() {
        assert_eq!(parse_line("add buy milk"), ShellCommand::Add("buy milk".into()));
        assert_eq!(parse_line("  toggle 2 "), ShellCommand::Toggle(2));
        assert_eq!(parse_line("rm 1"), ShellCommand::Remove(1));
        assert_eq!(parse_line("edit 3"), ShellCommand::Edit(3));
        assert_eq!(parse_line("draft new  text"), ShellCommand::Draft("new  text".into()));
        assert_eq!(parse_line("SAVE"), ShellCommand::Save);
        assert_eq!(parse_line("cancel"), ShellCommand::Cancel);
        assert_eq!(parse_line("clear"), ShellCommand::Clear);
        assert_eq!(parse_line("ls"), ShellCommand::List);
        assert_eq!(parse_line("q"), ShellCommand::Quit);
        assert_eq!(parse_line("   "), ShellCommand::Empty);
    }

    #[test]
    fn test_parse_add_without_text_is_blank_add() {
        assert_eq!(parse_line("add"), ShellCommand::Add(String::new()));
        assert_eq!(parse_line("draft"), ShellCommand::Draft(String::new()));
    }

    #[test]
    fn test_parse_rejects_bad_positions() {
        assert!(matches!(parse_line("toggle"), ShellCommand::Unknown(_)));
        assert!(matches!(parse_line("toggle 0"), ShellCommand::Unknown(_)));
        assert!(matches!(parse_line("rm two"), ShellCommand::Unknown(_)));
        assert!(matches!(parse_line("frobnicate"), ShellCommand::Unknown(_)));
    }

    #[test]
    fn test_render_marks_completed_and_editing() {
        let mut done = Task::new("done".into());
        done.completed = true;
        let open = Task::new("open".into());

        let snapshot = TodoSnapshot {
            editing: Some(EditSession {
                target_id: open.id.clone(),
                draft_text: "opened".into(),
            }),
            tasks: vec![open, done],
            is_adding: true,
            active_count: 1,
            completed_count: 1,
        };

        let text = render(&snapshot);
        assert!(text.contains("[ ] 1. open"));
        assert!(text.contains("[x] 2. done"));
        assert!(text.contains("editing: \"opened\""));
        assert!(text.contains("adding..."));
        assert!(text.ends_with("1 active, 1 completed\n"));
    }

    #[test]
    fn test_task_at_is_one_based() {
        let snapshot = TodoSnapshot {
            tasks: vec![Task {
                id: TaskId::from(7),
                ..Task::new("only".into())
            }],
            editing: None,
            is_adding: false,
            active_count: 1,
            completed_count: 0,
        };

        assert!(task_at(&snapshot, 0).is_none());
        assert_eq!(task_at(&snapshot, 1).map(|t| &t.id), Some(&TaskId::from(7)));
        assert!(task_at(&snapshot, 2).is_none());
    }
}
