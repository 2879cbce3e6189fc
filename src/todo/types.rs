use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Task identifier.
///
/// Snapshots written by older builds used millisecond timestamps as ids, so
/// both numeric and string ids are accepted and written back unchanged.
/// Newly created tasks always get a random UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskId {
    Number(i64),
    Text(String),
}

impl TaskId {
    pub fn generate() -> Self {
        TaskId::Text(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskId::Number(n) => write!(f, "{}", n),
            TaskId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        match value.parse::<i64>() {
            Ok(n) => TaskId::Number(n),
            Err(_) => TaskId::Text(value.to_string()),
        }
    }
}

impl From<i64> for TaskId {
    fn from(value: i64) -> Self {
        TaskId::Number(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Builds a fresh, not yet completed task. `text` must already be trimmed
    /// and non-empty; only the controller's add path creates tasks.
    ///
    /// `created_at` is cut to milliseconds so a task equals its stored form.
    pub(crate) fn new(text: String) -> Self {
        Self {
            id: TaskId::generate(),
            text,
            completed: false,
            created_at: Utc::now().trunc_subsecs(3),
        }
    }
}

/// The open edit, if any: which task is being edited and its unsaved draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditSession {
    pub target_id: TaskId,
    pub draft_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
}

impl TaskStats {
    pub fn of(tasks: &[Task]) -> Self {
        let completed = tasks.iter().filter(|task| task.completed).count();
        Self {
            total: tasks.len(),
            active: tasks.len() - completed,
            completed,
        }
    }
}

/// `createdAt` is stored as an ISO-8601 string with millisecond precision
/// and a `Z` suffix, e.g. `2024-05-01T12:30:00.000Z`.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(de::Error::custom)
    }
}
