//! Task record: the single persisted entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::TaskId;
use super::state::TaskStatus;
use super::task_type::TaskType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// One line of a task's append-only log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

/// Optional fields accepted when a task is added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddOptions {
    pub depends_on: Option<TaskId>,
    pub description: Option<String>,
}

impl AddOptions {
    pub fn follow_up_of(parent: TaskId) -> Self {
        Self {
            depends_on: Some(parent),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A unit of work tracked by the task store.
///
/// Field names follow the persisted JSON layout (`camelCase`, `type`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,

    #[serde(rename = "type")]
    pub task_type: TaskType,

    pub status: TaskStatus,

    /// Advisory percentage, 0..=100.
    pub progress: u8,

    /// Job-specific input. Opaque to the store.
    #[serde(default)]
    pub data: serde_json::Value,

    /// Set only on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,

    /// Set only on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default)]
    pub logs: Vec<LogEntry>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// The task whose completion created this one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<TaskId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Task {
    pub fn new(
        id: TaskId,
        task_type: TaskType,
        data: serde_json::Value,
        options: AddOptions,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            task_type,
            status: TaskStatus::Pending,
            progress: 0,
            data,
            result: None,
            error: None,
            logs: Vec::new(),
            created_at: now,
            updated_at: now,
            depends_on: options.depends_on,
            description: options.description,
        }
    }

    /// Append a log entry and return a copy of it.
    pub fn push_log(
        &mut self,
        level: LogLevel,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> LogEntry {
        let entry = LogEntry {
            timestamp: now,
            level,
            message: message.into(),
        };
        self.logs.push(entry.clone());
        entry
    }

    pub fn set_progress(&mut self, progress: u8) {
        self.progress = progress.min(100);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ulid::Ulid;

    fn sample(now: DateTime<Utc>) -> Task {
        Task::new(
            TaskId::from_ulid(Ulid::new()),
            TaskType::new("SEARCH_CITY_SPOTS"),
            serde_json::json!({"province": "yunnan", "city": "dali"}),
            AddOptions::default().with_description("dali spots"),
            now,
        )
    }

    #[test]
    fn new_task_is_pending_with_zero_progress() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let task = sample(now);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.progress, 0);
        assert!(task.logs.is_empty());
        assert_eq!(task.created_at, now);
        assert_eq!(task.updated_at, now);
        assert_eq!(task.description.as_deref(), Some("dali spots"));
    }

    #[test]
    fn progress_is_clamped() {
        let mut task = sample(Utc::now());
        task.set_progress(250);
        assert_eq!(task.progress, 100);
    }

    #[test]
    fn persisted_layout_uses_camel_case_and_type() {
        let parent = TaskId::from_ulid(Ulid::new());
        let mut task = sample(Utc::now());
        task.depends_on = Some(parent);

        let v = serde_json::to_value(&task).unwrap();
        assert_eq!(v["type"], "SEARCH_CITY_SPOTS");
        assert_eq!(v["status"], "pending");
        assert_eq!(v["dependsOn"], parent.to_string());
        assert!(v.get("createdAt").is_some());
        assert!(v.get("updatedAt").is_some());
        // Unset optional fields are omitted.
        assert!(v.get("result").is_none());
        assert!(v.get("error").is_none());
    }

    #[test]
    fn log_entries_keep_order() {
        let now = Utc::now();
        let mut task = sample(now);
        task.push_log(LogLevel::Info, "first", now);
        task.push_log(LogLevel::Warn, "second", now);
        let messages: Vec<_> = task.logs.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, ["first", "second"]);
        assert_eq!(task.logs[1].level, LogLevel::Warn);
    }
}
