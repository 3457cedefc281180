//! Task lifecycle events announced to observers.

use serde::Serialize;

use super::ids::TaskId;
use super::task::{LogEntry, Task};

/// TaskEvent is published once per store mutation.
///
/// Serialized with an `event` tag so a UI bridge can forward it as-is.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum TaskEvent {
    /// A producer added a task.
    #[serde(rename_all = "camelCase")]
    Added { task: Task },

    /// Status, progress, result, error or description changed.
    #[serde(rename_all = "camelCase")]
    Updated { task: Task },

    /// A log entry was appended.
    #[serde(rename_all = "camelCase")]
    LogAppended { task_id: TaskId, entry: LogEntry },
}

impl TaskEvent {
    pub fn task_id(&self) -> TaskId {
        match self {
            TaskEvent::Added { task } | TaskEvent::Updated { task } => task.id,
            TaskEvent::LogAppended { task_id, .. } => *task_id,
        }
    }
}
