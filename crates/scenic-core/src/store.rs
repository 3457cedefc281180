//! Task store: the authoritative task collection.
//!
//! Every mutation runs under one lock, persists the full collection, then
//! publishes its events. Persistence failures are logged and swallowed: the
//! in-memory state stays authoritative until the next successful save.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::domain::{
    AddOptions, LogEntry, LogLevel, Task, TaskEvent, TaskId, TaskStatus, TaskType,
};
use crate::events::EventChannel;
use crate::observability::TaskCounts;
use crate::ports::{Clock, IdGenerator, PersistenceError, TaskPersistence, UlidGenerator};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("task not found: {0}")]
    NotFound(TaskId),

    #[error("task {id}: illegal status transition {from} -> {to}")]
    IllegalTransition {
        id: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },

    #[error("task {id} is {status}; only failed tasks can be retried")]
    NotRetryable { id: TaskId, status: TaskStatus },

    #[error("task {0}: failed tasks return to pending only through retry")]
    RequeueOutsideRetry(TaskId),

    #[error("task {id}: {field} cannot be set on a {status} task")]
    FieldNotAllowed {
        id: TaskId,
        field: &'static str,
        status: TaskStatus,
    },
}

/// Partial update merged into a task by [`TaskStore::update`].
///
/// Restating the current status is allowed and changes nothing. `error` is
/// only accepted when the task ends up failed and `result` only when it ends
/// up completed. Requeueing goes through [`TaskStore::retry`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub status: Option<TaskStatus>,
    pub progress: Option<u8>,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub description: Option<String>,
}

impl TaskPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn result(mut self, result: Value) -> Self {
        self.result = Some(result);
        self
    }

    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn apply(self, task: &mut Task) -> Result<(), StoreError> {
        let next = self.status.unwrap_or(task.status);
        if next != task.status {
            if next == TaskStatus::Pending {
                return Err(StoreError::RequeueOutsideRetry(task.id));
            }
            if !task.status.can_transition_to(next) {
                return Err(StoreError::IllegalTransition {
                    id: task.id,
                    from: task.status,
                    to: next,
                });
            }
        }
        if self.error.is_some() && next != TaskStatus::Failed {
            return Err(StoreError::FieldNotAllowed {
                id: task.id,
                field: "error",
                status: next,
            });
        }
        if self.result.is_some() && next != TaskStatus::Completed {
            return Err(StoreError::FieldNotAllowed {
                id: task.id,
                field: "result",
                status: next,
            });
        }

        task.status = next;
        if let Some(progress) = self.progress {
            task.set_progress(progress);
        }
        if let Some(result) = self.result {
            task.result = Some(result);
        }
        if let Some(error) = self.error {
            task.error = Some(error);
        }
        if let Some(description) = self.description {
            task.description = Some(description);
        }
        Ok(())
    }
}

/// What a single-task mutation changed.
#[derive(Default)]
struct Changes {
    fields: bool,
    logs: usize,
}

impl Changes {
    fn fields() -> Self {
        Self {
            fields: true,
            logs: 0,
        }
    }

    fn fields_and_log() -> Self {
        Self {
            fields: true,
            logs: 1,
        }
    }

    fn log() -> Self {
        Self {
            fields: false,
            logs: 1,
        }
    }
}

pub struct TaskStore {
    tasks: Mutex<Vec<Task>>,
    persistence: Arc<dyn TaskPersistence>,
    clock: Arc<dyn Clock>,
    ids: Box<dyn IdGenerator>,
    events: EventChannel,
}

impl std::fmt::Debug for TaskStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskStore")
            .field("tasks", &self.len())
            .finish_non_exhaustive()
    }
}

impl TaskStore {
    pub fn new(
        persistence: Arc<dyn TaskPersistence>,
        clock: Arc<dyn Clock>,
        events: EventChannel,
    ) -> Self {
        let ids = Box::new(UlidGenerator::new(clock.clone()));
        Self {
            tasks: Mutex::new(Vec::new()),
            persistence,
            clock,
            ids,
            events,
        }
    }

    pub fn events(&self) -> &EventChannel {
        &self.events
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Task>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, tasks: &[Task]) {
        if let Err(err) = self.persistence.save(tasks) {
            error!(error = %err, tasks = tasks.len(), "failed to persist tasks");
        }
    }

    /// Replace the in-memory collection with the persisted snapshot.
    ///
    /// Tasks persisted as running were interrupted by a crash and come back as
    /// pending. Returns the number of tasks loaded.
    pub fn load(&self) -> Result<usize, PersistenceError> {
        let mut loaded = self.persistence.load().map_err(|err| {
            error!(error = %err, "failed to load tasks");
            err
        })?;

        for task in loaded.iter_mut().filter(|t| t.status == TaskStatus::Running) {
            warn!(
                task_id = %task.id,
                task_type = %task.task_type,
                "task was running at shutdown, requeued as pending"
            );
            task.status = TaskStatus::Pending;
        }

        let count = loaded.len();
        *self.lock() = loaded;
        info!(tasks = count, "task store loaded");
        Ok(count)
    }

    /// Write the full collection. Failures are logged and returned.
    pub fn save(&self) -> Result<(), PersistenceError> {
        let tasks = self.lock();
        self.persistence.save(&tasks).map_err(|err| {
            error!(error = %err, tasks = tasks.len(), "failed to persist tasks");
            err
        })
    }

    pub fn add(
        &self,
        task_type: impl Into<TaskType>,
        data: Value,
        options: AddOptions,
    ) -> TaskId {
        let task = Task::new(
            self.ids.generate_task_id(),
            task_type.into(),
            data,
            options,
            self.clock.now(),
        );
        let id = task.id;
        debug!(task_id = %id, task_type = %task.task_type, "task added");

        let mut tasks = self.lock();
        tasks.push(task.clone());
        self.persist(&tasks);
        self.events.publish(TaskEvent::Added { task });
        id
    }

    fn mutate<F>(&self, id: TaskId, f: F) -> Result<Task, StoreError>
    where
        F: FnOnce(&mut Task, DateTime<Utc>) -> Result<Changes, StoreError>,
    {
        let mut tasks = self.lock();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound(id))?;

        let now = self.clock.now();
        let changes = f(task, now)?;
        task.updated_at = now;
        let snapshot = task.clone();

        self.persist(&tasks);

        if changes.fields {
            self.events.publish(TaskEvent::Updated {
                task: snapshot.clone(),
            });
        }
        let first_new = snapshot.logs.len().saturating_sub(changes.logs);
        for entry in &snapshot.logs[first_new..] {
            self.events.publish(TaskEvent::LogAppended {
                task_id: id,
                entry: entry.clone(),
            });
        }
        Ok(snapshot)
    }

    /// Merge `patch` into the task.
    pub fn update(&self, id: TaskId, patch: TaskPatch) -> Result<Task, StoreError> {
        self.mutate(id, |task, _| {
            patch.apply(task)?;
            Ok(Changes::fields())
        })
    }

    pub fn append_log(
        &self,
        id: TaskId,
        level: LogLevel,
        message: impl Into<String>,
    ) -> Result<LogEntry, StoreError> {
        let message = message.into();
        let mut entry = None;
        self.mutate(id, |task, now| {
            entry = Some(task.push_log(level, message, now));
            Ok(Changes::log())
        })?;
        entry.ok_or(StoreError::NotFound(id))
    }

    /// Pending → running, progress reset, "starting" log entry.
    pub fn mark_running(&self, id: TaskId) -> Result<Task, StoreError> {
        self.mutate(id, |task, now| {
            TaskPatch::new()
                .status(TaskStatus::Running)
                .progress(0)
                .apply(task)?;
            let message = format!("starting {}", task.task_type);
            task.push_log(LogLevel::Info, message, now);
            Ok(Changes::fields_and_log())
        })
    }

    pub fn set_progress(&self, id: TaskId, progress: u8) -> Result<Task, StoreError> {
        self.update(id, TaskPatch::new().progress(progress))
    }

    /// Running → completed with `result`.
    pub fn complete(&self, id: TaskId, result: Value) -> Result<Task, StoreError> {
        self.mutate(id, |task, now| {
            TaskPatch::new()
                .status(TaskStatus::Completed)
                .progress(100)
                .result(result)
                .apply(task)?;
            let message = format!("{} completed", task.task_type);
            task.push_log(LogLevel::Info, message, now);
            Ok(Changes::fields_and_log())
        })
    }

    /// Running → failed with `error`.
    pub fn fail(&self, id: TaskId, error: impl Into<String>) -> Result<Task, StoreError> {
        let error = error.into();
        self.mutate(id, |task, now| {
            let message = format!("{} failed: {error}", task.task_type);
            TaskPatch::new()
                .status(TaskStatus::Failed)
                .error(error)
                .apply(task)?;
            task.push_log(LogLevel::Error, message, now);
            Ok(Changes::fields_and_log())
        })
    }

    /// Failed → pending. Clears the error and progress.
    pub fn retry(&self, id: TaskId) -> Result<Task, StoreError> {
        let task = self.mutate(id, |task, now| {
            if task.status != TaskStatus::Failed {
                return Err(StoreError::NotRetryable {
                    id: task.id,
                    status: task.status,
                });
            }
            task.status = TaskStatus::Pending;
            task.error = None;
            task.result = None;
            task.progress = 0;
            task.push_log(LogLevel::Info, "retried", now);
            Ok(Changes::fields_and_log())
        })?;
        info!(task_id = %id, task_type = %task.task_type, "task requeued for retry");
        Ok(task)
    }

    pub fn get(&self, id: TaskId) -> Option<Task> {
        self.lock().iter().find(|t| t.id == id).cloned()
    }

    /// Every task, newest first.
    pub fn list(&self) -> Vec<Task> {
        let mut tasks = self.lock().clone();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks
    }

    /// Tasks with `status`, in insertion order.
    pub fn list_by_status(&self, status: TaskStatus) -> Vec<Task> {
        self.lock()
            .iter()
            .filter(|t| t.status == status)
            .cloned()
            .collect()
    }

    pub fn pending(&self) -> Vec<Task> {
        self.list_by_status(TaskStatus::Pending)
    }

    pub fn clear_completed(&self) -> usize {
        self.remove_where(|t| t.status == TaskStatus::Completed)
    }

    pub fn clear_completed_and_failed(&self) -> usize {
        self.remove_where(|t| t.status.is_settled())
    }

    fn remove_where(&self, pred: impl Fn(&Task) -> bool) -> usize {
        let mut tasks = self.lock();
        let before = tasks.len();
        tasks.retain(|t| !pred(t));
        let removed = before - tasks.len();
        if removed > 0 {
            self.persist(&tasks);
            info!(removed, "cleared settled tasks");
        }
        removed
    }

    pub fn counts(&self) -> TaskCounts {
        TaskCounts::from_tasks(self.lock().iter())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
