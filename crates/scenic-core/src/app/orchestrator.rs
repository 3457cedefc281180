//! Orchestrator: the facade producers and observers talk to.

use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tokio::sync::broadcast;
use tracing::info;

use super::builder::OrchestratorBuilder;
use super::scheduler::{SchedulerHandle, SchedulerLoop};
use crate::config::OrchestratorConfig;
use crate::domain::{AddOptions, Task, TaskEvent, TaskId, TaskStatus, TaskType};
use crate::observability::TaskCounts;
use crate::ports::PersistenceError;
use crate::store::{StoreError, TaskStore};
use crate::typed::JobPayload;

/// Lifecycle: [`Orchestrator::builder`] → [`init`](Orchestrator::init) →
/// [`start`](Orchestrator::start) → [`shutdown`](Orchestrator::shutdown).
pub struct Orchestrator {
    config: OrchestratorConfig,
    store: Arc<TaskStore>,
    scheduler: Arc<SchedulerLoop>,
    handle: Mutex<Option<SchedulerHandle>>,
}

impl Orchestrator {
    pub fn builder(config: OrchestratorConfig) -> OrchestratorBuilder {
        OrchestratorBuilder::new(config)
    }

    pub(crate) fn from_parts(
        config: OrchestratorConfig,
        store: Arc<TaskStore>,
        scheduler: Arc<SchedulerLoop>,
    ) -> Self {
        Self {
            config,
            store,
            scheduler,
            handle: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<TaskStore> {
        &self.store
    }

    pub fn scheduler(&self) -> &Arc<SchedulerLoop> {
        &self.scheduler
    }

    /// Load persisted tasks, requeueing any that were running. Returns the
    /// number of tasks loaded.
    pub fn init(&self) -> Result<usize, PersistenceError> {
        self.store.load()
    }

    /// Spawn the scheduler loop. Calling it again while running does nothing.
    pub fn start(&self) {
        let mut handle = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
        if handle.is_some() {
            return;
        }
        *handle = Some(Arc::clone(&self.scheduler).spawn());
        info!(tasks = self.store.len(), "orchestrator started");
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Stop the scheduler loop and write a final snapshot.
    ///
    /// In-flight tasks are not cancelled; they keep updating the store.
    pub async fn shutdown(&self) -> Result<(), PersistenceError> {
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.shutdown_and_join().await;
        }
        info!(in_flight = self.scheduler.in_flight(), "orchestrator stopped");
        self.store.save()
    }

    /// Wait until no task holds a concurrency slot.
    pub async fn wait_idle(&self) {
        self.scheduler.wait_idle().await;
    }

    pub fn add_task(
        &self,
        task_type: impl Into<TaskType>,
        data: Value,
        options: AddOptions,
    ) -> TaskId {
        self.store.add(task_type, data, options)
    }

    /// Add a task from a typed payload.
    pub fn submit<P: JobPayload>(
        &self,
        payload: &P,
        options: AddOptions,
    ) -> Result<TaskId, serde_json::Error> {
        let data = serde_json::to_value(payload)?;
        Ok(self.store.add(P::KIND, data, options))
    }

    pub fn get_task(&self, id: TaskId) -> Option<Task> {
        self.store.get(id)
    }

    /// Every task, newest first.
    pub fn get_all_tasks(&self) -> Vec<Task> {
        self.store.list()
    }

    pub fn get_tasks_by_status(&self, status: TaskStatus) -> Vec<Task> {
        self.store.list_by_status(status)
    }

    pub fn retry_task(&self, id: TaskId) -> Result<Task, StoreError> {
        self.store.retry(id)
    }

    pub fn clear_completed_tasks(&self) -> usize {
        self.store.clear_completed()
    }

    pub fn clear_completed_and_failed_tasks(&self) -> usize {
        self.store.clear_completed_and_failed()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.store.events().subscribe()
    }

    pub fn counts(&self) -> TaskCounts {
        self.store.counts()
    }
}
