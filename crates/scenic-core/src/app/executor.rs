//! JobExecutor: run one task to a settled status.

use std::any::Any;
use std::sync::Arc;

use tokio::sync::OwnedSemaphorePermit;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::dependency::DependencyScheduler;
use crate::config::HandlerConfig;
use crate::domain::{JobError, Task, TaskId};
use crate::ports::ProcessRunner;
use crate::store::TaskStore;
use crate::typed::{DynHandler, HandlerRegistry, JobContext};

pub struct JobExecutor {
    store: Arc<TaskStore>,
    registry: Arc<HandlerRegistry>,
    runner: Arc<dyn ProcessRunner>,
    settings: Arc<HandlerConfig>,
    dependencies: Option<Arc<DependencyScheduler>>,
}

impl JobExecutor {
    pub fn new(
        store: Arc<TaskStore>,
        registry: Arc<HandlerRegistry>,
        runner: Arc<dyn ProcessRunner>,
        settings: Arc<HandlerConfig>,
    ) -> Self {
        Self {
            store,
            registry,
            runner,
            settings,
            dependencies: None,
        }
    }

    pub fn with_dependencies(mut self, dependencies: Arc<DependencyScheduler>) -> Self {
        self.dependencies = Some(dependencies);
        self
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Mark `task` running and start its handler on `permit`.
    ///
    /// The permit is released when the task settles. Unknown types fail
    /// before this returns, and `None` is returned since no handler started.
    pub fn dispatch(
        self: &Arc<Self>,
        task: Task,
        permit: OwnedSemaphorePermit,
    ) -> Option<JoinHandle<()>> {
        let running = match self.store.mark_running(task.id) {
            Ok(running) => running,
            Err(err) => {
                warn!(task_id = %task.id, error = %err, "task could not be started");
                return None;
            }
        };

        let handler = match self.registry.resolve(&running.task_type) {
            Ok(handler) => handler,
            Err(err) => {
                self.record_failure(running.id, &err);
                drop(permit);
                return None;
            }
        };

        info!(task_id = %running.id, task_type = %running.task_type, "task started");
        let this = Arc::clone(self);
        Some(tokio::spawn(async move {
            let _permit = permit;
            this.run(running, handler).await;
        }))
    }

    async fn run(&self, task: Task, handler: Arc<dyn DynHandler>) {
        let id = task.id;
        let ctx = JobContext::new(
            task,
            Arc::clone(&self.store),
            Arc::clone(&self.runner),
            Arc::clone(&self.settings),
        );

        // A panicking handler only takes down this inner task.
        let outcome = tokio::spawn(async move { handler.handle_dyn(&ctx).await })
            .await
            .unwrap_or_else(|join_err| {
                let reason = if join_err.is_panic() {
                    panic_message(join_err.into_panic())
                } else {
                    "handler was cancelled".to_string()
                };
                Err(JobError::execution(format!("handler panicked: {reason}")))
            });

        match outcome {
            Ok(result) => self.record_success(id, result),
            Err(err) => self.record_failure(id, &err),
        }
    }

    fn record_success(&self, id: TaskId, result: serde_json::Value) {
        let done = match self.store.complete(id, result) {
            Ok(done) => done,
            Err(err) => {
                error!(task_id = %id, error = %err, "cannot record completion");
                return;
            }
        };
        info!(task_id = %id, task_type = %done.task_type, "task completed");

        if let Some(dependencies) = &self.dependencies {
            dependencies.on_completed(&done);
        }
    }

    fn record_failure(&self, id: TaskId, err: &JobError) {
        warn!(task_id = %id, kind = ?err.kind(), error = %err, "task failed");
        if let Err(store_err) = self.store.fail(id, err.to_string()) {
            error!(task_id = %id, error = %store_err, "cannot record failure");
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
