//! SchedulerLoop: promote pending tasks under the concurrency ceiling.
//!
//! Concurrency slots are semaphore permits. Each tick dispatches at most one
//! pending task per free slot, oldest first.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::executor::JobExecutor;
use crate::config::SchedulerConfig;
use crate::store::TaskStore;

pub struct SchedulerLoop {
    store: Arc<TaskStore>,
    executor: Arc<JobExecutor>,
    slots: Arc<Semaphore>,
    max_concurrency: usize,
    tick_interval: Duration,
}

impl SchedulerLoop {
    pub fn new(store: Arc<TaskStore>, executor: Arc<JobExecutor>, config: &SchedulerConfig) -> Self {
        let max_concurrency = config.max_concurrency.max(1);
        Self {
            store,
            executor,
            slots: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
            tick_interval: config.tick_interval(),
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Slots currently held by dispatched tasks.
    pub fn in_flight(&self) -> usize {
        self.max_concurrency - self.slots.available_permits()
    }

    /// Run one scheduling pass. Returns how many tasks left `pending`.
    pub fn tick(&self) -> usize {
        let free = self.slots.available_permits();
        if free == 0 {
            return 0;
        }

        let mut dispatched = 0;
        for task in self.store.pending().into_iter().take(free) {
            let Ok(permit) = Arc::clone(&self.slots).try_acquire_owned() else {
                break;
            };
            debug!(task_id = %task.id, task_type = %task.task_type, "dispatching");
            self.executor.dispatch(task, permit);
            dispatched += 1;
        }
        dispatched
    }

    /// Wait until every slot is free.
    pub async fn wait_idle(&self) {
        let all = u32::try_from(self.max_concurrency).unwrap_or(u32::MAX);
        // Closed only if the semaphore is closed, which never happens.
        let _ = self.slots.acquire_many(all).await;
    }

    /// Start ticking on the runtime until the handle asks to stop.
    pub fn spawn(self: Arc<Self>) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let join = tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.tick_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(
                interval_ms = self.tick_interval.as_millis() as u64,
                max_concurrency = self.max_concurrency,
                "scheduler loop started"
            );

            loop {
                if *shutdown_rx.borrow() {
                    break;
                }
                tokio::select! {
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        let dispatched = self.tick();
                        if dispatched > 0 {
                            debug!(dispatched, in_flight = self.in_flight(), "scheduler tick");
                        }
                    }
                }
            }
            info!(in_flight = self.in_flight(), "scheduler loop stopped");
        });

        SchedulerHandle { shutdown_tx, join }
    }
}

pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn request_shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Stop ticking and wait for the loop to exit. In-flight tasks keep running.
    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        let _ = self.join.await;
    }
}
