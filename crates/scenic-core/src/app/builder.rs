//! OrchestratorBuilder: wiring and startup validation.
//!
//! # Fail-fast
//! - `expect_job_kinds()` declares the kinds the deployment needs
//! - `build()` checks they are all registered and that the config is sane

use std::sync::Arc;

use crate::config::OrchestratorConfig;
use crate::domain::JobKind;
use crate::events::EventChannel;
use crate::handlers;
use crate::impls::{JsonFileTaskPersistence, TokioProcessRunner};
use crate::ports::{Clock, ProcessRunner, SystemClock, TaskPersistence};
use crate::store::TaskStore;
use crate::typed::{Handler, HandlerRegistry, JobPayload, RegistryError};

use super::dependency::DependencyScheduler;
use super::executor::JobExecutor;
use super::orchestrator::Orchestrator;
use super::scheduler::SchedulerLoop;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("missing handlers for job kinds: {0:?}")]
    MissingJobKinds(Vec<JobKind>),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// # Example
/// ```ignore
/// let orchestrator = Orchestrator::builder(config)
///     .with_default_handlers()?
///     .expect_job_kinds(&JobKind::ALL)
///     .build()?;
/// ```
pub struct OrchestratorBuilder {
    config: OrchestratorConfig,
    registry: HandlerRegistry,
    expected: Option<Vec<JobKind>>,
    persistence: Option<Arc<dyn TaskPersistence>>,
    runner: Option<Arc<dyn ProcessRunner>>,
    clock: Option<Arc<dyn Clock>>,
    event_capacity: usize,
}

impl OrchestratorBuilder {
    pub fn new(config: OrchestratorConfig) -> Self {
        Self {
            config,
            registry: HandlerRegistry::new(),
            expected: None,
            persistence: None,
            runner: None,
            clock: None,
            event_capacity: EventChannel::DEFAULT_CAPACITY,
        }
    }

    pub fn register<P: JobPayload, H: Handler<P> + 'static>(
        mut self,
        handler: H,
    ) -> Result<Self, RegistryError> {
        self.registry.register::<P, H>(handler)?;
        Ok(self)
    }

    /// Register the pipeline handlers for every job kind.
    pub fn with_default_handlers(mut self) -> Result<Self, RegistryError> {
        handlers::register_defaults(&mut self.registry)?;
        Ok(self)
    }

    pub fn expect_job_kinds(mut self, kinds: &[JobKind]) -> Self {
        self.expected = Some(kinds.to_vec());
        self
    }

    /// Defaults to a JSON file at `store.path`.
    pub fn persistence(mut self, persistence: Arc<dyn TaskPersistence>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    /// Defaults to spawning real processes.
    pub fn process_runner(mut self, runner: Arc<dyn ProcessRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    pub fn build(self) -> Result<Orchestrator, BuildError> {
        self.config
            .validate()
            .map_err(|e| BuildError::InvalidConfig(e.to_string()))?;

        if let Some(expected) = &self.expected {
            let missing: Vec<JobKind> = expected
                .iter()
                .copied()
                .filter(|kind| !self.registry.contains(*kind))
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingJobKinds(missing));
            }
        }

        let config = self.config;
        let persistence: Arc<dyn TaskPersistence> = match self.persistence {
            Some(persistence) => persistence,
            None => Arc::new(JsonFileTaskPersistence::new(&config.store.path)),
        };
        let runner: Arc<dyn ProcessRunner> = match (self.runner, &config.handlers.working_dir) {
            (Some(runner), _) => runner,
            (None, Some(dir)) => Arc::new(TokioProcessRunner::with_working_dir(dir)),
            (None, None) => Arc::new(TokioProcessRunner::new()),
        };
        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock),
        };

        let store = Arc::new(TaskStore::new(
            persistence,
            clock,
            EventChannel::new(self.event_capacity),
        ));
        let settings = Arc::new(config.handlers.clone());

        let mut executor = JobExecutor::new(
            Arc::clone(&store),
            Arc::new(self.registry),
            runner,
            Arc::clone(&settings),
        );
        if config.dependencies.enabled {
            executor = executor.with_dependencies(Arc::new(DependencyScheduler::new(
                Arc::clone(&store),
                &config.dependencies,
                settings.data_root.clone(),
            )));
        }

        let scheduler = Arc::new(SchedulerLoop::new(
            Arc::clone(&store),
            Arc::new(executor),
            &config.scheduler,
        ));

        Ok(Orchestrator::from_parts(config, store, scheduler))
    }
}
