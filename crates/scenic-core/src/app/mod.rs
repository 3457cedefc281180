//! Application layer: scheduling, execution, follow-ups and wiring.

pub mod builder;
pub mod dependency;
pub mod executor;
pub mod orchestrator;
pub mod scheduler;

pub use builder::{BuildError, OrchestratorBuilder};
pub use dependency::DependencyScheduler;
pub use executor::JobExecutor;
pub use orchestrator::Orchestrator;
pub use scheduler::{SchedulerHandle, SchedulerLoop};
