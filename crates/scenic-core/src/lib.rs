//! scenic-core
//!
//! Background job orchestrator for the scenic-area data pipeline.
//!
//! # Modules
//! - **domain**: ids, job kinds, status state machine, task record, events, job errors
//! - **ports**: Clock, IdGenerator, TaskPersistence, ProcessRunner
//! - **impls**: JSON-file and in-memory persistence, tokio process runner
//! - **store**: the task store
//! - **typed**: typed handler API and registry
//! - **handlers**: handlers for the pipeline job kinds
//! - **app**: executor, scheduler loop, dependency scheduler, orchestrator

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod handlers;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod store;
pub mod typed;

pub use app::{BuildError, Orchestrator, OrchestratorBuilder};
pub use config::OrchestratorConfig;
pub use domain::{AddOptions, JobKind, Task, TaskEvent, TaskId, TaskStatus, TaskType};
pub use error::{Result, ScenicError};
pub use store::{StoreError, TaskPatch, TaskStore};
