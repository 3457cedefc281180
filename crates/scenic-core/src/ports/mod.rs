//! Ports: the seams the orchestrator is wired through.
//!
//! - **Clock**: current time
//! - **IdGenerator**: task ids
//! - **TaskPersistence**: durable task snapshots
//! - **ProcessRunner**: external programs invoked by handlers

pub mod clock;
pub mod id_generator;
pub mod process;
pub mod task_store;

pub use clock::{Clock, FixedClock, SystemClock, TokioClock};
pub use id_generator::{IdGenerator, UlidGenerator};
pub use process::{ProcessOutput, ProcessRunner};
pub use task_store::{PersistenceError, TaskPersistence};
