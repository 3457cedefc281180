//! TaskPersistence port: durable storage for the task collection.
//!
//! The store always writes the full collection. Implementations must make a
//! save all-or-nothing so a crash never leaves a half-written snapshot.

use std::path::PathBuf;

use crate::domain::Task;

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed task file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("persistence unavailable: {0}")]
    Unavailable(String),
}

impl PersistenceError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// TaskPersistence loads and saves snapshots of every task.
///
/// Calls happen while the store lock is held, so implementations are
/// synchronous and must not block on the async runtime.
pub trait TaskPersistence: Send + Sync {
    /// Read the persisted snapshot. A store that was never written is empty.
    fn load(&self) -> Result<Vec<Task>, PersistenceError>;

    /// Replace the persisted snapshot with `tasks`.
    fn save(&self, tasks: &[Task]) -> Result<(), PersistenceError>;
}
