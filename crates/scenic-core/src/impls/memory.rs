//! In-memory task persistence for tests and ephemeral runs.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::domain::Task;
use crate::ports::{PersistenceError, TaskPersistence};

/// InMemoryTaskPersistence keeps the last saved snapshot.
///
/// Saves can be made to fail on demand to exercise the store's
/// "log and keep going" path.
#[derive(Debug, Default)]
pub struct InMemoryTaskPersistence {
    snapshot: Mutex<Vec<Task>>,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

impl InMemoryTaskPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing snapshot, as if it had been written earlier.
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            snapshot: Mutex::new(tasks),
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> Vec<Task> {
        self.snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl TaskPersistence for InMemoryTaskPersistence {
    fn load(&self) -> Result<Vec<Task>, PersistenceError> {
        Ok(self.snapshot())
    }

    fn save(&self, tasks: &[Task]) -> Result<(), PersistenceError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable(
                "saves disabled for this store".to_string(),
            ));
        }
        *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner) = tasks.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
