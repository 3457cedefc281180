//! HandlerRegistry: job kind to handler.

use std::collections::HashMap;
use std::sync::Arc;

use super::handler::{DynHandler, Handler, TypedHandler};
use super::payload::JobPayload;
use crate::domain::{JobError, JobKind, TaskType};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("a handler for {0} is already registered")]
    AlreadyRegistered(JobKind),
}

#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<JobKind, Arc<dyn DynHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<P: JobPayload, H: Handler<P> + 'static>(
        &mut self,
        handler: H,
    ) -> Result<(), RegistryError> {
        if self.handlers.contains_key(&P::KIND) {
            return Err(RegistryError::AlreadyRegistered(P::KIND));
        }
        self.handlers
            .insert(P::KIND, Arc::new(TypedHandler::<P, H>::new(handler)));
        Ok(())
    }

    pub fn get(&self, kind: JobKind) -> Option<Arc<dyn DynHandler>> {
        self.handlers.get(&kind).cloned()
    }

    pub fn contains(&self, kind: JobKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Look up the handler for a stored task type.
    ///
    /// Unknown or unregistered types are validation errors.
    pub fn resolve(&self, task_type: &TaskType) -> Result<Arc<dyn DynHandler>, JobError> {
        let kind = task_type
            .kind()
            .ok_or_else(|| JobError::validation(format!("unknown job type: {task_type}")))?;
        self.get(kind)
            .ok_or_else(|| JobError::validation(format!("no handler registered for {kind}")))
    }

    /// Registered kinds, sorted.
    pub fn registered_kinds(&self) -> Vec<JobKind> {
        let mut kinds: Vec<_> = self.handlers.keys().copied().collect();
        kinds.sort();
        kinds
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
