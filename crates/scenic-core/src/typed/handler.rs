//! Handler traits.
//!
//! - `Handler<P>`: typed, written per job kind
//! - `DynHandler`: erased, stored in the registry
//! - `TypedHandler<P, H>`: adapter that decodes `task.data` into `P`

use std::marker::PhantomData;

use async_trait::async_trait;
use serde::Serialize;

use super::context::JobContext;
use super::payload::JobPayload;
use crate::domain::{JobError, JobKind};

#[async_trait]
pub trait Handler<P: JobPayload>: Send + Sync {
    type Output: Serialize + Send;

    async fn handle(&self, payload: P, ctx: &JobContext) -> Result<Self::Output, JobError>;
}

#[async_trait]
pub trait DynHandler: Send + Sync {
    /// Decode the task payload, run the handler and encode its result.
    async fn handle_dyn(&self, ctx: &JobContext) -> Result<serde_json::Value, JobError>;

    fn kind(&self) -> JobKind;
}

pub struct TypedHandler<P: JobPayload, H: Handler<P>> {
    handler: H,
    _marker: PhantomData<fn() -> P>,
}

impl<P: JobPayload, H: Handler<P>> TypedHandler<P, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<P: JobPayload, H: Handler<P>> DynHandler for TypedHandler<P, H> {
    async fn handle_dyn(&self, ctx: &JobContext) -> Result<serde_json::Value, JobError> {
        let payload: P = serde_json::from_value(ctx.task().data.clone())
            .map_err(|e| JobError::validation(format!("invalid {} payload: {e}", P::KIND)))?;
        let output = self.handler.handle(payload, ctx).await?;
        serde_json::to_value(output)
            .map_err(|e| JobError::execution(format!("unencodable {} result: {e}", P::KIND)))
    }

    fn kind(&self) -> JobKind {
        P::KIND
    }
}
