//! PROCESS_NARRATION: registered so the kind is known, but not implemented.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{JobError, JobKind};
use crate::typed::{Handler, JobContext, JobPayload};

/// Any payload is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessNarration(pub serde_json::Value);

impl JobPayload for ProcessNarration {
    const KIND: JobKind = JobKind::ProcessNarration;
}

pub struct NarrationHandler;

#[async_trait]
impl Handler<ProcessNarration> for NarrationHandler {
    type Output = ();

    async fn handle(&self, _payload: ProcessNarration, _ctx: &JobContext) -> Result<(), JobError> {
        Err(JobError::validation("PROCESS_NARRATION is not implemented"))
    }
}
