//! Typed job payloads.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::JobKind;

/// JobPayload binds a payload type to the job kind it is submitted as.
pub trait JobPayload: Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: JobKind;
}
