//! Job errors and their classification.
//!
//! Every handler-level failure ends up as a `JobError`. The executor turns it
//! into the task's `error` string; it never travels further.

use std::path::PathBuf;

/// ErrorKind classifies why a job failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown job type or malformed payload. Retrying without changes is useless.
    Validation,
    /// The handler or the process it invoked failed.
    Execution,
    /// The process claimed success but the expected artifact is not there.
    OutputMissing,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("execution error: {0}")]
    Execution(String),

    #[error("expected output is missing: {}", .0.display())]
    OutputMissing(PathBuf),
}

impl JobError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            JobError::Validation(_) => ErrorKind::Validation,
            JobError::Execution(_) => ErrorKind::Execution,
            JobError::OutputMissing(_) => ErrorKind::OutputMissing,
        }
    }
}
