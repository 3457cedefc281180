//! ProcessRunner port: invoke an external data-collection program.

use async_trait::async_trait;

/// What a finished process left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `-1` when the process was killed by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// ProcessRunner runs a command to completion.
///
/// Spawn failures are reported as `Err`; a process that ran and exited with a
/// non-zero code is an `Ok` output.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, command: &str, args: &[String]) -> std::io::Result<ProcessOutput>;
}
