//! Per-job context handed to handlers.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::config::HandlerConfig;
use crate::domain::{JobError, JobKind, LogLevel, Task, TaskId};
use crate::ports::{ProcessOutput, ProcessRunner};
use crate::store::TaskStore;

/// Stderr lines copied into the task log per process run.
pub const MAX_STDERR_LINES: usize = 20;

/// JobContext gives a handler its task, a way to report progress and logs,
/// and the process capability.
#[derive(Clone)]
pub struct JobContext {
    task: Task,
    store: Arc<TaskStore>,
    runner: Arc<dyn ProcessRunner>,
    settings: Arc<HandlerConfig>,
}

impl JobContext {
    pub fn new(
        task: Task,
        store: Arc<TaskStore>,
        runner: Arc<dyn ProcessRunner>,
        settings: Arc<HandlerConfig>,
    ) -> Self {
        Self {
            task,
            store,
            runner,
            settings,
        }
    }

    /// The task as it was when dispatched.
    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn task_id(&self) -> TaskId {
        self.task.id
    }

    pub fn settings(&self) -> &HandlerConfig {
        &self.settings
    }

    pub fn data_root(&self) -> &Path {
        &self.settings.data_root
    }

    pub fn progress(&self, progress: u8) {
        if let Err(err) = self.store.set_progress(self.task.id, progress) {
            debug!(task_id = %self.task.id, error = %err, "progress update dropped");
        }
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        if let Err(err) = self.store.append_log(self.task.id, level, message) {
            debug!(task_id = %self.task.id, error = %err, "log entry dropped");
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    /// Run the program configured for `kind` with `args` appended.
    ///
    /// Stderr lines become warn entries. A non-zero exit is an execution error.
    pub async fn run_command(
        &self,
        kind: JobKind,
        args: Vec<String>,
    ) -> Result<ProcessOutput, JobError> {
        let command = self.settings.command_for(kind);
        let mut full_args = command.args.clone();
        full_args.extend(args);

        self.info(format!("running {} {}", command.program, full_args.join(" ")));
        let output = self
            .runner
            .run(&command.program, &full_args)
            .await
            .map_err(|e| JobError::execution(format!("failed to start {}: {e}", command.program)))?;

        let mut stderr_lines = output.stderr.lines().filter(|l| !l.trim().is_empty());
        for line in stderr_lines.by_ref().take(MAX_STDERR_LINES) {
            self.warn(line.trim_end());
        }
        let skipped = stderr_lines.count();
        if skipped > 0 {
            debug!(task_id = %self.task.id, skipped, "stderr lines not copied to task log");
        }

        if !output.success() {
            return Err(JobError::execution(format!(
                "{} exited with code {}",
                command.program, output.exit_code
            )));
        }
        Ok(output)
    }
}
