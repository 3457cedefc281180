// src/cli.rs

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use scenic_core::{TaskId, TaskStatus};

/// Operator CLI for the scenic-area job orchestrator.
#[derive(Debug, Parser)]
#[command(name = "scenic", version, about)]
pub struct CliArgs {
    /// Path to the TOML config file. Missing file means defaults.
    #[arg(long, short, global = true, default_value = "scenic.toml")]
    pub config: PathBuf,

    /// Log level; overrides `SCENIC_LOG`.
    #[arg(long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the scheduler until Ctrl-C.
    Run {
        /// Print every task event to stdout as a JSON line.
        #[arg(long)]
        follow: bool,
    },
    /// Queue a new task.
    Add {
        /// Job type, e.g. ORGANIZE_REGION_DATA.
        task_type: String,
        /// Payload as a JSON document.
        #[arg(long, default_value = "{}")]
        data: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// List tasks, newest first.
    List {
        #[arg(long)]
        status: Option<TaskStatus>,
    },
    /// Print one task as JSON.
    Show { id: TaskId },
    /// Move a failed task back to pending.
    Retry { id: TaskId },
    /// Remove completed tasks.
    Clear {
        /// Also remove failed tasks.
        #[arg(long)]
        include_failed: bool,
    },
    /// Print task counts per status.
    Counts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}
