// src/main.rs

mod cli;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use scenic_core::config::load_or_default;
use scenic_core::{AddOptions, JobKind, Orchestrator, Task};

use crate::cli::{CliArgs, Command};
use crate::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.log_level)?;

    let config = load_or_default(&args.config)
        .with_context(|| format!("loading config from {}", args.config.display()))?;
    let orchestrator = Orchestrator::builder(config)
        .with_default_handlers()?
        .expect_job_kinds(&JobKind::ALL)
        .build()?;
    let restored = orchestrator.init().context("loading task store")?;
    info!(restored, "task store loaded");

    match args.command {
        Command::Run { follow } => run(&orchestrator, follow).await?,
        Command::Add {
            task_type,
            data,
            description,
        } => {
            if JobKind::parse(&task_type).is_none() {
                warn!(task_type = %task_type, "unknown job type; the task will fail when dispatched");
            }
            let data: Value = serde_json::from_str(&data).context("--data is not valid JSON")?;
            let options = match description {
                Some(text) => AddOptions::default().with_description(text),
                None => AddOptions::default(),
            };
            let id = orchestrator.add_task(task_type, data, options);
            println!("{id}");
        }
        Command::List { status } => {
            let tasks = match status {
                Some(status) => orchestrator.get_tasks_by_status(status),
                None => orchestrator.get_all_tasks(),
            };
            for task in &tasks {
                println!("{}", summary_line(task));
            }
        }
        Command::Show { id } => {
            let task = orchestrator
                .get_task(id)
                .with_context(|| format!("no task with id {id}"))?;
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        Command::Retry { id } => {
            let task = orchestrator.retry_task(id)?;
            println!("{} -> {}", task.id, task.status);
        }
        Command::Clear { include_failed } => {
            let removed = if include_failed {
                orchestrator.clear_completed_and_failed_tasks()
            } else {
                orchestrator.clear_completed_tasks()
            };
            println!("removed {removed} task(s)");
        }
        Command::Counts => {
            println!("{}", serde_json::to_string_pretty(&orchestrator.counts())?);
        }
    }

    Ok(())
}

/// Start the scheduler and block until Ctrl-C, then shut down cleanly.
async fn run(orchestrator: &Orchestrator, follow: bool) -> Result<()> {
    let printer = follow.then(|| {
        let mut events = orchestrator.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => match serde_json::to_string(&event) {
                        Ok(line) => println!("{line}"),
                        Err(e) => warn!(error = %e, "failed to encode event"),
                    },
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "event printer fell behind");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    });

    orchestrator.start();
    info!(counts = ?orchestrator.counts(), "orchestrator running; press Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("waiting for Ctrl-C")?;
    info!("shutting down");

    orchestrator.shutdown().await?;
    if let Some(printer) = printer {
        printer.abort();
    }
    Ok(())
}

fn summary_line(task: &Task) -> String {
    let mut line = format!(
        "{}  {:<9}  {:>3}%  {}",
        task.id, task.status, task.progress, task.task_type
    );
    if let Some(description) = &task.description {
        line.push_str("  ");
        line.push_str(description);
    }
    if let Some(error) = &task.error {
        line.push_str("  error: ");
        line.push_str(error);
    }
    line
}
