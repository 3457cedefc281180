// tests/crash_recovery.rs

mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::path::Path;

use serde_json::json;

use scenic_core::domain::LogLevel;
use scenic_core::{AddOptions, JobKind, Orchestrator, OrchestratorConfig, TaskPatch, TaskStatus};

type TestResult = Result<(), Box<dyn Error>>;

fn orchestrator(path: &Path) -> Result<Orchestrator, Box<dyn Error>> {
    let mut config = OrchestratorConfig::default();
    config.store.path = path.to_path_buf();
    Ok(Orchestrator::builder(config).with_default_handlers()?.build()?)
}

#[tokio::test]
async fn running_tasks_come_back_pending() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("state/tasks.json");

    let before = {
        let first = orchestrator(&path)?;
        assert_eq!(first.init()?, 0);
        let store = first.store();

        let parent = first.add_task(
            JobKind::OrganizeRegionData,
            json!({"province": "yunnan"}),
            AddOptions::default().with_description("yunnan data"),
        );
        let running = first.add_task(
            JobKind::SearchCitySpots,
            json!({"province": "yunnan", "city": "dali"}),
            AddOptions::follow_up_of(parent),
        );
        let failed = first.add_task(JobKind::GenerateSummary, json!({}), AddOptions::default());

        store.mark_running(parent)?;
        store.complete(parent, json!({"outputDir": "data/regions/yunnan"}))?;
        store.mark_running(running)?;
        store.update(running, TaskPatch::new().progress(40))?;
        store.append_log(running, LogLevel::Warn, "slow upstream")?;
        store.mark_running(failed)?;
        store.fail(failed, "boom")?;

        // Simulated crash: no shutdown, the last write-through is all we have.
        first.get_all_tasks()
    };

    let second = orchestrator(&path)?;
    assert_eq!(second.init()?, 3);

    for old in before {
        let new = second.get_task(old.id).expect("task survives restart");
        let mut expected = old.clone();
        if old.status == TaskStatus::Running {
            expected.status = TaskStatus::Pending;
        }
        assert_eq!(new, expected);
    }

    let counts = second.counts();
    assert_eq!(counts.running, 0);
    assert_eq!(counts.pending, 1);
    assert_eq!(counts.completed, 1);
    assert_eq!(counts.failed, 1);
    Ok(())
}

#[tokio::test]
async fn clearing_settled_tasks_is_persisted() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("tasks.json");

    {
        let first = orchestrator(&path)?;
        first.init()?;
        let store = first.store();
        let done = first.add_task(JobKind::CreateCityStructure, json!({}), AddOptions::default());
        let failed = first.add_task(JobKind::CreateCityStructure, json!({}), AddOptions::default());
        first.add_task(JobKind::CreateCityStructure, json!({}), AddOptions::default());
        store.mark_running(done)?;
        store.complete(done, json!({}))?;
        store.mark_running(failed)?;
        store.fail(failed, "bad payload")?;

        assert_eq!(first.clear_completed_and_failed_tasks(), 2);
        first.shutdown().await?;
    }

    let second = orchestrator(&path)?;
    assert_eq!(second.init()?, 1);
    assert_eq!(second.counts().pending, 1);

    let on_disk: Vec<serde_json::Value> =
        serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    assert_eq!(on_disk.len(), 1);
    assert_eq!(on_disk[0]["status"], "pending");
    assert_eq!(on_disk[0]["type"], "CREATE_CITY_STRUCTURE");
    Ok(())
}

#[test]
fn default_backend_writes_through_to_the_store_path() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("tasks.json");
    let orchestrator = orchestrator(&path)?;
    orchestrator.add_task("ANY", json!(null), AddOptions::default());
    assert!(path.exists());
    Ok(())
}
