//! DependencyScheduler: create follow-up tasks when producer jobs complete.
//!
//! - ORGANIZE_REGION_DATA → one SEARCH_CITY_SPOTS per sub-region directory
//! - SEARCH_CITY_SPOTS → one GENERATE_SUMMARY for the same city
//!
//! Follow-ups of one parent are staggered: child `i` is added at
//! `completion + i * stagger`.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{error, info, warn};

use crate::config::DependencyConfig;
use crate::domain::{AddOptions, JobKind, LogLevel, Task, TaskId};
use crate::store::TaskStore;

/// A task waiting to be created.
#[derive(Debug, Clone, PartialEq)]
struct FollowUp {
    kind: JobKind,
    data: Value,
    description: String,
}

/// What a completed task leads to, before any filesystem access.
enum Plan {
    /// One spots task per directory under `output_dir`.
    SubRegions { province: String, output_dir: PathBuf },
    Fixed(Vec<FollowUp>),
}

pub struct DependencyScheduler {
    store: Arc<TaskStore>,
    data_root: PathBuf,
    stagger: Duration,
    enabled: bool,
}

impl DependencyScheduler {
    pub fn new(store: Arc<TaskStore>, config: &DependencyConfig, data_root: impl Into<PathBuf>) -> Self {
        Self {
            store,
            data_root: data_root.into(),
            stagger: config.stagger(),
            enabled: config.enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// React to a completed task.
    ///
    /// Returns the handle of the follow-up creation, resolving to the ids of
    /// the created tasks, or `None` when the task's kind has no follow-ups.
    pub fn on_completed(&self, task: &Task) -> Option<JoinHandle<Vec<TaskId>>> {
        if !self.enabled {
            return None;
        }
        let start = Instant::now();

        let plan = match task.task_type.kind()? {
            JobKind::OrganizeRegionData => {
                let province = string_field(task, "province")?;
                let output_dir = task
                    .result
                    .as_ref()
                    .and_then(|r| r.get("outputDir"))
                    .and_then(Value::as_str)
                    .map(PathBuf::from)
                    .unwrap_or_else(|| self.data_root.join(&province));
                Plan::SubRegions {
                    province,
                    output_dir,
                }
            }
            JobKind::SearchCitySpots => {
                let (province, city) = province_and_city(task)?;
                Plan::Fixed(vec![FollowUp {
                    kind: JobKind::GenerateSummary,
                    data: json!({"province": province, "city": city}),
                    description: format!("summary for {province}/{city}"),
                }])
            }
            _ => return None,
        };

        let store = Arc::clone(&self.store);
        let parent = task.id;
        let stagger = self.stagger;
        Some(tokio::spawn(async move {
            let follow_ups = match plan {
                Plan::Fixed(follow_ups) => follow_ups,
                Plan::SubRegions {
                    province,
                    output_dir,
                } => region_follow_ups(&store, parent, &province, &output_dir).await,
            };
            if follow_ups.is_empty() {
                return Vec::new();
            }

            let kind = follow_ups[0].kind;
            let message = format!("scheduling {} {} follow-up task(s)", follow_ups.len(), kind);
            if let Err(err) = store.append_log(parent, LogLevel::Info, message) {
                warn!(task_id = %parent, error = %err, "parent vanished before follow-ups");
            }
            info!(
                task_id = %parent,
                follow_ups = follow_ups.len(),
                follow_up_type = %kind,
                "scheduling follow-up tasks"
            );
            schedule(&store, parent, follow_ups, start, stagger).await
        }))
    }
}

async fn region_follow_ups(
    store: &TaskStore,
    parent: TaskId,
    province: &str,
    output_dir: &Path,
) -> Vec<FollowUp> {
    let cities = match sub_directories(output_dir).await {
        Ok(cities) => cities,
        Err(err) => {
            error!(
                task_id = %parent,
                dir = %output_dir.display(),
                error = %err,
                "cannot enumerate sub-regions"
            );
            let message = format!(
                "cannot enumerate sub-regions in {}: {err}",
                output_dir.display()
            );
            let _ = store.append_log(parent, LogLevel::Error, message);
            return Vec::new();
        }
    };
    if cities.is_empty() {
        let message = format!("no sub-regions found in {}", output_dir.display());
        let _ = store.append_log(parent, LogLevel::Warn, message);
    }

    cities
        .into_iter()
        .map(|city| FollowUp {
            kind: JobKind::SearchCitySpots,
            data: json!({"province": province, "city": city}),
            description: format!("spots for {province}/{city}"),
        })
        .collect()
}

async fn schedule(
    store: &TaskStore,
    parent: TaskId,
    follow_ups: Vec<FollowUp>,
    start: Instant,
    stagger: Duration,
) -> Vec<TaskId> {
    let mut created = Vec::with_capacity(follow_ups.len());
    for (i, follow_up) in follow_ups.into_iter().enumerate() {
        sleep_until(start + stagger * i as u32).await;
        let options = AddOptions::follow_up_of(parent).with_description(follow_up.description);
        let id = store.add(follow_up.kind, follow_up.data, options);
        info!(task_id = %id, parent_id = %parent, task_type = %follow_up.kind, "follow-up task added");
        created.push(id);
    }
    created
}

/// Names of the directories directly under `dir`, sorted.
async fn sub_directories(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

fn string_field(task: &Task, key: &str) -> Option<String> {
    let value = task
        .data
        .get(key)
        .or_else(|| task.result.as_ref().and_then(|r| r.get(key)))
        .and_then(Value::as_str);
    if value.is_none() {
        warn!(task_id = %task.id, field = key, "completed task lacks field, no follow-ups");
    }
    value.map(str::to_string)
}

fn province_and_city(task: &Task) -> Option<(String, String)> {
    Some((string_field(task, "province")?, string_field(task, "city")?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventChannel;
    use crate::impls::InMemoryTaskPersistence;
    use crate::ports::TokioClock;
    use crate::domain::TaskStatus;
    use chrono::{TimeZone, Utc};

    fn store() -> Arc<TaskStore> {
        Arc::new(TaskStore::new(
            Arc::new(InMemoryTaskPersistence::new()),
            Arc::new(TokioClock::anchored_at(
                Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            )),
            EventChannel::default(),
        ))
    }

    fn scheduler(store: &Arc<TaskStore>, root: &Path) -> DependencyScheduler {
        DependencyScheduler::new(store.clone(), &DependencyConfig::default(), root)
    }

    fn completed(store: &TaskStore, kind: JobKind, data: Value, result: Value) -> Task {
        let id = store.add(kind, data, AddOptions::default());
        store.mark_running(id).unwrap();
        store.complete(id, result).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn region_children_are_staggered_per_sub_region() {
        let root = tempfile::tempdir().unwrap();
        let region = root.path().join("yunnan");
        for city in ["lijiang", "dali", "kunming"] {
            std::fs::create_dir_all(region.join(city)).unwrap();
        }
        std::fs::write(region.join("README.txt"), "not a city").unwrap();

        let store = store();
        let parent = completed(
            &store,
            JobKind::OrganizeRegionData,
            json!({"province": "yunnan"}),
            json!({"province": "yunnan", "outputDir": region}),
        );

        let ids = scheduler(&store, root.path())
            .on_completed(&parent)
            .unwrap()
            .await
            .unwrap();
        assert_eq!(ids.len(), 3);

        let children: Vec<Task> = ids.iter().map(|id| store.get(*id).unwrap()).collect();
        let cities: Vec<_> = children.iter().map(|t| t.data["city"].clone()).collect();
        assert_eq!(cities, vec![json!("dali"), json!("kunming"), json!("lijiang")]);

        for (i, child) in children.iter().enumerate() {
            assert_eq!(child.task_type.kind(), Some(JobKind::SearchCitySpots));
            assert_eq!(child.status, TaskStatus::Pending);
            assert_eq!(child.depends_on, Some(parent.id));
            let offset = child.created_at - parent.updated_at;
            assert_eq!(offset.num_milliseconds(), 2000 * i as i64);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn spots_completion_adds_one_summary_immediately() {
        let root = tempfile::tempdir().unwrap();
        let store = store();
        let parent = completed(
            &store,
            JobKind::SearchCitySpots,
            json!({"province": "yunnan", "city": "dali"}),
            json!({"spotCount": 4}),
        );

        let ids = scheduler(&store, root.path())
            .on_completed(&parent)
            .unwrap()
            .await
            .unwrap();
        let child = store.get(ids[0]).unwrap();
        assert_eq!(child.task_type.kind(), Some(JobKind::GenerateSummary));
        assert_eq!(child.data, json!({"province": "yunnan", "city": "dali"}));
        assert_eq!(child.depends_on, Some(parent.id));
        assert_eq!(child.created_at, parent.updated_at);
    }

    #[tokio::test]
    async fn missing_output_dir_logs_error_on_parent() {
        let root = tempfile::tempdir().unwrap();
        let store = store();
        let parent = completed(
            &store,
            JobKind::OrganizeRegionData,
            json!({"province": "gansu"}),
            json!({"province": "gansu", "outputDir": root.path().join("gansu")}),
        );

        let ids = scheduler(&store, root.path())
            .on_completed(&parent)
            .unwrap()
            .await
            .unwrap();
        assert!(ids.is_empty());
        let parent = store.get(parent.id).unwrap();
        assert_eq!(parent.status, TaskStatus::Completed);
        assert_eq!(parent.logs.last().unwrap().level, LogLevel::Error);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn empty_output_dir_logs_warning() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("gansu")).unwrap();
        let store = store();
        let parent = completed(
            &store,
            JobKind::OrganizeRegionData,
            json!({"province": "gansu"}),
            Value::Null,
        );

        let ids = scheduler(&store, root.path())
            .on_completed(&parent)
            .unwrap()
            .await
            .unwrap();
        assert!(ids.is_empty());
        let parent = store.get(parent.id).unwrap();
        assert_eq!(parent.logs.last().unwrap().level, LogLevel::Warn);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn disabled_or_leaf_kinds_schedule_nothing() {
        let root = tempfile::tempdir().unwrap();
        let store = store();
        let spots = completed(
            &store,
            JobKind::SearchCitySpots,
            json!({"province": "yunnan", "city": "dali"}),
            Value::Null,
        );
        let summary = completed(
            &store,
            JobKind::GenerateSummary,
            json!({"province": "yunnan", "city": "dali"}),
            Value::Null,
        );

        let disabled = DependencyScheduler::new(
            store.clone(),
            &DependencyConfig {
                enabled: false,
                ..DependencyConfig::default()
            },
            root.path(),
        );
        assert!(disabled.on_completed(&spots).is_none());
        assert!(scheduler(&store, root.path()).on_completed(&summary).is_none());
        assert_eq!(store.len(), 2);
    }
}
