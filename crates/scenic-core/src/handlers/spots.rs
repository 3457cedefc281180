//! SEARCH_CITY_SPOTS and SEARCH_NEARBY_SPOTS.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{clear_output, path_arg, path_component, require_file};
use crate::domain::{JobError, JobKind};
use crate::typed::{Handler, JobContext, JobPayload};

pub const DEFAULT_RADIUS_METERS: u32 = 3000;

/// `<root>/<province>/<city>/spots.json`
pub fn spots_file(data_root: &Path, province: &str, city: &str) -> PathBuf {
    data_root.join(province).join(city).join("spots.json")
}

/// Number of spots in a collected spots file.
///
/// Accepts a bare array or an object with a `spots` array.
fn count_spots(contents: &str) -> usize {
    match serde_json::from_str::<serde_json::Value>(contents) {
        Ok(serde_json::Value::Array(items)) => items.len(),
        Ok(serde_json::Value::Object(map)) => map
            .get("spots")
            .and_then(|v| v.as_array())
            .map_or(0, |a| a.len()),
        _ => 0,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCitySpots {
    pub province: String,
    pub city: String,
}

impl JobPayload for SearchCitySpots {
    const KIND: JobKind = JobKind::SearchCitySpots;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitySpotsResult {
    pub province: String,
    pub city: String,
    pub spots_file: PathBuf,
    pub spot_count: usize,
}

pub struct SearchCitySpotsHandler;

#[async_trait]
impl Handler<SearchCitySpots> for SearchCitySpotsHandler {
    type Output = CitySpotsResult;

    async fn handle(
        &self,
        payload: SearchCitySpots,
        ctx: &JobContext,
    ) -> Result<CitySpotsResult, JobError> {
        let province = path_component("province", &payload.province)?;
        let city = path_component("city", &payload.city)?;
        let output = spots_file(ctx.data_root(), province, city);
        if let Some(dir) = output.parent() {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                JobError::execution(format!("cannot create {}: {e}", dir.display()))
            })?;
        }
        clear_output(&output).await?;

        ctx.progress(10);
        ctx.run_command(
            JobKind::SearchCitySpots,
            vec![
                "--province".to_string(),
                province.to_string(),
                "--city".to_string(),
                city.to_string(),
                "--output".to_string(),
                path_arg(&output),
            ],
        )
        .await?;
        ctx.progress(90);

        require_file(&output).await?;
        let contents = tokio::fs::read_to_string(&output)
            .await
            .map_err(|e| JobError::execution(format!("cannot read {}: {e}", output.display())))?;
        let spot_count = count_spots(&contents);
        ctx.info(format!("{spot_count} spots collected for {province}/{city}"));

        Ok(CitySpotsResult {
            province: province.to_string(),
            city: city.to_string(),
            spots_file: output,
            spot_count,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchNearbySpots {
    pub province: String,
    pub city: String,
    /// Name of the anchor spot; also the output file stem.
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius_meters: Option<u32>,
}

impl JobPayload for SearchNearbySpots {
    const KIND: JobKind = JobKind::SearchNearbySpots;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbySpotsResult {
    pub name: String,
    pub nearby_file: PathBuf,
}

pub struct SearchNearbySpotsHandler;

#[async_trait]
impl Handler<SearchNearbySpots> for SearchNearbySpotsHandler {
    type Output = NearbySpotsResult;

    async fn handle(
        &self,
        payload: SearchNearbySpots,
        ctx: &JobContext,
    ) -> Result<NearbySpotsResult, JobError> {
        let province = path_component("province", &payload.province)?;
        let city = path_component("city", &payload.city)?;
        let name = path_component("name", &payload.name)?;
        if !(-90.0..=90.0).contains(&payload.latitude)
            || !(-180.0..=180.0).contains(&payload.longitude)
        {
            return Err(JobError::validation(format!(
                "coordinates out of range: {}, {}",
                payload.latitude, payload.longitude
            )));
        }
        let radius = payload.radius_meters.unwrap_or(DEFAULT_RADIUS_METERS);

        let nearby_dir = ctx.data_root().join(province).join(city).join("nearby");
        tokio::fs::create_dir_all(&nearby_dir).await.map_err(|e| {
            JobError::execution(format!("cannot create {}: {e}", nearby_dir.display()))
        })?;
        let output = nearby_dir.join(format!("{name}.json"));
        clear_output(&output).await?;

        ctx.progress(10);
        ctx.run_command(
            JobKind::SearchNearbySpots,
            vec![
                "--province".to_string(),
                province.to_string(),
                "--city".to_string(),
                city.to_string(),
                "--name".to_string(),
                name.to_string(),
                "--lat".to_string(),
                payload.latitude.to_string(),
                "--lng".to_string(),
                payload.longitude.to_string(),
                "--radius".to_string(),
                radius.to_string(),
                "--output".to_string(),
                path_arg(&output),
            ],
        )
        .await?;
        ctx.progress(90);

        require_file(&output).await?;
        Ok(NearbySpotsResult {
            name: name.to_string(),
            nearby_file: output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;
    use crate::handlers::test_support::{ScriptedRunner, context, flag_value};
    use crate::ports::ProcessOutput;
    use serde_json::json;

    fn writes_output(contents: &'static str) -> std::sync::Arc<ScriptedRunner> {
        ScriptedRunner::new(move |_, args| {
            std::fs::write(flag_value(args, "--output").unwrap(), contents)?;
            Ok(ProcessOutput::default())
        })
    }

    #[test]
    fn counts_array_or_wrapped_spots() {
        assert_eq!(count_spots(r#"[{"name":"a"},{"name":"b"}]"#), 2);
        assert_eq!(count_spots(r#"{"spots":[{"name":"a"}]}"#), 1);
        assert_eq!(count_spots("not json"), 0);
    }

    #[tokio::test]
    async fn city_spots_reports_file_and_count() {
        let root = tempfile::tempdir().unwrap();
        let data = json!({"province": "yunnan", "city": "dali"});
        let (ctx, _store) = context(
            JobKind::SearchCitySpots,
            data,
            root.path(),
            writes_output(r#"[1, 2, 3]"#),
        );

        let result = SearchCitySpotsHandler
            .handle(
                SearchCitySpots {
                    province: "yunnan".into(),
                    city: "dali".into(),
                },
                &ctx,
            )
            .await
            .unwrap();

        assert_eq!(result.spots_file, spots_file(root.path(), "yunnan", "dali"));
        assert_eq!(result.spot_count, 3);
        let encoded = serde_json::to_value(&result).unwrap();
        assert_eq!(encoded["spotCount"], 3);
        assert!(encoded.get("spotsFile").is_some());
    }

    #[tokio::test]
    async fn city_spots_without_file_is_output_missing() {
        let root = tempfile::tempdir().unwrap();
        let (ctx, _store) = context(
            JobKind::SearchCitySpots,
            json!({}),
            root.path(),
            ScriptedRunner::ok(),
        );
        let err = SearchCitySpotsHandler
            .handle(
                SearchCitySpots {
                    province: "yunnan".into(),
                    city: "dali".into(),
                },
                &ctx,
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutputMissing);
    }

    #[tokio::test]
    async fn city_spots_ignores_file_from_earlier_attempt() {
        let root = tempfile::tempdir().unwrap();
        let stale = spots_file(root.path(), "yunnan", "dali");
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, r#"[{"name":"old"}]"#).unwrap();

        let (ctx, _store) = context(
            JobKind::SearchCitySpots,
            json!({}),
            root.path(),
            ScriptedRunner::ok(),
        );
        let err = SearchCitySpotsHandler
            .handle(
                SearchCitySpots {
                    province: "yunnan".into(),
                    city: "dali".into(),
                },
                &ctx,
            )
            .await
            .unwrap_err();
        assert_eq!(err, JobError::OutputMissing(stale.clone()));
        assert!(!stale.exists());
    }

    #[tokio::test]
    async fn nearby_uses_default_radius() {
        let root = tempfile::tempdir().unwrap();
        let runner = writes_output("[]");
        let (ctx, _store) = context(
            JobKind::SearchNearbySpots,
            json!({}),
            root.path(),
            runner.clone(),
        );
        let payload: SearchNearbySpots = serde_json::from_value(json!({
            "province": "yunnan",
            "city": "dali",
            "name": "erhai",
            "latitude": 25.6,
            "longitude": 100.2
        }))
        .unwrap();

        let result = SearchNearbySpotsHandler.handle(payload, &ctx).await.unwrap();
        assert_eq!(
            result.nearby_file,
            root.path().join("yunnan/dali/nearby/erhai.json")
        );
        let calls = runner.calls();
        assert_eq!(flag_value(&calls[0].1, "--radius"), Some("3000"));
    }

    #[tokio::test]
    async fn nearby_rejects_bad_coordinates() {
        let root = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::ok();
        let (ctx, _store) = context(JobKind::SearchNearbySpots, json!({}), root.path(), runner.clone());
        let payload = SearchNearbySpots {
            province: "yunnan".into(),
            city: "dali".into(),
            name: "erhai".into(),
            latitude: 125.0,
            longitude: 100.2,
            radius_meters: Some(500),
        };
        let err = SearchNearbySpotsHandler.handle(payload, &ctx).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(runner.calls().is_empty());
    }
}
