//! GENERATE_SUMMARY: build a city's summary from its collected spots.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::spots::spots_file;
use super::{clear_output, path_arg, path_component, require_file};
use crate::domain::{JobError, JobKind};
use crate::typed::{Handler, JobContext, JobPayload};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateSummary {
    pub province: String,
    pub city: String,
}

impl JobPayload for GenerateSummary {
    const KIND: JobKind = JobKind::GenerateSummary;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResult {
    pub province: String,
    pub city: String,
    pub summary_file: PathBuf,
}

pub struct GenerateSummaryHandler;

#[async_trait]
impl Handler<GenerateSummary> for GenerateSummaryHandler {
    type Output = SummaryResult;

    async fn handle(
        &self,
        payload: GenerateSummary,
        ctx: &JobContext,
    ) -> Result<SummaryResult, JobError> {
        let province = path_component("province", &payload.province)?;
        let city = path_component("city", &payload.city)?;

        let input = spots_file(ctx.data_root(), province, city);
        if require_file(&input).await.is_err() {
            return Err(JobError::validation(format!(
                "no spots collected for {province}/{city}: {} is missing",
                input.display()
            )));
        }
        let output = input.with_file_name("summary.json");
        clear_output(&output).await?;

        ctx.progress(10);
        ctx.run_command(
            JobKind::GenerateSummary,
            vec![
                "--province".to_string(),
                province.to_string(),
                "--city".to_string(),
                city.to_string(),
                "--input".to_string(),
                path_arg(&input),
                "--output".to_string(),
                path_arg(&output),
            ],
        )
        .await?;
        ctx.progress(90);

        require_file(&output).await?;
        Ok(SummaryResult {
            province: province.to_string(),
            city: city.to_string(),
            summary_file: output,
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

    fn payload() -> GenerateSummary {
        GenerateSummary {
            province: "sichuan".into(),
            city: "leshan".into(),
        }
    }

    #[tokio::test]
    async fn requires_collected_spots() {
        let root = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::ok();
        let (ctx, _store) = context(JobKind::GenerateSummary, json!({}), root.path(), runner.clone());

        let err = GenerateSummaryHandler.handle(payload(), &ctx).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn passes_spots_as_input() {
        let root = tempfile::tempdir().unwrap();
        let spots = spots_file(root.path(), "sichuan", "leshan");
        std::fs::create_dir_all(spots.parent().unwrap()).unwrap();
        std::fs::write(&spots, "[]").unwrap();

        let runner = ScriptedRunner::new(|_, args| {
            std::fs::write(flag_value(args, "--output").unwrap(), "{}")?;
            Ok(ProcessOutput::default())
        });
        let (ctx, _store) = context(JobKind::GenerateSummary, json!({}), root.path(), runner.clone());

        let result = GenerateSummaryHandler.handle(payload(), &ctx).await.unwrap();
        assert_eq!(result.summary_file, spots.with_file_name("summary.json"));

        let calls = runner.calls();
        let expected_input = spots.display().to_string();
        assert_eq!(flag_value(&calls[0].1, "--input"), Some(expected_input.as_str()));
    }

    #[tokio::test]
    async fn old_summary_does_not_satisfy_a_silent_script() {
        let root = tempfile::tempdir().unwrap();
        let spots = spots_file(root.path(), "sichuan", "leshan");
        std::fs::create_dir_all(spots.parent().unwrap()).unwrap();
        std::fs::write(&spots, "[]").unwrap();
        let summary = spots.with_file_name("summary.json");
        std::fs::write(&summary, r#"{"summary":"stale"}"#).unwrap();

        let (ctx, _store) = context(
            JobKind::GenerateSummary,
            json!({}),
            root.path(),
            ScriptedRunner::ok(),
        );
        let err = GenerateSummaryHandler.handle(payload(), &ctx).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutputMissing);
        assert!(!summary.exists());
    }
}
