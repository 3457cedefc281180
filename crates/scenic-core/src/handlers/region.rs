//! ORGANIZE_REGION_DATA: split a province's raw data into city directories.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{path_arg, path_component, require_dir};
use crate::domain::{JobError, JobKind};
use crate::typed::{Handler, JobContext, JobPayload};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizeRegionData {
    pub province: String,
}

impl JobPayload for OrganizeRegionData {
    const KIND: JobKind = JobKind::OrganizeRegionData;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizeRegionResult {
    pub province: String,
    /// Holds one sub-directory per city.
    pub output_dir: PathBuf,
}

pub struct OrganizeRegionHandler;

#[async_trait]
impl Handler<OrganizeRegionData> for OrganizeRegionHandler {
    type Output = OrganizeRegionResult;

    async fn handle(
        &self,
        payload: OrganizeRegionData,
        ctx: &JobContext,
    ) -> Result<OrganizeRegionResult, JobError> {
        let province = path_component("province", &payload.province)?;
        let output_dir = ctx.data_root().join(province);

        ctx.progress(10);
        ctx.run_command(
            JobKind::OrganizeRegionData,
            vec![
                "--province".to_string(),
                province.to_string(),
                "--output".to_string(),
                path_arg(&output_dir),
            ],
        )
        .await?;
        ctx.progress(90);

        require_dir(&output_dir).await?;
        ctx.info(format!("region data organized into {}", output_dir.display()));

        Ok(OrganizeRegionResult {
            province: province.to_string(),
            output_dir,
        })
    }
}
