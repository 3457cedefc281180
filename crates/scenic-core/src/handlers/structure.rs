//! CREATE_CITY_STRUCTURE: lay out the on-disk skeleton for a city.
//!
//! Runs natively; no external program is involved.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::path_component;
use crate::domain::{JobError, JobKind};
use crate::typed::{Handler, JobContext, JobPayload};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCityStructure {
    pub province: String,
    pub city: String,
    /// Spot names; one directory is created for each.
    #[serde(default)]
    pub spots: Vec<String>,
}

impl JobPayload for CreateCityStructure {
    const KIND: JobKind = JobKind::CreateCityStructure;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityStructureResult {
    pub city_dir: PathBuf,
    /// Spot directories that did not exist before.
    pub created: usize,
}

pub struct CreateCityStructureHandler;

async fn create_dir(path: &std::path::Path) -> Result<(), JobError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| JobError::execution(format!("cannot create {}: {e}", path.display())))
}

#[async_trait]
impl Handler<CreateCityStructure> for CreateCityStructureHandler {
    type Output = CityStructureResult;

    async fn handle(
        &self,
        payload: CreateCityStructure,
        ctx: &JobContext,
    ) -> Result<CityStructureResult, JobError> {
        let province = path_component("province", &payload.province)?;
        let city = path_component("city", &payload.city)?;
        let names = payload
            .spots
            .iter()
            .map(|s| path_component("spot", s))
            .collect::<Result<Vec<_>, _>>()?;

        let city_dir = ctx.data_root().join(province).join(city);
        let spots_dir = city_dir.join("spots");
        create_dir(&spots_dir).await?;

        let mut created = 0;
        for (i, name) in names.iter().enumerate() {
            let dir = spots_dir.join(name);
            if !tokio::fs::try_exists(&dir).await.unwrap_or(false) {
                create_dir(&dir).await?;
                created += 1;
            }
            let pct = 10 + (80 * (i + 1) / names.len()) as u8;
            ctx.progress(pct);
        }
        ctx.info(format!(
            "{created} of {} spot directories created under {}",
            names.len(),
            city_dir.display()
        ));

        Ok(CityStructureResult { city_dir, created })
    }
}
