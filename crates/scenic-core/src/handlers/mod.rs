//! Handlers for the scenic-area pipeline job kinds.
//!
//! Each handler validates its payload, invokes the configured program through
//! the [`ProcessRunner`](crate::ports::ProcessRunner) and checks that the
//! expected artifact exists under `handlers.data_root`.

pub mod narration;
pub mod region;
pub mod spots;
pub mod structure;
pub mod summary;

use std::path::Path;

use crate::domain::JobError;
use crate::typed::{HandlerRegistry, RegistryError};

pub use narration::{NarrationHandler, ProcessNarration};
pub use region::{OrganizeRegionData, OrganizeRegionHandler, OrganizeRegionResult};
pub use spots::{
    CitySpotsResult, NearbySpotsResult, SearchCitySpots, SearchCitySpotsHandler,
    SearchNearbySpots, SearchNearbySpotsHandler,
};
pub use structure::{CityStructureResult, CreateCityStructure, CreateCityStructureHandler};
pub use summary::{GenerateSummary, GenerateSummaryHandler, SummaryResult};

/// Register a handler for every known job kind.
pub fn register_defaults(registry: &mut HandlerRegistry) -> Result<(), RegistryError> {
    registry.register::<OrganizeRegionData, _>(OrganizeRegionHandler)?;
    registry.register::<SearchCitySpots, _>(SearchCitySpotsHandler)?;
    registry.register::<SearchNearbySpots, _>(SearchNearbySpotsHandler)?;
    registry.register::<GenerateSummary, _>(GenerateSummaryHandler)?;
    registry.register::<CreateCityStructure, _>(CreateCityStructureHandler)?;
    registry.register::<ProcessNarration, _>(NarrationHandler)?;
    Ok(())
}

/// Check that `value` is usable as a single path component.
pub(crate) fn path_component<'a>(field: &str, value: &'a str) -> Result<&'a str, JobError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(JobError::validation(format!("{field} must not be empty")));
    }
    if trimmed == "." || trimmed == ".." || trimmed.contains(['/', '\\', '\0']) {
        return Err(JobError::validation(format!(
            "{field} is not a valid name: {value:?}"
        )));
    }
    Ok(trimmed)
}

pub(crate) async fn require_dir(path: &Path) -> Result<(), JobError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        _ => Err(JobError::OutputMissing(path.to_path_buf())),
    }
}

pub(crate) async fn require_file(path: &Path) -> Result<(), JobError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(()),
        _ => Err(JobError::OutputMissing(path.to_path_buf())),
    }
}

/// Remove an artifact left by an earlier attempt so the output check only
/// sees what this run produced.
pub(crate) async fn clear_output(path: &Path) -> Result<(), JobError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(JobError::execution(format!(
            "cannot remove stale {}: {e}",
            path.display()
        ))),
    }
}

pub(crate) fn path_arg(path: &Path) -> String {
    path.display().to_string()
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::JobKind;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("  ")]
    #[case(".")]
    #[case("..")]
    #[case("a/b")]
    #[case("a\\b")]
    fn rejects_bad_path_components(#[case] value: &str) {
        assert!(path_component("city", value).is_err());
    }

    #[test]
    fn accepts_plain_names() {
        assert_eq!(path_component("city", " dali ").unwrap(), "dali");
        assert_eq!(path_component("city", "大理").unwrap(), "大理");
    }

    #[test]
    fn defaults_cover_every_kind() {
        let mut registry = HandlerRegistry::new();
        register_defaults(&mut registry).unwrap();
        assert_eq!(registry.registered_kinds(), JobKind::ALL.to_vec());
    }

    #[tokio::test]
    async fn require_helpers_report_missing_output() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("spots.json");
        std::fs::write(&file, "[]").unwrap();

        assert!(require_dir(dir.path()).await.is_ok());
        assert!(require_file(&file).await.is_ok());
        assert_eq!(
            require_file(dir.path()).await,
            Err(JobError::OutputMissing(dir.path().to_path_buf()))
        );
        assert!(require_dir(&file).await.is_err());
        assert!(require_dir(&dir.path().join("nope")).await.is_err());
    }

    #[tokio::test]
    async fn clear_output_removes_leftovers_and_tolerates_absence() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("summary.json");
        std::fs::write(&file, "{}").unwrap();

        clear_output(&file).await.unwrap();
        assert!(!file.exists());
        clear_output(&file).await.unwrap();
    }
}
