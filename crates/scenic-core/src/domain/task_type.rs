//! Job kinds and the free-form task type string.
//!
//! Producers may submit any type string; only the kinds listed in
//! [`JobKind`] have handlers. Unknown strings are rejected at dispatch time,
//! not at submission time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of job kinds the executor knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobKind {
    /// Organizes the raw data of a province into one directory per city.
    OrganizeRegionData,
    /// Collects the scenic spots of one city.
    SearchCitySpots,
    /// Collects spots around a single coordinate.
    SearchNearbySpots,
    /// Produces the city summary from its collected spots.
    GenerateSummary,
    /// Lays out the on-disk directory skeleton for a city.
    CreateCityStructure,
    /// Registered but not implemented yet.
    ProcessNarration,
}

impl JobKind {
    pub const ALL: [JobKind; 6] = [
        JobKind::OrganizeRegionData,
        JobKind::SearchCitySpots,
        JobKind::SearchNearbySpots,
        JobKind::GenerateSummary,
        JobKind::CreateCityStructure,
        JobKind::ProcessNarration,
    ];

    /// Wire name, e.g. `ORGANIZE_REGION_DATA`.
    pub fn as_str(self) -> &'static str {
        match self {
            JobKind::OrganizeRegionData => "ORGANIZE_REGION_DATA",
            JobKind::SearchCitySpots => "SEARCH_CITY_SPOTS",
            JobKind::SearchNearbySpots => "SEARCH_NEARBY_SPOTS",
            JobKind::GenerateSummary => "GENERATE_SUMMARY",
            JobKind::CreateCityStructure => "CREATE_CITY_STRUCTURE",
            JobKind::ProcessNarration => "PROCESS_NARRATION",
        }
    }

    /// Default script name for kinds that shell out, e.g. `organize_region_data`.
    pub fn script_name(self) -> String {
        self.as_str().to_ascii_lowercase()
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `type` field of a task as submitted by a producer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskType(String);

impl TaskType {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The recognized kind, if any.
    pub fn kind(&self) -> Option<JobKind> {
        JobKind::parse(&self.0)
    }
}

impl From<JobKind> for TaskType {
    fn from(kind: JobKind) -> Self {
        Self::new(kind.as_str())
    }
}

impl From<&str> for TaskType {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TaskType {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
