//! Aggregate grade statistics for one assignment
//!
//! The server replies to the statistics API with one payload per
//! assignment: named population slices (each a pre-aggregated compressed
//! CDF) plus metadata the graph header needs. This module decodes that
//! payload into [`GradeStats`].

use std::collections::HashMap;

use gradeboard_stats::{GradeSeries, SeriesData};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StatsResult;

/// Assignment identifier: the server sends either a numeric id or a name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PsetId {
    Number(i64),
    Name(String),
}

/// Grade-entry descriptor, opaque to this layer except for its type tag
/// (the rendering layer uses the tag to pick axis ticks).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryInfo {
    #[serde(rename = "type")]
    pub entry_type: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Wire form of the grade-statistics payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsData {
    pub pset: String,
    pub psetid: PsetId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxtotal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<EntryInfo>,
    #[serde(default)]
    pub series: HashMap<String, SeriesData>,
}

/// Grade statistics for one assignment: population slices keyed by name
/// (`"all"`, `"extension"`, `"noextra"`, ...) plus display metadata.
///
/// Read-only after construction; every field type is plain data, so a
/// constructed value can be shared across threads freely.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "StatsData", into = "StatsData")]
pub struct GradeStats {
    pub pset: String,
    pub psetid: PsetId,
    pub maxtotal: Option<f64>,
    pub entry: Option<EntryInfo>,
    pub series: HashMap<String, GradeSeries>,
}

impl From<StatsData> for GradeStats {
    fn from(d: StatsData) -> Self {
        // Series arrive pre-aggregated; each is decoded as-is, with no
        // validation beyond what GradeSeries construction performs.
        let series = d
            .series
            .into_iter()
            .map(|(name, data)| (name, GradeSeries::from_data(data)))
            .collect();
        Self {
            pset: d.pset,
            psetid: d.psetid,
            maxtotal: d.maxtotal,
            entry: d.entry,
            series,
        }
    }
}

impl From<GradeStats> for StatsData {
    fn from(stats: GradeStats) -> Self {
        let series = stats
            .series
            .into_iter()
            .map(|(name, series)| (name, series.to_data()))
            .collect();
        Self {
            pset: stats.pset,
            psetid: stats.psetid,
            maxtotal: stats.maxtotal,
            entry: stats.entry,
            series,
        }
    }
}

impl GradeStats {
    /// Decode a server payload.
    pub fn from_json(value: Value) -> StatsResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Decode a server payload from raw JSON text.
    pub fn from_json_str(text: &str) -> StatsResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Look up one population slice by name.
    pub fn series(&self, name: &str) -> Option<&GradeSeries> {
        self.series.get(name)
    }

    /// The `"all"`-students slice, which every well-formed payload carries.
    pub fn all(&self) -> Option<&GradeSeries> {
        self.series("all")
    }
}
