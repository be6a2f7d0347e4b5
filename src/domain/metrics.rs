// Production line metrics domain models
use chrono::{DateTime, FixedOffset};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::time::Duration;

pub const MACHINE_SPEED: &str = "MachineSpeed";
pub const TOTAL_PRODUCTS: &str = "TotalProducts";
pub const TOTAL_GOOD_PRODUCTS: &str = "TotalGoodProducts";
pub const TOTAL_SCRAP_PRODUCTS: &str = "TotalScrapProducts";
pub const ONLINE_OEE: &str = "Online_OEE";

/// Bucket, measurement and lookback that bound a latest-sample query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservationWindow {
    pub bucket: String,
    pub measurement: String,
    pub lookback: Duration,
}

impl ObservationWindow {
    pub fn new(bucket: String, measurement: String, lookback: Duration) -> Self {
        Self {
            bucket,
            measurement,
            lookback,
        }
    }
}

/// The latest sample in a window, with all fields collapsed onto one timestamp.
/// Holds only the fields the source actually reported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawObservation {
    pub observed_at: Option<DateTime<FixedOffset>>,
    fields: BTreeMap<String, f64>,
}

impl RawObservation {
    pub fn new(observed_at: Option<DateTime<FixedOffset>>) -> Self {
        Self {
            observed_at,
            fields: BTreeMap::new(),
        }
    }

    #[cfg(test)]
    pub fn with_field(mut self, name: impl Into<String>, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.fields.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.fields.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LineStatus {
    Running,
    Stopped,
}

/// Fully populated view of the line handed to dashboard clients.
/// Every field is always serialized, null when there is nothing to show.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    #[serde(rename = "MachineSpeed", serialize_with = "serialize_metric")]
    pub machine_speed: Option<f64>,
    #[serde(rename = "Online_OEE", serialize_with = "serialize_metric")]
    pub online_oee: Option<f64>,
    #[serde(rename = "TotalProducts", serialize_with = "serialize_metric")]
    pub total_products: Option<f64>,
    #[serde(rename = "TotalGoodProducts", serialize_with = "serialize_metric")]
    pub total_good_products: Option<f64>,
    #[serde(rename = "TotalScrapProducts", serialize_with = "serialize_metric")]
    pub total_scrap_products: Option<f64>,
    #[serde(rename = "scrapPercentage")]
    pub scrap_percentage: Option<String>,
    #[serde(rename = "lineStatus")]
    pub line_status: LineStatus,
}

impl MetricsSnapshot {
    /// Snapshot for a window with no samples
    pub fn idle() -> Self {
        Self {
            machine_speed: None,
            online_oee: None,
            total_products: None,
            total_good_products: None,
            total_scrap_products: None,
            scrap_percentage: None,
            line_status: LineStatus::Stopped,
        }
    }
}

// Largest integer an f64 holds exactly (2^53)
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Whole numbers go out as JSON integers (`250`, not `250.0`)
fn serialize_metric<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) if v.is_finite() && v.fract() == 0.0 && v.abs() <= MAX_EXACT_INTEGER => {
            serializer.serialize_i64(*v as i64)
        }
        Some(v) if v.is_finite() => serializer.serialize_f64(*v),
        _ => serializer.serialize_none(),
    }
}
