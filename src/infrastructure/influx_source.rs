// InfluxDB 2.x telemetry source (Flux)
use crate::application::telemetry_source::{QueryFailure, TelemetrySource};
use crate::domain::metrics::{ObservationWindow, RawObservation};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use influxdb2::api::query::FluxRecord;
use influxdb2::models::Query;
use influxdb2::Client;
use influxdb2_structmap::value::Value;
use std::time::Duration;

// Columns Flux adds to every row; never observation fields
const RESERVED_COLUMNS: [&str; 2] = ["result", "table"];

pub struct InfluxSource {
    client: Client,
    query_timeout: Duration,
}

impl InfluxSource {
    pub fn new(url: &str, org: &str, token: &str, query_timeout: Duration) -> Self {
        Self {
            client: Client::new(url.trim_end_matches('/'), org, token),
            query_timeout,
        }
    }

    /// Latest row of the measurement, pivoted so each field becomes a column.
    /// `group()` merges tag sets so at most one row comes back.
    pub fn latest_sample_query(window: &ObservationWindow) -> String {
        format!(
            r#"from(bucket: "{bucket}")
  |> range(start: -{secs}s)
  |> filter(fn: (r) => r._measurement == "{measurement}")
  |> pivot(rowKey: ["_time"], columnKey: ["_field"], valueColumn: "_value")
  |> group()
  |> sort(columns: ["_time"], desc: true)
  |> limit(n: 1)"#,
            bucket = flux_string(&window.bucket),
            secs = window.lookback.as_secs().max(1),
            measurement = flux_string(&window.measurement),
        )
    }

    /// Numeric, non-system columns of a pivoted row
    pub fn observation_from_record(record: &FluxRecord) -> RawObservation {
        let mut observation = RawObservation::new(record_time(record));

        for (column, value) in &record.values {
            if column.starts_with('_') || RESERVED_COLUMNS.contains(&column.as_str()) {
                continue;
            }
            if let Some(number) = numeric(value) {
                observation.insert(column.clone(), number);
            }
        }

        observation
    }
}

#[async_trait]
impl TelemetrySource for InfluxSource {
    async fn latest_observation(
        &self,
        window: &ObservationWindow,
    ) -> Result<Option<RawObservation>, QueryFailure> {
        let query = Self::latest_sample_query(window);
        tracing::debug!("Executing latest sample query: {}", query);

        let records = tokio::time::timeout(
            self.query_timeout,
            self.client.query_raw(Some(Query::new(query))),
        )
        .await
        .map_err(|_| {
            QueryFailure::new(format!("no response within {:?}", self.query_timeout))
        })?
        .map_err(|e| QueryFailure::new(e.to_string()))?;

        tracing::debug!("Got {} rows from InfluxDB for {}", records.len(), window.measurement);

        Ok(records
            .iter()
            .max_by_key(|record| record_time(record))
            .map(Self::observation_from_record))
    }
}

fn record_time(record: &FluxRecord) -> Option<DateTime<FixedOffset>> {
    match record.values.get("_time") {
        Some(Value::TimeRFC(time)) => Some(*time),
        _ => None,
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Double(v) => Some(v.into_inner()).filter(|v| v.is_finite()),
        Value::Long(v) => Some(*v as f64),
        Value::UnsignedLong(v) => Some(*v as f64),
        _ => None,
    }
}

/// Escape a value for use inside a double-quoted Flux string
fn flux_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
