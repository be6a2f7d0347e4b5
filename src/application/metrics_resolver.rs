// Latest-metrics resolver - Turns the latest raw sample into a dashboard snapshot
use crate::application::telemetry_source::{QueryFailure, TelemetrySource};
use crate::domain::metrics::{
    LineStatus, MetricsSnapshot, ObservationWindow, RawObservation, MACHINE_SPEED, ONLINE_OEE,
    TOTAL_GOOD_PRODUCTS, TOTAL_PRODUCTS, TOTAL_SCRAP_PRODUCTS,
};
use std::sync::Arc;
use thiserror::Error;

/// Speeds strictly above this count as a running line
pub const RUNNING_SPEED_THRESHOLD: f64 = 1.0;

/// Decimal places in the scrap percentage string
pub const SCRAP_PERCENT_DECIMALS: usize = 2;

/// No snapshot could be produced this cycle
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("metrics unavailable: {source}")]
pub struct MetricsUnavailable {
    #[from]
    pub source: QueryFailure,
}

/// Resolve an optional observation into a complete snapshot.
///
/// Speed and the three product counters read as 0 when absent and are
/// reported as null when 0. OEE passes through untouched, since 0% is a
/// real reading.
pub fn resolve(observation: Option<&RawObservation>) -> MetricsSnapshot {
    let Some(observation) = observation else {
        return MetricsSnapshot::idle();
    };

    let speed = counter(observation, MACHINE_SPEED);
    let total = counter(observation, TOTAL_PRODUCTS);
    let good = counter(observation, TOTAL_GOOD_PRODUCTS);
    let scrap = counter(observation, TOTAL_SCRAP_PRODUCTS);

    MetricsSnapshot {
        machine_speed: non_zero(speed),
        online_oee: observation.get(ONLINE_OEE).filter(|v| v.is_finite()),
        total_products: non_zero(total),
        total_good_products: non_zero(good),
        total_scrap_products: non_zero(scrap),
        scrap_percentage: scrap_percentage(scrap, total),
        line_status: line_status(speed),
    }
}

/// Resolve a query outcome. An empty window still yields a snapshot;
/// a failed query never does.
pub fn resolve_query_result(
    result: Result<Option<RawObservation>, QueryFailure>,
) -> Result<MetricsSnapshot, MetricsUnavailable> {
    let observation = result?;
    Ok(resolve(observation.as_ref()))
}

pub fn line_status(speed: f64) -> LineStatus {
    if speed > RUNNING_SPEED_THRESHOLD {
        LineStatus::Running
    } else {
        LineStatus::Stopped
    }
}

/// `scrap / total * 100`, rounded half away from zero. Not clamped at 100.
pub fn scrap_percentage(scrap: f64, total: f64) -> Option<String> {
    if total.is_nan() || total <= 0.0 {
        return None;
    }

    let scale = 10f64.powi(SCRAP_PERCENT_DECIMALS as i32);
    let percent = (scrap / total) * 100.0;
    let rounded = (percent * scale).round() / scale;
    Some(format!("{:.*}", SCRAP_PERCENT_DECIMALS, rounded))
}

fn counter(observation: &RawObservation, field: &str) -> f64 {
    observation
        .get(field)
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

fn non_zero(value: f64) -> Option<f64> {
    (value != 0.0).then_some(value)
}

/// One metrics fetch: query the source, then resolve. Holds no state between calls.
#[derive(Clone)]
pub struct MetricsService {
    source: Arc<dyn TelemetrySource>,
    window: ObservationWindow,
}

impl MetricsService {
    pub fn new(source: Arc<dyn TelemetrySource>, window: ObservationWindow) -> Self {
        Self { source, window }
    }

    pub async fn latest_snapshot(&self) -> Result<MetricsSnapshot, MetricsUnavailable> {
        let result = self.source.latest_observation(&self.window).await;

        match &result {
            Ok(Some(observation)) => tracing::debug!(
                fields = observation.len(),
                observed_at = ?observation.observed_at,
                "Resolved latest observation for {}",
                self.window.measurement
            ),
            Ok(None) => tracing::debug!(
                "No samples for {} in the last {:?}, line treated as stopped",
                self.window.measurement,
                self.window.lookback
            ),
            Err(e) => tracing::error!("Latest metrics query failed: {}", e),
        }

        resolve_query_result(result)
    }
}
