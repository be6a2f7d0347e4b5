// Source trait for latest-sample telemetry access
use crate::domain::metrics::{ObservationWindow, RawObservation};
use async_trait::async_trait;
use thiserror::Error;

/// The time-series store rejected or could not run the query
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("time-series query failed: {reason}")]
pub struct QueryFailure {
    pub reason: String,
}

impl QueryFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Latest sample within the window, pivoted onto a single timestamp.
    /// `Ok(None)` means the window held no samples, which is not an error.
    async fn latest_observation(
        &self,
        window: &ObservationWindow,
    ) -> Result<Option<RawObservation>, QueryFailure>;
}
