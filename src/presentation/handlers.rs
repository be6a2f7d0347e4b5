// HTTP request handlers
use crate::application::metrics_resolver::MetricsUnavailable;
use crate::domain::metrics::MetricsSnapshot;
use crate::infrastructure::http_response;
use crate::presentation::app_state::AppState;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::Deserialize;
use std::sync::Arc;

pub const DASHBOARD_PATH: &str = "/dashboard";

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Latest line metrics; never a partial snapshot
pub async fn latest_metrics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MetricsSnapshot>, MetricsUnavailable> {
    let snapshot = state.metrics_service.latest_snapshot().await?;
    Ok(Json(snapshot))
}

/// Form login; redirects to the dashboard on success
pub async fn login(State(state): State<Arc<AppState>>, Form(form): Form<LoginForm>) -> Response {
    let username = form.username.trim();

    match state.credential_gate.verify(username, &form.password) {
        Ok(()) => {
            tracing::info!("Login accepted for {}", username);
            Redirect::to(DASHBOARD_PATH).into_response()
        }
        Err(e) => {
            // Username stays out of the log; it is sometimes a mistyped password
            tracing::warn!("Login rejected: {}", e);
            http_response::login_rejected()
        }
    }
}

/// Anything no route or static file matched
pub async fn fallback() -> Response {
    http_response::not_found()
}
