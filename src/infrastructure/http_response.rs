// HTTP response builders shared by the handlers
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;

pub const LOGIN_REJECTED_HTML: &str =
    "<h2 style='color:red;'>Invalid credentials. <a href='/'>Try again</a></h2>";

pub const NOT_FOUND_TEXT: &str = "Page not found";

/// JSON error body: `{"error": <code>, "message": <detail>}`
pub fn json_error(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    let body = Json(json!({
        "error": code,
        "message": message.into(),
    }));
    (status, body).into_response()
}

/// 401 with a retry link; says nothing about which field was wrong
pub fn login_rejected() -> Response {
    (StatusCode::UNAUTHORIZED, Html(LOGIN_REJECTED_HTML)).into_response()
}

pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, NOT_FOUND_TEXT).into_response()
}

impl IntoResponse for crate::application::metrics_resolver::MetricsUnavailable {
    fn into_response(self) -> Response {
        json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "metrics unavailable",
            self.to_string(),
        )
    }
}
