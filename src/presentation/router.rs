// Router assembly
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{fallback, health_check, latest_metrics, login, DASHBOARD_PATH};
use axum::handler::HandlerWithoutStateExt;
use axum::routing::{get, get_service, post};
use axum::Router;
use std::path::Path;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>, static_dir: &Path) -> Router {
    // Unmatched paths and unsupported methods both end up at `fallback` (404)
    let static_files = ServeDir::new(static_dir)
        .call_fallback_on_method_not_allowed(true)
        .not_found_service(fallback.into_service());
    let dashboard = ServeFile::new(static_dir.join("dashboard.html"));
    let index = ServeFile::new(static_dir.join("index.html"));

    Router::new()
        .route(
            "/healthz",
            get(health_check).options(health_check).fallback(fallback),
        )
        .route("/data", get(latest_metrics).fallback(fallback))
        .route("/login", post(login).fallback(fallback))
        .route(DASHBOARD_PATH, get_service(dashboard).fallback(fallback))
        .route("/", get_service(index).fallback(fallback))
        .fallback_service(static_files)
        .with_state(state)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::credential_gate::CredentialGate;
    use crate::application::metrics_resolver::MetricsService;
    use crate::application::telemetry_source::fake::FakeSource;
    use crate::domain::credentials::CredentialTable;
    use crate::domain::metrics::{
        ObservationWindow, RawObservation, MACHINE_SPEED, ONLINE_OEE, TOTAL_GOOD_PRODUCTS,
        TOTAL_PRODUCTS, TOTAL_SCRAP_PRODUCTS,
    };
    use crate::infrastructure::http_response::{LOGIN_REJECTED_HTML, NOT_FOUND_TEXT};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use serde_json::{json, Value};
    use std::path::PathBuf;
    use std::time::Duration;
    use tower::ServiceExt; // for `oneshot`

    fn static_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("public")
    }

    fn app(source: FakeSource) -> Router {
        let window = ObservationWindow::new(
            "line1".to_string(),
            "PLC_Tags".to_string(),
            Duration::from_secs(300),
        );
        let state = Arc::new(AppState {
            metrics_service: MetricsService::new(Arc::new(source), window),
            credential_gate: CredentialGate::new(CredentialTable::from_pairs([(
                "admin", "admin123",
            )])),
        });
        build_router(state, &static_dir())
    }

    fn idle_app() -> Router {
        app(FakeSource::returning(None))
    }

    async fn send_get(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn send(app: Router, method: &str, uri: &str) -> Response {
        app.oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
    }

    async fn post_form(app: Router, body: &str) -> Response {
        app.oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_str(&body_text(response).await).unwrap()
    }

    #[tokio::test]
    async fn test_data_returns_resolved_snapshot() {
        let observation = RawObservation::default()
            .with_field(MACHINE_SPEED, 250.0)
            .with_field(TOTAL_PRODUCTS, 1234.0)
            .with_field(TOTAL_GOOD_PRODUCTS, 1180.0)
            .with_field(TOTAL_SCRAP_PRODUCTS, 54.0)
            .with_field(ONLINE_OEE, 87.5);

        let response = send_get(app(FakeSource::returning(Some(observation))), "/data").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({
                "MachineSpeed": 250,
                "Online_OEE": 87.5,
                "TotalProducts": 1234,
                "TotalGoodProducts": 1180,
                "TotalScrapProducts": 54,
                "scrapPercentage": "4.38",
                "lineStatus": "Running"
            })
        );
    }

    #[tokio::test]
    async fn test_data_for_idle_window() {
        let response = send_get(idle_app(), "/data").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({
                "MachineSpeed": null,
                "Online_OEE": null,
                "TotalProducts": null,
                "TotalGoodProducts": null,
                "TotalScrapProducts": null,
                "scrapPercentage": null,
                "lineStatus": "Stopped"
            })
        );
    }

    #[tokio::test]
    async fn test_data_on_query_failure() {
        let response = send_get(app(FakeSource::failing("connection refused")), "/data").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "metrics unavailable");
        assert!(body.get("lineStatus").is_none());
    }

    #[tokio::test]
    async fn test_login_success_redirects_to_dashboard() {
        let response = post_form(idle_app(), "username=+admin+&password=admin123+").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/dashboard");
    }

    #[tokio::test]
    async fn test_login_failure_is_unauthorized() {
        let response = post_form(idle_app(), "username=admin&password=wrong").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_text(response).await, LOGIN_REJECTED_HTML);
    }

    #[tokio::test]
    async fn test_login_missing_fields_is_unauthorized() {
        let response = post_form(idle_app(), "").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = send_get(idle_app(), "/healthz").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");
    }

    #[tokio::test]
    async fn test_index_and_dashboard_views() {
        let response = send_get(idle_app(), "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("action=\"/login\""));

        let response = send_get(idle_app(), "/dashboard").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("/dashboard.js"));
    }

    #[tokio::test]
    async fn test_static_asset_served() {
        let response = send_get(idle_app(), "/dashboard.js").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let response = send_get(idle_app(), "/no/such/page").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, NOT_FOUND_TEXT);
    }

    #[tokio::test]
    async fn test_unknown_path_with_other_method_is_not_found() {
        for method in ["POST", "PUT", "DELETE"] {
            let response = send(idle_app(), method, "/no/such/page").await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{method}");
            assert_eq!(body_text(response).await, NOT_FOUND_TEXT);
        }
    }

    #[tokio::test]
    async fn test_wrong_method_on_known_route_is_not_found() {
        for (method, uri) in [
            ("GET", "/login"),
            ("POST", "/dashboard"),
            ("DELETE", "/"),
            ("POST", "/data"),
            ("POST", "/dashboard.js"),
        ] {
            let response = send(idle_app(), method, uri).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{method} {uri}");
            assert_eq!(body_text(response).await, NOT_FOUND_TEXT);
        }
    }

    #[tokio::test]
    async fn test_health_check_answers_options_and_head() {
        let response = send(idle_app(), "OPTIONS", "/healthz").await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(idle_app(), "HEAD", "/healthz").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    /// Collects formatted log output for assertions
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_rejected_login_log_omits_username() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let response = post_form(idle_app(), "username=hunter2secret&password=x").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Login rejected"));
        assert!(!output.contains("hunter2secret"));
    }
}
