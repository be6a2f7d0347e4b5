// Application state for HTTP handlers
use crate::application::credential_gate::CredentialGate;
use crate::application::metrics_resolver::MetricsService;

#[derive(Clone)]
pub struct AppState {
    pub metrics_service: MetricsService,
    pub credential_gate: CredentialGate,
}
