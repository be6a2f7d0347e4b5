// Application layer - Use cases over the telemetry source and credential table
pub mod credential_gate;
pub mod metrics_resolver;
pub mod telemetry_source;
