// Domain layer - Line metrics and credentials, no I/O
pub mod credentials;
pub mod metrics;
