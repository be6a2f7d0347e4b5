use crate::domain::credentials::CredentialTable;
use crate::domain::metrics::ObservationWindow;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "config/line";
const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 10;

/// Startup configuration problems. None of these are recoverable at request time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration value `{0}`")]
    Missing(&'static str),

    #[error("invalid configuration value `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Deserialize, Default)]
struct RawSettings {
    #[serde(default)]
    influx: RawInfluxSettings,
    #[serde(default)]
    server: ServerSettings,
    #[serde(default)]
    credentials: Vec<CredentialEntry>,
}

#[derive(Debug, Deserialize, Default)]
struct RawInfluxSettings {
    url: Option<String>,
    token: Option<String>,
    org: Option<String>,
    bucket: Option<String>,
    measurement: Option<String>,
    window_secs: Option<u64>,
    query_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("public")
}

#[derive(Debug, Deserialize, Clone)]
pub struct CredentialEntry {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct InfluxSettings {
    pub url: String,
    pub token: String,
    pub org: String,
    pub bucket: String,
    pub measurement: String,
    pub window: Duration,
    pub query_timeout: Duration,
}

impl InfluxSettings {
    pub fn observation_window(&self) -> ObservationWindow {
        ObservationWindow::new(self.bucket.clone(), self.measurement.clone(), self.window)
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub influx: InfluxSettings,
    pub server: ServerSettings,
    pub credentials: CredentialTable,
}

/// Load settings from `config/line.toml`, `LINE_*` variables and the plain
/// `INFLUX_*`/`PORT` variables, in increasing priority.
pub fn load_settings() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(DEFAULT_CONFIG_FILE).required(false))
        .add_source(
            config::Environment::with_prefix("LINE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .set_override_option("influx.url", env_var("INFLUX_URL"))?
        .set_override_option("influx.token", env_var("INFLUX_TOKEN"))?
        .set_override_option("influx.org", env_var("INFLUX_ORG"))?
        .set_override_option("influx.bucket", env_var("INFLUX_BUCKET"))?
        .set_override_option("server.port", env_var("PORT"))?
        .build()?;

    Settings::from_config(settings)
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

impl Settings {
    pub fn from_config(settings: config::Config) -> Result<Self, ConfigError> {
        let raw: RawSettings = settings.try_deserialize()?;
        raw.validate()
    }
}

impl RawSettings {
    fn validate(self) -> Result<Settings, ConfigError> {
        let influx = self.influx;

        let window_secs = influx.window_secs.ok_or(ConfigError::Missing("influx.window_secs"))?;
        if window_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "influx.window_secs",
                reason: "must be greater than zero".to_string(),
            });
        }

        let query_timeout_secs = influx
            .query_timeout_secs
            .unwrap_or(DEFAULT_QUERY_TIMEOUT_SECS);
        if query_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "influx.query_timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }

        let influx = InfluxSettings {
            url: required("influx.url", influx.url)?,
            token: required("influx.token", influx.token)?,
            org: required("influx.org", influx.org)?,
            bucket: required("influx.bucket", influx.bucket)?,
            measurement: required("influx.measurement", influx.measurement)?,
            window: Duration::from_secs(window_secs),
            query_timeout: Duration::from_secs(query_timeout_secs),
        };

        let credentials = CredentialTable::from_pairs(
            self.credentials
                .into_iter()
                .map(|entry| (entry.username, entry.password)),
        );

        Ok(Settings {
            influx,
            server: self.server,
            credentials,
        })
    }
}

/// Absent and blank values are both treated as missing
fn required(key: &'static str, value: Option<String>) -> Result<String, ConfigError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(key))
}
