use crate::adapters::push::fcm::payload::CustomData;
use clap::{Args, Parser, ValueEnum};

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub fcm: FcmConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "PUSH_RELAY_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port for the public API
    #[arg(long, env = "PUSH_RELAY_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Port for the management server (health probes)
    #[arg(long, env = "PUSH_RELAY_MGMT_PORT", default_value_t = 9090)]
    pub mgmt_port: u16,

    /// How long to wait for in-flight dispatch batches on shutdown
    #[arg(long, env = "PUSH_RELAY_SHUTDOWN_TIMEOUT_SECS", default_value_t = 5)]
    pub shutdown_timeout_secs: u64,
}

#[derive(Clone, Args)]
pub struct FcmConfig {
    /// Firebase project id. Falls back to the project id in the service account key
    #[arg(long = "fcm-project-id", env = "PUSH_RELAY_FCM_PROJECT_ID")]
    pub project_id: Option<String>,

    /// Full send endpoint, overriding the one derived from the project id (emulators, tests)
    #[arg(long = "fcm-endpoint", env = "PUSH_RELAY_FCM_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Path to the Google service account key used for OAuth2
    #[arg(long = "fcm-service-account-file", env = "PUSH_RELAY_FCM_SERVICE_ACCOUNT_FILE", default_value = "service-account.json")]
    pub service_account_file: String,

    /// Fixed bearer token. When set, the service account key is not used
    #[arg(long = "fcm-access-token", env = "PUSH_RELAY_FCM_ACCESS_TOKEN")]
    pub access_token: Option<String>,

    /// Custom data attached to every notification, as comma-separated key=value pairs
    #[arg(
        long = "fcm-custom-data",
        env = "PUSH_RELAY_FCM_CUSTOM_DATA",
        value_delimiter = ',',
        value_parser = parse_custom_pair
    )]
    pub custom_data: Vec<(String, String)>,
}

impl std::fmt::Debug for FcmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FcmConfig")
            .field("project_id", &self.project_id)
            .field("endpoint", &self.endpoint)
            .field("service_account_file", &self.service_account_file)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("custom_data", &self.custom_data)
            .finish()
    }
}

impl FcmConfig {
    #[must_use]
    pub fn custom_data(&self) -> CustomData {
        self.custom_data.iter().cloned().collect()
    }
}

/// Parses one `key=value` custom data pair.
///
/// # Errors
/// Returns an error if the pair has no `=`, an empty key, or uses the reserved `aps` key.
pub fn parse_custom_pair(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw.split_once('=').ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err("custom data key cannot be empty".into());
    }
    if key == "aps" {
        return Err("'aps' is reserved by the APNs payload".into());
    }
    Ok((key.to_string(), value.trim().to_string()))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// Log output format
    #[arg(long, env = "PUSH_RELAY_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// OTLP collector endpoint. Traces and metrics are only exported when set
    #[arg(long, env = "PUSH_RELAY_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

impl Config {
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }
}
