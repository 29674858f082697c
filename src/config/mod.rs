use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// PostgreSQL connection string
    pub database_url: String,

    /// Redis connection string for the analysis job queue
    pub redis_url: String,

    /// HMAC secret for signing access tokens
    pub jwt_secret: String,

    /// Access token lifetime in seconds
    #[serde(default = "default_jwt_expiration_secs")]
    pub jwt_expiration_secs: i64,

    /// Push delivery gateway endpoint (Expo-compatible)
    #[serde(default = "default_push_endpoint")]
    pub push_endpoint: String,

    /// Per-request timeout for push delivery, in seconds
    #[serde(default = "default_push_timeout_secs")]
    pub push_timeout_secs: u64,

    /// Timeout for a single queue publish, in seconds
    #[serde(default = "default_publish_timeout_secs")]
    pub publish_timeout_secs: u64,

    /// Age after which a still-pending job counts as stale, in seconds
    #[serde(default = "default_stale_job_timeout_secs")]
    pub stale_job_timeout_secs: i64,

    /// Interval between stale-job sweeps, in seconds
    #[serde(default = "default_stale_sweep_interval_secs")]
    pub stale_sweep_interval_secs: u64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_jwt_expiration_secs() -> i64 {
    86_400
}

fn default_push_endpoint() -> String {
    "https://api.expo.dev/v2/push/send".to_string()
}

fn default_push_timeout_secs() -> u64 {
    10
}

fn default_publish_timeout_secs() -> u64 {
    5
}

fn default_stale_job_timeout_secs() -> i64 {
    600
}

fn default_stale_sweep_interval_secs() -> u64 {
    60
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }
}
