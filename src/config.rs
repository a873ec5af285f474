/// Configuration management
use serde::Deserialize;

const DEV_FALLBACK_SECRET: &str = "dev_fallback_key";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_jwt_algorithm")]
    pub jwt_algorithm: String,
    #[serde(default = "default_access_ttl_minutes")]
    pub access_token_expire_minutes: i64,
    #[serde(default = "default_refresh_ttl_days")]
    pub refresh_token_expire_days: i64,
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u32,
    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,
    #[serde(default = "default_refresh_max_attempts")]
    pub refresh_max_attempts: u32,
    #[serde(default = "default_refresh_window_secs")]
    pub refresh_window_secs: u64,
    /// Key for signing audit records. Records are emitted unsigned when unset.
    #[serde(default)]
    pub audit_hmac_key: Option<String>,
}

fn default_jwt_secret() -> String {
    tracing::warn!("JWT_SECRET not set, falling back to development key");
    DEV_FALLBACK_SECRET.to_string()
}

fn default_jwt_algorithm() -> String {
    "HS256".to_string()
}

fn default_access_ttl_minutes() -> i64 {
    30
}

fn default_refresh_ttl_days() -> i64 {
    7
}

fn default_rate_limit() -> u32 {
    100
}

fn default_rate_limit_window_secs() -> u64 {
    15 * 60
}

fn default_refresh_max_attempts() -> u32 {
    5
}

fn default_refresh_window_secs() -> u64 {
    60
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenv::dotenv().ok();
        envy::from_env()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_FALLBACK_SECRET.to_string(),
            jwt_algorithm: default_jwt_algorithm(),
            access_token_expire_minutes: default_access_ttl_minutes(),
            refresh_token_expire_days: default_refresh_ttl_days(),
            rate_limit: default_rate_limit(),
            rate_limit_window_secs: default_rate_limit_window_secs(),
            refresh_max_attempts: default_refresh_max_attempts(),
            refresh_window_secs: default_refresh_window_secs(),
            audit_hmac_key: None,
        }
    }
}
