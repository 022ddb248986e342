//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and `SALON_*` environment variable overrides.

use chrono::FixedOffset;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::api;
use crate::auth::AuthPolicy;
use crate::push::{PushConfig, DEFAULT_PUSH_ENDPOINT};
use crate::reminders::ReminderConfig;
use crate::storage::StoreConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub push: PushSettings,

    #[serde(default)]
    pub reminders: RemindersConfig,

    #[serde(default)]
    pub salon: SalonConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("salon").to_string_lossy().to_string())
        .unwrap_or_else(|| "./salon_data".to_string())
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    /// Base URL clients use to reach this server (avatar links)
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8082
}

fn default_max_body_size() -> usize {
    10 * 1024 * 1024 // 10 MB
}

fn default_public_url() -> String {
    "http://localhost:8082".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_size: default_max_body_size(),
            public_url: default_public_url(),
        }
    }
}

/// Accounts and sessions
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_session_ttl_days")]
    pub session_ttl_days: i64,

    #[serde(default = "default_max_failed_attempts")]
    pub max_failed_attempts: usize,

    #[serde(default = "default_lockout_minutes")]
    pub lockout_minutes: i64,

    #[serde(default = "default_reset_token_ttl_minutes")]
    pub reset_token_ttl_minutes: i64,

    /// Administrator created on first start when no account has this email
    pub bootstrap_admin_email: Option<String>,
    pub bootstrap_admin_password: Option<String>,

    #[serde(default = "default_admin_name")]
    pub bootstrap_admin_name: String,
}

fn default_session_ttl_days() -> i64 {
    30
}

fn default_max_failed_attempts() -> usize {
    5
}

fn default_lockout_minutes() -> i64 {
    15
}

fn default_reset_token_ttl_minutes() -> i64 {
    60
}

fn default_admin_name() -> String {
    "Administrator".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_days: default_session_ttl_days(),
            max_failed_attempts: default_max_failed_attempts(),
            lockout_minutes: default_lockout_minutes(),
            reset_token_ttl_minutes: default_reset_token_ttl_minutes(),
            bootstrap_admin_email: None,
            bootstrap_admin_password: None,
            bootstrap_admin_name: default_admin_name(),
        }
    }
}

/// Push relay configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PushSettings {
    /// When false, messages are only recorded in the in-process outbox
    #[serde(default = "default_push_enabled")]
    pub enabled: bool,

    #[serde(default = "default_push_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_push_timeout")]
    pub request_timeout_ms: u64,
}

fn default_push_enabled() -> bool {
    true
}

fn default_push_endpoint() -> String {
    DEFAULT_PUSH_ENDPOINT.to_string()
}

fn default_push_timeout() -> u64 {
    5000
}

impl Default for PushSettings {
    fn default() -> Self {
        Self {
            enabled: default_push_enabled(),
            endpoint: default_push_endpoint(),
            request_timeout_ms: default_push_timeout(),
        }
    }
}

/// Reminder scheduling
#[derive(Debug, Clone, Deserialize)]
pub struct RemindersConfig {
    #[serde(default = "default_lead_minutes")]
    pub lead_minutes: i64,

    #[serde(default = "default_tick_seconds")]
    pub tick_seconds: u64,
}

fn default_lead_minutes() -> i64 {
    60
}

fn default_tick_seconds() -> u64 {
    15
}

impl Default for RemindersConfig {
    fn default() -> Self {
        Self {
            lead_minutes: default_lead_minutes(),
            tick_seconds: default_tick_seconds(),
        }
    }
}

/// Salon identity and wall clock
#[derive(Debug, Clone, Deserialize)]
pub struct SalonConfig {
    #[serde(default = "default_salon_name")]
    pub name: String,

    /// Professional recorded on client bookings
    #[serde(default = "default_professional")]
    pub professional: String,

    /// Offset of the salon's local time from UTC
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

fn default_salon_name() -> String {
    "Salon".to_string()
}

fn default_professional() -> String {
    "Salon team".to_string()
}

impl Default for SalonConfig {
    fn default() -> Self {
        Self {
            name: default_salon_name(),
            professional: default_professional(),
            utc_offset_minutes: 0,
        }
    }
}

impl SalonConfig {
    pub fn offset(&self) -> Result<FixedOffset, ConfigError> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| ConfigError::Invalid {
            field: "salon.utc_offset_minutes".to_string(),
            error: format!("{} is out of range", self.utc_offset_minutes),
        })
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("salon").join("config.toml")),
            Some(PathBuf::from("/etc/salon/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Storage overrides
        if let Some(data_dir) = var("SALON_DATA_DIR") {
            self.storage.data_dir = data_dir;
        }

        // API overrides
        if let Some(host) = var("SALON_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = var("SALON_API_PORT").and_then(|p| p.parse().ok()) {
            self.api.port = port;
        }
        if let Some(url) = var("SALON_PUBLIC_URL") {
            self.api.public_url = url;
        }

        // Bootstrap administrator
        if let Some(email) = var("SALON_ADMIN_EMAIL") {
            self.auth.bootstrap_admin_email = Some(email);
        }
        if let Some(password) = var("SALON_ADMIN_PASSWORD") {
            self.auth.bootstrap_admin_password = Some(password);
        }

        // Push overrides
        if let Some(enabled) = var("SALON_PUSH_ENABLED").and_then(|v| v.parse().ok()) {
            self.push.enabled = enabled;
        }
        if let Some(endpoint) = var("SALON_PUSH_ENDPOINT") {
            self.push.endpoint = endpoint;
        }

        // Salon overrides
        if let Some(offset) = var("SALON_UTC_OFFSET_MINUTES").and_then(|v| v.parse().ok()) {
            self.salon.utc_offset_minutes = offset;
        }

        // Logging overrides
        if let Some(level) = var("SALON_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("SALON_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new(expand_home(&self.storage.data_dir))
    }

    pub fn auth_policy(&self) -> AuthPolicy {
        AuthPolicy {
            session_ttl: chrono::Duration::days(self.auth.session_ttl_days),
            max_failed_attempts: self.auth.max_failed_attempts,
            lockout_window: chrono::Duration::minutes(self.auth.lockout_minutes),
            reset_token_ttl: chrono::Duration::minutes(self.auth.reset_token_ttl_minutes),
        }
    }

    pub fn push_config(&self) -> PushConfig {
        PushConfig {
            endpoint: self.push.endpoint.clone(),
            request_timeout_ms: self.push.request_timeout_ms,
        }
    }

    pub fn reminder_config(&self) -> Result<ReminderConfig, ConfigError> {
        Ok(ReminderConfig {
            lead: chrono::Duration::minutes(self.reminders.lead_minutes),
            tick_interval: std::time::Duration::from_secs(self.reminders.tick_seconds.max(1)),
            salon_offset: self.salon.offset()?,
        })
    }

    pub fn api_config(&self) -> Result<api::ApiConfig, ConfigError> {
        Ok(api::ApiConfig {
            host: self.api.host.clone(),
            port: self.api.port,
            max_body_size: self.api.max_body_size,
            public_url: self.api.public_url.clone(),
            salon_offset: self.salon.offset()?,
            professional: self.salon.professional.clone(),
        })
    }
}

/// Expand a leading `~/` to the home directory
fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid value for {field}: {error}")]
    Invalid { field: String, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Salon Console Configuration
#
# Environment variables override these settings:
# - SALON_DATA_DIR
# - SALON_API_HOST
# - SALON_API_PORT
# - SALON_PUBLIC_URL
# - SALON_ADMIN_EMAIL / SALON_ADMIN_PASSWORD
# - SALON_PUSH_ENABLED
# - SALON_PUSH_ENDPOINT
# - SALON_UTC_OFFSET_MINUTES
# - SALON_LOG_LEVEL
# - SALON_LOG_FORMAT

[storage]
# Directory holding salon.db and the blobs/ folder
data_dir = "~/.local/share/salon"

[api]
host = "0.0.0.0"
port = 8082

# Upper bound for request bodies, avatars included (bytes)
max_body_size = 10485760

# Base URL used in avatar links
public_url = "http://localhost:8082"

[auth]
session_ttl_days = 30

# Failed logins allowed per email before a lockout
max_failed_attempts = 5
lockout_minutes = 15

reset_token_ttl_minutes = 60

# Administrator created on first start
# bootstrap_admin_email = "owner@example.com"
# bootstrap_admin_password = "change-me"
bootstrap_admin_name = "Administrator"

[push]
# Disable to keep notifications in the local outbox
enabled = true
endpoint = "https://exp.host/--/api/v2/push/send"
request_timeout_ms = 5000

[reminders]
# Minutes before the appointment
lead_minutes = 60

# How often due reminders are checked (seconds)
tick_seconds = 15

[salon]
name = "Salon"
professional = "Salon team"

# Local time offset from UTC, e.g. -180 for UTC-03:00
utc_offset_minutes = 0

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
