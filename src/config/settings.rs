use std::env;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::notification::{Position, DEFAULT_MAX_VISIBLE};

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Interval between SSE keep-alive comments, in seconds
    #[serde(default = "default_keep_alive_interval")]
    pub keep_alive_interval: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    /// Number of notifications rendered at once
    #[serde(default = "default_max_visible")]
    pub max_visible: usize,
    /// Display anchor, forwarded to renderers untouched
    #[serde(default)]
    pub position: Position,
    /// Auto-dismiss delay for notifications that do not set one, in milliseconds
    #[serde(default = "default_duration_ms")]
    pub default_duration_ms: u64,
    /// Capacity of the command channel in front of the service
    #[serde(default = "default_buffer")]
    pub command_buffer: usize,
    /// Capacity of the lifecycle event broadcast channel
    #[serde(default = "default_buffer")]
    pub event_buffer: usize,
}

impl NotificationConfig {
    pub fn default_duration(&self) -> Duration {
        Duration::from_millis(self.default_duration_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Filter used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8081
}

fn default_keep_alive_interval() -> u64 {
    15 // 15 seconds
}

fn default_max_visible() -> usize {
    DEFAULT_MAX_VISIBLE
}

fn default_duration_ms() -> u64 {
    6000 // 6 seconds
}

fn default_buffer() -> usize {
    256
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8081)?
            .set_default("notifications.max_visible", 3)?
            .set_default("notifications.position", "bottom-right")?
            .set_default("notifications.default_duration_ms", 6000)?
            .set_default("log.level", "info")?
            .set_default("log.format", "pretty")?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables
            // SERVER__PORT, NOTIFICATIONS__MAX_VISIBLE, LOG__FORMAT, etc.
            .add_source(Self::environment());

        builder.build()?.try_deserialize()
    }

    /// Environment source. Only `SERVER__CORS_ORIGINS` is split on commas;
    /// log filters such as `crate=debug,info` must stay whole strings.
    fn environment() -> Environment {
        Environment::default()
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("server.cors_origins")
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
            keep_alive_interval: default_keep_alive_interval(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            max_visible: default_max_visible(),
            position: Position::default(),
            default_duration_ms: default_duration_ms(),
            command_buffer: default_buffer(),
            event_buffer: default_buffer(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}
