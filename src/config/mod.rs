mod settings;

pub use settings::{LogConfig, LogFormat, NotificationConfig, ServerConfig, Settings};
