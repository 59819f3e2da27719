use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

const DEFAULT_LOG_LEVEL: &str = "debug";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub bind_addr: String,
    pub log_level: String,
    pub database_url: String,
    pub session_key: String,
}

impl Settings {
    /// Defaults, then the optional TOML file at `path`, then `APISERVER_*`
    /// environment variables.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .set_default("bind_addr", "127.0.0.1:8080")?
            .set_default("log_level", DEFAULT_LOG_LEVEL)?
            .set_default("database_url", "sqlite://apiserver.db?mode=rwc")?
            .set_default("session_key", "")?
            .add_source(File::new(path, FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix("APISERVER"))
            .build()?
            .try_deserialize()?;

        if settings.session_key.is_empty() {
            return Err(ConfigError::Message("session_key must be set".into()));
        }
        Ok(settings)
    }
}

/// Level to install the logger with, so that a configuration that failed to
/// load can still be reported through it.
pub fn startup_log_level(settings: &Result<Settings, ConfigError>) -> &str {
    settings
        .as_ref()
        .map(|s| s.log_level.as_str())
        .unwrap_or(DEFAULT_LOG_LEVEL)
}
