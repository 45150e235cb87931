use config::{Config, ConfigError};
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    core: Core,
    api: Api,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(config::File::with_name("config").required(true))
            .add_source(config::File::with_name("config_local").required(false))
            .add_source(config::Environment::with_prefix("IPCMANVIEW").separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn core(&self) -> &Core {
        &self.core
    }

    pub fn api(&self) -> &Api {
        &self.api
    }
}

#[derive(Debug, Deserialize)]
pub struct Core {
    channel_buffer_size: usize,
    #[serde(with = "humantime_serde")]
    refresh_interval: Duration,
    #[serde(with = "humantime_serde")]
    directory_refresh_interval: Duration,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default)]
    max_events: Option<usize>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Core {
    pub fn channel_buffer_size(&self) -> usize {
        self.channel_buffer_size
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// How often the device list is reloaded, `None` when set to zero.
    pub fn directory_refresh_interval(&self) -> Option<Duration> {
        Some(self.directory_refresh_interval).filter(|interval| !interval.is_zero())
    }

    /// Falls back to `INFO` for unknown level names.
    pub fn log_level(&self) -> Level {
        Level::from_str(&self.log_level).unwrap_or(Level::INFO)
    }

    pub fn max_events(&self) -> Option<usize> {
        self.max_events
    }
}

#[derive(Debug, Deserialize)]
pub struct Api {
    url: String,
    websocket_url: String,
    #[serde(default)]
    session_token: Option<String>,
    retry_ms: u64,
    #[serde(with = "humantime_serde")]
    retry_max_delay: Duration,
    #[serde(with = "humantime_serde")]
    stale_connection_timeout: Duration,
}

impl Api {
    pub fn url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    pub fn websocket_url(&self) -> &str {
        self.websocket_url.trim_end_matches('/')
    }

    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref().filter(|token| !token.is_empty())
    }

    pub fn retry_ms(&self) -> u64 {
        self.retry_ms
    }

    pub fn retry_max_delay(&self) -> Duration {
        self.retry_max_delay
    }

    pub fn stale_connection_timeout(&self) -> Duration {
        self.stale_connection_timeout
    }
}

#[cfg(test)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

#[cfg(test)]
impl AppConfigBuilder {
    pub fn new() -> Self {
        AppConfigBuilder {
            config: AppConfig {
                core: Core {
                    channel_buffer_size: 16,
                    refresh_interval: Duration::from_secs(5),
                    directory_refresh_interval: Duration::from_secs(300),
                    log_level: "debug".to_string(),
                    max_events: None,
                },
                api: Api {
                    url: "http://ipcmanview.url".to_string(),
                    websocket_url: "ws://ipcmanview.url".to_string(),
                    session_token: None,
                    retry_ms: 1,
                    retry_max_delay: Duration::from_millis(5),
                    stale_connection_timeout: Duration::from_secs(5),
                },
            },
        }
    }

    pub fn api_url(mut self, url: String) -> Self {
        self.config.api.websocket_url = url.replacen("http", "ws", 1);
        self.config.api.url = url;
        self
    }

    pub fn session_token(mut self, token: &str) -> Self {
        self.config.api.session_token = Some(token.to_string());
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}
