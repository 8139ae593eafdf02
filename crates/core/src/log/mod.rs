//! # Structured Logging
//!
//! `tracing` based logging configured from the `logging.*` configuration keys.

use crate::config::{Config, ConfigError, CONFIG};
use crate::container::{Container, ServiceKey};
use crate::errors::BoxError;
use crate::providers::{ProviderError, ServiceProvider};
use async_trait::async_trait;
use std::io;
use std::str::FromStr;
use std::sync::Arc;
use tracing_subscriber::{fmt::Layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Container key of the application logger
pub const LOGGER: ServiceKey<Logger> = ServiceKey::new("log");

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Plain,
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain" | "text" => Ok(LogFormat::Plain),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::invalid_value(
                "logging.format",
                s,
                "plain, pretty or json",
            )),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "warn")
    pub level: String,
    pub format: LogFormat,
    /// Environment filter (supports filters like "cadenza=debug,sqlx=warn")
    pub env_filter: Option<String>,
    /// Channel name attached to every record written through [`Logger`]
    pub channel: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Plain,
            env_filter: None,
            channel: "app".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Read `logging.{level,format,filter,channel}`
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            level: config.get_string("logging.level", &defaults.level),
            format: config
                .get_optional_string("logging.format")
                .map(|format| format.parse())
                .transpose()?
                .unwrap_or(defaults.format),
            env_filter: config.get_optional_string("logging.filter"),
            channel: config.get_string("logging.channel", &defaults.channel),
        })
    }

    /// Filter directive: explicit filter, otherwise the level
    pub fn directive(&self) -> &str {
        self.env_filter.as_deref().unwrap_or(&self.level)
    }
}

/// Install the global subscriber
///
/// `RUST_LOG` wins over the configured directive. Returns `Ok(false)` when a
/// subscriber was already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<bool, BoxError> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(config.directive()))?;

    let installed = match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stdout).json())
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stdout).pretty())
            .try_init(),
        LogFormat::Plain => tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stdout))
            .try_init(),
    };

    match installed {
        Ok(()) => {
            tracing::info!(
                target: "cadenza::logging",
                "Structured logging initialized (level: {}, format: {:?})",
                config.level,
                config.format
            );
            Ok(true)
        }
        Err(_) => Ok(false),
    }
}

/// Application logger handed out by the facade
#[derive(Debug, Clone)]
pub struct Logger {
    config: LoggingConfig,
}

impl Logger {
    pub fn new(config: LoggingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoggingConfig {
        &self.config
    }

    pub fn channel(&self) -> &str {
        &self.config.channel
    }

    pub fn debug(&self, message: &str) {
        tracing::debug!(channel = %self.config.channel, "{}", message);
    }

    pub fn info(&self, message: &str) {
        tracing::info!(channel = %self.config.channel, "{}", message);
    }

    pub fn warning(&self, message: &str) {
        tracing::warn!(channel = %self.config.channel, "{}", message);
    }

    pub fn error(&self, message: &str) {
        tracing::error!(channel = %self.config.channel, "{}", message);
    }
}

/// Provider binding the logger and installing the subscriber at boot
pub struct LogServiceProvider;

#[async_trait]
impl ServiceProvider for LogServiceProvider {
    fn name(&self) -> &'static str {
        "log"
    }

    fn register(&self, container: &Container) -> Result<(), ProviderError> {
        container.bind(&LOGGER, |c| {
            let config = c.resolve(&CONFIG)?;
            Ok(Arc::new(Logger::new(LoggingConfig::from_config(&config)?)))
        });
        Ok(())
    }

    async fn boot(&self, container: &Container) -> Result<(), ProviderError> {
        let logger = container.resolve(&LOGGER)?;
        let installed = init_logging(logger.config()).map_err(|e| ProviderError::boot(self.name(), e))?;
        if !installed {
            tracing::debug!("A tracing subscriber is already installed; keeping it");
        }
        Ok(())
    }
}
