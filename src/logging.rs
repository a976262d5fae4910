//! Log subscriber setup for binaries and tests built on the SDK

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::Error;

/// Install a global `tracing` subscriber
///
/// `RUST_LOG` takes precedence over the configured level. Fails if a global
/// subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), Error> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| Error::Config(format!("Invalid log filter '{}': {}", config.level, e)))?;

    let builder = fmt()
        .with_env_filter(env_filter)
        .with_ansi(config.enable_colors)
        .with_target(true);

    let result = match config.format.as_str() {
        "json" => builder.json().try_init(),
        "pretty" => builder.pretty().try_init(),
        _ => builder.compact().try_init(),
    };

    result.map_err(|e| Error::Config(format!("Failed to install log subscriber: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_only_once() {
        let config = LoggingConfig {
            level: "debug".to_string(),
            format: "compact".to_string(),
            enable_colors: false,
        };

        assert!(init_logging(&config).is_ok());
        assert!(init_logging(&config).is_err());
    }
}
