//! Logging initialization and configuration.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter,
};

use crate::config::LoggingConfig;

/// Installs the global subscriber. `RUST_LOG` overrides the configured level.
///
/// Fails if a subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), TryInitError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => {
            let json_layer = fmt::layer()
                .json()
                .with_span_events(FmtSpan::CLOSE)
                .with_current_span(true)
                .with_target(true);
            subscriber.with(json_layer).try_init()
        }
        _ => {
            let pretty_layer = fmt::layer().pretty().with_target(true);
            subscriber.with(pretty_layer).try_init()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        let config = LoggingConfig {
            level: "warn".to_string(),
            format: "pretty".to_string(),
        };
        let first = init_logging(&config);
        let second = init_logging(&config);
        assert!(first.is_ok() || second.is_err());
        assert!(second.is_err());
    }
}
