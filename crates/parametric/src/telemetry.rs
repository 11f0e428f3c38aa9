use crate::config::TelemetryConfig;
use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("log filter '{value}' does not parse")]
    Filter {
        value: String,
        #[source]
        source: ParseError,
    },
    #[error("failed to install the tracing subscriber")]
    Subscriber(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Installs the global tracing subscriber. `RUST_LOG` wins over the
/// configured level; output is compact, targetless, and ANSI-free so run
/// logs stay grep-friendly.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level).map_err(|source| {
            TelemetryError::Filter {
                value: config.log_level.clone(),
                source,
            }
        })?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_garbled_filter_reports_the_offending_value() {
        // RUST_LOG would shadow the configured level.
        std::env::remove_var("RUST_LOG");
        let config = TelemetryConfig {
            log_level: "not==a==filter".to_string(),
        };
        match init(&config) {
            Err(TelemetryError::Filter { value, .. }) => assert_eq!(value, "not==a==filter"),
            other => panic!("expected a filter error, got {other:?}"),
        }
    }
}
