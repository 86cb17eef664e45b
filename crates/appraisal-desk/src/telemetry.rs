use crate::config::TelemetryConfig;
use std::fmt;
use tracing_subscriber::filter::{Directive, ParseError};
use tracing_subscriber::EnvFilter;

/// Dependency targets held at `warn` unless `RUST_LOG` replaces the filter.
const QUIET_TARGETS: [&str; 3] = ["hyper=warn", "reqwest=warn", "rustls=warn"];

#[derive(Debug)]
pub enum TelemetryError {
    EnvFilter { value: String, source: ParseError },
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::EnvFilter { value, .. } => {
                write!(f, "invalid log filter '{value}': unable to build EnvFilter")
            }
            TelemetryError::Subscriber(err) => write!(f, "subscriber already installed: {err}"),
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::EnvFilter { source, .. } => Some(source),
            TelemetryError::Subscriber(err) => Some(&**err),
        }
    }
}

fn parse_directive(raw: &str) -> Result<Directive, TelemetryError> {
    raw.parse().map_err(|source| TelemetryError::EnvFilter {
        value: raw.to_string(),
        source,
    })
}

/// Filter from `RUST_LOG` when set, otherwise the configured level with the
/// HTTP client stack held at `warn`.
pub fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let mut filter =
        EnvFilter::try_new(&config.log_level).map_err(|source| TelemetryError::EnvFilter {
            value: config.log_level.clone(),
            source,
        })?;
    for target in QUIET_TARGETS {
        filter = filter.add_directive(parse_directive(target)?);
    }
    Ok(filter)
}

/// Installs the global compact fmt subscriber.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = build_filter(config)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_quiets_http_client_targets() {
        std::env::remove_var("RUST_LOG");
        let config = TelemetryConfig {
            log_level: "appraisal_desk=debug,info".to_string(),
        };

        let rendered = build_filter(&config).expect("filter builds").to_string();
        assert!(rendered.contains("appraisal_desk=debug"));
        assert!(rendered.contains("reqwest=warn"));
    }

    #[test]
    fn rejects_unparseable_filter() {
        std::env::remove_var("RUST_LOG");
        let config = TelemetryConfig {
            log_level: "appraisal_desk=verbose".to_string(),
        };
        let err = init(&config).expect_err("filter rejected");
        assert!(matches!(
            err,
            TelemetryError::EnvFilter { ref value, .. } if value == "appraisal_desk=verbose"
        ));
    }
}
