use crate::config::TelemetryConfig;
use std::fmt;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// Targets that follow the configured level; every other target stays at `warn`.
const ANALYSIS_TARGETS: [&str; 2] = ["tca_analysis", "tca_analysis_cli"];

#[derive(Debug)]
pub enum TelemetryError {
    InvalidFilter { value: String, source: ParseError },
    AlreadyInstalled(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::InvalidFilter { value, .. } => {
                write!(f, "invalid log filter '{value}'")
            }
            TelemetryError::AlreadyInstalled(err) => {
                write!(f, "a global tracing subscriber is already installed: {err}")
            }
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::InvalidFilter { source, .. } => Some(source),
            TelemetryError::AlreadyInstalled(err) => Some(&**err),
        }
    }
}

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
///
/// Events go to stderr; stdout carries analysis JSON.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => build_filter(&config.log_level)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_ansi(config.ansi)
        .try_init()
        .map_err(TelemetryError::AlreadyInstalled)
}

fn build_filter(level: &str) -> Result<EnvFilter, TelemetryError> {
    let value = directives(level);
    EnvFilter::try_new(&value).map_err(|source| TelemetryError::InvalidFilter { value, source })
}

fn directives(level: &str) -> String {
    let level = level.trim();
    if level.contains('=') || level.contains(',') {
        return level.to_string();
    }
    let mut directives = vec!["warn".to_string()];
    directives.extend(ANALYSIS_TARGETS.iter().map(|target| format!("{target}={level}")));
    directives.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_level_is_scoped_to_analysis_crates() {
        assert_eq!(
            directives(" debug "),
            "warn,tca_analysis=debug,tca_analysis_cli=debug"
        );
        assert_eq!(directives("reqwest=info,tca_analysis=trace"), "reqwest=info,tca_analysis=trace");
    }

    #[test]
    fn unknown_level_is_rejected() {
        let error = build_filter("verbose").expect_err("filter must not parse");
        assert!(matches!(error, TelemetryError::InvalidFilter { ref value, .. } if value.contains("tca_analysis=verbose")));
    }
}
