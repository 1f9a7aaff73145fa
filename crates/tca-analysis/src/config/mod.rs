use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::analysis::flow::{RetryPolicy, DEFAULT_FALLBACK_PENALTY};
use crate::analysis::registry::{ModuleRegistry, RegistryError};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the analysis runtime.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub flow: FlowServiceConfig,
    pub analysis: AnalysisSettings,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let url = env::var("FLOW_SERVICE_URL").unwrap_or_else(|_| "http://localhost:3100".to_string());
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl { value: url });
        }

        let flow = FlowServiceConfig {
            url,
            timeout: Duration::from_secs(parse_var("FLOW_TIMEOUT_SECS", 300u64)?),
            max_retries: parse_var("FLOW_MAX_RETRIES", 3u32)?,
            retry_delay: Duration::from_millis(parse_var("FLOW_RETRY_DELAY_MS", 2000u64)?),
            strict: parse_bool("FLOW_STRICT", false)?,
            fallback_penalty: parse_var("FLOW_FALLBACK_PENALTY", DEFAULT_FALLBACK_PENALTY)?,
        };

        let analysis = AnalysisSettings {
            preset: env::var("ANALYSIS_PRESET").unwrap_or_else(|_| "comprehensive".to_string()),
            modules_path: env::var("ANALYSIS_MODULES_PATH")
                .ok()
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
        };

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            flow,
            analysis,
            telemetry: TelemetryConfig {
                log_level,
                ansi: environment == AppEnvironment::Development,
            },
        })
    }
}

/// Connection and resilience settings for the external flow service.
#[derive(Debug, Clone)]
pub struct FlowServiceConfig {
    pub url: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub strict: bool,
    pub fallback_penalty: f64,
}

impl FlowServiceConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.retry_delay)
    }
}

/// Which module registry to run.
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub preset: String,
    /// JSON registry file; takes precedence over `preset` when set.
    pub modules_path: Option<PathBuf>,
}

impl AnalysisSettings {
    pub fn registry(&self) -> Result<ModuleRegistry, RegistryError> {
        match &self.modules_path {
            Some(path) => ModuleRegistry::from_path(path),
            None => ModuleRegistry::preset(&self.preset),
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// A bare level applies to this workspace's crates only; a full filter is used verbatim.
    pub log_level: String,
    pub ansi: bool,
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
            name,
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}

fn parse_bool(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(name) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue { name, value: raw }),
        },
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue { name: &'static str, value: String },
    InvalidUrl { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue { name, value } => {
                write!(f, "{name} has an invalid value '{value}'")
            }
            ConfigError::InvalidUrl { value } => {
                write!(f, "FLOW_SERVICE_URL must be an http(s) URL, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
