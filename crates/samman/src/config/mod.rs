use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::applications::fraud::{FraudPolicy, DEFAULT_HIGH_RISK_DISTRICTS};

const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 2_000;

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

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub screening: ScreeningConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            screening: ScreeningConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Per-deployment dials for submission-time fraud screening.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningConfig {
    pub lookup_timeout: Duration,
    pub high_risk_districts: Vec<String>,
    pub strict_documents: bool,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            lookup_timeout: Duration::from_millis(DEFAULT_LOOKUP_TIMEOUT_MS),
            high_risk_districts: DEFAULT_HIGH_RISK_DISTRICTS
                .iter()
                .map(|district| district.to_string())
                .collect(),
            strict_documents: false,
        }
    }
}

impl ScreeningConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(raw) = env::var("APP_LOOKUP_TIMEOUT_MS") {
            let millis = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|millis| *millis > 0)
                .ok_or(ConfigError::InvalidLookupTimeout)?;
            config.lookup_timeout = Duration::from_millis(millis);
        }

        if let Ok(raw) = env::var("APP_HIGH_RISK_DISTRICTS") {
            let districts: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|district| !district.is_empty())
                .map(str::to_string)
                .collect();
            if districts.is_empty() {
                return Err(ConfigError::EmptyDistrictList);
            }
            config.high_risk_districts = districts;
        }

        if let Ok(raw) = env::var("APP_STRICT_DOCUMENTS") {
            config.strict_documents = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(ConfigError::InvalidFlag("APP_STRICT_DOCUMENTS")),
            };
        }

        Ok(config)
    }

    /// Fraud policy with the deployment's district list applied over the defaults.
    pub fn fraud_policy(&self) -> FraudPolicy {
        FraudPolicy {
            high_risk_districts: self.high_risk_districts.clone(),
            lookup_timeout: self.lookup_timeout,
            ..FraudPolicy::default()
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidLookupTimeout,
    EmptyDistrictList,
    InvalidFlag(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidLookupTimeout => {
                write!(f, "APP_LOOKUP_TIMEOUT_MS must be a positive number of milliseconds")
            }
            ConfigError::EmptyDistrictList => {
                write!(f, "APP_HIGH_RISK_DISTRICTS must name at least one district")
            }
            ConfigError::InvalidFlag(name) => write!(f, "{name} must be true or false"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidLookupTimeout
            | ConfigError::EmptyDistrictList
            | ConfigError::InvalidFlag(_) => None,
        }
    }
}
