use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

const DEFAULT_RESUME_MAX_BYTES: u64 = 5 * 1024 * 1024;
const DEFAULT_MIN_PHONE_LENGTH: usize = 10;
const DEFAULT_SESSION_IDLE_SECS: u64 = 30 * 60;

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

/// Top-level configuration for the careers service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub applications: ApplicationPolicyConfig,
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

        let applications = ApplicationPolicyConfig::from_env()?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            applications,
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

/// Limits and storage locations used by the application wizard and account area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationPolicyConfig {
    pub resume_max_bytes: u64,
    pub min_phone_length: usize,
    pub resume_bucket: String,
    pub profile_image_bucket: String,
    pub storage_public_url: String,
    /// Open wizards untouched for this long are dropped from the session registry.
    pub session_idle_secs: u64,
}

impl ApplicationPolicyConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let resume_max_bytes = match env::var("APP_RESUME_MAX_BYTES") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|value| *value > 0)
                .ok_or(ConfigError::InvalidResumeLimit)?,
            Err(_) => DEFAULT_RESUME_MAX_BYTES,
        };

        let min_phone_length = match env::var("APP_MIN_PHONE_LENGTH") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidPhoneLength)?,
            Err(_) => DEFAULT_MIN_PHONE_LENGTH,
        };

        let session_idle_secs = match env::var("APP_SESSION_IDLE_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|value| *value > 0)
                .ok_or(ConfigError::InvalidSessionIdle)?,
            Err(_) => DEFAULT_SESSION_IDLE_SECS,
        };

        let defaults = Self::default();
        Ok(Self {
            resume_max_bytes,
            min_phone_length,
            session_idle_secs,
            resume_bucket: env::var("APP_RESUME_BUCKET").unwrap_or(defaults.resume_bucket),
            profile_image_bucket: env::var("APP_PROFILE_IMAGE_BUCKET")
                .unwrap_or(defaults.profile_image_bucket),
            storage_public_url: env::var("APP_STORAGE_PUBLIC_URL")
                .unwrap_or(defaults.storage_public_url),
        })
    }
}

impl Default for ApplicationPolicyConfig {
    fn default() -> Self {
        Self {
            resume_max_bytes: DEFAULT_RESUME_MAX_BYTES,
            min_phone_length: DEFAULT_MIN_PHONE_LENGTH,
            resume_bucket: "resumes".to_string(),
            profile_image_bucket: "profile-images".to_string(),
            storage_public_url: "http://127.0.0.1:3000/storage".to_string(),
            session_idle_secs: DEFAULT_SESSION_IDLE_SECS,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidResumeLimit,
    InvalidPhoneLength,
    InvalidSessionIdle,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidResumeLimit => {
                write!(f, "APP_RESUME_MAX_BYTES must be a positive integer")
            }
            ConfigError::InvalidPhoneLength => {
                write!(f, "APP_MIN_PHONE_LENGTH must be a non-negative integer")
            }
            ConfigError::InvalidSessionIdle => {
                write!(f, "APP_SESSION_IDLE_SECS must be a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidResumeLimit
            | ConfigError::InvalidPhoneLength
            | ConfigError::InvalidSessionIdle => None,
        }
    }
}
