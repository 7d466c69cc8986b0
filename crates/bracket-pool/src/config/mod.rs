use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use chrono::NaiveDateTime;
use chrono_tz::Tz;

use crate::contest::window::SubmissionWindow;

const DEFAULT_DEADLINE: &str = "2026-03-19T00:00";
const DEFAULT_TIMEZONE: &str = "America/New_York";
const DEFAULT_EMAIL_DOMAIN: &str = "stevens.edu";
const DEFAULT_CORS_ORIGINS: &str =
    "http://localhost:3000,https://march-madness-bracket-z4rb.vercel.app";
const DEFAULT_CORS_ORIGIN_SUFFIX: &str = ".vercel.app";

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
    pub storage: StorageConfig,
    pub contest: ContestConfig,
    pub cors: CorsConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let database_path = env::var("APP_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("bracket.db"));

        let deadline = env::var("APP_DEADLINE").unwrap_or_else(|_| DEFAULT_DEADLINE.to_string());
        let timezone = env::var("APP_TIMEZONE").unwrap_or_else(|_| DEFAULT_TIMEZONE.to_string());
        let email_domain =
            env::var("APP_EMAIL_DOMAIN").unwrap_or_else(|_| DEFAULT_EMAIL_DOMAIN.to_string());

        let allowed_origins = env::var("APP_CORS_ORIGINS")
            .unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();
        let origin_suffix = env::var("APP_CORS_ORIGIN_SUFFIX")
            .unwrap_or_else(|_| DEFAULT_CORS_ORIGIN_SUFFIX.to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            storage: StorageConfig { database_path },
            contest: ContestConfig::parse(&deadline, &timezone, &email_domain)?,
            cors: CorsConfig {
                allowed_origins,
                origin_suffix,
            },
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

/// Location of the SQLite database. `:memory:` keeps everything transient.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub database_path: PathBuf,
}

impl StorageConfig {
    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == ":memory:"
    }
}

/// Contest rules: when entry closes and which institution may register.
#[derive(Debug, Clone)]
pub struct ContestConfig {
    pub window: SubmissionWindow,
    pub email_domain: String,
}

impl ContestConfig {
    pub fn parse(deadline: &str, timezone: &str, email_domain: &str) -> Result<Self, ConfigError> {
        let local = parse_local_datetime(deadline).ok_or_else(|| ConfigError::InvalidDeadline {
            value: deadline.to_string(),
        })?;
        let zone: Tz = timezone
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidTimezone {
                value: timezone.to_string(),
            })?;
        let window = SubmissionWindow::from_local(local, zone).ok_or_else(|| {
            ConfigError::InvalidDeadline {
                value: deadline.to_string(),
            }
        })?;

        let email_domain = email_domain
            .trim()
            .trim_start_matches('@')
            .to_ascii_lowercase();
        if email_domain.is_empty() {
            return Err(ConfigError::InvalidEmailDomain);
        }

        Ok(Self {
            window,
            email_domain,
        })
    }
}

fn parse_local_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

/// Browser origins allowed to call the API with credentials.
#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    /// Any `https://` origin whose host ends with this suffix is also allowed.
    pub origin_suffix: String,
}

impl CorsConfig {
    pub fn allows(&self, origin: &str) -> bool {
        if self.allowed_origins.iter().any(|allowed| allowed == origin) {
            return true;
        }

        match origin.strip_prefix("https://") {
            Some(host) if !self.origin_suffix.is_empty() => {
                host.len() > self.origin_suffix.len()
                    && host.ends_with(&self.origin_suffix)
                    && !host.contains('/')
            }
            _ => false,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidDeadline { value: String },
    InvalidTimezone { value: String },
    InvalidEmailDomain,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidDeadline { value } => write!(
                f,
                "APP_DEADLINE '{value}' must be a local time formatted YYYY-MM-DDTHH:MM that exists in APP_TIMEZONE"
            ),
            ConfigError::InvalidTimezone { value } => {
                write!(f, "APP_TIMEZONE '{value}' is not a known IANA time zone")
            }
            ConfigError::InvalidEmailDomain => write!(f, "APP_EMAIL_DOMAIN must not be empty"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
