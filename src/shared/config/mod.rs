//! Application configuration module
//!
//! Provides the configuration types for the server: where readings come from,
//! how to reach the hosted identity and database services, and which signup
//! rules apply.

use std::str::FromStr;

use thiserror::Error;
use url::Url;

/// Default Identity Toolkit endpoint
pub const DEFAULT_AUTH_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Where readings, accounts and profiles live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceKind {
    /// Hosted Firebase Realtime Database and Authentication
    #[default]
    Firebase,
    /// In-process stores for local development
    Memory,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Firebase => "firebase",
            SourceKind::Memory => "memory",
        }
    }
}

impl FromStr for SourceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firebase" => Ok(SourceKind::Firebase),
            "memory" => Ok(SourceKind::Memory),
            other => Err(ConfigError::InvalidValue {
                name: "PETCARDIO_SOURCE",
                value: other.to_string(),
            }),
        }
    }
}

/// Signup validation rules
///
/// The signup flow existed in several slightly different variants; each
/// difference is a switch here instead of a separate code path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupRules {
    /// Ask the provider whether the email is taken before creating the account
    pub check_existing_email: bool,
    /// Minimum password length enforced before contacting the provider
    pub min_password_len: usize,
    /// Send a verification email after a successful signup
    pub send_verification_email: bool,
    /// Veterinarian accounts need a valid CPF
    pub require_cpf_for_veterinarian: bool,
}

impl Default for SignupRules {
    fn default() -> Self {
        Self {
            check_existing_email: true,
            min_password_len: 6,
            send_verification_email: false,
            require_cpf_for_veterinarian: true,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port the HTTP server listens on
    pub port: u16,
    /// Backing services
    pub source: SourceKind,
    /// Realtime Database base URL (`https://<project>.firebaseio.com`)
    pub database_url: Option<String>,
    /// Optional `auth=` credential appended to database requests
    pub database_auth: Option<String>,
    /// Identity Toolkit web API key
    pub api_key: Option<String>,
    /// Identity Toolkit base URL
    pub auth_url: String,
    /// Collection holding the ECG readings
    pub ecg_path: String,
    /// Collection holding account profiles
    pub profiles_path: String,
    /// Signup rule set
    pub signup: SignupRules,
    /// Interval between SSE keep-alive comments
    pub keepalive_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            source: SourceKind::default(),
            database_url: None,
            database_auth: None,
            api_key: None,
            auth_url: DEFAULT_AUTH_URL.to_string(),
            ecg_path: "ecgData".to_string(),
            profiles_path: "users".to_string(),
            signup: SignupRules::default(),
            keepalive_secs: 15,
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Validate the configuration
    ///
    /// The Firebase source needs both the database URL and the API key; every
    /// URL present must parse.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source == SourceKind::Firebase {
            let database_url = self
                .database_url
                .as_deref()
                .ok_or(ConfigError::MissingValue("FIREBASE_DATABASE_URL"))?;
            check_url(database_url)?;
            if self.api_key.as_deref().map_or(true, str::is_empty) {
                return Err(ConfigError::MissingValue("FIREBASE_API_KEY"));
            }
        }
        check_url(&self.auth_url)?;
        if self.ecg_path.trim_matches('/').is_empty() {
            return Err(ConfigError::MissingValue("ECG_PATH"));
        }
        if self.profiles_path.trim_matches('/').is_empty() {
            return Err(ConfigError::MissingValue("PROFILES_PATH"));
        }
        if self.keepalive_secs == 0 {
            return Err(ConfigError::InvalidValue {
                name: "RELAY_KEEPALIVE_SECS",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

fn check_url(raw: &str) -> Result<(), ConfigError> {
    let parsed = Url::parse(raw).map_err(|_| ConfigError::InvalidUrl(raw.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(ConfigError::InvalidUrl(raw.to_string())),
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn source(mut self, source: SourceKind) -> Self {
        self.config.source = source;
        self
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database_url = Some(url.into());
        self
    }

    pub fn database_auth(mut self, auth: impl Into<String>) -> Self {
        self.config.database_auth = Some(auth.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn auth_url(mut self, url: impl Into<String>) -> Self {
        self.config.auth_url = url.into();
        self
    }

    pub fn ecg_path(mut self, path: impl Into<String>) -> Self {
        self.config.ecg_path = path.into();
        self
    }

    pub fn profiles_path(mut self, path: impl Into<String>) -> Self {
        self.config.profiles_path = path.into();
        self
    }

    pub fn signup(mut self, rules: SignupRules) -> Self {
        self.config.signup = rules;
        self
    }

    pub fn keepalive_secs(mut self, secs: u64) -> Self {
        self.config.keepalive_secs = secs;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}
