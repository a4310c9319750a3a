/**
 * Server Configuration
 *
 * This module loads the server configuration from environment variables
 * and builds the backing services it names.
 *
 * # Configuration Sources
 *
 * Variables are read from the process environment; `main` loads a `.env`
 * file into it first when one is present. Every variable has a default
 * except the Firebase credentials, which are only needed when
 * `PETCARDIO_SOURCE=firebase` (the default).
 *
 * # Error Handling
 *
 * Unlike optional services, a reading source is required to serve anything,
 * so configuration errors stop startup.
 */

use std::sync::Arc;
use std::time::Duration;

use crate::backend::auth::identity::{FirebaseIdentity, IdentityProvider, MemoryIdentity};
use crate::backend::auth::profiles::{FirebaseProfiles, MemoryProfiles, ProfileStore};
use crate::backend::error::BackendError;
use crate::backend::source::{DatabaseRef, FirebaseSource, MemorySource, ReadingSource};
use crate::shared::{AppConfig, ConfigError, SignupRules, SourceKind};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Load the configuration from the process environment
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(|name| std::env::var(name).ok())
}

/// Load the configuration through `lookup`
///
/// Empty values count as unset.
pub fn load_config_from<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let mut builder = AppConfig::builder();

    if let Some(port) = get("SERVER_PORT").or_else(|| get("PORT")) {
        builder = builder.port(parse_number("SERVER_PORT", &port)?);
    }
    if let Some(source) = get("PETCARDIO_SOURCE") {
        builder = builder.source(source.parse::<SourceKind>()?);
    }
    if let Some(url) = get("FIREBASE_DATABASE_URL") {
        builder = builder.database_url(url);
    }
    if let Some(auth) = get("FIREBASE_DATABASE_AUTH") {
        builder = builder.database_auth(auth);
    }
    if let Some(key) = get("FIREBASE_API_KEY") {
        builder = builder.api_key(key);
    }
    if let Some(url) = get("FIREBASE_AUTH_URL") {
        builder = builder.auth_url(url);
    }
    if let Some(path) = get("ECG_PATH") {
        builder = builder.ecg_path(path);
    }
    if let Some(path) = get("PROFILES_PATH") {
        builder = builder.profiles_path(path);
    }

    let defaults = SignupRules::default();
    let signup = SignupRules {
        check_existing_email: match get("SIGNUP_CHECK_EXISTING") {
            Some(v) => parse_bool("SIGNUP_CHECK_EXISTING", &v)?,
            None => defaults.check_existing_email,
        },
        min_password_len: match get("SIGNUP_MIN_PASSWORD") {
            Some(v) => parse_number("SIGNUP_MIN_PASSWORD", &v)?,
            None => defaults.min_password_len,
        },
        send_verification_email: match get("SIGNUP_SEND_VERIFICATION") {
            Some(v) => parse_bool("SIGNUP_SEND_VERIFICATION", &v)?,
            None => defaults.send_verification_email,
        },
        require_cpf_for_veterinarian: match get("SIGNUP_REQUIRE_CPF_FOR_VET") {
            Some(v) => parse_bool("SIGNUP_REQUIRE_CPF_FOR_VET", &v)?,
            None => defaults.require_cpf_for_veterinarian,
        },
    };
    builder = builder.signup(signup);

    if let Some(secs) = get("RELAY_KEEPALIVE_SECS") {
        builder = builder.keepalive_secs(parse_number("RELAY_KEEPALIVE_SECS", &secs)?);
    }

    builder.build()
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
        }),
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: value.to_string(),
    })
}

/// Backing services named by the configuration
pub struct Services {
    pub source: Arc<dyn ReadingSource>,
    pub identity: Arc<dyn IdentityProvider>,
    pub profiles: Arc<dyn ProfileStore>,
}

/// Build the services for `config`
pub fn load_services(config: &AppConfig) -> Result<Services, BackendError> {
    match config.source {
        SourceKind::Memory => {
            tracing::warn!("[STARTUP] Using in-memory source, identity and profiles; nothing is persisted");
            Ok(Services {
                source: Arc::new(MemorySource::new()),
                identity: Arc::new(MemoryIdentity::new()),
                profiles: Arc::new(MemoryProfiles::new()),
            })
        }
        SourceKind::Firebase => {
            let database_url = config
                .database_url
                .clone()
                .ok_or_else(|| BackendError::state("FIREBASE_DATABASE_URL not set"))?;
            let api_key = config
                .api_key
                .clone()
                .ok_or_else(|| BackendError::state("FIREBASE_API_KEY not set"))?;

            // No overall timeout: the stream subscription stays open indefinitely.
            let client = reqwest::Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .build()
                .map_err(|e| BackendError::state(format!("HTTP client: {}", e)))?;

            let database = DatabaseRef::new(client.clone(), database_url, config.database_auth.clone());
            tracing::info!(
                "[STARTUP] Firebase source on /{}, profiles on /{}",
                config.ecg_path,
                config.profiles_path
            );
            Ok(Services {
                source: Arc::new(FirebaseSource::new(database.clone(), config.ecg_path.clone())),
                identity: Arc::new(FirebaseIdentity::new(client, config.auth_url.clone(), api_key)),
                profiles: Arc::new(FirebaseProfiles::new(database, config.profiles_path.clone())),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_memory_defaults() {
        let config = load_config_from(lookup(&[("PETCARDIO_SOURCE", "memory")])).unwrap();
        assert_eq!(config.source, SourceKind::Memory);
        assert_eq!(config.port, 3000);
        assert_eq!(config.signup, SignupRules::default());
        assert_eq!(config.keepalive_secs, 15);
    }

    #[test]
    fn test_overrides() {
        let config = load_config_from(lookup(&[
            ("PORT", "8080"),
            ("FIREBASE_DATABASE_URL", "https://petcardio.firebaseio.com"),
            ("FIREBASE_API_KEY", "key"),
            ("ECG_PATH", "devices/ecg"),
            ("SIGNUP_CHECK_EXISTING", "false"),
            ("SIGNUP_MIN_PASSWORD", "10"),
            ("SIGNUP_SEND_VERIFICATION", "yes"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.ecg_path, "devices/ecg");
        assert!(!config.signup.check_existing_email);
        assert_eq!(config.signup.min_password_len, 10);
        assert!(config.signup.send_verification_email);
        assert!(config.signup.require_cpf_for_veterinarian);
    }

    #[test]
    fn test_server_port_wins_over_port() {
        let config = load_config_from(lookup(&[
            ("PETCARDIO_SOURCE", "memory"),
            ("SERVER_PORT", "4000"),
            ("PORT", "5000"),
        ]))
        .unwrap();
        assert_eq!(config.port, 4000);
    }

    #[test]
    fn test_bad_values() {
        assert_matches!(
            load_config_from(lookup(&[("PETCARDIO_SOURCE", "memory"), ("SERVER_PORT", "http")])),
            Err(ConfigError::InvalidValue { name: "SERVER_PORT", .. })
        );
        assert_matches!(
            load_config_from(lookup(&[("PETCARDIO_SOURCE", "memory"), ("SIGNUP_CHECK_EXISTING", "maybe")])),
            Err(ConfigError::InvalidValue { name: "SIGNUP_CHECK_EXISTING", .. })
        );
    }

    #[test]
    fn test_load_memory_services() {
        let config = load_config_from(lookup(&[("PETCARDIO_SOURCE", "memory")])).unwrap();
        let services = load_services(&config).unwrap();
        assert_eq!(services.source.name(), "memory");
        assert_eq!(services.identity.name(), "memory");
    }
}
