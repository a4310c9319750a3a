/**
 * Account Profiles
 *
 * The identity provider only knows emails and passwords. What the product
 * needs on top (role, display name, CPF) is kept in a profile record per
 * account, stored under `{db}/users/{account_id}.json` in the realtime
 * database.
 */

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::backend::source::{DatabaseRef, SourceError};

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Veterinarian,
    #[default]
    #[serde(alias = "pet-owner")]
    PetOwner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Veterinarian => "veterinarian",
            Role::PetOwner => "pet_owner",
        }
    }

    /// Only an admin may create accounts with this role
    pub fn requires_admin(&self) -> bool {
        matches!(self, Role::Admin | Role::Veterinarian)
    }
}

/// Product-side account data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub account_id: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Digits only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(account_id: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            account_id: account_id.into(),
            email: email.into(),
            role,
            name: None,
            cpf: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    pub fn with_cpf(mut self, cpf: Option<String>) -> Self {
        self.cpf = cpf;
        self
    }
}

/// Profile store failures
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile store unavailable: {0}")]
    Unavailable(String),

    #[error("malformed profile {account_id}: {message}")]
    Malformed { account_id: String, message: String },

    #[error("invalid account id '{0}'")]
    InvalidKey(String),
}

impl From<reqwest::Error> for ProfileError {
    fn from(err: reqwest::Error) -> Self {
        ProfileError::Unavailable(err.to_string())
    }
}

impl From<SourceError> for ProfileError {
    fn from(err: SourceError) -> Self {
        ProfileError::Unavailable(err.to_string())
    }
}

/// Storage for profiles, keyed by account id
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, account_id: &str) -> Result<Option<Profile>, ProfileError>;

    /// Create or replace the profile of `profile.account_id`
    async fn put(&self, profile: &Profile) -> Result<(), ProfileError>;
}

/// Realtime Database keys may not contain these
fn check_key(account_id: &str) -> Result<(), ProfileError> {
    let forbidden = ['.', '#', '$', '[', ']', '/'];
    if account_id.is_empty() || account_id.contains(&forbidden[..]) {
        return Err(ProfileError::InvalidKey(account_id.to_string()));
    }
    Ok(())
}

/// Profiles stored in the realtime database
#[derive(Debug, Clone)]
pub struct FirebaseProfiles {
    database: DatabaseRef,
    path: String,
}

impl FirebaseProfiles {
    pub fn new(database: DatabaseRef, path: impl Into<String>) -> Self {
        Self {
            database,
            path: path.into().trim_matches('/').to_string(),
        }
    }

    fn profile_path(&self, account_id: &str) -> Result<String, ProfileError> {
        check_key(account_id)?;
        Ok(format!("{}/{}", self.path, account_id))
    }
}

#[async_trait]
impl ProfileStore for FirebaseProfiles {
    async fn get(&self, account_id: &str) -> Result<Option<Profile>, ProfileError> {
        let url = self.database.url(&self.profile_path(account_id)?, &[])?;
        let response = self.database.client().get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let value: Value = response.error_for_status()?.json().await?;
        if value.is_null() {
            return Ok(None);
        }
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| ProfileError::Malformed {
                account_id: account_id.to_string(),
                message: e.to_string(),
            })
    }

    async fn put(&self, profile: &Profile) -> Result<(), ProfileError> {
        let url = self.database.url(&self.profile_path(&profile.account_id)?, &[])?;
        self.database
            .client()
            .put(url)
            .json(profile)
            .send()
            .await?
            .error_for_status()?;
        tracing::debug!("[Auth] Stored profile {}", profile.account_id);
        Ok(())
    }
}

/// In-process profile store
#[derive(Debug, Default)]
pub struct MemoryProfiles {
    profiles: RwLock<HashMap<String, Profile>>,
}

impl MemoryProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.profiles.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ProfileStore for MemoryProfiles {
    async fn get(&self, account_id: &str) -> Result<Option<Profile>, ProfileError> {
        let profiles = self.profiles.read().unwrap_or_else(PoisonError::into_inner);
        Ok(profiles.get(account_id).cloned())
    }

    async fn put(&self, profile: &Profile) -> Result<(), ProfileError> {
        check_key(&profile.account_id)?;
        let mut profiles = self.profiles.write().unwrap_or_else(PoisonError::into_inner);
        profiles.insert(profile.account_id.clone(), profile.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_value(Role::PetOwner).unwrap(), json!("pet_owner"));
        assert_eq!(serde_json::from_value::<Role>(json!("pet-owner")).unwrap(), Role::PetOwner);
        assert_eq!(serde_json::from_value::<Role>(json!("veterinarian")).unwrap(), Role::Veterinarian);
        assert!(serde_json::from_value::<Role>(json!("root")).is_err());
    }

    #[test]
    fn test_requires_admin() {
        assert!(Role::Admin.requires_admin());
        assert!(Role::Veterinarian.requires_admin());
        assert!(!Role::PetOwner.requires_admin());
    }

    #[test]
    fn test_profile_skips_empty_optionals() {
        let profile = Profile::new("uid1", "a@b.co", Role::PetOwner);
        let value = serde_json::to_value(&profile).unwrap();
        assert!(value.get("name").is_none());
        assert!(value.get("cpf").is_none());
        assert_eq!(value["role"], "pet_owner");
    }

    #[test]
    fn test_check_key() {
        assert!(check_key("abcDEF123").is_ok());
        assert!(check_key("a/b").is_err());
        assert!(check_key("").is_err());
    }

    #[tokio::test]
    async fn test_memory_profiles() {
        let store = MemoryProfiles::new();
        assert!(store.get("uid1").await.unwrap().is_none());
        store.put(&Profile::new("uid1", "a@b.co", Role::Admin)).await.unwrap();
        assert_eq!(store.get("uid1").await.unwrap().map(|p| p.role), Some(Role::Admin));
        assert_eq!(store.len(), 1);
    }
}
