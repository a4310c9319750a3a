/**
 * In-Memory Identity Provider
 *
 * An account table kept in process. Tokens are random opaque strings that
 * live until the process exits. Mails are not sent; they are appended to an
 * outbox that tests and local tooling can inspect.
 *
 * The provider mirrors the hosted service's own rules: addresses need an `@`,
 * passwords need 6 characters, and emails are compared case-insensitively.
 */

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use uuid::Uuid;

use crate::backend::auth::identity::{Account, IdentityError, IdentityProvider, Session};

const PROVIDER_MIN_PASSWORD: usize = 6;
const TOKEN_LIFETIME_SECS: u64 = 3600;

/// Kind of mail the provider would have sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailKind {
    Verification,
    PasswordReset,
}

/// Outbox entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub kind: EmailKind,
    pub email: String,
}

struct StoredAccount {
    account: Account,
    password: String,
}

#[derive(Default)]
struct Directory {
    /// Keyed by lowercased email
    accounts: HashMap<String, StoredAccount>,
    /// Token -> lowercased email
    tokens: HashMap<String, String>,
    outbox: Vec<SentEmail>,
}

/// In-process identity provider
#[derive(Default)]
pub struct MemoryIdentity {
    directory: Mutex<Directory>,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    fn directory(&self) -> MutexGuard<'_, Directory> {
        self.directory.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mails "sent" so far, oldest first
    pub fn outbox(&self) -> Vec<SentEmail> {
        self.directory().outbox.clone()
    }

    /// Block an account from signing in
    pub fn disable(&self, email: &str) -> bool {
        match self.directory().accounts.get_mut(&email.to_lowercase()) {
            Some(stored) => {
                stored.account.disabled = true;
                true
            }
            None => false,
        }
    }

    /// Forget every token issued so far
    pub fn revoke_tokens(&self) {
        self.directory().tokens.clear();
    }

    pub fn account_count(&self) -> usize {
        self.directory().accounts.len()
    }

    fn issue(directory: &mut Directory, key: &str, account: Account) -> Session {
        let id_token = Uuid::new_v4().simple().to_string();
        directory.tokens.insert(id_token.clone(), key.to_string());
        Session {
            account,
            id_token,
            refresh_token: Uuid::new_v4().simple().to_string(),
            expires_in: TOKEN_LIFETIME_SECS,
        }
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn account_exists(&self, email: &str) -> Result<bool, IdentityError> {
        Ok(self.directory().accounts.contains_key(&email.to_lowercase()))
    }

    async fn create_account(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        if !email.contains('@') {
            return Err(IdentityError::InvalidEmail);
        }
        if password.chars().count() < PROVIDER_MIN_PASSWORD {
            return Err(IdentityError::WeakPassword(format!(
                "Password should be at least {} characters",
                PROVIDER_MIN_PASSWORD
            )));
        }

        let key = email.to_lowercase();
        let mut directory = self.directory();
        if directory.accounts.contains_key(&key) {
            return Err(IdentityError::AlreadyExists);
        }

        let account = Account::new(Uuid::new_v4().simple().to_string(), key.clone());
        directory.accounts.insert(
            key.clone(),
            StoredAccount {
                account: account.clone(),
                password: password.to_string(),
            },
        );
        Ok(Self::issue(&mut directory, &key, account))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let key = email.to_lowercase();
        let mut directory = self.directory();
        let account = match directory.accounts.get(&key) {
            Some(stored) if stored.password == password => stored.account.clone(),
            _ => return Err(IdentityError::InvalidCredentials),
        };
        if account.disabled {
            return Err(IdentityError::Disabled);
        }
        Ok(Self::issue(&mut directory, &key, account))
    }

    async fn verify_token(&self, id_token: &str) -> Result<Account, IdentityError> {
        let directory = self.directory();
        let account = directory
            .tokens
            .get(id_token)
            .and_then(|key| directory.accounts.get(key))
            .map(|stored| stored.account.clone())
            .ok_or(IdentityError::InvalidToken)?;
        if account.disabled {
            return Err(IdentityError::Disabled);
        }
        Ok(account)
    }

    async fn send_verification_email(&self, id_token: &str) -> Result<(), IdentityError> {
        let mut directory = self.directory();
        let email = directory
            .tokens
            .get(id_token)
            .cloned()
            .ok_or(IdentityError::InvalidToken)?;
        directory.outbox.push(SentEmail {
            kind: EmailKind::Verification,
            email,
        });
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError> {
        let key = email.to_lowercase();
        let mut directory = self.directory();
        if !directory.accounts.contains_key(&key) {
            return Err(IdentityError::AccountNotFound);
        }
        directory.outbox.push(SentEmail {
            kind: EmailKind::PasswordReset,
            email: key,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn test_create_and_sign_in() {
        let identity = MemoryIdentity::new();
        let created = identity.create_account("Tutor@Example.com", "secret1").await.unwrap();
        assert!(identity.account_exists("tutor@example.com").await.unwrap());

        let session = identity.sign_in("tutor@example.com", "secret1").await.unwrap();
        assert_eq!(session.account.id, created.account.id);
        assert_eq!(identity.verify_token(&session.id_token).await.unwrap().id, created.account.id);
    }

    #[tokio::test]
    async fn test_provider_rules() {
        let identity = MemoryIdentity::new();
        assert_matches!(identity.create_account("nope", "secret1").await, Err(IdentityError::InvalidEmail));
        assert_matches!(identity.create_account("a@b.co", "123").await, Err(IdentityError::WeakPassword(_)));
        identity.create_account("a@b.co", "secret1").await.unwrap();
        assert_matches!(identity.create_account("A@B.co", "secret2").await, Err(IdentityError::AlreadyExists));
    }

    #[tokio::test]
    async fn test_wrong_password_and_disabled() {
        let identity = MemoryIdentity::new();
        let session = identity.create_account("a@b.co", "secret1").await.unwrap();
        assert_matches!(identity.sign_in("a@b.co", "wrong!!").await, Err(IdentityError::InvalidCredentials));
        assert_matches!(identity.sign_in("x@b.co", "secret1").await, Err(IdentityError::InvalidCredentials));

        assert!(identity.disable("a@b.co"));
        assert_matches!(identity.sign_in("a@b.co", "secret1").await, Err(IdentityError::Disabled));
        assert_matches!(identity.verify_token(&session.id_token).await, Err(IdentityError::Disabled));
    }

    #[tokio::test]
    async fn test_outbox() {
        let identity = MemoryIdentity::new();
        let session = identity.create_account("a@b.co", "secret1").await.unwrap();
        identity.send_verification_email(&session.id_token).await.unwrap();
        identity.send_password_reset("A@b.co").await.unwrap();
        assert_matches!(identity.send_password_reset("z@b.co").await, Err(IdentityError::AccountNotFound));

        let kinds: Vec<EmailKind> = identity.outbox().into_iter().map(|m| m.kind).collect();
        assert_eq!(kinds, vec![EmailKind::Verification, EmailKind::PasswordReset]);
    }
}
