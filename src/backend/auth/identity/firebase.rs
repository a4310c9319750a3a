/**
 * Firebase Authentication Client
 *
 * Talks to the Identity Toolkit REST API (`{base}/accounts:<method>?key=<api key>`).
 *
 * | Operation                 | Method                        |
 * |---------------------------|-------------------------------|
 * | `account_exists`          | `accounts:createAuthUri`      |
 * | `create_account`          | `accounts:signUp`             |
 * | `sign_in`                 | `accounts:signInWithPassword` |
 * | `verify_token`            | `accounts:lookup`             |
 * | `send_verification_email` | `accounts:sendOobCode`        |
 * | `send_password_reset`     | `accounts:sendOobCode`        |
 *
 * Errors come back as `{"error": {"code": 400, "message": "EMAIL_EXISTS"}}`
 * and are mapped through `IdentityError::from_code`.
 */

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use crate::backend::auth::identity::{Account, IdentityError, IdentityProvider, Session};

/// Default ID token lifetime when the provider omits `expiresIn`
const DEFAULT_EXPIRES_IN: u64 = 3600;

/// Identity Toolkit client
#[derive(Debug, Clone)]
pub struct FirebaseIdentity {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthUriResponse {
    #[serde(default)]
    registered: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    id_token: String,
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    email_verified: bool,
    #[serde(default)]
    disabled: bool,
}

impl FirebaseIdentity {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self, method: &str) -> Result<Url, IdentityError> {
        let raw = format!("{}/accounts:{}", self.base_url, method);
        let mut url = Url::parse(&raw).map_err(|e| IdentityError::Unavailable(format!("bad auth URL {}: {}", raw, e)))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    async fn call<B, R>(&self, method: &str, body: &B) -> Result<R, IdentityError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.endpoint(method)?)
            .json(body)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<R>()
                .await
                .map_err(|e| IdentityError::Other(format!("malformed {} response: {}", method, e)));
        }

        match response.json::<ErrorEnvelope>().await {
            Ok(envelope) => {
                tracing::debug!("[Auth] {} rejected: {}", method, envelope.error.message);
                Err(IdentityError::from_code(&envelope.error.message))
            }
            Err(_) => Err(IdentityError::Unavailable(format!("{} returned HTTP {}", method, status))),
        }
    }
}

impl From<TokenResponse> for Session {
    fn from(response: TokenResponse) -> Self {
        let expires_in = response
            .expires_in
            .as_deref()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_EXPIRES_IN);
        Session {
            account: Account::new(response.local_id, response.email),
            id_token: response.id_token,
            refresh_token: response.refresh_token,
            expires_in,
        }
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    fn name(&self) -> &'static str {
        "firebase"
    }

    async fn account_exists(&self, email: &str) -> Result<bool, IdentityError> {
        let response: AuthUriResponse = self
            .call(
                "createAuthUri",
                &json!({ "identifier": email, "continueUri": "http://localhost" }),
            )
            .await?;
        Ok(response.registered)
    }

    async fn create_account(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let response: TokenResponse = self
            .call(
                "signUp",
                &json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;
        tracing::info!("[Auth] Created account {}", response.local_id);
        Ok(response.into())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let session: Session = self
            .call::<_, TokenResponse>(
                "signInWithPassword",
                &json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await
            .map_err(|e| match e {
                IdentityError::AccountNotFound => IdentityError::InvalidCredentials,
                other => other,
            })?
            .into();

        // The sign-in response carries no verification or disabled flags.
        let account = self.verify_token(&session.id_token).await?;
        Ok(Session { account, ..session })
    }

    async fn verify_token(&self, id_token: &str) -> Result<Account, IdentityError> {
        let response: LookupResponse = self.call("lookup", &json!({ "idToken": id_token })).await?;
        let user = response.users.into_iter().next().ok_or(IdentityError::InvalidToken)?;
        if user.disabled {
            return Err(IdentityError::Disabled);
        }
        Ok(Account {
            id: user.local_id,
            email: user.email,
            email_verified: user.email_verified,
            disabled: user.disabled,
        })
    }

    async fn send_verification_email(&self, id_token: &str) -> Result<(), IdentityError> {
        let _: serde_json::Value = self
            .call(
                "sendOobCode",
                &json!({ "requestType": "VERIFY_EMAIL", "idToken": id_token }),
            )
            .await?;
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError> {
        let _: serde_json::Value = self
            .call(
                "sendOobCode",
                &json!({ "requestType": "PASSWORD_RESET", "email": email }),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_keeps_method_in_path() {
        let identity = FirebaseIdentity::new(reqwest::Client::new(), "https://identitytoolkit.googleapis.com/v1/", "k3y");
        let url = identity.endpoint("signUp").unwrap();
        assert_eq!(url.as_str(), "https://identitytoolkit.googleapis.com/v1/accounts:signUp?key=k3y");
    }

    #[test]
    fn test_session_from_token_response() {
        let response: TokenResponse = serde_json::from_value(json!({
            "localId": "uid-1",
            "email": "vet@example.com",
            "idToken": "tok",
            "refreshToken": "ref",
            "expiresIn": "1800"
        }))
        .unwrap();
        let session = Session::from(response);
        assert_eq!(session.account.id, "uid-1");
        assert_eq!(session.expires_in, 1800);
        assert!(!session.account.email_verified);
    }
}
