//! In-memory application harness
//!
//! Builds the full router over the in-process source, identity provider and
//! profile store, and drives it with `tower::ServiceExt::oneshot`.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request},
    response::Response,
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use petcardio::backend::auth::identity::{IdentityProvider, MemoryIdentity};
use petcardio::backend::auth::policy::SignupPolicy;
use petcardio::backend::auth::profiles::{MemoryProfiles, Profile, ProfileStore, Role};
use petcardio::backend::routes::create_router;
use petcardio::backend::server::AppState;
use petcardio::backend::source::MemorySource;
use petcardio::shared::SignupRules;

/// Test user credentials
pub struct TestUser {
    pub id: String,
    pub email: String,
    pub password: String,
    pub token: String,
}

pub struct TestApp {
    pub state: AppState,
    pub source: Arc<MemorySource>,
    pub identity: Arc<MemoryIdentity>,
    pub profiles: Arc<MemoryProfiles>,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_rules(SignupRules::default())
    }

    pub fn with_rules(rules: SignupRules) -> Self {
        let source = Arc::new(MemorySource::new());
        let identity = Arc::new(MemoryIdentity::new());
        let profiles = Arc::new(MemoryProfiles::new());
        let state = AppState::in_memory(source.clone(), identity.clone(), profiles.clone())
            .with_signup(SignupPolicy::new(rules));
        let router = create_router(state.clone());

        Self {
            state,
            source,
            identity,
            profiles,
            router,
        }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router service is infallible")
    }

    /// Create an account with a stored profile, bypassing the signup route
    pub async fn create_user(&self, email: &str, password: &str, role: Role) -> TestUser {
        let session = self
            .identity
            .create_account(email, password)
            .await
            .expect("Failed to create test account");
        self.profiles
            .put(&Profile::new(session.account.id.clone(), email, role))
            .await
            .expect("Failed to store test profile");

        TestUser {
            id: session.account.id,
            email: email.to_string(),
            password: password.to_string(),
            token: session.id_token,
        }
    }
}

pub fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("Failed to build request")
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    json_request(Method::POST, uri, body)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("Failed to build request")
}

pub fn with_bearer(mut request: Request<Body>, token: &str) -> Request<Body> {
    let value = HeaderValue::from_str(&format!("Bearer {}", token)).expect("token is a valid header value");
    request.headers_mut().insert(header::AUTHORIZATION, value);
    request
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("body is UTF-8")
}

pub async fn body_json(response: Response) -> Value {
    let text = body_text(response).await;
    serde_json::from_str(&text).unwrap_or_else(|e| panic!("body is not JSON ({}): {}", e, text))
}

/// Poll `condition` until it holds, failing the test after two seconds
pub async fn wait_for<F: Fn() -> bool>(condition: F) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        if tokio::time::Instant::now() > deadline {
            panic!("condition not reached within 2s");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
