/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * The `AppState` struct serves as the central state container for the
 * application, holding:
 * - The event relay shared by every push transport
 * - The reading source for last-known-value queries
 * - The identity provider and the profile store
 * - The signup policy and the SSE keep-alive interval
 *
 * # Thread Safety
 *
 * Services are held as `Arc<dyn Trait>` (trait objects are `Send + Sync`),
 * and `EventRelay` is itself a cheap handle around an `Arc<Mutex<_>>`, so
 * cloning the state per request is cheap.
 *
 * # Example
 *
 * ```rust
 * use axum::extract::State;
 * use petcardio::backend::server::state::AppState;
 *
 * async fn handler(State(state): State<AppState>) -> String {
 *     format!("{} clients connected", state.relay.len())
 * }
 * ```
 */

use std::sync::Arc;
use std::time::Duration;

use axum::extract::FromRef;

use crate::backend::auth::identity::{IdentityProvider, MemoryIdentity};
use crate::backend::auth::policy::SignupPolicy;
use crate::backend::auth::profiles::{MemoryProfiles, ProfileStore};
use crate::backend::realtime::broadcast::EventRelay;
use crate::backend::source::{MemorySource, ReadingSource};

/// Default interval between SSE keep-alive comments
pub const DEFAULT_KEEPALIVE: Duration = Duration::from_secs(15);

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub relay: EventRelay,
    pub source: Arc<dyn ReadingSource>,
    pub identity: Arc<dyn IdentityProvider>,
    pub profiles: Arc<dyn ProfileStore>,
    pub signup: SignupPolicy,
    pub keepalive: Duration,
}

impl AppState {
    pub fn new(
        source: Arc<dyn ReadingSource>,
        identity: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileStore>,
    ) -> Self {
        Self {
            relay: EventRelay::new(),
            source,
            identity,
            profiles,
            signup: SignupPolicy::default(),
            keepalive: DEFAULT_KEEPALIVE,
        }
    }

    /// State over in-process services, for local development and tests
    pub fn in_memory(
        source: Arc<MemorySource>,
        identity: Arc<MemoryIdentity>,
        profiles: Arc<MemoryProfiles>,
    ) -> Self {
        Self::new(source, identity, profiles)
    }

    pub fn with_signup(mut self, signup: SignupPolicy) -> Self {
        self.signup = signup;
        self
    }

    pub fn with_keepalive(mut self, keepalive: Duration) -> Self {
        self.keepalive = keepalive;
        self
    }
}

impl FromRef<AppState> for EventRelay {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.relay.clone()
    }
}
