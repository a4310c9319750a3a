//! Authentication Module
//!
//! This module handles account registration, login and the account profile.
//! Credentials and tokens are owned by the hosted identity provider; this
//! backend keeps the product-side profile and decides who may create what.
//!
//! # Architecture
//!
//! - **`identity`** - Identity provider trait and clients
//! - **`profiles`** - Role and profile storage
//! - **`policy`** - Signup validation rules
//! - **`handlers`** - HTTP handlers for authentication endpoints
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs          - Module exports and documentation
//! ├── identity/       - IdentityProvider, FirebaseIdentity, MemoryIdentity
//! ├── profiles.rs     - Role, Profile, ProfileStore
//! ├── policy.rs       - SignupPolicy, email and CPF checks
//! └── handlers/       - HTTP handlers
//! ```
//!
//! # Authentication Flow
//!
//! 1. **Signup**: policy check → provider creates the account → profile stored
//! 2. **Login**: ID token verified, or email/password signed in → account and profile returned
//! 3. **Me**: bearer token verified → account and profile returned
//!
//! # Roles
//!
//! Self-service signup creates `pet_owner` accounts. `veterinarian` and
//! `admin` accounts can only be created by a caller whose profile role is
//! `admin`.

/// Identity provider interface
pub mod identity;

/// Account profiles
pub mod profiles;

/// Signup rules
pub mod policy;

/// HTTP handlers
pub mod handlers;

pub use handlers::{get_me, login, password_reset, signup};
pub use identity::{Account, IdentityError, IdentityProvider, Session};
pub use policy::SignupPolicy;
pub use profiles::{Profile, ProfileError, ProfileStore, Role};
