//! Service layer for business logic
//!
//! Services own the rules; repositories only store and fetch.

pub mod account_auth;
pub mod credentials;
pub mod directory;
pub mod membership;

pub use account_auth::AccountAuthService;
pub use credentials::{HashedPasswordVerifier, PasswordVerifier, hash_password};
pub use directory::AccountDirectory;
pub use membership::SiteMembershipRegistry;
