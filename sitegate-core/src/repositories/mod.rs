//! Repository traits for data access
//!
//! Services talk to storage only through these traits. A storage backend
//! implements each `*Repository` trait, exposes them through the matching
//! `*RepositoryProvider` trait, and ties everything together with
//! [`RepositoryProvider`], which adds migrations and health checks.

pub mod account;
pub mod adapter;
pub mod membership;
pub mod password;

pub use account::AccountRepository;
pub use adapter::{AccountRepositoryAdapter, MembershipRepositoryAdapter, PasswordRepositoryAdapter};
pub use membership::MembershipRepository;
pub use password::PasswordRepository;

use async_trait::async_trait;

use crate::Error;

/// Provider trait for account repository access.
pub trait AccountRepositoryProvider: Send + Sync + 'static {
    type AccountRepo: AccountRepository;

    fn account(&self) -> &Self::AccountRepo;
}

/// Provider trait for membership repository access.
pub trait MembershipRepositoryProvider: Send + Sync + 'static {
    type MembershipRepo: MembershipRepository;

    fn membership(&self) -> &Self::MembershipRepo;
}

/// Provider trait for password hash repository access.
pub trait PasswordRepositoryProvider: Send + Sync + 'static {
    type PasswordRepo: PasswordRepository;

    fn password(&self) -> &Self::PasswordRepo;
}

/// Provider trait that storage implementations must implement to provide all repositories.
///
/// # Implementing a Custom Storage Backend
///
/// ```rust,ignore
/// use sitegate_core::repositories::*;
///
/// struct MyStorage { /* ... */ }
///
/// impl AccountRepositoryProvider for MyStorage {
///     type AccountRepo = MyAccountRepository;
///     fn account(&self) -> &Self::AccountRepo { &self.accounts }
/// }
///
/// // ... implement the other provider traits ...
///
/// #[async_trait]
/// impl RepositoryProvider for MyStorage {
///     async fn migrate(&self) -> Result<(), Error> { /* ... */ }
///     async fn health_check(&self) -> Result<(), Error> { /* ... */ }
/// }
/// ```
#[async_trait]
pub trait RepositoryProvider:
    AccountRepositoryProvider + MembershipRepositoryProvider + PasswordRepositoryProvider
{
    /// Run migrations for all repositories
    async fn migrate(&self) -> Result<(), Error>;

    /// Health check for all repositories
    async fn health_check(&self) -> Result<(), Error>;
}
