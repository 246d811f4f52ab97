//! Core functionality for sitegate
//!
//! This crate holds the account model, the token and membership rules, and the
//! repository traits that storage backends implement.
//!
//! - [`AccountAuthService`] issues and revokes API tokens, resets switch-site
//!   tokens and refuses to remove the last administrator of a site.
//! - [`AccountDirectory`] looks accounts up by email and token.
//! - [`SiteMembershipRegistry`] answers membership and admin-count queries.
//! - [`RepositoryProvider`] is the seam a storage backend implements.
//!
//! [`AccountAuthService`]: services::AccountAuthService
//! [`AccountDirectory`]: services::AccountDirectory
//! [`SiteMembershipRegistry`]: services::SiteMembershipRegistry
pub mod account;
pub mod config;
pub mod crypto;
pub mod error;
pub mod id;
pub mod lock;
pub mod repositories;
pub mod services;
pub mod site;
pub mod token;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

pub use account::{Account, AccountId, Authenticatable, Confirmable, NewAccount};
pub use config::AccountConfig;
pub use error::{Error, ErrorKind};
pub use repositories::RepositoryProvider;
pub use site::{Membership, MembershipId, NewMembership, SiteId};
pub use token::{RandomTokenGenerator, Token, TokenGenerator};
