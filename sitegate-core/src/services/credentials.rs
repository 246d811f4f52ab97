use crate::{
    Error,
    account::{AccountId, Authenticatable},
    error::AuthError,
    repositories::PasswordRepository,
    validation::validate_password,
};
use async_trait::async_trait;
use password_auth::VerifyError;
use std::sync::{Arc, LazyLock};

/// Hash checked when the account does not exist, so that a miss costs the same
/// as a wrong password
static ABSENT_ACCOUNT_HASH: LazyLock<String> =
    LazyLock::new(|| password_auth::generate_hash("no account has this password"));

/// Checks a plaintext password against an account's stored credential
#[async_trait]
pub trait PasswordVerifier: Send + Sync + 'static {
    /// Returns `Ok(false)` on mismatch, including when no credential is stored
    async fn verify(&self, account: &dyn Authenticatable, password: &str) -> Result<bool, Error>;

    /// Spend the effort of a verification for a login with no matching account
    async fn verify_absent(&self, _password: &str) {}
}

/// [`PasswordVerifier`] over argon2 hashes kept in a [`PasswordRepository`]
pub struct HashedPasswordVerifier<P: PasswordRepository> {
    repository: Arc<P>,
}

impl<P: PasswordRepository> HashedPasswordVerifier<P> {
    pub fn new(repository: Arc<P>) -> Self {
        Self { repository }
    }

    /// Validate, hash and store a new password for the account
    pub async fn set_password(&self, account_id: &AccountId, password: &str) -> Result<(), Error> {
        validate_password(password)?;

        let hash = hash_password(password);
        self.repository.set_password_hash(account_id, &hash).await
    }
}

#[async_trait]
impl<P: PasswordRepository> PasswordVerifier for HashedPasswordVerifier<P> {
    async fn verify(&self, account: &dyn Authenticatable, password: &str) -> Result<bool, Error> {
        let Some(hash) = self
            .repository
            .get_password_hash(account.account_id())
            .await?
        else {
            return Ok(false);
        };

        // argon2 verification compares digests in constant time
        match password_auth::verify_password(password, &hash) {
            Ok(()) => Ok(true),
            Err(VerifyError::Parse(e)) => {
                tracing::error!(
                    account_id = %account.account_id(),
                    error = %e,
                    "Stored password hash is unreadable"
                );
                Err(Error::Auth(AuthError::PasswordHash(e.to_string())))
            }
            Err(_) => Ok(false),
        }
    }

    async fn verify_absent(&self, password: &str) {
        let _ = password_auth::verify_password(password, &ABSENT_ACCOUNT_HASH);
    }
}

/// Hash a password using argon2 with a random salt
pub fn hash_password(password: &str) -> String {
    password_auth::generate_hash(password)
}
