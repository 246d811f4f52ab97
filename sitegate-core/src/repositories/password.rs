use crate::{Error, account::AccountId};
use async_trait::async_trait;

/// Repository for password hash storage
#[async_trait]
pub trait PasswordRepository: Send + Sync + 'static {
    async fn set_password_hash(&self, account_id: &AccountId, hash: &str) -> Result<(), Error>;

    async fn get_password_hash(&self, account_id: &AccountId) -> Result<Option<String>, Error>;
}
