//! Accounts and their capabilities
//!
//! An [`Account`] is the identity that logs into one or more sites. The fields
//! this crate manipulates are:
//!
//! | Field                          | Type               | Description                                          |
//! | ------------------------------ | ------------------ | ---------------------------------------------------- |
//! | `id`                           | `AccountId`        | Stable opaque identifier.                            |
//! | `email`                        | `String`           | Unique, always stored lowercase.                     |
//! | `name`                         | `String`           | Display name, never blank.                           |
//! | `locale`                       | `String`           | Preferred locale, defaults from [`AccountConfig`].   |
//! | `api_token`                    | `Option<Token>`    | Token presented by API callers, unique when present. |
//! | `switch_site_token`            | `Option<Token>`    | Short-lived token for cross-site hand-off.           |
//! | `switch_site_token_updated_at` | `Option<DateTime>` | When the switch-site token was last reset.           |
//! | `confirmed_at`                 | `Option<DateTime>` | When the account confirmed its email.                |
//!
//! Tokens are never serialized, so an `Account` can be handed to a presenter
//! as-is.
//!
//! [`AccountConfig`]: crate::config::AccountConfig
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    config::DEFAULT_LOCALE,
    crypto::constant_time_compare,
    error::ValidationError,
    id::{generate_prefixed_id, validate_prefixed_id},
    token::Token,
    validation::{normalize_email, validate_email, validate_locale, validate_name},
};

/// A unique, stable identifier for an account
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: &str) -> Self {
        AccountId(id.to_string())
    }

    pub fn new_random() -> Self {
        AccountId(generate_prefixed_id("acc"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        validate_prefixed_id(&self.0, "acc")
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new_random()
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Something that can log in with an email and a secret
pub trait Authenticatable: Send + Sync {
    fn account_id(&self) -> &AccountId;

    fn email(&self) -> &str;

    /// The API token currently issued, if any
    fn authentication_token(&self) -> Option<&Token>;
}

/// Something whose email address can be confirmed
pub trait Confirmable {
    fn confirmed_at(&self) -> Option<DateTime<Utc>>;

    fn is_confirmed(&self) -> bool {
        self.confirmed_at().is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub email: String,
    pub name: String,
    pub locale: String,

    #[serde(skip_serializing)]
    pub api_token: Option<Token>,

    #[serde(skip_serializing)]
    pub switch_site_token: Option<Token>,

    pub switch_site_token_updated_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn builder() -> AccountBuilder {
        AccountBuilder::default()
    }

    pub fn has_api_token(&self) -> bool {
        self.api_token.is_some()
    }

    /// Whether `token` is this account's switch-site token and was reset no
    /// longer than `max_age` before `now`
    pub fn switch_site_token_matches(
        &self,
        token: &str,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> bool {
        if token.is_empty() {
            return false;
        }

        let matches = self
            .switch_site_token
            .as_ref()
            .is_some_and(|t| constant_time_compare(t.as_str().as_bytes(), token.as_bytes()));

        matches
            && self
                .switch_site_token_updated_at
                .is_some_and(|at| now - at <= max_age)
    }
}

impl Authenticatable for Account {
    fn account_id(&self) -> &AccountId {
        &self.id
    }

    fn email(&self) -> &str {
        &self.email
    }

    fn authentication_token(&self) -> Option<&Token> {
        self.api_token.as_ref()
    }
}

impl Confirmable for Account {
    fn confirmed_at(&self) -> Option<DateTime<Utc>> {
        self.confirmed_at
    }
}

/// Builder used by storage backends to rehydrate an [`Account`]
#[derive(Default)]
pub struct AccountBuilder {
    id: Option<AccountId>,
    email: Option<String>,
    name: Option<String>,
    locale: Option<String>,
    api_token: Option<Token>,
    switch_site_token: Option<Token>,
    switch_site_token_updated_at: Option<DateTime<Utc>>,
    confirmed_at: Option<DateTime<Utc>>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl AccountBuilder {
    pub fn id(mut self, id: AccountId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn email(mut self, email: String) -> Self {
        self.email = Some(email);
        self
    }

    pub fn name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    pub fn locale(mut self, locale: String) -> Self {
        self.locale = Some(locale);
        self
    }

    pub fn api_token(mut self, token: Option<Token>) -> Self {
        self.api_token = token;
        self
    }

    pub fn switch_site_token(mut self, token: Option<Token>) -> Self {
        self.switch_site_token = token;
        self
    }

    pub fn switch_site_token_updated_at(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.switch_site_token_updated_at = at;
        self
    }

    pub fn confirmed_at(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.confirmed_at = at;
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    pub fn updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }

    pub fn build(self) -> Result<Account, Error> {
        let now = Utc::now();
        Ok(Account {
            id: self.id.unwrap_or_default(),
            email: self.email.ok_or(ValidationError::MissingField(
                "Email is required".to_string(),
            ))?,
            name: self.name.ok_or(ValidationError::MissingField(
                "Name is required".to_string(),
            ))?,
            locale: self.locale.unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
            api_token: self.api_token,
            switch_site_token: self.switch_site_token,
            switch_site_token_updated_at: self.switch_site_token_updated_at,
            confirmed_at: self.confirmed_at,
            created_at: self.created_at.unwrap_or(now),
            updated_at: self.updated_at.unwrap_or(now),
        })
    }
}

/// A validated account waiting to be stored
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub id: AccountId,
    pub email: String,
    pub name: String,
    pub locale: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl NewAccount {
    pub fn builder() -> NewAccountBuilder {
        NewAccountBuilder::default()
    }

    /// Fill in `locale` when the caller did not choose one
    pub fn with_default_locale(mut self, locale: &str) -> Self {
        if self.locale.is_none() {
            self.locale = Some(locale.to_string());
        }
        self
    }
}

#[derive(Default)]
pub struct NewAccountBuilder {
    id: Option<AccountId>,
    email: Option<String>,
    name: Option<String>,
    locale: Option<String>,
    confirmed_at: Option<DateTime<Utc>>,
}

impl NewAccountBuilder {
    pub fn id(mut self, id: AccountId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn confirmed_at(mut self, at: DateTime<Utc>) -> Self {
        self.confirmed_at = Some(at);
        self
    }

    /// Validate and normalize the account
    ///
    /// The email is lowercased, the name must not be blank and an explicit
    /// locale must look like a language tag.
    pub fn build(self) -> Result<NewAccount, Error> {
        let email = normalize_email(&self.email.unwrap_or_default());
        validate_email(&email)?;

        let name = self.name.unwrap_or_default().trim().to_string();
        validate_name(&name)?;

        if let Some(locale) = &self.locale {
            validate_locale(locale)?;
        }

        Ok(NewAccount {
            id: self.id.unwrap_or_default(),
            email,
            name,
            locale: self.locale,
            confirmed_at: self.confirmed_at,
        })
    }
}
