//! Account service configuration
//!
//! [`AccountConfig`] is passed explicitly to the services that need it. It can
//! be deserialized from a config file or read from the environment with
//! [`AccountConfig::from_env`].
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::crypto::MIN_TOKEN_BYTES;

pub const DEFAULT_LOCALE: &str = "en";
pub const DEFAULT_SWITCH_SITE_TOKEN_MAX_AGE_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    /// Locale given to accounts created without one
    pub default_locale: String,

    /// How long a switch-site token stays usable when the caller gives no max age
    #[serde(with = "duration_secs")]
    pub switch_site_token_max_age: Duration,

    /// Random bytes in a freshly generated API token
    pub api_token_bytes: usize,

    /// Random bytes in a freshly generated switch-site token
    pub switch_site_token_bytes: usize,

    /// Refuse API tokens to accounts that have not confirmed their email
    pub require_confirmation: bool,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            default_locale: DEFAULT_LOCALE.to_string(),
            switch_site_token_max_age: Duration::seconds(DEFAULT_SWITCH_SITE_TOKEN_MAX_AGE_SECS),
            api_token_bytes: 32,
            switch_site_token_bytes: 16,
            require_confirmation: false,
        }
    }
}

impl AccountConfig {
    /// Build a config from `SITEGATE_*` environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    ///
    /// Values that do not parse or are out of range keep the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            default_locale: lookup("SITEGATE_DEFAULT_LOCALE")
                .filter(|l| !l.trim().is_empty())
                .unwrap_or(defaults.default_locale),
            switch_site_token_max_age: lookup("SITEGATE_SWITCH_SITE_TOKEN_MAX_AGE_SECS")
                .and_then(|s| s.parse::<i64>().ok())
                .filter(|s| *s > 0)
                .and_then(Duration::try_seconds)
                .unwrap_or(defaults.switch_site_token_max_age),
            api_token_bytes: lookup("SITEGATE_API_TOKEN_BYTES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.api_token_bytes)
                .max(MIN_TOKEN_BYTES),
            switch_site_token_bytes: lookup("SITEGATE_SWITCH_SITE_TOKEN_BYTES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.switch_site_token_bytes)
                .max(MIN_TOKEN_BYTES),
            require_confirmation: lookup("SITEGATE_REQUIRE_CONFIRMATION")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.require_confirmation),
        }
    }

    pub fn default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = locale.into();
        self
    }

    pub fn switch_site_token_max_age(mut self, max_age: Duration) -> Self {
        self.switch_site_token_max_age = max_age;
        self
    }

    pub fn api_token_bytes(mut self, bytes: usize) -> Self {
        self.api_token_bytes = bytes.max(MIN_TOKEN_BYTES);
        self
    }

    pub fn switch_site_token_bytes(mut self, bytes: usize) -> Self {
        self.switch_site_token_bytes = bytes.max(MIN_TOKEN_BYTES);
        self
    }

    pub fn require_confirmation(mut self, require: bool) -> Self {
        self.require_confirmation = require;
        self
    }
}

mod duration_secs {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(d.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = i64::deserialize(d)?;
        Duration::try_seconds(secs)
            .ok_or_else(|| D::Error::custom(format!("duration of {secs} seconds is out of range")))
    }
}
