//! Opaque tokens and their generation
//!
//! A [`Token`] is the value handed to API callers (API tokens) or used for a
//! cross-site hand-off (switch-site tokens). Tokens are generated through the
//! [`TokenGenerator`] trait so tests and deployments can swap the source.
use serde::{Deserialize, Serialize};

use crate::crypto::{self, MIN_TOKEN_BYTES};

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn new(token: &str) -> Self {
        Token(token.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Return a copy with `/` replaced and trailing `=` stripped
    pub fn sanitized(&self) -> Self {
        Token(crypto::sanitize_token(&self.0))
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Keep secrets out of debug logs
impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix: String = self.0.chars().take(4).collect();
        write!(f, "Token({prefix}...)")
    }
}

/// Source of fresh tokens
pub trait TokenGenerator: Send + Sync + 'static {
    /// Produce a new token with at least 64 bits of entropy
    fn generate(&self) -> Token;
}

/// [`TokenGenerator`] backed by the OS random number generator
#[derive(Debug, Clone)]
pub struct RandomTokenGenerator {
    bytes: usize,
}

impl RandomTokenGenerator {
    pub fn new(bytes: usize) -> Self {
        Self {
            bytes: bytes.max(MIN_TOKEN_BYTES),
        }
    }

    pub fn bytes(&self) -> usize {
        self.bytes
    }
}

impl Default for RandomTokenGenerator {
    fn default() -> Self {
        Self::new(32)
    }
}

impl TokenGenerator for RandomTokenGenerator {
    fn generate(&self) -> Token {
        Token(crypto::generate_token(self.bytes))
    }
}
