//! Prefixed identifier generation
//!
//! Identifiers look like `acc_q2Vd...` : a short type prefix, an underscore and
//! 96 bits of URL-safe base64 randomness.

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};

use crate::crypto::random_bytes;

/// Generate a prefixed ID with 96 bits of entropy
pub fn generate_prefixed_id(prefix: &str) -> String {
    let encoded = BASE64_URL_SAFE_NO_PAD.encode(random_bytes(12));
    format!("{prefix}_{encoded}")
}

/// Check that `id` is `{expected_prefix}_` followed by at least 96 bits of base64
pub fn validate_prefixed_id(id: &str, expected_prefix: &str) -> bool {
    let Some(random_part) = id
        .strip_prefix(expected_prefix)
        .and_then(|rest| rest.strip_prefix('_'))
    else {
        return false;
    };

    match BASE64_URL_SAFE_NO_PAD.decode(random_part) {
        Ok(decoded) => decoded.len() >= 12,
        Err(_) => false,
    }
}
