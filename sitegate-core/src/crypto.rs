//! Cryptographic helpers for token handling
//!
//! Tokens are random bytes from the OS RNG encoded as URL-safe base64 without
//! padding, so they never contain `/` or a trailing `=` and can travel in URLs
//! and headers unchanged.
//!
//! Comparisons of secret values go through [`constant_time_compare`] so that
//! timing does not reveal how much of a secret matched.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{TryRngCore, rngs::OsRng};
use subtle::ConstantTimeEq;

/// Fewest random bytes any token may carry (64 bits).
pub const MIN_TOKEN_BYTES: usize = 8;

/// Fill a buffer of `len` bytes from the OS RNG.
///
/// # Panics
///
/// Panics if the OS random number generator fails. This indicates a critical
/// system failure (e.g., /dev/urandom unavailable) from which recovery is not
/// possible for security-sensitive operations.
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut bytes)
        .expect("OS RNG failure - system entropy source unavailable");
    bytes
}

/// Generate a URL-safe random token from at least [`MIN_TOKEN_BYTES`] bytes.
pub fn generate_token(bytes: usize) -> String {
    URL_SAFE_NO_PAD.encode(random_bytes(bytes.max(MIN_TOKEN_BYTES)))
}

/// Rewrite a token so it is free of `/` and trailing `=` padding.
///
/// Tokens from [`generate_token`] already satisfy this; the function exists for
/// tokens produced by other generators using the standard base64 alphabet.
pub fn sanitize_token(raw: &str) -> String {
    raw.replace('/', "_").trim_end_matches('=').to_string()
}

/// Perform constant-time comparison of two byte slices.
///
/// Slices of different length compare unequal immediately; length is not
/// treated as secret.
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_is_url_safe() {
        for _ in 0..200 {
            let token = generate_token(8);
            assert!(!token.contains('/'));
            assert!(!token.ends_with('='));
            assert!(
                token
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            );
        }
    }

    #[test]
    fn test_generate_token_enforces_minimum_entropy() {
        let token = generate_token(2);
        let decoded = URL_SAFE_NO_PAD.decode(&token).unwrap();
        assert_eq!(decoded.len(), MIN_TOKEN_BYTES);
        // 8 bytes encode to 11 characters without padding
        assert_eq!(token.len(), 11);
    }

    #[test]
    fn test_consecutive_tokens_differ() {
        assert_ne!(generate_token(16), generate_token(16));
    }

    #[test]
    fn test_sanitize_token() {
        assert_eq!(sanitize_token("ab/cd=="), "ab_cd");
        assert_eq!(sanitize_token("a/b/c="), "a_b_c");
        assert_eq!(sanitize_token("plain"), "plain");
        // Only trailing padding is removed
        assert_eq!(sanitize_token("a=b"), "a=b");
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare(b"hello", b"hello"));
        assert!(constant_time_compare(b"", b""));
        assert!(!constant_time_compare(b"hello", b"world"));
        assert!(!constant_time_compare(b"short", b"longer_string"));
    }
}
