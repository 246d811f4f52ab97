use crate::error::ValidationError;
use regex::Regex;
use std::sync::LazyLock;

/// Practical subset of RFC 5322, compiled once
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("Invalid email regex pattern")
});

/// Language tag such as `en`, `pt-BR` or `zh_CN`
static LOCALE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z]{2,3}([-_][a-zA-Z0-9]{2,8})*$").expect("Invalid locale regex pattern")
});

/// Lowercase and trim an email so lookups are case-insensitive
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validates an email address
///
/// ```rust
/// use sitegate_core::validation::validate_email;
///
/// assert!(validate_email("user@example.com").is_ok());
/// assert!(validate_email("invalid-email").is_err());
/// ```
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::MissingField(
            "Email is required".to_string(),
        ));
    }

    if email.len() > 254 {
        return Err(ValidationError::InvalidEmail(
            "Email is too long".to_string(),
        ));
    }

    if EMAIL_REGEX.is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(format!(
            "Invalid email format: {email}"
        )))
    }
}

/// Validates an account name: present, not blank, at most 100 characters
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::MissingField(
            "Name is required".to_string(),
        ));
    }

    if name.chars().count() > 100 {
        return Err(ValidationError::InvalidName(
            "Name must be no more than 100 characters long".to_string(),
        ));
    }

    Ok(())
}

/// Validates a password before it is hashed: 8 to 128 characters, not only whitespace
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::MissingField(
            "Password is required".to_string(),
        ));
    }

    if password.trim().is_empty() {
        return Err(ValidationError::InvalidField(
            "Password cannot be only whitespace".to_string(),
        ));
    }

    if password.len() < 8 {
        return Err(ValidationError::InvalidField(
            "Password must be at least 8 characters long".to_string(),
        ));
    }

    if password.len() > 128 {
        return Err(ValidationError::InvalidField(
            "Password must be no more than 128 characters long".to_string(),
        ));
    }

    Ok(())
}

pub fn validate_locale(locale: &str) -> Result<(), ValidationError> {
    if LOCALE_REGEX.is_match(locale) {
        Ok(())
    } else {
        Err(ValidationError::InvalidLocale(locale.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  John@Example.COM "), "john@example.com");
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("first.last+tag@sub.example.org").is_ok());

        assert!(matches!(
            validate_email(""),
            Err(ValidationError::MissingField(_))
        ));
        assert!(matches!(
            validate_email("nope"),
            Err(ValidationError::InvalidEmail(_))
        ));
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(
            validate_email(&long),
            Err(ValidationError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Ada").is_ok());
        assert!(matches!(
            validate_name("   "),
            Err(ValidationError::MissingField(_))
        ));
        assert!(validate_name(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("correct horse").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password("          ").is_err());
        assert!(validate_password(&"p".repeat(129)).is_err());
    }

    #[test]
    fn test_validate_locale() {
        for ok in ["en", "fr", "pt-BR", "zh_CN"] {
            assert!(validate_locale(ok).is_ok(), "{ok}");
        }
        for bad in ["", "e", "english!", "en-"] {
            assert!(validate_locale(bad).is_err(), "{bad}");
        }
    }
}
