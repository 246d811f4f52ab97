use thiserror::Error;

use crate::site::SiteId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Membership error: {0}")]
    Membership(#[from] MembershipError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// A required input (email or password) was missing
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Unknown email and wrong password both surface as this variant
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Password hash error: {0}")]
    PasswordHash(String),
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Invalid token")]
    InvalidToken,

    #[error("No account found for token {0}")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum MembershipError {
    #[error("cannot remove last administrator of site {site_id}")]
    LastAdministrator { site_id: SiteId },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Record not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Invalid locale: {0}")]
    InvalidLocale(String),

    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Coarse classification of an [`Error`], suitable for mapping to responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidRequest,
    InvalidCredentials,
    InvalidToken,
    NotFound,
    InvariantViolation,
    Persistence,
    Validation,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Auth(AuthError::InvalidRequest(_)) => ErrorKind::InvalidRequest,
            Error::Auth(AuthError::InvalidCredentials) => ErrorKind::InvalidCredentials,
            // A hash we cannot parse is a storage-side problem, not a caller mistake
            Error::Auth(AuthError::PasswordHash(_)) => ErrorKind::Persistence,
            Error::Token(TokenError::InvalidToken) => ErrorKind::InvalidToken,
            Error::Token(TokenError::NotFound(_)) => ErrorKind::NotFound,
            Error::Membership(MembershipError::LastAdministrator { .. }) => {
                ErrorKind::InvariantViolation
            }
            Error::Storage(_) => ErrorKind::Persistence,
            Error::Validation(_) => ErrorKind::Validation,
        }
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub fn is_invariant_violation(&self) -> bool {
        self.kind() == ErrorKind::InvariantViolation
    }
}
