//! Error types for soul-identity.
//!
//! Only construction and parsing can fail. Verification never returns an
//! error: an invalid signature, document, attestation or chain is reported as
//! `false` or as a field of a verification result.
//! Private key material is never included in error messages.

/// Identity error types covering all fallible operations.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Key mismatch: {0}")]
    KeyMismatch(String),

    #[error("Invalid key chain: {0}")]
    InvalidChain(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl IdentityError {
    /// True for malformed-input errors (bad identifier, hex, base64 or digest).
    ///
    /// These are always recoverable by rejecting the input.
    pub fn is_format_error(&self) -> bool {
        matches!(self, Self::InvalidIdentifier(_) | Self::InvalidEncoding(_))
    }
}

impl From<serde_json::Error> for IdentityError {
    fn from(e: serde_json::Error) -> Self {
        Self::SerializationError(e.to_string())
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, IdentityError>;
