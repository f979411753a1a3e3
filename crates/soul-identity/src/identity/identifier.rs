//! Agent identifiers.
//!
//! Format: `did:soul:` + base58btc of the 32 raw Ed25519 public-key bytes.
//! The encoding is exactly invertible, so a verifier can recover the key
//! from the identifier alone.

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};

use crate::error::{IdentityError, Result};

/// Prefix shared by every identifier.
pub const IDENTIFIER_PREFIX: &str = "did:soul:";

/// Permanent text handle of a logical identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub String);

impl AgentId {
    /// Derive the identifier of a public key.
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        let encoded = bs58::encode(key.as_bytes()).into_string();
        Self(format!("{IDENTIFIER_PREFIX}{encoded}"))
    }

    /// Parse and validate a foreign identifier string.
    pub fn parse(s: &str) -> Result<Self> {
        let id = Self(s.to_string());
        id.to_verifying_key()?;
        Ok(id)
    }

    /// Recover the public key this identifier was derived from.
    pub fn to_verifying_key(&self) -> Result<VerifyingKey> {
        let encoded = self.0.strip_prefix(IDENTIFIER_PREFIX).ok_or_else(|| {
            IdentityError::InvalidIdentifier(format!("missing '{IDENTIFIER_PREFIX}' prefix"))
        })?;
        let bytes = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| IdentityError::InvalidIdentifier(format!("bad base58: {e}")))?;
        let arr: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            IdentityError::InvalidIdentifier(format!("key must be 32 bytes, got {}", b.len()))
        })?;
        VerifyingKey::from_bytes(&arr)
            .map_err(|e| IdentityError::InvalidIdentifier(format!("not an ed25519 point: {e}")))
    }

    /// Verification-method reference for the `n`th key of this identity
    /// (1-based), e.g. `did:soul:...#key-1`.
    pub fn verification_method(&self, n: usize) -> String {
        format!("{}#key-{n}", self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for AgentId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Derive the identifier of a public key.
pub fn derive_identifier(key: &VerifyingKey) -> AgentId {
    AgentId::from_verifying_key(key)
}

/// Invert [`derive_identifier`].
pub fn identifier_to_public_key(id: &AgentId) -> Result<VerifyingKey> {
    id.to_verifying_key()
}
