//! Key revocation statements.
//!
//! A revocation is only as trustworthy as the key that signed it, and which
//! keys carry that authority is the verifier's policy. Statements therefore
//! arrive as [`KeyRevocation`] and only become a [`VerifiedRevocation`] after
//! a signature check against an authority key the caller names. Revocation
//! lookups only ever consult the verified form.

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::canonical;
use crate::crypto::keys::{public_key_from_hex, public_key_to_hex, Ed25519KeyPair};
use crate::crypto::signing;
use crate::error::Result;
use crate::identity::AgentId;

/// A revocation statement as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyRevocation {
    /// Revoked key, lowercase hex.
    pub revoked_key: String,
    pub identifier: AgentId,
    pub timestamp: String,
    /// Free-text reason.
    pub reason: String,
    /// Base64 signature by the revoking key.
    pub signature: String,
}

impl KeyRevocation {
    /// Create a revocation of `revoked_key` signed by `revoker`.
    ///
    /// Fails if `revoked_key` is not a well-formed hex public key.
    pub fn create(
        revoker: &Ed25519KeyPair,
        revoked_key: &str,
        identifier: &AgentId,
        reason: impl Into<String>,
    ) -> Result<Self> {
        let revoked = public_key_from_hex(revoked_key)?;
        let mut revocation = Self {
            revoked_key: public_key_to_hex(&revoked),
            identifier: identifier.clone(),
            timestamp: crate::time::now_iso8601(),
            reason: reason.into(),
            signature: String::new(),
        };
        let payload = revocation.signing_payload()?;
        revocation.signature = signing::sign_to_base64(revoker.signing_key(), &payload);

        log::debug!(
            "revocation of {} for {} signed by {}",
            revocation.revoked_key,
            identifier,
            revoker.public_key_hex()
        );
        Ok(revocation)
    }

    fn signing_payload(&self) -> Result<Vec<u8>> {
        canonical::canonical_bytes_without(self, &["signature"])
    }

    /// Check the signature against a caller-chosen authority key.
    pub fn verify(&self, authority: &VerifyingKey) -> bool {
        match self.signing_payload() {
            Ok(payload) => signing::verify_from_base64(authority, &payload, &self.signature),
            Err(_) => false,
        }
    }

    /// Upgrade to a [`VerifiedRevocation`] if `authority` signed this statement.
    pub fn into_verified(self, authority: &VerifyingKey) -> Option<VerifiedRevocation> {
        if !self.verify(authority) {
            log::debug!(
                "revocation of {} not signed by {}",
                self.revoked_key,
                public_key_to_hex(authority)
            );
            return None;
        }
        Some(VerifiedRevocation {
            statement: self,
            authority: public_key_to_hex(authority),
        })
    }

    /// Verify against the first matching key of `authorities`, falling back
    /// to an unverified entry when none signed it.
    pub fn verify_against(self, authorities: &[VerifyingKey]) -> RevocationEntry {
        match authorities.iter().find(|k| self.verify(k)) {
            Some(authority) => RevocationEntry::Verified(VerifiedRevocation {
                authority: public_key_to_hex(authority),
                statement: self,
            }),
            None => RevocationEntry::Unverified(self),
        }
    }
}

/// A revocation whose signature has been checked against `authority`.
///
/// Only a successful signature check in this module constructs this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedRevocation {
    statement: KeyRevocation,
    authority: String,
}

impl VerifiedRevocation {
    pub fn statement(&self) -> &KeyRevocation {
        &self.statement
    }

    /// Hex key that signed the statement.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn revoked_key(&self) -> &str {
        &self.statement.revoked_key
    }

    pub fn into_statement(self) -> KeyRevocation {
        self.statement
    }
}

/// A revocation held by a key chain.
///
/// Serializes as the bare statement. Deserialization always yields
/// `Unverified`: verification status never travels over the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevocationEntry {
    Unverified(KeyRevocation),
    Verified(VerifiedRevocation),
}

impl RevocationEntry {
    pub fn statement(&self) -> &KeyRevocation {
        match self {
            Self::Unverified(s) => s,
            Self::Verified(v) => v.statement(),
        }
    }

    pub fn verified(&self) -> Option<&VerifiedRevocation> {
        match self {
            Self::Verified(v) => Some(v),
            Self::Unverified(_) => None,
        }
    }
}

impl From<KeyRevocation> for RevocationEntry {
    fn from(statement: KeyRevocation) -> Self {
        Self::Unverified(statement)
    }
}

impl From<VerifiedRevocation> for RevocationEntry {
    fn from(verified: VerifiedRevocation) -> Self {
        Self::Verified(verified)
    }
}

impl Serialize for RevocationEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.statement().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RevocationEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        KeyRevocation::deserialize(deserializer).map(Self::Unverified)
    }
}

/// Create a revocation of `revoked_key` signed by `revoker`.
pub fn create_revocation(
    revoker: &Ed25519KeyPair,
    revoked_key: &str,
    identifier: &AgentId,
    reason: impl Into<String>,
) -> Result<KeyRevocation> {
    KeyRevocation::create(revoker, revoked_key, identifier, reason)
}

/// Verify a revocation against the key the caller treats as authoritative.
pub fn verify_revocation(revocation: &KeyRevocation, authority: &VerifyingKey) -> bool {
    revocation.verify(authority)
}
