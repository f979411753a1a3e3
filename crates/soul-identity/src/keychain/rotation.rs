//! Key rotation statements.
//!
//! A rotation hands authority from one key to the next. It is always signed
//! by the outgoing key: only the key being replaced may name its successor.

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};

use crate::canonical;
use crate::crypto::keys::{public_key_from_hex, public_key_to_hex, Ed25519KeyPair};
use crate::crypto::signing;
use crate::error::{IdentityError, Result};
use crate::identity::AgentId;

/// Reason for key rotation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RotationReason {
    Scheduled,
    Compromised,
    DeviceLost,
    PolicyRequired,
    Manual,
}

impl RotationReason {
    /// Return a stable string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Compromised => "compromised",
            Self::DeviceLost => "device_lost",
            Self::PolicyRequired => "policy_required",
            Self::Manual => "manual",
        }
    }

    /// Does this reason say the outgoing key may be in someone else's hands?
    ///
    /// Such a key stops vouching for anything once the rotation is in the
    /// chain, whatever timestamp a statement signed by it claims.
    pub fn exposes_key(&self) -> bool {
        matches!(self, Self::Compromised | Self::DeviceLost)
    }
}

impl std::str::FromStr for RotationReason {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "compromised" => Ok(Self::Compromised),
            "device_lost" => Ok(Self::DeviceLost),
            "policy_required" => Ok(Self::PolicyRequired),
            "manual" => Ok(Self::Manual),
            other => Err(IdentityError::InvalidEncoding(format!(
                "unknown rotation reason '{other}'"
            ))),
        }
    }
}

/// Signed handoff from `previous_key` to `new_key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyRotation {
    /// Outgoing key, lowercase hex.
    pub previous_key: String,
    /// Incoming key, lowercase hex.
    pub new_key: String,
    /// Permanent identifier of the identity being rotated.
    pub identifier: AgentId,
    pub timestamp: String,
    pub reason: RotationReason,
    /// Base64 signature by `previous_key` over the rest of the statement.
    pub signature: String,
}

impl KeyRotation {
    /// Create a rotation signed by the outgoing key pair.
    pub fn create(
        old_key_pair: &Ed25519KeyPair,
        new_key: &VerifyingKey,
        identifier: &AgentId,
        reason: RotationReason,
    ) -> Result<Self> {
        if new_key == old_key_pair.verifying_key() {
            return Err(IdentityError::InvalidKey(
                "rotation must introduce a different key".into(),
            ));
        }

        let mut rotation = Self {
            previous_key: old_key_pair.public_key_hex(),
            new_key: public_key_to_hex(new_key),
            identifier: identifier.clone(),
            timestamp: crate::time::now_iso8601(),
            reason,
            signature: String::new(),
        };
        let payload = rotation.signing_payload()?;
        rotation.signature = signing::sign_to_base64(old_key_pair.signing_key(), &payload);

        log::debug!(
            "rotation for {}: {} -> {} ({})",
            identifier,
            rotation.previous_key,
            rotation.new_key,
            reason.as_str()
        );
        Ok(rotation)
    }

    fn signing_payload(&self) -> Result<Vec<u8>> {
        canonical::canonical_bytes_without(self, &["signature"])
    }

    /// Check the signature against `previous_key`.
    ///
    /// Also false when either key is not a well-formed public key.
    pub fn verify(&self) -> bool {
        let Ok(previous) = public_key_from_hex(&self.previous_key) else {
            return false;
        };
        if public_key_from_hex(&self.new_key).is_err() {
            return false;
        }
        match self.signing_payload() {
            Ok(payload) => signing::verify_from_base64(&previous, &payload, &self.signature),
            Err(_) => false,
        }
    }
}

/// Create a rotation statement signed by `old_key_pair`.
pub fn create_rotation(
    old_key_pair: &Ed25519KeyPair,
    new_key: &VerifyingKey,
    identifier: &AgentId,
    reason: RotationReason,
) -> Result<KeyRotation> {
    KeyRotation::create(old_key_pair, new_key, identifier, reason)
}

/// Verify a rotation statement against the key it names as previous.
pub fn verify_rotation(rotation: &KeyRotation) -> bool {
    rotation.verify()
}
