//! Key chain — the custody history of one identity.
//!
//! A chain is rooted at the original key (from which the permanent
//! identifier is derived) and lists every rotation in order. It is an
//! immutable value: rotating or revoking produces a new chain.
//!
//! A chain is never trusted because it was presented as one. Verifiers walk
//! it link by link with [`verify_key_chain`]; the first bad link ends the
//! walk and nothing past it counts.

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};

use crate::crypto::keys::{public_key_from_hex, public_key_to_hex, Ed25519KeyPair};
use crate::error::{IdentityError, Result};
use crate::identity::AgentId;

use super::revocation::{KeyRevocation, RevocationEntry, VerifiedRevocation};
use super::rotation::{KeyRotation, RotationReason};

/// Ordered rotation history plus revocations, rooted at an original key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyChain {
    /// Original key, lowercase hex.
    pub original_key: String,
    /// Stated current key, lowercase hex.
    pub current_key: String,
    pub rotations: Vec<KeyRotation>,
    #[serde(default)]
    pub revocations: Vec<RevocationEntry>,
}

/// Why a chain failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainBreak {
    /// The original key is not a well-formed public key.
    MalformedOrigin,
    /// A rotation's previous key is not the key the chain had reached
    /// (a link was inserted, reordered or omitted).
    Discontinuous,
    /// A rotation names a different identity.
    ForeignIdentity,
    /// A rotation is not signed by the key it replaces.
    BadSignature,
    /// Every link holds but the stated current key is not where they lead.
    CurrentKeyMismatch,
}

impl std::fmt::Display for ChainBreak {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::MalformedOrigin => "malformed original key",
            Self::Discontinuous => "discontinuous rotation",
            Self::ForeignIdentity => "rotation for a different identity",
            Self::BadSignature => "rotation not signed by the replaced key",
            Self::CurrentKeyMismatch => "stated current key not reached",
        };
        f.write_str(s)
    }
}

/// Result of walking a key chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainVerification {
    pub valid: bool,
    /// Last key reached through valid links, lowercase hex.
    pub current_key: String,
    /// Zero-based index of the first bad rotation.
    pub broken_at: Option<usize>,
    pub failure: Option<ChainBreak>,
}

impl KeyChain {
    /// A chain with no history.
    pub fn new(original_key: &VerifyingKey) -> Self {
        let hex = public_key_to_hex(original_key);
        Self {
            original_key: hex.clone(),
            current_key: hex,
            rotations: Vec::new(),
            revocations: Vec::new(),
        }
    }

    /// Permanent identifier, derived from the original key.
    pub fn identifier(&self) -> Result<AgentId> {
        let key = public_key_from_hex(&self.original_key)?;
        Ok(AgentId::from_verifying_key(&key))
    }

    /// Every key named by the chain, original first, as hex.
    pub fn keys(&self) -> Vec<String> {
        std::iter::once(self.original_key.clone())
            .chain(self.rotations.iter().map(|r| r.new_key.clone()))
            .collect()
    }

    /// Parse the stated current key.
    pub fn current_verifying_key(&self) -> Result<VerifyingKey> {
        public_key_from_hex(&self.current_key)
    }

    /// Ensure `key_pair` may sign for this chain: the chain must verify and
    /// the pair must hold its current key. Returns the chain's identifier.
    pub fn check_signer(&self, key_pair: &Ed25519KeyPair) -> Result<AgentId> {
        let verification = verify_key_chain(self);
        if !verification.valid {
            let reason = verification
                .failure
                .map(|f| f.to_string())
                .unwrap_or_else(|| "unknown failure".into());
            return Err(IdentityError::InvalidChain(match verification.broken_at {
                Some(i) => format!("{reason} at rotation {i}"),
                None => reason,
            }));
        }
        if key_pair.public_key_hex() != self.current_key {
            return Err(IdentityError::KeyMismatch(
                "key pair does not hold the chain's current key".into(),
            ));
        }
        self.identifier()
    }

    /// The key currently authorized to sign for `id`, if this chain is
    /// valid, belongs to `id`, and its current key is not revoked.
    pub fn active_key_for(&self, id: &AgentId) -> Option<VerifyingKey> {
        let verification = verify_key_chain(self);
        if !verification.valid || self.identifier().ok().as_ref() != Some(id) {
            return None;
        }
        if self.is_key_revoked(&verification.current_key) {
            log::warn!("current key of {id} is revoked");
            return None;
        }
        public_key_from_hex(&verification.current_key).ok()
    }

    /// Hand over from `current` to `new_key`, returning the extended chain.
    pub fn rotate(
        &self,
        current: &Ed25519KeyPair,
        new_key: &VerifyingKey,
        reason: RotationReason,
    ) -> Result<KeyChain> {
        if current.public_key_hex() != self.current_key {
            return Err(IdentityError::KeyMismatch(
                "only the current key may authorize a rotation".into(),
            ));
        }
        let identifier = self.identifier()?;
        let rotation = KeyRotation::create(current, new_key, &identifier, reason)?;

        let mut next = self.clone();
        next.current_key = rotation.new_key.clone();
        next.rotations.push(rotation);
        Ok(next)
    }

    /// Revoke `revoked_key` under the authority of `revoker`.
    ///
    /// The new entry is verified against the revoker's own key on the way in.
    pub fn revoke(
        &self,
        revoker: &Ed25519KeyPair,
        revoked_key: &str,
        reason: impl Into<String>,
    ) -> Result<KeyChain> {
        let identifier = self.identifier()?;
        let statement = KeyRevocation::create(revoker, revoked_key, &identifier, reason)?;
        let verified = statement
            .into_verified(revoker.verifying_key())
            .ok_or_else(|| IdentityError::InvalidKey("revocation failed self-check".into()))?;

        let mut next = self.clone();
        next.revocations.push(verified.into());
        Ok(next)
    }

    /// Verify every unverified revocation against `authorities`.
    ///
    /// An entry is upgraded when one of the authority keys signed it and it
    /// names this chain's identifier; anything else stays unverified and
    /// keeps being ignored by [`KeyChain::is_key_revoked`].
    pub fn verify_revocations(self, authorities: &[VerifyingKey]) -> KeyChain {
        let identifier = self.identifier().ok();
        let revocations = self
            .revocations
            .into_iter()
            .map(|entry| match entry {
                RevocationEntry::Unverified(statement)
                    if identifier.as_ref() == Some(&statement.identifier) =>
                {
                    statement.verify_against(authorities)
                }
                other => other,
            })
            .collect();
        KeyChain {
            revocations,
            ..self
        }
    }

    /// Verified revocations only.
    pub fn verified_revocations(&self) -> impl Iterator<Item = &VerifiedRevocation> {
        self.revocations.iter().filter_map(RevocationEntry::verified)
    }

    /// Is `key_hex` covered by a verified revocation?
    ///
    /// Unverified entries never count.
    pub fn is_key_revoked(&self, key_hex: &str) -> bool {
        self.verified_revocations()
            .any(|r| r.revoked_key().eq_ignore_ascii_case(key_hex))
    }

    /// Was `key_hex` rotated out because it was compromised or lost?
    pub fn is_key_exposed(&self, key_hex: &str) -> bool {
        self.rotations
            .iter()
            .any(|r| r.reason.exposes_key() && r.previous_key.eq_ignore_ascii_case(key_hex))
    }

    /// Keys of a valid chain that still vouch for statements they signed:
    /// neither revoked nor retired as exposed. Empty for a broken chain.
    pub fn trusted_keys(&self) -> Vec<VerifyingKey> {
        if !verify_key_chain(self).valid {
            return Vec::new();
        }
        self.keys()
            .iter()
            .filter(|hex| !self.is_key_revoked(hex) && !self.is_key_exposed(hex))
            .filter_map(|hex| public_key_from_hex(hex).ok())
            .collect()
    }

    /// Verify revocations against the chain's own current key.
    ///
    /// Superseded keys carry no authority, so a leaked old key cannot revoke
    /// its successor. Nothing is upgraded when the chain does not verify.
    pub fn verify_own_revocations(self) -> KeyChain {
        let verification = verify_key_chain(&self);
        if !verification.valid {
            return self;
        }
        match public_key_from_hex(&verification.current_key) {
            Ok(current) => self.verify_revocations(&[current]),
            Err(_) => self,
        }
    }
}

/// Assemble a chain without validating it.
///
/// `current_key` is the last rotation's new key, or the original key when
/// there are no rotations.
pub fn build_key_chain<R>(
    original_key: &VerifyingKey,
    rotations: Vec<KeyRotation>,
    revocations: impl IntoIterator<Item = R>,
) -> KeyChain
where
    R: Into<RevocationEntry>,
{
    let original_hex = public_key_to_hex(original_key);
    let current_key = rotations
        .last()
        .map(|r| r.new_key.clone())
        .unwrap_or_else(|| original_hex.clone());
    KeyChain {
        original_key: original_hex,
        current_key,
        rotations,
        revocations: revocations.into_iter().map(Into::into).collect(),
    }
}

/// Walk the rotation sequence from the original key.
///
/// Each rotation must continue from the key the walk has reached, name this
/// chain's identity, and be signed by the key it replaces. The first failure
/// stops the walk and is reported with its index and the last good key.
pub fn verify_key_chain(chain: &KeyChain) -> ChainVerification {
    let broken = |at: Option<usize>, failure: ChainBreak, key: &str| ChainVerification {
        valid: false,
        current_key: key.to_string(),
        broken_at: at,
        failure: Some(failure),
    };

    let identifier = match chain.identifier() {
        Ok(id) => id,
        Err(_) => return broken(None, ChainBreak::MalformedOrigin, &chain.original_key),
    };

    let mut expected_previous = chain.original_key.as_str();
    for (i, rotation) in chain.rotations.iter().enumerate() {
        let failure = if rotation.previous_key != expected_previous {
            Some(ChainBreak::Discontinuous)
        } else if rotation.identifier != identifier {
            Some(ChainBreak::ForeignIdentity)
        } else if !rotation.verify() {
            Some(ChainBreak::BadSignature)
        } else {
            None
        };
        if let Some(failure) = failure {
            log::warn!("key chain for {identifier} broken at rotation {i}: {failure}");
            return broken(Some(i), failure, expected_previous);
        }
        expected_previous = rotation.new_key.as_str();
    }

    if chain.current_key != expected_previous {
        log::warn!("key chain for {identifier} states a current key it never reaches");
        return broken(None, ChainBreak::CurrentKeyMismatch, expected_previous);
    }

    ChainVerification {
        valid: true,
        current_key: expected_previous.to_string(),
        broken_at: None,
        failure: None,
    }
}

/// Is `key_hex` covered by a verified revocation in `chain`?
pub fn is_key_revoked(chain: &KeyChain, key_hex: &str) -> bool {
    chain.is_key_revoked(key_hex)
}
