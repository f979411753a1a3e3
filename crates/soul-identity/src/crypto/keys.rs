//! Ed25519 key pair generation and public-key encodings.
//!
//! Public keys travel inside key-chain records as lowercase hex of the
//! 32 raw bytes. Identifiers use a different (base58) encoding, see
//! [`crate::identity::AgentId`].

use ed25519_dalek::{SigningKey, VerifyingKey};
use zeroize::Zeroizing;

use crate::error::{IdentityError, Result};

/// An Ed25519 key pair for signing operations.
///
/// The signing key is zeroized on drop. It is never serialized into any
/// record produced by this crate.
pub struct Ed25519KeyPair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl Ed25519KeyPair {
    /// Generate a new random Ed25519 key pair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut rand::thread_rng());
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Reconstruct a key pair from raw signing key bytes.
    pub fn from_signing_key_bytes(bytes: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(bytes);
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Return a reference to the signing key.
    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Return the verifying (public) key.
    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// Return the signing key bytes, wiped when the wrapper is dropped.
    pub fn signing_key_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.signing_key.to_bytes())
    }

    /// Return the verifying key bytes.
    pub fn verifying_key_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// Return the verifying key as lowercase hex.
    pub fn public_key_hex(&self) -> String {
        public_key_to_hex(&self.verifying_key)
    }
}

impl std::fmt::Debug for Ed25519KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519KeyPair")
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

/// Generate a fresh key pair. Consumes OS entropy.
pub fn generate_keypair() -> Ed25519KeyPair {
    Ed25519KeyPair::generate()
}

/// Encode a public key as lowercase hex.
pub fn public_key_to_hex(key: &VerifyingKey) -> String {
    hex::encode(key.as_bytes())
}

/// Decode a lowercase (or uppercase) hex public key.
pub fn public_key_from_hex(s: &str) -> Result<VerifyingKey> {
    let bytes =
        hex::decode(s).map_err(|e| IdentityError::InvalidEncoding(format!("bad key hex: {e}")))?;
    let arr: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
        IdentityError::InvalidEncoding(format!("public key must be 32 bytes, got {}", b.len()))
    })?;
    VerifyingKey::from_bytes(&arr)
        .map_err(|e| IdentityError::InvalidEncoding(format!("not an ed25519 point: {e}")))
}
