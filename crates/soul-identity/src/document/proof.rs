//! Detached proofs over canonical records.

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};

use crate::crypto::keys::Ed25519KeyPair;
use crate::crypto::signing;

/// Algorithm tag of every proof this crate produces.
pub const PROOF_TYPE: &str = "Ed25519Signature2020";

/// A signature attached to a record, covering every other field of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    #[serde(rename = "type")]
    pub proof_type: String,
    /// ISO-8601 UTC creation time.
    pub created: String,
    /// `<identifier>#key-<n>`.
    pub verification_method: String,
    /// Base64 Ed25519 signature.
    pub proof_value: String,
}

impl Proof {
    /// Sign `payload` (already canonical) with `key_pair`.
    pub fn sign(key_pair: &Ed25519KeyPair, verification_method: String, payload: &[u8]) -> Self {
        Self {
            proof_type: PROOF_TYPE.to_string(),
            created: crate::time::now_iso8601(),
            verification_method,
            proof_value: signing::sign_to_base64(key_pair.signing_key(), payload),
        }
    }

    /// Check the algorithm tag and the signature over `payload`.
    pub fn verify(&self, key: &VerifyingKey, payload: &[u8]) -> bool {
        self.proof_type == PROOF_TYPE
            && signing::verify_from_base64(key, payload, &self.proof_value)
    }

    /// Does the verification method point into `identifier`'s key set?
    pub fn references(&self, identifier: &str) -> bool {
        self.verification_method
            .strip_prefix(identifier)
            .is_some_and(|fragment| fragment.starts_with("#key-"))
    }

    /// Placeholder used while a record's body is being assembled.
    pub(crate) fn unsigned() -> Self {
        Self {
            proof_type: PROOF_TYPE.to_string(),
            created: String::new(),
            verification_method: String::new(),
            proof_value: String::new(),
        }
    }
}
