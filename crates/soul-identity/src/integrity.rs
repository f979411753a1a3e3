//! Soul-file integrity attestation.
//!
//! An agent's core behavioral files (`SOUL.md`, `AGENTS.md`, ...) are reduced
//! to one soul hash, which the agent signs together with the sorted file list
//! and a timestamp. Verification reports signature validity and hash match
//! separately:
//!
//! | signature | hash  | meaning                                         |
//! |-----------|-------|-------------------------------------------------|
//! | valid     | match | intact                                          |
//! | valid     | miss  | genuine attestation, files changed since        |
//! | invalid   | any   | attestation forged or signed by a different key |

use std::collections::BTreeMap;

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::canonical;
use crate::crypto::keys::Ed25519KeyPair;
use crate::crypto::signing;
use crate::error::{IdentityError, Result};
use crate::keychain::{verify_key_chain, KeyChain};

/// Algorithm tag prepended to every digest.
pub const HASH_ALGORITHM: &str = "sha256";

/// Joins per-file digests before the final digest.
const SOUL_HASH_SEPARATOR: &str = "\n";

/// An algorithm-tagged digest, `sha256:<lowercase hex>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    fn sha256(bytes: &[u8]) -> Self {
        Self(format!("{HASH_ALGORITHM}:{}", hex::encode(Sha256::digest(bytes))))
    }

    /// Parse and validate a tagged digest string.
    pub fn parse(s: &str) -> Result<Self> {
        let hex_part = s
            .strip_prefix(HASH_ALGORITHM)
            .and_then(|rest| rest.strip_prefix(':'))
            .ok_or_else(|| {
                IdentityError::InvalidEncoding(format!("digest must be tagged '{HASH_ALGORITHM}:'"))
            })?;
        let bytes = hex::decode(hex_part)
            .map_err(|e| IdentityError::InvalidEncoding(format!("bad digest hex: {e}")))?;
        if bytes.len() != 32 || hex_part.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(IdentityError::InvalidEncoding(
                "digest must be 32 bytes of lowercase hex".into(),
            ));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Digest raw content.
pub fn hash_content(content: impl AsRef<[u8]>) -> ContentHash {
    ContentHash::sha256(content.as_ref())
}

/// Normalize a caller's file set: names sorted, duplicate names keep the
/// last content seen.
fn sorted_files<I, K, V>(files: I) -> BTreeMap<String, V>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<[u8]>,
{
    files
        .into_iter()
        .map(|(name, content)| (name.as_ref().to_string(), content))
        .collect()
}

fn soul_hash_of<V: AsRef<[u8]>>(files: &BTreeMap<String, V>) -> ContentHash {
    let joined = files
        .values()
        .map(|content| hash_content(content).0)
        .collect::<Vec<_>>()
        .join(SOUL_HASH_SEPARATOR);
    hash_content(joined)
}

/// Compute the soul hash of a named file set.
///
/// Independent of the order in which the caller supplies the files.
pub fn compute_soul_hash<I, K, V>(files: I) -> ContentHash
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<[u8]>,
{
    soul_hash_of(&sorted_files(files))
}

/// A signed claim binding a soul hash to a point in time and a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityAttestation {
    pub soul_hash: ContentHash,
    /// File names covered, sorted.
    pub files: Vec<String>,
    pub attested_at: String,
    pub signature: String,
}

impl IntegrityAttestation {
    /// Canonical bytes the signature covers.
    fn signing_payload(&self) -> Result<Vec<u8>> {
        canonical::canonical_bytes_without(self, &["signature"])
    }

    /// Verify the signature over the attestation's own recorded fields.
    pub fn verify_signature(&self, key: &VerifyingKey) -> bool {
        match self.signing_payload() {
            Ok(payload) => signing::verify_from_base64(key, &payload, &self.signature),
            Err(_) => false,
        }
    }
}

/// Outcome of checking an attestation against a candidate file set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationVerification {
    pub intact: bool,
    pub signature_valid: bool,
    pub hash_match: bool,
    pub current_hash: ContentHash,
}

/// Attest the given files with `key_pair`.
pub fn create_attestation<I, K, V>(files: I, key_pair: &Ed25519KeyPair) -> Result<IntegrityAttestation>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<[u8]>,
{
    let files = sorted_files(files);
    let mut attestation = IntegrityAttestation {
        soul_hash: soul_hash_of(&files),
        files: files.keys().cloned().collect(),
        attested_at: crate::time::now_iso8601(),
        signature: String::new(),
    };
    let payload = attestation.signing_payload()?;
    attestation.signature = signing::sign_to_base64(key_pair.signing_key(), &payload);

    log::debug!(
        "attested {} file(s) as {}",
        attestation.files.len(),
        attestation.soul_hash
    );
    Ok(attestation)
}

/// Check an attestation against the files as they are now.
pub fn verify_attestation<I, K, V>(
    attestation: &IntegrityAttestation,
    current_files: I,
    key: &VerifyingKey,
) -> AttestationVerification
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<[u8]>,
{
    let signature_valid = attestation.verify_signature(key);
    finish(attestation, current_files, signature_valid)
}

/// Check an attestation whose signer may be any trusted key of `chain`.
///
/// The chain itself must verify. A key stops counting once it is covered by
/// a verified revocation (see [`crate::keychain::RevocationEntry`]) or was
/// rotated out as compromised or lost: whoever holds it can sign any
/// `attestedAt` they like.
pub fn verify_attestation_with_chain<I, K, V>(
    attestation: &IntegrityAttestation,
    current_files: I,
    chain: &KeyChain,
) -> AttestationVerification
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<[u8]>,
{
    if !verify_key_chain(chain).valid {
        log::warn!("attestation checked against a broken key chain");
    }
    let signature_valid = chain
        .trusted_keys()
        .iter()
        .any(|key| attestation.verify_signature(key));
    finish(attestation, current_files, signature_valid)
}

fn finish<I, K, V>(
    attestation: &IntegrityAttestation,
    current_files: I,
    signature_valid: bool,
) -> AttestationVerification
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<[u8]>,
{
    let current_hash = compute_soul_hash(current_files);
    let hash_match = current_hash == attestation.soul_hash;
    if signature_valid && !hash_match {
        log::debug!(
            "soul hash drift: attested {}, now {}",
            attestation.soul_hash,
            current_hash
        );
    }
    AttestationVerification {
        intact: signature_valid && hash_match,
        signature_valid,
        hash_match,
        current_hash,
    }
}
