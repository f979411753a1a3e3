//! Document verification.
//!
//! The verifying key is never taken from the document body. It is either
//! recovered from the document's own identifier, or, for rotated identities,
//! read from a key chain that verifies and belongs to that identifier. A
//! document whose identifier does not match its signer is invalid however
//! good its signature is.

use ed25519_dalek::VerifyingKey;

use crate::keychain::KeyChain;

use super::agent::AgentDocument;

fn verify_with_key(doc: &AgentDocument, key: &VerifyingKey) -> bool {
    if !doc.proof.references(doc.id.as_str()) {
        log::debug!(
            "proof of {} references foreign method {}",
            doc.id,
            doc.proof.verification_method
        );
        return false;
    }
    match doc.signing_payload() {
        Ok(payload) => doc.proof.verify(key, &payload),
        Err(_) => false,
    }
}

/// Verify a document signed by the key its identifier was derived from.
pub fn verify_document(doc: &AgentDocument) -> bool {
    match doc.id.to_verifying_key() {
        Ok(key) => verify_with_key(doc, &key),
        Err(e) => {
            log::debug!("document identifier rejected: {e}");
            false
        }
    }
}

/// Verify a document signed by the current key of `chain`.
///
/// The chain must verify, must belong to the document's identifier, and its
/// current key must not be covered by a verified revocation.
pub fn verify_document_with_chain(doc: &AgentDocument, chain: &KeyChain) -> bool {
    match chain.active_key_for(&doc.id) {
        Some(key) => verify_with_key(doc, &key),
        None => false,
    }
}
