//! Receipt verification.

use ed25519_dalek::VerifyingKey;
use serde::Serialize;

use crate::document::Proof;
use crate::identity::AgentId;
use crate::keychain::KeyChain;

use super::receipt::InteractionReceipt;

/// Result of verifying a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptVerification {
    /// Issuer signature checks out.
    pub from_valid: bool,
    /// `None` when there is no countersignature.
    pub to_valid: Option<bool>,
    pub is_valid: bool,
}

fn check_proof(proof: &Proof, signer: &AgentId, key: Option<VerifyingKey>, payload: &[u8]) -> bool {
    let Some(key) = key else {
        return false;
    };
    proof.references(signer.as_str()) && proof.verify(&key, payload)
}

fn resolve_key(id: &AgentId, chain: Option<&KeyChain>) -> Option<VerifyingKey> {
    match chain {
        Some(chain) => chain.active_key_for(id),
        None => id.to_verifying_key().ok(),
    }
}

/// Verify a receipt against the keys its identifiers were derived from.
///
/// Valid with only the issuer's signature; a countersignature that is present
/// but wrong makes the whole receipt invalid.
pub fn verify_receipt(receipt: &InteractionReceipt) -> ReceiptVerification {
    verify_receipt_with_chains(receipt, None, None)
}

/// Verify a receipt where either party may have rotated its key.
///
/// A supplied chain replaces identifier inversion for that party: the chain
/// must be valid, belong to the party, and have an unrevoked current key.
pub fn verify_receipt_with_chains(
    receipt: &InteractionReceipt,
    from_chain: Option<&KeyChain>,
    to_chain: Option<&KeyChain>,
) -> ReceiptVerification {
    let Ok(payload) = receipt.signing_payload() else {
        return ReceiptVerification {
            from_valid: false,
            to_valid: receipt.to_proof.as_ref().map(|_| false),
            is_valid: false,
        };
    };

    let from_valid = check_proof(
        &receipt.from_proof,
        &receipt.from,
        resolve_key(&receipt.from, from_chain),
        &payload,
    );
    let to_valid = receipt.to_proof.as_ref().map(|proof| {
        check_proof(
            proof,
            &receipt.to,
            resolve_key(&receipt.to, to_chain),
            &payload,
        )
    });

    let is_valid = from_valid && to_valid.unwrap_or(true);
    if !is_valid {
        log::debug!(
            "receipt {} failed verification (from: {from_valid}, to: {to_valid:?})",
            receipt.id
        );
    }
    ReceiptVerification {
        from_valid,
        to_valid,
        is_valid,
    }
}
