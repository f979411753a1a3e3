//! Identity anchor — an agent's own view of its identity.
//!
//! The anchor owns the current key pair and the key chain rooted at the
//! original key. The identifier never changes: rotation replaces the key pair
//! and extends the chain, but the identifier stays derived from the original
//! key. Everything the anchor produces (documents, attestations, receipts)
//! goes through the free functions of the other modules.

use ed25519_dalek::{SigningKey, VerifyingKey};
use serde_json::Value;

use crate::crypto::keys::Ed25519KeyPair;
use crate::document::{
    create_document, create_document_with_chain, AgentDocument, DocumentOptions, OwnerClaim,
};
use crate::error::Result;
use crate::integrity::{create_attestation, IntegrityAttestation};
use crate::keychain::{KeyChain, RotationReason};
use crate::receipt::{InteractionQuality, InteractionReceipt, ReceiptBuilder};

use super::identifier::AgentId;

/// The root identity of one agent.
///
/// The signing key is zeroized on drop.
#[derive(Debug)]
pub struct IdentityAnchor {
    key_pair: Ed25519KeyPair,
    chain: KeyChain,
    id: AgentId,
    /// Human-readable name (optional).
    pub name: Option<String>,
    /// Creation time, ISO-8601 UTC.
    pub created_at: String,
    receipt_sequence: u64,
}

impl IdentityAnchor {
    /// Create a new identity with a fresh key pair.
    pub fn new(name: Option<String>) -> Self {
        let key_pair = Ed25519KeyPair::generate();
        let chain = KeyChain::new(key_pair.verifying_key());
        let id = AgentId::from_verifying_key(key_pair.verifying_key());
        log::debug!("created identity {id}");
        Self {
            key_pair,
            chain,
            id,
            name,
            created_at: crate::time::now_iso8601(),
            receipt_sequence: 0,
        }
    }

    /// Reconstruct from the current signing key and the chain it belongs to.
    ///
    /// Fails unless the chain verifies and `signing_key_bytes` holds its
    /// current key.
    pub fn from_parts(
        signing_key_bytes: &[u8; 32],
        chain: KeyChain,
        name: Option<String>,
        created_at: String,
        receipt_sequence: u64,
    ) -> Result<Self> {
        let key_pair = Ed25519KeyPair::from_signing_key_bytes(signing_key_bytes);
        let id = chain.check_signer(&key_pair)?;
        Ok(Self {
            key_pair,
            chain,
            id,
            name,
            created_at,
            receipt_sequence,
        })
    }

    /// Permanent identifier, derived from the original key.
    pub fn id(&self) -> &AgentId {
        &self.id
    }

    pub fn key_pair(&self) -> &Ed25519KeyPair {
        &self.key_pair
    }

    pub fn signing_key(&self) -> &SigningKey {
        self.key_pair.signing_key()
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        self.key_pair.verifying_key()
    }

    pub fn public_key_hex(&self) -> String {
        self.key_pair.public_key_hex()
    }

    pub fn chain(&self) -> &KeyChain {
        &self.chain
    }

    /// Number of receipts issued so far.
    pub fn receipt_sequence(&self) -> u64 {
        self.receipt_sequence
    }

    fn has_rotated(&self) -> bool {
        !self.chain.rotations.is_empty()
    }

    /// Replace the current key with a fresh one, authorized by the current
    /// key, and return the rotated anchor.
    ///
    /// `self` is left untouched, so a failed rotation loses nothing.
    pub fn rotate(&self, reason: RotationReason) -> Result<Self> {
        let new_key_pair = Ed25519KeyPair::generate();
        let chain = self
            .chain
            .rotate(&self.key_pair, new_key_pair.verifying_key(), reason)?;
        log::info!(
            "rotated {} to key-{} ({})",
            self.id,
            chain.rotations.len() + 1,
            reason.as_str()
        );
        Ok(self.successor(new_key_pair, chain))
    }

    /// Revoke `key_hex` under the authority of the current key, returning
    /// the anchor with the extended chain.
    pub fn revoke_key(&self, key_hex: &str, reason: impl Into<String>) -> Result<Self> {
        let chain = self.chain.revoke(&self.key_pair, key_hex, reason)?;
        log::info!("{} revoked key {key_hex}", self.id);
        let key_pair = Ed25519KeyPair::from_signing_key_bytes(&self.key_pair.signing_key_bytes());
        Ok(self.successor(key_pair, chain))
    }

    fn successor(&self, key_pair: Ed25519KeyPair, chain: KeyChain) -> Self {
        Self {
            key_pair,
            chain,
            id: self.id.clone(),
            name: self.name.clone(),
            created_at: self.created_at.clone(),
            receipt_sequence: self.receipt_sequence,
        }
    }

    /// Attest the current contents of the agent's soul files.
    pub fn attest<I, K, V>(&self, files: I) -> Result<IntegrityAttestation>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<[u8]>,
    {
        create_attestation(files, &self.key_pair)
    }

    /// Sign a document under the permanent identifier.
    ///
    /// After a rotation the proof references the current key, and verifiers
    /// need [`IdentityAnchor::chain`] to check it.
    pub fn to_document(
        &self,
        options: DocumentOptions,
        attestation: Option<IntegrityAttestation>,
        owner: Option<OwnerClaim>,
    ) -> Result<AgentDocument> {
        if self.has_rotated() {
            create_document_with_chain(&self.key_pair, &self.chain, options, attestation, owner)
        } else {
            create_document(&self.key_pair, options, attestation, owner)
        }
    }

    /// Issue a receipt for an interaction with `to`.
    pub fn issue_receipt(
        &mut self,
        to: AgentId,
        action: impl Into<String>,
        quality: InteractionQuality,
        context: Option<Value>,
    ) -> Result<InteractionReceipt> {
        let mut builder = ReceiptBuilder::new(self.id.clone(), to, action, quality);
        if let Some(context) = context {
            builder = builder.context(context);
        }
        let receipt = if self.has_rotated() {
            builder.sign_with_chain(&self.key_pair, &self.chain, self.receipt_sequence)?
        } else {
            builder.sign(&self.key_pair, self.receipt_sequence)?
        };
        self.receipt_sequence += 1;
        Ok(receipt)
    }

    /// Countersign a receipt addressed to this identity.
    pub fn countersign(&self, receipt: &mut InteractionReceipt) -> Result<()> {
        if self.has_rotated() {
            receipt.countersign_with_chain(&self.key_pair, &self.chain)
        } else {
            receipt.countersign(&self.key_pair)
        }
    }
}
