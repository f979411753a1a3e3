//! Counterparty signatures on interaction receipts.

use crate::crypto::keys::Ed25519KeyPair;
use crate::document::Proof;
use crate::error::{IdentityError, Result};
use crate::identity::AgentId;
use crate::keychain::KeyChain;

use super::receipt::InteractionReceipt;

impl InteractionReceipt {
    /// Attach the recipient's signature over the same body the issuer signed.
    ///
    /// `key_pair` must be the key `to` was derived from.
    pub fn countersign(&mut self, key_pair: &Ed25519KeyPair) -> Result<()> {
        if AgentId::from_verifying_key(key_pair.verifying_key()) != self.to {
            return Err(IdentityError::KeyMismatch(format!(
                "key pair does not derive recipient {}",
                self.to
            )));
        }
        self.attach_to_proof(key_pair, 1)
    }

    /// Countersign with the current key of the recipient's rotated chain.
    pub fn countersign_with_chain(
        &mut self,
        key_pair: &Ed25519KeyPair,
        chain: &KeyChain,
    ) -> Result<()> {
        let id = chain.check_signer(key_pair)?;
        if id != self.to {
            return Err(IdentityError::KeyMismatch(format!(
                "chain belongs to {id}, not recipient {}",
                self.to
            )));
        }
        self.attach_to_proof(key_pair, chain.rotations.len() + 1)
    }

    fn attach_to_proof(&mut self, key_pair: &Ed25519KeyPair, key_number: usize) -> Result<()> {
        let payload = self.signing_payload()?;
        self.to_proof = Some(Proof::sign(
            key_pair,
            self.to.verification_method(key_number),
            &payload,
        ));
        log::debug!("receipt {} countersigned by {}", self.id, self.to);
        Ok(())
    }
}
