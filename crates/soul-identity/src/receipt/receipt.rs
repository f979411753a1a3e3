//! Interaction receipt — signed record that one agent dealt with another.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::canonical::ReceivedBody;
use crate::crypto::keys::Ed25519KeyPair;
use crate::crypto::random;
use crate::document::Proof;
use crate::error::{IdentityError, Result};
use crate::identity::AgentId;
use crate::keychain::KeyChain;

/// Fields holding proofs; excluded from the signed body.
pub(crate) const PROOF_FIELDS: [&str; 2] = ["fromProof", "toProof"];

/// Unique identifier for a receipt.
///
/// Format: `rcpt_` + base58 of the first 16 bytes of
/// SHA-256(issuer, sequence, nonce, timestamp).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReceiptId(pub String);

impl ReceiptId {
    fn generate(issuer: &AgentId, sequence: u64, nonce: &[u8; 16], timestamp: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(issuer.as_str().as_bytes());
        hasher.update(sequence.to_be_bytes());
        hasher.update(nonce);
        hasher.update(timestamp.as_bytes());
        let digest = hasher.finalize();
        Self(format!("rcpt_{}", bs58::encode(&digest[..16]).into_string()))
    }
}

impl std::fmt::Display for ReceiptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the issuer judged the interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionQuality {
    Positive,
    Neutral,
    Negative,
}

impl InteractionQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }
}

impl std::fmt::Display for InteractionQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InteractionQuality {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "positive" => Ok(Self::Positive),
            "neutral" => Ok(Self::Neutral),
            "negative" => Ok(Self::Negative),
            other => Err(IdentityError::InvalidEncoding(format!(
                "unknown interaction quality '{other}'"
            ))),
        }
    }
}

/// A receipt signed by its issuer and, optionally, countersigned by the
/// counterparty. Both signatures cover the same canonical body, taken from
/// the received JSON when the receipt was parsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionReceipt {
    pub id: ReceiptId,
    pub from: AgentId,
    pub to: AgentId,
    pub timestamp: String,
    pub action: String,
    pub quality: InteractionQuality,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    pub from_proof: Proof,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_proof: Option<Proof>,
    #[serde(skip)]
    received: ReceivedBody,
}

/// Wire shape of [`InteractionReceipt`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireReceipt {
    id: ReceiptId,
    from: AgentId,
    to: AgentId,
    timestamp: String,
    action: String,
    quality: InteractionQuality,
    #[serde(default)]
    context: Option<Value>,
    from_proof: Proof,
    #[serde(default)]
    to_proof: Option<Proof>,
}

impl<'de> Deserialize<'de> for InteractionReceipt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        let wire = WireReceipt::deserialize(&raw).map_err(D::Error::custom)?;
        let mut receipt = Self {
            id: wire.id,
            from: wire.from,
            to: wire.to,
            timestamp: wire.timestamp,
            action: wire.action,
            quality: wire.quality,
            context: wire.context,
            from_proof: wire.from_proof,
            to_proof: wire.to_proof,
            received: ReceivedBody::default(),
        };
        receipt.received =
            ReceivedBody::capture(&raw, &receipt, &PROOF_FIELDS).map_err(D::Error::custom)?;
        Ok(receipt)
    }
}

impl InteractionReceipt {
    /// Canonical bytes of everything but the proofs.
    pub fn signing_payload(&self) -> Result<Vec<u8>> {
        self.received.signed_bytes(self, &PROOF_FIELDS)
    }

    pub fn is_countersigned(&self) -> bool {
        self.to_proof.is_some()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Builder for creating interaction receipts.
pub struct ReceiptBuilder {
    from: AgentId,
    to: AgentId,
    action: String,
    quality: InteractionQuality,
    context: Option<Value>,
}

impl ReceiptBuilder {
    /// Start building a receipt issued by `from` about an interaction with `to`.
    pub fn new(
        from: AgentId,
        to: AgentId,
        action: impl Into<String>,
        quality: InteractionQuality,
    ) -> Self {
        Self {
            from,
            to,
            action: action.into(),
            quality,
            context: None,
        }
    }

    /// Attach free-form context.
    pub fn context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    /// Sign with the key `from` was derived from.
    ///
    /// `sequence` is the issuer's running receipt counter; it only feeds the
    /// receipt identifier.
    pub fn sign(self, key_pair: &Ed25519KeyPair, sequence: u64) -> Result<InteractionReceipt> {
        if AgentId::from_verifying_key(key_pair.verifying_key()) != self.from {
            return Err(IdentityError::KeyMismatch(format!(
                "key pair does not derive issuer {}",
                self.from
            )));
        }
        self.seal(key_pair, 1, sequence)
    }

    /// Sign with the current key of the issuer's rotated chain.
    pub fn sign_with_chain(
        self,
        key_pair: &Ed25519KeyPair,
        chain: &KeyChain,
        sequence: u64,
    ) -> Result<InteractionReceipt> {
        let id = chain.check_signer(key_pair)?;
        if id != self.from {
            return Err(IdentityError::KeyMismatch(format!(
                "chain belongs to {id}, not issuer {}",
                self.from
            )));
        }
        self.seal(key_pair, chain.rotations.len() + 1, sequence)
    }

    fn seal(
        self,
        key_pair: &Ed25519KeyPair,
        key_number: usize,
        sequence: u64,
    ) -> Result<InteractionReceipt> {
        let timestamp = crate::time::now_iso8601();
        let nonce = random::random_nonce_16();
        let id = ReceiptId::generate(&self.from, sequence, &nonce, &timestamp);

        let mut receipt = InteractionReceipt {
            id,
            from: self.from,
            to: self.to,
            timestamp,
            action: self.action,
            quality: self.quality,
            context: self.context,
            from_proof: Proof::unsigned(),
            to_proof: None,
            received: ReceivedBody::default(),
        };
        let payload = receipt.signing_payload()?;
        receipt.from_proof =
            Proof::sign(key_pair, receipt.from.verification_method(key_number), &payload);

        log::debug!(
            "issued receipt {} from {} to {}",
            receipt.id,
            receipt.from,
            receipt.to
        );
        Ok(receipt)
    }
}
