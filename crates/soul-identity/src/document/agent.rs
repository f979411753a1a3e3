//! Agent document — the outward identity record.
//!
//! The whole document, including any nested attestation and owner claim,
//! sits inside one signed envelope. Changing any field after signing changes
//! the canonical bytes and invalidates the proof.

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::canonical::ReceivedBody;
use crate::crypto::keys::Ed25519KeyPair;
use crate::error::Result;
use crate::identity::AgentId;
use crate::integrity::IntegrityAttestation;
use crate::keychain::KeyChain;

use super::proof::Proof;

/// Top-level field holding the proof; excluded from the signed body.
pub(crate) const PROOF_FIELD: &str = "proof";

/// A claim that an agent is operated by some owner.
///
/// Carried as signed content of the document; establishing that the owner
/// agrees is a concern of the surrounding system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerClaim {
    /// Owner handle: an identifier, domain or account.
    pub owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    pub claimed_at: String,
}

impl OwnerClaim {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            contact: None,
            claimed_at: crate::time::now_iso8601(),
        }
    }

    pub fn contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = Some(contact.into());
        self
    }
}

/// Display metadata for a new document.
#[derive(Debug, Clone, Default)]
pub struct DocumentOptions {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
    pub homepage: Option<String>,
    pub capabilities: Option<Vec<String>>,
}

impl DocumentOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn homepage(mut self, homepage: impl Into<String>) -> Self {
        self.homepage = Some(homepage.into());
        self
    }

    pub fn capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = Some(capabilities.into_iter().map(Into::into).collect());
        self
    }
}

/// A signed, publishable agent identity record.
///
/// A document parsed from JSON is verified against the body exactly as it
/// was received, so fields the typed view does not model (inside `owner` or
/// `integrity`, explicit `null`s) stay covered by the proof.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDocument {
    pub id: AgentId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<OwnerClaim>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrity: Option<IntegrityAttestation>,
    pub created: String,
    /// Fields this crate does not model, kept so they stay signed.
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
    pub proof: Proof,
    #[serde(skip)]
    received: ReceivedBody,
}

/// Wire shape of [`AgentDocument`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireDocument {
    id: AgentId,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    homepage: Option<String>,
    #[serde(default)]
    capabilities: Option<Vec<String>>,
    #[serde(default)]
    owner: Option<OwnerClaim>,
    #[serde(default)]
    integrity: Option<IntegrityAttestation>,
    created: String,
    #[serde(flatten)]
    extensions: BTreeMap<String, Value>,
    proof: Proof,
}

impl<'de> Deserialize<'de> for AgentDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        let wire = WireDocument::deserialize(&raw).map_err(D::Error::custom)?;
        let mut doc = Self {
            id: wire.id,
            name: wire.name,
            description: wire.description,
            version: wire.version,
            homepage: wire.homepage,
            capabilities: wire.capabilities,
            owner: wire.owner,
            integrity: wire.integrity,
            created: wire.created,
            extensions: wire.extensions,
            proof: wire.proof,
            received: ReceivedBody::default(),
        };
        doc.received =
            ReceivedBody::capture(&raw, &doc, &[PROOF_FIELD]).map_err(D::Error::custom)?;
        Ok(doc)
    }
}

impl AgentDocument {
    /// Canonical bytes of everything but the proof.
    pub fn signing_payload(&self) -> Result<Vec<u8>> {
        self.received.signed_bytes(self, &[PROOF_FIELD])
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    fn unsigned(
        id: AgentId,
        options: DocumentOptions,
        attestation: Option<IntegrityAttestation>,
        owner: Option<OwnerClaim>,
    ) -> Self {
        Self {
            id,
            name: options.name,
            description: options.description,
            version: options.version,
            homepage: options.homepage,
            capabilities: options.capabilities,
            owner,
            integrity: attestation,
            created: crate::time::now_iso8601(),
            extensions: BTreeMap::new(),
            proof: Proof::unsigned(),
            received: ReceivedBody::default(),
        }
    }

    fn seal(mut self, key_pair: &Ed25519KeyPair, key_number: usize) -> Result<Self> {
        let payload = self.signing_payload()?;
        self.proof = Proof::sign(key_pair, self.id.verification_method(key_number), &payload);
        log::debug!("signed document for {} with key-{key_number}", self.id);
        Ok(self)
    }
}

/// Build and sign a document whose identifier is derived from `key_pair`.
pub fn create_document(
    key_pair: &Ed25519KeyPair,
    options: DocumentOptions,
    attestation: Option<IntegrityAttestation>,
    owner: Option<OwnerClaim>,
) -> Result<AgentDocument> {
    let id = AgentId::from_verifying_key(key_pair.verifying_key());
    AgentDocument::unsigned(id, options, attestation, owner).seal(key_pair, 1)
}

/// Build and sign a document for an identity whose key has rotated.
///
/// The identifier comes from `chain`'s original key, the proof from its
/// current key, which `key_pair` must hold.
pub fn create_document_with_chain(
    key_pair: &Ed25519KeyPair,
    chain: &KeyChain,
    options: DocumentOptions,
    attestation: Option<IntegrityAttestation>,
    owner: Option<OwnerClaim>,
) -> Result<AgentDocument> {
    let id = chain.check_signer(key_pair)?;
    AgentDocument::unsigned(id, options, attestation, owner)
        .seal(key_pair, chain.rotations.len() + 1)
}
