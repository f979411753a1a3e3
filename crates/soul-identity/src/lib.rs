//! SoulIdentity — self-sovereign cryptographic identity for AI agents.
//!
//! Provides key-derived identifiers, deterministic canonical JSON, signed
//! integrity attestations over an agent's core files, signed agent documents,
//! interaction receipts, and key rotation/revocation chains that keep an
//! identifier stable across key changes.
//!
//! Everything here is a synchronous pure function over immutable records,
//! apart from key and nonce generation.

pub mod canonical;
pub mod crypto;
pub mod document;
pub mod error;
pub mod identity;
pub mod integrity;
pub mod keychain;
pub mod receipt;
pub mod time;

// Re-export primary types
pub use error::{IdentityError, Result};
pub use identity::{derive_identifier, identifier_to_public_key, AgentId, IdentityAnchor};

pub use crypto::{
    generate_keypair, public_key_from_hex, public_key_to_hex, sign, sign_str, verify, verify_str,
    Ed25519KeyPair,
};

pub use canonical::{canonical_bytes, canonicalize};

pub use integrity::{
    compute_soul_hash, create_attestation, hash_content, verify_attestation,
    verify_attestation_with_chain, AttestationVerification, ContentHash, IntegrityAttestation,
};

pub use document::{
    create_document, create_document_with_chain, verify_document, verify_document_with_chain,
    AgentDocument, DocumentOptions, OwnerClaim, Proof,
};

pub use receipt::{
    verify_receipt, verify_receipt_with_chains, InteractionQuality, InteractionReceipt,
    ReceiptBuilder, ReceiptId, ReceiptVerification,
};

pub use keychain::{
    build_key_chain, create_revocation, create_rotation, is_key_revoked, verify_key_chain,
    verify_revocation, verify_rotation, ChainBreak, ChainVerification, KeyChain, KeyRevocation,
    KeyRotation, RevocationEntry, RotationReason, VerifiedRevocation,
};
