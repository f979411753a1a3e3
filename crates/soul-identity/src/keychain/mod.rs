//! Key chain — rotation and revocation.
//!
//! The chain lets one logical identity outlive any single key pair:
//! - Rotation statements, each signed by the key it replaces
//! - Revocation statements, trusted only once verified against an authority
//! - Sequential all-or-nothing chain verification

pub mod chain;
pub mod revocation;
pub mod rotation;

pub use chain::{
    build_key_chain, is_key_revoked, verify_key_chain, ChainBreak, ChainVerification, KeyChain,
};
pub use revocation::{
    create_revocation, verify_revocation, KeyRevocation, RevocationEntry, VerifiedRevocation,
};
pub use rotation::{create_rotation, verify_rotation, KeyRotation, RotationReason};
