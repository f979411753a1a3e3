//! Cryptographic primitives for soul-identity.
//!
//! This module provides:
//! - Ed25519 key generation and public-key text encodings
//! - Ed25519 signing and verification (raw and string-level)
//! - Cryptographically secure random number generation

pub mod keys;
pub mod random;
pub mod signing;

pub use keys::{generate_keypair, public_key_from_hex, public_key_to_hex, Ed25519KeyPair};
pub use signing::{sign, sign_str, verify, verify_str};
