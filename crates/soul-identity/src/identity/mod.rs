//! Identity management — identifiers and the identity anchor.
//!
//! An identifier is a text handle that can be turned back into the public
//! key it was derived from. The `IdentityAnchor` is the holder's side: key
//! material plus the key chain that keeps the identifier stable across
//! rotation.

pub mod anchor;
pub mod identifier;

pub use anchor::IdentityAnchor;
pub use identifier::{derive_identifier, identifier_to_public_key, AgentId, IDENTIFIER_PREFIX};
