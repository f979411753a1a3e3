//! Document protocol — signed agent self-descriptions.

pub mod agent;
pub mod proof;
pub mod verify;

pub use agent::{
    create_document, create_document_with_chain, AgentDocument, DocumentOptions, OwnerClaim,
};
pub use proof::{Proof, PROOF_TYPE};
pub use verify::{verify_document, verify_document_with_chain};
