//! Interaction receipts — signed proofs that two agents interacted.

pub mod countersign;
#[allow(clippy::module_inception)]
pub mod receipt;
pub mod verify;

pub use receipt::{InteractionQuality, InteractionReceipt, ReceiptBuilder, ReceiptId};
pub use verify::{verify_receipt, verify_receipt_with_chains, ReceiptVerification};
