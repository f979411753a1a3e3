//! Key Rotation — rotate a compromised key, keep the identifier, revoke the
//! old key, and show what a verifier sees.
//!
//! Run with:
//!   cargo run --example key_rotation -p soul-identity

use soul_identity::document::{verify_document, verify_document_with_chain, DocumentOptions};
use soul_identity::identity::IdentityAnchor;
use soul_identity::integrity::verify_attestation_with_chain;
use soul_identity::keychain::{verify_key_chain, KeyChain, RotationReason};

fn main() {
    let anchor = IdentityAnchor::new(Some("rotating-agent".to_string()));
    let soul = [("SOUL.md", "Steady and honest.")];
    let attestation = anchor.attest(soul).expect("attestation");
    let first_key = anchor.public_key_hex();
    println!("Identity {}", anchor.id());
    println!("  key-1: {first_key}");

    // ── 1. Rotate twice ─────────────────────────────────────────────────────
    let anchor = anchor
        .rotate(RotationReason::Compromised)
        .and_then(|a| a.rotate(RotationReason::Scheduled))
        .expect("rotation");
    for (i, rotation) in anchor.chain().rotations.iter().enumerate() {
        println!("  key-{}: {} ({})", i + 2, rotation.new_key, rotation.reason.as_str());
    }

    // ── 2. Revoke the compromised key ───────────────────────────────────────
    let anchor = anchor
        .revoke_key(&first_key, "leaked in a log file")
        .expect("revocation");

    // ── 3. Publish the chain and a fresh document ───────────────────────────
    let chain_json = serde_json::to_string_pretty(anchor.chain()).expect("chain serializes");
    let doc = anchor
        .to_document(DocumentOptions::new("rotating-agent"), None, None)
        .expect("document");
    println!();
    println!("Published document signed by {}", doc.proof.verification_method);

    // ── 4. What a verifier sees ─────────────────────────────────────────────
    let received: KeyChain = serde_json::from_str(&chain_json).expect("chain parses");
    let verification = verify_key_chain(&received);
    println!();
    println!("Verifier");
    println!("  Chain valid:        {}", verification.valid);
    println!("  Current key:        {}", verification.current_key);
    println!("  Without chain:      {}", verify_document(&doc));
    println!("  With chain:         {}", verify_document_with_chain(&doc, &received));

    // revocations arrive unverified; they count once the current key signed them
    let before = received.is_key_revoked(&first_key);
    let trusted = received.verify_own_revocations();
    println!(
        "  key-1 revoked:      {before} (as parsed) / {} (after check)",
        trusted.is_key_revoked(&first_key)
    );
    let old = verify_attestation_with_chain(&attestation, soul, &trusted);
    // key-1 was rotated out as compromised, so nothing it signed still counts
    println!("  Old attestation:    signature valid = {}", old.signature_valid);
}
