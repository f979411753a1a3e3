//! Basic Identity — create an identity, attest its soul files, publish a
//! document, and exchange a receipt.
//!
//! Run with:
//!   cargo run --example basic_identity -p soul-identity

use soul_identity::document::{verify_document, DocumentOptions, OwnerClaim};
use soul_identity::identity::{identifier_to_public_key, IdentityAnchor};
use soul_identity::integrity::verify_attestation;
use soul_identity::receipt::{verify_receipt, InteractionQuality};

fn main() {
    // ── 1. Create a new identity anchor ─────────────────────────────────────
    //
    // The identifier is the public key in base58. Anyone holding it can
    // recover the key without a registry.
    let mut anchor = IdentityAnchor::new(Some("my-agent".to_string()));

    let id = anchor.id().clone();
    println!("Identity created");
    println!("  ID:         {id}");
    println!("  Public key: {}", anchor.public_key_hex());
    println!("  Created at: {}", anchor.created_at);
    let recovered = identifier_to_public_key(&id).expect("identifier should invert");
    assert_eq!(&recovered, anchor.verifying_key());
    println!();

    // ── 2. Attest the soul files ────────────────────────────────────────────
    let soul = [
        ("SOUL.md", "I am a careful research assistant."),
        ("RULES.md", "Cite every source."),
    ];
    let attestation = anchor.attest(soul).expect("attestation should succeed");
    println!("Soul files attested");
    println!("  Soul hash:  {}", attestation.soul_hash);
    println!("  Files:      {}", attestation.files.join(", "));
    println!();

    // ── 3. Publish a self-signed document ───────────────────────────────────
    let doc = anchor
        .to_document(
            DocumentOptions::new("my-agent")
                .description("Research assistant")
                .version("0.1.0")
                .capabilities(["search", "summarize"]),
            Some(attestation.clone()),
            Some(OwnerClaim::new("example.org").contact("ops@example.org")),
        )
        .expect("document creation should succeed");
    println!("{}", doc.to_json().expect("document serializes"));
    println!("  Verified:   {}", verify_document(&doc));
    println!();

    // ── 4. Someone edits SOUL.md ────────────────────────────────────────────
    let edited = [
        ("SOUL.md", "I am a reckless assistant."),
        ("RULES.md", "Cite every source."),
    ];
    let check = verify_attestation(&attestation, edited, anchor.verifying_key());
    println!("Re-verification after edit");
    println!("  Signature:  {}", check.signature_valid);
    println!("  Hash match: {}", check.hash_match);
    println!("  Intact:     {}", check.intact);
    println!();

    // ── 5. Exchange a receipt ───────────────────────────────────────────────
    let peer = IdentityAnchor::new(Some("peer".to_string()));
    let mut receipt = anchor
        .issue_receipt(
            peer.id().clone(),
            "literature_review",
            InteractionQuality::Positive,
            Some(serde_json::json!({"papers": 4})),
        )
        .expect("receipt should sign");
    peer.countersign(&mut receipt).expect("peer countersigns");
    let verification = verify_receipt(&receipt);
    println!("Receipt {}", receipt.id);
    println!("  From valid: {}", verification.from_valid);
    println!("  To valid:   {:?}", verification.to_valid);
    println!("  Valid:      {}", verification.is_valid);
}
