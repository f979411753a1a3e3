//! Integration test: full end-to-end workflow.
//!
//! Tests the complete lifecycle:
//! 1. Create identities and publish self-signed documents
//! 2. Attest soul files and detect tampering
//! 3. Exchange and countersign interaction receipts
//! 4. Rotate keys and keep publishing under the same identifier
//! 5. Revoke a compromised key

use std::collections::HashMap;

use soul_identity::document::{verify_document, verify_document_with_chain, DocumentOptions};
use soul_identity::identity::{identifier_to_public_key, IdentityAnchor};
use soul_identity::integrity::{
    compute_soul_hash, create_attestation, verify_attestation, verify_attestation_with_chain,
};
use soul_identity::keychain::{
    build_key_chain, create_revocation, create_rotation, is_key_revoked, verify_key_chain,
    ChainBreak, KeyChain, KeyRevocation, RotationReason,
};
use soul_identity::receipt::{verify_receipt, verify_receipt_with_chains, InteractionQuality};
use soul_identity::{AgentDocument, Ed25519KeyPair, OwnerClaim};

#[test]
fn full_workflow_identity_to_revocation() {
    // ── Step 1: Create identities ───────────────────────────────────────
    let alice = IdentityAnchor::new(Some("alice".to_string()));
    let mut bob = IdentityAnchor::new(Some("bob".to_string()));

    assert_ne!(alice.id(), bob.id());
    assert!(alice.id().as_str().starts_with("did:soul:"));
    assert_eq!(
        &identifier_to_public_key(alice.id()).unwrap(),
        alice.verifying_key()
    );

    // ── Step 2: Attest soul files and publish ───────────────────────────
    let soul_files = HashMap::from([
        ("SOUL.md", "I am Alice. I help with research."),
        ("STYLE.md", "Concise, cite sources."),
    ]);
    let attestation = alice.attest(&soul_files).unwrap();
    let doc = alice
        .to_document(
            DocumentOptions::new("alice")
                .description("Research agent")
                .capabilities(["search", "summarize"]),
            Some(attestation.clone()),
            Some(OwnerClaim::new("example.org")),
        )
        .unwrap();

    let published = doc.to_json().unwrap();
    let fetched = AgentDocument::from_json(&published).unwrap();
    assert!(verify_document(&fetched), "Alice's document should verify");
    let att = fetched.integrity.as_ref().unwrap();
    assert!(verify_attestation(att, &soul_files, alice.verifying_key()).intact);

    // ── Step 3: Interaction receipts ────────────────────────────────────
    let mut receipt = bob
        .issue_receipt(
            alice.id().clone(),
            "literature_review",
            InteractionQuality::Positive,
            Some(serde_json::json!({"papers": 12})),
        )
        .unwrap();
    assert!(verify_receipt(&receipt).is_valid);
    assert_eq!(verify_receipt(&receipt).to_valid, None);

    alice.countersign(&mut receipt).unwrap();
    let v = verify_receipt(&receipt);
    assert!(v.from_valid && v.to_valid == Some(true) && v.is_valid);

    // ── Step 4: Rotate and keep publishing ──────────────────────────────
    let alice_id = alice.id().clone();
    let first_key = alice.public_key_hex();
    let alice = alice.rotate(RotationReason::Compromised).unwrap();
    assert_eq!(alice.id(), &alice_id);

    let chain_json = serde_json::to_string(alice.chain()).unwrap();
    let chain: KeyChain = serde_json::from_str(&chain_json).unwrap();
    let verification = verify_key_chain(&chain);
    assert!(verification.valid);
    assert_eq!(verification.current_key, alice.public_key_hex());

    let doc2 = alice
        .to_document(DocumentOptions::new("alice"), None, None)
        .unwrap();
    assert!(verify_document_with_chain(&doc2, &chain));
    assert!(!verify_document(&doc2));

    // a compromised key vouches for nothing, including what it signed before
    let exposed = verify_attestation_with_chain(&attestation, &soul_files, &chain);
    assert!(!exposed.signature_valid && exposed.hash_match);
    let reattested = alice.attest(&soul_files).unwrap();
    assert!(verify_attestation_with_chain(&reattested, &soul_files, &chain).intact);

    // ── Step 5: Revoke the compromised key ──────────────────────────────
    let alice = alice.revoke_key(&first_key, "key leaked").unwrap();
    assert!(is_key_revoked(alice.chain(), &first_key));
    let after = verify_attestation_with_chain(&reattested, &soul_files, alice.chain());
    assert!(after.intact, "the current key is unaffected by the revocation");

    // received revocations only count after verification
    let wire: KeyChain =
        serde_json::from_str(&serde_json::to_string(alice.chain()).unwrap()).unwrap();
    assert!(!is_key_revoked(&wire, &first_key));
    let wire = wire.verify_own_revocations();
    assert!(is_key_revoked(&wire, &first_key));

    // bob's receipt from before the rotation is unaffected
    let from_chain = bob.chain().clone();
    assert!(verify_receipt_with_chains(&receipt, Some(&from_chain), None).from_valid);
}

#[test]
fn soul_file_tampering_is_distinguished_from_forgery() {
    let agent = Ed25519KeyPair::generate();
    let original = HashMap::from([("SOUL.md", "A")]);
    let attestation = create_attestation(&original, &agent).unwrap();

    // attacker rewrites the soul file
    let rewritten = HashMap::from([("SOUL.md", "B")]);
    let tampered = verify_attestation(&attestation, &rewritten, agent.verifying_key());
    assert!(tampered.signature_valid);
    assert!(!tampered.hash_match);
    assert!(!tampered.intact);
    assert_eq!(tampered.current_hash, compute_soul_hash(&rewritten));

    // attacker forges an attestation for the new content with their own key
    let attacker = Ed25519KeyPair::generate();
    let forged = create_attestation(&rewritten, &attacker).unwrap();
    let forgery = verify_attestation(&forged, &rewritten, agent.verifying_key());
    assert!(!forgery.signature_valid);
    assert!(forgery.hash_match);
    assert!(!forgery.intact);
}

#[test]
fn document_identifier_swap_fails() {
    let honest = IdentityAnchor::new(None);
    let victim = IdentityAnchor::new(None);
    let doc = honest
        .to_document(DocumentOptions::new("honest"), None, None)
        .unwrap();

    let mut value = serde_json::to_value(&doc).unwrap();
    value["id"] = serde_json::Value::String(victim.id().to_string());
    let swapped: AgentDocument = serde_json::from_value(value).unwrap();
    assert!(!verify_document(&swapped));
}

#[test]
fn key_chain_with_forged_link_breaks_at_index() {
    let k1 = Ed25519KeyPair::generate();
    let k2 = Ed25519KeyPair::generate();
    let k3 = Ed25519KeyPair::generate();
    let intruder = Ed25519KeyPair::generate();
    let id = soul_identity::derive_identifier(k1.verifying_key());

    let r1 = create_rotation(&k1, k2.verifying_key(), &id, RotationReason::Scheduled).unwrap();
    let r2 = create_rotation(&k2, k3.verifying_key(), &id, RotationReason::Manual).unwrap();
    let good = build_key_chain(
        k1.verifying_key(),
        vec![r1.clone(), r2],
        Vec::<KeyRevocation>::new(),
    );
    let v = verify_key_chain(&good);
    assert!(v.valid);
    assert_eq!(v.current_key, k3.public_key_hex());

    let mut forged = create_rotation(&intruder, k3.verifying_key(), &id, RotationReason::Manual)
        .unwrap();
    forged.previous_key = k2.public_key_hex();
    let bad = build_key_chain(k1.verifying_key(), vec![r1, forged], Vec::<KeyRevocation>::new());
    let v = verify_key_chain(&bad);
    assert!(!v.valid);
    assert_eq!(v.broken_at, Some(1));
    assert_eq!(v.failure, Some(ChainBreak::BadSignature));
    assert_eq!(v.current_key, k2.public_key_hex());
}

#[test]
fn unverified_revocation_is_ignored() {
    let k1 = Ed25519KeyPair::generate();
    let stranger = Ed25519KeyPair::generate();
    let id = soul_identity::derive_identifier(k1.verifying_key());

    // anyone can write a revocation statement; it only counts once an
    // authority key checks out
    let statement = create_revocation(&stranger, &k1.public_key_hex(), &id, "griefing").unwrap();
    let chain = build_key_chain(k1.verifying_key(), vec![], vec![statement]);
    assert!(!is_key_revoked(&chain, &k1.public_key_hex()));

    let chain = chain.verify_revocations(&[*k1.verifying_key()]);
    assert!(!is_key_revoked(&chain, &k1.public_key_hex()));
}
