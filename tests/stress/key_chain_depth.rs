//! Stress test: long rotation chains.
//!
//! Rotates one identity many times and checks that the chain still verifies
//! end to end, that every intermediate link can be located when broken, and
//! that the identifier never moves.

use soul_identity::document::{verify_document_with_chain, DocumentOptions};
use soul_identity::identity::IdentityAnchor;
use soul_identity::keychain::{verify_key_chain, ChainBreak, KeyChain, RotationReason};

const DEPTH: usize = 100;

fn deep_anchor() -> IdentityAnchor {
    let mut anchor = IdentityAnchor::new(Some("long-lived".into()));
    for i in 0..DEPTH {
        let reason = if i % 2 == 0 {
            RotationReason::Scheduled
        } else {
            RotationReason::PolicyRequired
        };
        anchor = anchor.rotate(reason).expect("rotation should succeed");
    }
    anchor
}

#[test]
fn stress_100_rotations_verify() {
    let anchor = deep_anchor();
    let chain = anchor.chain();

    assert_eq!(chain.rotations.len(), DEPTH);
    assert_eq!(&chain.identifier().unwrap(), anchor.id());

    let v = verify_key_chain(chain);
    assert!(v.valid);
    assert_eq!(v.current_key, anchor.public_key_hex());

    let doc = anchor
        .to_document(DocumentOptions::new("long-lived"), None, None)
        .unwrap();
    assert_eq!(
        doc.proof.verification_method,
        format!("{}#key-{}", anchor.id(), DEPTH + 1)
    );
    assert!(verify_document_with_chain(&doc, chain));
}

#[test]
fn stress_break_located_at_every_depth() {
    let anchor = deep_anchor();
    let chain = anchor.chain();

    for broken in [0, 1, DEPTH / 2, DEPTH - 1] {
        let mut tampered = chain.clone();
        let donor = chain.rotations[(broken + 1) % DEPTH].signature.clone();
        tampered.rotations[broken].signature = donor;

        let v = verify_key_chain(&tampered);
        assert!(!v.valid);
        assert_eq!(v.broken_at, Some(broken));
        assert_eq!(v.failure, Some(ChainBreak::BadSignature));
        let expected = if broken == 0 {
            chain.original_key.clone()
        } else {
            chain.rotations[broken - 1].new_key.clone()
        };
        assert_eq!(v.current_key, expected);
    }
}

#[test]
fn stress_dropped_link_is_discontinuous() {
    let anchor = deep_anchor();
    let mut chain = anchor.chain().clone();
    chain.rotations.remove(DEPTH / 2);

    let v = verify_key_chain(&chain);
    assert!(!v.valid);
    assert_eq!(v.broken_at, Some(DEPTH / 2));
    assert_eq!(v.failure, Some(ChainBreak::Discontinuous));
}

#[test]
fn stress_chain_survives_json_roundtrip() {
    let anchor = deep_anchor();
    let json = serde_json::to_string(anchor.chain()).unwrap();
    let back: KeyChain = serde_json::from_str(&json).unwrap();
    assert_eq!(&back, anchor.chain());
    assert!(verify_key_chain(&back).valid);
}
