//! Edge case tests: malformed identifiers, canonicalization corners,
//! empty soul file sets, document tampering, receipt misuse, and key chain
//! oddities.

use std::collections::{BTreeMap, HashMap};

use soul_identity::canonical::{canonical_bytes, canonicalize};
use soul_identity::crypto::{sign_str, verify_str};
use soul_identity::document::{create_document, verify_document, DocumentOptions, PROOF_TYPE};
use soul_identity::identity::{identifier_to_public_key, AgentId, IdentityAnchor};
use soul_identity::integrity::{
    compute_soul_hash, create_attestation, hash_content, verify_attestation, ContentHash,
};
use soul_identity::keychain::{
    build_key_chain, create_rotation, is_key_revoked, verify_key_chain, ChainBreak, KeyChain,
    KeyRevocation, RotationReason,
};
use soul_identity::receipt::{verify_receipt, InteractionQuality, ReceiptBuilder};
use soul_identity::{Ed25519KeyPair, IdentityError};

// === Identifier Edge Cases ===

#[test]
fn edge_identifier_rejects_malformed_input() {
    let good = IdentityAnchor::new(None).id().clone();
    let encoded = good.as_str().trim_start_matches("did:soul:");

    let cases = [
        String::new(),
        "did:soul:".to_string(),
        format!("did:key:{encoded}"),
        format!("DID:SOUL:{encoded}"),
        format!("did:soul:{encoded}0"), // '0' is outside base58
        format!("did:soul:{}", &encoded[..20]),
        format!("did:soul:{encoded}{encoded}"),
    ];
    for case in cases {
        let err = AgentId::parse(&case).unwrap_err();
        assert!(err.is_format_error(), "{case:?} gave {err:?}");
    }
}

#[test]
fn edge_identifier_from_str() {
    let anchor = IdentityAnchor::new(None);
    let parsed: AgentId = anchor.id().as_str().parse().unwrap();
    assert_eq!(&parsed, anchor.id());
    assert_eq!(
        &identifier_to_public_key(&parsed).unwrap(),
        anchor.verifying_key()
    );
}

// === Signing Edge Cases ===

#[test]
fn edge_sign_empty_and_unicode_messages() {
    let kp = Ed25519KeyPair::generate();
    for msg in ["", "soul", "ümlaut ✓ 🦀", "line\nbreak"] {
        let sig = sign_str(kp.signing_key(), msg);
        assert!(verify_str(kp.verifying_key(), msg, &sig));
    }
    assert!(!verify_str(kp.verifying_key(), "x", "not base64!"));
    assert!(!verify_str(kp.verifying_key(), "x", ""));
}

// === Canonicalization Edge Cases ===

#[test]
fn edge_canonical_empty_containers() {
    assert_eq!(canonicalize(&serde_json::json!({})).unwrap(), "{}");
    assert_eq!(canonicalize(&serde_json::json!([])).unwrap(), "[]");
    assert_eq!(
        canonicalize(&serde_json::json!({"a": {}, "b": [[]], "c": null})).unwrap(),
        r#"{"a":{},"b":[[]],"c":null}"#
    );
}

#[test]
fn edge_canonical_map_types_agree() {
    let hash: HashMap<&str, i32> = HashMap::from([("z", 1), ("a", 2), ("m", 3)]);
    let tree: BTreeMap<&str, i32> = hash.iter().map(|(k, v)| (*k, *v)).collect();
    assert_eq!(canonical_bytes(&hash).unwrap(), canonical_bytes(&tree).unwrap());
}

#[test]
fn edge_canonical_unicode_passthrough() {
    let canonical = canonicalize(&serde_json::json!({"name": "café 🦀"})).unwrap();
    assert_eq!(canonical, "{\"name\":\"café 🦀\"}");
}

// === Integrity Edge Cases ===

#[test]
fn edge_empty_soul_file_set() {
    let empty: Vec<(&str, &str)> = Vec::new();
    let h = compute_soul_hash(empty.clone());
    // digest of the empty joined string
    assert_eq!(h, hash_content(""));

    let kp = Ed25519KeyPair::generate();
    let att = create_attestation(empty.clone(), &kp).unwrap();
    assert!(att.files.is_empty());
    assert!(verify_attestation(&att, empty, kp.verifying_key()).intact);
}

#[test]
fn edge_empty_file_differs_from_missing_file() {
    let with_empty = compute_soul_hash([("SOUL.md", "x"), ("NOTES.md", "")]);
    let without = compute_soul_hash([("SOUL.md", "x")]);
    assert_ne!(with_empty, without);
}

#[test]
fn edge_swapped_contents_change_hash() {
    let kp = Ed25519KeyPair::generate();
    let two = create_attestation([("A.md", "1"), ("B.md", "2")], &kp).unwrap();
    let swapped = verify_attestation(&two, [("A.md", "2"), ("B.md", "1")], kp.verifying_key());
    assert!(swapped.signature_valid);
    assert!(!swapped.hash_match);
}

#[test]
fn edge_content_hash_parse() {
    let h = hash_content("abc");
    assert_eq!(ContentHash::parse(h.as_str()).unwrap(), h);
    for bad in ["abc", "sha256:", "md5:abcd", "sha256:zz"] {
        assert!(ContentHash::parse(bad).unwrap_err().is_format_error());
    }
    let upper = h.as_str().to_uppercase().replace("SHA256", "sha256");
    assert!(ContentHash::parse(&upper).is_err());
}

#[test]
fn edge_attestation_edited_field_breaks_signature() {
    let kp = Ed25519KeyPair::generate();
    let files = [("SOUL.md", "v1")];
    let mut att = create_attestation(files, &kp).unwrap();
    att.attested_at = "2000-01-01T00:00:00.000Z".into();
    let result = verify_attestation(&att, files, kp.verifying_key());
    assert!(!result.signature_valid);
    assert!(result.hash_match);
}

// === Document Edge Cases ===

#[test]
fn edge_document_minimal_options() {
    let kp = Ed25519KeyPair::generate();
    let doc = create_document(&kp, DocumentOptions::default(), None, None).unwrap();
    assert_eq!(doc.proof.proof_type, PROOF_TYPE);
    assert!(verify_document(&doc));
    let json = serde_json::to_value(&doc).unwrap();
    assert!(json.get("description").is_none());
    assert!(json.get("integrity").is_none());
}

#[test]
fn edge_document_adding_field_breaks_proof() {
    let kp = Ed25519KeyPair::generate();
    let doc = create_document(&kp, DocumentOptions::new("a"), None, None).unwrap();
    let mut value = serde_json::to_value(&doc).unwrap();
    value["injected"] = serde_json::json!(true);
    let doc: soul_identity::AgentDocument = serde_json::from_value(value).unwrap();
    assert!(!verify_document(&doc));
}

#[test]
fn edge_document_with_garbage_identifier() {
    let kp = Ed25519KeyPair::generate();
    let mut doc = create_document(&kp, DocumentOptions::new("a"), None, None).unwrap();
    doc.id = AgentId("did:soul:not-a-key".into());
    assert!(!verify_document(&doc));
}

#[test]
fn edge_document_from_bad_json() {
    let err = soul_identity::AgentDocument::from_json("{\"id\": 5}").unwrap_err();
    assert!(matches!(err, IdentityError::SerializationError(_)));
}

// === Receipt Edge Cases ===

#[test]
fn edge_receipt_to_self() {
    let kp = Ed25519KeyPair::generate();
    let id = AgentId::from_verifying_key(kp.verifying_key());
    let mut receipt = ReceiptBuilder::new(id.clone(), id, "reflect", InteractionQuality::Neutral)
        .sign(&kp, 0)
        .unwrap();
    receipt.countersign(&kp).unwrap();
    assert!(verify_receipt(&receipt).is_valid);
}

#[test]
fn edge_receipt_swapped_proofs() {
    let a = IdentityAnchor::new(None);
    let mut issuer = IdentityAnchor::new(None);
    let mut receipt = issuer
        .issue_receipt(a.id().clone(), "x", InteractionQuality::Positive, None)
        .unwrap();
    a.countersign(&mut receipt).unwrap();

    let to = receipt.to_proof.take().unwrap();
    receipt.to_proof = Some(receipt.from_proof.clone());
    receipt.from_proof = to;
    let v = verify_receipt(&receipt);
    assert!(!v.from_valid);
    assert_eq!(v.to_valid, Some(false));
}

// === Key Chain Edge Cases ===

#[test]
fn edge_chain_with_malformed_origin() {
    let chain = KeyChain {
        original_key: "zz".into(),
        current_key: "zz".into(),
        rotations: vec![],
        revocations: vec![],
    };
    let v = verify_key_chain(&chain);
    assert!(!v.valid);
    assert_eq!(v.failure, Some(ChainBreak::MalformedOrigin));
}

#[test]
fn edge_chain_stated_current_key_lies() {
    let k1 = Ed25519KeyPair::generate();
    let other = Ed25519KeyPair::generate();
    let mut chain = KeyChain::new(k1.verifying_key());
    chain.current_key = other.public_key_hex();
    let v = verify_key_chain(&chain);
    assert!(!v.valid);
    assert_eq!(v.failure, Some(ChainBreak::CurrentKeyMismatch));
    assert_eq!(v.broken_at, None);
    assert_eq!(v.current_key, k1.public_key_hex());
}

#[test]
fn edge_rotation_for_another_identity() {
    let k1 = Ed25519KeyPair::generate();
    let k2 = Ed25519KeyPair::generate();
    let elsewhere = AgentId::from_verifying_key(k2.verifying_key());
    let r = create_rotation(&k1, k2.verifying_key(), &elsewhere, RotationReason::Manual).unwrap();
    let chain = build_key_chain(k1.verifying_key(), vec![r], Vec::<KeyRevocation>::new());
    let v = verify_key_chain(&chain);
    assert_eq!(v.failure, Some(ChainBreak::ForeignIdentity));
    assert_eq!(v.broken_at, Some(0));
}

#[test]
fn edge_rotate_to_same_key_rejected() {
    let k1 = Ed25519KeyPair::generate();
    let chain = KeyChain::new(k1.verifying_key());
    let err = chain
        .rotate(&k1, k1.verifying_key(), RotationReason::Manual)
        .unwrap_err();
    assert!(matches!(err, IdentityError::InvalidKey(_)));
}

#[test]
fn edge_revocation_lookup_ignores_hex_case() {
    let anchor = IdentityAnchor::new(None);
    let key = anchor.public_key_hex();
    let anchor = anchor
        .rotate(RotationReason::Compromised)
        .unwrap()
        .revoke_key(&key, "lost laptop")
        .unwrap();
    assert!(is_key_revoked(anchor.chain(), &key.to_uppercase()));
}

#[test]
fn edge_revocations_missing_from_json() {
    let k1 = Ed25519KeyPair::generate();
    let json = format!(
        r#"{{"originalKey":"{0}","currentKey":"{0}","rotations":[]}}"#,
        k1.public_key_hex()
    );
    let chain: KeyChain = serde_json::from_str(&json).unwrap();
    assert!(chain.revocations.is_empty());
    assert!(verify_key_chain(&chain).valid);
}
