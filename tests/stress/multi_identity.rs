//! Stress test: create 100 identities, verify all have unique identifiers,
//! and all can publish documents and exchange receipts.

use std::collections::HashSet;

use soul_identity::document::{verify_document, DocumentOptions};
use soul_identity::identity::{identifier_to_public_key, IdentityAnchor};
use soul_identity::receipt::{verify_receipt, InteractionQuality};

#[test]
fn stress_100_unique_identities() {
    let mut ids = HashSet::new();

    for i in 0..100 {
        let anchor = IdentityAnchor::new(Some(format!("agent-{i}")));
        let id = anchor.id().clone();

        assert_eq!(
            &identifier_to_public_key(&id).expect("identifier should invert"),
            anchor.verifying_key()
        );
        assert!(ids.insert(id.clone()), "Duplicate identifier found: {id}");
    }

    assert_eq!(ids.len(), 100);
}

#[test]
fn stress_100_identities_publish_documents() {
    let anchors: Vec<IdentityAnchor> = (0..100)
        .map(|i| IdentityAnchor::new(Some(format!("agent-{i}"))))
        .collect();

    for (i, anchor) in anchors.iter().enumerate() {
        let doc = anchor
            .to_document(DocumentOptions::new(format!("agent-{i}")), None, None)
            .expect("document creation should succeed");
        assert!(verify_document(&doc), "Document of agent-{i} should verify");
    }
}

#[test]
fn stress_ring_of_countersigned_receipts() {
    let mut anchors: Vec<IdentityAnchor> = (0..50).map(|_| IdentityAnchor::new(None)).collect();
    let n = anchors.len();

    for i in 0..n {
        let to = anchors[(i + 1) % n].id().clone();
        let mut receipt = anchors[i]
            .issue_receipt(to, "relay", InteractionQuality::Neutral, None)
            .expect("issuing should succeed");
        anchors[(i + 1) % n]
            .countersign(&mut receipt)
            .expect("recipient should countersign");

        let v = verify_receipt(&receipt);
        assert!(v.is_valid, "Receipt {i} should be valid");
        assert_eq!(v.to_valid, Some(true));
    }

    assert!(anchors.iter().all(|a| a.receipt_sequence() == 1));
}
