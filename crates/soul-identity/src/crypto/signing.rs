//! Ed25519 signing and verification.
//!
//! Verification is a predicate: every `verify*` function answers `bool`
//! and never errors, including on malformed signature text.

use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

/// Sign a message with an Ed25519 signing key.
pub fn sign(signing_key: &SigningKey, message: &[u8]) -> Signature {
    signing_key.sign(message)
}

/// Verify an Ed25519 signature against a public key and message.
pub fn verify(verifying_key: &VerifyingKey, message: &[u8], signature: &Signature) -> bool {
    verifying_key.verify(message, signature).is_ok()
}

/// Sign a message and return the signature as standard base64.
pub fn sign_to_base64(signing_key: &SigningKey, message: &[u8]) -> String {
    let sig = sign(signing_key, message);
    base64::engine::general_purpose::STANDARD.encode(sig.to_bytes())
}

/// Verify a base64-encoded signature. Undecodable input is `false`.
pub fn verify_from_base64(verifying_key: &VerifyingKey, message: &[u8], signature_b64: &str) -> bool {
    let Ok(sig_bytes) = base64::engine::general_purpose::STANDARD.decode(signature_b64) else {
        return false;
    };
    let Ok(sig_array): std::result::Result<[u8; 64], _> = sig_bytes.try_into() else {
        return false;
    };
    verify(verifying_key, message, &Signature::from_bytes(&sig_array))
}

/// UTF-8 encode `message` and sign it, returning base64.
pub fn sign_str(signing_key: &SigningKey, message: &str) -> String {
    sign_to_base64(signing_key, message.as_bytes())
}

/// Counterpart of [`sign_str`].
pub fn verify_str(verifying_key: &VerifyingKey, message: &str, signature_b64: &str) -> bool {
    verify_from_base64(verifying_key, message.as_bytes(), signature_b64)
}
