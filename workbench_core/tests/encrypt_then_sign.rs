// course_site/workbench_core/tests/encrypt_then_sign.rs

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use workbench_core::{
    KeyMaterial, RsaProvider, Session, Severity, VerifyOutcome, WorkbenchConfig, WorkbenchError,
};

fn keyed_session() -> Session<RsaProvider> {
    let mut session = Session::new(RsaProvider::new(), WorkbenchConfig::default());
    session.generate_key_pairs().expect("key generation");
    session
}

fn flip_byte(b64: &str, index: usize) -> String {
    let mut bytes = STANDARD.decode(b64).expect("valid base64");
    bytes[index] ^= 0x01;
    STANDARD.encode(bytes)
}

#[test]
fn round_trip_for_short_and_maximal_messages() {
    let mut session = keyed_session();
    let longest = "z".repeat(140);

    for message in ["a", "Hello, RSA!", longest.as_str()] {
        session.encrypt_and_sign(message).expect("encrypt and sign");

        let encrypted = session.state().encrypted_message.clone().unwrap();
        let signature = session.state().signature.clone().unwrap();
        // 2048-bit modulus: 256-byte ciphertext and signature.
        assert_eq!(STANDARD.decode(&encrypted).unwrap().len(), 256);
        assert_eq!(STANDARD.decode(&signature).unwrap().len(), 256);

        let outcome = session.verify_and_decrypt(None, None).expect("verify");
        assert_eq!(outcome, VerifyOutcome::Verified(message.to_string()));
        assert_eq!(session.state().verification, Some(true));
        assert_eq!(session.state().decrypted_message.as_deref(), Some(message));
    }
}

#[test]
fn exported_keys_are_rsa_jwks() {
    let session = keyed_session();
    let encryption = session.state().encryption_keys.clone().unwrap();
    let signing = session.state().signing_keys.clone().unwrap();

    let public: serde_json::Value = serde_json::from_str(&encryption.public_key).unwrap();
    assert_eq!(public["kty"], "RSA");
    assert_eq!(public["alg"], "RSA-OAEP-256");
    assert_eq!(public["e"], "AQAB");
    assert!(public.get("d").is_none());

    let private: serde_json::Value = serde_json::from_str(&signing.private_key).unwrap();
    assert_eq!(private["alg"], "PS256");
    for member in ["d", "p", "q", "dp", "dq", "qi"] {
        assert!(private[member].is_string(), "missing {member}");
    }
}

#[test]
fn tampering_with_ciphertext_or_signature_is_detected() {
    let mut session = keyed_session();
    session.encrypt_and_sign("transfer 100 coins").unwrap();
    let encrypted = session.state().encrypted_message.clone().unwrap();
    let signature = session.state().signature.clone().unwrap();

    for index in [0, 100, 255] {
        let tampered = flip_byte(&encrypted, index);
        let outcome = session
            .verify_and_decrypt(Some(&tampered), Some(&signature))
            .unwrap();
        assert_eq!(outcome, VerifyOutcome::Rejected);
        assert_eq!(session.state().verification, Some(false));
        assert!(session.state().decrypted_message.is_none());
    }

    let tampered = flip_byte(&signature, 42);
    assert_eq!(
        session.verify_and_decrypt(None, Some(&tampered)).unwrap(),
        VerifyOutcome::Rejected
    );
    assert_eq!(
        session.log_entries().last().unwrap().details,
        "Signature verification failed - cannot decrypt message"
    );
}

#[test]
fn another_session_with_imported_keys_can_open_the_message() {
    let mut sender = keyed_session();
    sender.encrypt_and_sign("shared secret").unwrap();
    let encryption = sender.state().encryption_keys.clone().unwrap();
    let signing = sender.state().signing_keys.clone().unwrap();
    let material = KeyMaterial {
        encryption_public: encryption.public_key,
        encryption_private: encryption.private_key,
        signing_public: signing.public_key,
        signing_private: signing.private_key,
    };

    let mut receiver = Session::new(RsaProvider::new(), WorkbenchConfig::default());
    receiver.import_keys(material.clone()).unwrap();
    receiver.import_keys(material).unwrap();

    let outcome = receiver
        .verify_and_decrypt(
            sender.state().encrypted_message.as_deref(),
            sender.state().signature.as_deref(),
        )
        .unwrap();
    assert_eq!(outcome, VerifyOutcome::Verified("shared secret".to_string()));
}

#[test]
fn keys_from_another_session_fail_verification() {
    let mut sender = keyed_session();
    sender.encrypt_and_sign("hello").unwrap();
    let mut stranger = keyed_session();

    let outcome = stranger
        .verify_and_decrypt(
            sender.state().encrypted_message.as_deref(),
            sender.state().signature.as_deref(),
        )
        .unwrap();
    assert_eq!(outcome, VerifyOutcome::Rejected);
}

#[test]
fn swapped_key_documents_are_rejected_on_import() {
    let source = keyed_session();
    let encryption = source.state().encryption_keys.clone().unwrap();
    let signing = source.state().signing_keys.clone().unwrap();

    let mut session = Session::new(RsaProvider::new(), WorkbenchConfig::default());
    let err = session
        .import_keys(KeyMaterial {
            encryption_public: signing.public_key,
            encryption_private: encryption.private_key,
            signing_public: encryption.public_key,
            signing_private: signing.private_key,
        })
        .unwrap_err();
    assert!(matches!(err, WorkbenchError::InvalidImportKey { .. }));
    assert!(!session.has_keys());
    assert_eq!(session.log_entries().last().unwrap().severity, Severity::Error);
}

#[test]
fn multibyte_message_over_oaep_capacity_fails_gracefully() {
    let mut session = keyed_session();
    // 140 characters but 420 bytes, more than OAEP-SHA256 fits in 256 bytes.
    let err = session.encrypt_and_sign(&"€".repeat(140)).unwrap_err();
    assert!(!err.is_validation());
    assert!(session.state().encrypted_message.is_none());
    assert_eq!(
        session.state().error.as_deref(),
        Some("Failed to encrypt and sign. See the operation log for details.")
    );
}
