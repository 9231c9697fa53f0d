//! Sign/verify round trips over canonical event bytes for every key type

use auditlog_crypto::{
    generate_key_pem, verify_signature, EventSigner, KeyPair, Keyring, SignatureVerifier,
    SigningScheme, VerificationKey,
};
use auditlog_types::{canonicalize, Event};
use rstest::rstest;

fn sample_event() -> Event {
    Event::new("user logged in")
        .with_actor("alice")
        .with_action("login")
        .with_target("console")
        .with_status("success")
        .with_field("ip", "10.0.0.1")
}

#[rstest]
#[case(SigningScheme::Ed25519)]
#[case(SigningScheme::EcdsaP256Sha256)]
#[case(SigningScheme::EcdsaP384Sha384)]
fn test_round_trip(#[case] scheme: SigningScheme) {
    let generated = generate_key_pem(scheme).unwrap();
    let signer: Box<dyn EventSigner> =
        Box::new(KeyPair::from_pkcs8_pem(&generated.private_key_pem).unwrap());

    let canonical = canonicalize(&sample_event()).unwrap();
    let signature = signer.sign(&canonical).unwrap();
    let public_key = signer.public_key_pem().unwrap();
    assert_eq!(public_key, generated.public_key_pem);

    assert!(verify_signature(&canonical, signature.as_bytes(), public_key.as_str()).unwrap());
}

#[rstest]
#[case(SigningScheme::Ed25519)]
#[case(SigningScheme::EcdsaP256Sha256)]
fn test_any_field_mutation_breaks_signature(#[case] scheme: SigningScheme) {
    let (signer, _) = KeyPair::generate(scheme).unwrap();
    let verifier = VerificationKey::from_spki_der(&signer.public_key_to_der().unwrap()).unwrap();

    let event = sample_event();
    let signature = signer.sign(&canonicalize(&event).unwrap()).unwrap();

    let mutations: Vec<Event> = vec![
        Event {
            message: "user logged out".into(),
            ..event.clone()
        },
        event.clone().with_actor("mallory"),
        event.clone().with_action("logout"),
        event.clone().with_target("database"),
        event.clone().with_status("failure"),
        event.clone().with_source("elsewhere"),
        event.clone().with_field("ip", "10.0.0.2"),
        Event {
            actor: None,
            ..event.clone()
        },
    ];

    for mutated in mutations {
        let bytes = canonicalize(&mutated).unwrap();
        assert!(
            !SignatureVerifier::verify(&verifier, &bytes, signature.as_bytes()),
            "mutation accepted: {:?}",
            mutated
        );
    }
}

#[test]
fn test_rotated_keys_in_keyring() {
    let old = KeyPair::generate_ecdsa_p256().unwrap();
    let new = KeyPair::generate_ed25519().unwrap();

    let mut keyring = Keyring::new();
    for kp in [&old, &new] {
        keyring.add_key(VerificationKey::from_spki_der(&kp.public_key_to_der().unwrap()).unwrap());
    }

    let canonical = canonicalize(&sample_event()).unwrap();
    for kp in [&old, &new] {
        let sig = kp.sign(&canonical).unwrap();
        assert!(keyring.verify(&canonical, sig.as_bytes()));
    }

    let stranger = KeyPair::generate_ed25519().unwrap();
    let sig = stranger.sign(&canonical).unwrap();
    assert!(!keyring.verify(&canonical, sig.as_bytes()));
}
