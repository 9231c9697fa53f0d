//! Per-event verification
//!
//! Every event the service returns goes through up to three checks: its
//! signature, its membership proof against the root it claims to be under,
//! and the trust status of that root. Each check is recorded separately in
//! [`EventChecks`] and folded into a single [`VerificationVerdict`]. A
//! failing check is data about the event, never an error of the call.

use crate::config::AuditConfig;
use crate::error::{Error, Result};
use auditlog_crypto::{load_public_key, Keyring, VerificationKey};
use auditlog_merkle::{hash_leaf, verify_membership, InclusionProof};
use auditlog_types::{canonicalize, Event, Hex, SearchEvent, SignedEvent, TreeHead};
use serde::Serialize;

/// Overall verdict for one event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationVerdict {
    /// Signature and proofs all checked out
    Verified,
    /// The signature did not verify (or was required and missing)
    SignatureInvalid,
    /// The membership proof did not verify or was malformed
    ProofInvalid,
    /// Nothing failed, but the signature was not checked
    Unverified,
    /// The root the event is proven under is not consistent with the tracked root
    RootMismatch,
}

impl VerificationVerdict {
    /// Whether the event fully verified
    pub fn is_verified(&self) -> bool {
        matches!(self, VerificationVerdict::Verified)
    }
}

impl std::fmt::Display for VerificationVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            VerificationVerdict::Verified => "verified",
            VerificationVerdict::SignatureInvalid => "signature-invalid",
            VerificationVerdict::ProofInvalid => "proof-invalid",
            VerificationVerdict::Unverified => "unverified",
            VerificationVerdict::RootMismatch => "root-mismatch",
        };
        f.write_str(name)
    }
}

/// Outcome of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckOutcome {
    Passed,
    Failed,
    Skipped,
}

impl CheckOutcome {
    fn from_bool(ok: bool) -> Self {
        if ok {
            CheckOutcome::Passed
        } else {
            CheckOutcome::Failed
        }
    }
}

/// The individual checks run on one event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventChecks {
    pub signature: CheckOutcome,
    pub membership: CheckOutcome,
    pub root_consistency: CheckOutcome,
}

impl EventChecks {
    /// All checks skipped
    pub fn skipped() -> Self {
        Self {
            signature: CheckOutcome::Skipped,
            membership: CheckOutcome::Skipped,
            root_consistency: CheckOutcome::Skipped,
        }
    }

    /// Fold the checks into a verdict
    ///
    /// A failure wins over a pass, checked in the order signature,
    /// membership, root. Without a passing signature the best possible
    /// verdict is [`VerificationVerdict::Unverified`].
    pub fn verdict(&self) -> VerificationVerdict {
        if self.signature == CheckOutcome::Failed {
            VerificationVerdict::SignatureInvalid
        } else if self.membership == CheckOutcome::Failed {
            VerificationVerdict::ProofInvalid
        } else if self.root_consistency == CheckOutcome::Failed {
            VerificationVerdict::RootMismatch
        } else if self.signature == CheckOutcome::Passed {
            VerificationVerdict::Verified
        } else {
            VerificationVerdict::Unverified
        }
    }
}

/// A search result together with how it verified
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifiedEvent {
    /// The event as returned by the service
    pub record: SearchEvent,
    pub checks: EventChecks,
    pub verdict: VerificationVerdict,
}

impl VerifiedEvent {
    /// The event itself
    pub fn event(&self) -> &Event {
        &self.record.envelope.event
    }

    /// The envelope the event was stored in
    pub fn envelope(&self) -> &SignedEvent {
        &self.record.envelope
    }
}

/// Checks signatures and membership proofs of individual events
#[derive(Debug, Clone)]
pub struct EventVerifier {
    keyring: Keyring,
    require_signatures: bool,
    skip_signatures: bool,
    verify_proofs: bool,
}

impl EventVerifier {
    /// Create a verifier trusting the keys in `keyring`
    ///
    /// With an empty keyring the key embedded in each envelope is used.
    pub fn new(keyring: Keyring) -> Self {
        Self {
            keyring,
            require_signatures: false,
            skip_signatures: false,
            verify_proofs: true,
        }
    }

    /// Build a verifier from client configuration
    ///
    /// Loads the verification key and every trusted key; `own_key` (the
    /// public half of the client's signing key) is trusted as well. A key
    /// that cannot be read or parsed is a configuration error.
    pub fn from_config(config: &AuditConfig, own_key: Option<VerificationKey>) -> Result<Self> {
        let mut keyring = Keyring::new();
        let paths = config
            .verification_key_path
            .iter()
            .chain(config.trusted_key_paths.iter());
        for path in paths {
            let key = load_public_key(path).map_err(|e| {
                Error::Config(format!(
                    "failed to load verification key {}: {}",
                    path.display(),
                    e
                ))
            })?;
            keyring.add_key(key);
        }
        if let Some(key) = own_key {
            keyring.add_key(key);
        }
        tracing::debug!("Event verifier trusts {} key(s)", keyring.len());

        Ok(Self {
            keyring,
            require_signatures: config.require_signatures,
            skip_signatures: config.skip_event_verification,
            verify_proofs: config.verify_proofs,
        })
    }

    /// Treat missing signatures as invalid
    pub fn with_require_signatures(mut self, require: bool) -> Self {
        self.require_signatures = require;
        self
    }

    /// Do not check signatures at all
    pub fn with_skip_signatures(mut self, skip: bool) -> Self {
        self.skip_signatures = skip;
        self
    }

    /// Enable or disable proof checks
    pub fn with_verify_proofs(mut self, verify_proofs: bool) -> Self {
        self.verify_proofs = verify_proofs;
        self
    }

    /// Keys trusted for event signatures
    pub fn keyring(&self) -> &Keyring {
        &self.keyring
    }

    /// Check the envelope's signature over `canonical`
    pub fn check_signature(&self, canonical: &[u8], envelope: &SignedEvent) -> CheckOutcome {
        if self.skip_signatures {
            return CheckOutcome::Skipped;
        }

        let Some(signature) = &envelope.signature else {
            return self.missing("no signature");
        };
        let signature = match signature.decode() {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Undecodable event signature: {}", e);
                return CheckOutcome::Failed;
            }
        };

        let embedded = envelope
            .public_key
            .as_deref()
            .map(VerificationKey::from_encoded);

        let ok = if self.keyring.is_empty() {
            match embedded {
                Some(Ok(key)) => key.verify(canonical, &signature),
                Some(Err(e)) => {
                    tracing::warn!("Unparseable envelope public key: {}", e);
                    false
                }
                None => return self.missing("no key to verify the signature with"),
            }
        } else {
            match embedded {
                // Prefer the key the envelope names when we trust it
                Some(Ok(key)) if self.keyring.contains(&key) => key.verify(canonical, &signature),
                _ => self.keyring.verify_any(canonical, &signature).is_some(),
            }
        };

        if !ok {
            tracing::warn!("Event signature failed verification");
        }
        CheckOutcome::from_bool(ok)
    }

    fn missing(&self, what: &str) -> CheckOutcome {
        if self.require_signatures {
            tracing::warn!("Signature required but event has {}", what);
            CheckOutcome::Failed
        } else {
            tracing::debug!("Event has {}, signature not checked", what);
            CheckOutcome::Skipped
        }
    }

    /// Check a membership proof for `canonical` under `root`
    ///
    /// `service_hash`, when present, must equal the recomputed leaf hash.
    pub fn check_membership(
        &self,
        canonical: &[u8],
        service_hash: Option<&Hex>,
        leaf_index: Option<u64>,
        proof: Option<&[Hex]>,
        root: Option<&TreeHead>,
    ) -> CheckOutcome {
        if !self.verify_proofs {
            return CheckOutcome::Skipped;
        }
        if let Some(hash) = service_hash {
            if !leaf_hash_matches(canonical, hash) {
                tracing::warn!("Service hash {} does not match event contents", hash);
                return CheckOutcome::Failed;
            }
        }

        let (Some(leaf_index), Some(proof), Some(root)) = (leaf_index, proof, root) else {
            tracing::warn!("Event is missing membership proof material");
            return CheckOutcome::Failed;
        };
        let proof = match InclusionProof::from_wire(leaf_index, proof) {
            Ok(proof) => proof,
            Err(e) => {
                tracing::warn!("Malformed membership proof: {}", e);
                return CheckOutcome::Failed;
            }
        };
        CheckOutcome::from_bool(verify_membership(canonical, &proof, root))
    }

    /// Run every check on a search result
    ///
    /// `root` is the root the event's proof is against, and `root_check`
    /// says whether that root is consistent with the tracked root.
    pub fn verify_event(
        &self,
        record: SearchEvent,
        root: Option<&TreeHead>,
        root_check: CheckOutcome,
    ) -> Result<VerifiedEvent> {
        let canonical = canonicalize(&record.envelope.event)?;
        let checks = EventChecks {
            signature: self.check_signature(&canonical, &record.envelope),
            membership: self.check_membership(
                &canonical,
                record.hash.as_ref(),
                record.leaf_index,
                record.membership_proof.as_deref(),
                root,
            ),
            root_consistency: if self.verify_proofs {
                root_check
            } else {
                CheckOutcome::Skipped
            },
        };
        let verdict = checks.verdict();
        tracing::debug!(
            "Event at {:?} verified as {} ({:?})",
            record.leaf_index,
            verdict,
            checks
        );
        Ok(VerifiedEvent {
            record,
            checks,
            verdict,
        })
    }
}

/// Whether a service-assigned hash is the leaf hash of `canonical`
pub(crate) fn leaf_hash_matches(canonical: &[u8], hash: &Hex) -> bool {
    match hash.to_sha256() {
        Ok(hash) => hash == hash_leaf(canonical),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditlog_crypto::{KeyPair, SigningScheme};
    use auditlog_merkle::hash_children;
    use auditlog_types::Base64;
    use rstest::rstest;

    fn signed(key: &KeyPair, event: Event, embed_key: bool) -> SignedEvent {
        let canonical = canonicalize(&event).unwrap();
        SignedEvent {
            event,
            signature: Some(key.sign(&canonical).unwrap().to_base64()),
            public_key: embed_key.then(|| key.public_key_to_pem().unwrap().into_string()),
            received_at: None,
        }
    }

    fn verification_key(key: &KeyPair) -> VerificationKey {
        VerificationKey::from_spki_der(&key.public_key_to_der().unwrap()).unwrap()
    }

    fn keyring_with(key: &KeyPair) -> Keyring {
        let mut keyring = Keyring::new();
        keyring.add_key(verification_key(key));
        keyring
    }

    #[rstest]
    #[case(CheckOutcome::Passed, CheckOutcome::Passed, CheckOutcome::Passed, VerificationVerdict::Verified)]
    #[case(CheckOutcome::Failed, CheckOutcome::Failed, CheckOutcome::Failed, VerificationVerdict::SignatureInvalid)]
    #[case(CheckOutcome::Passed, CheckOutcome::Failed, CheckOutcome::Failed, VerificationVerdict::ProofInvalid)]
    #[case(CheckOutcome::Passed, CheckOutcome::Passed, CheckOutcome::Failed, VerificationVerdict::RootMismatch)]
    #[case(CheckOutcome::Skipped, CheckOutcome::Passed, CheckOutcome::Passed, VerificationVerdict::Unverified)]
    #[case(CheckOutcome::Skipped, CheckOutcome::Failed, CheckOutcome::Passed, VerificationVerdict::ProofInvalid)]
    #[case(CheckOutcome::Passed, CheckOutcome::Skipped, CheckOutcome::Skipped, VerificationVerdict::Verified)]
    fn test_verdict_precedence(
        #[case] signature: CheckOutcome,
        #[case] membership: CheckOutcome,
        #[case] root_consistency: CheckOutcome,
        #[case] expected: VerificationVerdict,
    ) {
        let checks = EventChecks {
            signature,
            membership,
            root_consistency,
        };
        assert_eq!(checks.verdict(), expected);
    }

    #[test]
    fn test_signature_with_keyring() {
        let key = KeyPair::generate_ed25519().unwrap();
        let envelope = signed(&key, Event::new("hello"), false);
        let canonical = canonicalize(&envelope.event).unwrap();

        let verifier = EventVerifier::new(keyring_with(&key));
        assert_eq!(
            verifier.check_signature(&canonical, &envelope),
            CheckOutcome::Passed
        );

        let other = KeyPair::generate_ed25519().unwrap();
        let verifier = EventVerifier::new(keyring_with(&other));
        assert_eq!(
            verifier.check_signature(&canonical, &envelope),
            CheckOutcome::Failed
        );
    }

    #[test]
    fn test_untrusted_embedded_key_is_ignored() {
        let trusted = KeyPair::generate_ecdsa_p256().unwrap();
        let attacker = KeyPair::generate_ecdsa_p256().unwrap();
        let envelope = signed(&attacker, Event::new("forged"), true);
        let canonical = canonicalize(&envelope.event).unwrap();

        let verifier = EventVerifier::new(keyring_with(&trusted));
        assert_eq!(
            verifier.check_signature(&canonical, &envelope),
            CheckOutcome::Failed
        );
    }

    #[test]
    fn test_embedded_key_without_keyring() {
        let key = KeyPair::generate_ecdsa_p384().unwrap();
        let envelope = signed(&key, Event::new("hello"), true);
        let canonical = canonicalize(&envelope.event).unwrap();

        let verifier = EventVerifier::new(Keyring::new());
        assert_eq!(
            verifier.check_signature(&canonical, &envelope),
            CheckOutcome::Passed
        );

        let tampered = canonicalize(&Event::new("goodbye")).unwrap();
        assert_eq!(
            verifier.check_signature(&tampered, &envelope),
            CheckOutcome::Failed
        );
    }

    #[rstest]
    #[case(false, CheckOutcome::Skipped)]
    #[case(true, CheckOutcome::Failed)]
    fn test_unsigned_event(#[case] require: bool, #[case] expected: CheckOutcome) {
        let envelope = SignedEvent::unsigned(Event::new("hello"));
        let canonical = canonicalize(&envelope.event).unwrap();
        let verifier = EventVerifier::new(Keyring::new()).with_require_signatures(require);
        assert_eq!(verifier.check_signature(&canonical, &envelope), expected);
    }

    #[test]
    fn test_skip_ignores_corrupt_signature() {
        let mut envelope = SignedEvent::unsigned(Event::new("hello"));
        envelope.signature = Some(Base64::new("%%%".to_string()));
        let canonical = canonicalize(&envelope.event).unwrap();

        let verifier = EventVerifier::new(Keyring::new()).with_skip_signatures(true);
        assert_eq!(
            verifier.check_signature(&canonical, &envelope),
            CheckOutcome::Skipped
        );
        let verifier = EventVerifier::new(Keyring::new());
        assert_eq!(
            verifier.check_signature(&canonical, &envelope),
            CheckOutcome::Failed
        );
    }

    #[test]
    fn test_membership() {
        let first = canonicalize(&Event::new("first")).unwrap();
        let second = canonicalize(&Event::new("second")).unwrap();
        let (a, b) = (hash_leaf(&first), hash_leaf(&second));
        let root = TreeHead::new(2, hash_children(&a, &b));
        let proof = vec![Hex::from(&b)];
        let proof = Some(proof.as_slice());
        let bad = vec![Hex::new("zz".to_string())];
        let verifier = EventVerifier::new(Keyring::new());

        assert_eq!(
            verifier.check_membership(&first, Some(&Hex::from(&a)), Some(0), proof, Some(&root)),
            CheckOutcome::Passed
        );
        // Service hash that does not belong to the event
        assert_eq!(
            verifier.check_membership(&first, Some(&Hex::from(&b)), Some(0), proof, Some(&root)),
            CheckOutcome::Failed
        );
        assert_eq!(
            verifier.check_membership(&first, None, Some(1), proof, Some(&root)),
            CheckOutcome::Failed
        );
        assert_eq!(
            verifier.check_membership(&first, None, Some(0), None, Some(&root)),
            CheckOutcome::Failed
        );
        assert_eq!(
            verifier.check_membership(&first, None, Some(0), Some(bad.as_slice()), Some(&root)),
            CheckOutcome::Failed
        );
        assert_eq!(
            verifier
                .clone()
                .with_verify_proofs(false)
                .check_membership(&first, None, None, None, None),
            CheckOutcome::Skipped
        );
    }

    #[test]
    fn test_verify_event() {
        let key = KeyPair::generate_ed25519().unwrap();
        let envelope = signed(&key, Event::new("only"), false);
        let canonical = canonicalize(&envelope.event).unwrap();
        let leaf = hash_leaf(&canonical);
        let root = TreeHead::new(1, leaf);
        let record = SearchEvent {
            envelope,
            hash: Some(Hex::from(&leaf)),
            leaf_index: Some(0),
            membership_proof: Some(Vec::new()),
            published: false,
        };
        let verifier = EventVerifier::new(keyring_with(&key));

        let verified = verifier
            .verify_event(record.clone(), Some(&root), CheckOutcome::Passed)
            .unwrap();
        assert_eq!(verified.verdict, VerificationVerdict::Verified);
        assert_eq!(verified.event().message, "only");

        let verified = verifier
            .verify_event(record, Some(&root), CheckOutcome::Failed)
            .unwrap();
        assert_eq!(verified.verdict, VerificationVerdict::RootMismatch);
    }

    #[test]
    fn test_from_config_unreadable_key() {
        let config = AuditConfig::default()
            .with_verification_key(std::env::temp_dir().join("auditlog-missing-public.pem"));
        assert!(matches!(
            EventVerifier::from_config(&config, None),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_from_config_loads_keys() {
        let generated = auditlog_crypto::generate_key_pem(SigningScheme::Ed25519).unwrap();
        let path = std::env::temp_dir().join(format!(
            "auditlog-verify-key-{}.pem",
            std::process::id()
        ));
        std::fs::write(&path, generated.public_key_pem.as_str()).unwrap();

        let config = AuditConfig::default().with_trusted_key(path.clone());
        let verifier = EventVerifier::from_config(&config, None).unwrap();
        assert_eq!(verifier.keyring().len(), 1);

        let _ = std::fs::remove_file(&path);
    }
}
