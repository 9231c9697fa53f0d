//! Signature verification using aws-lc-rs
//!
//! A signature that does not verify is an expected data condition, so
//! verification returns `bool`. Only a public key that cannot be parsed
//! is an error.

use crate::error::{Error, Result};
use crate::hash::sha256;
use crate::signing::{PublicKeyPem, SigningScheme};
use aws_lc_rs::signature::{
    UnparsedPublicKey, ECDSA_P256_SHA256_ASN1, ECDSA_P384_SHA384_ASN1, ED25519,
};
use base64::Engine;
use const_oid::db::rfc5912::{ID_EC_PUBLIC_KEY, SECP_256_R_1, SECP_384_R_1};
use const_oid::db::rfc8410::ID_ED_25519;
use const_oid::ObjectIdentifier;

/// Checks signatures over canonical event bytes
pub trait SignatureVerifier: Send + Sync {
    /// Whether `signature` is a valid signature over `canonical`
    fn verify(&self, canonical: &[u8], signature: &[u8]) -> bool;
}

/// A public key for verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationKey {
    /// Raw public key bytes
    bytes: Vec<u8>,
    /// The scheme to use for verification
    scheme: SigningScheme,
    /// The SubjectPublicKeyInfo the key was parsed from
    spki_der: Vec<u8>,
}

impl VerificationKey {
    /// Parse a DER-encoded SubjectPublicKeyInfo
    pub fn from_spki_der(der: &[u8]) -> Result<Self> {
        use spki::SubjectPublicKeyInfoRef;

        let spki = SubjectPublicKeyInfoRef::try_from(der)
            .map_err(|e| Error::InvalidKeyFormat(format!("failed to parse SPKI: {}", e)))?;

        let scheme = if spki.algorithm.oid == ID_ED_25519 {
            SigningScheme::Ed25519
        } else if spki.algorithm.oid == ID_EC_PUBLIC_KEY {
            let params = spki.algorithm.parameters.ok_or_else(|| {
                Error::InvalidKeyFormat("EC key missing curve parameters".to_string())
            })?;
            let curve = ObjectIdentifier::from_bytes(params.value())
                .map_err(|e| Error::Der(format!("failed to parse EC curve OID: {}", e)))?;

            if curve == SECP_256_R_1 {
                SigningScheme::EcdsaP256Sha256
            } else if curve == SECP_384_R_1 {
                SigningScheme::EcdsaP384Sha384
            } else {
                return Err(Error::UnsupportedAlgorithm(format!(
                    "unsupported EC curve: {}",
                    curve
                )));
            }
        } else {
            return Err(Error::UnsupportedAlgorithm(format!(
                "unsupported public key algorithm: {}",
                spki.algorithm.oid
            )));
        };

        Ok(Self {
            bytes: spki.subject_public_key.raw_bytes().to_vec(),
            scheme,
            spki_der: der.to_vec(),
        })
    }

    /// Parse a PEM-encoded public key (`-----BEGIN PUBLIC KEY-----`)
    pub fn from_pem(pem_str: &str) -> Result<Self> {
        let parsed = pem::parse(pem_str)
            .map_err(|e| Error::Pem(format!("failed to parse public key PEM: {}", e)))?;

        if parsed.tag() != "PUBLIC KEY" {
            return Err(Error::InvalidKeyFormat(format!(
                "expected PUBLIC KEY PEM block, got {}",
                parsed.tag()
            )));
        }

        Self::from_spki_der(parsed.contents())
    }

    /// Parse a public key as it appears in an envelope: PEM, or base64 SPKI DER
    pub fn from_encoded(encoded: &str) -> Result<Self> {
        let trimmed = encoded.trim();
        if trimmed.starts_with("-----BEGIN") {
            Self::from_pem(trimmed)
        } else {
            let der = base64::engine::general_purpose::STANDARD.decode(trimmed)?;
            Self::from_spki_der(&der)
        }
    }

    /// The verification scheme implied by the key
    pub fn scheme(&self) -> SigningScheme {
        self.scheme
    }

    /// DER-encoded SubjectPublicKeyInfo
    pub fn spki_der(&self) -> &[u8] {
        &self.spki_der
    }

    /// PEM-encoded SubjectPublicKeyInfo
    pub fn to_pem(&self) -> PublicKeyPem {
        PublicKeyPem::new(pem::encode(&pem::Pem::new(
            "PUBLIC KEY",
            self.spki_der.clone(),
        )))
    }

    /// Key id: lowercase hex SHA-256 of the SPKI DER
    pub fn key_id(&self) -> String {
        key_id(&self.spki_der)
    }

    /// Verify a signature over data
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        let result = match self.scheme {
            SigningScheme::Ed25519 => {
                UnparsedPublicKey::new(&ED25519, &self.bytes).verify(data, signature)
            }
            SigningScheme::EcdsaP256Sha256 => {
                UnparsedPublicKey::new(&ECDSA_P256_SHA256_ASN1, &self.bytes).verify(data, signature)
            }
            SigningScheme::EcdsaP384Sha384 => {
                UnparsedPublicKey::new(&ECDSA_P384_SHA384_ASN1, &self.bytes).verify(data, signature)
            }
        };
        result.is_ok()
    }
}

impl SignatureVerifier for VerificationKey {
    fn verify(&self, canonical: &[u8], signature: &[u8]) -> bool {
        VerificationKey::verify(self, canonical, signature)
    }
}

/// Key id of a DER-encoded SubjectPublicKeyInfo
pub fn key_id(spki_der: &[u8]) -> String {
    hex::encode(sha256(spki_der))
}

/// Verify a signature against an encoded public key (PEM or base64 SPKI DER)
///
/// Returns `Ok(false)` for a signature mismatch and `Err` only when the
/// public key cannot be parsed.
pub fn verify_signature(data: &[u8], signature: &[u8], public_key: &str) -> Result<bool> {
    let key = VerificationKey::from_encoded(public_key)?;
    Ok(key.verify(data, signature))
}
