pub mod extensions;
pub mod subject;

use bon::Builder;
use der::asn1::{AnyRef, BitString};
use der::{Any, Decode, Encode};
use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};
use x509_cert::request::{CertReq, CertReqInfo, Version};
use x509_cert::spki::AlgorithmIdentifierOwned;

use crate::envelope::{self, CERTIFICATE_REQUEST_LABEL};
use crate::error::{CsrKitError, Result};
use crate::key::{KeyPair, KeySpec, PublicKey};
use extensions::{SubjectAltName, ToAndFromX509Extension};
pub use subject::Subject;

/// Represents the supported request signature algorithms.
///
/// This enum provides a mapping to the corresponding OIDs for each algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignatureAlgorithm {
    /// SHA-256 with RSA encryption (PKCS#1 v1.5).
    #[default]
    Sha256WithRsa,
    /// SHA-384 with RSA encryption (PKCS#1 v1.5).
    Sha384WithRsa,
    /// SHA-512 with RSA encryption (PKCS#1 v1.5).
    Sha512WithRsa,
    /// ECDSA over P-256 with SHA-256.
    EcdsaWithSha256,
    /// ECDSA over P-384 with SHA-384.
    EcdsaWithSha384,
    /// EdDSA over Ed25519.
    Ed25519,
}

impl SignatureAlgorithm {
    /// Looks up the algorithm named by a signature algorithm OID.
    pub fn from_oid(oid: &der::oid::ObjectIdentifier) -> Result<Self> {
        match *oid {
            const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION => Ok(Self::Sha256WithRsa),
            const_oid::db::rfc5912::SHA_384_WITH_RSA_ENCRYPTION => Ok(Self::Sha384WithRsa),
            const_oid::db::rfc5912::SHA_512_WITH_RSA_ENCRYPTION => Ok(Self::Sha512WithRsa),
            const_oid::db::rfc5912::ECDSA_WITH_SHA_256 => Ok(Self::EcdsaWithSha256),
            const_oid::db::rfc5912::ECDSA_WITH_SHA_384 => Ok(Self::EcdsaWithSha384),
            const_oid::db::rfc8410::ID_ED_25519 => Ok(Self::Ed25519),
            other => Err(CsrKitError::DecodingError(format!(
                "Unsupported signature algorithm {other}"
            ))),
        }
    }
}

impl From<SignatureAlgorithm> for AlgorithmIdentifierOwned {
    /// Converts a `SignatureAlgorithm` into an `AlgorithmIdentifierOwned`.
    ///
    /// The RSA identifiers carry explicit NULL parameters as RFC 4055 requires;
    /// ECDSA and Ed25519 identifiers carry none.
    fn from(value: SignatureAlgorithm) -> Self {
        let (oid, parameters) = match value {
            SignatureAlgorithm::Sha256WithRsa => (
                const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
                Some(Any::from(AnyRef::NULL)),
            ),
            SignatureAlgorithm::Sha384WithRsa => (
                const_oid::db::rfc5912::SHA_384_WITH_RSA_ENCRYPTION,
                Some(Any::from(AnyRef::NULL)),
            ),
            SignatureAlgorithm::Sha512WithRsa => (
                const_oid::db::rfc5912::SHA_512_WITH_RSA_ENCRYPTION,
                Some(Any::from(AnyRef::NULL)),
            ),
            SignatureAlgorithm::EcdsaWithSha256 => (const_oid::db::rfc5912::ECDSA_WITH_SHA_256, None),
            SignatureAlgorithm::EcdsaWithSha384 => (const_oid::db::rfc5912::ECDSA_WITH_SHA_384, None),
            SignatureAlgorithm::Ed25519 => (const_oid::db::rfc8410::ID_ED_25519, None),
        };
        AlgorithmIdentifierOwned { oid, parameters }
    }
}

/// Parameters for generating a certificate signing request.
///
/// # Fields
/// * `subject` - The distinguished name being claimed.
/// * `key_spec` - The key pair to generate.
/// * `signature_algorithm` - The algorithm signing the request; defaults to the key's usual one.
/// * `dns_names` - DNS names requested as a Subject Alternative Name extension.
#[derive(Clone, Debug, Builder)]
pub struct RequestTemplate {
    pub subject: Subject,
    #[builder(default)]
    pub key_spec: KeySpec,
    pub signature_algorithm: Option<SignatureAlgorithm>,
    #[builder(default)]
    pub dns_names: Vec<String>,
}

impl RequestTemplate {
    /// The algorithm that will sign the request.
    pub fn effective_signature_algorithm(&self) -> SignatureAlgorithm {
        self.signature_algorithm
            .unwrap_or_else(|| self.key_spec.default_signature_algorithm())
    }
}

/// A signed PKCS#10 certificate signing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningRequest {
    /// The inner representation of the request.
    pub inner: CertReq,
}

/// Generates a fresh key pair and a request signed with it.
///
/// Entropy comes from `rng` only; nothing is cached between calls, so two
/// calls with the same template yield different keys and signatures.
pub fn generate<R: CryptoRngCore>(
    template: &RequestTemplate,
    rng: &mut R,
) -> Result<(SigningRequest, KeyPair)> {
    let algorithm = template.effective_signature_algorithm();
    template.key_spec.validate()?;
    if !template.key_spec.supports(algorithm) {
        return Err(CsrKitError::SigningError(format!(
            "{algorithm:?} cannot sign with a {:?} key",
            template.key_spec
        )));
    }
    log::debug!(
        "Generating {:?} request for {:?} signed with {algorithm:?}",
        template.key_spec,
        template.subject
    );

    let key_pair = KeyPair::generate(template.key_spec, rng)?;
    let request = SigningRequest::new(template, &key_pair)?;
    Ok((request, key_pair))
}

impl SigningRequest {
    /// Assembles and signs a request for `key_pair`.
    pub fn new(template: &RequestTemplate, key_pair: &KeyPair) -> Result<Self> {
        let algorithm = template.effective_signature_algorithm();
        let subject = template.subject.as_x509_name()?;
        let public_key = key_pair
            .public_key()
            .to_spki()
            .map_err(|e| CsrKitError::SigningError(e.to_string()))?;

        let mut requested = Vec::new();
        if !template.dns_names.is_empty() {
            let san = SubjectAltName {
                names: template.dns_names.clone(),
            };
            let extension = san
                .to_x509_extension(false)
                .map_err(|e| CsrKitError::SigningError(e.to_string()))?;
            requested.push(extension);
        }

        let info = CertReqInfo {
            version: Version::V1,
            subject,
            public_key,
            attributes: extensions::extension_request(requested)?,
        };
        let info_der = info
            .to_der()
            .map_err(|e| CsrKitError::SigningError(format!("Failed to encode CertReqInfo: {e}")))?;
        let signature = key_pair.sign_data(&info_der, algorithm)?;

        let inner = CertReq {
            info,
            algorithm: algorithm.into(),
            signature: BitString::from_bytes(&signature)
                .map_err(|e| CsrKitError::SigningError(format!("Failed to wrap signature: {e}")))?,
        };
        Ok(Self { inner })
    }

    /// Encodes the request into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| CsrKitError::EncodingError(e.to_string()))
    }

    /// Encodes the request into a `CERTIFICATE REQUEST` envelope.
    pub fn to_pem(&self) -> Result<String> {
        envelope::encode_to_envelope(&self.to_der()?, CERTIFICATE_REQUEST_LABEL)
    }

    /// Parses a request from DER.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        Ok(Self {
            inner: CertReq::from_der(der)?,
        })
    }

    /// Parses a request from a `CERTIFICATE REQUEST` envelope.
    pub fn from_pem(text: &str) -> Result<Self> {
        Self::from_der(&envelope::decode_labelled(text, CERTIFICATE_REQUEST_LABEL)?)
    }

    /// The subject the request claims.
    pub fn subject(&self) -> Result<Subject> {
        Subject::from_x509_name(&self.inner.info.subject)
    }

    /// The public key embedded in the request.
    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_x509spki(&self.inner.info.public_key)
    }

    /// The algorithm the request is signed with.
    pub fn signature_algorithm(&self) -> Result<SignatureAlgorithm> {
        SignatureAlgorithm::from_oid(&self.inner.algorithm.oid)
    }

    /// DNS names requested through a Subject Alternative Name extension.
    pub fn dns_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for extension in extensions::requested_extensions(&self.inner.info.attributes)? {
            if extension.extn_id == SubjectAltName::OID {
                let san =
                    SubjectAltName::from_x509_extension_value(extension.extn_value.as_bytes())?;
                names.extend(san.names);
            }
        }
        Ok(names)
    }

    /// Checks the signature against the public key embedded in the request.
    pub fn verify(&self) -> Result<()> {
        let info_der = self.inner.info.to_der().map_err(|e| {
            CsrKitError::VerificationError(format!("Failed to encode info for verification: {e}"))
        })?;
        let algorithm = self.signature_algorithm()?;
        self.public_key()?
            .verify(&info_der, self.inner.signature.raw_bytes(), algorithm)
    }

    /// Whether the embedded public key is the public half of `key_pair`.
    pub fn matches_key(&self, key_pair: &KeyPair) -> Result<bool> {
        Ok(self.public_key()? == key_pair.public_key())
    }
}
