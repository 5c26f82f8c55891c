use ed25519_dalek::{
    Signature as Ed25519Signature, SigningKey as Ed25519SigningKey,
    VerifyingKey as Ed25519VerifyingKey,
};
use p256::ecdsa::{SigningKey as P256SigningKey, VerifyingKey as P256VerifyingKey};
use p384::ecdsa::{SigningKey as P384SigningKey, VerifyingKey as P384VerifyingKey};
use pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rand_chacha::ChaCha20Rng;
use rand_core::{CryptoRngCore, SeedableRng};
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha384, Sha512};
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::envelope::{self, PRIVATE_KEY_LABEL, RSA_PRIVATE_KEY_LABEL};
use crate::error::{CsrKitError, Result};
use crate::request::SignatureAlgorithm;

/// RSA modulus sizes accepted for key generation.
pub const RSA_KEY_SIZES: [usize; 3] = [2048, 3072, 4096];

/// Describes the key pair to generate.
///
/// In configuration files the key is a table with an `algorithm` and, for RSA
/// only, a `bits` size. Unknown fields and `bits` on other algorithms are
/// rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "kebab-case", try_from = "KeyTable")]
pub enum KeySpec {
    /// RSA with the given modulus size in bits.
    Rsa { bits: usize },
    /// ECDSA over NIST P-256.
    EcdsaP256,
    /// ECDSA over NIST P-384.
    EcdsaP384,
    /// Ed25519.
    Ed25519,
}

fn default_rsa_bits() -> usize {
    2048
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
enum KeyAlgorithm {
    Rsa,
    EcdsaP256,
    EcdsaP384,
    Ed25519,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct KeyTable {
    algorithm: KeyAlgorithm,
    bits: Option<usize>,
}

impl TryFrom<KeyTable> for KeySpec {
    type Error = String;

    fn try_from(table: KeyTable) -> std::result::Result<Self, Self::Error> {
        let spec = match table.algorithm {
            KeyAlgorithm::Rsa => {
                return Ok(KeySpec::Rsa {
                    bits: table.bits.unwrap_or_else(default_rsa_bits),
                });
            }
            KeyAlgorithm::EcdsaP256 => KeySpec::EcdsaP256,
            KeyAlgorithm::EcdsaP384 => KeySpec::EcdsaP384,
            KeyAlgorithm::Ed25519 => KeySpec::Ed25519,
        };
        match table.bits {
            Some(bits) => Err(format!("`bits = {bits}` only applies to RSA keys, not {spec:?}")),
            None => Ok(spec),
        }
    }
}

impl Default for KeySpec {
    fn default() -> Self {
        KeySpec::Rsa {
            bits: default_rsa_bits(),
        }
    }
}

impl KeySpec {
    /// Rejects RSA sizes outside [`RSA_KEY_SIZES`].
    pub fn validate(&self) -> Result<()> {
        match self {
            KeySpec::Rsa { bits } if !RSA_KEY_SIZES.contains(bits) => {
                Err(CsrKitError::KeyGenerationError(format!(
                    "unsupported RSA key size {bits}; expected one of {RSA_KEY_SIZES:?}"
                )))
            }
            _ => Ok(()),
        }
    }

    /// The signature algorithm used when none is configured.
    pub fn default_signature_algorithm(&self) -> SignatureAlgorithm {
        match self {
            KeySpec::Rsa { .. } => SignatureAlgorithm::Sha256WithRsa,
            KeySpec::EcdsaP256 => SignatureAlgorithm::EcdsaWithSha256,
            KeySpec::EcdsaP384 => SignatureAlgorithm::EcdsaWithSha384,
            KeySpec::Ed25519 => SignatureAlgorithm::Ed25519,
        }
    }

    /// Whether keys of this kind can produce `algorithm` signatures.
    pub fn supports(&self, algorithm: SignatureAlgorithm) -> bool {
        use SignatureAlgorithm::*;
        matches!(
            (self, algorithm),
            (KeySpec::Rsa { .. }, Sha256WithRsa | Sha384WithRsa | Sha512WithRsa)
                | (KeySpec::EcdsaP256, EcdsaWithSha256)
                | (KeySpec::EcdsaP384, EcdsaWithSha384)
                | (KeySpec::Ed25519, Ed25519)
        )
    }
}

/// Supported key types for certificate request operations.
#[derive(Clone)]
pub enum KeyPair {
    Rsa {
        private: Box<RsaPrivateKey>,
        public: RsaPublicKey,
    },
    EcdsaP256 {
        signing_key: P256SigningKey,
        verifying_key: P256VerifyingKey,
    },
    EcdsaP384 {
        signing_key: P384SigningKey,
        verifying_key: P384VerifyingKey,
    },
    Ed25519 {
        signing_key: Ed25519SigningKey,
    },
}

impl std::fmt::Debug for KeyPair {
    // Key material stays out of logs and panic messages.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("spec", &self.spec())
            .finish_non_exhaustive()
    }
}

impl KeyPair {
    /// Generate a fresh key pair described by `spec`, drawing entropy from `rng`.
    ///
    /// A single fallible read of 32 bytes from `rng` seeds a ChaCha20 generator
    /// that the primitives draw from, so an unavailable or exhausted source is
    /// reported as [`CsrKitError::KeyGenerationError`] and never reached by the
    /// infallible `fill_bytes` calls inside key generation.
    pub fn generate<R: CryptoRngCore>(spec: KeySpec, rng: &mut R) -> Result<Self> {
        spec.validate()?;
        let mut seed = <ChaCha20Rng as SeedableRng>::Seed::default();
        rng.try_fill_bytes(&mut seed).map_err(|e| {
            CsrKitError::KeyGenerationError(format!("entropy source unavailable: {e}"))
        })?;
        let rng = &mut ChaCha20Rng::from_seed(seed);

        let key_pair = match spec {
            KeySpec::Rsa { bits } => Self::generate_rsa(bits, rng)?,
            KeySpec::EcdsaP256 => {
                let signing_key = P256SigningKey::random(rng);
                let verifying_key = *signing_key.verifying_key();
                KeyPair::EcdsaP256 {
                    signing_key,
                    verifying_key,
                }
            }
            KeySpec::EcdsaP384 => {
                let signing_key = P384SigningKey::random(rng);
                let verifying_key = *signing_key.verifying_key();
                KeyPair::EcdsaP384 {
                    signing_key,
                    verifying_key,
                }
            }
            KeySpec::Ed25519 => KeyPair::Ed25519 {
                signing_key: Ed25519SigningKey::generate(rng),
            },
        };
        log::info!("Generated {:?} key pair", key_pair.spec());
        Ok(key_pair)
    }

    /// Generate an RSA key pair with the specified number of bits.
    fn generate_rsa<R: CryptoRngCore>(bits: usize, rng: &mut R) -> Result<Self> {
        let private = RsaPrivateKey::new(rng, bits)
            .map_err(|e| CsrKitError::KeyGenerationError(e.to_string()))?;
        let public = RsaPublicKey::from(&private);
        Ok(KeyPair::Rsa {
            private: Box::new(private),
            public,
        })
    }

    /// Generate a key pair from the operating system's entropy source.
    pub fn generate_with_os_rng(spec: KeySpec) -> Result<Self> {
        Self::generate(spec, &mut rand_core::OsRng)
    }

    /// The spec this key pair satisfies.
    pub fn spec(&self) -> KeySpec {
        match self {
            KeyPair::Rsa { public, .. } => KeySpec::Rsa {
                bits: rsa::traits::PublicKeyParts::size(public) * 8,
            },
            KeyPair::EcdsaP256 { .. } => KeySpec::EcdsaP256,
            KeyPair::EcdsaP384 { .. } => KeySpec::EcdsaP384,
            KeyPair::Ed25519 { .. } => KeySpec::Ed25519,
        }
    }

    /// The public half of this key pair.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_key_pair(self)
    }

    /// Signs `data` with `algorithm`, returning the signature as it appears in
    /// a certificate request: raw for RSA and Ed25519, DER for ECDSA.
    pub fn sign_data(&self, data: &[u8], algorithm: SignatureAlgorithm) -> Result<Vec<u8>> {
        if !self.spec().supports(algorithm) {
            return Err(CsrKitError::SigningError(format!(
                "{algorithm:?} cannot be used with a {:?} key",
                self.spec()
            )));
        }
        let signing_failed = |e: rsa::signature::Error| CsrKitError::SigningError(e.to_string());
        match self {
            KeyPair::Rsa { private, .. } => {
                let private = private.as_ref().clone();
                let signature = match algorithm {
                    SignatureAlgorithm::Sha384WithRsa => {
                        rsa::pkcs1v15::SigningKey::<Sha384>::new(private)
                            .try_sign(data)
                            .map_err(signing_failed)?
                    }
                    SignatureAlgorithm::Sha512WithRsa => {
                        rsa::pkcs1v15::SigningKey::<Sha512>::new(private)
                            .try_sign(data)
                            .map_err(signing_failed)?
                    }
                    _ => rsa::pkcs1v15::SigningKey::<Sha256>::new(private)
                        .try_sign(data)
                        .map_err(signing_failed)?,
                };
                Ok(signature.to_vec())
            }
            KeyPair::EcdsaP256 { signing_key, .. } => {
                let signature: p256::ecdsa::Signature =
                    signing_key.try_sign(data).map_err(signing_failed)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            KeyPair::EcdsaP384 { signing_key, .. } => {
                let signature: p384::ecdsa::Signature =
                    signing_key.try_sign(data).map_err(signing_failed)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            KeyPair::Ed25519 { signing_key } => {
                let signature: Ed25519Signature =
                    signing_key.try_sign(data).map_err(signing_failed)?;
                Ok(signature.to_bytes().to_vec())
            }
        }
    }

    /// The envelope label used for this key's private half.
    pub fn private_key_label(&self) -> &'static str {
        match self {
            KeyPair::Rsa { .. } => RSA_PRIVATE_KEY_LABEL,
            _ => PRIVATE_KEY_LABEL,
        }
    }

    /// DER encoding of the private key: PKCS#1 for RSA, PKCS#8 otherwise.
    pub fn private_key_der(&self) -> Result<Vec<u8>> {
        let encoding_failed = |e: String| CsrKitError::EncodingError(e);
        let document = match self {
            KeyPair::Rsa { private, .. } => private
                .to_pkcs1_der()
                .map_err(|e| encoding_failed(e.to_string()))?,
            KeyPair::EcdsaP256 { signing_key, .. } => signing_key
                .to_pkcs8_der()
                .map_err(|e| encoding_failed(e.to_string()))?,
            KeyPair::EcdsaP384 { signing_key, .. } => signing_key
                .to_pkcs8_der()
                .map_err(|e| encoding_failed(e.to_string()))?,
            KeyPair::Ed25519 { signing_key } => signing_key
                .to_pkcs8_der()
                .map_err(|e| encoding_failed(e.to_string()))?,
        };
        Ok(document.as_bytes().to_vec())
    }

    /// The private key wrapped in its text envelope, ready for the key artifact.
    pub fn private_key_envelope(&self) -> Result<String> {
        envelope::encode_to_envelope(&self.private_key_der()?, self.private_key_label())
    }

    /// Imports a private key from an `RSA PRIVATE KEY` or `PRIVATE KEY` envelope.
    pub fn from_private_key_pem(text: &str) -> Result<Self> {
        let envelope = envelope::decode_envelope(text)?;
        match envelope.label.as_str() {
            RSA_PRIVATE_KEY_LABEL => {
                let private = RsaPrivateKey::from_pkcs1_der(&envelope.payload)
                    .map_err(|e| CsrKitError::DecodingError(e.to_string()))?;
                Ok(Self::from_rsa(private))
            }
            PRIVATE_KEY_LABEL => Self::from_pkcs8_der(&envelope.payload),
            other => Err(CsrKitError::DecodingError(format!(
                "unsupported private key label '{other}'"
            ))),
        }
    }

    /// Imports a PKCS#8 private key of any supported type.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        if let Ok(signing_key) = P256SigningKey::from_pkcs8_der(der) {
            let verifying_key = *signing_key.verifying_key();
            return Ok(KeyPair::EcdsaP256 {
                signing_key,
                verifying_key,
            });
        }
        if let Ok(signing_key) = P384SigningKey::from_pkcs8_der(der) {
            let verifying_key = *signing_key.verifying_key();
            return Ok(KeyPair::EcdsaP384 {
                signing_key,
                verifying_key,
            });
        }
        if let Ok(signing_key) = Ed25519SigningKey::from_pkcs8_der(der) {
            return Ok(KeyPair::Ed25519 { signing_key });
        }
        RsaPrivateKey::from_pkcs8_der(der)
            .map(Self::from_rsa)
            .map_err(|e| CsrKitError::DecodingError(format!("unrecognized PKCS#8 key: {e}")))
    }

    fn from_rsa(private: RsaPrivateKey) -> Self {
        let public = RsaPublicKey::from(&private);
        KeyPair::Rsa {
            private: Box::new(private),
            public,
        }
    }
}

/// The public half of a [`KeyPair`], as carried in a request's SubjectPublicKeyInfo.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    EcdsaP256(P256VerifyingKey),
    EcdsaP384(P384VerifyingKey),
    Ed25519(Ed25519VerifyingKey),
}

impl PublicKey {
    pub fn from_key_pair(key_pair: &KeyPair) -> Self {
        match key_pair {
            KeyPair::Rsa { public, .. } => PublicKey::Rsa(public.clone()),
            KeyPair::EcdsaP256 { verifying_key, .. } => PublicKey::EcdsaP256(*verifying_key),
            KeyPair::EcdsaP384 { verifying_key, .. } => PublicKey::EcdsaP384(*verifying_key),
            KeyPair::Ed25519 { signing_key } => PublicKey::Ed25519(signing_key.verifying_key()),
        }
    }

    /// Converts the key into a SubjectPublicKeyInfo.
    pub fn to_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        let spki = match self {
            PublicKey::Rsa(public) => SubjectPublicKeyInfoOwned::from_key(public.clone()),
            PublicKey::EcdsaP256(verifying_key) => {
                SubjectPublicKeyInfoOwned::from_key(*verifying_key)
            }
            PublicKey::EcdsaP384(verifying_key) => {
                SubjectPublicKeyInfoOwned::from_key(*verifying_key)
            }
            PublicKey::Ed25519(verifying_key) => {
                SubjectPublicKeyInfoOwned::from_key(*verifying_key)
            }
        };
        spki.map_err(|e| CsrKitError::EncodingError(format!("public key: {e}")))
    }

    /// DER encoding of the SubjectPublicKeyInfo.
    pub fn to_spki_der(&self) -> Result<Vec<u8>> {
        let der = match self {
            PublicKey::Rsa(public) => public.to_public_key_der(),
            PublicKey::EcdsaP256(verifying_key) => verifying_key.to_public_key_der(),
            PublicKey::EcdsaP384(verifying_key) => verifying_key.to_public_key_der(),
            PublicKey::Ed25519(verifying_key) => verifying_key.to_public_key_der(),
        }
        .map_err(|e| CsrKitError::EncodingError(format!("public key: {e}")))?;
        Ok(der.as_bytes().to_vec())
    }

    /// Decodes a key from a SubjectPublicKeyInfo.
    pub fn from_x509spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self> {
        use der::Encode;
        let der = spki.to_der()?;
        Self::from_spki_der(&der)
    }

    /// Decodes a key from a DER SubjectPublicKeyInfo.
    pub fn from_spki_der(der: &[u8]) -> Result<Self> {
        if let Ok(public) = RsaPublicKey::from_public_key_der(der) {
            return Ok(PublicKey::Rsa(public));
        }
        if let Ok(verifying_key) = P256VerifyingKey::from_public_key_der(der) {
            return Ok(PublicKey::EcdsaP256(verifying_key));
        }
        if let Ok(verifying_key) = P384VerifyingKey::from_public_key_der(der) {
            return Ok(PublicKey::EcdsaP384(verifying_key));
        }
        Ed25519VerifyingKey::from_public_key_der(der)
            .map(PublicKey::Ed25519)
            .map_err(|e| CsrKitError::DecodingError(format!("unsupported public key: {e}")))
    }

    /// Verifies `signature` over `data` as produced by [`KeyPair::sign_data`].
    pub fn verify(
        &self,
        data: &[u8],
        signature: &[u8],
        algorithm: SignatureAlgorithm,
    ) -> Result<()> {
        let rejected = |e: rsa::signature::Error| CsrKitError::VerificationError(e.to_string());
        match (self, algorithm) {
            (PublicKey::Rsa(public), SignatureAlgorithm::Sha256WithRsa) => {
                let signature = rsa::pkcs1v15::Signature::try_from(signature).map_err(rejected)?;
                rsa::pkcs1v15::VerifyingKey::<Sha256>::new(public.clone())
                    .verify(data, &signature)
                    .map_err(rejected)
            }
            (PublicKey::Rsa(public), SignatureAlgorithm::Sha384WithRsa) => {
                let signature = rsa::pkcs1v15::Signature::try_from(signature).map_err(rejected)?;
                rsa::pkcs1v15::VerifyingKey::<Sha384>::new(public.clone())
                    .verify(data, &signature)
                    .map_err(rejected)
            }
            (PublicKey::Rsa(public), SignatureAlgorithm::Sha512WithRsa) => {
                let signature = rsa::pkcs1v15::Signature::try_from(signature).map_err(rejected)?;
                rsa::pkcs1v15::VerifyingKey::<Sha512>::new(public.clone())
                    .verify(data, &signature)
                    .map_err(rejected)
            }
            (PublicKey::EcdsaP256(verifying_key), SignatureAlgorithm::EcdsaWithSha256) => {
                let signature = p256::ecdsa::Signature::from_der(signature).map_err(rejected)?;
                verifying_key.verify(data, &signature).map_err(rejected)
            }
            (PublicKey::EcdsaP384(verifying_key), SignatureAlgorithm::EcdsaWithSha384) => {
                let signature = p384::ecdsa::Signature::from_der(signature).map_err(rejected)?;
                verifying_key.verify(data, &signature).map_err(rejected)
            }
            (PublicKey::Ed25519(verifying_key), SignatureAlgorithm::Ed25519) => {
                let signature = Ed25519Signature::from_slice(signature).map_err(rejected)?;
                verifying_key.verify(data, &signature).map_err(rejected)
            }
            (key, algorithm) => Err(CsrKitError::VerificationError(format!(
                "{algorithm:?} does not apply to {} keys",
                key.kind()
            ))),
        }
    }

    /// SHA-256 over the DER SubjectPublicKeyInfo, as lowercase hex.
    pub fn fingerprint(&self) -> Result<String> {
        Ok(hex::encode(Sha256::digest(self.to_spki_der()?)))
    }

    fn kind(&self) -> &'static str {
        match self {
            PublicKey::Rsa(_) => "RSA",
            PublicKey::EcdsaP256(_) => "P-256",
            PublicKey::EcdsaP384(_) => "P-384",
            PublicKey::Ed25519(_) => "Ed25519",
        }
    }
}
