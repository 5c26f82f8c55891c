//! The generate → encode → persist run.

use rand_core::CryptoRngCore;

use crate::config::GeneratorConfig;
use crate::error::Result;
use crate::persist::{ArtifactKind, ArtifactSink};
use crate::request::{self, SigningRequest};

/// Outcome of a successful run. The private key is only ever handed to the sink.
#[derive(Debug, Clone)]
pub struct GeneratedRequest {
    pub request: SigningRequest,
    /// SHA-256 of the request's SubjectPublicKeyInfo, hex encoded.
    pub public_key_fingerprint: String,
    pub request_location: String,
    pub private_key_location: String,
}

/// Generates a key pair and request from `config` and writes both artifacts
/// to `sink`, request first.
///
/// The first failure aborts the run. An artifact already written stays where
/// it is.
pub fn run<R, S>(config: &GeneratorConfig, rng: &mut R, sink: &mut S) -> Result<GeneratedRequest>
where
    R: CryptoRngCore,
    S: ArtifactSink + ?Sized,
{
    config.validate()?;
    let (request, key_pair) = request::generate(&config.template(), rng)?;
    let fingerprint = key_pair.public_key().fingerprint()?;
    log::info!("Public key fingerprint (SHA-256) {fingerprint}");

    let request_pem = request.to_pem()?;
    let key_pem = key_pair.private_key_envelope()?;

    sink.write_artifact(ArtifactKind::Request, &request_pem)?;
    let request_location = sink.describe(ArtifactKind::Request);
    log::info!("CSR written to {request_location}");

    sink.write_artifact(ArtifactKind::PrivateKey, &key_pem)?;
    let private_key_location = sink.describe(ArtifactKind::PrivateKey);
    log::info!("Private key written to {private_key_location}");

    Ok(GeneratedRequest {
        request,
        public_key_fingerprint: fingerprint,
        request_location,
        private_key_location,
    })
}
