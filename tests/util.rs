#![allow(dead_code)]

use std::path::PathBuf;

use csrkit::error::{CsrKitError, Result};
use csrkit::key::KeySpec;
use csrkit::persist::{ArtifactKind, ArtifactSink, MemorySink};
use csrkit::request::{RequestTemplate, Subject};
use rand_core::{CryptoRng, RngCore};

pub fn example_subject() -> Subject {
    Subject::builder()
        .country("US")
        .state("California")
        .locality("San Francisco")
        .organization("Example Corp")
        .organization_unit("IT")
        .common_name("example.com")
        .build()
}

pub fn template(key_spec: KeySpec) -> RequestTemplate {
    RequestTemplate::builder()
        .subject(example_subject())
        .key_spec(key_spec)
        .build()
}

pub const ALL_KEY_SPECS: [KeySpec; 4] = [
    KeySpec::Rsa { bits: 2048 },
    KeySpec::EcdsaP256,
    KeySpec::EcdsaP384,
    KeySpec::Ed25519,
];

/// An entropy source that has run dry.
pub struct ExhaustedRng;

impl RngCore for ExhaustedRng {
    fn next_u32(&mut self) -> u32 {
        panic!("entropy source exhausted")
    }

    fn next_u64(&mut self) -> u64 {
        panic!("entropy source exhausted")
    }

    fn fill_bytes(&mut self, _dest: &mut [u8]) {
        panic!("entropy source exhausted")
    }

    fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> std::result::Result<(), rand_core::Error> {
        Err(rand_core::Error::new("entropy source exhausted"))
    }
}

impl CryptoRng for ExhaustedRng {}

/// An entropy source that serves `remaining` bytes from the OS and then fails.
/// Its infallible methods panic once the budget is spent.
pub struct LimitedRng {
    pub remaining: usize,
}

impl RngCore for LimitedRng {
    fn next_u32(&mut self) -> u32 {
        rand_core::impls::next_u32_via_fill(self)
    }

    fn next_u64(&mut self) -> u64 {
        rand_core::impls::next_u64_via_fill(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        if let Err(e) = self.try_fill_bytes(dest) {
            panic!("{e}")
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand_core::Error> {
        if dest.len() > self.remaining {
            self.remaining = 0;
            return Err(rand_core::Error::new("entropy source exhausted"));
        }
        self.remaining -= dest.len();
        rand_core::OsRng.fill_bytes(dest);
        Ok(())
    }
}

impl CryptoRng for LimitedRng {}

/// Accepts the request but fails to store the private key.
#[derive(Default)]
pub struct KeyRejectingSink {
    pub stored: MemorySink,
}

impl ArtifactSink for KeyRejectingSink {
    fn write_artifact(&mut self, kind: ArtifactKind, envelope: &str) -> Result<()> {
        match kind {
            ArtifactKind::Request => self.stored.write_artifact(kind, envelope),
            ArtifactKind::PrivateKey => Err(CsrKitError::IoError {
                path: PathBuf::from("private_key.pem"),
                source: std::io::Error::other("disk full"),
            }),
        }
    }

    fn describe(&self, kind: ArtifactKind) -> String {
        self.stored.describe(kind)
    }
}
