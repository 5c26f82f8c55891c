//! # CsrKit - Certificate Signing Requests in Pure Rust
//!
//! CsrKit generates a fresh key pair, binds it to a distinguished name in a
//! PKCS#10 certificate signing request signed with that key, and writes the
//! request and the private key as PEM-style text artifacts. It is built
//! entirely with rustcrypto libraries; OpenSSL is only used by the tests.
//!
//! ## Supported Key Types
//!
//! - **RSA**: 2048, 3072, and 4096-bit keys, signed with SHA-256, SHA-384 or SHA-512
//! - **ECDSA**: P-256 with SHA-256 and P-384 with SHA-384
//! - **Ed25519**: Edwards curve digital signature algorithm
//!
//! ## Artifacts
//!
//! - the request, as a `CERTIFICATE REQUEST` envelope
//! - the private key, as `RSA PRIVATE KEY` (PKCS#1) for RSA or `PRIVATE KEY`
//!   (PKCS#8) for the other key types
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use csrkit::request::{self, RequestTemplate, Subject};
//!
//! # fn main() -> Result<(), csrkit::error::CsrKitError> {
//! let subject = Subject::builder()
//!     .country("US")
//!     .organization("Example Corp")
//!     .common_name("example.com")
//!     .build();
//!
//! let template = RequestTemplate::builder().subject(subject).build();
//! let (csr, key_pair) = request::generate(&template, &mut rand_core::OsRng)?;
//!
//! csrkit::persist::persist(&csr.to_pem()?, "example.csr")?;
//! csrkit::persist::persist_private(&key_pair.private_key_envelope()?, "private_key.pem")?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Generating From a Configuration File
//!
//! ```rust,no_run
//! use csrkit::{config::GeneratorConfig, persist::FileSink};
//!
//! # fn main() -> Result<(), csrkit::error::CsrKitError> {
//! let config = GeneratorConfig::load("csr.toml")?;
//! let mut sink = FileSink::new(&config.output.request, &config.output.private_key);
//! let generated = csrkit::pipeline::run(&config, &mut rand_core::OsRng, &mut sink)?;
//! println!("public key {}", generated.public_key_fingerprint);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use csrkit::{envelope, error::CsrKitError};
//!
//! match envelope::encode_to_envelope(&[], envelope::CERTIFICATE_REQUEST_LABEL) {
//!     Ok(text) => println!("{text}"),
//!     Err(CsrKitError::EncodingError(msg)) => println!("Nothing to encode: {msg}"),
//!     Err(e) => println!("Other error: {e}"),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`key`]: Key generation, signing, verification, and private key import/export
//! - [`request`]: Request assembly, signing, parsing, and verification
//! - [`envelope`]: PEM-style text envelopes
//! - [`persist`]: Writing artifacts to files or other sinks
//! - [`config`]: TOML configuration
//! - [`pipeline`]: The complete generate, encode, and persist run
//! - [`error`]: Error types and handling

pub mod config;
pub mod envelope;
pub mod error;
pub mod key;
pub mod persist;
pub mod pipeline;
pub mod request;
