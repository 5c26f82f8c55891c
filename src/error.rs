//! use csrkit::error::CsrKitError;

use std::path::PathBuf;

use thiserror::Error;

/// Represents errors that can occur in the CsrKit library.
///
/// This enum provides detailed error messages for various failure scenarios.
#[derive(Debug, Error)]
pub enum CsrKitError {
    /// Error during key generation, including an unavailable entropy source.
    #[error("Key generation error: {0}")]
    KeyGenerationError(String),

    /// Error while assembling or signing a certificate request.
    #[error("Signing error: {0}")]
    SigningError(String),

    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// Error during data decoding.
    #[error("Failed to decode data: {0}")]
    DecodingError(String),

    /// A request signature did not verify against its embedded public key.
    #[error("Signature verification failed: {0}")]
    VerificationError(String),

    /// Error in the generator configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error due to invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An output artifact or configuration file could not be read or written.
    #[error("I/O error on {}: {source}", path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, CsrKitError>;

impl CsrKitError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CsrKitError::IoError {
            path: path.into(),
            source,
        }
    }
}

impl From<der::Error> for CsrKitError {
    /// Converts a `der::Error` into a `CsrKitError`.
    fn from(err: der::Error) -> Self {
        CsrKitError::DecodingError(err.to_string())
    }
}

impl From<pem::PemError> for CsrKitError {
    fn from(err: pem::PemError) -> Self {
        CsrKitError::DecodingError(err.to_string())
    }
}

impl From<toml::de::Error> for CsrKitError {
    fn from(err: toml::de::Error) -> Self {
        CsrKitError::ConfigError(err.to_string())
    }
}
