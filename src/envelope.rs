//! PEM-style text envelopes for DER payloads.
//!
//! An envelope is a base64 payload wrapped at 64 columns between
//! `-----BEGIN <label>-----` and `-----END <label>-----` markers, with LF line
//! endings. Encoding is canonical, so decoding an envelope and encoding it
//! again reproduces the same text byte for byte.

use crate::error::{CsrKitError, Result};

/// Label for a PKCS#10 certificate signing request.
pub const CERTIFICATE_REQUEST_LABEL: &str = "CERTIFICATE REQUEST";
/// Label for a PKCS#1 RSA private key.
pub const RSA_PRIVATE_KEY_LABEL: &str = "RSA PRIVATE KEY";
/// Label for a PKCS#8 private key.
pub const PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";

const LINE_WRAP: usize = 64;

/// A labelled binary payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    pub label: String,
    pub payload: Vec<u8>,
}

impl Envelope {
    /// Creates an envelope after checking the payload and label.
    pub fn new(label: impl Into<String>, payload: impl Into<Vec<u8>>) -> Result<Self> {
        let label = label.into();
        let payload = payload.into();
        if payload.is_empty() {
            return Err(CsrKitError::EncodingError(
                "cannot envelope an empty payload".to_string(),
            ));
        }
        check_label(&label)?;
        Ok(Self { label, payload })
    }

    /// Encodes the envelope into its canonical text form.
    pub fn encode(&self) -> String {
        let pem = pem::Pem::new(self.label.clone(), self.payload.clone());
        let config = pem::EncodeConfig::new()
            .set_line_ending(pem::LineEnding::LF)
            .set_line_wrap(LINE_WRAP);
        pem::encode_config(&pem, config)
    }

    /// Parses the first envelope found in `text`.
    pub fn parse(text: &str) -> Result<Self> {
        let pem = pem::parse(text)?;
        if pem.contents().is_empty() {
            return Err(CsrKitError::DecodingError(format!(
                "envelope '{}' has an empty payload",
                pem.tag()
            )));
        }
        Ok(Self {
            label: pem.tag().to_string(),
            payload: pem.contents().to_vec(),
        })
    }
}

/// Wraps a DER payload in a text envelope carrying `label`.
pub fn encode_to_envelope(payload: &[u8], label: &str) -> Result<String> {
    Ok(Envelope::new(label, payload)?.encode())
}

/// Decodes the first envelope in `text`.
pub fn decode_envelope(text: &str) -> Result<Envelope> {
    Envelope::parse(text)
}

/// Decodes an envelope and checks that it carries the `expected` label.
pub fn decode_labelled(text: &str, expected: &str) -> Result<Vec<u8>> {
    let envelope = Envelope::parse(text)?;
    if envelope.label != expected {
        return Err(CsrKitError::DecodingError(format!(
            "expected a '{expected}' envelope, found '{}'",
            envelope.label
        )));
    }
    Ok(envelope.payload)
}

// RFC 7468 labels are printable ASCII without hyphens.
fn check_label(label: &str) -> Result<()> {
    let valid = !label.is_empty()
        && label.trim() == label
        && label.bytes().all(|b| (b' '..=b'~').contains(&b) && b != b'-');
    if valid {
        Ok(())
    } else {
        Err(CsrKitError::EncodingError(format!(
            "invalid envelope label '{label}'"
        )))
    }
}
