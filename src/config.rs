//! Generator configuration loading and validation.
//!
//! Every section is optional; anything left out falls back to the example
//! request: an RSA 2048 key for `example.com` at Example Corp, written to
//! `example.csr` and `private_key.pem` in the working directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CsrKitError, Result};
use crate::key::KeySpec;
use crate::request::{RequestTemplate, SignatureAlgorithm, Subject};

/// Complete generator configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    #[serde(default = "default_subject")]
    pub subject: Subject,

    #[serde(default)]
    pub key: KeySpec,

    #[serde(default)]
    pub request: RequestSection,

    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RequestSection {
    pub signature_algorithm: Option<SignatureAlgorithm>,
    #[serde(default)]
    pub dns_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    #[serde(default = "default_request_path")]
    pub request: PathBuf,
    #[serde(default = "default_private_key_path")]
    pub private_key: PathBuf,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            request: default_request_path(),
            private_key: default_private_key_path(),
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            subject: default_subject(),
            key: KeySpec::default(),
            request: RequestSection::default(),
            output: OutputSection::default(),
        }
    }
}

fn default_subject() -> Subject {
    Subject::builder()
        .country("US")
        .state("California")
        .locality("San Francisco")
        .organization("Example Corp")
        .organization_unit("IT")
        .common_name("example.com")
        .build()
}

fn default_request_path() -> PathBuf {
    PathBuf::from("example.csr")
}

fn default_private_key_path() -> PathBuf {
    PathBuf::from("private_key.pem")
}

impl GeneratorConfig {
    /// Reads and validates a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| CsrKitError::io(path, e))?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parses and validates a TOML configuration.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the key and signature algorithm can work together.
    pub fn validate(&self) -> Result<()> {
        self.key
            .validate()
            .map_err(|e| CsrKitError::ConfigError(e.to_string()))?;
        if let Some(algorithm) = self.request.signature_algorithm {
            if !self.key.supports(algorithm) {
                return Err(CsrKitError::ConfigError(format!(
                    "signature algorithm {algorithm:?} cannot be used with a {:?} key",
                    self.key
                )));
            }
        }
        if self.output.request == self.output.private_key {
            return Err(CsrKitError::ConfigError(format!(
                "request and private key would both be written to {}",
                self.output.request.display()
            )));
        }
        Ok(())
    }

    /// The request template this configuration describes.
    pub fn template(&self) -> RequestTemplate {
        RequestTemplate::builder()
            .subject(self.subject.clone())
            .key_spec(self.key)
            .maybe_signature_algorithm(self.request.signature_algorithm)
            .dns_names(self.request.dns_names.clone())
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_example_values() {
        let config = GeneratorConfig::from_toml_str("").unwrap();
        assert_eq!(config, GeneratorConfig::default());
        assert_eq!(config.subject.common_name.as_deref(), Some("example.com"));
        assert_eq!(config.subject.organization_unit.as_deref(), Some("IT"));
        assert_eq!(config.key, KeySpec::Rsa { bits: 2048 });
        assert_eq!(
            config.template().effective_signature_algorithm(),
            SignatureAlgorithm::Sha256WithRsa
        );
        assert_eq!(config.output.request, PathBuf::from("example.csr"));
        assert_eq!(config.output.private_key, PathBuf::from("private_key.pem"));
    }

    #[test]
    fn parses_full_config() {
        let config = GeneratorConfig::from_toml_str(
            r#"
            [subject]
            country = "DE"
            organization = "Beispiel GmbH"
            organizational_unit = "Ops"
            common_name = "beispiel.de"

            [key]
            algorithm = "ecdsa-p384"

            [request]
            signature_algorithm = "ecdsa-with-sha384"
            dns_names = ["beispiel.de", "www.beispiel.de"]

            [output]
            request = "out/beispiel.csr"
            private_key = "out/beispiel.key"
            "#,
        )
        .unwrap();
        assert_eq!(config.subject.country.as_deref(), Some("DE"));
        assert_eq!(config.subject.organization_unit.as_deref(), Some("Ops"));
        assert_eq!(config.subject.state, None);
        assert_eq!(config.key, KeySpec::EcdsaP384);
        assert_eq!(config.request.dns_names.len(), 2);
        assert_eq!(config.output.private_key, PathBuf::from("out/beispiel.key"));
    }

    #[test]
    fn rsa_bits_are_read() {
        let config = GeneratorConfig::from_toml_str(
            r#"
            [key]
            algorithm = "rsa"
            bits = 4096
            "#,
        )
        .unwrap();
        assert_eq!(config.key, KeySpec::Rsa { bits: 4096 });
    }

    #[test]
    fn rsa_bits_default_to_2048() {
        let config = GeneratorConfig::from_toml_str("[key]\nalgorithm = \"rsa\"\n").unwrap();
        assert_eq!(config.key, KeySpec::Rsa { bits: 2048 });
    }

    #[test]
    fn rejects_bits_on_non_rsa_keys() {
        for algorithm in ["ed25519", "ecdsa-p256", "ecdsa-p384"] {
            let text = format!("[key]\nalgorithm = \"{algorithm}\"\nbits = 2048\n");
            let err = GeneratorConfig::from_toml_str(&text).unwrap_err();
            assert!(matches!(err, CsrKitError::ConfigError(_)), "{algorithm}");
        }
        assert!(matches!(
            GeneratorConfig::from_toml_str("[key]\nalgorithm = \"ed25519\"\ncurve = \"x\"\n"),
            Err(CsrKitError::ConfigError(_))
        ));
    }

    #[test]
    fn rejects_mismatched_algorithm() {
        let err = GeneratorConfig::from_toml_str(
            r#"
            [key]
            algorithm = "ed25519"

            [request]
            signature_algorithm = "sha256-with-rsa"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, CsrKitError::ConfigError(_)));
    }

    #[test]
    fn rejects_small_rsa_keys() {
        let err = GeneratorConfig::from_toml_str(
            r#"
            [key]
            algorithm = "rsa"
            bits = 1024
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, CsrKitError::ConfigError(_)));
    }

    #[test]
    fn rejects_unknown_fields_and_bad_toml() {
        assert!(matches!(
            GeneratorConfig::from_toml_str("[subject]\nemail = \"a@b.c\"\n"),
            Err(CsrKitError::ConfigError(_))
        ));
        assert!(matches!(
            GeneratorConfig::from_toml_str("[subject"),
            Err(CsrKitError::ConfigError(_))
        ));
    }

    #[test]
    fn rejects_shared_output_path() {
        let err = GeneratorConfig::from_toml_str(
            r#"
            [output]
            request = "both.pem"
            private_key = "both.pem"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, CsrKitError::ConfigError(_)));
    }
}
