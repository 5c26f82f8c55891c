use const_oid::AssociatedOid;
use der::{
    Any, Decode, Encode,
    asn1::{Ia5String, OctetString, SetOfVec},
    oid::ObjectIdentifier,
};
use x509_cert::attr::{Attribute, Attributes};
use x509_cert::ext::Extension;
use x509_cert::ext::pkix::name::GeneralName;

use crate::error::{CsrKitError, Result};

/// PKCS#9 extensionRequest attribute (RFC 2985).
pub const EXTENSION_REQUEST: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.14");

/// Trait for converting to and from X.509 extension values.
///
/// # Example
/// ```
/// use csrkit::request::extensions::{SubjectAltName, ToAndFromX509Extension};
/// let san = SubjectAltName { names: vec!["example.com".to_string()] };
/// let encoded = san.to_x509_extension_value().unwrap();
/// let decoded = SubjectAltName::from_x509_extension_value(&encoded).unwrap();
/// assert_eq!(san.names, decoded.names);
/// ```
pub trait ToAndFromX509Extension {
    /// The Object Identifier (OID) for the extension.
    const OID: ObjectIdentifier;

    /// Encodes the extension into a DER-encoded byte vector.
    fn to_x509_extension_value(&self) -> Result<Vec<u8>>;

    /// Decodes the extension from a DER-encoded byte slice.
    fn from_x509_extension_value(extension: &[u8]) -> Result<Self>
    where
        Self: Sized;

    /// Wraps the encoded value in an [`Extension`].
    fn to_x509_extension(&self, critical: bool) -> Result<Extension> {
        let value = self.to_x509_extension_value()?;
        Ok(Extension {
            extn_id: Self::OID,
            critical,
            extn_value: OctetString::new(value)
                .map_err(|e| CsrKitError::EncodingError(e.to_string()))?,
        })
    }
}

/// Represents the Subject Alternative Name (SAN) extension.
///
/// # Fields
/// * `names` - A list of DNS names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectAltName {
    pub names: Vec<String>,
}

impl ToAndFromX509Extension for SubjectAltName {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::SubjectAltName::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let san = x509_cert::ext::pkix::SubjectAltName(
            self.names
                .iter()
                .map(|name| {
                    Ia5String::new(name)
                        .map(GeneralName::DnsName)
                        .map_err(|e| CsrKitError::InvalidInput(format!("DNS name '{name}': {e}")))
                })
                .collect::<Result<Vec<_>>>()?,
        );

        san.to_der()
            .map_err(|e| CsrKitError::EncodingError(e.to_string()))
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let san = x509_cert::ext::pkix::SubjectAltName::from_der(extension)?;
        let names = san
            .0
            .iter()
            .map(|name| match name {
                GeneralName::DnsName(dns) => Ok(dns.to_string()),
                _ => Err(CsrKitError::DecodingError(
                    "Unsupported general name type".to_string(),
                )),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { names })
    }
}

/// Builds the request attributes carrying `extensions`. No extensions means
/// no attributes at all.
pub fn extension_request(extensions: Vec<Extension>) -> Result<Attributes> {
    let mut attributes = Attributes::new();
    if extensions.is_empty() {
        return Ok(attributes);
    }
    let sequence = extensions
        .to_der()
        .map_err(|e| CsrKitError::SigningError(format!("extension request: {e}")))?;
    let value = Any::from_der(&sequence)
        .map_err(|e| CsrKitError::SigningError(format!("extension request: {e}")))?;
    let mut values = SetOfVec::new();
    values
        .insert(value)
        .map_err(|e| CsrKitError::SigningError(format!("extension request: {e}")))?;
    attributes
        .insert(Attribute {
            oid: EXTENSION_REQUEST,
            values,
        })
        .map_err(|e| CsrKitError::SigningError(format!("extension request: {e}")))?;
    Ok(attributes)
}

/// Extensions requested through the extensionRequest attribute, if any.
pub fn requested_extensions(attributes: &Attributes) -> Result<Vec<Extension>> {
    let mut extensions = Vec::new();
    for attribute in attributes.iter().filter(|a| a.oid == EXTENSION_REQUEST) {
        for value in attribute.values.iter() {
            extensions.extend(Vec::<Extension>::from_der(&value.to_der()?)?);
        }
    }
    Ok(extensions)
}
