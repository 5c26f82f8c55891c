use bon::Builder;
use const_oid::ObjectIdentifier;
use der::asn1::{PrintableStringRef, SetOfVec};
use der::{Any, Tag, Tagged};
use serde::{Deserialize, Serialize};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};

use crate::error::{CsrKitError, Result};

const COUNTRY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.6");
const STATE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.8");
const LOCALITY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.7");
const ORGANIZATION: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.10");
const ORGANIZATION_UNIT: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.11");
const COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");

/// Distinguished name of a certificate request subject.
///
/// Attributes are encoded in the order C, ST, L, O, OU, CN, each in its own
/// RDN. Absent and empty attributes are left out of the encoded name.
///
/// # Fields
/// * `country` - The country (C), two letters.
/// * `state` - The state or province (ST).
/// * `locality` - The locality or city (L).
/// * `organization` - The organization (O).
/// * `organization_unit` - The organizational unit (OU).
/// * `common_name` - The common name (CN).
#[derive(Clone, Debug, Default, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Subject {
    #[builder(into)]
    pub country: Option<String>,
    #[builder(into)]
    pub state: Option<String>,
    #[builder(into)]
    pub locality: Option<String>,
    #[builder(into)]
    pub organization: Option<String>,
    #[serde(alias = "organizational_unit")]
    #[builder(into)]
    pub organization_unit: Option<String>,
    #[builder(into)]
    pub common_name: Option<String>,
}

impl Subject {
    // (oid, short name, upper bound in characters, value) in encoding order.
    fn attributes(&self) -> [(ObjectIdentifier, &'static str, usize, Option<&str>); 6] {
        [
            (COUNTRY, "C", 2, self.country.as_deref()),
            (STATE, "ST", 128, self.state.as_deref()),
            (LOCALITY, "L", 128, self.locality.as_deref()),
            (ORGANIZATION, "O", 64, self.organization.as_deref()),
            (ORGANIZATION_UNIT, "OU", 64, self.organization_unit.as_deref()),
            (COMMON_NAME, "CN", 64, self.common_name.as_deref()),
        ]
    }

    /// Converts the subject to an X.509 name.
    ///
    /// Fails with [`CsrKitError::SigningError`] when an attribute is too long
    /// or the country is not a two-character PrintableString.
    pub fn as_x509_name(&self) -> Result<Name> {
        let mut rdns = Vec::new();
        for (oid, short, upper_bound, value) in self.attributes() {
            let Some(value) = value.filter(|v| !v.is_empty()) else {
                continue;
            };
            let length = value.chars().count();
            if length > upper_bound {
                return Err(malformed(format!(
                    "{short} is {length} characters, at most {upper_bound} allowed"
                )));
            }
            let printable = PrintableStringRef::new(value).is_ok();
            if oid == COUNTRY && (length != 2 || !printable) {
                return Err(malformed(format!(
                    "C must be a two-letter country code, got '{value}'"
                )));
            }
            let tag = if printable {
                Tag::PrintableString
            } else {
                Tag::Utf8String
            };
            let value = Any::new(tag, value.as_bytes())
                .map_err(|e| malformed(format!("{short}: {e}")))?;
            let mut set = SetOfVec::new();
            set.insert(AttributeTypeAndValue { oid, value })
                .map_err(|e| malformed(format!("{short}: {e}")))?;
            rdns.push(RelativeDistinguishedName(set));
        }
        Ok(RdnSequence(rdns))
    }

    /// Creates a subject from an X.509 name.
    ///
    /// Attributes other than the six the subject models are ignored. A repeated
    /// attribute keeps its last value.
    pub fn from_x509_name(name: &Name) -> Result<Self> {
        let mut subject = Subject::default();
        for rdn in name.0.iter() {
            for attr in rdn.0.iter() {
                let slot = match attr.oid {
                    COUNTRY => &mut subject.country,
                    STATE => &mut subject.state,
                    LOCALITY => &mut subject.locality,
                    ORGANIZATION => &mut subject.organization,
                    ORGANIZATION_UNIT => &mut subject.organization_unit,
                    COMMON_NAME => &mut subject.common_name,
                    _ => continue,
                };
                *slot = Some(directory_string(&attr.value)?);
            }
        }
        Ok(subject)
    }

    /// Whether no attribute would be encoded.
    pub fn is_empty(&self) -> bool {
        self.attributes()
            .into_iter()
            .all(|(.., value)| value.is_none_or(str::is_empty))
    }
}

/// Decodes a DirectoryString attribute value.
///
/// TeletexString is read as Latin-1, which covers what issuers put there in
/// practice; full T.61 code switching is not supported.
fn directory_string(value: &Any) -> Result<String> {
    let bytes = value.value();
    match value.tag() {
        Tag::PrintableString | Tag::Utf8String | Tag::Ia5String => std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|e| CsrKitError::DecodingError(format!("name attribute: {e}"))),
        Tag::TeletexString => Ok(bytes.iter().copied().map(char::from).collect()),
        Tag::BmpString => {
            if bytes.len() % 2 != 0 {
                return Err(CsrKitError::DecodingError(
                    "name attribute: odd-length BMPString".to_string(),
                ));
            }
            let units = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
            char::decode_utf16(units)
                .collect::<std::result::Result<String, _>>()
                .map_err(|e| CsrKitError::DecodingError(format!("name attribute: {e}")))
        }
        tag => Err(CsrKitError::DecodingError(format!(
            "unsupported name attribute type {tag}"
        ))),
    }
}

fn malformed(message: String) -> CsrKitError {
    CsrKitError::SigningError(format!("malformed subject: {message}"))
}
