//! Distinguished names as an ordered list of attributes.
//!
//! A [`Name`] flattens the RDN sequence in encounter order. Two names holding the
//! same attributes in a different order are different names.

use core::fmt;

use der::asn1::{Ia5StringRef, PrintableStringRef, SetOfVec};
use der::{Any, Decode, Encode, Tag, Tagged};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{RdnSequence, RelativeDistinguishedName};

use crate::error::{Result, X509Error};
use crate::oid::{ObjectIdentifier, OidName, name_oid};

/// One `(type, value)` pair of a distinguished name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NameAttribute {
    oid: ObjectIdentifier,
    value: String,
}

impl NameAttribute {
    /// Creates an attribute.
    ///
    /// # Arguments
    /// * `oid` - The attribute type, e.g. [`name_oid::COMMON_NAME`].
    /// * `value` - The attribute text.
    pub fn new(oid: ObjectIdentifier, value: impl Into<String>) -> Self {
        Self {
            oid,
            value: value.into(),
        }
    }

    pub fn oid(&self) -> ObjectIdentifier {
        self.oid
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// DER string type used when this attribute is encoded.
    fn string_tag(&self) -> Tag {
        match self.oid {
            name_oid::COUNTRY_NAME | name_oid::SERIAL_NUMBER | name_oid::DN_QUALIFIER => {
                Tag::PrintableString
            }
            name_oid::EMAIL_ADDRESS | name_oid::DOMAIN_COMPONENT => Tag::Ia5String,
            _ => Tag::Utf8String,
        }
    }

    pub(crate) fn to_x509(&self) -> Result<AttributeTypeAndValue> {
        let tag = self.string_tag();
        let invalid = |e: der::Error| {
            X509Error::InvalidInput(format!(
                "{:?} cannot be encoded for {}: {e}",
                self.value,
                self.oid.name()
            ))
        };
        match tag {
            Tag::PrintableString => {
                PrintableStringRef::new(&self.value).map_err(invalid)?;
            }
            Tag::Ia5String => {
                Ia5StringRef::new(&self.value).map_err(invalid)?;
            }
            _ => {}
        }
        Ok(AttributeTypeAndValue {
            oid: self.oid,
            value: Any::new(tag, self.value.as_bytes())?,
        })
    }

    pub(crate) fn from_x509(atv: &AttributeTypeAndValue) -> Result<Self> {
        Ok(Self {
            oid: atv.oid,
            value: decode_directory_string(&atv.value)?,
        })
    }
}

impl fmt::Display for NameAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<NameAttribute(oid={}, value={:?})>",
            self.oid.describe(),
            self.value
        )
    }
}

/// Reads any of the string types found in directory names.
pub(crate) fn decode_directory_string(value: &Any) -> Result<String> {
    let bytes = value.value();
    match value.tag() {
        Tag::Utf8String => String::from_utf8(bytes.to_vec())
            .map_err(|e| X509Error::MalformedInput(format!("invalid UTF8String: {e}"))),
        Tag::PrintableString | Tag::Ia5String | Tag::VisibleString | Tag::NumericString => {
            crate::asn1::ascii_from_bytes(bytes)
                .map_err(|e| X509Error::MalformedInput(e.to_string()))
        }
        // T.61 is read as Latin-1, which is what deployed CAs actually emit.
        Tag::TeletexString => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        Tag::BmpString => {
            if bytes.len() % 2 != 0 {
                return Err(X509Error::MalformedInput(
                    "BMPString has an odd length".to_string(),
                ));
            }
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16(&units)
                .map_err(|e| X509Error::MalformedInput(format!("invalid BMPString: {e}")))
        }
        other => Err(X509Error::MalformedInput(format!(
            "unsupported directory string type {other}"
        ))),
    }
}

/// An ordered distinguished name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Name {
    attributes: Vec<NameAttribute>,
}

impl Name {
    pub fn new(attributes: Vec<NameAttribute>) -> Self {
        Self { attributes }
    }

    pub fn attributes(&self) -> &[NameAttribute] {
        &self.attributes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NameAttribute> {
        self.attributes.iter()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Returns every attribute of type `oid`, in order of occurrence.
    pub fn get_attributes_for_oid(&self, oid: ObjectIdentifier) -> Vec<&NameAttribute> {
        self.attributes
            .iter()
            .filter(|attribute| attribute.oid == oid)
            .collect()
    }

    /// Converts to the RDN sequence form, one single-valued RDN per attribute.
    pub(crate) fn to_x509(&self) -> Result<RdnSequence> {
        let rdns = self
            .attributes
            .iter()
            .map(|attribute| {
                let mut set = SetOfVec::new();
                set.insert(attribute.to_x509()?)?;
                Ok(RelativeDistinguishedName(set))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(RdnSequence(rdns))
    }

    pub(crate) fn from_x509(rdns: &RdnSequence) -> Result<Self> {
        let attributes = rdns
            .0
            .iter()
            .flat_map(|rdn| rdn.0.iter())
            .map(NameAttribute::from_x509)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { attributes })
    }

    /// Encodes all attributes as one multi-valued RDN.
    ///
    /// The RDN is a SET OF, so the attributes come out in DER order and
    /// `from_relative_x509` returns them in that order.
    pub(crate) fn to_relative_x509(&self) -> Result<RelativeDistinguishedName> {
        let mut set = SetOfVec::new();
        for attribute in &self.attributes {
            set.insert(attribute.to_x509()?)?;
        }
        Ok(RelativeDistinguishedName(set))
    }

    pub(crate) fn from_relative_x509(rdn: &RelativeDistinguishedName) -> Result<Self> {
        let attributes = rdn
            .0
            .iter()
            .map(NameAttribute::from_x509)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { attributes })
    }

    /// DER encoding of the name.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.to_x509()?
            .to_der()
            .map_err(|e| X509Error::EncodingError(e.to_string()))
    }

    /// Parses a DER-encoded name.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        Self::from_x509(&RdnSequence::from_der(der)?)
    }
}

impl FromIterator<NameAttribute> for Name {
    fn from_iter<I: IntoIterator<Item = NameAttribute>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Name {
    type Item = &'a NameAttribute;
    type IntoIter = std::slice::Iter<'a, NameAttribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.attributes.iter()
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<Name([")?;
        for (i, attribute) in self.attributes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{attribute}")?;
        }
        f.write_str("])>")
    }
}
