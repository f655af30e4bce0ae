use super::ToAndFromX509Extension;
use crate::asn1::{sequence_items, wrap_sequence};
use crate::error::Result;
use crate::general_name::{GeneralName, encode_general_names};
use crate::oid::{ObjectIdentifier, extension_oid};

/// Encodes a `GeneralNames` SEQUENCE.
pub(super) fn general_names_to_der(names: &[GeneralName]) -> Result<Vec<u8>> {
    wrap_sequence(&encode_general_names(names)?)
}

/// Decodes a `GeneralNames` SEQUENCE.
pub(super) fn general_names_from_der(der: &[u8]) -> Result<Vec<GeneralName>> {
    sequence_items(der)?
        .iter()
        .map(GeneralName::from_any)
        .collect()
}

/// Represents the Subject Alternative Name (SAN) extension.
///
/// # Fields
/// * `names` - Additional identities of the subject, in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SubjectAlternativeName {
    names: Vec<GeneralName>,
}

impl SubjectAlternativeName {
    pub fn new(names: Vec<GeneralName>) -> Self {
        Self { names }
    }

    pub fn names(&self) -> &[GeneralName] {
        &self.names
    }

    /// DNS names only, in order.
    pub fn dns_names(&self) -> Vec<&str> {
        self.names
            .iter()
            .filter_map(|name| match name {
                GeneralName::DnsName(dns) => Some(dns.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl ToAndFromX509Extension for SubjectAlternativeName {
    const OID: ObjectIdentifier = extension_oid::SUBJECT_ALTERNATIVE_NAME;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        general_names_to_der(&self.names)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        Ok(Self {
            names: general_names_from_der(extension)?,
        })
    }
}

/// Represents the Issuer Alternative Name extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct IssuerAlternativeName {
    names: Vec<GeneralName>,
}

impl IssuerAlternativeName {
    pub fn new(names: Vec<GeneralName>) -> Self {
        Self { names }
    }

    pub fn names(&self) -> &[GeneralName] {
        &self.names
    }
}

impl ToAndFromX509Extension for IssuerAlternativeName {
    const OID: ObjectIdentifier = extension_oid::ISSUER_ALTERNATIVE_NAME;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        general_names_to_der(&self.names)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        Ok(Self {
            names: general_names_from_der(extension)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use der::Decode;

    use super::*;
    use crate::general_name::IpAddressValue;

    #[test]
    fn test_san_matches_x509_cert_encoding() {
        let san = SubjectAlternativeName::new(vec![
            GeneralName::dns_name("cryptography.io").unwrap(),
            GeneralName::IpAddress(IpAddressValue::Address("127.0.0.1".parse().unwrap())),
        ]);
        let der = san.to_x509_extension_value().unwrap();
        let parsed = x509_cert::ext::pkix::SubjectAltName::from_der(&der).unwrap();
        assert_eq!(parsed.0.len(), 2);
        assert_eq!(SubjectAlternativeName::from_x509_extension_value(&der).unwrap(), san);
        assert_eq!(san.dns_names(), vec!["cryptography.io"]);
    }

    #[test]
    fn test_issuer_alternative_name_round_trip() {
        let ian = IssuerAlternativeName::new(vec![GeneralName::uri("http://ca.example").unwrap()]);
        let der = ian.to_x509_extension_value().unwrap();
        assert_eq!(IssuerAlternativeName::from_x509_extension_value(&der).unwrap(), ian);
    }
}
