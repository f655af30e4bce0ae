use bon::bon;
use der::asn1::OctetString;
use der::{Decode, Encode};
use num_bigint::BigUint;

use super::ToAndFromX509Extension;
use crate::asn1::{context_any, context_number, encode_any, sequence_items, uint_body, unsigned_from_be, wrap_sequence};
use crate::error::{Result, X509Error};
use crate::general_name::{GeneralName, decode_general_names, encode_general_names};
use crate::hash::HashAlgorithm;
use crate::key::PublicKey;
use crate::oid::{ObjectIdentifier, extension_oid};

/// Represents the Subject Key Identifier extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubjectKeyIdentifier {
    digest: Vec<u8>,
}

impl SubjectKeyIdentifier {
    pub fn new(digest: Vec<u8>) -> Self {
        Self { digest }
    }

    /// Derives the identifier as the SHA-1 of the `subjectPublicKey` BIT STRING
    /// (RFC 5280 §4.2.1.2, method 1).
    ///
    /// # Arguments
    /// * `public_key` - The key the identifier is computed for.
    ///
    /// # Returns
    /// A 20 byte identifier.
    pub fn from_public_key(public_key: &PublicKey) -> Result<Self> {
        let spki = public_key.to_spki()?;
        Ok(Self {
            digest: HashAlgorithm::Sha1.digest(spki.subject_public_key.raw_bytes()),
        })
    }

    pub fn digest(&self) -> &[u8] {
        &self.digest
    }
}

impl ToAndFromX509Extension for SubjectKeyIdentifier {
    const OID: ObjectIdentifier = extension_oid::SUBJECT_KEY_IDENTIFIER;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let ski = x509_cert::ext::pkix::SubjectKeyIdentifier(OctetString::new(self.digest.as_slice())?);
        Ok(ski.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let ski = x509_cert::ext::pkix::SubjectKeyIdentifier::from_der(extension)?;
        Ok(Self {
            digest: ski.0.as_bytes().to_vec(),
        })
    }
}

/// Represents the Authority Key Identifier (AKI) extension.
///
/// # Fields
/// * `key_identifier` - The issuer's subject key identifier.
/// * `authority_cert_issuer` - Names of the issuer's issuer.
/// * `authority_cert_serial_number` - The issuer certificate's serial number.
///
/// The issuer and serial number go together: both or neither.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AuthorityKeyIdentifier {
    key_identifier: Option<Vec<u8>>,
    authority_cert_issuer: Option<Vec<GeneralName>>,
    authority_cert_serial_number: Option<BigUint>,
}

#[bon]
impl AuthorityKeyIdentifier {
    #[builder]
    pub fn new(
        key_identifier: Option<Vec<u8>>,
        authority_cert_issuer: Option<Vec<GeneralName>>,
        authority_cert_serial_number: Option<BigUint>,
    ) -> Result<Self> {
        if authority_cert_issuer.is_some() != authority_cert_serial_number.is_some() {
            return Err(X509Error::InvalidInput(
                "authority_cert_issuer and authority_cert_serial_number must both be present or both be absent"
                    .to_string(),
            ));
        }
        Ok(Self {
            key_identifier,
            authority_cert_issuer,
            authority_cert_serial_number,
        })
    }

    /// An identifier holding only the issuer key's SKI.
    pub fn from_issuer_public_key(public_key: &PublicKey) -> Result<Self> {
        let ski = SubjectKeyIdentifier::from_public_key(public_key)?;
        Ok(Self {
            key_identifier: Some(ski.digest),
            authority_cert_issuer: None,
            authority_cert_serial_number: None,
        })
    }

    pub fn key_identifier(&self) -> Option<&[u8]> {
        self.key_identifier.as_deref()
    }

    pub fn authority_cert_issuer(&self) -> Option<&[GeneralName]> {
        self.authority_cert_issuer.as_deref()
    }

    pub fn authority_cert_serial_number(&self) -> Option<&BigUint> {
        self.authority_cert_serial_number.as_ref()
    }
}

impl ToAndFromX509Extension for AuthorityKeyIdentifier {
    const OID: ObjectIdentifier = extension_oid::AUTHORITY_KEY_IDENTIFIER;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let mut contents = Vec::new();
        if let Some(key_identifier) = &self.key_identifier {
            contents.extend(encode_any(&context_any(0, false, key_identifier)?)?);
        }
        if let Some(issuer) = &self.authority_cert_issuer {
            contents.extend(encode_any(&context_any(1, true, &encode_general_names(issuer)?)?)?);
        }
        if let Some(serial) = &self.authority_cert_serial_number {
            contents.extend(encode_any(&context_any(2, false, &uint_body(serial))?)?);
        }
        wrap_sequence(&contents)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let mut key_identifier = None;
        let mut authority_cert_issuer = None;
        let mut authority_cert_serial_number = None;
        let mut last = None;
        for item in sequence_items(extension)? {
            let field = context_number(&item);
            if field.map(|(n, _)| n) <= last {
                return Err(X509Error::InvalidInput(
                    "AuthorityKeyIdentifier fields out of order".to_string(),
                ));
            }
            last = field.map(|(n, _)| n);
            match field {
                Some((0, false)) => key_identifier = Some(item.value().to_vec()),
                Some((1, true)) => authority_cert_issuer = Some(decode_general_names(item.value())?),
                Some((2, false)) => {
                    authority_cert_serial_number = Some(unsigned_from_be(item.value())?)
                }
                _ => {
                    return Err(X509Error::InvalidInput(
                        "unexpected AuthorityKeyIdentifier field".to_string(),
                    ));
                }
            }
        }
        Self::builder()
            .maybe_key_identifier(key_identifier)
            .maybe_authority_cert_issuer(authority_cert_issuer)
            .maybe_authority_cert_serial_number(authority_cert_serial_number)
            .build()
    }
}
