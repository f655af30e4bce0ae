use bon::bon;
use der::asn1::Null;
use der::flagset::FlagSet;
use der::{Decode, Encode};
use x509_cert::ext::pkix::KeyUsages;

use super::ToAndFromX509Extension;
use crate::error::{Result, X509Error};
use crate::oid::{ObjectIdentifier, extension_oid};

/// Represents the Basic Constraints extension.
///
/// # Fields
/// * `ca` - Whether the subject is a CA.
/// * `path_length` - The maximum number of intermediate CAs below this one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BasicConstraints {
    ca: bool,
    path_length: Option<u8>,
}

impl BasicConstraints {
    /// A path length is only allowed on a CA.
    pub fn new(ca: bool, path_length: Option<u8>) -> Result<Self> {
        if !ca && path_length.is_some() {
            return Err(X509Error::InvalidInput(
                "path_length must be None when ca is False".to_string(),
            ));
        }
        Ok(Self { ca, path_length })
    }

    pub fn ca(&self) -> bool {
        self.ca
    }

    pub fn path_length(&self) -> Option<u8> {
        self.path_length
    }
}

impl ToAndFromX509Extension for BasicConstraints {
    const OID: ObjectIdentifier = extension_oid::BASIC_CONSTRAINTS;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let bc = x509_cert::ext::pkix::BasicConstraints {
            ca: self.ca,
            path_len_constraint: self.path_length,
        };
        Ok(bc.to_der()?)
    }

    fn from_x509_extension_value(der_bytes: &[u8]) -> Result<Self> {
        let bc = x509_cert::ext::pkix::BasicConstraints::from_der(der_bytes)?;
        Self::new(bc.ca, bc.path_len_constraint)
    }
}

/// Represents the Key Usage extension.
///
/// `encipher_only` and `decipher_only` can only be set together with
/// `key_agreement`.
///
/// ```
/// use x509kit::extensions::KeyUsage;
/// let usage = KeyUsage::builder()
///     .digital_signature(true)
///     .key_cert_sign(true)
///     .build()
///     .unwrap();
/// assert!(usage.key_cert_sign());
/// assert!(!usage.crl_sign());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KeyUsage {
    digital_signature: bool,
    content_commitment: bool,
    key_encipherment: bool,
    data_encipherment: bool,
    key_agreement: bool,
    key_cert_sign: bool,
    crl_sign: bool,
    encipher_only: bool,
    decipher_only: bool,
}

#[bon]
impl KeyUsage {
    #[builder]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        #[builder(default)] digital_signature: bool,
        #[builder(default)] content_commitment: bool,
        #[builder(default)] key_encipherment: bool,
        #[builder(default)] data_encipherment: bool,
        #[builder(default)] key_agreement: bool,
        #[builder(default)] key_cert_sign: bool,
        #[builder(default)] crl_sign: bool,
        #[builder(default)] encipher_only: bool,
        #[builder(default)] decipher_only: bool,
    ) -> Result<Self> {
        if !key_agreement && (encipher_only || decipher_only) {
            return Err(X509Error::InvalidInput(
                "encipher_only and decipher_only can only be true when key_agreement is true"
                    .to_string(),
            ));
        }
        Ok(Self {
            digital_signature,
            content_commitment,
            key_encipherment,
            data_encipherment,
            key_agreement,
            key_cert_sign,
            crl_sign,
            encipher_only,
            decipher_only,
        })
    }

    pub fn digital_signature(&self) -> bool {
        self.digital_signature
    }

    /// Formerly `nonRepudiation`.
    pub fn content_commitment(&self) -> bool {
        self.content_commitment
    }

    pub fn key_encipherment(&self) -> bool {
        self.key_encipherment
    }

    pub fn data_encipherment(&self) -> bool {
        self.data_encipherment
    }

    pub fn key_agreement(&self) -> bool {
        self.key_agreement
    }

    pub fn key_cert_sign(&self) -> bool {
        self.key_cert_sign
    }

    pub fn crl_sign(&self) -> bool {
        self.crl_sign
    }

    pub fn encipher_only(&self) -> bool {
        self.encipher_only
    }

    pub fn decipher_only(&self) -> bool {
        self.decipher_only
    }

    fn flags(&self) -> FlagSet<KeyUsages> {
        let mut flags = FlagSet::<KeyUsages>::default();
        let bits = [
            (self.digital_signature, KeyUsages::DigitalSignature),
            (self.content_commitment, KeyUsages::NonRepudiation),
            (self.key_encipherment, KeyUsages::KeyEncipherment),
            (self.data_encipherment, KeyUsages::DataEncipherment),
            (self.key_agreement, KeyUsages::KeyAgreement),
            (self.key_cert_sign, KeyUsages::KeyCertSign),
            (self.crl_sign, KeyUsages::CRLSign),
            (self.encipher_only, KeyUsages::EncipherOnly),
            (self.decipher_only, KeyUsages::DecipherOnly),
        ];
        for (set, flag) in bits {
            if set {
                flags |= flag;
            }
        }
        flags
    }
}

impl ToAndFromX509Extension for KeyUsage {
    const OID: ObjectIdentifier = extension_oid::KEY_USAGE;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let ku = x509_cert::ext::pkix::KeyUsage(self.flags());
        Ok(ku.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let flags = x509_cert::ext::pkix::KeyUsage::from_der(extension)?.0;
        Self::builder()
            .digital_signature(flags.contains(KeyUsages::DigitalSignature))
            .content_commitment(flags.contains(KeyUsages::NonRepudiation))
            .key_encipherment(flags.contains(KeyUsages::KeyEncipherment))
            .data_encipherment(flags.contains(KeyUsages::DataEncipherment))
            .key_agreement(flags.contains(KeyUsages::KeyAgreement))
            .key_cert_sign(flags.contains(KeyUsages::KeyCertSign))
            .crl_sign(flags.contains(KeyUsages::CRLSign))
            .encipher_only(flags.contains(KeyUsages::EncipherOnly))
            .decipher_only(flags.contains(KeyUsages::DecipherOnly))
            .build()
    }
}

/// Represents the Extended Key Usage extension.
///
/// Purposes are kept as OIDs, see [`crate::oid::extended_key_usage_oid`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ExtendedKeyUsage {
    usages: Vec<ObjectIdentifier>,
}

impl ExtendedKeyUsage {
    pub fn new(usages: Vec<ObjectIdentifier>) -> Self {
        Self { usages }
    }

    pub fn usages(&self) -> &[ObjectIdentifier] {
        &self.usages
    }
}

impl ToAndFromX509Extension for ExtendedKeyUsage {
    const OID: ObjectIdentifier = extension_oid::EXTENDED_KEY_USAGE;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let eku = x509_cert::ext::pkix::ExtendedKeyUsage(self.usages.clone());
        Ok(eku.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let eku = x509_cert::ext::pkix::ExtendedKeyUsage::from_der(extension)?;
        Ok(Self { usages: eku.0 })
    }
}

/// Represents the Inhibit anyPolicy extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InhibitAnyPolicy {
    pub skip_certs: u32,
}

impl ToAndFromX509Extension for InhibitAnyPolicy {
    const OID: ObjectIdentifier = extension_oid::INHIBIT_ANY_POLICY;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        Ok(x509_cert::ext::pkix::InhibitAnyPolicy(self.skip_certs).to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let value = x509_cert::ext::pkix::InhibitAnyPolicy::from_der(extension)?;
        Ok(Self {
            skip_certs: value.0,
        })
    }
}

/// The OCSP No Check extension. Its value is always NULL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct OcspNoCheck;

impl ToAndFromX509Extension for OcspNoCheck {
    const OID: ObjectIdentifier = extension_oid::OCSP_NO_CHECK;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        Ok(Null.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        Null::from_der(extension)?;
        Ok(OcspNoCheck)
    }
}
