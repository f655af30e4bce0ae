//! Parsed X.509 certificates.

use core::fmt;
use core::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use num_bigint::BigUint;
use spki::AlgorithmIdentifierOwned;
use time::OffsetDateTime;

use crate::asn1::{SignedEnvelope, serial_to_biguint, time_to_offset};
use crate::error::{Result, X509Error};
use crate::extensions::{ExtensionRegistry, Extensions, decode_extensions};
use crate::hash::HashAlgorithm;
use crate::key::PublicKey;
use crate::name::Name;
use crate::oid::ObjectIdentifier;
use crate::pem_utils::{Encoding, encode, pem_to_der};
use crate::tbs_certificate::TbsCertificate;

pub(crate) const PEM_LABEL: &str = "CERTIFICATE";

/// The certificate format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Version {
    V1,
    V2,
    V3,
}

impl Version {
    /// The INTEGER written in the certificate: 0 for v1, 2 for v3.
    pub fn value(self) -> u64 {
        match self {
            Version::V1 => 0,
            Version::V2 => 1,
            Version::V3 => 2,
        }
    }

    pub(crate) fn from_raw(raw: u64) -> Result<Self> {
        match raw {
            0 => Ok(Version::V1),
            1 => Ok(Version::V2),
            2 => Ok(Version::V3),
            other => Err(X509Error::InvalidVersion(other)),
        }
    }
}

/// Represents an X.509 certificate.
///
/// Certificates come from [`Certificate::from_pem`], [`Certificate::from_der`] or
/// [`crate::builder::CertificateBuilder::sign`] and never change afterwards.
/// Two certificates are equal when their DER encodings are.
#[derive(Debug, Clone)]
pub struct Certificate {
    der: Vec<u8>,
    envelope: SignedEnvelope,
    tbs: TbsCertificate,
    serial_number: BigUint,
    issuer: Name,
    subject: Name,
    not_valid_before: OffsetDateTime,
    not_valid_after: OffsetDateTime,
    registry: Arc<ExtensionRegistry>,
    extensions: OnceLock<Result<Extensions>>,
}

impl Certificate {
    /// Loads a PEM `CERTIFICATE` block.
    pub fn from_pem(pem: impl AsRef<[u8]>) -> Result<Self> {
        Self::from_pem_with_registry(pem, Arc::default())
    }

    /// Loads a DER certificate.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        Self::from_der_with_registry(der, Arc::default())
    }

    pub fn from_pem_with_registry(
        pem: impl AsRef<[u8]>,
        registry: Arc<ExtensionRegistry>,
    ) -> Result<Self> {
        let der = pem_to_der(pem, PEM_LABEL)?;
        Self::from_der_with_registry(&der, registry)
    }

    /// Loads a DER certificate whose extensions are decoded with `registry`.
    ///
    /// # Arguments
    /// * `der` - The complete certificate. Trailing bytes are rejected.
    /// * `registry` - Decoders for custom extension OIDs.
    pub fn from_der_with_registry(der: &[u8], registry: Arc<ExtensionRegistry>) -> Result<Self> {
        let envelope = SignedEnvelope::decode(der)?;
        let tbs = TbsCertificate::from_der(&envelope.tbs_bytes)?;
        let validity = &tbs.validity;
        Ok(Self {
            der: der.to_vec(),
            serial_number: serial_to_biguint(&tbs.serial_number)?,
            issuer: Name::from_x509(&tbs.issuer)?,
            subject: Name::from_x509(&tbs.subject)?,
            not_valid_before: time_to_offset(&validity.not_before)?,
            not_valid_after: time_to_offset(&validity.not_after)?,
            envelope,
            tbs,
            registry,
            extensions: OnceLock::new(),
        })
    }

    /// The certificate version.
    ///
    /// # Returns
    /// [`X509Error::InvalidVersion`] with the raw number when it is not 0, 1 or 2.
    pub fn version(&self) -> Result<Version> {
        Version::from_raw(self.tbs.raw_version).inspect_err(|_| {
            log::debug!("certificate carries invalid version {}", self.tbs.raw_version);
        })
    }

    pub fn serial_number(&self) -> &BigUint {
        &self.serial_number
    }

    pub fn issuer(&self) -> &Name {
        &self.issuer
    }

    pub fn subject(&self) -> &Name {
        &self.subject
    }

    pub fn not_valid_before(&self) -> OffsetDateTime {
        self.not_valid_before
    }

    pub fn not_valid_after(&self) -> OffsetDateTime {
        self.not_valid_after
    }

    /// The subject public key.
    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_spki(&self.tbs.subject_public_key_info)
    }

    pub fn signature_algorithm(&self) -> &AlgorithmIdentifierOwned {
        &self.envelope.algorithm
    }

    pub fn signature_algorithm_oid(&self) -> ObjectIdentifier {
        self.envelope.algorithm.oid
    }

    /// The digest used by the signature, e.g. SHA-256 for `sha256WithRSAEncryption`.
    pub fn signature_hash_algorithm(&self) -> Result<HashAlgorithm> {
        HashAlgorithm::from_signature_oid(self.envelope.algorithm.oid)
    }

    pub fn signature(&self) -> &[u8] {
        &self.envelope.signature
    }

    /// The DER `TBSCertificate`, exactly as found in the input.
    pub fn tbs_certificate_bytes(&self) -> &[u8] {
        &self.envelope.tbs_bytes
    }

    /// The decoded extensions. Decoding happens on first access and the result,
    /// success or failure, is kept.
    pub fn extensions(&self) -> Result<&Extensions> {
        self.extensions
            .get_or_init(|| decode_extensions(&self.tbs.extensions, &self.registry))
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Hash of the full DER encoding.
    pub fn fingerprint(&self, hash: HashAlgorithm) -> Vec<u8> {
        hash.digest(&self.der)
    }

    pub fn public_bytes(&self, encoding: Encoding) -> Vec<u8> {
        encode(&self.der, PEM_LABEL, encoding)
    }

    pub fn to_der(&self) -> &[u8] {
        &self.der
    }

    /// Checks the signature against the issuer's public key.
    pub fn verify_signature(&self, issuer_key: &PublicKey) -> Result<()> {
        self.envelope.verify(issuer_key)
    }
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for Certificate {}

impl Hash for Certificate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.der.hash(state);
    }
}

impl fmt::Display for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Certificate(subject={}, ...)>", self.subject)
    }
}
