//! Certificate revocation lists and their entries.

use core::fmt;
use core::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use der::{Decode, Reader, SliceReader, Tag, TagMode, TagNumber};
use num_bigint::BigUint;
use spki::AlgorithmIdentifierOwned;
use time::OffsetDateTime;
use x509_cert::crl::RevokedCert;
use x509_cert::ext::Extension as RawExtension;
use x509_cert::name::RdnSequence;
use x509_cert::time::Time;

use crate::asn1::{SignedEnvelope, biguint_to_serial, offset_to_time, serial_to_biguint, time_to_offset};
use crate::error::{Result, X509Error};
use crate::extensions::{ExtensionRegistry, Extensions, decode_extensions};
use crate::hash::HashAlgorithm;
use crate::key::PublicKey;
use crate::name::Name;
use crate::pem_utils::{Encoding, encode, pem_to_der};

pub(crate) const PEM_LABEL: &str = "X509 CRL";

/// One revoked certificate.
///
/// # Fields
/// * `serial_number` - Serial number of the revoked certificate.
/// * `revocation_date` - When the certificate was revoked.
/// * `raw_extensions` - `crlEntryExtensions` as encoded, empty when absent.
#[derive(Debug, Clone)]
pub struct RevokedCertificate {
    serial_number: BigUint,
    revocation_date: OffsetDateTime,
    raw_extensions: Vec<RawExtension>,
    registry: Arc<ExtensionRegistry>,
    extensions: OnceLock<Result<Extensions>>,
}

impl RevokedCertificate {
    fn from_x509(entry: RevokedCert, registry: Arc<ExtensionRegistry>) -> Result<Self> {
        Ok(Self {
            serial_number: serial_to_biguint(&entry.serial_number)?,
            revocation_date: time_to_offset(&entry.revocation_date)?,
            raw_extensions: entry.crl_entry_extensions.unwrap_or_default(),
            registry,
            extensions: OnceLock::new(),
        })
    }

    /// An entry made by [`crate::builder::RevokedCertificateBuilder`].
    pub(crate) fn from_parts(
        serial_number: BigUint,
        revocation_date: OffsetDateTime,
        extensions: Extensions,
    ) -> Result<Self> {
        Ok(Self {
            raw_extensions: extensions.to_x509()?,
            serial_number,
            revocation_date,
            registry: Arc::default(),
            extensions: OnceLock::from(Ok(extensions)),
        })
    }

    pub(crate) fn to_x509(&self) -> Result<RevokedCert> {
        Ok(RevokedCert {
            serial_number: biguint_to_serial(&self.serial_number)?,
            revocation_date: offset_to_time(self.revocation_date)?,
            crl_entry_extensions: if self.raw_extensions.is_empty() {
                None
            } else {
                Some(self.raw_extensions.clone())
            },
        })
    }

    pub fn serial_number(&self) -> &BigUint {
        &self.serial_number
    }

    pub fn revocation_date(&self) -> OffsetDateTime {
        self.revocation_date
    }

    /// The entry extensions, decoded on first access.
    pub fn extensions(&self) -> Result<&Extensions> {
        self.extensions
            .get_or_init(|| decode_extensions(&self.raw_extensions, &self.registry))
            .as_ref()
            .map_err(Clone::clone)
    }
}

impl PartialEq for RevokedCertificate {
    fn eq(&self, other: &Self) -> bool {
        self.serial_number == other.serial_number
            && self.revocation_date == other.revocation_date
            && self.raw_extensions == other.raw_extensions
    }
}

impl Eq for RevokedCertificate {}

impl fmt::Display for RevokedCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<RevokedCertificate(serial_number={}, revocation_date={})>",
            self.serial_number, self.revocation_date
        )
    }
}

/// `TBSCertList` fields, with the optional version read leniently.
struct TbsCertList {
    signature: AlgorithmIdentifierOwned,
    issuer: RdnSequence,
    this_update: Time,
    next_update: Option<Time>,
    revoked_certificates: Vec<RevokedCert>,
}

impl TbsCertList {
    fn from_der(der: &[u8]) -> Result<Self> {
        let mut reader = SliceReader::new(der)?;
        let tbs = reader.sequence(|r| {
            let version = if r.peek_tag()? == Tag::Integer {
                Some(u8::decode(r)?)
            } else {
                None
            };
            let signature = AlgorithmIdentifierOwned::decode(r)?;
            let issuer = RdnSequence::decode(r)?;
            let this_update = Time::decode(r)?;
            let next_update = Option::<Time>::decode(r)?;
            let revoked_certificates = Option::<Vec<RevokedCert>>::decode(r)?.unwrap_or_default();
            // crlExtensions are checked but not exposed.
            let crl_extensions = r
                .context_specific::<Vec<RawExtension>>(TagNumber::N0, TagMode::Explicit)?
                .unwrap_or_default();
            Ok((
                version,
                crl_extensions,
                TbsCertList {
                    signature,
                    issuer,
                    this_update,
                    next_update,
                    revoked_certificates,
                },
            ))
        })?;
        let (version, crl_extensions, tbs) = reader.finish(tbs)?;
        if let Some(version) = version.filter(|v| *v > 1) {
            return Err(X509Error::MalformedInput(format!(
                "{version} is not a valid CRL version"
            )));
        }
        let mut seen = Vec::with_capacity(crl_extensions.len());
        for extension in &crl_extensions {
            if seen.contains(&extension.extn_id) {
                return Err(X509Error::DuplicateExtension(extension.extn_id));
            }
            seen.push(extension.extn_id);
        }
        log::trace!(
            "decoded TBSCertList with {} entries",
            tbs.revoked_certificates.len()
        );
        Ok(tbs)
    }
}

/// Represents a certificate revocation list.
///
/// Entries are parsed when the list loads. Each entry decodes its own
/// extensions on first access.
#[derive(Debug, Clone)]
pub struct CertificateRevocationList {
    der: Vec<u8>,
    envelope: SignedEnvelope,
    issuer: Name,
    last_update: OffsetDateTime,
    next_update: Option<OffsetDateTime>,
    revoked: Vec<RevokedCertificate>,
}

impl CertificateRevocationList {
    pub fn from_pem(pem: impl AsRef<[u8]>) -> Result<Self> {
        Self::from_pem_with_registry(pem, Arc::default())
    }

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

    /// Loads a DER CRL. `registry` is used for the entry extensions.
    pub fn from_der_with_registry(der: &[u8], registry: Arc<ExtensionRegistry>) -> Result<Self> {
        let envelope = SignedEnvelope::decode(der)?;
        let tbs = TbsCertList::from_der(&envelope.tbs_bytes)?;
        if tbs.signature != envelope.algorithm {
            log::debug!("inner and outer CRL signature algorithms differ");
        }
        let revoked = tbs
            .revoked_certificates
            .into_iter()
            .map(|entry| RevokedCertificate::from_x509(entry, registry.clone()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            der: der.to_vec(),
            issuer: Name::from_x509(&tbs.issuer)?,
            last_update: time_to_offset(&tbs.this_update)?,
            next_update: tbs.next_update.as_ref().map(time_to_offset).transpose()?,
            envelope,
            revoked,
        })
    }

    pub fn issuer(&self) -> &Name {
        &self.issuer
    }

    pub fn last_update(&self) -> OffsetDateTime {
        self.last_update
    }

    pub fn next_update(&self) -> Option<OffsetDateTime> {
        self.next_update
    }

    pub fn len(&self) -> usize {
        self.revoked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revoked.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RevokedCertificate> {
        self.revoked.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RevokedCertificate> {
        self.revoked.iter()
    }

    /// Finds the entry for `serial_number`, if revoked.
    pub fn get_revoked_certificate_by_serial_number(
        &self,
        serial_number: &BigUint,
    ) -> Option<&RevokedCertificate> {
        self.revoked
            .iter()
            .find(|entry| entry.serial_number() == serial_number)
    }

    pub fn signature_hash_algorithm(&self) -> Result<HashAlgorithm> {
        HashAlgorithm::from_signature_oid(self.envelope.algorithm.oid)
    }

    pub fn signature(&self) -> &[u8] {
        &self.envelope.signature
    }

    pub fn tbs_certlist_bytes(&self) -> &[u8] {
        &self.envelope.tbs_bytes
    }

    /// CRL-level extensions are not exposed, even when the list has some.
    pub fn extensions(&self) -> Result<&Extensions> {
        Err(X509Error::NotImplemented(
            "CertificateRevocationList extensions".to_string(),
        ))
    }

    /// Checks the signature against the issuer's public key.
    pub fn verify_signature(&self, issuer_key: &PublicKey) -> Result<()> {
        self.envelope.verify(issuer_key)
    }

    pub fn fingerprint(&self, hash: HashAlgorithm) -> Vec<u8> {
        hash.digest(&self.der)
    }

    pub fn public_bytes(&self, encoding: Encoding) -> Vec<u8> {
        encode(&self.der, PEM_LABEL, encoding)
    }

    pub fn to_der(&self) -> &[u8] {
        &self.der
    }
}

impl<'a> IntoIterator for &'a CertificateRevocationList {
    type Item = &'a RevokedCertificate;
    type IntoIter = std::slice::Iter<'a, RevokedCertificate>;

    fn into_iter(self) -> Self::IntoIter {
        self.revoked.iter()
    }
}

impl PartialEq for CertificateRevocationList {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for CertificateRevocationList {}

impl Hash for CertificateRevocationList {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.der.hash(state);
    }
}
