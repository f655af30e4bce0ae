use der::asn1::BitString;
use der::{Decode, Encode, Reader, SliceReader, TagMode, TagNumber};
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::Version as X509Version;
use x509_cert::certificate::TbsCertificateInner;
use x509_cert::ext::Extension as RawExtension;
use x509_cert::name::RdnSequence;
use x509_cert::serial_number::SerialNumber;
use x509_cert::time::Validity;

use crate::error::{Result, X509Error};

/// Represents the "To Be Signed" (TBS) portion of an X.509 certificate.
///
/// # Fields
/// * `raw_version` - The version INTEGER exactly as encoded (0 for v1).
/// * `serial_number` - The unique identifier for the certificate.
/// * `signature` - The algorithm used to sign the certificate.
/// * `issuer` - The distinguished name of the certificate issuer.
/// * `validity` - The certificate's validity period.
/// * `subject` - The distinguished name of the certificate subject.
/// * `subject_public_key_info` - The public key of the certificate subject.
/// * `extensions` - Raw X.509 extensions, in encoding order.
#[derive(Debug, Clone)]
pub(crate) struct TbsCertificate {
    pub raw_version: u64,
    pub serial_number: SerialNumber,
    pub signature: AlgorithmIdentifierOwned,
    pub issuer: RdnSequence,
    pub validity: Validity,
    pub subject: RdnSequence,
    pub subject_public_key_info: SubjectPublicKeyInfoOwned,
    pub issuer_unique_id: Option<BitString>,
    pub subject_unique_id: Option<BitString>,
    pub extensions: Vec<RawExtension>,
}

impl TbsCertificate {
    /// Decodes a DER `TBSCertificate`.
    ///
    /// Any non-negative version number is accepted here. It is only checked
    /// when the certificate's version is read.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let mut reader = SliceReader::new(der)?;
        let tbs = reader.sequence(|r| {
            let raw_version = r
                .context_specific::<u64>(TagNumber::N0, TagMode::Explicit)?
                .unwrap_or(0);
            let serial_number = SerialNumber::decode(r)?;
            let signature = AlgorithmIdentifierOwned::decode(r)?;
            let issuer = RdnSequence::decode(r)?;
            let validity = Validity::decode(r)?;
            let subject = RdnSequence::decode(r)?;
            let subject_public_key_info = SubjectPublicKeyInfoOwned::decode(r)?;
            let issuer_unique_id = r.context_specific::<BitString>(TagNumber::N1, TagMode::Implicit)?;
            let subject_unique_id =
                r.context_specific::<BitString>(TagNumber::N2, TagMode::Implicit)?;
            let extensions = r
                .context_specific::<Vec<RawExtension>>(TagNumber::N3, TagMode::Explicit)?
                .unwrap_or_default();
            Ok(TbsCertificate {
                raw_version,
                serial_number,
                signature,
                issuer,
                validity,
                subject,
                subject_public_key_info,
                issuer_unique_id,
                subject_unique_id,
                extensions,
            })
        })?;
        let tbs = reader.finish(tbs)?;
        log::trace!(
            "decoded TBSCertificate v{} with {} extensions",
            tbs.raw_version.saturating_add(1),
            tbs.extensions.len()
        );
        Ok(tbs)
    }

    /// Encodes the `TBSCertificate` with its stored version. The version field
    /// is omitted for v1 and the extensions field is omitted when empty.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        let version = match self.raw_version {
            0 => X509Version::V1,
            1 => X509Version::V2,
            2 => X509Version::V3,
            other => return Err(X509Error::InvalidVersion(other)),
        };
        let inner = TbsCertificateInner {
            version,
            serial_number: self.serial_number.clone(),
            signature: self.signature.clone(),
            issuer: self.issuer.clone(),
            validity: self.validity.clone(),
            subject: self.subject.clone(),
            subject_public_key_info: self.subject_public_key_info.clone(),
            issuer_unique_id: self.issuer_unique_id.clone(),
            subject_unique_id: self.subject_unique_id.clone(),
            extensions: if self.extensions.is_empty() {
                None
            } else {
                Some(self.extensions.clone())
            },
        };
        inner
            .to_der()
            .map_err(|e| X509Error::EncodingError(e.to_string()))
    }
}
