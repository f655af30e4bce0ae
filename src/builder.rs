//! Immutable builders for certificates, CSRs and CRLs.
//!
//! Every setter consumes the builder and returns a new one, so a partially
//! filled builder can be cloned and finished in different ways. Single-value
//! fields may be set once. `sign()` returns an object loaded back from the
//! bytes it produced.

use std::sync::Arc;

use der::asn1::SetOfVec;
use der::{Any, Encode};
use num_bigint::BigUint;
use spki::AlgorithmIdentifierOwned;
use time::OffsetDateTime;
use x509_cert::crl::TbsCertList;
use x509_cert::ext::Extension as RawExtension;
use x509_cert::request::CertReqInfo;
use x509_cert::time::Validity;

use crate::asn1::{SignedEnvelope, biguint_to_serial, check_serial, offset_to_time};
use crate::cert::Certificate;
use crate::crl::{CertificateRevocationList, RevokedCertificate};
use crate::csr::CertificateSigningRequest;
use crate::error::{Result, X509Error};
use crate::extensions::{Extension, ExtensionRegistry, Extensions};
use crate::hash::HashAlgorithm;
use crate::key::{KeyPair, PublicKey};
use crate::name::Name;
use crate::oid::EXTENSION_REQUEST;
use crate::tbs_certificate::TbsCertificate;

/// The raw version number of every certificate this crate signs (v3).
const CERTIFICATE_VERSION: u64 = 2;

fn set_once<T>(slot: &mut Option<T>, value: T, field: &'static str) -> Result<()> {
    if slot.is_some() {
        log::debug!("rejecting second value for the {field}");
        return Err(X509Error::AlreadySet(field));
    }
    *slot = Some(value);
    Ok(())
}

fn push_extension(queue: &mut Vec<Extension>, extension: Extension) -> Result<()> {
    if queue.iter().any(|queued| queued.oid() == extension.oid()) {
        log::debug!("rejecting duplicate extension {}", extension.oid());
        return Err(X509Error::DuplicateExtension(extension.oid()));
    }
    queue.push(extension);
    Ok(())
}

fn required<'a, T>(slot: &'a Option<T>, message: &str) -> Result<&'a T> {
    slot.as_ref()
        .ok_or_else(|| X509Error::MissingRequiredField(message.to_string()))
}

fn check_time(value: OffsetDateTime, field: &str) -> Result<()> {
    offset_to_time(value).map(|_| ()).inspect_err(|e| {
        log::debug!("rejecting {field} {value}: {e}");
    })
}

/// Steps 3 to 5 of signing: key family, extension encoding and key size.
fn prepare_signature(
    key: &KeyPair,
    hash: HashAlgorithm,
    extensions: &[Extension],
) -> Result<(AlgorithmIdentifierOwned, Vec<RawExtension>)> {
    let algorithm = key.signature_algorithm(hash)?;
    let raw = extensions
        .iter()
        .map(Extension::to_x509)
        .collect::<Result<Vec<_>>>()?;
    key.check_digest_fits(hash)?;
    Ok((algorithm, raw))
}

fn sign_envelope(
    key: &KeyPair,
    hash: HashAlgorithm,
    algorithm: AlgorithmIdentifierOwned,
    tbs_bytes: Vec<u8>,
) -> Result<Vec<u8>> {
    let signature = key.sign(&tbs_bytes, hash)?;
    SignedEnvelope {
        tbs_bytes,
        algorithm,
        signature,
    }
    .encode()
}

fn encoding_error(e: der::Error) -> X509Error {
    X509Error::EncodingError(e.to_string())
}

/// Builds and signs a v3 certificate.
///
/// ```no_run
/// use time::macros::datetime;
/// use x509kit::builder::CertificateBuilder;
/// use x509kit::extensions::{BasicConstraints, Extension};
/// use x509kit::hash::HashAlgorithm;
/// use x509kit::key::KeyPair;
/// use x509kit::name::{Name, NameAttribute};
/// use x509kit::oid::name_oid;
///
/// let key = KeyPair::generate_ecdsa_p256();
/// let name = Name::new(vec![NameAttribute::new(name_oid::COMMON_NAME, "example.com")]);
/// let cert = CertificateBuilder::new()
///     .issuer_name(name.clone())?
///     .subject_name(name)?
///     .public_key(key.public_key())?
///     .serial_number(777u32.into())?
///     .not_valid_before(datetime!(2024-01-01 0:00 UTC))?
///     .not_valid_after(datetime!(2025-01-01 0:00 UTC))?
///     .add_extension(Extension::new(BasicConstraints::new(true, None)?, true))?
///     .sign(&key, HashAlgorithm::Sha256)?;
/// assert_eq!(cert.serial_number(), &777u32.into());
/// # Ok::<(), x509kit::error::X509Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct CertificateBuilder {
    issuer_name: Option<Name>,
    subject_name: Option<Name>,
    public_key: Option<PublicKey>,
    serial_number: Option<BigUint>,
    not_valid_before: Option<OffsetDateTime>,
    not_valid_after: Option<OffsetDateTime>,
    extensions: Vec<Extension>,
    registry: Arc<ExtensionRegistry>,
}

impl CertificateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry used when the signed certificate is loaded back.
    pub fn with_registry(mut self, registry: Arc<ExtensionRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn issuer_name(mut self, name: Name) -> Result<Self> {
        set_once(&mut self.issuer_name, name, "issuer name")?;
        Ok(self)
    }

    pub fn subject_name(mut self, name: Name) -> Result<Self> {
        set_once(&mut self.subject_name, name, "subject name")?;
        Ok(self)
    }

    pub fn public_key(mut self, key: PublicKey) -> Result<Self> {
        set_once(&mut self.public_key, key, "public key")?;
        Ok(self)
    }

    /// Sets the serial number, which must be positive and below `2^159`.
    pub fn serial_number(mut self, serial: BigUint) -> Result<Self> {
        if self.serial_number.is_none() {
            check_serial(&serial).inspect_err(|_| {
                log::debug!("rejecting serial number of {} bits", serial.bits());
            })?;
        }
        set_once(&mut self.serial_number, serial, "serial number")?;
        Ok(self)
    }

    pub fn not_valid_before(mut self, time: OffsetDateTime) -> Result<Self> {
        if self.not_valid_before.is_none() {
            check_time(time, "not valid before")?;
            if self.not_valid_after.is_some_and(|after| time > after) {
                return Err(X509Error::InvalidInput(
                    "The not valid before date must be before the not valid after date."
                        .to_string(),
                ));
            }
        }
        set_once(&mut self.not_valid_before, time, "not valid before")?;
        Ok(self)
    }

    pub fn not_valid_after(mut self, time: OffsetDateTime) -> Result<Self> {
        if self.not_valid_after.is_none() {
            check_time(time, "not valid after")?;
            if self.not_valid_before.is_some_and(|before| time < before) {
                return Err(X509Error::InvalidInput(
                    "The not valid after date must be after the not valid before date."
                        .to_string(),
                ));
            }
        }
        set_once(&mut self.not_valid_after, time, "not valid after")?;
        Ok(self)
    }

    pub fn add_extension(mut self, extension: Extension) -> Result<Self> {
        push_extension(&mut self.extensions, extension)?;
        Ok(self)
    }

    /// Signs the certificate with `key`.
    ///
    /// # Arguments
    /// * `key` - The issuer's private key.
    /// * `hash` - The digest to sign with.
    ///
    /// # Returns
    /// The certificate as loaded from the produced DER.
    pub fn sign(&self, key: &KeyPair, hash: HashAlgorithm) -> Result<Certificate> {
        let issuer = required(&self.issuer_name, "A certificate requires an issuer name")?;
        let subject = required(&self.subject_name, "A certificate requires a subject name")?;
        let public_key = required(&self.public_key, "A certificate requires a public key")?;
        let serial = required(&self.serial_number, "A certificate requires a serial number")?;
        let not_before = required(
            &self.not_valid_before,
            "A certificate requires a not valid before time",
        )?;
        let not_after = required(
            &self.not_valid_after,
            "A certificate requires a not valid after time",
        )?;

        let (algorithm, extensions) = prepare_signature(key, hash, &self.extensions)?;
        let tbs = TbsCertificate {
            raw_version: CERTIFICATE_VERSION,
            serial_number: biguint_to_serial(serial)?,
            signature: algorithm.clone(),
            issuer: issuer.to_x509()?,
            validity: Validity {
                not_before: offset_to_time(*not_before)?,
                not_after: offset_to_time(*not_after)?,
            },
            subject: subject.to_x509()?,
            subject_public_key_info: public_key.to_spki()?,
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions,
        };
        let der = sign_envelope(key, hash, algorithm, tbs.to_der()?)?;
        log::debug!("signed certificate {serial} for {subject}");
        Certificate::from_der_with_registry(&der, self.registry.clone())
    }
}

/// Builds and signs a PKCS#10 request. The public key comes from the signing key.
#[derive(Debug, Clone, Default)]
pub struct CertificateSigningRequestBuilder {
    subject_name: Option<Name>,
    extensions: Vec<Extension>,
    registry: Arc<ExtensionRegistry>,
}

impl CertificateSigningRequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(mut self, registry: Arc<ExtensionRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn subject_name(mut self, name: Name) -> Result<Self> {
        set_once(&mut self.subject_name, name, "subject name")?;
        Ok(self)
    }

    pub fn add_extension(mut self, extension: Extension) -> Result<Self> {
        push_extension(&mut self.extensions, extension)?;
        Ok(self)
    }

    /// Signs the request with `key`, whose public half becomes the request key.
    pub fn sign(&self, key: &KeyPair, hash: HashAlgorithm) -> Result<CertificateSigningRequest> {
        let subject = required(
            &self.subject_name,
            "A CertificateSigningRequest must have a subject",
        )?;
        let (algorithm, extensions) = prepare_signature(key, hash, &self.extensions)?;

        let mut attributes = Vec::new();
        if !extensions.is_empty() {
            let value = Any::encode_from(&extensions).map_err(encoding_error)?;
            attributes.push(x509_cert::attr::Attribute {
                oid: EXTENSION_REQUEST,
                values: SetOfVec::try_from(vec![value]).map_err(encoding_error)?,
            });
        }
        let info = CertReqInfo {
            version: x509_cert::request::Version::V1,
            subject: subject.to_x509()?,
            public_key: key.public_key().to_spki()?,
            attributes: SetOfVec::try_from(attributes).map_err(encoding_error)?,
        };
        let tbs_bytes = info.to_der().map_err(encoding_error)?;
        let der = sign_envelope(key, hash, algorithm, tbs_bytes)?;
        log::debug!("signed certificate request for {subject}");
        CertificateSigningRequest::from_der_with_registry(&der, self.registry.clone())
    }
}

/// Builds one CRL entry.
#[derive(Debug, Clone, Default)]
pub struct RevokedCertificateBuilder {
    serial_number: Option<BigUint>,
    revocation_date: Option<OffsetDateTime>,
    extensions: Vec<Extension>,
}

impl RevokedCertificateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serial_number(mut self, serial: BigUint) -> Result<Self> {
        if self.serial_number.is_none() {
            check_serial(&serial)?;
        }
        set_once(&mut self.serial_number, serial, "serial number")?;
        Ok(self)
    }

    pub fn revocation_date(mut self, time: OffsetDateTime) -> Result<Self> {
        if self.revocation_date.is_none() {
            check_time(time, "revocation date")?;
        }
        set_once(&mut self.revocation_date, time, "revocation date")?;
        Ok(self)
    }

    pub fn add_extension(mut self, extension: Extension) -> Result<Self> {
        push_extension(&mut self.extensions, extension)?;
        Ok(self)
    }

    /// Finishes the entry. Its extensions must be encodable.
    pub fn build(&self) -> Result<RevokedCertificate> {
        let serial = required(
            &self.serial_number,
            "A revoked certificate must have a serial number",
        )?;
        let date = required(
            &self.revocation_date,
            "A revoked certificate must have a revocation date",
        )?;
        RevokedCertificate::from_parts(
            serial.clone(),
            *date,
            Extensions::new(self.extensions.clone())?,
        )
    }
}

/// Builds and signs a v2 CRL.
#[derive(Debug, Clone, Default)]
pub struct CertificateRevocationListBuilder {
    issuer_name: Option<Name>,
    last_update: Option<OffsetDateTime>,
    next_update: Option<OffsetDateTime>,
    revoked: Vec<RevokedCertificate>,
    extensions: Vec<Extension>,
    registry: Arc<ExtensionRegistry>,
}

impl CertificateRevocationListBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(mut self, registry: Arc<ExtensionRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn issuer_name(mut self, name: Name) -> Result<Self> {
        set_once(&mut self.issuer_name, name, "issuer name")?;
        Ok(self)
    }

    pub fn last_update(mut self, time: OffsetDateTime) -> Result<Self> {
        if self.last_update.is_none() {
            check_time(time, "last update")?;
            if self.next_update.is_some_and(|next| time > next) {
                return Err(X509Error::InvalidInput(
                    "The last update date must be before the next update date.".to_string(),
                ));
            }
        }
        set_once(&mut self.last_update, time, "last update")?;
        Ok(self)
    }

    pub fn next_update(mut self, time: OffsetDateTime) -> Result<Self> {
        if self.next_update.is_none() {
            check_time(time, "next update")?;
            if self.last_update.is_some_and(|last| time < last) {
                return Err(X509Error::InvalidInput(
                    "The next update date must be after the last update date.".to_string(),
                ));
            }
        }
        set_once(&mut self.next_update, time, "next update")?;
        Ok(self)
    }

    /// Adds a CRL-level extension, such as a CRL number.
    pub fn add_extension(mut self, extension: Extension) -> Result<Self> {
        push_extension(&mut self.extensions, extension)?;
        Ok(self)
    }

    pub fn add_revoked_certificate(mut self, revoked: RevokedCertificate) -> Self {
        self.revoked.push(revoked);
        self
    }

    pub fn sign(&self, key: &KeyPair, hash: HashAlgorithm) -> Result<CertificateRevocationList> {
        let issuer = required(&self.issuer_name, "A CRL must have an issuer name")?;
        let last_update = required(&self.last_update, "A CRL must have a last update time")?;
        let next_update = required(&self.next_update, "A CRL must have a next update time")?;
        let (algorithm, extensions) = prepare_signature(key, hash, &self.extensions)?;

        let revoked = self
            .revoked
            .iter()
            .map(RevokedCertificate::to_x509)
            .collect::<Result<Vec<_>>>()?;
        let tbs = TbsCertList {
            version: x509_cert::Version::V2,
            signature: algorithm.clone(),
            issuer: issuer.to_x509()?,
            this_update: offset_to_time(*last_update)?,
            next_update: Some(offset_to_time(*next_update)?),
            revoked_certificates: (!revoked.is_empty()).then_some(revoked),
            crl_extensions: (!extensions.is_empty()).then_some(extensions),
        };
        let tbs_bytes = tbs.to_der().map_err(encoding_error)?;
        let der = sign_envelope(key, hash, algorithm, tbs_bytes)?;
        log::debug!(
            "signed CRL for {issuer} with {} entries",
            self.revoked.len()
        );
        CertificateRevocationList::from_der_with_registry(&der, self.registry.clone())
    }
}
