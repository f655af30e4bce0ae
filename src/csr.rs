//! PKCS#10 certificate signing requests.

use core::fmt;
use core::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use der::Decode;
use x509_cert::ext::Extension as RawExtension;
use x509_cert::request::CertReqInfo;

use crate::asn1::SignedEnvelope;
use crate::error::{Result, X509Error};
use crate::extensions::{ExtensionRegistry, Extensions, decode_extensions};
use crate::hash::HashAlgorithm;
use crate::key::PublicKey;
use crate::name::Name;
use crate::oid::EXTENSION_REQUEST;
use crate::pem_utils::{Encoding, encode, pem_to_der};

pub(crate) const PEM_LABEL: &str = "CERTIFICATE REQUEST";

/// Represents a certificate signing request.
///
/// Requested extensions come from the PKCS#9 `extensionRequest` attribute. A
/// request without that attribute has no extensions.
#[derive(Debug, Clone)]
pub struct CertificateSigningRequest {
    der: Vec<u8>,
    envelope: SignedEnvelope,
    info: CertReqInfo,
    subject: Name,
    registry: Arc<ExtensionRegistry>,
    extensions: OnceLock<Result<Extensions>>,
}

impl CertificateSigningRequest {
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

    pub fn from_der_with_registry(der: &[u8], registry: Arc<ExtensionRegistry>) -> Result<Self> {
        let envelope = SignedEnvelope::decode(der)?;
        let info = CertReqInfo::from_der(&envelope.tbs_bytes)?;
        log::trace!(
            "decoded CertificationRequestInfo with {} attributes",
            info.attributes.len()
        );
        Ok(Self {
            der: der.to_vec(),
            subject: Name::from_x509(&info.subject)?,
            envelope,
            info,
            registry,
            extensions: OnceLock::new(),
        })
    }

    pub fn subject(&self) -> &Name {
        &self.subject
    }

    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_spki(&self.info.public_key)
    }

    pub fn signature_hash_algorithm(&self) -> Result<HashAlgorithm> {
        HashAlgorithm::from_signature_oid(self.envelope.algorithm.oid)
    }

    pub fn signature(&self) -> &[u8] {
        &self.envelope.signature
    }

    pub fn tbs_certrequest_bytes(&self) -> &[u8] {
        &self.envelope.tbs_bytes
    }

    /// The requested extensions, decoded on first access.
    pub fn extensions(&self) -> Result<&Extensions> {
        self.extensions
            .get_or_init(|| {
                let raw = self.requested_extensions()?;
                decode_extensions(&raw, &self.registry)
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    fn requested_extensions(&self) -> Result<Vec<RawExtension>> {
        let Some(attribute) = self
            .info
            .attributes
            .iter()
            .find(|attribute| attribute.oid == EXTENSION_REQUEST)
        else {
            return Ok(Vec::new());
        };
        let mut values = attribute.values.iter();
        match (values.next(), values.next()) {
            (Some(value), None) => Ok(value.decode_as::<Vec<RawExtension>>()?),
            _ => Err(X509Error::MalformedInput(
                "extensionRequest must hold exactly one value".to_string(),
            )),
        }
    }

    /// Whether the request is signed by the key it carries.
    pub fn is_signature_valid(&self) -> Result<bool> {
        let key = self.public_key()?;
        Ok(self.envelope.verify(&key).is_ok())
    }

    pub fn public_bytes(&self, encoding: Encoding) -> Vec<u8> {
        encode(&self.der, PEM_LABEL, encoding)
    }

    pub fn to_der(&self) -> &[u8] {
        &self.der
    }
}

impl PartialEq for CertificateSigningRequest {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for CertificateSigningRequest {}

impl Hash for CertificateSigningRequest {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.der.hash(state);
    }
}

impl fmt::Display for CertificateSigningRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<CertificateSigningRequest(subject={})>", self.subject)
    }
}
