//! Typed X.509 extensions and the decoder that turns raw `Extension` entries
//! into them.
//!
//! Every built-in kind implements [`ToAndFromX509Extension`] and is one variant
//! of [`ExtensionValue`]. Unknown OIDs are handled by [`decode_extensions`]:
//! critical ones are rejected, non-critical ones are kept as
//! [`UnrecognizedExtension`]. Consumers who need their own typed values register
//! a [`CustomExtensionDecoder`] in an [`ExtensionRegistry`].

mod access;
mod alt_name;
mod basic;
mod crl_entry;
mod distribution_points;
mod key_id;
mod policies;

use core::any::Any as StdAny;
use core::fmt;
use std::collections::HashSet;
use std::sync::Arc;

use bon::Builder;
use der::asn1::OctetString;

pub use access::{AccessDescription, AuthorityInformationAccess};
pub use alt_name::{IssuerAlternativeName, SubjectAlternativeName};
pub use basic::{BasicConstraints, ExtendedKeyUsage, InhibitAnyPolicy, KeyUsage, OcspNoCheck};
pub use crl_entry::{CertificateIssuer, CrlReason, InvalidityDate, ReasonFlags};
pub use distribution_points::{CrlDistributionPoints, DistributionPoint};
pub use key_id::{AuthorityKeyIdentifier, SubjectKeyIdentifier};
pub use policies::{
    CertificatePolicies, NoticeReference, PolicyInformation, PolicyQualifier, UserNotice,
};

use crate::error::{Result, X509Error};
use crate::general_name::{GeneralName, first_unsupported};
use crate::oid::{ObjectIdentifier, OidName};

/// Trait for converting to and from X.509 extension values.
///
/// The value bytes are the DER inside the `extnValue` OCTET STRING.
pub trait ToAndFromX509Extension {
    /// The Object Identifier (OID) for the extension.
    const OID: ObjectIdentifier;

    /// Encodes the extension into a DER-encoded byte vector.
    fn to_x509_extension_value(&self) -> Result<Vec<u8>>;

    /// Decodes the extension from a DER-encoded byte slice.
    fn from_x509_extension_value(extension: &[u8]) -> Result<Self>
    where
        Self: Sized;
}

/// A built-in extension type that can be pulled back out of an [`ExtensionValue`].
pub trait BuiltinExtension: ToAndFromX509Extension + Into<ExtensionValue> {
    fn from_value(value: &ExtensionValue) -> Option<&Self>;
}

/// A consumer-defined extension value.
pub trait CustomExtension: fmt::Debug + Send + Sync {
    fn oid(&self) -> ObjectIdentifier;

    /// DER of the extension value. Types that can only be read return
    /// [`X509Error::NotImplemented`], which makes builders refuse them.
    fn to_der(&self) -> Result<Vec<u8>> {
        Err(X509Error::NotImplemented(format!(
            "{} cannot be encoded",
            self.oid().describe()
        )))
    }

    /// Allows downcasting to the concrete type.
    fn as_any(&self) -> &dyn StdAny;
}

/// Decodes one custom OID. Registered in an [`ExtensionRegistry`].
pub trait CustomExtensionDecoder: fmt::Debug + Send + Sync {
    fn oid(&self) -> ObjectIdentifier;

    fn decode(&self, value: &[u8]) -> Result<Arc<dyn CustomExtension>>;
}

/// The set of custom decoders consulted for OIDs with no built-in type.
///
/// ```
/// use x509kit::extensions::ExtensionRegistry;
/// let registry = ExtensionRegistry::builder().build();
/// assert!(registry.decoders().is_empty());
/// ```
#[derive(Debug, Clone, Default, Builder)]
pub struct ExtensionRegistry {
    #[builder(default)]
    decoders: Vec<Arc<dyn CustomExtensionDecoder>>,
}

impl ExtensionRegistry {
    pub fn decoders(&self) -> &[Arc<dyn CustomExtensionDecoder>] {
        &self.decoders
    }

    fn decoder_for(&self, oid: ObjectIdentifier) -> Option<&Arc<dyn CustomExtensionDecoder>> {
        self.decoders.iter().find(|decoder| decoder.oid() == oid)
    }
}

/// A non-critical extension of a type this crate does not model.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnrecognizedExtension {
    oid: ObjectIdentifier,
    value: Vec<u8>,
}

impl UnrecognizedExtension {
    pub fn new(oid: ObjectIdentifier, value: Vec<u8>) -> Self {
        Self { oid, value }
    }

    pub fn oid(&self) -> ObjectIdentifier {
        self.oid
    }

    /// The raw `extnValue` contents.
    pub fn value(&self) -> &[u8] {
        &self.value
    }
}

macro_rules! extension_values {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        /// The decoded value of an extension.
        #[derive(Debug, Clone)]
        pub enum ExtensionValue {
            $($variant($ty),)*
            Unrecognized(UnrecognizedExtension),
            Custom(Arc<dyn CustomExtension>),
        }

        impl ExtensionValue {
            pub fn oid(&self) -> ObjectIdentifier {
                match self {
                    $(ExtensionValue::$variant(_) => <$ty>::OID,)*
                    ExtensionValue::Unrecognized(value) => value.oid(),
                    ExtensionValue::Custom(value) => value.oid(),
                }
            }

            /// DER of the value, as carried in `extnValue`.
            pub fn to_der(&self) -> Result<Vec<u8>> {
                match self {
                    $(ExtensionValue::$variant(value) => value.to_x509_extension_value(),)*
                    ExtensionValue::Unrecognized(value) => Ok(value.value().to_vec()),
                    ExtensionValue::Custom(value) => value.to_der(),
                }
            }

            fn decode_builtin(oid: ObjectIdentifier, value: &[u8]) -> Option<Result<Self>> {
                $(
                    if oid == <$ty>::OID {
                        return Some(
                            <$ty>::from_x509_extension_value(value).map(ExtensionValue::$variant),
                        );
                    }
                )*
                None
            }
        }

        /// `Custom` values compare by OID and encoded bytes. A custom value that
        /// cannot be encoded is only equal to clones sharing its `Arc`.
        impl PartialEq for ExtensionValue {
            fn eq(&self, other: &Self) -> bool {
                match (self, other) {
                    $((ExtensionValue::$variant(a), ExtensionValue::$variant(b)) => a == b,)*
                    (ExtensionValue::Unrecognized(a), ExtensionValue::Unrecognized(b)) => a == b,
                    (ExtensionValue::Custom(a), ExtensionValue::Custom(b)) => {
                        match (a.to_der(), b.to_der()) {
                            (Ok(x), Ok(y)) => a.oid() == b.oid() && x == y,
                            _ => Arc::ptr_eq(a, b),
                        }
                    }
                    _ => false,
                }
            }
        }

        $(
            impl From<$ty> for ExtensionValue {
                fn from(value: $ty) -> Self {
                    ExtensionValue::$variant(value)
                }
            }

            impl BuiltinExtension for $ty {
                fn from_value(value: &ExtensionValue) -> Option<&Self> {
                    match value {
                        ExtensionValue::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }
            }
        )*
    };
}

extension_values! {
    BasicConstraints(BasicConstraints),
    KeyUsage(KeyUsage),
    SubjectAlternativeName(SubjectAlternativeName),
    IssuerAlternativeName(IssuerAlternativeName),
    CrlDistributionPoints(CrlDistributionPoints),
    CertificatePolicies(CertificatePolicies),
    AuthorityKeyIdentifier(AuthorityKeyIdentifier),
    SubjectKeyIdentifier(SubjectKeyIdentifier),
    ExtendedKeyUsage(ExtendedKeyUsage),
    InhibitAnyPolicy(InhibitAnyPolicy),
    AuthorityInformationAccess(AuthorityInformationAccess),
    OcspNoCheck(OcspNoCheck),
    CrlReason(CrlReason),
    CertificateIssuer(CertificateIssuer),
    InvalidityDate(InvalidityDate),
}

impl Eq for ExtensionValue {}

impl From<UnrecognizedExtension> for ExtensionValue {
    fn from(value: UnrecognizedExtension) -> Self {
        ExtensionValue::Unrecognized(value)
    }
}

impl From<Arc<dyn CustomExtension>> for ExtensionValue {
    fn from(value: Arc<dyn CustomExtension>) -> Self {
        ExtensionValue::Custom(value)
    }
}

impl ExtensionValue {
    /// Every general name held by the value, in encoding order.
    fn general_names(&self) -> Vec<&GeneralName> {
        match self {
            ExtensionValue::SubjectAlternativeName(san) => san.names().iter().collect(),
            ExtensionValue::IssuerAlternativeName(ian) => ian.names().iter().collect(),
            ExtensionValue::CertificateIssuer(issuer) => issuer.names().iter().collect(),
            ExtensionValue::AuthorityKeyIdentifier(aki) => aki
                .authority_cert_issuer()
                .map(|names| names.iter().collect())
                .unwrap_or_default(),
            ExtensionValue::AuthorityInformationAccess(aia) => aia
                .descriptions()
                .iter()
                .map(|description| description.access_location())
                .collect(),
            ExtensionValue::CrlDistributionPoints(points) => points
                .points()
                .iter()
                .flat_map(|point| {
                    point
                        .full_name()
                        .into_iter()
                        .flatten()
                        .chain(point.crl_issuer().into_iter().flatten())
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// One extension: a typed value plus its criticality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    critical: bool,
    value: ExtensionValue,
}

impl Extension {
    pub fn new(value: impl Into<ExtensionValue>, critical: bool) -> Self {
        Self {
            critical,
            value: value.into(),
        }
    }

    pub fn oid(&self) -> ObjectIdentifier {
        self.value.oid()
    }

    pub fn critical(&self) -> bool {
        self.critical
    }

    pub fn value(&self) -> &ExtensionValue {
        &self.value
    }

    pub(crate) fn to_x509(&self) -> Result<x509_cert::ext::Extension> {
        let value = self.value.to_der()?;
        Ok(x509_cert::ext::Extension {
            extn_id: self.oid(),
            critical: self.critical,
            extn_value: OctetString::new(value)?,
        })
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Extension(oid={}, critical={}, value={:?})>",
            self.oid().describe(),
            self.critical,
            self.value
        )
    }
}

/// An ordered collection of extensions with distinct OIDs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Extensions(Vec<Extension>);

impl Extensions {
    /// Collects `extensions`, rejecting a repeated OID.
    pub fn new(extensions: Vec<Extension>) -> Result<Self> {
        let mut seen = HashSet::new();
        for extension in &extensions {
            if !seen.insert(extension.oid()) {
                return Err(X509Error::DuplicateExtension(extension.oid()));
            }
        }
        Ok(Self(extensions))
    }

    /// Looks up an extension by OID.
    ///
    /// # Returns
    /// The extension, or [`X509Error::ExtensionNotFound`] when absent.
    pub fn get_extension_for_oid(&self, oid: ObjectIdentifier) -> Result<&Extension> {
        self.0
            .iter()
            .find(|extension| extension.oid() == oid)
            .ok_or(X509Error::ExtensionNotFound(oid))
    }

    /// Looks up a built-in extension by type.
    pub fn get<T: BuiltinExtension>(&self) -> Result<&T> {
        let extension = self.get_extension_for_oid(T::OID)?;
        T::from_value(extension.value()).ok_or(X509Error::ExtensionNotFound(T::OID))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Extension> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn to_x509(&self) -> Result<Vec<x509_cert::ext::Extension>> {
        self.0.iter().map(Extension::to_x509).collect()
    }
}

impl<'a> IntoIterator for &'a Extensions {
    type Item = &'a Extension;
    type IntoIter = std::slice::Iter<'a, Extension>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Turns raw extensions into typed ones, in encounter order.
///
/// A repeated OID is [`X509Error::DuplicateExtension`]. A known OID with a bad
/// payload is [`X509Error::InvalidInput`]. An unknown critical OID is
/// [`X509Error::UnsupportedExtension`]. An unknown non-critical OID is kept as
/// [`ExtensionValue::Unrecognized`].
pub(crate) fn decode_extensions(
    raw: &[x509_cert::ext::Extension],
    registry: &ExtensionRegistry,
) -> Result<Extensions> {
    let mut seen = HashSet::new();
    let mut extensions = Vec::with_capacity(raw.len());
    for entry in raw {
        let oid = entry.extn_id;
        if !seen.insert(oid) {
            return Err(X509Error::DuplicateExtension(oid));
        }
        let bytes = entry.extn_value.as_bytes();
        log::trace!("decoding extension {}", oid.describe());

        let decoded = match ExtensionValue::decode_builtin(oid, bytes) {
            Some(result) => Some(result),
            None => registry
                .decoder_for(oid)
                .map(|decoder| decoder.decode(bytes).map(ExtensionValue::Custom)),
        };
        let value = match decoded {
            Some(result) => result.map_err(|e| match e {
                X509Error::MalformedInput(message) => X509Error::InvalidInput(format!(
                    "malformed {} extension: {message}",
                    oid.name()
                )),
                other => other,
            })?,
            None if entry.critical => return Err(X509Error::UnsupportedExtension(oid)),
            None => {
                log::debug!(
                    "keeping unrecognized non-critical extension {}",
                    oid.dotted_string()
                );
                ExtensionValue::Unrecognized(UnrecognizedExtension::new(oid, bytes.to_vec()))
            }
        };

        if entry.critical {
            if let Some(tag) = first_unsupported(value.general_names()) {
                return Err(X509Error::UnsupportedGeneralNameType(tag));
            }
        }
        extensions.push(Extension {
            critical: entry.critical,
            value,
        });
    }
    Ok(Extensions(extensions))
}
