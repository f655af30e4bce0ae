//! use x509kit::error::X509Error;

use const_oid::ObjectIdentifier;
use thiserror::Error;

/// Errors raised while loading, inspecting, building or signing X.509 objects.
///
/// Every error is a permanent rejection of the given input. Variants that concern
/// a particular extension carry its OID.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum X509Error {
    /// Bad PEM/DER: wrong structure, truncated data or a mismatched PEM label.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// The signature or hash OID is not one this library knows.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The certificate carries a version integer outside v1..v3.
    #[error("{0} is not a valid X509 version")]
    InvalidVersion(u64),

    /// The same extension OID appears twice in one extensions block.
    #[error("Duplicate {0} extension found")]
    DuplicateExtension(ObjectIdentifier),

    /// The requested extension is absent.
    #[error("No {0} extension was found")]
    ExtensionNotFound(ObjectIdentifier),

    /// A critical extension that this library cannot interpret.
    #[error("Critical extension {0} is not currently supported")]
    UnsupportedExtension(ObjectIdentifier),

    /// A general name of an unsupported kind inside a critical extension.
    #[error("{0} is not a supported general name type")]
    UnsupportedGeneralNameType(u8),

    /// A value of the wrong kind was supplied.
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// A set-once builder field was set a second time.
    #[error("The {0} may only be set once.")]
    AlreadySet(&'static str),

    /// `sign()` was called before a required builder field was populated.
    #[error("Missing required field: {0}")]
    MissingRequiredField(String),

    /// The signing key is too small for the padded digest.
    #[error("{0}")]
    KeyTooSmall(String),

    /// The requested operation is not implemented for this input.
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// The value is well-typed but not acceptable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error during DER/PEM encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// The backend failed to produce or check a signature.
    #[error("Signature error: {0}")]
    SigningError(String),
}

pub type Result<T> = std::result::Result<T, X509Error>;

impl From<der::Error> for X509Error {
    /// Converts a `der::Error` into a `X509Error`.
    fn from(err: der::Error) -> Self {
        X509Error::MalformedInput(err.to_string())
    }
}

impl From<pem::PemError> for X509Error {
    fn from(err: pem::PemError) -> Self {
        X509Error::MalformedInput(err.to_string())
    }
}

impl From<rsa::Error> for X509Error {
    fn from(err: rsa::Error) -> Self {
        X509Error::SigningError(err.to_string())
    }
}

impl From<pkcs8::Error> for X509Error {
    fn from(err: pkcs8::Error) -> Self {
        X509Error::MalformedInput(err.to_string())
    }
}

impl From<pkcs8::spki::Error> for X509Error {
    fn from(err: pkcs8::spki::Error) -> Self {
        X509Error::MalformedInput(err.to_string())
    }
}
