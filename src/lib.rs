//! # x509kit - An X.509 Object Model in Pure Rust
//!
//! x509kit loads, inspects, builds and signs X.509 certificates, certificate
//! revocation lists and certificate signing requests. All cryptography comes from
//! the RustCrypto crates.
//!
//! ## Supported Key Types
//!
//! - **RSA** (PKCS#1 v1.5) with SHA-1 and the SHA-2 family
//! - **ECDSA**: P-256 and P-384
//! - **DSA** with SHA-1, SHA-224 and SHA-256, from PKCS#8 keys
//! - **Ed25519**: public keys can be read and verified. Signing X.509 objects
//!   with Ed25519 is not implemented.
//!
//! ## Loading a Certificate
//!
//! ```rust,no_run
//! use x509kit::cert::Certificate;
//! use x509kit::extensions::BasicConstraints;
//! use x509kit::hash::HashAlgorithm;
//!
//! # fn main() -> Result<(), x509kit::error::X509Error> {
//! let pem = std::fs::read("server.pem").unwrap();
//! let cert = Certificate::from_pem(&pem)?;
//! println!("subject: {}", cert.subject());
//! println!("serial: {}", cert.serial_number());
//! let constraints = cert.extensions()?.get::<BasicConstraints>()?;
//! println!("ca: {}", constraints.ca());
//! let sha256 = cert.fingerprint(HashAlgorithm::Sha256);
//! # let _ = sha256;
//! # Ok(())
//! # }
//! ```
//!
//! ## Building a CRL
//!
//! ```rust,no_run
//! use time::macros::datetime;
//! use x509kit::builder::{CertificateRevocationListBuilder, RevokedCertificateBuilder};
//! use x509kit::extensions::{CrlReason, Extension, ReasonFlags};
//! use x509kit::hash::HashAlgorithm;
//! use x509kit::key::KeyPair;
//! use x509kit::name::{Name, NameAttribute};
//! use x509kit::oid::name_oid;
//!
//! # fn main() -> Result<(), x509kit::error::X509Error> {
//! let ca_key = KeyPair::generate_ecdsa_p384();
//! let revoked = RevokedCertificateBuilder::new()
//!     .serial_number(42u32.into())?
//!     .revocation_date(datetime!(2024-05-01 0:00 UTC))?
//!     .add_extension(Extension::new(CrlReason(ReasonFlags::KeyCompromise), false))?
//!     .build()?;
//! let crl = CertificateRevocationListBuilder::new()
//!     .issuer_name(Name::new(vec![NameAttribute::new(name_oid::COMMON_NAME, "Example CA")]))?
//!     .last_update(datetime!(2024-05-01 0:00 UTC))?
//!     .next_update(datetime!(2024-06-01 0:00 UTC))?
//!     .add_revoked_certificate(revoked)
//!     .sign(&ca_key, HashAlgorithm::Sha384)?;
//! assert_eq!(crl.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`error::X509Error`]:
//!
//! ```rust
//! use x509kit::{cert::Certificate, error::X509Error};
//!
//! match Certificate::from_der(b"not a certificate") {
//!     Ok(_) => println!("loaded"),
//!     Err(X509Error::MalformedInput(msg)) => println!("bad input: {}", msg),
//!     Err(e) => println!("other error: {}", e),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`cert`], [`crl`], [`csr`]: parsed, immutable views
//! - [`builder`]: builders whose `sign()` produces those views
//! - [`extensions`]: typed extension values and the decode rules
//! - [`name`], [`general_name`]: distinguished names and general names
//! - [`key`], [`hash`]: the signing backend
//! - [`oid`]: well-known object identifiers
//! - [`error`]: the error type

mod asn1;
pub mod builder;
pub mod cert;
pub mod crl;
pub mod csr;
pub mod error;
pub mod extensions;
pub mod general_name;
pub mod hash;
pub mod key;
pub mod name;
pub mod oid;
pub mod pem_utils;
mod tbs_certificate;
