//! Hash-algorithm descriptors backed by the `sha1`/`sha2` crates.

use core::fmt;
use core::str::FromStr;

use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

use crate::error::{Result, X509Error};
use crate::oid::{ObjectIdentifier, OidName, signature_oid};

/// A digest algorithm usable for signatures and fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// Lower-case algorithm name, e.g. `sha256`.
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha224 => "sha224",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
        }
    }

    /// Output size in bytes.
    pub fn digest_size(&self) -> usize {
        match self {
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha224 => 28,
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }

    /// Internal block size in bytes.
    pub fn block_size(&self) -> usize {
        match self {
            HashAlgorithm::Sha1 | HashAlgorithm::Sha224 | HashAlgorithm::Sha256 => 64,
            HashAlgorithm::Sha384 | HashAlgorithm::Sha512 => 128,
        }
    }

    /// Computes the digest of `data`.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Sha1 => Sha1::digest(data).to_vec(),
            HashAlgorithm::Sha224 => Sha224::digest(data).to_vec(),
            HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            HashAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
            HashAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    /// The digest used by a signature algorithm.
    ///
    /// # Returns
    /// [`X509Error::UnsupportedAlgorithm`] for signature OIDs with no supported
    /// digest, e.g. `md5WithRSAEncryption` or Ed25519.
    pub fn from_signature_oid(oid: ObjectIdentifier) -> Result<Self> {
        match oid {
            signature_oid::RSA_WITH_SHA1
            | signature_oid::ECDSA_WITH_SHA1
            | signature_oid::DSA_WITH_SHA1 => Ok(HashAlgorithm::Sha1),
            signature_oid::RSA_WITH_SHA224
            | signature_oid::ECDSA_WITH_SHA224
            | signature_oid::DSA_WITH_SHA224 => Ok(HashAlgorithm::Sha224),
            signature_oid::RSA_WITH_SHA256
            | signature_oid::ECDSA_WITH_SHA256
            | signature_oid::DSA_WITH_SHA256 => Ok(HashAlgorithm::Sha256),
            signature_oid::RSA_WITH_SHA384 | signature_oid::ECDSA_WITH_SHA384 => {
                Ok(HashAlgorithm::Sha384)
            }
            signature_oid::RSA_WITH_SHA512 | signature_oid::ECDSA_WITH_SHA512 => {
                Ok(HashAlgorithm::Sha512)
            }
            other => Err(X509Error::UnsupportedAlgorithm(format!(
                "Signature algorithm OID: {} not recognized",
                other.dotted_string()
            ))),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = X509Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "sha1" => Ok(HashAlgorithm::Sha1),
            "sha224" => Ok(HashAlgorithm::Sha224),
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha384" => Ok(HashAlgorithm::Sha384),
            "sha512" => Ok(HashAlgorithm::Sha512),
            _ => Err(X509Error::TypeMismatch(format!(
                "{s} is not a supported hash algorithm"
            ))),
        }
    }
}
