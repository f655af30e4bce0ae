//! Extensions carried by individual CRL entries.

use core::fmt;

use der::asn1::GeneralizedTime;
use der::{Decode, Encode};
use time::OffsetDateTime;
use x509_cert::ext::pkix::crl::CrlReason as RawCrlReason;

use super::ToAndFromX509Extension;
use super::alt_name::{general_names_from_der, general_names_to_der};
use crate::asn1::{generalized_to_offset, offset_to_generalized};
use crate::error::{Result, X509Error};
use crate::general_name::GeneralName;
use crate::oid::{ObjectIdentifier, extension_oid};

/// Revocation reasons, shared by the CRLReason entry extension and the
/// `reasons` field of a distribution point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReasonFlags {
    Unspecified,
    KeyCompromise,
    CaCompromise,
    AffiliationChanged,
    Superseded,
    CessationOfOperation,
    CertificateHold,
    PrivilegeWithdrawn,
    AaCompromise,
    RemoveFromCrl,
}

impl ReasonFlags {
    pub const ALL: [ReasonFlags; 10] = [
        ReasonFlags::Unspecified,
        ReasonFlags::KeyCompromise,
        ReasonFlags::CaCompromise,
        ReasonFlags::AffiliationChanged,
        ReasonFlags::Superseded,
        ReasonFlags::CessationOfOperation,
        ReasonFlags::CertificateHold,
        ReasonFlags::PrivilegeWithdrawn,
        ReasonFlags::AaCompromise,
        ReasonFlags::RemoveFromCrl,
    ];

    /// The CRLReason ENUMERATED value. 7 is unassigned.
    pub fn code(self) -> u8 {
        RawCrlReason::from(self) as u8
    }

    pub fn from_code(code: u8) -> Result<Self> {
        ReasonFlags::ALL
            .into_iter()
            .find(|reason| reason.code() == code)
            .ok_or_else(|| X509Error::InvalidInput(format!("{code} is not a valid CRLReason")))
    }

    /// Bit position in the distribution point `ReasonFlags` BIT STRING.
    /// `Unspecified` and `RemoveFromCrl` have none.
    pub(crate) fn bit(self) -> Option<usize> {
        match self {
            ReasonFlags::KeyCompromise => Some(1),
            ReasonFlags::CaCompromise => Some(2),
            ReasonFlags::AffiliationChanged => Some(3),
            ReasonFlags::Superseded => Some(4),
            ReasonFlags::CessationOfOperation => Some(5),
            ReasonFlags::CertificateHold => Some(6),
            ReasonFlags::PrivilegeWithdrawn => Some(7),
            ReasonFlags::AaCompromise => Some(8),
            ReasonFlags::Unspecified | ReasonFlags::RemoveFromCrl => None,
        }
    }

    pub(crate) fn from_bit(bit: usize) -> Result<Self> {
        ReasonFlags::ALL
            .into_iter()
            .find(|reason| reason.bit() == Some(bit))
            .ok_or_else(|| X509Error::InvalidInput(format!("bit {bit} is not a reason flag")))
    }

    pub fn name(self) -> &'static str {
        match self {
            ReasonFlags::Unspecified => "unspecified",
            ReasonFlags::KeyCompromise => "keyCompromise",
            ReasonFlags::CaCompromise => "cACompromise",
            ReasonFlags::AffiliationChanged => "affiliationChanged",
            ReasonFlags::Superseded => "superseded",
            ReasonFlags::CessationOfOperation => "cessationOfOperation",
            ReasonFlags::CertificateHold => "certificateHold",
            ReasonFlags::PrivilegeWithdrawn => "privilegeWithdrawn",
            ReasonFlags::AaCompromise => "aACompromise",
            ReasonFlags::RemoveFromCrl => "removeFromCRL",
        }
    }
}

impl fmt::Display for ReasonFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<ReasonFlags> for RawCrlReason {
    fn from(reason: ReasonFlags) -> Self {
        match reason {
            ReasonFlags::Unspecified => RawCrlReason::Unspecified,
            ReasonFlags::KeyCompromise => RawCrlReason::KeyCompromise,
            ReasonFlags::CaCompromise => RawCrlReason::CaCompromise,
            ReasonFlags::AffiliationChanged => RawCrlReason::AffiliationChanged,
            ReasonFlags::Superseded => RawCrlReason::Superseded,
            ReasonFlags::CessationOfOperation => RawCrlReason::CessationOfOperation,
            ReasonFlags::CertificateHold => RawCrlReason::CertificateHold,
            ReasonFlags::RemoveFromCrl => RawCrlReason::RemoveFromCRL,
            ReasonFlags::PrivilegeWithdrawn => RawCrlReason::PrivilegeWithdrawn,
            ReasonFlags::AaCompromise => RawCrlReason::AaCompromise,
        }
    }
}

impl From<RawCrlReason> for ReasonFlags {
    fn from(reason: RawCrlReason) -> Self {
        match reason {
            RawCrlReason::Unspecified => ReasonFlags::Unspecified,
            RawCrlReason::KeyCompromise => ReasonFlags::KeyCompromise,
            RawCrlReason::CaCompromise => ReasonFlags::CaCompromise,
            RawCrlReason::AffiliationChanged => ReasonFlags::AffiliationChanged,
            RawCrlReason::Superseded => ReasonFlags::Superseded,
            RawCrlReason::CessationOfOperation => ReasonFlags::CessationOfOperation,
            RawCrlReason::CertificateHold => ReasonFlags::CertificateHold,
            RawCrlReason::RemoveFromCRL => ReasonFlags::RemoveFromCrl,
            RawCrlReason::PrivilegeWithdrawn => ReasonFlags::PrivilegeWithdrawn,
            RawCrlReason::AaCompromise => ReasonFlags::AaCompromise,
        }
    }
}

/// The CRLReason entry extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CrlReason(pub ReasonFlags);

impl ToAndFromX509Extension for CrlReason {
    const OID: ObjectIdentifier = extension_oid::CRL_REASON;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        Ok(RawCrlReason::from(self.0).to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        RawCrlReason::from_der(extension)
            .map(|raw| CrlReason(raw.into()))
            .map_err(|err| X509Error::InvalidInput(format!("invalid CRLReason: {err}")))
    }
}

/// The Certificate Issuer entry extension of an indirect CRL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CertificateIssuer {
    names: Vec<GeneralName>,
}

impl CertificateIssuer {
    pub fn new(names: Vec<GeneralName>) -> Self {
        Self { names }
    }

    pub fn names(&self) -> &[GeneralName] {
        &self.names
    }
}

impl ToAndFromX509Extension for CertificateIssuer {
    const OID: ObjectIdentifier = extension_oid::CERTIFICATE_ISSUER;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        general_names_to_der(&self.names)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        Ok(Self {
            names: general_names_from_der(extension)?,
        })
    }
}

/// The Invalidity Date entry extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InvalidityDate(pub OffsetDateTime);

impl ToAndFromX509Extension for InvalidityDate {
    const OID: ObjectIdentifier = extension_oid::INVALIDITY_DATE;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        Ok(offset_to_generalized(self.0)?.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        Ok(InvalidityDate(generalized_to_offset(
            &GeneralizedTime::from_der(extension)?,
        )?))
    }
}
