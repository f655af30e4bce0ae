use std::collections::BTreeSet;

use bon::bon;
use der::{Any, Decode, Encode, Tag};
use x509_cert::name::RelativeDistinguishedName;

use super::ToAndFromX509Extension;
use super::crl_entry::ReasonFlags;
use crate::asn1::{
    context_any, context_number, decode_named_bits, encode_any, encode_named_bits, read_tlvs,
    sequence_items, sequence_items_of, wrap_sequence,
};
use crate::error::{Result, X509Error};
use crate::general_name::{GeneralName, decode_general_names, encode_general_names};
use crate::name::Name;
use crate::oid::{ObjectIdentifier, extension_oid};

/// One entry of the CRL Distribution Points extension.
///
/// # Fields
/// * `full_name` - Where the CRL can be fetched.
/// * `relative_name` - A name relative to the CRL issuer, encoded as one RDN.
///   Its attributes are kept in DER SET OF order, not in the order given.
/// * `reasons` - The revocation reasons this CRL covers.
/// * `crl_issuer` - The CRL issuer, when it is not the certificate issuer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DistributionPoint {
    full_name: Option<Vec<GeneralName>>,
    relative_name: Option<Name>,
    reasons: Option<BTreeSet<ReasonFlags>>,
    crl_issuer: Option<Vec<GeneralName>>,
}

#[bon]
impl DistributionPoint {
    #[builder]
    pub fn new(
        full_name: Option<Vec<GeneralName>>,
        relative_name: Option<Name>,
        reasons: Option<BTreeSet<ReasonFlags>>,
        crl_issuer: Option<Vec<GeneralName>>,
    ) -> Result<Self> {
        if full_name.is_some() && relative_name.is_some() {
            return Err(X509Error::InvalidInput(
                "You cannot provide both full_name and relative_name, at least one must be None."
                    .to_string(),
            ));
        }
        if full_name.is_none() && relative_name.is_none() && crl_issuer.is_none() {
            return Err(X509Error::InvalidInput(
                "Either full_name, relative_name or crl_issuer must be provided.".to_string(),
            ));
        }
        if let Some(reasons) = &reasons {
            if reasons.contains(&ReasonFlags::Unspecified)
                || reasons.contains(&ReasonFlags::RemoveFromCrl)
            {
                return Err(X509Error::InvalidInput(
                    "unspecified and remove_from_crl are not valid reasons in a DistributionPoint"
                        .to_string(),
                ));
            }
        }
        let relative_name = relative_name
            .map(|name| Name::from_relative_x509(&name.to_relative_x509()?))
            .transpose()?;
        Ok(Self {
            full_name,
            relative_name,
            reasons,
            crl_issuer,
        })
    }

    pub fn full_name(&self) -> Option<&[GeneralName]> {
        self.full_name.as_deref()
    }

    pub fn relative_name(&self) -> Option<&Name> {
        self.relative_name.as_ref()
    }

    pub fn reasons(&self) -> Option<&BTreeSet<ReasonFlags>> {
        self.reasons.as_ref()
    }

    pub fn crl_issuer(&self) -> Option<&[GeneralName]> {
        self.crl_issuer.as_deref()
    }

    fn to_der(&self) -> Result<Vec<u8>> {
        let mut contents = Vec::new();
        let point_name = match (&self.full_name, &self.relative_name) {
            (Some(names), _) => Some(context_any(0, true, &encode_general_names(names)?)?),
            (None, Some(name)) => {
                let rdn = Any::from_der(&name.to_relative_x509()?.to_der()?)?;
                Some(context_any(1, true, rdn.value())?)
            }
            (None, None) => None,
        };
        if let Some(point_name) = point_name {
            contents.extend(encode_any(&context_any(0, true, &encode_any(&point_name)?)?)?);
        }
        if let Some(reasons) = &self.reasons {
            let bits: Vec<usize> = reasons.iter().filter_map(|reason| reason.bit()).collect();
            contents.extend(encode_any(&context_any(1, false, &encode_named_bits(&bits))?)?);
        }
        if let Some(crl_issuer) = &self.crl_issuer {
            contents.extend(encode_any(&context_any(2, true, &encode_general_names(crl_issuer)?)?)?);
        }
        wrap_sequence(&contents)
    }

    fn from_any(any: &Any) -> Result<Self> {
        let mut full_name = None;
        let mut relative_name = None;
        let mut reasons = None;
        let mut crl_issuer = None;
        for item in sequence_items_of(any)? {
            match context_number(&item) {
                Some((0, true)) => {
                    let mut inner = read_tlvs(item.value())?.into_iter();
                    let (Some(choice), None) = (inner.next(), inner.next()) else {
                        return Err(X509Error::InvalidInput(
                            "distributionPoint must hold one name".to_string(),
                        ));
                    };
                    match context_number(&choice) {
                        Some((0, true)) => full_name = Some(decode_general_names(choice.value())?),
                        Some((1, true)) => {
                            let set = Any::new(Tag::Set, choice.value())?.to_der()?;
                            let rdn = RelativeDistinguishedName::from_der(&set)?;
                            relative_name = Some(Name::from_relative_x509(&rdn)?);
                        }
                        _ => {
                            return Err(X509Error::InvalidInput(
                                "unknown DistributionPointName choice".to_string(),
                            ));
                        }
                    }
                }
                Some((1, false)) => {
                    reasons = Some(
                        decode_named_bits(item.value())?
                            .into_iter()
                            .map(ReasonFlags::from_bit)
                            .collect::<Result<BTreeSet<_>>>()?,
                    );
                }
                Some((2, true)) => crl_issuer = Some(decode_general_names(item.value())?),
                _ => {
                    return Err(X509Error::InvalidInput(
                        "unexpected DistributionPoint field".to_string(),
                    ));
                }
            }
        }
        Self::builder()
            .maybe_full_name(full_name)
            .maybe_relative_name(relative_name)
            .maybe_reasons(reasons)
            .maybe_crl_issuer(crl_issuer)
            .build()
    }
}

/// Represents the CRL Distribution Points extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CrlDistributionPoints {
    points: Vec<DistributionPoint>,
}

impl CrlDistributionPoints {
    pub fn new(points: Vec<DistributionPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[DistributionPoint] {
        &self.points
    }
}

impl ToAndFromX509Extension for CrlDistributionPoints {
    const OID: ObjectIdentifier = extension_oid::CRL_DISTRIBUTION_POINTS;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let mut contents = Vec::new();
        for point in &self.points {
            contents.extend(point.to_der()?);
        }
        wrap_sequence(&contents)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let points = sequence_items(extension)?
            .iter()
            .map(DistributionPoint::from_any)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { points })
    }
}
