//! The nine `GeneralName` choices of RFC 5280 §4.2.1.6.
//!
//! Names are decoded straight from their context-tagged TLVs so that forms with
//! no typed representation (`x400Address`, `ediPartyName`) survive a round trip
//! as [`GeneralName::Unsupported`].

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use der::asn1::{Ia5StringRef, PrintableStringRef};
use der::{Any, Decode, Encode, Tag, Tagged};
use x509_cert::name::RdnSequence;

use crate::asn1::{ascii_from_bytes, context_any, context_number, encode_any, read_tlvs};
use crate::error::{Result, X509Error};
use crate::name::Name;
use crate::oid::ObjectIdentifier;

const OTHER_NAME: u8 = 0;
const RFC822_NAME: u8 = 1;
const DNS_NAME: u8 = 2;
const X400_ADDRESS: u8 = 3;
const DIRECTORY_NAME: u8 = 4;
const EDI_PARTY_NAME: u8 = 5;
const URI: u8 = 6;
const IP_ADDRESS: u8 = 7;
const REGISTERED_ID: u8 = 8;

/// An `iPAddress` general name: a host address, or an address plus netmask
/// when used in name constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpAddressValue {
    Address(IpAddr),
    Network { address: IpAddr, prefix_len: u8 },
}

impl IpAddressValue {
    fn to_bytes(self) -> Result<Vec<u8>> {
        match self {
            IpAddressValue::Address(IpAddr::V4(a)) => Ok(a.octets().to_vec()),
            IpAddressValue::Address(IpAddr::V6(a)) => Ok(a.octets().to_vec()),
            IpAddressValue::Network {
                address,
                prefix_len,
            } => {
                let mut bytes = match address {
                    IpAddr::V4(a) => a.octets().to_vec(),
                    IpAddr::V6(a) => a.octets().to_vec(),
                };
                let width = bytes.len() * 8;
                if usize::from(prefix_len) > width {
                    return Err(X509Error::InvalidInput(format!(
                        "prefix length {prefix_len} is too long for {address}"
                    )));
                }
                let mask = (0..bytes.len()).map(|i| {
                    let ones = usize::from(prefix_len).saturating_sub(i * 8).min(8);
                    (0xffu16 << (8 - ones)) as u8
                });
                bytes.extend(mask.collect::<Vec<u8>>());
                Ok(bytes)
            }
        }
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        match bytes.len() {
            4 | 16 => Ok(IpAddressValue::Address(ip_from_octets(bytes)?)),
            8 | 32 => {
                let (address, mask) = bytes.split_at(bytes.len() / 2);
                Ok(IpAddressValue::Network {
                    address: ip_from_octets(address)?,
                    prefix_len: prefix_from_mask(mask)?,
                })
            }
            n => Err(X509Error::InvalidInput(format!(
                "{n} octets is not a valid iPAddress length"
            ))),
        }
    }
}

fn ip_from_octets(bytes: &[u8]) -> Result<IpAddr> {
    if let Ok(v4) = <[u8; 4]>::try_from(bytes) {
        return Ok(IpAddr::V4(Ipv4Addr::from(v4)));
    }
    <[u8; 16]>::try_from(bytes)
        .map(|v6| IpAddr::V6(Ipv6Addr::from(v6)))
        .map_err(|_| X509Error::InvalidInput("bad iPAddress length".to_string()))
}

/// Counts the leading one bits of a netmask, rejecting non-contiguous masks.
fn prefix_from_mask(mask: &[u8]) -> Result<u8> {
    let ones: u32 = mask.iter().map(|b| b.count_ones()).sum();
    let leading = mask
        .iter()
        .map(|b| b.leading_ones())
        .take_while(|&n| n == 8)
        .count() as u32
        * 8
        + mask
            .iter()
            .find(|&&b| b != 0xff)
            .map_or(0, |b| b.leading_ones());
    if ones != leading {
        return Err(X509Error::InvalidInput(
            "iPAddress netmask is not contiguous".to_string(),
        ));
    }
    u8::try_from(ones).map_err(|_| X509Error::InvalidInput("netmask too long".to_string()))
}

/// One `GeneralName`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GeneralName {
    /// `value` is one complete DER TLV.
    OtherName {
        type_id: ObjectIdentifier,
        value: Vec<u8>,
    },
    Rfc822Name(String),
    DnsName(String),
    DirectoryName(Name),
    UniformResourceIdentifier(String),
    IpAddress(IpAddressValue),
    RegisteredId(ObjectIdentifier),
    /// A choice with no typed form. `value` is the content octets of the
    /// constructed `[tag]` TLV.
    Unsupported { tag: u8, value: Vec<u8> },
}

impl GeneralName {
    /// Creates an `otherName`, checking that `value` is well-formed DER.
    pub fn other_name(type_id: ObjectIdentifier, value: Vec<u8>) -> Result<Self> {
        validate_der_value(&value)?;
        Ok(GeneralName::OtherName { type_id, value })
    }

    pub fn dns_name(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        crate::asn1::ia5(&name)?;
        Ok(GeneralName::DnsName(name))
    }

    pub fn rfc822_name(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        crate::asn1::ia5(&name)?;
        Ok(GeneralName::Rfc822Name(name))
    }

    pub fn uri(uri: impl Into<String>) -> Result<Self> {
        let uri = uri.into();
        crate::asn1::ia5(&uri)?;
        Ok(GeneralName::UniformResourceIdentifier(uri))
    }

    /// The context tag number this choice is encoded with.
    pub fn tag(&self) -> u8 {
        match self {
            GeneralName::OtherName { .. } => OTHER_NAME,
            GeneralName::Rfc822Name(_) => RFC822_NAME,
            GeneralName::DnsName(_) => DNS_NAME,
            GeneralName::DirectoryName(_) => DIRECTORY_NAME,
            GeneralName::UniformResourceIdentifier(_) => URI,
            GeneralName::IpAddress(_) => IP_ADDRESS,
            GeneralName::RegisteredId(_) => REGISTERED_ID,
            GeneralName::Unsupported { tag, .. } => *tag,
        }
    }

    pub(crate) fn to_any(&self) -> Result<Any> {
        match self {
            GeneralName::OtherName { type_id, value } => {
                validate_der_value(value)?;
                let mut contents = type_id.to_der()?;
                contents.extend(encode_any(&context_any(0, true, value)?)?);
                context_any(OTHER_NAME, true, &contents)
            }
            GeneralName::Rfc822Name(text) => ia5_name(RFC822_NAME, text),
            GeneralName::DnsName(text) => ia5_name(DNS_NAME, text),
            GeneralName::UniformResourceIdentifier(text) => ia5_name(URI, text),
            GeneralName::DirectoryName(name) => context_any(DIRECTORY_NAME, true, &name.to_der()?),
            GeneralName::IpAddress(ip) => context_any(IP_ADDRESS, false, &ip.to_bytes()?),
            GeneralName::RegisteredId(oid) => context_any(REGISTERED_ID, false, oid.as_bytes()),
            GeneralName::Unsupported { tag, value } => context_any(*tag, true, value),
        }
    }

    pub(crate) fn from_any(any: &Any) -> Result<Self> {
        let Some((number, constructed)) = context_number(any) else {
            return Err(X509Error::InvalidInput(format!(
                "{} is not a GeneralName tag",
                any.tag()
            )));
        };
        let body = any.value();
        let expect_constructed = matches!(
            number,
            OTHER_NAME | X400_ADDRESS | DIRECTORY_NAME | EDI_PARTY_NAME
        );
        if number > REGISTERED_ID || constructed != expect_constructed {
            return Err(X509Error::InvalidInput(format!(
                "[{number}] is not a valid GeneralName encoding"
            )));
        }
        let name = match number {
            OTHER_NAME => {
                let mut parts = read_tlvs(body)?.into_iter();
                let (Some(type_id), Some(wrapped), None) = (parts.next(), parts.next(), parts.next())
                else {
                    return Err(X509Error::InvalidInput(
                        "otherName must hold a type-id and one value".to_string(),
                    ));
                };
                if context_number(&wrapped) != Some((0, true)) {
                    return Err(X509Error::InvalidInput(
                        "otherName value must be tagged [0]".to_string(),
                    ));
                }
                let value = wrapped.value().to_vec();
                validate_der_value(&value)?;
                GeneralName::OtherName {
                    type_id: type_id
                        .decode_as()
                        .map_err(|e| X509Error::InvalidInput(e.to_string()))?,
                    value,
                }
            }
            RFC822_NAME => GeneralName::Rfc822Name(ascii_from_bytes(body)?),
            DNS_NAME => GeneralName::DnsName(ascii_from_bytes(body)?),
            URI => GeneralName::UniformResourceIdentifier(ascii_from_bytes(body)?),
            DIRECTORY_NAME => {
                let rdns = RdnSequence::from_der(body)
                    .map_err(|e| X509Error::InvalidInput(e.to_string()))?;
                GeneralName::DirectoryName(Name::from_x509(&rdns)?)
            }
            IP_ADDRESS => GeneralName::IpAddress(IpAddressValue::from_bytes(body)?),
            REGISTERED_ID => GeneralName::RegisteredId(
                ObjectIdentifier::from_bytes(body)
                    .map_err(|e| X509Error::InvalidInput(e.to_string()))?,
            ),
            _ => GeneralName::Unsupported {
                tag: number,
                value: body.to_vec(),
            },
        };
        Ok(name)
    }
}

fn ia5_name(tag: u8, text: &str) -> Result<Any> {
    crate::asn1::ia5(text)?;
    context_any(tag, false, text.as_bytes())
}

/// Decodes the body of a `GeneralNames` SEQUENCE (or its implicitly tagged form).
pub(crate) fn decode_general_names(contents: &[u8]) -> Result<Vec<GeneralName>> {
    read_tlvs(contents)
        .map_err(|e| X509Error::InvalidInput(e.to_string()))?
        .iter()
        .map(GeneralName::from_any)
        .collect()
}

/// Encodes `names` as concatenated TLVs, ready to be wrapped by the caller.
pub(crate) fn encode_general_names(names: &[GeneralName]) -> Result<Vec<u8>> {
    let mut contents = Vec::new();
    for name in names {
        contents.extend(encode_any(&name.to_any()?)?);
    }
    Ok(contents)
}

/// The first unsupported choice in `names`, if any.
pub(crate) fn first_unsupported<'a>(
    names: impl IntoIterator<Item = &'a GeneralName>,
) -> Option<u8> {
    names.into_iter().find_map(|name| match name {
        GeneralName::Unsupported { tag, .. } => Some(*tag),
        _ => None,
    })
}

/// Checks that `bytes` is exactly one syntactically valid DER value.
fn validate_der_value(bytes: &[u8]) -> Result<()> {
    let any = Any::from_der(bytes).map_err(|e| {
        X509Error::InvalidInput(format!("otherName value is not valid DER: {e}"))
    })?;
    validate_any(&any)
}

fn validate_any(any: &Any) -> Result<()> {
    let body = any.value();
    let invalid = |what: &str| X509Error::InvalidInput(format!("invalid {what} in otherName"));
    match any.tag() {
        Tag::Boolean => {
            if body != [0x00] && body != [0xff] {
                return Err(invalid("BOOLEAN"));
            }
        }
        Tag::Integer | Tag::Enumerated => {
            let redundant = body.len() > 1
                && ((body[0] == 0x00 && body[1] & 0x80 == 0)
                    || (body[0] == 0xff && body[1] & 0x80 != 0));
            if body.is_empty() || redundant {
                return Err(invalid("INTEGER"));
            }
        }
        Tag::Null => {
            if !body.is_empty() {
                return Err(invalid("NULL"));
            }
        }
        Tag::ObjectIdentifier => {
            ObjectIdentifier::from_bytes(body).map_err(|_| invalid("OBJECT IDENTIFIER"))?;
        }
        Tag::Utf8String => {
            core::str::from_utf8(body).map_err(|_| invalid("UTF8String"))?;
        }
        Tag::PrintableString => {
            PrintableStringRef::new(body).map_err(|_| invalid("PrintableString"))?;
        }
        Tag::Ia5String => {
            Ia5StringRef::new(body).map_err(|_| invalid("IA5String"))?;
        }
        tag if tag.is_constructed() => {
            for child in read_tlvs(body).map_err(|_| invalid("constructed value"))? {
                validate_any(&child)?;
            }
        }
        _ => {}
    }
    Ok(())
}
