//! Shared DER helpers: timestamps, serial numbers and the signed envelope that
//! wraps every certificate, CRL and CSR.

use std::time::Duration;

use der::asn1::{BitString, GeneralizedTime, Ia5String, UtcTime};
use der::{Any, DateTime, Decode, Encode, Reader, SliceReader, Tag, TagNumber, Tagged};
use num_bigint::BigUint;
use spki::AlgorithmIdentifierOwned;
use time::OffsetDateTime;
use x509_cert::serial_number::SerialNumber;
use x509_cert::time::Time;

use crate::error::{Result, X509Error};
use crate::hash::HashAlgorithm;
use crate::key::PublicKey;

/// First year that must be written as `GeneralizedTime` (RFC 5280 §4.1.2.5).
const GENERALIZED_TIME_FROM_YEAR: u16 = 2050;

/// Serial numbers must stay below `2^159` so they fit in 20 signed octets.
pub(crate) const MAX_SERIAL_BITS: u64 = 159;

/// The outer `SEQUENCE { tbs, signatureAlgorithm, signature }` shared by
/// certificates, CRLs and CSRs.
#[derive(Debug, Clone)]
pub(crate) struct SignedEnvelope {
    /// Exact bytes of the to-be-signed structure, tag and length included.
    pub tbs_bytes: Vec<u8>,
    pub algorithm: AlgorithmIdentifierOwned,
    pub signature: Vec<u8>,
}

impl SignedEnvelope {
    /// Splits `der` into its three parts without re-encoding the TBS.
    pub fn decode(der: &[u8]) -> Result<Self> {
        let mut reader = SliceReader::new(der)?;
        let envelope = reader.sequence(|r| {
            let tbs_bytes = r.tlv_bytes()?.to_vec();
            let algorithm = AlgorithmIdentifierOwned::decode(r)?;
            let signature = BitString::decode(r)?;
            Ok(SignedEnvelope {
                tbs_bytes,
                algorithm,
                signature: signature.raw_bytes().to_vec(),
            })
        })?;
        Ok(reader.finish(envelope)?)
    }

    /// Reassembles the envelope into DER.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let signature = BitString::from_bytes(&self.signature)?;
        let mut body = self.tbs_bytes.clone();
        self.algorithm.encode_to_vec(&mut body)?;
        signature.encode_to_vec(&mut body)?;
        wrap_sequence(&body)
    }

    /// Checks the signature over the TBS bytes with `key`.
    pub fn verify(&self, key: &PublicKey) -> Result<()> {
        let hash = match key {
            PublicKey::Ed25519(_) => None,
            _ => Some(HashAlgorithm::from_signature_oid(self.algorithm.oid)?),
        };
        key.verify(&self.signature, &self.tbs_bytes, hash)
    }
}

/// Wraps already-encoded contents in a SEQUENCE header.
pub(crate) fn wrap_sequence(contents: &[u8]) -> Result<Vec<u8>> {
    encode_any(&Any::new(Tag::Sequence, contents)?)
}

/// Splits a run of concatenated TLVs, e.g. the body of a SEQUENCE.
pub(crate) fn read_tlvs(contents: &[u8]) -> Result<Vec<Any>> {
    let mut reader = SliceReader::new(contents)?;
    let mut items = Vec::new();
    while !reader.is_finished() {
        items.push(Any::decode(&mut reader)?);
    }
    Ok(items)
}

/// Builds a context-specific `[number]` TLV around `contents`.
pub(crate) fn context_any(number: u8, constructed: bool, contents: &[u8]) -> Result<Any> {
    if number > 30 {
        return Err(X509Error::EncodingError(format!(
            "context tag [{number}] needs a long-form tag"
        )));
    }
    Ok(Any::new(
        Tag::ContextSpecific {
            constructed,
            number: TagNumber::new(number),
        },
        contents,
    )?)
}

/// Returns the `[n]` number if `any` carries a context-specific tag.
pub(crate) fn context_number(any: &Any) -> Option<(u8, bool)> {
    match any.tag() {
        Tag::ContextSpecific {
            constructed,
            number,
        } => Some((number.value(), constructed)),
        _ => None,
    }
}

pub(crate) fn encode_any(any: &Any) -> Result<Vec<u8>> {
    any.to_der()
        .map_err(|e| X509Error::EncodingError(e.to_string()))
}

/// Parses `der` as one SEQUENCE and returns its elements.
pub(crate) fn sequence_items(der: &[u8]) -> Result<Vec<Any>> {
    let any = Any::from_der(der)?;
    sequence_items_of(&any)
}

/// Returns the elements of an already decoded SEQUENCE.
pub(crate) fn sequence_items_of(any: &Any) -> Result<Vec<Any>> {
    if any.tag() != Tag::Sequence {
        return Err(X509Error::MalformedInput(format!(
            "expected a SEQUENCE, found {}",
            any.tag()
        )));
    }
    read_tlvs(any.value())
}

/// Minimal two's complement body of a non-negative INTEGER.
pub(crate) fn uint_body(value: &BigUint) -> Vec<u8> {
    let mut bytes = value.to_bytes_be();
    if bytes.first().is_some_and(|b| b & 0x80 != 0) {
        bytes.insert(0, 0x00);
    }
    bytes
}

/// Encodes the positions in `bits` as BIT STRING content octets with
/// trailing zero bits removed.
pub(crate) fn encode_named_bits(bits: &[usize]) -> Vec<u8> {
    let Some(&highest) = bits.iter().max() else {
        return vec![0x00];
    };
    let mut bytes = vec![0u8; highest / 8 + 1];
    for &bit in bits {
        bytes[bit / 8] |= 0x80 >> (bit % 8);
    }
    let mut contents = vec![(7 - highest % 8) as u8];
    contents.extend(bytes);
    contents
}

/// Reads BIT STRING content octets into the positions of the set bits.
pub(crate) fn decode_named_bits(contents: &[u8]) -> Result<Vec<usize>> {
    let Some((&unused, bytes)) = contents.split_first() else {
        return Err(X509Error::InvalidInput("empty BIT STRING".to_string()));
    };
    if unused > 7 || (bytes.is_empty() && unused != 0) {
        return Err(X509Error::InvalidInput(
            "invalid BIT STRING padding".to_string(),
        ));
    }
    Ok((0..bytes.len() * 8)
        .filter(|bit| bytes[bit / 8] & (0x80 >> (bit % 8)) != 0)
        .collect())
}

/// Converts a UTC `DateTime` into an `OffsetDateTime`.
pub(crate) fn date_time_to_offset(date_time: DateTime) -> Result<OffsetDateTime> {
    let secs = i64::try_from(date_time.unix_duration().as_secs())
        .map_err(|_| X509Error::MalformedInput("timestamp out of range".to_string()))?;
    OffsetDateTime::from_unix_timestamp(secs)
        .map_err(|e| X509Error::MalformedInput(e.to_string()))
}

/// Converts an `OffsetDateTime` to a UTC `DateTime`, truncating sub-seconds.
///
/// Only dates from 1970 through 9999 are representable.
pub(crate) fn offset_to_date_time(value: OffsetDateTime) -> Result<DateTime> {
    let secs = u64::try_from(value.unix_timestamp()).map_err(|_| {
        X509Error::InvalidInput(format!(
            "{value} is before 1970-01-01 and cannot be encoded"
        ))
    })?;
    DateTime::from_unix_duration(Duration::from_secs(secs))
        .map_err(|e| X509Error::InvalidInput(format!("{value} cannot be encoded: {e}")))
}

pub(crate) fn time_to_offset(time: &Time) -> Result<OffsetDateTime> {
    date_time_to_offset(time.to_date_time())
}

/// Picks `UTCTime` before 2050 and `GeneralizedTime` from then on.
pub(crate) fn offset_to_time(value: OffsetDateTime) -> Result<Time> {
    let date_time = offset_to_date_time(value)?;
    if date_time.year() < GENERALIZED_TIME_FROM_YEAR {
        let utc = UtcTime::from_date_time(date_time)
            .map_err(|e| X509Error::EncodingError(e.to_string()))?;
        Ok(Time::UtcTime(utc))
    } else {
        Ok(Time::GeneralTime(GeneralizedTime::from_date_time(date_time)))
    }
}

pub(crate) fn generalized_to_offset(time: &GeneralizedTime) -> Result<OffsetDateTime> {
    date_time_to_offset(time.to_date_time())
}

pub(crate) fn offset_to_generalized(value: OffsetDateTime) -> Result<GeneralizedTime> {
    Ok(GeneralizedTime::from_date_time(offset_to_date_time(value)?))
}

/// Reads a big-endian two's complement INTEGER body as a non-negative number.
/// The body must be minimally encoded.
pub(crate) fn unsigned_from_be(bytes: &[u8]) -> Result<BigUint> {
    match bytes {
        [] => Err(X509Error::MalformedInput(
            "INTEGER has an empty body".to_string(),
        )),
        [first, ..] if first & 0x80 != 0 => Err(X509Error::MalformedInput(
            "negative integers are not accepted here".to_string(),
        )),
        [0x00, second, ..] if second & 0x80 == 0 => Err(X509Error::MalformedInput(
            "INTEGER is not minimally encoded".to_string(),
        )),
        _ => Ok(BigUint::from_bytes_be(bytes)),
    }
}

pub(crate) fn serial_to_biguint(serial: &SerialNumber) -> Result<BigUint> {
    unsigned_from_be(serial.as_bytes())
}

pub(crate) fn biguint_to_serial(value: &BigUint) -> Result<SerialNumber> {
    SerialNumber::new(&value.to_bytes_be())
        .map_err(|e| X509Error::InvalidInput(format!("serial number {value}: {e}")))
}

/// Validates a serial number supplied to a builder.
pub(crate) fn check_serial(value: &BigUint) -> Result<()> {
    if value.bits() == 0 {
        return Err(X509Error::InvalidInput(
            "The serial number should be positive.".to_string(),
        ));
    }
    if value.bits() > MAX_SERIAL_BITS {
        return Err(X509Error::InvalidInput(
            "The serial number should not be more than 159 bits.".to_string(),
        ));
    }
    Ok(())
}

/// Builds an `IA5String`, rejecting non-ASCII text.
pub(crate) fn ia5(text: &str) -> Result<Ia5String> {
    if !text.is_ascii() {
        return Err(X509Error::InvalidInput(format!(
            "{text:?} contains non-ASCII characters"
        )));
    }
    Ia5String::new(text).map_err(|e| X509Error::InvalidInput(e.to_string()))
}

/// Reads ASCII text from an IA5 value body.
pub(crate) fn ascii_from_bytes(bytes: &[u8]) -> Result<String> {
    if !bytes.is_ascii() {
        return Err(X509Error::InvalidInput(
            "IA5String contains non-ASCII bytes".to_string(),
        ));
    }
    String::from_utf8(bytes.to_vec()).map_err(|e| X509Error::InvalidInput(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_time_choice_switches_at_2050() {
        let before = offset_to_time(datetime!(2049-12-31 23:59:59 UTC)).unwrap();
        assert!(matches!(before, Time::UtcTime(_)));
        let after = offset_to_time(datetime!(2050-01-01 12:01 UTC)).unwrap();
        assert!(matches!(after, Time::GeneralTime(_)));
        assert_eq!(
            time_to_offset(&after).unwrap(),
            datetime!(2050-01-01 12:01 UTC)
        );
    }

    #[test]
    fn test_offsets_are_normalized_to_utc() {
        let local = datetime!(2002-01-01 14:01 +02:00);
        let encoded = offset_to_time(local).unwrap();
        assert_eq!(
            time_to_offset(&encoded).unwrap(),
            datetime!(2002-01-01 12:01 UTC)
        );
    }

    #[test]
    fn test_pre_epoch_dates_are_rejected() {
        assert!(matches!(
            offset_to_time(datetime!(1960-08-10 10:00 UTC)),
            Err(X509Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_serial_limits() {
        check_serial(&(BigUint::from(1u8) << 158)).unwrap();
        assert!(check_serial(&BigUint::from(0u8)).is_err());
        assert!(check_serial(&(BigUint::from(1u8) << 159)).is_err());
        let serial = biguint_to_serial(&BigUint::from(0x80u32)).unwrap();
        assert_eq!(serial_to_biguint(&serial).unwrap(), BigUint::from(0x80u32));
    }

    #[test]
    fn test_unsigned_integer_bodies() {
        assert_eq!(unsigned_from_be(&[0x00]).unwrap(), BigUint::from(0u8));
        assert_eq!(unsigned_from_be(&[0x00, 0x80]).unwrap(), BigUint::from(0x80u8));
        assert_eq!(unsigned_from_be(&[0x01, 0x00]).unwrap(), BigUint::from(0x100u32));
        for body in [&[][..], &[0x00, 0x01], &[0x00, 0x00, 0x80], &[0xff]] {
            assert!(
                matches!(unsigned_from_be(body), Err(X509Error::MalformedInput(_))),
                "{body:02x?} was accepted"
            );
        }
    }

    #[test]
    fn test_named_bits() {
        assert_eq!(encode_named_bits(&[]), vec![0x00]);
        assert_eq!(encode_named_bits(&[1, 8]), vec![0x07, 0x40, 0x80]);
        assert_eq!(decode_named_bits(&[0x07, 0x40, 0x80]).unwrap(), vec![1, 8]);
        assert!(decode_named_bits(&[0x08, 0x00]).is_err());
    }

    #[test]
    fn test_envelope_rejects_trailing_data() {
        let body = [
            0x30, 0x00, 0x30, 0x04, 0x06, 0x02, 0x2a, 0x03, 0x03, 0x01, 0x00,
        ];
        let mut der = wrap_sequence(&body).unwrap();
        SignedEnvelope::decode(&der).unwrap();
        der.push(0x00);
        assert!(matches!(
            SignedEnvelope::decode(&der),
            Err(X509Error::MalformedInput(_))
        ));
    }
}
