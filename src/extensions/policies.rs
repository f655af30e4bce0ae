use bon::Builder;
use der::asn1::{Ia5String, Uint};
use der::{Any, Decode, Encode, Sequence};
use x509_cert::ext::pkix::certpolicy::{
    CertificatePolicies as RawCertificatePolicies, DisplayText,
    NoticeReference as RawNoticeReference, PolicyInformation as RawPolicyInformation,
    PolicyQualifierInfo,
};

use super::ToAndFromX509Extension;
use crate::asn1::ia5;
use crate::error::{Result, X509Error};
use crate::name::decode_directory_string;
use crate::oid::{ObjectIdentifier, extension_oid, policy_oid};

/// Represents the Certificate Policies extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CertificatePolicies {
    policies: Vec<PolicyInformation>,
}

impl CertificatePolicies {
    pub fn new(policies: Vec<PolicyInformation>) -> Self {
        Self { policies }
    }

    pub fn policies(&self) -> &[PolicyInformation] {
        &self.policies
    }
}

/// One policy, with optional qualifiers.
///
/// ```
/// use x509kit::extensions::{PolicyInformation, PolicyQualifier};
/// use x509kit::oid::ObjectIdentifier;
/// let policy = PolicyInformation::builder()
///     .policy_identifier(ObjectIdentifier::new_unwrap("2.23.140.1.2.1"))
///     .policy_qualifiers(vec![PolicyQualifier::Cps("http://example.com/cps".to_string())])
///     .build();
/// assert_eq!(policy.policy_qualifiers.unwrap().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Builder)]
pub struct PolicyInformation {
    pub policy_identifier: ObjectIdentifier,
    pub policy_qualifiers: Option<Vec<PolicyQualifier>>,
}

/// A policy qualifier: a CPS pointer or a user notice.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PolicyQualifier {
    Cps(String),
    UserNotice(UserNotice),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Builder)]
pub struct UserNotice {
    pub notice_reference: Option<NoticeReference>,
    pub explicit_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NoticeReference {
    pub organization: String,
    pub notice_numbers: Vec<u64>,
}

/// `x509-cert` 0.2 types `noticeRef` as a GeneralizedTime, so the notice is
/// decoded here. `explicitText` stays an `Any` to admit VisibleString and
/// BMPString.
#[derive(Sequence)]
struct RawUserNotice {
    notice_ref: Option<RawNoticeReference>,
    explicit_text: Option<Any>,
}

fn display_text_to_string(text: DisplayText) -> String {
    match text {
        DisplayText::Ia5String(text) => text.to_string(),
        DisplayText::Utf8String(text) => text,
    }
}

impl NoticeReference {
    fn to_raw(&self) -> Result<RawNoticeReference> {
        let notice_numbers = self
            .notice_numbers
            .iter()
            .map(|number| Uint::new(&number.to_be_bytes()))
            .collect::<der::Result<Vec<_>>>()?;
        Ok(RawNoticeReference {
            organization: DisplayText::Utf8String(self.organization.clone()),
            notice_numbers: Some(notice_numbers),
        })
    }

    fn from_raw(raw: RawNoticeReference) -> Result<Self> {
        let notice_numbers = raw
            .notice_numbers
            .ok_or_else(|| {
                X509Error::InvalidInput("NoticeReference must have noticeNumbers".to_string())
            })?
            .iter()
            .map(|number| match number.as_bytes() {
                bytes if bytes.len() <= 8 => {
                    Ok(bytes.iter().fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte)))
                }
                _ => Err(X509Error::InvalidInput(
                    "notice number does not fit in 64 bits".to_string(),
                )),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            organization: display_text_to_string(raw.organization),
            notice_numbers,
        })
    }
}

impl UserNotice {
    fn to_any(&self) -> Result<Any> {
        let raw = RawUserNotice {
            notice_ref: self
                .notice_reference
                .as_ref()
                .map(NoticeReference::to_raw)
                .transpose()?,
            explicit_text: self
                .explicit_text
                .as_ref()
                .map(|text| Any::encode_from(&DisplayText::Utf8String(text.clone())))
                .transpose()?,
        };
        Ok(Any::encode_from(&raw)?)
    }

    fn from_any(any: &Any) -> Result<Self> {
        let raw = any.decode_as::<RawUserNotice>()?;
        Ok(Self {
            notice_reference: raw.notice_ref.map(NoticeReference::from_raw).transpose()?,
            explicit_text: raw
                .explicit_text
                .as_ref()
                .map(decode_directory_string)
                .transpose()?,
        })
    }
}

impl PolicyQualifier {
    fn to_raw(&self) -> Result<PolicyQualifierInfo> {
        let (policy_qualifier_id, qualifier) = match self {
            PolicyQualifier::Cps(uri) => (policy_oid::CPS_QUALIFIER, Any::encode_from(&ia5(uri)?)?),
            PolicyQualifier::UserNotice(notice) => (policy_oid::CPS_USER_NOTICE, notice.to_any()?),
        };
        Ok(PolicyQualifierInfo {
            policy_qualifier_id,
            qualifier: Some(qualifier),
        })
    }

    fn from_raw(raw: &PolicyQualifierInfo) -> Result<Self> {
        let Some(qualifier) = &raw.qualifier else {
            return Err(X509Error::InvalidInput(format!(
                "policy qualifier {} has no value",
                raw.policy_qualifier_id
            )));
        };
        match raw.policy_qualifier_id {
            policy_oid::CPS_QUALIFIER => Ok(PolicyQualifier::Cps(
                qualifier.decode_as::<Ia5String>()?.to_string(),
            )),
            policy_oid::CPS_USER_NOTICE => {
                Ok(PolicyQualifier::UserNotice(UserNotice::from_any(qualifier)?))
            }
            other => Err(X509Error::InvalidInput(format!(
                "unsupported policy qualifier {other}"
            ))),
        }
    }
}

impl PolicyInformation {
    fn to_raw(&self) -> Result<RawPolicyInformation> {
        Ok(RawPolicyInformation {
            policy_identifier: self.policy_identifier,
            policy_qualifiers: self
                .policy_qualifiers
                .as_ref()
                .map(|qualifiers| {
                    qualifiers
                        .iter()
                        .map(PolicyQualifier::to_raw)
                        .collect::<Result<Vec<_>>>()
                })
                .transpose()?,
        })
    }

    fn from_raw(raw: &RawPolicyInformation) -> Result<Self> {
        Ok(Self {
            policy_identifier: raw.policy_identifier,
            policy_qualifiers: raw
                .policy_qualifiers
                .as_ref()
                .map(|qualifiers| {
                    qualifiers
                        .iter()
                        .map(PolicyQualifier::from_raw)
                        .collect::<Result<Vec<_>>>()
                })
                .transpose()?,
        })
    }
}

impl ToAndFromX509Extension for CertificatePolicies {
    const OID: ObjectIdentifier = extension_oid::CERTIFICATE_POLICIES;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let raw = RawCertificatePolicies(
            self.policies
                .iter()
                .map(PolicyInformation::to_raw)
                .collect::<Result<Vec<_>>>()?,
        );
        Ok(raw.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let raw = RawCertificatePolicies::from_der(extension)?;
        let policies = raw
            .0
            .iter()
            .map(PolicyInformation::from_raw)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { policies })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policies_round_trip() {
        let policies = CertificatePolicies::new(vec![
            PolicyInformation::builder()
                .policy_identifier(ObjectIdentifier::new_unwrap("2.16.840.1.12345.1.2.3.4.1"))
                .policy_qualifiers(vec![
                    PolicyQualifier::Cps("http://other.com/cps".to_string()),
                    PolicyQualifier::UserNotice(
                        UserNotice::builder()
                            .notice_reference(NoticeReference {
                                organization: "my org".to_string(),
                                notice_numbers: vec![1, 2, 3, 4],
                            })
                            .explicit_text("thing".to_string())
                            .build(),
                    ),
                ])
                .build(),
            PolicyInformation::builder()
                .policy_identifier(policy_oid::ANY_POLICY)
                .build(),
        ]);
        let der = policies.to_x509_extension_value().unwrap();
        assert_eq!(
            CertificatePolicies::from_x509_extension_value(&der).unwrap(),
            policies
        );
    }

    #[test]
    fn test_empty_user_notice() {
        let qualifier = PolicyQualifier::UserNotice(UserNotice::default());
        let der = qualifier.to_raw().unwrap().to_der().unwrap();
        assert_eq!(der[der.len() - 2..], [0x30, 0x00]);
        let raw = PolicyQualifierInfo::from_der(&der).unwrap();
        assert_eq!(PolicyQualifier::from_raw(&raw).unwrap(), qualifier);
    }

    #[test]
    fn test_unknown_qualifier_is_rejected() {
        let raw = PolicyQualifierInfo {
            policy_qualifier_id: ObjectIdentifier::new_unwrap("1.2.3"),
            qualifier: Some(Any::null()),
        };
        assert!(matches!(
            PolicyQualifier::from_raw(&raw),
            Err(X509Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_openssl_policies_with_visible_text() {
        // One policy with a CPS pointer and a notice whose explicitText is a
        // VisibleString, as written by `openssl asn1parse -genconf`.
        let der = [
            0x30, 0x5f, 0x30, 0x5d, 0x06, 0x09, 0x2b, 0x06, 0x01, 0x04, 0x01, 0x83, 0xb2, 0x03,
            0x02, 0x30, 0x50, 0x30, 0x22, 0x06, 0x08, 0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x02,
            0x01, 0x16, 0x16, 0x68, 0x74, 0x74, 0x70, 0x3a, 0x2f, 0x2f, 0x65, 0x78, 0x61, 0x6d,
            0x70, 0x6c, 0x65, 0x2e, 0x63, 0x6f, 0x6d, 0x2f, 0x63, 0x70, 0x73, 0x30, 0x2a, 0x06,
            0x08, 0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x02, 0x02, 0x30, 0x1e, 0x30, 0x0e, 0x16,
            0x03, 0x4f, 0x72, 0x67, 0x30, 0x07, 0x02, 0x01, 0x01, 0x02, 0x02, 0x01, 0x2c, 0x1a,
            0x0c, 0x56, 0x69, 0x73, 0x69, 0x62, 0x6c, 0x65, 0x20, 0x74, 0x65, 0x78, 0x74,
        ];
        let policies = CertificatePolicies::from_x509_extension_value(&der).unwrap();
        let [policy] = policies.policies() else {
            panic!("expected one policy, got {policies:?}");
        };
        assert_eq!(
            policy.policy_identifier,
            ObjectIdentifier::new_unwrap("1.3.6.1.4.1.55555.2")
        );
        assert_eq!(
            policy.policy_qualifiers,
            Some(vec![
                PolicyQualifier::Cps("http://example.com/cps".to_string()),
                PolicyQualifier::UserNotice(
                    UserNotice::builder()
                        .notice_reference(NoticeReference {
                            organization: "Org".to_string(),
                            notice_numbers: vec![1, 300],
                        })
                        .explicit_text("Visible text".to_string())
                        .build()
                ),
            ])
        );
    }

    #[test]
    fn test_cps_must_be_ia5() {
        let raw = PolicyQualifierInfo {
            policy_qualifier_id: policy_oid::CPS_QUALIFIER,
            qualifier: Some(Any::encode_from(&"http://example.com".to_string()).unwrap()),
        };
        assert!(PolicyQualifier::from_raw(&raw).is_err());
    }
}
