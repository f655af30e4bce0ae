//! Object identifiers used across the X.509 object model.
//!
//! OIDs are plain [`const_oid::ObjectIdentifier`] values, so equality and hashing
//! follow the encoded arcs. This module adds the well-known constants, a
//! human-readable name table and a checked string parser.

use core::str::FromStr;

pub use const_oid::ObjectIdentifier;

use crate::error::{Result, X509Error};

/// Name reported for any OID that neither the local table nor the `const-oid`
/// database knows.
pub const UNKNOWN_OID_NAME: &str = "Unknown OID";

/// Attribute types used inside distinguished names.
pub mod name_oid {
    use const_oid::db::{rfc3280, rfc4519};

    use super::ObjectIdentifier;

    pub const COMMON_NAME: ObjectIdentifier = rfc4519::COMMON_NAME;
    pub const COUNTRY_NAME: ObjectIdentifier = rfc4519::COUNTRY_NAME;
    pub const LOCALITY_NAME: ObjectIdentifier = rfc4519::LOCALITY_NAME;
    pub const STATE_OR_PROVINCE_NAME: ObjectIdentifier = rfc4519::ST;
    pub const ORGANIZATION_NAME: ObjectIdentifier = rfc4519::ORGANIZATION_NAME;
    pub const ORGANIZATIONAL_UNIT_NAME: ObjectIdentifier = rfc4519::ORGANIZATIONAL_UNIT_NAME;
    pub const SERIAL_NUMBER: ObjectIdentifier = rfc4519::SERIAL_NUMBER;
    pub const SURNAME: ObjectIdentifier = rfc4519::SURNAME;
    pub const GIVEN_NAME: ObjectIdentifier = rfc4519::GIVEN_NAME;
    pub const TITLE: ObjectIdentifier = rfc4519::TITLE;
    pub const GENERATION_QUALIFIER: ObjectIdentifier = rfc4519::GENERATION_QUALIFIER;
    pub const DN_QUALIFIER: ObjectIdentifier = rfc4519::DN_QUALIFIER;
    pub const PSEUDONYM: ObjectIdentifier = rfc3280::PSEUDONYM;
    pub const DOMAIN_COMPONENT: ObjectIdentifier = rfc4519::DOMAIN_COMPONENT;
    pub const EMAIL_ADDRESS: ObjectIdentifier = rfc3280::EMAIL_ADDRESS;
}

/// Signature algorithm identifiers.
pub mod signature_oid {
    use const_oid::db::{rfc5912, rfc8410};

    use super::ObjectIdentifier;

    pub const RSA_WITH_MD5: ObjectIdentifier = rfc5912::MD_5_WITH_RSA_ENCRYPTION;
    pub const RSA_WITH_SHA1: ObjectIdentifier = rfc5912::SHA_1_WITH_RSA_ENCRYPTION;
    pub const RSA_WITH_SHA224: ObjectIdentifier = rfc5912::SHA_224_WITH_RSA_ENCRYPTION;
    pub const RSA_WITH_SHA256: ObjectIdentifier = rfc5912::SHA_256_WITH_RSA_ENCRYPTION;
    pub const RSA_WITH_SHA384: ObjectIdentifier = rfc5912::SHA_384_WITH_RSA_ENCRYPTION;
    pub const RSA_WITH_SHA512: ObjectIdentifier = rfc5912::SHA_512_WITH_RSA_ENCRYPTION;
    /// Not in the `const-oid` database.
    pub const ECDSA_WITH_SHA1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.4.1");
    pub const ECDSA_WITH_SHA224: ObjectIdentifier = rfc5912::ECDSA_WITH_SHA_224;
    pub const ECDSA_WITH_SHA256: ObjectIdentifier = rfc5912::ECDSA_WITH_SHA_256;
    pub const ECDSA_WITH_SHA384: ObjectIdentifier = rfc5912::ECDSA_WITH_SHA_384;
    pub const ECDSA_WITH_SHA512: ObjectIdentifier = rfc5912::ECDSA_WITH_SHA_512;
    pub const DSA_WITH_SHA1: ObjectIdentifier = rfc5912::DSA_WITH_SHA_1;
    pub const DSA_WITH_SHA224: ObjectIdentifier = rfc5912::DSA_WITH_SHA_224;
    pub const DSA_WITH_SHA256: ObjectIdentifier = rfc5912::DSA_WITH_SHA_256;
    pub const ED25519: ObjectIdentifier = rfc8410::ID_ED_25519;
}

/// Extension identifiers.
pub mod extension_oid {
    use const_oid::db::{rfc5280, rfc6960};

    use super::ObjectIdentifier;

    pub const SUBJECT_DIRECTORY_ATTRIBUTES: ObjectIdentifier =
        rfc5280::ID_CE_SUBJECT_DIRECTORY_ATTRIBUTES;
    pub const SUBJECT_KEY_IDENTIFIER: ObjectIdentifier = rfc5280::ID_CE_SUBJECT_KEY_IDENTIFIER;
    pub const KEY_USAGE: ObjectIdentifier = rfc5280::ID_CE_KEY_USAGE;
    pub const SUBJECT_ALTERNATIVE_NAME: ObjectIdentifier = rfc5280::ID_CE_SUBJECT_ALT_NAME;
    pub const ISSUER_ALTERNATIVE_NAME: ObjectIdentifier = rfc5280::ID_CE_ISSUER_ALT_NAME;
    pub const BASIC_CONSTRAINTS: ObjectIdentifier = rfc5280::ID_CE_BASIC_CONSTRAINTS;
    pub const CRL_NUMBER: ObjectIdentifier = rfc5280::ID_CE_CRL_NUMBER;
    pub const CRL_REASON: ObjectIdentifier = rfc5280::ID_CE_CRL_REASONS;
    pub const INVALIDITY_DATE: ObjectIdentifier = rfc5280::ID_CE_INVALIDITY_DATE;
    pub const CERTIFICATE_ISSUER: ObjectIdentifier = rfc5280::ID_CE_CERTIFICATE_ISSUER;
    pub const NAME_CONSTRAINTS: ObjectIdentifier = rfc5280::ID_CE_NAME_CONSTRAINTS;
    pub const CRL_DISTRIBUTION_POINTS: ObjectIdentifier = rfc5280::ID_CE_CRL_DISTRIBUTION_POINTS;
    pub const CERTIFICATE_POLICIES: ObjectIdentifier = rfc5280::ID_CE_CERTIFICATE_POLICIES;
    pub const POLICY_MAPPINGS: ObjectIdentifier = rfc5280::ID_CE_POLICY_MAPPINGS;
    pub const AUTHORITY_KEY_IDENTIFIER: ObjectIdentifier = rfc5280::ID_CE_AUTHORITY_KEY_IDENTIFIER;
    pub const POLICY_CONSTRAINTS: ObjectIdentifier = rfc5280::ID_CE_POLICY_CONSTRAINTS;
    pub const EXTENDED_KEY_USAGE: ObjectIdentifier = rfc5280::ID_CE_EXT_KEY_USAGE;
    pub const FRESHEST_CRL: ObjectIdentifier = rfc5280::ID_CE_FRESHEST_CRL;
    pub const INHIBIT_ANY_POLICY: ObjectIdentifier = rfc5280::ID_CE_INHIBIT_ANY_POLICY;
    pub const AUTHORITY_INFORMATION_ACCESS: ObjectIdentifier = rfc5280::ID_PE_AUTHORITY_INFO_ACCESS;
    pub const SUBJECT_INFORMATION_ACCESS: ObjectIdentifier = rfc5280::ID_PE_SUBJECT_INFO_ACCESS;
    pub const OCSP_NO_CHECK: ObjectIdentifier = rfc6960::ID_PKIX_OCSP_NOCHECK;
}

/// Extended key usage purposes.
pub mod extended_key_usage_oid {
    use const_oid::db::rfc5280;

    use super::ObjectIdentifier;

    pub const SERVER_AUTH: ObjectIdentifier = rfc5280::ID_KP_SERVER_AUTH;
    pub const CLIENT_AUTH: ObjectIdentifier = rfc5280::ID_KP_CLIENT_AUTH;
    pub const CODE_SIGNING: ObjectIdentifier = rfc5280::ID_KP_CODE_SIGNING;
    pub const EMAIL_PROTECTION: ObjectIdentifier = rfc5280::ID_KP_EMAIL_PROTECTION;
    pub const TIME_STAMPING: ObjectIdentifier = rfc5280::ID_KP_TIME_STAMPING;
    pub const OCSP_SIGNING: ObjectIdentifier = rfc5280::ID_KP_OCSP_SIGNING;
    pub const ANY_EXTENDED_KEY_USAGE: ObjectIdentifier = rfc5280::ANY_EXTENDED_KEY_USAGE;
}

/// Access methods for the authority information access extension.
pub mod access_method_oid {
    use const_oid::db::rfc5280;

    use super::ObjectIdentifier;

    pub const OCSP: ObjectIdentifier = rfc5280::ID_AD_OCSP;
    pub const CA_ISSUERS: ObjectIdentifier = rfc5280::ID_AD_CA_ISSUERS;
}

/// Certificate policy identifiers and qualifiers.
pub mod policy_oid {
    use const_oid::db::rfc5280;

    use super::ObjectIdentifier;

    pub const CPS_QUALIFIER: ObjectIdentifier = rfc5280::ID_QT_CPS;
    pub const CPS_USER_NOTICE: ObjectIdentifier = rfc5280::ID_QT_UNOTICE;
    pub const ANY_POLICY: ObjectIdentifier = rfc5280::ANY_POLICY;
}

/// PKCS#9 attribute carrying requested extensions in a CSR.
pub const EXTENSION_REQUEST: ObjectIdentifier = const_oid::db::rfc5912::ID_EXTENSION_REQ;

/// Short names that differ from the `const-oid` database entry, or that the
/// database lacks. Everything else resolves through [`const_oid::db::DB`].
static NAME_OVERRIDES: &[(ObjectIdentifier, &str)] = &[
    (name_oid::COMMON_NAME, "commonName"),
    (name_oid::COUNTRY_NAME, "countryName"),
    (name_oid::LOCALITY_NAME, "localityName"),
    (name_oid::ORGANIZATION_NAME, "organizationName"),
    (name_oid::ORGANIZATIONAL_UNIT_NAME, "organizationalUnitName"),
    (name_oid::SURNAME, "surname"),
    (name_oid::DOMAIN_COMPONENT, "domainComponent"),
    (name_oid::EMAIL_ADDRESS, "emailAddress"),
    (signature_oid::ECDSA_WITH_SHA1, "ecdsa-with-SHA1"),
    (signature_oid::ED25519, "ed25519"),
    (extended_key_usage_oid::SERVER_AUTH, "serverAuth"),
    (extended_key_usage_oid::CLIENT_AUTH, "clientAuth"),
    (extended_key_usage_oid::CODE_SIGNING, "codeSigning"),
    (extended_key_usage_oid::EMAIL_PROTECTION, "emailProtection"),
    (extended_key_usage_oid::TIME_STAMPING, "timeStamping"),
    (extended_key_usage_oid::OCSP_SIGNING, "OCSPSigning"),
    (extension_oid::SUBJECT_DIRECTORY_ATTRIBUTES, "subjectDirectoryAttributes"),
    (extension_oid::SUBJECT_KEY_IDENTIFIER, "subjectKeyIdentifier"),
    (extension_oid::KEY_USAGE, "keyUsage"),
    (extension_oid::SUBJECT_ALTERNATIVE_NAME, "subjectAltName"),
    (extension_oid::ISSUER_ALTERNATIVE_NAME, "issuerAltName"),
    (extension_oid::BASIC_CONSTRAINTS, "basicConstraints"),
    (extension_oid::CRL_NUMBER, "cRLNumber"),
    (extension_oid::CRL_REASON, "cRLReason"),
    (extension_oid::INVALIDITY_DATE, "invalidityDate"),
    (extension_oid::CERTIFICATE_ISSUER, "certificateIssuer"),
    (extension_oid::NAME_CONSTRAINTS, "nameConstraints"),
    (extension_oid::CRL_DISTRIBUTION_POINTS, "cRLDistributionPoints"),
    (extension_oid::CERTIFICATE_POLICIES, "certificatePolicies"),
    (extension_oid::POLICY_MAPPINGS, "policyMappings"),
    (extension_oid::AUTHORITY_KEY_IDENTIFIER, "authorityKeyIdentifier"),
    (extension_oid::POLICY_CONSTRAINTS, "policyConstraints"),
    (extension_oid::EXTENDED_KEY_USAGE, "extendedKeyUsage"),
    (extension_oid::FRESHEST_CRL, "freshestCRL"),
    (extension_oid::INHIBIT_ANY_POLICY, "inhibitAnyPolicy"),
    (extension_oid::AUTHORITY_INFORMATION_ACCESS, "authorityInfoAccess"),
    (extension_oid::SUBJECT_INFORMATION_ACCESS, "subjectInfoAccess"),
    (extension_oid::OCSP_NO_CHECK, "OCSPNoCheck"),
    (access_method_oid::OCSP, "OCSP"),
    (access_method_oid::CA_ISSUERS, "caIssuers"),
    (EXTENSION_REQUEST, "extensionRequest"),
];

/// Human-readable naming for object identifiers.
pub trait OidName {
    /// Short name, or [`UNKNOWN_OID_NAME`].
    fn name(&self) -> &'static str;

    /// Dotted-decimal rendering, e.g. `2.5.4.3`.
    fn dotted_string(&self) -> String;

    /// `<ObjectIdentifier(oid=2.5.4.3, name=commonName)>`
    fn describe(&self) -> String {
        format!(
            "<ObjectIdentifier(oid={}, name={})>",
            self.dotted_string(),
            self.name()
        )
    }
}

impl OidName for ObjectIdentifier {
    fn name(&self) -> &'static str {
        NAME_OVERRIDES
            .iter()
            .find(|(oid, _)| oid == self)
            .map(|(_, name)| *name)
            .or_else(|| const_oid::db::DB.by_oid(self))
            .unwrap_or(UNKNOWN_OID_NAME)
    }

    fn dotted_string(&self) -> String {
        self.to_string()
    }
}

/// Parses a dotted-decimal OID string.
///
/// # Arguments
/// * `dotted` - The OID in dotted-decimal form.
///
/// # Returns
/// The parsed identifier, or `TypeMismatch` if the string is not a well-formed OID.
pub fn parse_oid(dotted: &str) -> Result<ObjectIdentifier> {
    ObjectIdentifier::from_str(dotted)
        .map_err(|e| X509Error::TypeMismatch(format!("{dotted:?} is not a valid OID: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_oid_name() {
        assert_eq!(name_oid::COMMON_NAME.name(), "commonName");
        assert_eq!(extension_oid::BASIC_CONSTRAINTS.name(), "basicConstraints");
        assert_eq!(
            name_oid::COMMON_NAME.describe(),
            "<ObjectIdentifier(oid=2.5.4.3, name=commonName)>"
        );
    }

    #[test]
    fn test_names_from_the_database() {
        assert_eq!(signature_oid::RSA_WITH_SHA256.name(), "sha256WithRSAEncryption");
        assert_eq!(signature_oid::DSA_WITH_SHA1.name(), "dsa-with-sha1");
        assert_eq!(policy_oid::ANY_POLICY.name(), "anyPolicy");
        assert_eq!(name_oid::STATE_OR_PROVINCE_NAME.name(), "stateOrProvinceName");
        // Not one of ours, but the database knows it.
        assert_eq!(parse_oid("1.2.840.10045.2.1").unwrap().name(), "id-ecPublicKey");
    }

    #[test]
    fn test_overrides_cover_missing_entries() {
        assert_eq!(signature_oid::ECDSA_WITH_SHA1.name(), "ecdsa-with-SHA1");
        assert_eq!(
            signature_oid::ECDSA_WITH_SHA1.dotted_string(),
            "1.2.840.10045.4.1"
        );
        assert_eq!(extension_oid::CRL_REASON.name(), "cRLReason");
        assert_eq!(EXTENSION_REQUEST.dotted_string(), "1.2.840.113549.1.9.14");
    }

    #[test]
    fn test_unknown_oid_name() {
        let oid = parse_oid("1.2.3.4").unwrap();
        assert_eq!(oid.name(), UNKNOWN_OID_NAME);
        assert_eq!(oid.dotted_string(), "1.2.3.4");
    }

    #[test]
    fn test_oid_equality_is_by_arcs() {
        let a = parse_oid("2.5.4.3").unwrap();
        assert_eq!(a, name_oid::COMMON_NAME);
        assert_ne!(a, name_oid::COUNTRY_NAME);
    }

    #[test]
    fn test_malformed_oid_is_type_mismatch() {
        assert!(matches!(parse_oid("abc"), Err(X509Error::TypeMismatch(_))));
        assert!(matches!(parse_oid("1..2"), Err(X509Error::TypeMismatch(_))));
    }
}
