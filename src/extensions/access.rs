use der::Encode;

use super::ToAndFromX509Extension;
use crate::asn1::{encode_any, sequence_items, sequence_items_of, wrap_sequence};
use crate::error::{Result, X509Error};
use crate::general_name::GeneralName;
use crate::oid::{ObjectIdentifier, extension_oid};

/// Where and how to reach a service of the issuer.
///
/// # Fields
/// * `access_method` - e.g. [`crate::oid::access_method_oid::OCSP`].
/// * `access_location` - The service location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccessDescription {
    access_method: ObjectIdentifier,
    access_location: GeneralName,
}

impl AccessDescription {
    pub fn new(access_method: ObjectIdentifier, access_location: GeneralName) -> Self {
        Self {
            access_method,
            access_location,
        }
    }

    pub fn access_method(&self) -> ObjectIdentifier {
        self.access_method
    }

    pub fn access_location(&self) -> &GeneralName {
        &self.access_location
    }
}

/// Represents the Authority Information Access extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct AuthorityInformationAccess {
    descriptions: Vec<AccessDescription>,
}

impl AuthorityInformationAccess {
    pub fn new(descriptions: Vec<AccessDescription>) -> Self {
        Self { descriptions }
    }

    pub fn descriptions(&self) -> &[AccessDescription] {
        &self.descriptions
    }
}

impl ToAndFromX509Extension for AuthorityInformationAccess {
    const OID: ObjectIdentifier = extension_oid::AUTHORITY_INFORMATION_ACCESS;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let mut contents = Vec::new();
        for description in &self.descriptions {
            let mut inner = description.access_method.to_der()?;
            inner.extend(encode_any(&description.access_location.to_any()?)?);
            contents.extend(wrap_sequence(&inner)?);
        }
        wrap_sequence(&contents)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let descriptions = sequence_items(extension)?
            .iter()
            .map(|item| {
                let fields = sequence_items_of(item)?;
                let [method, location] = fields.as_slice() else {
                    return Err(X509Error::InvalidInput(
                        "AccessDescription must have two fields".to_string(),
                    ));
                };
                Ok(AccessDescription {
                    access_method: method.decode_as()?,
                    access_location: GeneralName::from_any(location)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { descriptions })
    }
}

#[cfg(test)]
mod tests {
    use der::Decode;

    use super::*;
    use crate::oid::access_method_oid;

    #[test]
    fn test_aia_round_trip() {
        let aia = AuthorityInformationAccess::new(vec![
            AccessDescription::new(
                access_method_oid::OCSP,
                GeneralName::uri("http://ocsp.domain.com").unwrap(),
            ),
            AccessDescription::new(
                access_method_oid::CA_ISSUERS,
                GeneralName::uri("http://domain.com/ca.crt").unwrap(),
            ),
        ]);
        let der = aia.to_x509_extension_value().unwrap();
        assert_eq!(
            AuthorityInformationAccess::from_x509_extension_value(&der).unwrap(),
            aia
        );
        let parsed = x509_cert::ext::pkix::AuthorityInfoAccessSyntax::from_der(&der).unwrap();
        assert_eq!(parsed.0[0].access_method, access_method_oid::OCSP);
    }
}
