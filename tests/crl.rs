mod util;

use num_bigint::BigUint;
use time::macros::datetime;
use x509kit::builder::{CertificateRevocationListBuilder, RevokedCertificateBuilder};
use x509kit::cert::Certificate;
use x509kit::crl::CertificateRevocationList;
use x509kit::error::{Result, X509Error};
use x509kit::extensions::{
    CertificateIssuer, CrlReason, Extension, InvalidityDate, ReasonFlags, UnrecognizedExtension,
};
use x509kit::general_name::GeneralName;
use x509kit::hash::HashAlgorithm;
use x509kit::oid::extension_oid;
use x509kit::pem_utils::Encoding;

#[test]
fn test_load_openssl_crl() -> Result<()> {
    util::init_logging();
    let crl = CertificateRevocationList::from_pem(util::read_data("crl_openssl.pem"))?;
    let ca = Certificate::from_pem(util::read_data("v1_cert.pem"))?;

    assert_eq!(crl.issuer(), ca.subject());
    assert_eq!(crl.len(), 3);
    assert!(crl.next_update().is_some_and(|next| next > crl.last_update()));
    assert_eq!(crl.signature_hash_algorithm()?, HashAlgorithm::Sha256);
    crl.verify_signature(&ca.public_key()?)?;

    let serials: Vec<BigUint> = crl.iter().map(|e| e.serial_number().clone()).collect();
    assert_eq!(serials, [101u32, 102, 103].map(BigUint::from));

    let first = crl.get(0).unwrap();
    assert_eq!(
        first.extensions()?.get::<CrlReason>()?,
        &CrlReason(ReasonFlags::KeyCompromise)
    );
    let second = crl
        .get_revoked_certificate_by_serial_number(&BigUint::from(102u32))
        .unwrap();
    assert_eq!(second.extensions()?.get::<CrlReason>()?.0, ReasonFlags::Superseded);
    assert!(crl.get(3).is_none());
    Ok(())
}

#[test]
fn test_entry_without_extensions() -> Result<()> {
    let crl = CertificateRevocationList::from_pem(util::read_data("crl_openssl.pem"))?;
    let entry = crl.get(2).unwrap();
    assert!(entry.extensions()?.is_empty());
    assert_eq!(
        entry
            .extensions()?
            .get_extension_for_oid(extension_oid::CRL_REASON)
            .unwrap_err(),
        X509Error::ExtensionNotFound(extension_oid::CRL_REASON)
    );
    Ok(())
}

#[test]
fn test_crl_level_extensions_are_not_exposed() -> Result<()> {
    let crl = CertificateRevocationList::from_pem(util::read_data("crl_openssl.pem"))?;
    assert!(matches!(
        crl.extensions(),
        Err(X509Error::NotImplemented(_))
    ));
    Ok(())
}

/// Re-encodes the fixture CRL with `extensions` as its crlExtensions. The
/// signature is left as is.
fn with_crl_extensions(extensions: Vec<x509_cert::ext::Extension>) -> Vec<u8> {
    use der::{Decode, Encode};
    let pem = util::read_data("crl_openssl.pem");
    let crl = CertificateRevocationList::from_pem(&pem).unwrap();
    let mut inner = x509_cert::crl::CertificateList::from_der(crl.to_der()).unwrap();
    inner.tbs_cert_list.crl_extensions = Some(extensions);
    inner.to_der().unwrap()
}

#[test]
fn test_crl_level_extensions_are_checked() -> Result<()> {
    let number = util::raw_extension("2.5.29.20", false, &[0x02, 0x01, 0x01]);
    let single = with_crl_extensions(vec![number.clone()]);
    assert_eq!(CertificateRevocationList::from_der(&single)?.len(), 3);

    let duplicate = with_crl_extensions(vec![number.clone(), number]);
    assert_eq!(
        CertificateRevocationList::from_der(&duplicate).unwrap_err(),
        X509Error::DuplicateExtension(extension_oid::CRL_NUMBER)
    );

    // A critical flag of 0x01 is not a DER BOOLEAN.
    let mut malformed = with_crl_extensions(vec![util::raw_extension(
        "1.2.3.4",
        true,
        &[0x05, 0x00],
    )]);
    let flag = [0x06, 0x03, 0x2a, 0x03, 0x04, 0x01, 0x01, 0xff];
    let at = malformed
        .windows(flag.len())
        .position(|w| w == flag)
        .expect("critical flag not found");
    malformed[at + 7] = 0x01;
    assert!(matches!(
        CertificateRevocationList::from_der(&malformed),
        Err(X509Error::MalformedInput(_))
    ));
    Ok(())
}

#[test]
fn test_pem_der_round_trip() -> Result<()> {
    let crl = CertificateRevocationList::from_pem(util::read_data("crl_openssl.pem"))?;
    let der = crl.public_bytes(Encoding::Der);
    let reloaded = CertificateRevocationList::from_der(&der)?;
    assert_eq!(reloaded, crl);
    assert_eq!(reloaded.tbs_certlist_bytes(), crl.tbs_certlist_bytes());
    assert_eq!(
        crl.fingerprint(HashAlgorithm::Sha256),
        HashAlgorithm::Sha256.digest(&der)
    );
    assert!(matches!(
        Certificate::from_der(&der),
        Err(X509Error::MalformedInput(_))
    ));
    Ok(())
}

#[test]
fn test_crl_with_every_reason() -> Result<()> {
    util::init_logging();
    let key = util::ec_p384();
    let revoked_at = datetime!(2015-01-01 0:00 UTC);
    let mut builder = CertificateRevocationListBuilder::new()
        .issuer_name(util::common_name("cryptography.io CA"))?
        .last_update(datetime!(2015-01-01 0:00 UTC))?
        .next_update(datetime!(2016-01-01 0:00 UTC))?
        .add_extension(Extension::new(
            UnrecognizedExtension::new(extension_oid::CRL_NUMBER, vec![0x02, 0x01, 0x01]),
            false,
        ))?;

    for (i, reason) in ReasonFlags::ALL.into_iter().enumerate() {
        let entry = RevokedCertificateBuilder::new()
            .serial_number(BigUint::from(i + 1))?
            .revocation_date(revoked_at)?
            .add_extension(Extension::new(CrlReason(reason), false))?
            .build()?;
        builder = builder.add_revoked_certificate(entry);
    }
    let issuer = CertificateIssuer::new(vec![GeneralName::dns_name("cryptography.io")?]);
    let extra = [
        RevokedCertificateBuilder::new()
            .serial_number(BigUint::from(11u8))?
            .revocation_date(revoked_at)?
            .add_extension(Extension::new(
                InvalidityDate(datetime!(2014-12-25 10:30 UTC)),
                false,
            ))?
            .build()?,
        RevokedCertificateBuilder::new()
            .serial_number(BigUint::from(12u8))?
            .revocation_date(revoked_at)?
            .add_extension(Extension::new(issuer.clone(), true))?
            .build()?,
    ];
    for entry in extra {
        builder = builder.add_revoked_certificate(entry);
    }

    let crl = builder.sign(&key, HashAlgorithm::Sha384)?;
    crl.verify_signature(&key.public_key())?;
    assert_eq!(crl.len(), 12);
    assert!(matches!(
        crl.extensions(),
        Err(X509Error::NotImplemented(_))
    ));

    let reasons: Vec<ReasonFlags> = crl
        .iter()
        .take(10)
        .map(|entry| -> Result<ReasonFlags> { Ok(entry.extensions()?.get::<CrlReason>()?.0) })
        .collect::<Result<_>>()?;
    assert_eq!(reasons, ReasonFlags::ALL);

    for entry in &crl {
        assert_eq!(entry.revocation_date(), revoked_at);
    }
    let invalidity = crl.get(10).unwrap().extensions()?.get::<InvalidityDate>()?;
    assert_eq!(invalidity.0, datetime!(2014-12-25 10:30 UTC));
    let certificate_issuer = crl.get(11).unwrap().extensions()?;
    assert_eq!(certificate_issuer.get::<CertificateIssuer>()?, &issuer);
    assert!(
        certificate_issuer
            .get_extension_for_oid(extension_oid::CERTIFICATE_ISSUER)?
            .critical()
    );
    Ok(())
}

#[test]
fn test_crl_requires_issuer_and_dates() -> Result<()> {
    let key = util::ec_p256();
    assert!(matches!(
        CertificateRevocationListBuilder::new().sign(&key, HashAlgorithm::Sha256),
        Err(X509Error::MissingRequiredField(_))
    ));
    let missing_next = CertificateRevocationListBuilder::new()
        .issuer_name(util::common_name("ca"))?
        .last_update(datetime!(2020-01-01 0:00 UTC))?;
    assert_eq!(
        missing_next.sign(&key, HashAlgorithm::Sha256).unwrap_err(),
        X509Error::MissingRequiredField("A CRL must have a next update time".to_string())
    );
    assert!(matches!(
        CertificateRevocationListBuilder::new()
            .next_update(datetime!(2020-01-01 0:00 UTC))?
            .last_update(datetime!(2021-01-01 0:00 UTC)),
        Err(X509Error::InvalidInput(_))
    ));
    Ok(())
}

#[test]
fn test_empty_crl() -> Result<()> {
    let key = util::rsa_2048();
    let crl = CertificateRevocationListBuilder::new()
        .issuer_name(util::common_name("empty"))?
        .last_update(datetime!(2020-01-01 0:00 UTC))?
        .next_update(datetime!(2020-02-01 0:00 UTC))?
        .sign(&key, HashAlgorithm::Sha256)?;
    assert!(crl.is_empty());
    assert!(crl.iter().next().is_none());
    assert_eq!(crl.last_update(), datetime!(2020-01-01 0:00 UTC));
    Ok(())
}
