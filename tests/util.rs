#![allow(dead_code)]

use std::path::PathBuf;

use time::macros::datetime;
use x509kit::builder::CertificateBuilder;
use x509kit::cert::Certificate;
use x509kit::error::Result;
use x509kit::extensions::Extension;
use x509kit::hash::HashAlgorithm;
use x509kit::key::KeyPair;
use x509kit::name::{Name, NameAttribute};
use x509kit::oid::name_oid;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn data_path(file: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(file)
}

pub fn read_data(file: &str) -> Vec<u8> {
    std::fs::read(data_path(file)).unwrap()
}

pub fn load_key(file: &str) -> KeyPair {
    let pem = String::from_utf8(read_data(file)).unwrap();
    KeyPair::import_from_pkcs8_pem(&pem).unwrap()
}

pub fn rsa_2048() -> KeyPair {
    load_key("rsa_2048.pem")
}

pub fn rsa_512() -> KeyPair {
    load_key("rsa_512.pem")
}

pub fn ec_p256() -> KeyPair {
    load_key("ec_p256.pem")
}

pub fn ec_p384() -> KeyPair {
    load_key("ec_p384.pem")
}

pub fn dsa_2048() -> KeyPair {
    load_key("dsa_2048.pem")
}

pub fn common_name(cn: &str) -> Name {
    Name::new(vec![NameAttribute::new(name_oid::COMMON_NAME, cn)])
}

/// A builder with every required field populated for a self-issued certificate.
pub fn base_builder(key: &KeyPair) -> Result<CertificateBuilder> {
    CertificateBuilder::new()
        .issuer_name(common_name("issuer.test"))?
        .subject_name(common_name("subject.test"))?
        .public_key(key.public_key())?
        .serial_number(777u32.into())?
        .not_valid_before(datetime!(2002-01-01 12:01 UTC))?
        .not_valid_after(datetime!(2030-12-31 08:30 UTC))
}

/// Signs a certificate carrying `extensions` with the P-256 test key.
pub fn cert_with_extensions(extensions: Vec<Extension>) -> Result<Certificate> {
    let key = ec_p256();
    let mut builder = base_builder(&key)?;
    for extension in extensions {
        builder = builder.add_extension(extension)?;
    }
    builder.sign(&key, HashAlgorithm::Sha256)
}

/// Re-encodes `cert` with its extensions replaced by `extensions`. The
/// signature no longer matches, which loading does not check.
pub fn replace_extensions(cert: &Certificate, extensions: Vec<x509_cert::ext::Extension>) -> Vec<u8> {
    use der::{Decode, Encode};
    let mut inner = x509_cert::Certificate::from_der(cert.to_der()).unwrap();
    inner.tbs_certificate.extensions = Some(extensions);
    inner.to_der().unwrap()
}

pub fn raw_extension(oid: &str, critical: bool, value: &[u8]) -> x509_cert::ext::Extension {
    x509_cert::ext::Extension {
        extn_id: x509kit::oid::ObjectIdentifier::new_unwrap(oid),
        critical,
        extn_value: der::asn1::OctetString::new(value).unwrap(),
    }
}
