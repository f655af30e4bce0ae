mod util;

use std::fs;
use std::process::Command;

use num_bigint::BigUint;
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::PKey;
use openssl::x509::{X509, X509Crl, X509Req};
use regex::Regex;
use time::macros::datetime;
use x509kit::builder::{
    CertificateRevocationListBuilder, CertificateSigningRequestBuilder, RevokedCertificateBuilder,
};
use x509kit::cert::Certificate;
use x509kit::extensions::{
    BasicConstraints, CrlReason, Extension, KeyUsage, ReasonFlags, SubjectAlternativeName,
};
use x509kit::general_name::GeneralName;
use x509kit::hash::HashAlgorithm;
use x509kit::key::KeyPair;
use x509kit::pem_utils::Encoding;

fn signed_certificate(key: &KeyPair, hash: HashAlgorithm) -> Certificate {
    util::base_builder(key)
        .unwrap()
        .add_extension(Extension::new(BasicConstraints::new(true, Some(0)).unwrap(), true))
        .unwrap()
        .add_extension(Extension::new(
            SubjectAlternativeName::new(vec![GeneralName::dns_name("subject.test").unwrap()]),
            false,
        ))
        .unwrap()
        .sign(key, hash)
        .unwrap()
}

#[test]
fn test_openssl_validate_cert() {
    util::init_logging();
    let key = util::ec_p256();
    let cert = signed_certificate(&key, HashAlgorithm::Sha256);

    // Save the certificate to a temporary file
    let cert_path = std::env::temp_dir().join("x509kit_test_cert.pem");
    fs::write(&cert_path, cert.public_bytes(Encoding::Pem))
        .expect("Failed to write certificate");

    let output = Command::new("openssl")
        .arg("x509")
        .arg("-in")
        .arg(&cert_path)
        .arg("-noout")
        .arg("-text")
        .output()
        .expect("Failed to execute OpenSSL command");
    fs::remove_file(&cert_path).expect("Failed to remove test certificate");

    assert!(
        output.status.success(),
        "OpenSSL command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let output_text = String::from_utf8_lossy(&output.stdout);

    assert!(
        output_text.contains("Version: 3 (0x2)"),
        "Version field is incorrect"
    );
    assert!(
        output_text.contains("Serial Number: 777 (0x309)"),
        "Serial Number field is incorrect"
    );
    assert!(
        output_text.contains("Signature Algorithm: ecdsa-with-SHA256"),
        "Signature Algorithm field is incorrect"
    );

    let issuer_regex = Regex::new(r"Issuer: ?CN ?= ?issuer\.test").unwrap();
    let subject_regex = Regex::new(r"Subject: ?CN ?= ?subject\.test").unwrap();
    let not_before_regex = Regex::new(r"Not Before: Jan  1 12:01:00 2002 GMT").unwrap();
    let not_after_regex = Regex::new(r"Not After ?: Dec 31 08:30:00 2030 GMT").unwrap();
    let basic_regex = Regex::new(r"Basic Constraints: critical\s+CA:TRUE, pathlen:0").unwrap();
    let san_regex = Regex::new(r"Subject Alternative Name:\s+DNS:subject\.test").unwrap();
    for (regex, field) in [
        (issuer_regex, "Issuer"),
        (subject_regex, "Subject"),
        (not_before_regex, "Not Before"),
        (not_after_regex, "Not After"),
        (basic_regex, "Basic Constraints"),
        (san_regex, "Subject Alternative Name"),
    ] {
        assert!(
            regex.is_match(&output_text),
            "Missing or incorrect {field} field:\n{output_text}"
        );
    }
}

#[test]
fn test_openssl_verifies_csr() {
    let key = util::rsa_2048();
    let usage = KeyUsage::builder()
        .digital_signature(true)
        .build()
        .unwrap();
    let csr = CertificateSigningRequestBuilder::new()
        .subject_name(util::common_name("request.test"))
        .unwrap()
        .add_extension(Extension::new(usage, true))
        .unwrap()
        .sign(&key, HashAlgorithm::Sha256)
        .unwrap();

    let csr_path = std::env::temp_dir().join("x509kit_test_csr.pem");
    fs::write(&csr_path, csr.public_bytes(Encoding::Pem)).expect("Failed to write CSR");
    let output = Command::new("openssl")
        .arg("req")
        .arg("-in")
        .arg(&csr_path)
        .arg("-noout")
        .arg("-verify")
        .arg("-text")
        .output()
        .expect("Failed to execute OpenSSL command");
    fs::remove_file(&csr_path).expect("Failed to remove test CSR");

    assert!(
        output.status.success(),
        "OpenSSL command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let output_text = String::from_utf8_lossy(&output.stdout);
    assert!(
        output_text.contains("Requested Extensions:"),
        "Requested extensions are missing"
    );
    let key_usage_regex = Regex::new(r"Key Usage: critical\s+Digital Signature").unwrap();
    assert!(key_usage_regex.is_match(&output_text), "{output_text}");

    // The openssl crate agrees.
    let req = X509Req::from_pem(&csr.public_bytes(Encoding::Pem)).expect("Failed to parse CSR");
    let public_key = req.public_key().unwrap();
    assert!(req.verify(&public_key).unwrap());
}

#[test]
fn test_openssl_crate_validate_cert() {
    let key = util::rsa_2048();
    let cert = signed_certificate(&key, HashAlgorithm::Sha384);

    let x509 = X509::from_pem(&cert.public_bytes(Encoding::Pem)).expect("Failed to parse PEM");

    let subject = x509
        .subject_name()
        .entries_by_nid(Nid::COMMONNAME)
        .next()
        .unwrap()
        .data()
        .as_utf8()
        .unwrap();
    assert_eq!(subject.to_string(), "subject.test", "Subject CN mismatch");

    let issuer = x509
        .issuer_name()
        .entries_by_nid(Nid::COMMONNAME)
        .next()
        .unwrap()
        .data()
        .as_utf8()
        .unwrap();
    assert_eq!(issuer.to_string(), "issuer.test", "Issuer CN mismatch");

    assert_eq!(x509.version(), 2, "X509 version should be 3 (0-based index)");
    let serial = x509.serial_number().to_bn().unwrap().to_dec_str().unwrap();
    assert_eq!(serial.to_string(), "777", "Serial number should be 777");
    assert_eq!(
        x509.signature_algorithm().object().nid(),
        Nid::SHA384WITHRSAENCRYPTION,
        "Signature algorithm should be sha384WithRSAEncryption"
    );

    let fingerprint = x509.digest(MessageDigest::sha256()).unwrap();
    assert_eq!(&*fingerprint, cert.fingerprint(HashAlgorithm::Sha256).as_slice());

    let issuer_key = PKey::public_key_from_pem(key.public_key().to_pem().unwrap().as_bytes())
        .expect("Failed to parse public key");
    assert!(x509.verify(&issuer_key).unwrap());
}

#[test]
fn test_openssl_crate_verifies_dsa_certificate() {
    let key = util::dsa_2048();
    let cert = signed_certificate(&key, HashAlgorithm::Sha256);
    let x509 = X509::from_der(cert.to_der()).expect("Failed to parse DER");
    let issuer_key = PKey::public_key_from_pem(key.public_key().to_pem().unwrap().as_bytes())
        .expect("Failed to parse public key");
    assert!(x509.verify(&issuer_key).unwrap());
}

#[test]
fn test_openssl_crate_validate_crl() {
    let key = util::ec_p384();
    let entry = RevokedCertificateBuilder::new()
        .serial_number(BigUint::from(0x0abcdefu32))
        .unwrap()
        .revocation_date(datetime!(2021-06-01 0:00 UTC))
        .unwrap()
        .add_extension(Extension::new(CrlReason(ReasonFlags::KeyCompromise), false))
        .unwrap()
        .build()
        .unwrap();
    let crl = CertificateRevocationListBuilder::new()
        .issuer_name(util::common_name("crl.test"))
        .unwrap()
        .last_update(datetime!(2021-06-01 0:00 UTC))
        .unwrap()
        .next_update(datetime!(2021-07-01 0:00 UTC))
        .unwrap()
        .add_revoked_certificate(entry)
        .sign(&key, HashAlgorithm::Sha384)
        .unwrap();

    let x509_crl = X509Crl::from_der(crl.to_der()).expect("Failed to parse CRL");
    let revoked = x509_crl.get_revoked().expect("CRL should have entries");
    assert_eq!(revoked.len(), 1);
    let serial = revoked
        .get(0)
        .unwrap()
        .serial_number()
        .to_bn()
        .unwrap()
        .to_hex_str()
        .unwrap();
    assert_eq!(serial.to_string(), "ABCDEF");

    let issuer_key = PKey::public_key_from_pem(key.public_key().to_pem().unwrap().as_bytes())
        .expect("Failed to parse public key");
    assert!(x509_crl.verify(&issuer_key).unwrap());
}

#[test]
fn test_load_openssl_generated_cert() {
    let pem = util::read_data("generalized_time.pem");
    let x509 = X509::from_pem(&pem).unwrap();
    let cert = Certificate::from_pem(&pem).unwrap();
    assert_eq!(x509.to_der().unwrap(), cert.to_der());
    let signer = util::rsa_2048().public_key();
    let issuer_key = PKey::public_key_from_der(&signer.to_der().unwrap()).unwrap();
    assert!(x509.verify(&issuer_key).unwrap());
}
