use core::str::FromStr;

use crate::error::{Result, X509Error};

/// Output encoding for `public_bytes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Pem,
    Der,
}

impl FromStr for Encoding {
    type Err = X509Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "PEM" => Ok(Encoding::Pem),
            "DER" => Ok(Encoding::Der),
            _ => Err(X509Error::TypeMismatch(format!(
                "encoding must be PEM or DER, got {s:?}"
            ))),
        }
    }
}

/// Convert DER‑encoded data into a PEM‑encoded string with the provided label.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(
        &pem,
        pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
    )
}

/// Convert a PEM‑encoded string to DER‑encoded bytes, checking the label.
pub fn pem_to_der(pem_str: impl AsRef<[u8]>, label: &str) -> Result<Vec<u8>> {
    let pem = pem::parse(pem_str)?;
    if pem.tag() != label {
        return Err(X509Error::MalformedInput(format!(
            "expected a {label} PEM block, found {}",
            pem.tag()
        )));
    }
    Ok(pem.into_contents())
}

/// Encodes `der` as requested.
pub(crate) fn encode(der: &[u8], label: &str, encoding: Encoding) -> Vec<u8> {
    match encoding {
        Encoding::Der => der.to_vec(),
        Encoding::Pem => der_to_pem(der, label).into_bytes(),
    }
}
