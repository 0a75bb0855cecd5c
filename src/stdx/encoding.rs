//! Conversions between the upstream's legacy charset and Rust strings.
//!
//! `encoding_rs::EUC_KR` is the WHATWG `euc-kr` encoding, which is really
//! CP949/UHC. This is also what the upstream pages are served as.

use encoding_rs::EUC_KR;
use std::fmt::Write as _;

/// Decodes EUC-KR bytes, replacing malformed sequences with U+FFFD.
pub fn decode_legacy(bytes: &[u8]) -> String {
    let (text, _, had_errors) = EUC_KR.decode(bytes);

    if had_errors {
        tracing::debug!("legacy decode replaced malformed byte sequences");
    }

    text.into_owned()
}

/// Encodes `text` into EUC-KR bytes.
///
/// Characters that have no mapping are written as HTML numeric character
/// references by `encoding_rs`.
pub fn encode_legacy(text: &str) -> Vec<u8> {
    let (bytes, _, _) = EUC_KR.encode(text);
    bytes.into_owned()
}

/// Percent-encodes every byte of the EUC-KR form of `text` as `%xx`, lowercase.
///
/// This is not URL percent-encoding of the Unicode text: every byte is escaped,
/// including ASCII letters and digits.
pub fn percent_hex_legacy(text: &str) -> String {
    let bytes = encode_legacy(text);
    let mut hex = String::with_capacity(bytes.len() * 3);

    for byte in bytes {
        // Writing to a `String` cannot fail.
        let _ = write!(hex, "%{byte:02x}");
    }

    hex
}
