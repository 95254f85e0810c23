//! Conversions between the textual forms of a blob identifier.
//!
//! The storage network addresses a blob by a 256-bit unsigned integer. The
//! ledger reports it in decimal, explorers and links use hex or URL-safe
//! base64, and the wrapping ledger object has its own Base58-style id. All
//! conversions here are exact big-integer reinterpretations over big-endian
//! byte sequences.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{TypeError, TypeResult};

/// Base58 alphabet (no `0`, `O`, `I`, `l`).
const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Minimum length for a string to be taken as a ledger object id.
const OBJECT_ID_MIN_LEN: usize = 32;

/// The detected textual format of an identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdFormat {
    /// Base58 ledger object id.
    SuiObjectId,
    /// `0x`-prefixed hex encoding of the u256 blob id.
    HexU256,
    /// Decimal encoding of the u256 blob id.
    DecimalU256,
    /// Anything else.
    Unknown,
}

impl IdFormat {
    /// Stable string label, e.g. `"decimal-u256"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuiObjectId => "sui-object-id",
            Self::HexU256 => "hex-u256",
            Self::DecimalU256 => "decimal-u256",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for IdFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target encoding for [`convert_id`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetFormat {
    Hex,
    Decimal,
    UrlSafeBase64,
}

/// Detect the format of an identifier.
///
/// Checked in order: object id, hex, decimal. Total over all inputs.
pub fn detect_format(id: &str) -> IdFormat {
    if id.len() >= OBJECT_ID_MIN_LEN && id.chars().all(|c| BASE58_ALPHABET.contains(c)) {
        return IdFormat::SuiObjectId;
    }
    if let Some(digits) = id.strip_prefix("0x") {
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return IdFormat::HexU256;
        }
    }
    if is_decimal(id) {
        return IdFormat::DecimalU256;
    }
    IdFormat::Unknown
}

/// Returns `true` if `s` is a non-empty run of ASCII digits.
pub(crate) fn is_decimal(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Parse a decimal string into its minimal big-endian byte sequence.
///
/// Zero is encoded as a single `0x00` byte; any other value has no leading
/// zero byte.
pub fn decimal_to_bytes(decimal: &str) -> TypeResult<Vec<u8>> {
    if !is_decimal(decimal) {
        return Err(TypeError::InvalidDecimal(decimal.to_string()));
    }

    let mut bytes: Vec<u8> = Vec::new();
    for digit in decimal.bytes().map(|b| u32::from(b - b'0')) {
        let mut carry = digit;
        for byte in bytes.iter_mut().rev() {
            let value = u32::from(*byte) * 10 + carry;
            *byte = (value & 0xff) as u8;
            carry = value >> 8;
        }
        while carry > 0 {
            bytes.insert(0, (carry & 0xff) as u8);
            carry >>= 8;
        }
    }

    if bytes.is_empty() {
        bytes.push(0);
    }
    Ok(bytes)
}

/// Render big-endian bytes as a decimal string.
fn bytes_to_decimal(bytes: &[u8]) -> String {
    let mut digits = Vec::new();
    let mut value: Vec<u8> = bytes.iter().copied().skip_while(|b| *b == 0).collect();

    while !value.is_empty() {
        let mut remainder = 0u32;
        for byte in value.iter_mut() {
            let acc = (remainder << 8) | u32::from(*byte);
            *byte = (acc / 10) as u8;
            remainder = acc % 10;
        }
        digits.push(b'0' + remainder as u8);
        let leading = value.iter().take_while(|b| **b == 0).count();
        value.drain(..leading);
    }

    if digits.is_empty() {
        return "0".to_string();
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// Convert a decimal u256 to `0x`-prefixed lowercase hex.
///
/// `"255"` becomes `"0xff"` and `"0"` becomes `"0x0"`.
pub fn decimal_to_hex(decimal: &str) -> TypeResult<String> {
    let bytes = decimal_to_bytes(decimal)?;
    let encoded = hex::encode(bytes);
    let trimmed = encoded.trim_start_matches('0');
    if trimmed.is_empty() {
        Ok("0x0".to_string())
    } else {
        Ok(format!("0x{trimmed}"))
    }
}

/// Convert a decimal u256 to URL-safe, unpadded base64.
///
/// Returns `None` if the input is not a decimal string.
pub fn decimal_to_url_safe_base64(decimal: &str) -> Option<String> {
    let bytes = decimal_to_bytes(decimal).ok()?;
    Some(URL_SAFE_NO_PAD.encode(bytes))
}

/// Convert `0x`-prefixed (or bare) hex back to decimal.
pub fn hex_to_decimal(hex_id: &str) -> TypeResult<String> {
    let digits = hex_id.strip_prefix("0x").unwrap_or(hex_id);
    if digits.is_empty() {
        return Err(TypeError::InvalidHex(hex_id.to_string()));
    }
    let padded = if digits.len() % 2 == 1 {
        format!("0{digits}")
    } else {
        digits.to_string()
    };
    let bytes = hex::decode(&padded).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
    Ok(bytes_to_decimal(&bytes))
}

/// Convert a URL-safe, unpadded base64 id back to decimal.
pub fn url_safe_base64_to_decimal(encoded: &str) -> TypeResult<String> {
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|e| TypeError::InvalidBase64(e.to_string()))?;
    Ok(bytes_to_decimal(&bytes))
}

/// Convert an identifier into `target`, when a conversion applies.
///
/// Only decimal inputs are converted; every other input (and any failed
/// conversion) is returned unchanged.
pub fn convert_id(id: &str, target: TargetFormat) -> String {
    if detect_format(id) != IdFormat::DecimalU256 {
        return id.to_string();
    }
    let converted = match target {
        TargetFormat::Hex => decimal_to_hex(id).ok(),
        TargetFormat::UrlSafeBase64 => decimal_to_url_safe_base64(id),
        TargetFormat::Decimal => None,
    };
    converted.unwrap_or_else(|| id.to_string())
}

/// Abbreviate a long identifier as `first8...last8`.
pub fn short_blob_id(id: &str) -> String {
    let chars: Vec<char> = id.chars().collect();
    if chars.len() <= 16 {
        return id.to_string();
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 8..].iter().collect();
    format!("{head}...{tail}")
}
