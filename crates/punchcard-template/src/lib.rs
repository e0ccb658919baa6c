//! Fingerprint template codec for Punchcard.
//!
//! Sensors export templates as raw bytes; devices ship them base64-encoded
//! over MQTT. Pure synchronous; no broker or database dependencies.
//!
//! # Quick start
//!
//! ```
//! let bytes = punchcard_template::decode("AQIDBA==").unwrap();
//! assert_eq!(bytes, [1, 2, 3, 4]);
//! ```

pub mod error;

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use serde_json::Value;

pub use error::{Error, Result};

/// Number of leading bytes shown by [`preview`].
pub const PREVIEW_LEN: usize = 16;

/// Decode a base64 template into raw bytes.
///
/// ASCII whitespace is ignored, so line-wrapped device output decodes as-is.
/// A template that decodes to zero bytes is [`Error::Empty`].
pub fn decode(encoded: &str) -> Result<Vec<u8>> {
  let compact: String = encoded
    .chars()
    .filter(|c| !c.is_ascii_whitespace())
    .collect();

  let bytes = B64.decode(compact.as_bytes())?;
  if bytes.is_empty() {
    return Err(Error::Empty);
  }
  Ok(bytes)
}

/// Decode the `template` key of a JSON object such as
/// `{"template": "AQIDBA=="}`.
pub fn decode_payload(json: &str) -> Result<Vec<u8>> {
  let value: Value = serde_json::from_str(json)?;
  let encoded = value
    .get("template")
    .and_then(Value::as_str)
    .ok_or(Error::MissingTemplate)?;
  decode(encoded)
}

/// The leading bytes of a template, for diagnostics.
pub fn preview(bytes: &[u8]) -> &[u8] { &bytes[..bytes.len().min(PREVIEW_LEN)] }
