//! Inbound scan events and their classification.
//!
//! Devices publish flat JSON objects. The shape is recognised by which keys
//! are present, checked in this order:
//!
//! | keys present               | event                         |
//! |----------------------------|-------------------------------|
//! | `template` + `user_id`     | [`ScanEvent::Enrollment`]     |
//! | `fingerprint_id`           | [`ScanEvent::ConfidenceScan`] |
//! | `user_id`                  | [`ScanEvent::ExplicitAction`] |
//!
//! Once a shape is matched its remaining fields are required; extra keys are
//! ignored.

use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::{Error, Result, attendance::Action, identity::Handle};

/// One inbound scanner message.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
  /// A freshly captured template to store against the identity.
  Enrollment { handle: Handle, template: String },
  /// A device-side match; the action is resolved by toggling.
  ConfidenceScan { handle: Handle, confidence: f64 },
  /// Legacy attendance message carrying the action explicitly.
  ExplicitAction { handle: Handle, action: Action },
}

#[derive(Deserialize)]
struct EnrollmentWire {
  user_id:  Handle,
  template: String,
}

#[derive(Deserialize)]
struct ConfidenceScanWire {
  fingerprint_id: Handle,
  confidence:     f64,
}

#[derive(Deserialize)]
struct ExplicitActionWire {
  user_id:    Handle,
  check_type: Action,
}

impl ScanEvent {
  /// Parse and classify a raw payload.
  ///
  /// Every failure is [`Error::MalformedEvent`].
  pub fn parse(payload: &[u8]) -> Result<Self> {
    let value: Value = serde_json::from_slice(payload)
      .map_err(|e| Error::MalformedEvent(format!("invalid JSON: {e}")))?;

    let Value::Object(map) = value else {
      return Err(Error::MalformedEvent("payload is not a JSON object".into()));
    };

    if map.contains_key("template") && map.contains_key("user_id") {
      let wire: EnrollmentWire = shape(map, "enrollment")?;
      Ok(Self::Enrollment { handle: wire.user_id, template: wire.template })
    } else if map.contains_key("fingerprint_id") {
      let wire: ConfidenceScanWire = shape(map, "scan")?;
      Ok(Self::ConfidenceScan {
        handle:     wire.fingerprint_id,
        confidence: wire.confidence,
      })
    } else if map.contains_key("user_id") {
      let wire: ExplicitActionWire = shape(map, "attendance")?;
      Ok(Self::ExplicitAction { handle: wire.user_id, action: wire.check_type })
    } else {
      Err(Error::MalformedEvent(
        "no recognised event keys (template, fingerprint_id, user_id)".into(),
      ))
    }
  }

  pub fn handle(&self) -> Handle {
    match self {
      Self::Enrollment { handle, .. }
      | Self::ConfidenceScan { handle, .. }
      | Self::ExplicitAction { handle, .. } => *handle,
    }
  }

  /// Short label for logs.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Enrollment { .. } => "enrollment",
      Self::ConfidenceScan { .. } => "scan",
      Self::ExplicitAction { .. } => "attendance",
    }
  }
}

fn shape<T: DeserializeOwned>(map: Map<String, Value>, kind: &str) -> Result<T> {
  serde_json::from_value(Value::Object(map))
    .map_err(|e| Error::MalformedEvent(format!("{kind} event: {e}")))
}
