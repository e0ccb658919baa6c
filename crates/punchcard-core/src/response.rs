//! Outbound response payloads.
//!
//! Devices understand two response families: the `result`-tagged family used
//! by the scan and enrollment firmware, and the `status`-tagged family used
//! by the older explicit-action firmware. Responses are never persisted.

use serde::{Deserialize, Serialize};

use crate::{
  Result,
  attendance::Action,
  identity::{Handle, Identity},
};

pub const USER_NOT_FOUND_IN_DATABASE: &str = "User not found in database";
pub const USER_NOT_FOUND: &str = "User not found";

/// One response, published exactly once per inbound event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponsePayload {
  Result(ScanResult),
  Status(ActionStatus),
}

/// Responses tagged with a `result` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ScanResult {
  TemplateSaved {
    user_id: Handle,
    /// Number of template bytes stored.
    length:  usize,
  },
  TemplateRejected {
    user_id: Handle,
    message: String,
  },
  AccessGranted {
    name:   String,
    role:   String,
    /// The resolved action.
    status: Action,
  },
  AccessDenied {
    message: String,
  },
  MalformedEvent {
    message: String,
  },
  SystemError {
    message: String,
  },
}

/// Responses tagged with a `status` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionStatus {
  Success {
    user_name: String,
    role:      String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    room:      Option<String>,
    action:    Action,
  },
  Error {
    message: String,
  },
}

impl ResponsePayload {
  pub fn template_saved(user_id: Handle, length: usize) -> Self {
    Self::Result(ScanResult::TemplateSaved { user_id, length })
  }

  pub fn template_rejected(user_id: Handle, message: impl Into<String>) -> Self {
    Self::Result(ScanResult::TemplateRejected { user_id, message: message.into() })
  }

  pub fn access_granted(identity: &Identity, action: Action) -> Self {
    Self::Result(ScanResult::AccessGranted {
      name:   identity.name.clone(),
      role:   identity.role_or_default().to_owned(),
      status: action,
    })
  }

  pub fn access_denied(message: impl Into<String>) -> Self {
    Self::Result(ScanResult::AccessDenied { message: message.into() })
  }

  pub fn malformed_event(message: impl Into<String>) -> Self {
    Self::Result(ScanResult::MalformedEvent { message: message.into() })
  }

  /// A storage or other internal failure; `cause` is included verbatim.
  pub fn system_error(cause: impl std::fmt::Display) -> Self {
    Self::Result(ScanResult::SystemError { message: format!("System error: {cause}") })
  }

  pub fn action_success(identity: &Identity, action: Action) -> Self {
    Self::Status(ActionStatus::Success {
      user_name: identity.name.clone(),
      role:      identity.role_or_default().to_owned(),
      room:      identity.room.clone(),
      action,
    })
  }

  pub fn action_error(message: impl Into<String>) -> Self {
    Self::Status(ActionStatus::Error { message: message.into() })
  }

  /// Whether this is a success-variant response.
  pub fn is_success(&self) -> bool {
    matches!(
      self,
      Self::Result(ScanResult::TemplateSaved { .. } | ScanResult::AccessGranted { .. })
        | Self::Status(ActionStatus::Success { .. })
    )
  }

  /// Encode for publishing.
  pub fn to_json_bytes(&self) -> Result<Vec<u8>> { Ok(serde_json::to_vec(self)?) }
}
