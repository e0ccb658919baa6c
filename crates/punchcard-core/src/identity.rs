//! Identity — the person behind a scanner handle.
//!
//! Identities are provisioned by an external user-management process. The
//! bridge only ever reads them (apart from the enrolled template blob, which
//! lives in the store and never travels on this type).

use serde::{Deserialize, Serialize};

/// Numeric identifier correlating a scanner reading with a stored identity.
pub type Handle = i64;

/// Role reported when an identity has no role assigned.
pub const DEFAULT_ROLE: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub handle:     Handle,
  pub name:       String,
  /// `None` when the identity has no role row joined.
  pub role:       Option<String>,
  pub department: Option<String>,
  pub room:       Option<String>,
}

impl Identity {
  /// The role name, or [`DEFAULT_ROLE`] when none is assigned.
  pub fn role_or_default(&self) -> &str {
    self.role.as_deref().unwrap_or(DEFAULT_ROLE)
  }
}
