//! Attendance records and the check-in/check-out toggle resolver.
//!
//! Records are append-only. An identity's current state is never stored; it
//! is derived from its most recent record, ordered by `(recorded_at DESC,
//! id DESC)`. The sequence id breaks ties when two inserts share a
//! timestamp.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{identity::Handle, store::AttendanceStore, Error};

// ─── Action ──────────────────────────────────────────────────────────────────

/// The two attendance actions. "No history" counts as checked out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
  Checkin,
  Checkout,
}

impl Action {
  /// The string stored in the `action` column and sent on the wire.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Checkin => "checkin",
      Self::Checkout => "checkout",
    }
  }

  /// The opposite action.
  pub fn toggled(self) -> Self {
    match self {
      Self::Checkin => Self::Checkout,
      Self::Checkout => Self::Checkin,
    }
  }
}

impl fmt::Display for Action {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Action {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "checkin" => Ok(Self::Checkin),
      "checkout" => Ok(Self::Checkout),
      other => Err(Error::UnknownAction(other.to_owned())),
    }
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// An append-only attendance fact. Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
  /// Surrogate sequence id, strictly increasing in insert order.
  pub id:          i64,
  pub handle:      Handle,
  pub action:      Action,
  /// Server-assigned at insert; non-decreasing in insert order.
  pub recorded_at: DateTime<Utc>,
}

// ─── Resolver ────────────────────────────────────────────────────────────────

/// Decide the next action from the most recent prior record.
///
/// A prior `checkin` yields `checkout`; a prior `checkout` or no history at
/// all yields `checkin`.
pub fn next_action(latest: Option<&AttendanceRecord>) -> Action {
  match latest {
    Some(record) => record.action.toggled(),
    None => Action::Checkin,
  }
}

/// Resolve the next action for `handle` by reading its latest record.
///
/// This is a plain read; callers that go on to insert should use
/// [`AttendanceStore::record_toggle`], which resolves and inserts inside one
/// transaction.
pub async fn resolve_next_action<S: AttendanceStore>(
  store: &S,
  handle: Handle,
) -> Result<Action, S::Error> {
  let latest = store.latest_record(handle).await?;
  Ok(next_action(latest.as_ref()))
}
