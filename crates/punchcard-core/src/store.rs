//! The `AttendanceStore` trait.
//!
//! Implemented by storage backends (e.g. `punchcard-store-sqlite`). The
//! reconciler in `punchcard-bridge` depends on this abstraction, not on any
//! concrete backend, so tests can inject fakes.

use std::future::Future;

use crate::{
  attendance::{Action, AttendanceRecord},
  identity::{Handle, Identity},
};

/// Abstraction over the identity/attendance store.
///
/// Identity reads may happen outside any transaction. Every write method is
/// atomic: it either commits completely or leaves the store untouched.
pub trait AttendanceStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Identities ────────────────────────────────────────────────────────

  /// Look up an identity joined with its role and department.
  ///
  /// Returns `None` for an unknown handle; that is a routine outcome, not an
  /// error. A missing role or department is `None` on the identity.
  fn find_identity(
    &self,
    handle: Handle,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + '_;

  // ── Attendance ────────────────────────────────────────────────────────

  /// The most recent record for `handle`, by `(recorded_at, id)` descending.
  fn latest_record(
    &self,
    handle: Handle,
  ) -> impl Future<Output = Result<Option<AttendanceRecord>, Self::Error>> + Send + '_;

  /// All records for `handle`, oldest first.
  fn history(
    &self,
    handle: Handle,
  ) -> impl Future<Output = Result<Vec<AttendanceRecord>, Self::Error>> + Send + '_;

  /// Append a record with a caller-supplied action. No toggle logic.
  fn record_action(
    &self,
    handle: Handle,
    action: Action,
  ) -> impl Future<Output = Result<AttendanceRecord, Self::Error>> + Send + '_;

  /// Resolve the next action with
  /// [`next_action`](crate::attendance::next_action) and append it.
  ///
  /// The latest-record read and the insert share one transaction, so two
  /// writers cannot both observe the same prior state.
  fn record_toggle(
    &self,
    handle: Handle,
  ) -> impl Future<Output = Result<AttendanceRecord, Self::Error>> + Send + '_;

  // ── Templates ─────────────────────────────────────────────────────────

  /// Overwrite the template blob for `handle` in a single update.
  ///
  /// Returns the number of identity rows updated: `0` when the handle does
  /// not exist, which is not an error.
  fn save_template(
    &self,
    handle: Handle,
    template: Vec<u8>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// The stored template blob, if the identity exists and has one.
  fn template(
    &self,
    handle: Handle,
  ) -> impl Future<Output = Result<Option<Vec<u8>>, Self::Error>> + Send + '_;
}
