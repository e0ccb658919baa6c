//! The event reconciler: one inbound payload in, one response out.
//!
//! Stateless across messages; all state lives in the store. Every failure is
//! caught in [`Reconciler::handle`] and turned into a response, so no error
//! crosses a message boundary.

use punchcard_core::{
  attendance::Action,
  event::ScanEvent,
  identity::{Handle, Identity},
  response::{ResponsePayload, USER_NOT_FOUND, USER_NOT_FOUND_IN_DATABASE},
  store::AttendanceStore,
};
use tracing::{debug, error, info, warn};

use crate::{Error, Result};

pub struct Reconciler<S> {
  store: S,
}

impl<S: AttendanceStore> Reconciler<S> {
  pub fn new(store: S) -> Self { Self { store } }

  pub fn store(&self) -> &S { &self.store }

  /// Reconcile one raw payload. Always yields exactly one response.
  pub async fn handle(&self, payload: &[u8]) -> ResponsePayload {
    debug!(payload = %String::from_utf8_lossy(payload), "event received");

    match self.reconcile(payload).await {
      Ok(response) => response,
      Err(Error::Malformed(e)) => {
        warn!(error = %e, "rejecting malformed event");
        ResponsePayload::malformed_event(e.to_string())
      }
      Err(e) => ResponsePayload::system_error(e),
    }
  }

  async fn reconcile(&self, payload: &[u8]) -> Result<ResponsePayload> {
    let event = ScanEvent::parse(payload)?;

    let outcome = match &event {
      ScanEvent::Enrollment { handle, template } => self.enroll(*handle, template).await,
      ScanEvent::ConfidenceScan { handle, confidence } => {
        self.scan(*handle, *confidence).await
      }
      ScanEvent::ExplicitAction { handle, action } => {
        self.explicit(*handle, *action).await
      }
    };

    outcome.inspect_err(|e| {
      error!(
        kind = event.kind(),
        handle = event.handle(),
        error = %e,
        "storage failure; event dropped"
      );
    })
  }

  async fn enroll(&self, handle: Handle, encoded: &str) -> Result<ResponsePayload> {
    let bytes = match punchcard_template::decode(encoded) {
      Ok(bytes) => bytes,
      Err(e) => {
        warn!(handle, error = %e, "template rejected");
        return Ok(ResponsePayload::template_rejected(handle, e.to_string()));
      }
    };

    let length = bytes.len();
    debug!(handle, length, preview = ?punchcard_template::preview(&bytes), "template decoded");

    let updated = self
      .store
      .save_template(handle, bytes)
      .await
      .map_err(Error::storage)?;
    if updated == 0 {
      // Accepted anyway: the identity may not be provisioned yet.
      warn!(handle, "template saved for unknown handle; no identity updated");
    } else {
      info!(handle, length, "template saved");
    }

    Ok(ResponsePayload::template_saved(handle, length))
  }

  async fn scan(&self, handle: Handle, confidence: f64) -> Result<ResponsePayload> {
    let Some(identity) = self.lookup(handle).await? else {
      return Ok(ResponsePayload::access_denied(USER_NOT_FOUND_IN_DATABASE));
    };

    let record = self
      .store
      .record_toggle(handle)
      .await
      .map_err(Error::storage)?;

    info!(
      handle,
      confidence,
      name = %identity.name,
      role = identity.role_or_default(),
      department = identity.department.as_deref().unwrap_or("-"),
      action = %record.action,
      "access granted"
    );
    Ok(ResponsePayload::access_granted(&identity, record.action))
  }

  async fn explicit(
    &self,
    handle: Handle,
    action: Action,
  ) -> Result<ResponsePayload> {
    let Some(identity) = self.lookup(handle).await? else {
      return Ok(ResponsePayload::action_error(USER_NOT_FOUND));
    };

    self
      .store
      .record_action(handle, action)
      .await
      .map_err(Error::storage)?;

    info!(handle, name = %identity.name, %action, "attendance logged");
    Ok(ResponsePayload::action_success(&identity, action))
  }

  async fn lookup(&self, handle: Handle) -> Result<Option<Identity>> {
    let identity = self
      .store
      .find_identity(handle)
      .await
      .map_err(Error::storage)?;
    if identity.is_none() {
      info!(handle, "unknown handle");
    }
    Ok(identity)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicBool, Ordering};

  use punchcard_core::attendance::AttendanceRecord;
  use punchcard_store_sqlite::{NewIdentity, SqliteStore};
  use serde_json::{Value, json};

  use super::*;

  async fn seeded() -> SqliteStore {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let role = store.add_role("Student").await.unwrap();
    store
      .add_identity(NewIdentity {
        role_id: Some(role),
        room: Some("A-101".into()),
        ..NewIdentity::new(5, "Hoang Van E")
      })
      .await
      .unwrap();
    store.add_identity(NewIdentity::new(7, "Do Thi F")).await.unwrap();
    store
  }

  async fn reconciler() -> Reconciler<SqliteStore> { Reconciler::new(seeded().await) }

  async fn handle_json(r: &Reconciler<impl AttendanceStore>, payload: Value) -> Value {
    let response = r.handle(payload.to_string().as_bytes()).await;
    serde_json::from_slice(&response.to_json_bytes().unwrap()).unwrap()
  }

  // ─── Enrollment ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn enrollment_stores_decoded_template() {
    let r = reconciler().await;
    let response = handle_json(&r, json!({ "user_id": 7, "template": "AQIDBA==" })).await;

    assert_eq!(response, json!({ "result": "template_saved", "user_id": 7, "length": 4 }));
    assert_eq!(r.store().template(7).await.unwrap(), Some(vec![1, 2, 3, 4]));
  }

  #[tokio::test]
  async fn bad_template_is_rejected_without_persistence() {
    let r = reconciler().await;
    r.store().save_template(7, vec![42]).await.unwrap();

    for template in ["%%%", ""] {
      let response = handle_json(&r, json!({ "user_id": 7, "template": template })).await;
      assert_eq!(response["result"], "template_rejected");
      assert_eq!(response["user_id"], 7);
    }
    assert_eq!(r.store().template(7).await.unwrap(), Some(vec![42]));
  }

  #[tokio::test]
  async fn enrollment_for_unknown_handle_is_accepted() {
    let r = reconciler().await;
    let response = handle_json(&r, json!({ "user_id": 404, "template": "AQIDBA==" })).await;
    assert_eq!(response["result"], "template_saved");
    assert_eq!(r.store().template(404).await.unwrap(), None);
  }

  // ─── Confidence scans ──────────────────────────────────────────────────────

  #[tokio::test]
  async fn first_scan_checks_in() {
    let r = reconciler().await;
    let response = handle_json(&r, json!({ "fingerprint_id": 5, "confidence": 120 })).await;
    assert_eq!(
      response,
      json!({
        "result": "access_granted",
        "name": "Hoang Van E",
        "role": "Student",
        "status": "checkin",
      })
    );
  }

  #[tokio::test]
  async fn scans_alternate_and_default_role() {
    let r = reconciler().await;
    let mut statuses = Vec::new();
    for _ in 0..4 {
      let response = handle_json(&r, json!({ "fingerprint_id": 7, "confidence": 60 })).await;
      assert_eq!(response["role"], "Unknown");
      statuses.push(response["status"].as_str().unwrap().to_owned());
    }
    assert_eq!(statuses, ["checkin", "checkout", "checkin", "checkout"]);
    assert_eq!(r.store().history(7).await.unwrap().len(), 4);
  }

  #[tokio::test]
  async fn scan_after_checkout_checks_in() {
    let r = reconciler().await;
    r.store().record_action(5, Action::Checkin).await.unwrap();
    let t2 = r.store().record_action(5, Action::Checkout).await.unwrap();

    let response = handle_json(&r, json!({ "fingerprint_id": 5, "confidence": 99 })).await;
    assert_eq!(response["status"], "checkin");

    let history = r.store().history(5).await.unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[2].action, Action::Checkin);
    assert!(history[2].recorded_at >= t2.recorded_at);
  }

  #[tokio::test]
  async fn unknown_scan_is_denied_without_persistence() {
    let r = reconciler().await;
    let response = handle_json(&r, json!({ "fingerprint_id": 404, "confidence": 80 })).await;
    assert_eq!(
      response,
      json!({ "result": "access_denied", "message": "User not found in database" })
    );
    assert!(r.store().history(404).await.unwrap().is_empty());
  }

  // ─── Explicit actions ──────────────────────────────────────────────────────

  #[tokio::test]
  async fn explicit_action_is_recorded_verbatim() {
    let r = reconciler().await;
    let response =
      handle_json(&r, json!({ "user_id": 5, "check_type": "checkout" })).await;
    assert_eq!(
      response,
      json!({
        "status": "success",
        "user_name": "Hoang Van E",
        "role": "Student",
        "room": "A-101",
        "action": "checkout",
      })
    );
    let history = r.store().history(5).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].action, Action::Checkout);
  }

  #[tokio::test]
  async fn unknown_explicit_action_is_an_error() {
    let r = reconciler().await;
    let response =
      handle_json(&r, json!({ "user_id": 404, "check_type": "checkin" })).await;
    assert_eq!(response, json!({ "status": "error", "message": "User not found" }));
    assert!(r.store().history(404).await.unwrap().is_empty());
  }

  // ─── Malformed ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn malformed_payloads_fail_without_mutation() {
    let r = reconciler().await;
    let payloads: [&[u8]; 6] = [
      b"",
      b"\xff\xfe",
      b"[5]",
      br#"{"fingerprint_id": 5}"#,
      br#"{"user_id": 5, "check_type": "break"}"#,
      br#"{"device": "esp32"}"#,
    ];
    for payload in payloads {
      let response = r.handle(payload).await;
      assert!(!response.is_success());
      let value: Value = serde_json::from_slice(&response.to_json_bytes().unwrap()).unwrap();
      assert_eq!(value["result"], "malformed_event");
    }
    assert!(r.store().history(5).await.unwrap().is_empty());
    assert_eq!(r.store().template(5).await.unwrap(), None);

    // Still serving.
    let response = handle_json(&r, json!({ "fingerprint_id": 5, "confidence": 1 })).await;
    assert_eq!(response["result"], "access_granted");
  }

  // ─── Storage failures ──────────────────────────────────────────────────────

  #[derive(Debug, thiserror::Error)]
  enum FlakyError {
    #[error(transparent)]
    Sqlite(#[from] punchcard_store_sqlite::Error),
    #[error("connection to database lost")]
    Unreachable,
  }

  /// Delegates to SQLite, failing every write while `down` is set.
  struct FlakyStore {
    inner: SqliteStore,
    down:  AtomicBool,
  }

  impl FlakyStore {
    fn check(&self) -> Result<(), FlakyError> {
      if self.down.load(Ordering::SeqCst) {
        Err(FlakyError::Unreachable)
      } else {
        Ok(())
      }
    }
  }

  impl AttendanceStore for FlakyStore {
    type Error = FlakyError;

    async fn find_identity(&self, handle: Handle) -> Result<Option<Identity>, FlakyError> {
      Ok(self.inner.find_identity(handle).await?)
    }

    async fn latest_record(
      &self,
      handle: Handle,
    ) -> Result<Option<AttendanceRecord>, FlakyError> {
      Ok(self.inner.latest_record(handle).await?)
    }

    async fn history(&self, handle: Handle) -> Result<Vec<AttendanceRecord>, FlakyError> {
      Ok(self.inner.history(handle).await?)
    }

    async fn record_action(
      &self,
      handle: Handle,
      action: Action,
    ) -> Result<AttendanceRecord, FlakyError> {
      self.check()?;
      Ok(self.inner.record_action(handle, action).await?)
    }

    async fn record_toggle(&self, handle: Handle) -> Result<AttendanceRecord, FlakyError> {
      self.check()?;
      Ok(self.inner.record_toggle(handle).await?)
    }

    async fn save_template(&self, handle: Handle, template: Vec<u8>) -> Result<usize, FlakyError> {
      self.check()?;
      Ok(self.inner.save_template(handle, template).await?)
    }

    async fn template(&self, handle: Handle) -> Result<Option<Vec<u8>>, FlakyError> {
      Ok(self.inner.template(handle).await?)
    }
  }

  #[tokio::test]
  async fn storage_failure_yields_system_error_and_worker_recovers() {
    let r = Reconciler::new(FlakyStore { inner: seeded().await, down: AtomicBool::new(true) });

    let response = handle_json(&r, json!({ "fingerprint_id": 5, "confidence": 70 })).await;
    assert_eq!(
      response,
      json!({ "result": "system_error", "message": "System error: connection to database lost" })
    );
    assert!(r.store().history(5).await.unwrap().is_empty());

    r.store().down.store(false, Ordering::SeqCst);

    let response = handle_json(&r, json!({ "fingerprint_id": 7, "confidence": 70 })).await;
    assert_eq!(response["result"], "access_granted");
    let response = handle_json(&r, json!({ "fingerprint_id": 5, "confidence": 70 })).await;
    assert_eq!(response["status"], "checkin");
  }
}
