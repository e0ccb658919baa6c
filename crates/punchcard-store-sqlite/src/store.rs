//! [`SqliteStore`] — the SQLite implementation of [`AttendanceStore`].

use std::path::Path;

use chrono::Utc;
use punchcard_core::{
  attendance::{Action, AttendanceRecord, next_action},
  identity::{Handle, Identity},
  store::AttendanceStore,
};
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior};

use crate::{
  Error, Result,
  encode::{RECORD_COLUMNS, decode_dt, encode_dt, identity_from_row, record_from_row},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An attendance store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  pub(crate) async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

fn latest_in(conn: &Connection, handle: Handle) -> rusqlite::Result<Option<AttendanceRecord>> {
  conn.query_row(
    &format!(
      "SELECT {RECORD_COLUMNS} FROM attendance_records
       WHERE identity_handle = ?1
       ORDER BY recorded_at DESC, id DESC
       LIMIT 1"
    ),
    rusqlite::params![handle],
    record_from_row,
  )
  .optional()
}

/// Newest timestamp across all identities; answered from
/// `attendance_recorded_idx`.
pub(crate) const NEWEST_RECORDED_AT: &str = "SELECT MAX(recorded_at) FROM attendance_records";

/// Append one record. Callers run this inside an open transaction.
///
/// The timestamp is clamped to the newest existing one so `recorded_at`
/// never decreases in insert order, even if the wall clock steps back.
fn insert_in(
  conn: &Connection,
  handle: Handle,
  action: Action,
) -> rusqlite::Result<AttendanceRecord> {
  let now = encode_dt(Utc::now());
  let newest: Option<String> = conn.query_row(NEWEST_RECORDED_AT, [], |r| r.get(0))?;
  let recorded_at = match newest {
    Some(newest) if newest > now => newest,
    _ => now,
  };

  conn.execute(
    "INSERT INTO attendance_records (identity_handle, action, recorded_at)
     VALUES (?1, ?2, ?3)",
    rusqlite::params![handle, action.as_str(), recorded_at],
  )?;

  Ok(AttendanceRecord {
    id: conn.last_insert_rowid(),
    handle,
    action,
    recorded_at: decode_dt(&recorded_at, 3)?,
  })
}

// ─── AttendanceStore impl ────────────────────────────────────────────────────

impl AttendanceStore for SqliteStore {
  type Error = Error;

  // ── Identities ────────────────────────────────────────────────────────────

  async fn find_identity(&self, handle: Handle) -> Result<Option<Identity>> {
    let identity = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT i.handle, i.name, r.name AS role, d.name AS department, i.room
             FROM identities i
             LEFT JOIN roles       r ON i.role_id       = r.id
             LEFT JOIN departments d ON i.department_id = d.id
             WHERE i.handle = ?1",
            rusqlite::params![handle],
            identity_from_row,
          )
          .optional()?)
      })
      .await?;
    Ok(identity)
  }

  // ── Attendance ────────────────────────────────────────────────────────────

  async fn latest_record(&self, handle: Handle) -> Result<Option<AttendanceRecord>> {
    let record = self
      .conn
      .call(move |conn| Ok(latest_in(conn, handle)?))
      .await?;
    Ok(record)
  }

  async fn history(&self, handle: Handle) -> Result<Vec<AttendanceRecord>> {
    let records = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {RECORD_COLUMNS} FROM attendance_records
           WHERE identity_handle = ?1
           ORDER BY recorded_at ASC, id ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![handle], record_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(records)
  }

  async fn record_action(&self, handle: Handle, action: Action) -> Result<AttendanceRecord> {
    let record = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let record = insert_in(&tx, handle, action)?;
        tx.commit()?;
        Ok(record)
      })
      .await?;
    Ok(record)
  }

  async fn record_toggle(&self, handle: Handle) -> Result<AttendanceRecord> {
    // IMMEDIATE takes the write lock before the read, so another process
    // cannot slip an insert between the two.
    let record = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let latest = latest_in(&tx, handle)?;
        let record = insert_in(&tx, handle, next_action(latest.as_ref()))?;
        tx.commit()?;
        Ok(record)
      })
      .await?;
    Ok(record)
  }

  // ── Templates ─────────────────────────────────────────────────────────────

  async fn save_template(&self, handle: Handle, template: Vec<u8>) -> Result<usize> {
    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE identities SET template_blob = ?1 WHERE handle = ?2",
          rusqlite::params![template, handle],
        )?)
      })
      .await?;
    Ok(updated)
  }

  async fn template(&self, handle: Handle) -> Result<Option<Vec<u8>>> {
    let blob: Option<Option<Vec<u8>>> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT template_blob FROM identities WHERE handle = ?1",
            rusqlite::params![handle],
            |row| row.get(0),
          )
          .optional()?)
      })
      .await?;
    Ok(blob.flatten())
  }
}
