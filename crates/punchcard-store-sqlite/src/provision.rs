//! Administrative writes for identities and their reference tables.
//!
//! The bridge never calls these while serving events; they exist for seeding
//! a fresh database and for tests. Day-to-day provisioning belongs to the
//! user-management dashboard.

use punchcard_core::identity::Handle;

use crate::{Result, SqliteStore};

/// Input to [`SqliteStore::add_identity`].
#[derive(Debug, Clone)]
pub struct NewIdentity {
  pub handle:        Handle,
  pub name:          String,
  pub role_id:       Option<i64>,
  pub department_id: Option<i64>,
  pub room:          Option<String>,
}

impl NewIdentity {
  /// An identity with no role, department or room.
  pub fn new(handle: Handle, name: impl Into<String>) -> Self {
    Self {
      handle,
      name: name.into(),
      role_id: None,
      department_id: None,
      room: None,
    }
  }
}

impl SqliteStore {
  /// Insert a role and return its id.
  pub async fn add_role(&self, name: impl Into<String>) -> Result<i64> {
    self.insert_named("INSERT INTO roles (name) VALUES (?1)", name.into()).await
  }

  /// Insert a department and return its id.
  pub async fn add_department(&self, name: impl Into<String>) -> Result<i64> {
    self
      .insert_named("INSERT INTO departments (name) VALUES (?1)", name.into())
      .await
  }

  /// Insert an identity with no template.
  pub async fn add_identity(&self, identity: NewIdentity) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO identities (handle, name, role_id, department_id, room)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            identity.handle,
            identity.name,
            identity.role_id,
            identity.department_id,
            identity.room,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn insert_named(&self, sql: &'static str, name: String) -> Result<i64> {
    let id = self
      .conn
      .call(move |conn| {
        conn.execute(sql, rusqlite::params![name])?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(id)
  }
}
