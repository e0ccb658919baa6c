//! SQLite backend for the Punchcard attendance store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod provision;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use provision::NewIdentity;
pub use store::SqliteStore;
