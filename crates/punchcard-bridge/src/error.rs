//! Error type for the bridge.
//!
//! Event errors never leave [`Reconciler::handle`](crate::reconcile::Reconciler::handle);
//! they are turned into a response there. Publish errors are logged by the
//! worker loop.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Malformed(#[from] punchcard_core::Error),

  #[error("{0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("publish failed: {0}")]
  Publish(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("invalid MQTT QoS level {0}; expected 0, 1 or 2")]
  InvalidQos(u8),
}

impl Error {
  pub fn storage(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Storage(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
