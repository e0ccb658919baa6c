//! Error types for `punchcard-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The payload was not JSON, matched no known event shape, or lacked a
  /// required field for the shape it matched.
  #[error("malformed event: {0}")]
  MalformedEvent(String),

  #[error("unknown attendance action: {0:?}")]
  UnknownAction(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
