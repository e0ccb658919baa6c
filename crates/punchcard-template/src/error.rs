//! Error types for the punchcard-template codec.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("malformed template encoding: {0}")]
  Malformed(#[from] base64::DecodeError),

  #[error("template decodes to zero bytes")]
  Empty,

  #[error("payload has no \"template\" string")]
  MissingTemplate,

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
