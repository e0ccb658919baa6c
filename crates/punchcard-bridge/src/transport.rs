//! The seam between the broker connection and the worker.
//!
//! Inbound messages arrive on a channel in delivery order; responses go out
//! through a [`Publisher`]. Neither side carries business logic.

use std::future::Future;

use bytes::Bytes;

use crate::Result;

/// One message received on a subscribed topic.
#[derive(Debug, Clone)]
pub struct InboundMessage {
  pub topic:   String,
  pub payload: Bytes,
}

/// Fire-and-forget publishing. No delivery acknowledgement is tracked.
pub trait Publisher: Send + Sync {
  fn publish(
    &self,
    topic: &str,
    payload: Vec<u8>,
  ) -> impl Future<Output = Result<()>> + Send;
}
