//! The single-consumer processing loop.
//!
//! Messages are handled strictly one at a time, in delivery order. A slow
//! store stalls the loop; the bounded inbound channel then fills and the
//! transport stops reading.
//!
//! Shutdown closes the channel and drains it: an event already being handled
//! finishes, and every queued event still gets its response.

use std::future::Future;

use punchcard_core::store::AttendanceStore;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::{
  reconcile::Reconciler,
  transport::{InboundMessage, Publisher},
};

/// Run until the inbound channel is closed and empty, or until `shutdown`
/// resolves and the messages queued at that point are drained. Returns the
/// number of messages handled.
pub async fn run<S, P>(
  reconciler: &Reconciler<S>,
  inbound: &mut mpsc::Receiver<InboundMessage>,
  publisher: &P,
  response_topic: &str,
  shutdown: impl Future<Output = ()>,
) -> usize
where
  S: AttendanceStore,
  P: Publisher,
{
  let mut handled = 0;
  let mut draining = false;
  tokio::pin!(shutdown);

  loop {
    let message = tokio::select! {
      () = &mut shutdown, if !draining => {
        info!("shutdown requested; draining inbound channel");
        inbound.close();
        draining = true;
        continue;
      }
      message = inbound.recv() => message,
    };
    let Some(message) = message else { break };

    debug!(topic = %message.topic, "handling message");
    let response = reconciler.handle(&message.payload).await;
    handled += 1;

    let bytes = match response.to_json_bytes() {
      Ok(bytes) => bytes,
      Err(e) => {
        error!(error = %e, "failed to encode response");
        continue;
      }
    };
    if let Err(e) = publisher.publish(response_topic, bytes).await {
      error!(topic = response_topic, error = %e, "failed to publish response");
    }
  }

  info!(handled, "inbound channel closed");
  handled
}
