//! MQTT transport built on [`rumqttc`].
//!
//! A background task drives the client event loop: it subscribes to every
//! scan topic on each (re)connection and forwards incoming publishes into a
//! bounded channel. When the channel is full the task waits, and the event
//! loop is not polled meanwhile: no keep-alive pings go out, so a worker
//! stalled for longer than about 1.5x the keep-alive interval gets the
//! connection dropped by the broker. The clean session then loses whatever
//! was in flight, and the task reconnects once the channel has room again.
//!
//! After the worker closes the channel, incoming publishes are discarded but
//! the loop keeps running so queued responses still go out. It stops once
//! [`MqttPublisher::disconnect`] has been written to the broker.

use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, Publish, QoS};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  config::MqttConfig,
  transport::{InboundMessage, Publisher},
};

/// Requests the client may queue before `publish` waits on the event loop.
const CLIENT_CAPACITY: usize = 16;

/// Publishes responses at QoS 0.
#[derive(Clone)]
pub struct MqttPublisher {
  client: AsyncClient,
}

impl Publisher for MqttPublisher {
  async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()> {
    self
      .client
      .publish(topic, QoS::AtMostOnce, false, payload)
      .await
      .map_err(|e| Error::Publish(Box::new(e)))
  }
}

impl MqttPublisher {
  /// Queue a DISCONNECT behind any pending publishes.
  pub async fn disconnect(&self) -> Result<()> {
    self.client.disconnect().await.map_err(|e| Error::Publish(Box::new(e)))
  }
}

/// A live broker connection.
pub struct MqttTransport {
  pub publisher: MqttPublisher,
  pub inbound:   mpsc::Receiver<InboundMessage>,
  /// The event-loop task. It ends after [`MqttPublisher::disconnect`] is
  /// sent; abort it if the broker is unreachable.
  pub pump:      JoinHandle<()>,
}

impl MqttTransport {
  /// Start the client and its event loop. The connection itself is made
  /// lazily by the event loop, so this never waits on the network.
  pub fn connect(cfg: &MqttConfig, channel_capacity: usize) -> Result<Self> {
    let qos = cfg.subscribe_qos()?;

    let mut options = MqttOptions::new(&cfg.client_id, &cfg.host, cfg.port);
    options.set_keep_alive(Duration::from_secs(cfg.keep_alive_secs.max(5)));

    let (client, eventloop) = AsyncClient::new(options, CLIENT_CAPACITY);
    let (tx, inbound) = mpsc::channel(channel_capacity.max(1));

    info!(host = %cfg.host, port = cfg.port, "connecting to MQTT broker");
    let pump = tokio::spawn(pump(
      client.clone(),
      eventloop,
      cfg.scan_topics.clone(),
      qos,
      Duration::from_millis(cfg.reconnect_delay_ms),
      tx,
    ));

    Ok(Self { publisher: MqttPublisher { client }, inbound, pump })
  }
}

async fn pump(
  client: AsyncClient,
  mut eventloop: EventLoop,
  topics: Vec<String>,
  qos: QoS,
  reconnect_delay: Duration,
  tx: mpsc::Sender<InboundMessage>,
) {
  loop {
    match eventloop.poll().await {
      Ok(Event::Incoming(Packet::ConnAck(ack))) => {
        info!(code = ?ack.code, "MQTT connected");
        // `try_subscribe` only queues the request; the awaiting variant could
        // block on the very event loop that has to drain it.
        for topic in &topics {
          match client.try_subscribe(topic.as_str(), qos) {
            Ok(()) => info!(%topic, "subscribed"),
            Err(e) => warn!(%topic, error = %e, "subscribe failed"),
          }
        }
      }
      Ok(Event::Incoming(Packet::Publish(Publish { topic, payload, .. }))) => {
        debug!(%topic, bytes = payload.len(), "message arrived");
        if tx.send(InboundMessage { topic, payload }).await.is_err() {
          debug!("inbound channel closed; message discarded");
        }
      }
      Ok(Event::Outgoing(Outgoing::Disconnect)) => {
        info!("MQTT disconnected");
        return;
      }
      Ok(_) => {}
      Err(e) => {
        warn!(error = %e, delay = ?reconnect_delay, "MQTT connection error; retrying");
        tokio::time::sleep(reconnect_delay).await;
      }
    }
  }
}
