//! MQTT-to-SQLite bridge for fingerprint attendance scanners.
//!
//! Scanners publish JSON events; the [`Reconciler`](reconcile::Reconciler)
//! turns each into at most one store write and exactly one response, which
//! the [`worker`] publishes back to the devices.

pub mod config;
pub mod error;
pub mod mqtt;
pub mod reconcile;
pub mod transport;
pub mod worker;

pub use config::{BridgeConfig, MqttConfig};
pub use error::{Error, Result};
pub use reconcile::Reconciler;
