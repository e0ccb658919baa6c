//! Runtime configuration, deserialised from `punchcard.toml` and the
//! environment.
//!
//! Environment variables use the `PUNCHCARD_` prefix and `__` between nested
//! keys, e.g. `PUNCHCARD_MQTT__HOST=10.0.0.2`. `PUNCHCARD_MQTT__SCAN_TOPICS`
//! takes a comma-separated list.

use std::path::{Path, PathBuf};

use config::{ConfigError, Environment, File, Source};
use rumqttc::QoS;
use serde::Deserialize;

use crate::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
  pub mqtt:             MqttConfig,
  /// SQLite database file; a leading `~/` is expanded.
  pub store_path:       PathBuf,
  /// Inbound messages buffered while the worker is busy.
  pub channel_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
  pub host:               String,
  pub port:               u16,
  pub client_id:          String,
  pub keep_alive_secs:    u64,
  pub scan_topics:        Vec<String>,
  pub response_topic:     String,
  pub subscribe_qos:      u8,
  pub reconnect_delay_ms: u64,
}

impl Default for BridgeConfig {
  fn default() -> Self {
    Self {
      mqtt:             MqttConfig::default(),
      store_path:       PathBuf::from("punchcard.db"),
      channel_capacity: 64,
    }
  }
}

impl Default for MqttConfig {
  fn default() -> Self {
    Self {
      host:               "localhost".into(),
      port:               1883,
      client_id:          "punchcard-bridge".into(),
      keep_alive_secs:    60,
      scan_topics:        vec!["fingerprint/scan".into()],
      response_topic:     "fingerprint/access".into(),
      subscribe_qos:      1,
      reconnect_delay_ms: 2000,
    }
  }
}

impl BridgeConfig {
  /// Load from an optional TOML file, overridden by `PUNCHCARD_*` variables.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Self::from_sources(File::from(path).required(false), environment())
  }

  fn from_sources<S>(file: S, env: Environment) -> Result<Self, ConfigError>
  where
    S: Source + Send + Sync + 'static,
  {
    config::Config::builder()
      .add_source(file)
      .add_source(env)
      .build()?
      .try_deserialize()
  }

  /// `store_path` with a leading `~/` expanded to `$HOME`.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

impl MqttConfig {
  pub fn subscribe_qos(&self) -> Result<QoS> {
    match self.subscribe_qos {
      0 => Ok(QoS::AtMostOnce),
      1 => Ok(QoS::AtLeastOnce),
      2 => Ok(QoS::ExactlyOnce),
      other => Err(Error::InvalidQos(other)),
    }
  }
}

/// `PUNCHCARD_*` variables, with `__` between nested keys.
fn environment() -> Environment {
  Environment::with_prefix("PUNCHCARD")
    .prefix_separator("_")
    .separator("__")
    .try_parsing(true)
    .list_separator(",")
    .with_list_parse_key("mqtt.scan_topics")
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
