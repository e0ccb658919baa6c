//! punchcard bridge binary.
//!
//! Reads `punchcard.toml` (or the path given with `--config`), opens the
//! SQLite store, connects to the MQTT broker and serves scan events until
//! interrupted.

use std::{path::PathBuf, time::Duration};

use anyhow::Context as _;
use clap::Parser;
use punchcard_bridge::{BridgeConfig, Reconciler, mqtt::MqttTransport, worker};
use punchcard_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// How long queued responses get to reach the broker on shutdown.
const DISCONNECT_GRACE: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(author, version, about = "Fingerprint scanner to attendance store bridge")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "punchcard.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let cfg = BridgeConfig::load(&cli.config).context("failed to load configuration")?;

  let store_path = cfg.resolved_store_path();
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  tracing::info!(path = ?store_path, "store opened");

  let reconciler = Reconciler::new(store);

  let MqttTransport { publisher, mut inbound, mut pump } =
    MqttTransport::connect(&cfg.mqtt, cfg.channel_capacity)
      .context("failed to start MQTT client")?;

  let shutdown = async {
    match tokio::signal::ctrl_c().await {
      Ok(()) => tracing::info!("shutting down"),
      Err(e) => {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
      }
    }
  };
  worker::run(&reconciler, &mut inbound, &publisher, &cfg.mqtt.response_topic, shutdown).await;

  // Flush the responses produced while draining, then leave the broker.
  let flushed = tokio::time::timeout(DISCONNECT_GRACE, async {
    if let Err(e) = publisher.disconnect().await {
      tracing::warn!(error = %e, "failed to queue MQTT disconnect");
    }
    let _ = (&mut pump).await;
  })
  .await;
  if flushed.is_err() {
    tracing::warn!("MQTT disconnect timed out");
    pump.abort();
  }
  Ok(())
}
