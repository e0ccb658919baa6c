//! `punchcard-decode` — decode a scanner template offline.
//!
//! # Usage
//!
//! ```text
//! punchcard-decode '{"template": "AQIDBA=="}'
//! [1,2,3,4]
//! ```
//!
//! Exits 0 on success and 1 when the argument is missing, is not JSON, has
//! no `template` string, or the template does not decode.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, error::ErrorKind};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "punchcard-decode", about = "Decode a base64 fingerprint template")]
struct Args {
  /// JSON object carrying a base64 `template` key.
  payload: Option<String>,
}

fn main() -> ExitCode {
  // Diagnostics go to stderr; stdout carries only the decoded bytes.
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let args = match Args::try_parse() {
    Ok(args) => args,
    Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
    Err(e) => {
      eprintln!("{e}");
      return ExitCode::FAILURE;
    }
  };

  match run(args.payload.as_deref()) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      tracing::error!("{e:#}");
      ExitCode::FAILURE
    }
  }
}

fn run(payload: Option<&str>) -> Result<()> {
  let bytes = decode_arg(payload)?;
  tracing::info!(
    length = bytes.len(),
    preview = ?punchcard_template::preview(&bytes),
    "template decoded"
  );
  println!("{}", serde_json::to_string(&bytes).context("encoding output")?);
  Ok(())
}

fn decode_arg(payload: Option<&str>) -> Result<Vec<u8>> {
  let payload = payload.context(r#"expected one JSON argument, e.g. '{"template": "..."}'"#)?;
  punchcard_template::decode_payload(payload).context("could not decode template")
}
