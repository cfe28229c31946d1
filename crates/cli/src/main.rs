//! Scrim scenario runner.
//!
//! Replays a scripted sequence of overlay calls against the dialog, panel
//! and notification list and prints every transition a renderer would see.

mod cli;
mod replay;
mod script;

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use scrim_overlay::OverlayConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::replay::Replay;
use crate::script::Script;

/// Sampling interval for `--realtime` replays.
const FRAME: Duration = Duration::from_millis(16);

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();

	match cli.command {
		Command::Replay {
			script,
			config,
			realtime,
		} => {
			let config = match config {
				Some(path) => load_config(&path)?,
				None => OverlayConfig::default(),
			};
			let script = Script::load(&script)?;
			info!(steps = script.steps.len(), realtime, "replaying scenario");

			let replay = Replay::new(config);
			let events = if realtime {
				replay.run_realtime(&script, FRAME).await
			} else {
				replay.run(&script)
			};

			let mut out = std::io::stdout().lock();
			for event in &events {
				writeln!(out, "{event}")?;
			}
			for surface in ["dialog", "panel"] {
				let shown = replay::shown(&events, surface);
				if !shown.is_empty() {
					writeln!(out, "{surface} showed {}", shown.join(", "))?;
				}
			}
			info!(events = events.len(), "replay finished");
		}
		Command::CheckConfig { path } => {
			let config = load_config(&path)?;
			let mut out = std::io::stdout().lock();
			writeln!(out, "{}: ok", path.display())?;
			writeln!(
				out,
				"  overlay        mount {:?}, exit {:?}",
				config.overlay.mount_delay, config.overlay.exit_delay
			)?;
			writeln!(
				out,
				"  notifications  capacity {}, display {:?}, removal {:?}",
				config.notifications.capacity,
				config.notifications.display,
				config.notifications.removal_delay
			)?;
			writeln!(
				out,
				"  drag           dismiss past {}",
				config.drag.dismiss_threshold
			)?;
		}
	}

	Ok(())
}

fn load_config(path: &Path) -> anyhow::Result<OverlayConfig> {
	OverlayConfig::load(path).with_context(|| format!("failed to load config {}", path.display()))
}
