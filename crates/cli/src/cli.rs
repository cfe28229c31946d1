use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "scrim")]
#[command(about = "Replay scripted overlay scenarios and inspect their transitions")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Verbose logging (debug level unless RUST_LOG is set)
	#[arg(short, long, global = true)]
	pub verbose: bool,

	/// Subcommand to execute.
	#[command(subcommand)]
	pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
	/// Replay a scenario script and print the observed transitions
	Replay {
		/// Scenario script (TOML)
		#[arg(value_name = "SCRIPT")]
		script: PathBuf,

		/// Overlay timing configuration (TOML)
		#[arg(short, long, value_name = "PATH")]
		config: Option<PathBuf>,

		/// Run against the wall clock instead of jumping between deadlines
		#[arg(long)]
		realtime: bool,
	},
	/// Validate an overlay configuration file
	CheckConfig {
		/// Configuration file to validate
		#[arg(value_name = "PATH")]
		path: PathBuf,
	},
}
