use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading overlay configuration.
///
/// Runtime overlay operations never fail; misuse degrades to a no-op.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
	/// The configuration file could not be read.
	#[error("failed to read {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// The configuration is not valid TOML or has unexpected fields.
	#[error("invalid overlay configuration: {0}")]
	Parse(#[from] toml::de::Error),

	/// The configuration parsed but holds an unusable value.
	#[error("invalid configuration value: {0}")]
	Invalid(String),
}
