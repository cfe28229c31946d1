//! Timing and geometry knobs for overlays, loadable from TOML.
//!
//! Every field has a default matching the stock animation timings, so an
//! empty document (or a missing section) is a valid configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::error::ConfigError;

fn millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
	D: Deserializer<'de>,
{
	u64::deserialize(deserializer).map(Duration::from_millis)
}

/// Staging delays shared by the dialog and panel drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverlayTimings {
	/// Gap between mounting the container and animating it in.
	#[serde(rename = "mount_delay_ms", deserialize_with = "millis")]
	pub mount_delay: Duration,
	/// Length of the exit transition before the container unmounts.
	#[serde(rename = "exit_delay_ms", deserialize_with = "millis")]
	pub exit_delay: Duration,
}

impl Default for OverlayTimings {
	fn default() -> Self {
		Self {
			mount_delay: Duration::from_millis(10),
			exit_delay: Duration::from_millis(300),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotificationConfig {
	/// Maximum number of entries held at once.
	pub capacity: usize,
	#[serde(rename = "mount_delay_ms", deserialize_with = "millis")]
	pub mount_delay: Duration,
	/// How long an entry stays before it dismisses itself.
	#[serde(rename = "display_ms", deserialize_with = "millis")]
	pub display: Duration,
	#[serde(rename = "removal_delay_ms", deserialize_with = "millis")]
	pub removal_delay: Duration,
	/// Vertical distance between consecutive entries.
	pub stack_spacing: f32,
}

impl Default for NotificationConfig {
	fn default() -> Self {
		Self {
			capacity: 3,
			mount_delay: Duration::from_millis(10),
			display: Duration::from_millis(3000),
			removal_delay: Duration::from_millis(300),
			stack_spacing: 72.0,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DragConfig {
	/// Release offset that must be strictly exceeded to dismiss.
	pub dismiss_threshold: f32,
}

impl Default for DragConfig {
	fn default() -> Self {
		Self {
			dismiss_threshold: 150.0,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverlayConfig {
	pub overlay: OverlayTimings,
	pub notifications: NotificationConfig,
	pub drag: DragConfig,
}

impl OverlayConfig {
	pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(source)?;
		config.validate()?;
		Ok(config)
	}

	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		let config = Self::from_toml_str(&source)?;
		tracing::debug!(path = %path.display(), "loaded overlay configuration");
		Ok(config)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.notifications.capacity == 0 {
			return Err(ConfigError::Invalid(
				"notifications.capacity must be at least 1".into(),
			));
		}
		let spacing = self.notifications.stack_spacing;
		if !spacing.is_finite() {
			return Err(ConfigError::Invalid(format!(
				"notifications.stack_spacing must be finite, got {spacing}"
			)));
		}
		let threshold = self.drag.dismiss_threshold;
		if !threshold.is_finite() || threshold < 0.0 {
			return Err(ConfigError::Invalid(format!(
				"drag.dismiss_threshold must be a non-negative number, got {threshold}"
			)));
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use std::io::Write;

	use super::*;

	#[test]
	fn empty_document_yields_defaults() {
		let config = OverlayConfig::from_toml_str("").unwrap();
		assert_eq!(config, OverlayConfig::default());
		assert_eq!(config.notifications.capacity, 3);
		assert_eq!(config.notifications.display, Duration::from_millis(3000));
		assert_eq!(config.drag.dismiss_threshold, 150.0);
	}

	#[test]
	fn partial_sections_keep_remaining_defaults() {
		let config = OverlayConfig::from_toml_str(
			r#"
			[overlay]
			exit_delay_ms = 450

			[notifications]
			capacity = 5
			"#,
		)
		.unwrap();

		assert_eq!(config.overlay.exit_delay, Duration::from_millis(450));
		assert_eq!(config.overlay.mount_delay, Duration::from_millis(10));
		assert_eq!(config.notifications.capacity, 5);
		assert_eq!(config.notifications.removal_delay, Duration::from_millis(300));
	}

	#[test]
	fn unknown_fields_are_rejected() {
		let err = OverlayConfig::from_toml_str("[drag]\nthreshold = 3.0\n").unwrap_err();
		assert!(matches!(err, ConfigError::Parse(_)), "got {err:?}");
	}

	#[test]
	fn zero_capacity_is_invalid() {
		let err = OverlayConfig::from_toml_str("[notifications]\ncapacity = 0\n").unwrap_err();
		assert!(matches!(err, ConfigError::Invalid(_)), "got {err:?}");
	}

	#[test]
	fn negative_threshold_is_invalid() {
		let err = OverlayConfig::from_toml_str("[drag]\ndismiss_threshold = -1.0\n").unwrap_err();
		assert!(err.to_string().contains("dismiss_threshold"));
	}

	#[test]
	fn load_reads_file_and_reports_missing_path() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[notifications]\ndisplay_ms = 1200").unwrap();
		let config = OverlayConfig::load(file.path()).unwrap();
		assert_eq!(config.notifications.display, Duration::from_millis(1200));

		let missing = file.path().with_extension("missing");
		let err = OverlayConfig::load(&missing).unwrap_err();
		assert!(matches!(err, ConfigError::Io { .. }), "got {err:?}");
	}
}
