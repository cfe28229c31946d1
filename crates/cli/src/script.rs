//! Scenario scripts: timestamped calls against the three overlays.
//!
//! ```toml
//! [[step]]
//! at_ms = 0
//! action = { kind = "dialog_open", content = "login" }
//!
//! [[step]]
//! at_ms = 120
//! action = { kind = "toast", message = "saved", variant = "success" }
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use scrim_overlay::Variant;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
	DialogOpen { content: String },
	DialogClose,
	PanelOpen { content: String },
	PanelClose,
	/// Drags the panel from `from` to `to` and releases.
	Drag { from: f32, to: f32 },
	Toast {
		message: String,
		#[serde(default)]
		variant: Variant,
	},
	Hide { id: u64 },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Step {
	pub at_ms: u64,
	pub action: Action,
}

impl Step {
	pub fn at(&self) -> Duration {
		Duration::from_millis(self.at_ms)
	}
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
	#[serde(default, rename = "step")]
	pub steps: Vec<Step>,
}

impl Script {
	pub fn parse(source: &str) -> anyhow::Result<Self> {
		let mut script: Self = toml::from_str(source).context("invalid scenario script")?;
		// Stable sort keeps same-instant steps in file order.
		script.steps.sort_by_key(|step| step.at_ms);
		Ok(script)
	}

	pub fn load(path: &Path) -> anyhow::Result<Self> {
		let source = std::fs::read_to_string(path)
			.with_context(|| format!("failed to read script {}", path.display()))?;
		Self::parse(&source).with_context(|| format!("in {}", path.display()))
	}
}
