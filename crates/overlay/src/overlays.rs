//! Startup-constructed bundle of the three process-wide overlay stores.

use crate::config::OverlayConfig;
use crate::driver::LifecycleDriver;
use crate::notify::NotificationList;
use crate::store::{OverlayKind, OverlayStore};
use crate::timeline::Timeline;

/// Dialog, panel, and notification stores sharing one timeline.
///
/// Construct one at startup and hand clones of the stores (or the whole
/// bundle) to whatever needs to present transient UI. Tests build a fresh
/// bundle per case instead of sharing hidden globals.
#[derive(Debug, Clone)]
pub struct Overlays<C> {
	pub dialog: OverlayStore<C>,
	pub panel: OverlayStore<C>,
	pub notifications: NotificationList,
	timeline: Timeline,
	config: OverlayConfig,
}

impl<C> Overlays<C>
where
	C: Clone + Send + Sync + 'static,
{
	pub fn new(config: OverlayConfig) -> Self {
		Self::with_timeline(Timeline::new(), config)
	}

	pub fn with_timeline(timeline: Timeline, config: OverlayConfig) -> Self {
		Self {
			dialog: OverlayStore::new(OverlayKind::Dialog),
			panel: OverlayStore::new(OverlayKind::Panel),
			notifications: NotificationList::new(&timeline, config.notifications),
			timeline,
			config,
		}
	}

	pub fn timeline(&self) -> &Timeline {
		&self.timeline
	}

	pub fn config(&self) -> &OverlayConfig {
		&self.config
	}

	pub fn mount_dialog(&self) -> LifecycleDriver<C> {
		LifecycleDriver::mount(&self.dialog, &self.timeline, self.config.overlay)
	}

	/// Mounts a panel driver with drag-to-dismiss attached.
	pub fn mount_panel(&self) -> LifecycleDriver<C> {
		LifecycleDriver::mount_draggable(
			&self.panel,
			&self.timeline,
			self.config.overlay,
			self.config.drag,
		)
	}
}

impl<C> Default for Overlays<C>
where
	C: Clone + Send + Sync + 'static,
{
	fn default() -> Self {
		Self::new(OverlayConfig::default())
	}
}
