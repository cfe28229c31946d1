//! Single-slot overlay store shared by every mounted lifecycle driver.
//!
//! The store only records intent: whether the overlay should be open and which
//! payload it should show. It never inspects the payload and never schedules
//! anything; staging the visual transition is the driver's job.
//!
//! Calling [`OverlayStore::open`] while the overlay is open (or while a
//! replacement is already waiting on an exit) parks the payload in a
//! one-element pending slot and closes the current one. The slot is
//! last-caller-wins: a newer payload silently replaces an older one.
//!
//! The store counts drivers that are running an exit transition. The slot is
//! promoted once that count drops to zero, whether the last exit finished or
//! its driver was unmounted. With no driver exiting, promotion is immediate.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::observer::{Observers, Subscription};


/// Which overlay surface a store backs. Used for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayKind {
	/// Full-screen dialog.
	Dialog,
	/// Bottom sheet with drag-to-dismiss.
	Panel,
}

impl fmt::Display for OverlayKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Dialog => "dialog",
			Self::Panel => "panel",
		})
	}
}

/// Snapshot handed to subscribers on every mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayState<C> {
	pub is_open: bool,
	/// Left in place on close so the exit transition can keep rendering it.
	pub content: Option<C>,
}

impl<C> Default for OverlayState<C> {
	fn default() -> Self {
		Self {
			is_open: false,
			content: None,
		}
	}
}

struct Slots<C> {
	state: OverlayState<C>,
	pending: Option<C>,
	/// Drivers currently in their closing phase.
	exiting: usize,
}

struct Shared<C> {
	kind: OverlayKind,
	slots: Mutex<Slots<C>>,
	observers: Observers<OverlayState<C>>,
}

/// Cloneable handle to one overlay's process-wide state.
pub struct OverlayStore<C> {
	shared: Arc<Shared<C>>,
}

impl<C> Clone for OverlayStore<C> {
	fn clone(&self) -> Self {
		Self {
			shared: Arc::clone(&self.shared),
		}
	}
}

impl<C> fmt::Debug for OverlayStore<C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let slots = self.shared.slots.lock();
		f.debug_struct("OverlayStore")
			.field("kind", &self.shared.kind)
			.field("is_open", &slots.state.is_open)
			.field("has_content", &slots.state.content.is_some())
			.field("has_pending", &slots.pending.is_some())
			.finish()
	}
}

impl<C> OverlayStore<C>
where
	C: Clone + Send + Sync + 'static,
{
	pub fn new(kind: OverlayKind) -> Self {
		Self {
			shared: Arc::new(Shared {
				kind,
				slots: Mutex::new(Slots {
					state: OverlayState::default(),
					pending: None,
					exiting: 0,
				}),
				observers: Observers::new(),
			}),
		}
	}

	pub fn kind(&self) -> OverlayKind {
		self.shared.kind
	}

	/// Opens the overlay with `content`, or queues it behind the current one.
	pub fn open(&self, content: C) {
		let kind = self.shared.kind;
		let snapshot = {
			let mut slots = self.shared.slots.lock();
			if slots.state.is_open {
				slots.pending = Some(content);
				slots.state.is_open = false;
				tracing::debug!(%kind, "overlay closing to make room for pending content");
			} else if slots.pending.is_some() && slots.exiting > 0 {
				// An exit is already in flight; the new payload rides on it.
				slots.pending = Some(content);
				tracing::debug!(%kind, "pending overlay content replaced");
				return;
			} else {
				slots.pending = None;
				slots.state.is_open = true;
				slots.state.content = Some(content);
				tracing::debug!(%kind, "overlay opened");
			}
			slots.state.clone()
		};
		self.shared.observers.emit(&snapshot);
		self.promote_if_idle();
	}

	/// Closes the overlay. Content stays in place for the exit transition.
	pub fn close(&self) {
		let snapshot = {
			let mut slots = self.shared.slots.lock();
			if !slots.state.is_open {
				return;
			}
			slots.state.is_open = false;
			slots.state.clone()
		};
		tracing::debug!(kind = %self.shared.kind, "overlay closed");
		self.shared.observers.emit(&snapshot);
	}

	/// Registers `callback` for every future mutation.
	pub fn subscribe<F>(&self, callback: F) -> Subscription
	where
		F: Fn(&OverlayState<C>) + Send + Sync + 'static,
	{
		self.shared.observers.subscribe(callback)
	}

	pub fn subscriber_count(&self) -> usize {
		self.shared.observers.len()
	}

	pub fn snapshot(&self) -> OverlayState<C> {
		self.shared.slots.lock().state.clone()
	}

	pub fn is_open(&self) -> bool {
		self.shared.slots.lock().state.is_open
	}

	pub fn has_pending(&self) -> bool {
		self.shared.slots.lock().pending.is_some()
	}

	/// Removes and returns the pending payload without opening it.
	pub fn take_pending(&self) -> Option<C> {
		self.shared.slots.lock().pending.take()
	}

	/// Opens the store with the pending payload, if any. Returns whether a
	/// payload was promoted; a given payload is promoted at most once.
	pub fn promote_pending(&self) -> bool {
		self.promote_where(|_| true)
	}

	/// Promotes the pending payload unless the store is open or a driver is
	/// still running its exit transition.
	pub(crate) fn promote_if_idle(&self) -> bool {
		self.promote_where(|slots| !slots.state.is_open && slots.exiting == 0)
	}

	/// Records that a driver started its exit transition.
	pub(crate) fn begin_exit(&self) {
		self.shared.slots.lock().exiting += 1;
	}

	/// Records that a driver left its exit transition by reopening.
	pub(crate) fn abort_exit(&self) {
		let mut slots = self.shared.slots.lock();
		slots.exiting = slots.exiting.saturating_sub(1);
	}

	/// Records that a driver finished (or abandoned) its exit transition, and
	/// promotes the pending payload if that was the last one.
	pub(crate) fn finish_exit(&self) -> bool {
		self.abort_exit();
		self.promote_if_idle()
	}

	fn promote_where(&self, ready: impl FnOnce(&Slots<C>) -> bool) -> bool {
		let snapshot = {
			let mut slots = self.shared.slots.lock();
			if !ready(&*slots) {
				return false;
			}
			let Some(next) = slots.pending.take() else {
				return false;
			};
			slots.state.is_open = true;
			slots.state.content = Some(next);
			slots.state.clone()
		};
		tracing::debug!(kind = %self.shared.kind, "pending overlay content promoted");
		self.shared.observers.emit(&snapshot);
		true
	}

	/// Returns true when both handles point at the same store.
	pub fn same_store(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.shared, &other.shared)
	}
}
