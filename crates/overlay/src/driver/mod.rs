//! Per-mount lifecycle state machine for dialog and panel overlays.
//!
//! A [`LifecycleDriver`] listens to an [`OverlayStore`] and turns its boolean
//! open/closed flips into four phases:
//!
//! ```text
//!            is_open          mount delay              !is_open           exit delay
//!   Closed ----------> Opening ----------> Open ----------------> Closing ----------> Closed
//!                         ^                                          |
//!                         +------------------ is_open ---------------+
//! ```
//!
//! Opening mounts the container first and only swaps in the content once the
//! mount delay elapses; closing animates out first and only unmounts after
//! the exit delay. The store's pending slot is promoted once the last
//! driver's exit completes or is abandoned by unmounting.
//!
//! Each driver keeps its own copy of the displayed content, so several
//! drivers mounted on one store never step on each other. Dropping a driver
//! cancels its timers and unsubscribes it.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::config::{DragConfig, OverlayTimings};
use crate::drag::{DragGesture, DragInput, DragOutcome, DragState};
use crate::observer::Subscription;
use crate::store::{OverlayState, OverlayStore};
use crate::timeline::{TimerHandle, TimerScope, Timeline};


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
	#[default]
	Closed,
	/// Mounted, waiting one mount delay before animating in.
	Opening,
	Open,
	/// Animating out; still mounted.
	Closing,
}

/// Direction of the enter/exit transition applied to the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Animation {
	In,
	#[default]
	Out,
}

/// What the rendering layer should draw for one driver right now.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayView<C> {
	pub phase: Phase,
	pub mounted: bool,
	pub animation: Animation,
	pub displayed: Option<C>,
	pub drag: Option<DragState>,
}

struct ViewState<C> {
	phase: Phase,
	mounted: bool,
	animation: Animation,
	displayed: Option<C>,
	phase_timer: Option<TimerHandle>,
	drag: Option<DragGesture>,
}

impl<C: Clone> ViewState<C> {
	fn cancel_phase_timer(&mut self) {
		if let Some(timer) = self.phase_timer.take() {
			timer.cancel();
		}
	}

	fn to_view(&self) -> OverlayView<C> {
		OverlayView {
			phase: self.phase,
			mounted: self.mounted,
			animation: self.animation,
			displayed: self.displayed.clone(),
			drag: self.drag.as_ref().map(DragGesture::state),
		}
	}
}

struct DriverShared<C> {
	store: OverlayStore<C>,
	timeline: Timeline,
	scope: TimerScope,
	timings: OverlayTimings,
	view: Mutex<ViewState<C>>,
}

impl<C> DriverShared<C>
where
	C: Clone + Send + Sync + 'static,
{
	fn on_store_change(self: &Arc<Self>, state: &OverlayState<C>) {
		if self.scope.is_cancelled() {
			return;
		}
		let kind = self.store.kind();
		let mut view = self.view.lock();
		match (state.is_open, view.phase) {
			(true, Phase::Closed | Phase::Closing) => {
				if view.phase == Phase::Closing {
					self.store.abort_exit();
				}
				view.cancel_phase_timer();
				view.phase = Phase::Opening;
				view.mounted = true;
				if let Some(drag) = view.drag.as_mut() {
					drag.reset();
				}
				view.phase_timer = Some(self.schedule(
					"overlay-mount",
					self.timings.mount_delay,
					Self::finish_opening,
				));
				tracing::debug!(%kind, "driver opening");
			}
			(false, Phase::Opening | Phase::Open) => {
				view.cancel_phase_timer();
				view.phase = Phase::Closing;
				view.animation = Animation::Out;
				self.store.begin_exit();
				view.phase_timer = Some(self.schedule(
					"overlay-exit",
					self.timings.exit_delay,
					Self::finish_closing,
				));
				tracing::debug!(%kind, "driver closing");
			}
			_ => {}
		}
	}

	fn schedule(
		self: &Arc<Self>,
		label: &'static str,
		delay: std::time::Duration,
		step: fn(&Arc<Self>),
	) -> TimerHandle {
		let weak: Weak<Self> = Arc::downgrade(self);
		self.timeline.schedule(label, delay, &self.scope, move || {
			if let Some(shared) = weak.upgrade() {
				step(&shared);
			}
		})
	}

	fn finish_opening(self: &Arc<Self>) {
		let content = self.store.snapshot().content;
		let mut view = self.view.lock();
		if view.phase != Phase::Opening {
			return;
		}
		view.phase_timer = None;
		view.phase = Phase::Open;
		view.animation = Animation::In;
		view.displayed = content;
		tracing::debug!(kind = %self.store.kind(), "driver open");
	}

	fn finish_closing(self: &Arc<Self>) {
		{
			let mut view = self.view.lock();
			if view.phase != Phase::Closing {
				return;
			}
			view.phase_timer = None;
			view.phase = Phase::Closed;
			view.mounted = false;
			view.displayed = None;
		}
		tracing::debug!(kind = %self.store.kind(), "driver closed");
		self.store.finish_exit();
	}
}

/// One rendered instance of an overlay, bound to a store for its lifetime.
pub struct LifecycleDriver<C>
where
	C: Clone + Send + Sync + 'static,
{
	shared: Arc<DriverShared<C>>,
	subscription: Subscription,
}

impl<C> fmt::Debug for LifecycleDriver<C>
where
	C: Clone + Send + Sync + 'static,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let view = self.shared.view.lock();
		f.debug_struct("LifecycleDriver")
			.field("phase", &view.phase)
			.field("mounted", &view.mounted)
			.field("animation", &view.animation)
			.finish_non_exhaustive()
	}
}

impl<C> LifecycleDriver<C>
where
	C: Clone + Send + Sync + 'static,
{
	/// Mounts a driver on `store`. A store that is already open starts the
	/// opening transition right away.
	pub fn mount(store: &OverlayStore<C>, timeline: &Timeline, timings: OverlayTimings) -> Self {
		Self::mount_with(store, timeline, timings, None)
	}

	/// Mounts a driver that also tracks a drag-to-dismiss gesture.
	pub fn mount_draggable(
		store: &OverlayStore<C>,
		timeline: &Timeline,
		timings: OverlayTimings,
		drag: DragConfig,
	) -> Self {
		Self::mount_with(store, timeline, timings, Some(DragGesture::new(&drag)))
	}

	fn mount_with(
		store: &OverlayStore<C>,
		timeline: &Timeline,
		timings: OverlayTimings,
		drag: Option<DragGesture>,
	) -> Self {
		let shared = Arc::new(DriverShared {
			store: store.clone(),
			timeline: timeline.clone(),
			scope: TimerScope::new(),
			timings,
			view: Mutex::new(ViewState {
				phase: Phase::Closed,
				mounted: false,
				animation: Animation::Out,
				displayed: None,
				phase_timer: None,
				drag,
			}),
		});

		let weak = Arc::downgrade(&shared);
		let subscription = store.subscribe(move |state| {
			if let Some(shared) = weak.upgrade() {
				shared.on_store_change(state);
			}
		});

		// A payload parked with no exit left to wait for opens on mount.
		store.promote_if_idle();
		shared.on_store_change(&store.snapshot());
		tracing::debug!(kind = %store.kind(), "driver mounted");
		Self {
			shared,
			subscription,
		}
	}

	pub fn store(&self) -> &OverlayStore<C> {
		&self.shared.store
	}

	pub fn view(&self) -> OverlayView<C> {
		self.shared.view.lock().to_view()
	}

	pub fn phase(&self) -> Phase {
		self.shared.view.lock().phase
	}

	pub fn is_mounted(&self) -> bool {
		self.shared.view.lock().mounted
	}

	pub fn animation(&self) -> Animation {
		self.shared.view.lock().animation
	}

	pub fn displayed(&self) -> Option<C> {
		self.shared.view.lock().displayed.clone()
	}

	/// Current downward translation of a draggable overlay; 0 otherwise.
	pub fn offset_y(&self) -> f32 {
		self.shared
			.view
			.lock()
			.drag
			.as_ref()
			.map_or(0.0, DragGesture::offset_y)
	}

	/// Feeds a pointer or touch event into the drag gesture.
	///
	/// Ignored when the driver has no gesture or its container is unmounted.
	/// Releasing past the dismiss threshold closes the store.
	pub fn drag(&self, input: DragInput) -> DragOutcome {
		let outcome = {
			let mut view = self.shared.view.lock();
			if !view.mounted {
				return DragOutcome::Ignored;
			}
			match view.drag.as_mut() {
				Some(gesture) => gesture.handle(input),
				None => return DragOutcome::Ignored,
			}
		};
		if outcome == DragOutcome::Dismiss {
			self.shared.store.close();
		}
		outcome
	}

	pub fn drag_start(&self, origin_y: f32) -> DragOutcome {
		self.drag(DragInput::PointerDown { y: origin_y })
	}

	pub fn drag_move(&self, current_y: f32) -> DragOutcome {
		self.drag(DragInput::PointerMove { y: current_y })
	}

	pub fn drag_end(&self) -> DragOutcome {
		self.drag(DragInput::PointerUp)
	}

	/// Tears the driver down, cancelling every pending transition.
	pub fn unmount(self) {
		drop(self);
	}
}

impl<C> Drop for LifecycleDriver<C>
where
	C: Clone + Send + Sync + 'static,
{
	fn drop(&mut self) {
		self.shared.scope.cancel();
		self.subscription.unsubscribe();
		let was_closing = {
			let mut view = self.shared.view.lock();
			view.phase_timer = None;
			std::mem::replace(&mut view.phase, Phase::Closed) == Phase::Closing
		};
		if was_closing {
			// The cancelled exit no longer holds back the pending payload.
			self.shared.store.finish_exit();
		}
		tracing::debug!(kind = %self.shared.store.kind(), "driver unmounted");
	}
}
