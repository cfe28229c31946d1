//! Deterministic timer queue for staged overlay transitions.
//!
//! Every delay in this crate (mount, exit, auto-dismiss, removal) is a
//! fire-once callback scheduled on a [`Timeline`]. Time only moves when the
//! owner calls [`Timeline::advance`], which keeps transitions reproducible in
//! tests; [`Timeline::drive`] hooks the same queue up to a real clock.
//!
//! Callbacks run with no lock held, so they are free to schedule further
//! timers or mutate stores that notify subscribers.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;


type Callback = Box<dyn FnOnce() + Send + 'static>;

/// Cancellation boundary for a group of timers.
///
/// A lifecycle driver or notification list owns one scope; cancelling it
/// suppresses every timer scheduled under it that has not fired yet.
#[derive(Debug, Clone, Default)]
pub struct TimerScope {
	cancel: CancellationToken,
}

impl TimerScope {
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a scope that is cancelled together with this one.
	pub fn child(&self) -> Self {
		Self {
			cancel: self.cancel.child_token(),
		}
	}

	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancel.is_cancelled()
	}
}

/// Handle to a single scheduled callback.
#[derive(Debug, Clone)]
pub struct TimerHandle {
	cancel: CancellationToken,
	deadline: Duration,
}

impl TimerHandle {
	/// Prevents the callback from running. Idempotent.
	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancel.is_cancelled()
	}

	/// Timeline instant at which the callback is due.
	pub fn deadline(&self) -> Duration {
		self.deadline
	}
}

struct Timer {
	label: &'static str,
	scope: CancellationToken,
	cancel: CancellationToken,
	callback: Callback,
}

impl Timer {
	fn is_live(&self) -> bool {
		!self.cancel.is_cancelled() && !self.scope.is_cancelled()
	}
}

#[derive(Default)]
struct TimelineInner {
	now: Duration,
	next_seq: u64,
	/// Keyed by deadline, then scheduling order for ties.
	timers: BTreeMap<(Duration, u64), Timer>,
}

/// Shared handle to a timer queue with a manually advanced clock.
#[derive(Clone, Default)]
pub struct Timeline {
	inner: Arc<Mutex<TimelineInner>>,
}

impl fmt::Debug for Timeline {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let inner = self.inner.lock();
		f.debug_struct("Timeline")
			.field("now", &inner.now)
			.field("scheduled", &inner.timers.len())
			.finish()
	}
}

impl Timeline {
	pub fn new() -> Self {
		Self::default()
	}

	/// Elapsed time since the timeline was created.
	pub fn now(&self) -> Duration {
		self.inner.lock().now
	}

	/// Schedules `callback` to run `delay` from now unless `scope` or the
	/// returned handle is cancelled first.
	pub fn schedule<F>(
		&self,
		label: &'static str,
		delay: Duration,
		scope: &TimerScope,
		callback: F,
	) -> TimerHandle
	where
		F: FnOnce() + Send + 'static,
	{
		let cancel = CancellationToken::new();
		let mut inner = self.inner.lock();
		let deadline = inner.now + delay;
		let seq = inner.next_seq;
		inner.next_seq = inner.next_seq.wrapping_add(1);
		inner.timers.insert(
			(deadline, seq),
			Timer {
				label,
				scope: scope.cancel.clone(),
				cancel: cancel.clone(),
				callback: Box::new(callback),
			},
		);
		tracing::trace!(label, ?deadline, "timer scheduled");
		TimerHandle { cancel, deadline }
	}

	/// Number of timers that are still due to fire.
	pub fn pending(&self) -> usize {
		self.inner
			.lock()
			.timers
			.values()
			.filter(|timer| timer.is_live())
			.count()
	}

	/// Deadline of the earliest live timer.
	pub fn next_deadline(&self) -> Option<Duration> {
		self.inner
			.lock()
			.timers
			.iter()
			.find(|(_, timer)| timer.is_live())
			.map(|(&(deadline, _), _)| deadline)
	}

	/// Moves the clock forward by `delta`, firing every timer that falls due.
	///
	/// Timers fire in deadline order and the clock reads each timer's deadline
	/// while its callback runs. Timers scheduled by a callback fire within the
	/// same call when they are due before the target instant.
	pub fn advance(&self, delta: Duration) {
		let target = self.inner.lock().now + delta;
		while let Some(timer) = self.pop_due(target) {
			if timer.is_live() {
				tracing::trace!(label = timer.label, "timer fired");
				(timer.callback)();
			}
		}
		let mut inner = self.inner.lock();
		inner.now = inner.now.max(target);
	}

	/// Advances the clock up to an absolute instant. Instants in the past are ignored.
	pub fn advance_to(&self, instant: Duration) {
		let now = self.now();
		if instant > now {
			self.advance(instant - now);
		}
	}

	/// Fires timers until none remain, returning the elapsed time.
	pub fn run_until_idle(&self) -> Duration {
		let start = self.now();
		while let Some(deadline) = self.next_deadline() {
			self.advance_to(deadline);
		}
		self.prune();
		self.now() - start
	}

	/// Advances the timeline against the tokio clock, one frame at a time,
	/// until `cancel` fires.
	pub async fn drive(&self, frame: Duration, cancel: CancellationToken) {
		let mut interval = tokio::time::interval(frame);
		interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
		let mut last = tokio::time::Instant::now();
		loop {
			tokio::select! {
				_ = cancel.cancelled() => break,
				_ = interval.tick() => {
					let now = tokio::time::Instant::now();
					self.advance(now - last);
					last = now;
				}
			}
		}
	}

	fn pop_due(&self, target: Duration) -> Option<Timer> {
		let mut inner = self.inner.lock();
		let entry = inner.timers.first_entry()?;
		let (deadline, _) = *entry.key();
		if deadline > target {
			return None;
		}
		let timer = entry.remove();
		inner.now = inner.now.max(deadline);
		Some(timer)
	}

	fn prune(&self) {
		self.inner.lock().timers.retain(|_, timer| timer.is_live());
	}
}
