//! Stacked, auto-expiring notification list with bounded capacity.
//!
//! Each entry walks its own lifecycle on the shared [`Timeline`]:
//!
//! 1. admitted hidden, becomes visible after the mount delay,
//! 2. dismisses itself after the display duration (or early via `hide`),
//! 3. is dropped from the list after the removal delay.
//!
//! The list never holds more than `capacity` entries. A `show` that arrives
//! while the list is full waits for admission and forces the oldest live
//! entry into removal; the waiting entry is appended once that entry's data
//! has actually been dropped.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::Deserialize;

use crate::config::NotificationConfig;
use crate::observer::{Observers, Subscription};
use crate::timeline::{TimerScope, Timeline};


/// Visual flavour of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
	#[default]
	Default,
	Info,
	Success,
	Error,
}

impl fmt::Display for Variant {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Default => "default",
			Self::Info => "info",
			Self::Success => "success",
			Self::Error => "error",
		})
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationInstance {
	/// Strictly increasing for the lifetime of the list; never reused.
	pub id: u64,
	pub message: String,
	pub variant: Variant,
	pub is_visible: bool,
	pub is_removing: bool,
}

impl NotificationInstance {
	fn new(id: u64, message: String, variant: Variant) -> Self {
		Self {
			id,
			message,
			variant,
			is_visible: false,
			is_removing: false,
		}
	}
}

struct Entry {
	instance: NotificationInstance,
	/// Child of the list scope covering the mount and display timers.
	timers: TimerScope,
}

#[derive(Default)]
struct ListState {
	entries: Vec<Entry>,
	/// Shown but not yet admitted, oldest first.
	waiting: VecDeque<NotificationInstance>,
	next_id: u64,
}

impl ListState {
	fn live_count(&self) -> usize {
		self.entries
			.iter()
			.filter(|entry| !entry.instance.is_removing)
			.count()
	}

	fn position(&self, id: u64) -> Option<usize> {
		self.entries.iter().position(|entry| entry.instance.id == id)
	}

	fn snapshot(&self) -> Vec<NotificationInstance> {
		self.entries
			.iter()
			.map(|entry| entry.instance.clone())
			.collect()
	}
}

struct ListShared {
	timeline: Timeline,
	scope: TimerScope,
	config: NotificationConfig,
	state: Mutex<ListState>,
	observers: Observers<[NotificationInstance]>,
}

impl ListShared {
	fn schedule(
		self: &Arc<Self>,
		label: &'static str,
		delay: std::time::Duration,
		scope: &TimerScope,
		id: u64,
		step: fn(&Arc<Self>, u64),
	) {
		let weak: Weak<Self> = Arc::downgrade(self);
		self.timeline.schedule(label, delay, scope, move || {
			if let Some(shared) = weak.upgrade() {
				step(&shared, id);
			}
		});
	}

	fn admit(self: &Arc<Self>, state: &mut ListState, instance: NotificationInstance) {
		let id = instance.id;
		let timers = self.scope.child();
		let config = &self.config;
		self.schedule("notification-mount", config.mount_delay, &timers, id, Self::reveal);
		self.schedule("notification-dismiss", config.display, &timers, id, Self::expire);
		state.entries.push(Entry { instance, timers });
		tracing::debug!(id, len = state.entries.len(), "notification admitted");
	}

	/// Starts evictions until live entries plus waiting ones fit in capacity.
	fn evict_for_waiting(self: &Arc<Self>, state: &mut ListState) {
		let demand = state.live_count() + state.waiting.len();
		let excess = demand.saturating_sub(self.config.capacity);
		let victims: Vec<u64> = state
			.entries
			.iter()
			.filter(|entry| !entry.instance.is_removing)
			.take(excess)
			.map(|entry| entry.instance.id)
			.collect();
		for id in victims {
			tracing::debug!(id, "evicting oldest notification");
			self.begin_removal(state, id);
		}
	}

	fn begin_removal(self: &Arc<Self>, state: &mut ListState, id: u64) -> bool {
		let Some(index) = state.position(id) else {
			return false;
		};
		let entry = &mut state.entries[index];
		if entry.instance.is_removing {
			return false;
		}
		entry.timers.cancel();
		entry.instance.is_visible = false;
		entry.instance.is_removing = true;
		// The removal timer is never cancelled on its own; the list scope covers shutdown.
		self.schedule(
			"notification-remove",
			self.config.removal_delay,
			&self.scope,
			id,
			Self::drop_entry,
		);
		true
	}

	fn reveal(self: &Arc<Self>, id: u64) {
		let snapshot = {
			let mut state = self.state.lock();
			let Some(index) = state.position(id) else {
				return;
			};
			let entry = &mut state.entries[index];
			if entry.instance.is_removing {
				return;
			}
			entry.instance.is_visible = true;
			state.snapshot()
		};
		self.observers.emit(&snapshot);
	}

	fn expire(self: &Arc<Self>, id: u64) {
		let snapshot = {
			let mut state = self.state.lock();
			if !self.begin_removal(&mut state, id) {
				return;
			}
			tracing::debug!(id, "notification expired");
			state.snapshot()
		};
		self.observers.emit(&snapshot);
	}

	fn drop_entry(self: &Arc<Self>, id: u64) {
		let snapshot = {
			let mut state = self.state.lock();
			let Some(index) = state.position(id) else {
				return;
			};
			state.entries.remove(index);
			tracing::debug!(id, "notification removed");
			while state.entries.len() < self.config.capacity {
				let Some(next) = state.waiting.pop_front() else {
					break;
				};
				self.admit(&mut state, next);
			}
			// Entries still waiting need the next-oldest slot freed in turn.
			self.evict_for_waiting(&mut state);
			state.snapshot()
		};
		self.observers.emit(&snapshot);
	}
}

/// Cloneable handle to the process-wide notification list.
#[derive(Clone)]
pub struct NotificationList {
	shared: Arc<ListShared>,
}

impl fmt::Debug for NotificationList {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.shared.state.lock();
		f.debug_struct("NotificationList")
			.field("entries", &state.entries.len())
			.field("waiting", &state.waiting.len())
			.field("capacity", &self.shared.config.capacity)
			.finish()
	}
}

impl NotificationList {
	pub fn new(timeline: &Timeline, config: NotificationConfig) -> Self {
		Self {
			shared: Arc::new(ListShared {
				timeline: timeline.clone(),
				scope: TimerScope::new(),
				config,
				state: Mutex::new(ListState {
					next_id: 1,
					..ListState::default()
				}),
				observers: Observers::new(),
			}),
		}
	}

	pub fn config(&self) -> &NotificationConfig {
		&self.shared.config
	}

	/// Queues a notification and returns its id.
	///
	/// After [`shutdown`](Self::shutdown) the id is still allocated but nothing
	/// is queued or displayed.
	pub fn show(&self, message: impl Into<String>, variant: Variant) -> u64 {
		let shared = &self.shared;
		let (id, snapshot) = {
			let mut state = shared.state.lock();
			let id = state.next_id;
			state.next_id += 1;
			if shared.scope.is_cancelled() {
				tracing::debug!(id, "notification dropped after shutdown");
				return id;
			}
			let instance = NotificationInstance::new(id, message.into(), variant);
			tracing::debug!(id, %variant, "notification shown");

			if state.waiting.is_empty() && state.entries.len() < shared.config.capacity {
				shared.admit(&mut state, instance);
			} else {
				state.waiting.push_back(instance);
				shared.evict_for_waiting(&mut state);
			}
			(id, state.snapshot())
		};
		shared.observers.emit(&snapshot);
		id
	}

	pub fn info(&self, message: impl Into<String>) -> u64 {
		self.show(message, Variant::Info)
	}

	pub fn success(&self, message: impl Into<String>) -> u64 {
		self.show(message, Variant::Success)
	}

	pub fn error(&self, message: impl Into<String>) -> u64 {
		self.show(message, Variant::Error)
	}

	/// Starts the removal transition for `id` ahead of its timer.
	///
	/// A no-op for ids that are already removing or gone. An id still waiting
	/// for admission is withdrawn without ever being displayed.
	pub fn hide(&self, id: u64) {
		let shared = &self.shared;
		let snapshot = {
			let mut state = shared.state.lock();
			if let Some(index) = state.waiting.iter().position(|waiting| waiting.id == id) {
				state.waiting.remove(index);
				tracing::debug!(id, "waiting notification withdrawn");
				return;
			}
			if !shared.begin_removal(&mut state, id) {
				return;
			}
			tracing::debug!(id, "notification hidden");
			state.snapshot()
		};
		shared.observers.emit(&snapshot);
	}

	/// Starts removal of every displayed entry and discards waiting ones.
	pub fn clear(&self) {
		let shared = &self.shared;
		let snapshot = {
			let mut state = shared.state.lock();
			state.waiting.clear();
			let live: Vec<u64> = state
				.entries
				.iter()
				.filter(|entry| !entry.instance.is_removing)
				.map(|entry| entry.instance.id)
				.collect();
			if live.is_empty() {
				return;
			}
			for id in live {
				shared.begin_removal(&mut state, id);
			}
			state.snapshot()
		};
		shared.observers.emit(&snapshot);
	}

	/// Registers `callback` to receive the full sequence after every change.
	pub fn subscribe<F>(&self, callback: F) -> Subscription
	where
		F: Fn(&[NotificationInstance]) + Send + Sync + 'static,
	{
		self.shared.observers.subscribe(callback)
	}

	pub fn snapshot(&self) -> Vec<NotificationInstance> {
		self.shared.state.lock().snapshot()
	}

	/// Entries paired with their vertical offset, in display order.
	pub fn stacked(&self) -> Vec<(NotificationInstance, f32)> {
		self.snapshot()
			.into_iter()
			.enumerate()
			.map(|(index, instance)| (instance, self.offset_for(index)))
			.collect()
	}

	/// Offset of the entry at `index`; derived from position, not id.
	pub fn offset_for(&self, index: usize) -> f32 {
		index as f32 * self.shared.config.stack_spacing
	}

	pub fn len(&self) -> usize {
		self.shared.state.lock().entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.shared.state.lock().entries.is_empty()
	}

	/// Number of entries not yet in their removal transition.
	pub fn live_len(&self) -> usize {
		self.shared.state.lock().live_count()
	}

	pub fn waiting_len(&self) -> usize {
		self.shared.state.lock().waiting.len()
	}

	/// Cancels every outstanding timer. Entries freeze in their current state
	/// and later calls to `show` are ignored.
	pub fn shutdown(&self) {
		self.shared.scope.cancel();
		tracing::debug!("notification list shut down");
	}
}
