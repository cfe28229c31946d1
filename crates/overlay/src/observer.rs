//! Synchronous subscriber lists shared by every store in the crate.

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Entry<T: ?Sized> {
	id: u64,
	callback: Callback<T>,
}

struct Registry<T: ?Sized> {
	next_id: u64,
	entries: Vec<Entry<T>>,
}

/// Ordered list of callbacks notified on every state mutation.
pub(crate) struct Observers<T: ?Sized> {
	registry: Arc<Mutex<Registry<T>>>,
}

impl<T: ?Sized + 'static> Observers<T> {
	pub(crate) fn new() -> Self {
		Self {
			registry: Arc::new(Mutex::new(Registry {
				next_id: 0,
				entries: Vec::new(),
			})),
		}
	}

	pub(crate) fn subscribe<F>(&self, callback: F) -> Subscription
	where
		F: Fn(&T) + Send + Sync + 'static,
	{
		let id = {
			let mut registry = self.registry.lock();
			let id = registry.next_id;
			registry.next_id += 1;
			registry.entries.push(Entry {
				id,
				callback: Arc::new(callback),
			});
			id
		};

		let weak: Weak<Mutex<Registry<T>>> = Arc::downgrade(&self.registry);
		Subscription {
			remove: Mutex::new(Some(Box::new(move || {
				if let Some(registry) = weak.upgrade() {
					registry.lock().entries.retain(|entry| entry.id != id);
				}
			}))),
		}
	}

	pub(crate) fn len(&self) -> usize {
		self.registry.lock().entries.len()
	}

	/// Invokes every subscriber registered at the moment of the call, in
	/// registration order. A panicking subscriber is logged and skipped.
	pub(crate) fn emit(&self, value: &T) {
		let batch: Vec<(u64, Callback<T>)> = self
			.registry
			.lock()
			.entries
			.iter()
			.map(|entry| (entry.id, Arc::clone(&entry.callback)))
			.collect();

		for (id, callback) in batch {
			if let Err(payload) = catch_unwind(AssertUnwindSafe(|| callback(value))) {
				tracing::warn!(
					subscriber = id,
					panic = panic_message(payload.as_ref()),
					"overlay subscriber panicked"
				);
			}
		}
	}
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
	if let Some(msg) = payload.downcast_ref::<&'static str>() {
		msg
	} else if let Some(msg) = payload.downcast_ref::<String>() {
		msg.as_str()
	} else {
		"<non-string panic payload>"
	}
}

/// Registration returned by `subscribe`.
///
/// Unsubscribing is idempotent and only ever removes the callback this value
/// was created for. Dropping the subscription unsubscribes as well.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
	remove: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl Subscription {
	pub fn unsubscribe(&self) {
		if let Some(remove) = self.remove.lock().take() {
			remove();
		}
	}

	pub fn is_active(&self) -> bool {
		self.remove.lock().is_some()
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		self.unsubscribe();
	}
}

impl fmt::Debug for Subscription {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subscription")
			.field("active", &self.is_active())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};

	use super::*;

	#[test]
	fn delivers_in_registration_order() {
		let observers = Observers::<u32>::new();
		let log = Arc::new(Mutex::new(Vec::new()));

		let subs: Vec<_> = (0..3)
			.map(|n| {
				let log = Arc::clone(&log);
				observers.subscribe(move |value: &u32| log.lock().push((n, *value)))
			})
			.collect();

		observers.emit(&7);
		assert_eq!(*log.lock(), vec![(0, 7), (1, 7), (2, 7)]);
		drop(subs);
	}

	#[test]
	fn panicking_subscriber_does_not_starve_the_rest() {
		let observers = Observers::<u32>::new();
		let hits = Arc::new(AtomicUsize::new(0));

		let _boom = observers.subscribe(|_: &u32| panic!("subscriber exploded"));
		let counter = Arc::clone(&hits);
		let _ok = observers.subscribe(move |_: &u32| {
			counter.fetch_add(1, Ordering::SeqCst);
		});

		observers.emit(&1);
		observers.emit(&2);
		assert_eq!(hits.load(Ordering::SeqCst), 2);
	}

	#[test]
	fn drop_unsubscribes() {
		let observers = Observers::<u32>::new();
		let sub = observers.subscribe(|_: &u32| {});
		assert_eq!(observers.len(), 1);
		drop(sub);
		assert_eq!(observers.len(), 0);
	}

	#[test]
	fn unsubscribe_outliving_registry_is_harmless() {
		let observers = Observers::<u32>::new();
		let sub = observers.subscribe(|_: &u32| {});
		drop(observers);
		sub.unsubscribe();
		assert!(!sub.is_active());
	}

	#[test]
	fn panic_message_extracts_both_payload_kinds() {
		let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
		let borrowed: Box<dyn Any + Send> = Box::new("borrowed");
		let other: Box<dyn Any + Send> = Box::new(5_u8);
		assert_eq!(panic_message(owned.as_ref()), "owned");
		assert_eq!(panic_message(borrowed.as_ref()), "borrowed");
		assert_eq!(panic_message(other.as_ref()), "<non-string panic payload>");
	}
}
