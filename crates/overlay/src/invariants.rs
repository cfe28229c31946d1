use std::time::Duration;

use crate::driver::{LifecycleDriver, Phase};
use crate::notify::Variant;
use crate::overlays::Overlays;

fn ms(n: u64) -> Duration {
	Duration::from_millis(n)
}

/// Steps the timeline 1ms at a time, recording every change of displayed content.
fn trace_displayed(
	overlays: &Overlays<&'static str>,
	driver: &LifecycleDriver<&'static str>,
	until: Duration,
) -> Vec<Option<&'static str>> {
	let mut seen = vec![driver.displayed()];
	while overlays.timeline().now() < until {
		overlays.timeline().advance(ms(1));
		let current = driver.displayed();
		if seen.last() != Some(&current) {
			seen.push(current);
		}
	}
	seen
}

/// Must display at most one dialog payload at a time, fully exiting the old one first.
///
/// - Enforced in: `OverlayStore::open`, `DriverShared::finish_closing`
/// - Failure symptom: Second dialog snaps in over the first without an exit transition.
#[cfg_attr(test, test)]
pub(crate) fn test_single_active_overlay() {
	let overlays = Overlays::default();
	let driver = overlays.mount_dialog();

	overlays.dialog.open("a");
	overlays.timeline().advance(ms(10));
	overlays.dialog.open("b");

	let seen = trace_displayed(&overlays, &driver, ms(1000));
	assert_eq!(seen, vec![Some("a"), None, Some("b")]);
}

/// Must replace, not queue, content requested while the overlay is busy.
///
/// - Enforced in: `OverlayStore::open`
/// - Failure symptom: Stale superseded dialogs flash on screen one after another.
#[cfg_attr(test, test)]
pub(crate) fn test_pending_overwrite() {
	let overlays = Overlays::default();
	let driver = overlays.mount_dialog();

	overlays.dialog.open("a");
	overlays.timeline().advance(ms(10));
	overlays.dialog.open("b");
	overlays.dialog.open("c");

	let rendered: Vec<_> = trace_displayed(&overlays, &driver, ms(2000))
		.into_iter()
		.flatten()
		.collect();
	assert_eq!(rendered, vec!["a", "c"]);
}

/// Must replace pending content even when every call precedes the first mount.
///
/// - Enforced in: `OverlayStore::open`
/// - Failure symptom: A payload parked behind an in-flight close renders after the newest one.
#[cfg_attr(test, test)]
pub(crate) fn test_rapid_open_before_first_paint() {
	let overlays = Overlays::default();
	let driver = overlays.mount_dialog();

	overlays.dialog.open("a");
	overlays.dialog.open("b");
	overlays.dialog.open("c");

	let seen = trace_displayed(&overlays, &driver, ms(2000));
	assert_eq!(seen, vec![None, Some("c")]);
	assert!(!overlays.dialog.has_pending());
}

/// Must open a parked payload once no driver is left running an exit.
///
/// - Enforced in: `OverlayStore::finish_exit`, `LifecycleDriver::drop`
/// - Failure symptom: After a route change unmounts a closing dialog, the dialog never opens again.
#[cfg_attr(test, test)]
pub(crate) fn test_pending_survives_unmount_mid_exit() {
	let overlays = Overlays::default();
	let old = overlays.mount_dialog();
	overlays.dialog.open("a");
	overlays.timeline().advance(ms(10));
	overlays.dialog.open("b");

	old.unmount();
	let fresh = overlays.mount_dialog();
	overlays.timeline().run_until_idle();
	assert_eq!(fresh.displayed(), Some("b"));

	overlays.dialog.open("c");
	overlays.timeline().run_until_idle();
	assert_eq!(fresh.phase(), Phase::Open);
	assert_eq!(fresh.displayed(), Some("c"));
}

/// Must open the latest payload requested before any driver was mounted.
///
/// - Enforced in: `OverlayStore::open`, `LifecycleDriver::mount`
/// - Failure symptom: A dialog opened during startup stays invisible forever.
#[cfg_attr(test, test)]
pub(crate) fn test_open_without_driver_is_not_lost() {
	let overlays = Overlays::default();
	overlays.dialog.open("a");
	overlays.dialog.open("b");
	overlays.dialog.open("c");

	let driver = overlays.mount_dialog();
	let seen = trace_displayed(&overlays, &driver, ms(100));
	assert_eq!(seen, vec![None, Some("c")]);
}

/// Must never hold more than three live notifications.
///
/// - Enforced in: `NotificationList::show`, `ListShared::evict_for_waiting`
/// - Failure symptom: Notification stack grows past the screen edge.
#[cfg_attr(test, test)]
pub(crate) fn test_notification_capacity() {
	let overlays = Overlays::<()>::default();
	let list = &overlays.notifications;
	for n in 0..10 {
		list.show(format!("n{n}"), Variant::Info);
		assert!(list.live_len() <= 3);
		assert!(list.len() <= 3);
		overlays.timeline().advance(ms(n * 37));
	}
}

/// Must evict the oldest notification first without blocking the newest.
///
/// - Enforced in: `ListShared::evict_for_waiting`, `ListShared::drop_entry`
/// - Failure symptom: The newest notification never appears, or a recent one vanishes first.
#[cfg_attr(test, test)]
pub(crate) fn test_fifo_eviction() {
	let overlays = Overlays::<()>::default();
	let list = &overlays.notifications;
	let a = list.show("A", Variant::Default);
	list.show("B", Variant::Default);
	list.show("C", Variant::Default);
	let d = list.show("D", Variant::Default);

	let removing: Vec<u64> = list
		.snapshot()
		.iter()
		.filter(|n| n.is_removing)
		.map(|n| n.id)
		.collect();
	assert_eq!(removing, vec![a]);

	overlays.timeline().advance(ms(310));
	let entries = list.snapshot();
	let last = entries.last().unwrap();
	assert_eq!(last.id, d);
	assert!(last.is_visible);
}

/// Must keep evicting while a burst outnumbers the capacity.
///
/// - Enforced in: `ListShared::drop_entry`, `ListShared::evict_for_waiting`
/// - Failure symptom: The newest of a burst waits behind full display cycles of older ones.
#[cfg_attr(test, test)]
pub(crate) fn test_burst_admission_not_blocked() {
	let overlays = Overlays::<()>::default();
	let list = &overlays.notifications;
	let ids: Vec<u64> = (0..8).map(|n| list.show(format!("n{n}"), Variant::Default)).collect();
	let newest = ids[7];

	overlays.timeline().advance(ms(900));
	assert!(list.snapshot().iter().any(|n| n.id == newest && n.is_visible));
	assert_eq!(list.waiting_len(), 0);
}

/// Must auto-dismiss at the display duration and drop after the removal delay.
///
/// - Enforced in: `ListShared::expire`, `ListShared::drop_entry`
/// - Failure symptom: Notifications linger forever or disappear without an exit transition.
#[cfg_attr(test, test)]
pub(crate) fn test_auto_dismiss_timing() {
	let overlays = Overlays::<()>::default();
	let list = &overlays.notifications;
	list.show("hello", Variant::Default);

	overlays.timeline().advance_to(ms(3000));
	let entry = &list.snapshot()[0];
	assert!(!entry.is_visible && entry.is_removing);

	overlays.timeline().advance_to(ms(3300));
	assert!(list.is_empty());
}

/// Must dismiss the panel only for drags strictly past the threshold.
///
/// - Enforced in: `DragGesture::end`
/// - Failure symptom: Panel closes on a short flick, or upward drags lift it off its rest position.
#[cfg_attr(test, test)]
pub(crate) fn test_drag_threshold_boundary() {
	let overlays = Overlays::default();
	let driver = overlays.mount_panel();
	overlays.panel.open("sheet");
	overlays.timeline().advance(ms(10));

	driver.drag_start(0.0);
	driver.drag_move(150.0);
	driver.drag_end();
	assert!(overlays.panel.is_open());

	driver.drag_start(500.0);
	for y in [490.0, 300.0, 0.0] {
		driver.drag_move(y);
		assert_eq!(driver.offset_y(), 0.0);
	}
	driver.drag_end();
	assert!(overlays.panel.is_open());

	driver.drag_start(0.0);
	driver.drag_move(151.0);
	driver.drag_end();
	assert!(!overlays.panel.is_open());
	assert_eq!(driver.phase(), Phase::Closing);
}

/// Must tolerate repeated unsubscribe without touching other subscribers.
///
/// - Enforced in: `Subscription::unsubscribe`
/// - Failure symptom: A stale unsubscribe detaches a live driver, which then never animates.
#[cfg_attr(test, test)]
pub(crate) fn test_idempotent_unsubscribe() {
	let overlays = Overlays::<&'static str>::default();
	let driver = overlays.mount_dialog();
	let extra = overlays.dialog.subscribe(|_| {});
	assert_eq!(overlays.dialog.subscriber_count(), 2);

	extra.unsubscribe();
	extra.unsubscribe();
	assert_eq!(overlays.dialog.subscriber_count(), 1);

	overlays.dialog.open("still-live");
	assert_eq!(driver.phase(), Phase::Opening);
}
