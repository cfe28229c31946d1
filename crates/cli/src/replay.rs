//! Applies a [`Script`] to a fresh set of overlays and records what a
//! renderer would have observed.

use std::fmt;
use std::time::Duration;

use scrim_overlay::{LifecycleDriver, OverlayConfig, Overlays, Phase};
use tokio_util::sync::CancellationToken;

use crate::script::{Action, Script};

/// One observable change, stamped with timeline time.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
	pub at: Duration,
	pub surface: &'static str,
	pub detail: String,
}

impl fmt::Display for Event {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:>7}ms  {:<8} {}", self.at.as_millis(), self.surface, self.detail)
	}
}

#[derive(Debug, Clone, PartialEq, Default)]
struct SurfaceSample {
	phase: Phase,
	displayed: Option<String>,
	offset_y: f32,
}

#[derive(Debug, Clone, PartialEq)]
struct ToastSample {
	id: u64,
	message: String,
	visible: bool,
	removing: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct Sample {
	dialog: SurfaceSample,
	panel: SurfaceSample,
	toasts: Vec<ToastSample>,
}

pub struct Replay {
	overlays: Overlays<String>,
	dialog: LifecycleDriver<String>,
	panel: LifecycleDriver<String>,
	last: Sample,
	events: Vec<Event>,
}

impl Replay {
	pub fn new(config: OverlayConfig) -> Self {
		let overlays = Overlays::new(config);
		let dialog = overlays.mount_dialog();
		let panel = overlays.mount_panel();
		Self {
			overlays,
			dialog,
			panel,
			last: Sample::default(),
			events: Vec::new(),
		}
	}

	/// Replays `script`, jumping straight from one deadline to the next.
	pub fn run(mut self, script: &Script) -> Vec<Event> {
		for step in &script.steps {
			self.advance_to(step.at());
			self.apply(&step.action);
			self.sample();
		}
		self.drain();
		self.events
	}

	/// Replays `script` against the wall clock, sampling once per frame.
	pub async fn run_realtime(mut self, script: &Script, frame: Duration) -> Vec<Event> {
		let timeline = self.overlays.timeline().clone();
		let cancel = CancellationToken::new();
		let ticker = {
			let timeline = timeline.clone();
			let cancel = cancel.clone();
			tokio::spawn(async move { timeline.drive(frame, cancel).await })
		};

		let start = tokio::time::Instant::now();
		let mut frames = tokio::time::interval(frame);
		for step in &script.steps {
			let due = start + step.at();
			while tokio::time::Instant::now() < due {
				frames.tick().await;
				self.sample();
			}
			self.apply(&step.action);
			self.sample();
		}
		while timeline.pending() > 0 {
			frames.tick().await;
			self.sample();
		}
		self.sample();

		cancel.cancel();
		if let Err(err) = ticker.await {
			tracing::warn!(%err, "timeline driver task failed");
		}
		self.events
	}

	fn apply(&mut self, action: &Action) {
		tracing::info!(at = ?self.overlays.timeline().now(), ?action, "applying step");
		match action {
			Action::DialogOpen { content } => self.overlays.dialog.open(content.clone()),
			Action::DialogClose => self.overlays.dialog.close(),
			Action::PanelOpen { content } => self.overlays.panel.open(content.clone()),
			Action::PanelClose => self.overlays.panel.close(),
			Action::Drag { from, to } => {
				self.panel.drag_start(*from);
				self.panel.drag_move(*to);
				let outcome = self.panel.drag_end();
				tracing::info!(?outcome, "drag released");
			}
			Action::Toast { message, variant } => {
				let id = self.overlays.notifications.show(message.clone(), *variant);
				tracing::info!(id, "toast requested");
			}
			Action::Hide { id } => self.overlays.notifications.hide(*id),
		}
	}

	fn advance_to(&mut self, at: Duration) {
		let timeline = self.overlays.timeline().clone();
		while let Some(deadline) = timeline.next_deadline()
			&& deadline <= at
		{
			timeline.advance_to(deadline);
			self.sample();
		}
		timeline.advance_to(at);
	}

	fn drain(&mut self) {
		let timeline = self.overlays.timeline().clone();
		while let Some(deadline) = timeline.next_deadline() {
			timeline.advance_to(deadline);
			self.sample();
		}
	}

	fn take_sample(&self) -> Sample {
		let surface = |driver: &LifecycleDriver<String>| SurfaceSample {
			phase: driver.phase(),
			displayed: driver.displayed(),
			offset_y: driver.offset_y(),
		};
		Sample {
			dialog: surface(&self.dialog),
			panel: surface(&self.panel),
			toasts: self
				.overlays
				.notifications
				.snapshot()
				.into_iter()
				.map(|n| ToastSample {
					id: n.id,
					message: n.message,
					visible: n.is_visible,
					removing: n.is_removing,
				})
				.collect(),
		}
	}

	fn sample(&mut self) {
		let next = self.take_sample();
		if next == self.last {
			return;
		}
		let at = self.overlays.timeline().now();
		let mut events = Vec::new();
		diff_surface(at, "dialog", &self.last.dialog, &next.dialog, &mut events);
		diff_surface(at, "panel", &self.last.panel, &next.panel, &mut events);
		diff_toasts(at, &self.last.toasts, &next.toasts, &mut events);
		for event in &events {
			tracing::debug!(%event, "observed");
		}
		self.events.extend(events);
		self.last = next;
	}
}

fn diff_surface(
	at: Duration,
	surface: &'static str,
	prev: &SurfaceSample,
	next: &SurfaceSample,
	out: &mut Vec<Event>,
) {
	let mut push = |detail: String| {
		out.push(Event {
			at,
			surface,
			detail,
		})
	};
	if prev.phase != next.phase {
		push(format!("phase {:?}", next.phase));
	}
	if prev.displayed != next.displayed {
		push(match &next.displayed {
			Some(content) => format!("showing {content:?}"),
			None => "cleared".to_string(),
		});
	}
	if prev.offset_y != next.offset_y {
		push(format!("offset {}", next.offset_y));
	}
}

fn diff_toasts(at: Duration, prev: &[ToastSample], next: &[ToastSample], out: &mut Vec<Event>) {
	let mut push = |detail: String| {
		out.push(Event {
			at,
			surface: "toast",
			detail,
		})
	};
	for toast in next {
		match prev.iter().find(|p| p.id == toast.id) {
			None => push(format!("#{} added {:?}", toast.id, toast.message)),
			Some(old) => {
				if !old.visible && toast.visible {
					push(format!("#{} visible", toast.id));
				}
				if !old.removing && toast.removing {
					push(format!("#{} removing", toast.id));
				}
			}
		}
	}
	for old in prev {
		if !next.iter().any(|t| t.id == old.id) {
			push(format!("#{} removed", old.id));
		}
	}
}

/// Contents each surface actually displayed, in order.
pub fn shown(events: &[Event], surface: &str) -> Vec<String> {
	events
		.iter()
		.filter(|e| e.surface == surface)
		.filter_map(|e| e.detail.strip_prefix("showing "))
		.map(str::to_owned)
		.collect()
}
