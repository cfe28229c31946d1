//! Vertical drag-to-dismiss gesture for the panel overlay.
//!
//! The gesture only ever moves the panel downward from its resting position.
//! Releasing past the threshold commits to closing; anything shorter snaps
//! back. Pointer and touch streams feed the same state machine.

use crate::config::DragConfig;

/// Raw input accepted by [`DragGesture::handle`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragInput {
	PointerDown { y: f32 },
	PointerMove { y: f32 },
	PointerUp,
	TouchStart { y: f32 },
	TouchMove { y: f32 },
	TouchEnd,
}

/// Observable drag state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DragState {
	pub origin_y: f32,
	pub is_dragging: bool,
	/// Never negative.
	pub offset_y: f32,
}

/// Result of feeding one input into the gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
	/// Input arrived outside a drag (or carried a non-finite coordinate).
	Ignored,
	/// Drag started or moved.
	Tracking,
	/// Released below the threshold; offset reset to rest.
	SnapBack,
	/// Released past the threshold; the owner should close the overlay.
	Dismiss,
}

#[derive(Debug, Clone)]
pub struct DragGesture {
	threshold: f32,
	origin_y: Option<f32>,
	offset_y: f32,
}

impl Default for DragGesture {
	fn default() -> Self {
		Self::new(&DragConfig::default())
	}
}

impl DragGesture {
	pub fn new(config: &DragConfig) -> Self {
		Self {
			threshold: config.dismiss_threshold,
			origin_y: None,
			offset_y: 0.0,
		}
	}

	pub fn state(&self) -> DragState {
		DragState {
			origin_y: self.origin_y.unwrap_or_default(),
			is_dragging: self.origin_y.is_some(),
			offset_y: self.offset_y,
		}
	}

	pub fn offset_y(&self) -> f32 {
		self.offset_y
	}

	pub fn is_dragging(&self) -> bool {
		self.origin_y.is_some()
	}

	pub fn threshold(&self) -> f32 {
		self.threshold
	}

	pub fn handle(&mut self, input: DragInput) -> DragOutcome {
		match input {
			DragInput::PointerDown { y } | DragInput::TouchStart { y } => self.start(y),
			DragInput::PointerMove { y } | DragInput::TouchMove { y } => self.moved(y),
			DragInput::PointerUp | DragInput::TouchEnd => self.end(),
		}
	}

	pub fn start(&mut self, origin_y: f32) -> DragOutcome {
		if !origin_y.is_finite() {
			return DragOutcome::Ignored;
		}
		self.origin_y = Some(origin_y);
		DragOutcome::Tracking
	}

	/// Upward deltas leave the offset untouched.
	pub fn moved(&mut self, current_y: f32) -> DragOutcome {
		let Some(origin_y) = self.origin_y else {
			return DragOutcome::Ignored;
		};
		if !current_y.is_finite() {
			return DragOutcome::Ignored;
		}
		let delta = current_y - origin_y;
		if delta > 0.0 {
			self.offset_y = delta;
		}
		DragOutcome::Tracking
	}

	pub fn end(&mut self) -> DragOutcome {
		if self.origin_y.take().is_none() {
			return DragOutcome::Ignored;
		}
		if self.offset_y > self.threshold {
			tracing::debug!(offset = self.offset_y, "drag released past dismiss threshold");
			DragOutcome::Dismiss
		} else {
			self.offset_y = 0.0;
			DragOutcome::SnapBack
		}
	}

	/// Drops any in-progress drag and returns the panel to rest.
	pub fn reset(&mut self) {
		self.origin_y = None;
		self.offset_y = 0.0;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn drag_by(gesture: &mut DragGesture, distance: f32) -> DragOutcome {
		gesture.handle(DragInput::PointerDown { y: 200.0 });
		gesture.handle(DragInput::PointerMove { y: 200.0 + distance });
		gesture.handle(DragInput::PointerUp)
	}

	#[test]
	fn threshold_is_strict() {
		let mut gesture = DragGesture::default();
		assert_eq!(drag_by(&mut gesture, 150.0), DragOutcome::SnapBack);
		assert_eq!(gesture.offset_y(), 0.0);

		assert_eq!(drag_by(&mut gesture, 151.0), DragOutcome::Dismiss);
		assert_eq!(gesture.offset_y(), 151.0);
		assert!(!gesture.is_dragging());
	}

	#[test]
	fn upward_drag_never_moves_panel() {
		let mut gesture = DragGesture::default();
		gesture.start(300.0);
		for y in [290.0, 250.0, 100.0, 299.9] {
			gesture.moved(y);
			assert_eq!(gesture.offset_y(), 0.0);
		}
		assert_eq!(gesture.end(), DragOutcome::SnapBack);
	}

	#[test]
	fn returning_upward_keeps_last_downward_offset() {
		let mut gesture = DragGesture::default();
		gesture.start(0.0);
		gesture.moved(80.0);
		gesture.moved(-20.0);
		assert_eq!(gesture.offset_y(), 80.0);
	}

	#[test]
	fn touch_stream_matches_pointer_stream() {
		let mut touch = DragGesture::default();
		touch.handle(DragInput::TouchStart { y: 10.0 });
		touch.handle(DragInput::TouchMove { y: 170.0 });
		assert_eq!(
			touch.state(),
			DragState {
				origin_y: 10.0,
				is_dragging: true,
				offset_y: 160.0
			}
		);
		assert_eq!(touch.handle(DragInput::TouchEnd), DragOutcome::Dismiss);
	}

	#[test]
	fn move_and_end_without_start_are_ignored() {
		let mut gesture = DragGesture::default();
		assert_eq!(gesture.moved(400.0), DragOutcome::Ignored);
		assert_eq!(gesture.end(), DragOutcome::Ignored);
		assert_eq!(gesture.state(), DragState::default());
	}

	#[test]
	fn non_finite_coordinates_are_ignored() {
		let mut gesture = DragGesture::default();
		assert_eq!(gesture.start(f32::NAN), DragOutcome::Ignored);
		gesture.start(0.0);
		assert_eq!(gesture.moved(f32::INFINITY), DragOutcome::Ignored);
		assert_eq!(gesture.offset_y(), 0.0);
	}

	#[test]
	fn custom_threshold() {
		let mut gesture = DragGesture::new(&DragConfig {
			dismiss_threshold: 40.0,
		});
		assert_eq!(drag_by(&mut gesture, 41.0), DragOutcome::Dismiss);
		gesture.reset();
		assert_eq!(gesture.state(), DragState::default());
	}
}
