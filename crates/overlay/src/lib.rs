//! # scrim-overlay
//!
//! Coordination layer for transient UI presented outside the normal component
//! tree: a full-screen dialog, a bottom panel with drag-to-dismiss, and a
//! stacked notification list.
//!
//! * [`OverlayStore`] holds the open flag and opaque payload for the dialog and
//!   panel, parking content requested while busy in a last-caller-wins slot.
//! * [`LifecycleDriver`] turns store flips into staged
//!   `Closed → Opening → Open → Closing` transitions, one per mounted view.
//! * [`NotificationList`] keeps at most `capacity` auto-expiring entries,
//!   evicting the oldest to admit new ones.
//! * [`DragGesture`] resolves a vertical drag into dismiss or snap-back.
//!
//! All delays run on a [`Timeline`], advanced explicitly by the host (or by
//! [`Timeline::drive`] against the tokio clock).
//!
//! ```
//! use std::time::Duration;
//! use scrim_overlay::{Overlays, Phase};
//!
//! let overlays = Overlays::default();
//! let dialog = overlays.mount_dialog();
//!
//! overlays.dialog.open("settings");
//! assert_eq!(dialog.phase(), Phase::Opening);
//!
//! overlays.timeline().advance(Duration::from_millis(10));
//! assert_eq!(dialog.displayed(), Some("settings"));
//! ```

pub mod config;
pub mod drag;
pub mod driver;
pub mod error;
pub mod notify;
mod observer;
pub mod overlays;
pub mod store;
pub mod timeline;

#[cfg(test)]
mod invariants;

pub use config::{DragConfig, NotificationConfig, OverlayConfig, OverlayTimings};
pub use drag::{DragGesture, DragInput, DragOutcome, DragState};
pub use driver::{Animation, LifecycleDriver, OverlayView, Phase};
pub use error::ConfigError;
pub use notify::{NotificationInstance, NotificationList, Variant};
pub use observer::Subscription;
pub use overlays::Overlays;
pub use store::{OverlayKind, OverlayState, OverlayStore};
pub use timeline::{TimerHandle, TimerScope, Timeline};
