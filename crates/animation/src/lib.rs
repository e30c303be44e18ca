//! Time-cursor animation for the streaming river layer.
//!
//! An [`AnimationController`] owns one [`AnimationCursor`] for the session and
//! pushes the active time range to a [`StreamingLayer`] every time the cursor
//! moves, either from the controls or from its own play loop.

use chrono::{DateTime, Utc};

pub mod command;
pub mod controller;
pub mod cursor;

pub use command::{AnimationCommand, CommandParseError};
pub use controller::{AnimationController, AnimationSnapshot};
pub use cursor::{
    format_label, AnimationConfig, AnimationConfigError, AnimationCursor, LocalZone,
    DEFAULT_ANIMATE_SPEED, DEFAULT_DURATION_DAYS, DEFAULT_STEPS_PER_DAY,
};

/// Map layer whose visible time window follows the cursor.
///
/// Calls are fire-and-forget; rendering and load failures belong to the layer.
pub trait StreamingLayer: Send + Sync {
    fn set_time_range(&self, start: DateTime<Utc>, end: DateTime<Utc>);
}

/// Text target for the current-time label.
pub trait LabelSink: Send + Sync {
    fn show_label(&self, label: &str);
}
