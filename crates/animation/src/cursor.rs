use std::time::Duration;

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use thiserror::Error;

pub const DEFAULT_DURATION_DAYS: u32 = 10;
/// 3 hour resolution.
pub const DEFAULT_STEPS_PER_DAY: u32 = 8;
pub const DEFAULT_ANIMATE_SPEED: Duration = Duration::from_millis(750);

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationConfig {
    pub duration_days: u32,
    pub steps_per_day: u32,
    pub animate_speed: Duration,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            duration_days: DEFAULT_DURATION_DAYS,
            steps_per_day: DEFAULT_STEPS_PER_DAY,
            animate_speed: DEFAULT_ANIMATE_SPEED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnimationConfigError {
    #[error("animation window must span at least one day")]
    EmptyWindow,
    #[error("{steps_per_day} steps per day do not divide a day into whole milliseconds")]
    UnevenSteps { steps_per_day: u32 },
    #[error("animation speed must be greater than zero")]
    ZeroSpeed,
    #[error("{duration_days} days at {steps_per_day} steps per day is too many animation steps")]
    TooManySteps {
        duration_days: u32,
        steps_per_day: u32,
    },
    #[error("a {duration_days} day animation window does not fit the supported date range")]
    WindowOutOfRange { duration_days: u32 },
}

impl AnimationConfig {
    pub fn validate(&self) -> Result<(), AnimationConfigError> {
        if self.duration_days == 0 {
            return Err(AnimationConfigError::EmptyWindow);
        }
        if self.steps_per_day == 0 || MILLIS_PER_DAY % i64::from(self.steps_per_day) != 0 {
            return Err(AnimationConfigError::UnevenSteps {
                steps_per_day: self.steps_per_day,
            });
        }
        if self.animate_speed.is_zero() {
            return Err(AnimationConfigError::ZeroSpeed);
        }
        self.step_count().map(|_| ())
    }

    /// Total number of steps in the window. Bounded by `i32::MAX` so every
    /// position maps onto a representable offset.
    pub fn step_count(&self) -> Result<u32, AnimationConfigError> {
        self.duration_days
            .checked_mul(self.steps_per_day)
            .filter(|steps| i32::try_from(*steps).is_ok())
            .ok_or(AnimationConfigError::TooManySteps {
                duration_days: self.duration_days,
                steps_per_day: self.steps_per_day,
            })
    }

    fn window_end(
        &self,
        window_start: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, AnimationConfigError> {
        TimeDelta::try_days(i64::from(self.duration_days))
            .and_then(|span| window_start.checked_add_signed(span))
            .ok_or(AnimationConfigError::WindowOutOfRange {
                duration_days: self.duration_days,
            })
    }

    pub fn step_size(&self) -> TimeDelta {
        TimeDelta::milliseconds(MILLIS_PER_DAY / i64::from(self.steps_per_day.max(1)))
    }
}

/// Viewer time zone used for the "Local Time" label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocalZone {
    #[default]
    System,
    Fixed(FixedOffset),
}

impl LocalZone {
    pub fn wall_clock(&self, time: DateTime<Utc>) -> NaiveDateTime {
        match self {
            Self::System => time.with_timezone(&Local).naive_local(),
            Self::Fixed(offset) => time.with_timezone(offset).naive_local(),
        }
    }
}

/// Renders the current-time label. Local labels only carry the hour.
pub fn format_label(time: DateTime<Utc>, use_local: bool, zone: LocalZone) -> String {
    if use_local {
        let local = zone.wall_clock(time);
        format!("{} Local Time", local.format("%Y-%m-%d %H:00:00"))
    } else {
        format!("{} UTC", time.format("%Y-%m-%d %H:%M:%S"))
    }
}

/// Discrete position over a fixed animation window.
///
/// The window is pinned to UTC midnight of the day the cursor was created and
/// never moves afterwards. `current_time` is always derived from the position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationCursor {
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    step_size: TimeDelta,
    step_count: u32,
    position: u32,
    is_playing: bool,
    use_local_display_time: bool,
}

impl AnimationCursor {
    pub fn new(now: DateTime<Utc>, config: &AnimationConfig) -> Result<Self, AnimationConfigError> {
        config.validate()?;
        let window_start = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        let window_end = config.window_end(window_start)?;
        Ok(Self {
            window_start,
            window_end,
            step_size: config.step_size(),
            step_count: config.step_count()?,
            position: 0,
            is_playing: false,
            use_local_display_time: false,
        })
    }

    pub fn window_start(&self) -> DateTime<Utc> {
        self.window_start
    }

    pub fn window_end(&self) -> DateTime<Utc> {
        self.window_end
    }

    pub fn step_size(&self) -> TimeDelta {
        self.step_size
    }

    pub fn step_count(&self) -> u32 {
        self.step_count
    }

    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn use_local_display_time(&self) -> bool {
        self.use_local_display_time
    }

    pub fn current_time(&self) -> DateTime<Utc> {
        let offset_ms = self.step_size.num_milliseconds() * i64::from(self.position);
        self.window_start + TimeDelta::milliseconds(offset_ms)
    }

    /// Moves one step forward, wrapping to the start once the end is reached.
    pub fn advance(&mut self) {
        self.position = if self.current_time() < self.window_end {
            self.position + 1
        } else {
            0
        };
    }

    /// Moves one step back, wrapping to the last position from the start.
    pub fn retreat(&mut self) {
        self.position = if self.current_time() > self.window_start {
            self.position - 1
        } else {
            self.step_count
        };
    }

    /// Sets the position, clamped into `0..=step_count`. Returns the position
    /// actually used.
    pub fn seek(&mut self, position: i64) -> u32 {
        self.position = position.clamp(0, i64::from(self.step_count)) as u32;
        self.position
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.is_playing = playing;
    }

    pub fn set_use_local_display_time(&mut self, use_local: bool) {
        self.use_local_display_time = use_local;
    }

    pub fn label(&self, zone: LocalZone) -> String {
        format_label(self.current_time(), self.use_local_display_time, zone)
    }
}

#[cfg(test)]
#[path = "tests/cursor_tests.rs"]
mod tests;
