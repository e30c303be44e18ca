use std::{
    ops::RangeInclusive,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    command::AnimationCommand,
    cursor::{AnimationConfig, AnimationConfigError, AnimationCursor, LocalZone},
    LabelSink, StreamingLayer,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnimationSnapshot {
    pub position: u32,
    pub step_count: u32,
    pub is_playing: bool,
    pub use_local_display_time: bool,
    pub current_time: DateTime<Utc>,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub label: String,
}

struct ControllerState {
    cursor: AnimationCursor,
    label: String,
    /// Bumped by every `play`; a loop task only ticks while it owns the latest.
    generation: u64,
}

struct ControllerInner {
    state: Mutex<ControllerState>,
    layer: Arc<dyn StreamingLayer>,
    label_sink: Arc<dyn LabelSink>,
    animate_speed: Duration,
    zone: LocalZone,
}

/// Cloneable handle to the session's animation cursor.
///
/// Collaborators are invoked with the cursor locked so ranges reach the layer
/// in cursor order; they must not call back into the controller.
#[derive(Clone)]
pub struct AnimationController {
    inner: Arc<ControllerInner>,
}

impl AnimationController {
    pub fn new(
        now: DateTime<Utc>,
        config: AnimationConfig,
        zone: LocalZone,
        layer: Arc<dyn StreamingLayer>,
        label_sink: Arc<dyn LabelSink>,
    ) -> Result<Self, AnimationConfigError> {
        let cursor = AnimationCursor::new(now, &config)?;
        let label = cursor.label(zone);
        label_sink.show_label(&label);
        info!(
            window_start = %cursor.window_start(),
            window_end = %cursor.window_end(),
            step_count = cursor.step_count(),
            "animation window ready"
        );

        Ok(Self {
            inner: Arc::new(ControllerInner {
                state: Mutex::new(ControllerState {
                    cursor,
                    label,
                    generation: 0,
                }),
                layer,
                label_sink,
                animate_speed: config.animate_speed,
                zone,
            }),
        })
    }

    /// Starts the play loop. Must be called from within a tokio runtime.
    pub fn play(&self) {
        let generation = {
            let mut state = self.lock();
            if state.cursor.is_playing() {
                debug!("animation already playing");
                return;
            }
            state.cursor.set_playing(true);
            state.generation += 1;
            self.tick(&mut state);
            state.generation
        };
        info!(generation, "animation playing");

        let controller = self.clone();
        tokio::spawn(async move { controller.run_loop(generation).await });
    }

    /// Clears the playing flag. A pending loop iteration still wakes up and
    /// then exits without touching the cursor.
    pub fn stop(&self) {
        let mut state = self.lock();
        if state.cursor.is_playing() {
            info!(position = state.cursor.position(), "animation stopped");
        }
        state.cursor.set_playing(false);
    }

    /// Single tick forward. Leaves the animation stopped.
    pub fn step_forward(&self) {
        let mut state = self.lock();
        state.cursor.set_playing(true);
        self.tick(&mut state);
        state.cursor.set_playing(false);
    }

    pub fn step_backward(&self) {
        let mut state = self.lock();
        state.cursor.retreat();
        self.apply_range(&mut state);
    }

    pub fn seek(&self, position: i64) {
        let mut state = self.lock();
        let applied = state.cursor.seek(position);
        if i64::from(applied) != position {
            warn!(
                requested = position,
                applied,
                step_count = state.cursor.step_count(),
                "slider position outside animation window; clamped"
            );
        }
        self.apply_range(&mut state);
    }

    pub fn set_display_mode(&self, use_local: bool) {
        let mut state = self.lock();
        state.cursor.set_use_local_display_time(use_local);
        self.render_label(&mut state);
    }

    pub fn dispatch(&self, command: AnimationCommand) {
        debug!(command = command.name(), "animation command");
        match command {
            AnimationCommand::Play => self.play(),
            AnimationCommand::Stop => self.stop(),
            AnimationCommand::StepForward => self.step_forward(),
            AnimationCommand::StepBackward => self.step_backward(),
            AnimationCommand::Seek(position) => self.seek(position),
            AnimationCommand::SetDisplayMode { use_local } => self.set_display_mode(use_local),
        }
    }

    pub fn snapshot(&self) -> AnimationSnapshot {
        let state = self.lock();
        let cursor = &state.cursor;
        AnimationSnapshot {
            position: cursor.position(),
            step_count: cursor.step_count(),
            is_playing: cursor.is_playing(),
            use_local_display_time: cursor.use_local_display_time(),
            current_time: cursor.current_time(),
            window_start: cursor.window_start(),
            window_end: cursor.window_end(),
            label: state.label.clone(),
        }
    }

    pub fn label(&self) -> String {
        self.lock().label.clone()
    }

    /// Bounds for the position slider.
    pub fn slider_range(&self) -> RangeInclusive<u32> {
        0..=self.lock().cursor.step_count()
    }

    /// Range the streaming layer should be created with.
    pub fn initial_range(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let state = self.lock();
        (state.cursor.window_start(), state.cursor.window_end())
    }

    async fn run_loop(self, generation: u64) {
        loop {
            tokio::time::sleep(self.inner.animate_speed).await;
            if !self.tick_if_current(generation) {
                debug!(generation, "animation loop finished");
                return;
            }
        }
    }

    fn tick_if_current(&self, generation: u64) -> bool {
        let mut state = self.lock();
        if !state.cursor.is_playing() || state.generation != generation {
            return false;
        }
        self.tick(&mut state);
        true
    }

    fn tick(&self, state: &mut ControllerState) {
        state.cursor.advance();
        self.apply_range(state);
    }

    fn apply_range(&self, state: &mut ControllerState) {
        self.render_label(state);
        let current_time = state.cursor.current_time();
        let window_end = state.cursor.window_end();
        debug!(
            position = state.cursor.position(),
            %current_time,
            "applying layer time range"
        );
        self.inner.layer.set_time_range(current_time, window_end);
    }

    fn render_label(&self, state: &mut ControllerState) {
        state.label = state.cursor.label(self.inner.zone);
        self.inner.label_sink.show_label(&state.label);
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
