//! Fixed-timestep clock.
//!
//! Real frame deltas are accumulated as integer nanoseconds (no float drift)
//! and dispensed as fixed simulation steps, with a per-frame catch-up cap so
//! a long stall cannot snowball into an unbounded burst of steps.

use std::time::Duration;

use bevy::prelude::Resource;

/// Fixed-timestep accumulator and elapsed-time counter in one.
///
/// ```ignore
/// clock.begin_frame(frame_delta);
/// while clock.try_step() {
///     // run one fixed simulation tick of clock.timestep_secs()
/// }
/// ```
#[derive(Debug, Clone, Resource)]
pub struct TickClock {
    elapsed_nanos: u64,
    accumulated: u64,
    timestep_nanos: u64,
    timestep_secs: f64,
    max_catch_up: u32,
    steps_this_frame: u32,
}

impl TickClock {
    /// Create a clock with the given fixed timestep in seconds.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(timestep_secs: f64) -> Self {
        Self {
            elapsed_nanos: 0,
            accumulated: 0,
            timestep_nanos: (timestep_secs * 1_000_000_000.0) as u64,
            timestep_secs,
            max_catch_up: 5,
            steps_this_frame: 0,
        }
    }

    /// Cap on catch-up steps dispensed per frame.
    #[must_use]
    pub const fn with_max_catch_up(mut self, max_catch_up: u32) -> Self {
        self.max_catch_up = max_catch_up;
        self
    }

    /// Feed a real frame delta and reset the per-frame step counter.
    #[allow(clippy::cast_possible_truncation)]
    pub const fn begin_frame(&mut self, delta: Duration) {
        self.accumulated = self.accumulated.saturating_add(delta.as_nanos() as u64);
        self.steps_this_frame = 0;
    }

    /// Consume one fixed step if enough time is accumulated and the cap has
    /// not been reached. Advances elapsed simulation time on success.
    pub const fn try_step(&mut self) -> bool {
        if self.steps_this_frame >= self.max_catch_up {
            return false;
        }
        if self.accumulated < self.timestep_nanos {
            return false;
        }
        self.accumulated -= self.timestep_nanos;
        self.steps_this_frame += 1;
        self.elapsed_nanos = self.elapsed_nanos.saturating_add(self.timestep_nanos);
        true
    }

    /// The fixed timestep in seconds.
    #[must_use]
    pub const fn timestep_secs(&self) -> f64 {
        self.timestep_secs
    }

    /// Elapsed simulation time in seconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_nanos as f64 / 1_000_000_000.0
    }

    /// Fraction of the next step already accumulated, in `[0, 1)`.
    /// Useful for visual interpolation between physics states.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn alpha(&self) -> f32 {
        if self.timestep_nanos == 0 {
            return 0.0;
        }
        self.accumulated as f32 / self.timestep_nanos as f32
    }

    /// Zero elapsed time and drop any accumulated remainder.
    pub const fn reset(&mut self) {
        self.elapsed_nanos = 0;
        self.accumulated = 0;
        self.steps_this_frame = 0;
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new(1.0 / 60.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
