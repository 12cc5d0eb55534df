//! Frame clock with fixed-timestep accumulator and spiral-of-death guard
//!
//! The host calls [`FrameClock::tick`] once per display frame with a
//! millisecond timestamp, drains fixed steps with
//! [`should_fixed_update`](FrameClock::should_fixed_update) /
//! [`consume_fixed_step`](FrameClock::consume_fixed_step), then closes the
//! frame with [`end_frame`](FrameClock::end_frame) so the spiral counters see
//! how much catch-up work the frame did.

use crate::config::GameConfig;

/// Slack used when comparing the accumulator against the step size.
///
/// `1000 / 60` is not representable exactly, so three banked steps would
/// otherwise come up a hair short of the third threshold.
const STEP_EPSILON_MS: f64 = 1e-6;

/// Elapsed time handed to update hooks, in both milliseconds and seconds
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Delta {
    pub ms: f64,
    pub secs: f64,
}

impl Delta {
    pub const ZERO: Self = Self { ms: 0.0, secs: 0.0 };

    pub fn from_ms(ms: f64) -> Self {
        Self {
            ms,
            secs: ms / 1000.0,
        }
    }
}

/// What a single `run_frame` call did
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameReport {
    /// Number of fixed-rate ticks dispatched this frame
    pub fixed_steps: u32,
    /// Delta passed to each fixed-rate tick (step scaled by speed)
    pub fixed_delta: Delta,
    /// Delta passed to the variable-rate tick (raw elapsed time)
    pub frame_delta: Delta,
    /// The spiral guard discarded the accumulator this frame
    pub spiral_reset: bool,
    /// The runtime was not awake, nothing ran
    pub skipped: bool,
}

impl FrameReport {
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}

/// Converts irregular frame timestamps into fixed-size simulation steps
#[derive(Debug, Clone)]
pub struct FrameClock {
    /// Target fixed-rate ticks per second
    desired_fps: f64,
    /// Multiplier applied to the delta handed to fixed-rate ticks
    speed: f64,
    /// Accumulation clamp, in whole steps
    max_catch_up_steps: u32,
    /// Step and speed snapshotted at the start of the current frame
    frame_step_ms: f64,
    frame_speed: f64,
    /// Previous frame timestamp; `None` until the first tick
    last_timestamp: Option<f64>,
    /// Banked, not yet consumed time in milliseconds
    accumulator: f64,
    /// Consecutive frames whose step count grew
    spiraling: u32,
    steps_this_frame: u32,
    steps_last_frame: u32,
    /// Set when the guard fired this frame; blocks fixed steps until the next tick
    spiral_tripped: bool,
    /// Raw elapsed time of the current frame
    frame_delta_ms: f64,
    total_time_ms: f64,
    frame_count: u64,
    spiral_resets: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::from_config(&GameConfig::default())
    }
}

impl FrameClock {
    /// Create a new frame clock targeting 60 fixed steps per second
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a frame clock with a custom fixed rate
    pub fn with_desired_fps(fps: f64) -> Self {
        let mut clock = Self::default();
        clock.desired_fps = fps;
        clock.frame_step_ms = 1000.0 / fps;
        clock
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            desired_fps: config.desired_fps,
            speed: config.speed,
            max_catch_up_steps: config.max_catch_up_steps,
            frame_step_ms: 1000.0 / config.desired_fps,
            frame_speed: config.speed,
            last_timestamp: None,
            accumulator: 0.0,
            spiraling: 0,
            steps_this_frame: 0,
            steps_last_frame: 0,
            spiral_tripped: false,
            frame_delta_ms: 0.0,
            total_time_ms: 0.0,
            frame_count: 0,
            spiral_resets: 0,
        }
    }

    /// Apply fps, speed and catch-up settings; they take effect on the next tick
    pub fn apply_config(&mut self, config: &GameConfig) {
        self.desired_fps = config.desired_fps;
        self.speed = config.speed;
        self.max_catch_up_steps = config.max_catch_up_steps;
    }

    pub fn set_desired_fps(&mut self, fps: f64) {
        self.desired_fps = fps;
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed;
    }

    pub fn desired_fps(&self) -> f64 {
        self.desired_fps
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Fixed step length in effect for the current frame
    pub fn step_ms(&self) -> f64 {
        self.frame_step_ms
    }

    /// Forget the previous timestamp so the next tick becomes a baseline frame
    pub fn reset_baseline(&mut self) {
        self.last_timestamp = None;
        self.accumulator = 0.0;
        self.spiraling = 0;
        self.steps_last_frame = 0;
    }

    /// Advance the clock. Call once per frame.
    pub fn tick(&mut self, timestamp_ms: f64) {
        self.frame_step_ms = 1000.0 / self.desired_fps;
        self.frame_speed = self.speed;
        self.steps_this_frame = 0;
        self.spiral_tripped = false;
        self.frame_count += 1;

        let elapsed = if !timestamp_ms.is_finite() {
            log::warn!("ignoring non-finite frame timestamp {timestamp_ms}");
            0.0
        } else {
            let elapsed = match self.last_timestamp {
                Some(last) => (timestamp_ms - last).max(0.0),
                None => 0.0,
            };
            self.last_timestamp = Some(timestamp_ms);
            elapsed
        };

        self.frame_delta_ms = elapsed;
        self.total_time_ms += elapsed;

        // Bound how much real time one frame can bank
        let max_banked = self.frame_step_ms * f64::from(self.max_catch_up_steps);
        self.accumulator += elapsed.min(max_banked);

        if self.spiraling > 1 {
            log::debug!(
                "spiral guard fired, dropping {:.3}ms of owed simulation time",
                self.accumulator
            );
            self.accumulator = 0.0;
            self.spiraling = 0;
            self.spiral_tripped = true;
            self.spiral_resets += 1;
        }
    }

    /// Returns true if there's enough accumulated time for a fixed update step
    pub fn should_fixed_update(&self) -> bool {
        !self.spiral_tripped && self.accumulator + STEP_EPSILON_MS >= self.frame_step_ms
    }

    /// Consume one fixed timestep from the accumulator, returning the
    /// speed-scaled delta for the fixed-rate tick
    pub fn consume_fixed_step(&mut self) -> Delta {
        self.accumulator = (self.accumulator - self.frame_step_ms).max(0.0);
        self.steps_this_frame += 1;
        self.fixed_delta()
    }

    /// Delta handed to fixed-rate ticks during the current frame
    pub fn fixed_delta(&self) -> Delta {
        Delta::from_ms(self.frame_step_ms * self.frame_speed)
    }

    /// Close the frame and update the spiral counters.
    ///
    /// A frame dropped by the spiral guard is recorded as a zero-step frame,
    /// so the first frame that steps again counts as growth.
    pub fn end_frame(&mut self) {
        if self.spiral_tripped {
            self.steps_last_frame = 0;
            return;
        }
        if self.steps_this_frame > self.steps_last_frame {
            self.spiraling += 1;
        } else if self.steps_this_frame < self.steps_last_frame {
            self.spiraling = 0;
        }
        self.steps_last_frame = self.steps_this_frame;
    }

    /// Get the interpolation alpha for rendering between fixed steps
    pub fn interpolation_alpha(&self) -> f64 {
        self.accumulator / self.frame_step_ms
    }

    /// Raw elapsed time of the current frame
    pub fn frame_delta(&self) -> Delta {
        Delta::from_ms(self.frame_delta_ms)
    }

    pub fn accumulator_ms(&self) -> f64 {
        self.accumulator
    }

    pub fn spiraling(&self) -> u32 {
        self.spiraling
    }

    pub fn spiral_tripped(&self) -> bool {
        self.spiral_tripped
    }

    pub fn steps_this_frame(&self) -> u32 {
        self.steps_this_frame
    }

    pub fn total_time_ms(&self) -> f64 {
        self.total_time_ms
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn spiral_resets(&self) -> u64 {
        self.spiral_resets
    }
}
