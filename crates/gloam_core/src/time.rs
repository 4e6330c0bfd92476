//! Simulation time and per-frame input
//!
//! Fixed 60Hz default step; the world advances exactly one frame per `FrameInput`.

use glam::Vec2;
use std::time::Duration;

/// Default simulation tick rate (60 Hz = 16.666ms per tick)
pub const TICK_RATE_HZ: u32 = 60;
pub const TICK_DURATION: Duration = Duration::from_micros(16_666); // ~16.666ms
pub const TICK_DURATION_SECS: f32 = 1.0 / TICK_RATE_HZ as f32;

/// Pointer buttons and keys the simulation reacts to, as a bitmask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonState(pub u32);

impl ButtonState {
    pub const PRIMARY: u32 = 1 << 0;
    pub const SECONDARY: u32 = 1 << 1;
    pub const DEBUG_OVERLAY: u32 = 1 << 2;

    #[inline]
    pub fn is_down(self, button: u32) -> bool {
        self.0 & button != 0
    }
}

/// Per-frame record handed to `World::update`.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput {
    /// Seconds to advance this frame.
    pub dt: f32,
    /// Window size in pixels, used for the visible rectangle.
    pub window_size: Vec2,
    /// Pointer position in screen pixels.
    pub pointer: Vec2,
    pub buttons: ButtonState,
}

impl FrameInput {
    pub fn with_dt(dt: f32) -> Self {
        Self {
            dt,
            ..Self::default()
        }
    }
}

impl Default for FrameInput {
    fn default() -> Self {
        Self {
            dt: TICK_DURATION_SECS,
            window_size: Vec2::new(1280.0, 720.0),
            pointer: Vec2::ZERO,
            buttons: ButtonState::default(),
        }
    }
}

/// Simulation time tracker
pub struct SimulationTime {
    tick_count: u64,
    elapsed_secs: f64,
}

impl SimulationTime {
    pub fn new() -> Self {
        Self {
            tick_count: 0,
            elapsed_secs: 0.0,
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn advance_tick(&mut self, dt: f32) {
        self.tick_count += 1;
        self.elapsed_secs += dt as f64;
    }

    pub fn total_time(&self) -> Duration {
        Duration::from_secs_f64(self.elapsed_secs)
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_secs
    }
}

impl Default for SimulationTime {
    fn default() -> Self {
        Self::new()
    }
}
