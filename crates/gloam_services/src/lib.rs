//! Gloam Services Layer
//!
//! Platform-facing glue around the simulation: settings files and input.

pub mod input;
pub mod settings;

pub use input::{InputRecorder, InputState};
pub use settings::{DisplaySettings, LoggingSettings, Settings, SettingsError};

use gloam_core::glam::Vec2;
use gloam_core::FrameInput;
use tracing::info;

/// Services shared by the runtime loop.
#[derive(Debug)]
pub struct Services {
    pub settings: Settings,
    pub input: InputState,
    pub recorder: InputRecorder,
}

impl Services {
    pub fn window_size(&self) -> Vec2 {
        Vec2::new(
            self.settings.display.resolution_width as f32,
            self.settings.display.resolution_height as f32,
        )
    }

    /// Build this frame's input and record it when a recording is running.
    pub fn frame_input(&mut self, dt: f32) -> FrameInput {
        self.recorder.record(self.input);
        let input = self.input.to_frame_input(dt, self.window_size());
        // Edge-triggered keys only last one frame.
        self.input.toggle_debug = false;
        input
    }
}

pub fn init_services(settings: Settings) -> Services {
    info!(
        width = settings.display.resolution_width,
        height = settings.display.resolution_height,
        max_entities = settings.world.max_entities,
        "services initialized"
    );
    Services {
        settings,
        input: InputState::default(),
        recorder: InputRecorder::new(),
    }
}
