//! Input abstraction and recording for replays

use gloam_core::glam::Vec2;
use gloam_core::time::{ButtonState, FrameInput};

/// Raw input sampled by the platform layer once per frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputState {
    pub move_x: f32,
    pub move_y: f32,
    /// Pointer position in window pixels.
    pub pointer: Vec2,
    pub primary: bool,
    pub secondary: bool,
    /// Edge-triggered: true only on the frame the toggle key went down.
    pub toggle_debug: bool,
}

impl InputState {
    /// Movement direction, normalized so diagonals are not faster.
    pub fn move_direction(&self) -> Vec2 {
        Vec2::new(self.move_x, self.move_y).clamp_length_max(1.0)
    }

    pub fn buttons(&self) -> ButtonState {
        let mut bits = 0;
        if self.primary {
            bits |= ButtonState::PRIMARY;
        }
        if self.secondary {
            bits |= ButtonState::SECONDARY;
        }
        if self.toggle_debug {
            bits |= ButtonState::DEBUG_OVERLAY;
        }
        ButtonState(bits)
    }

    pub fn to_frame_input(&self, dt: f32, window_size: Vec2) -> FrameInput {
        FrameInput {
            dt,
            window_size,
            pointer: self.pointer,
            buttons: self.buttons(),
        }
    }
}

/// Records per-frame input so a run can be replayed deterministically.
#[derive(Debug, Default)]
pub struct InputRecorder {
    frames: Vec<InputState>,
    recording: bool,
}

impl InputRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.frames.clear();
        self.recording = true;
    }

    pub fn stop(&mut self) {
        self.recording = false;
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn record(&mut self, state: InputState) {
        if self.recording {
            self.frames.push(state);
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn replay(&self) -> impl Iterator<Item = &InputState> {
        self.frames.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buttons_map_to_frame_input() {
        let state = InputState {
            pointer: Vec2::new(3.0, 4.0),
            primary: true,
            toggle_debug: true,
            ..InputState::default()
        };
        let input = state.to_frame_input(0.5, Vec2::new(640.0, 480.0));
        assert_eq!(input.dt, 0.5);
        assert_eq!(input.pointer, Vec2::new(3.0, 4.0));
        assert!(input.buttons.is_down(ButtonState::PRIMARY));
        assert!(!input.buttons.is_down(ButtonState::SECONDARY));
        assert!(input.buttons.is_down(ButtonState::DEBUG_OVERLAY));
    }

    #[test]
    fn diagonal_movement_is_normalized() {
        let state = InputState {
            move_x: 1.0,
            move_y: 1.0,
            ..InputState::default()
        };
        assert!((state.move_direction().length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn recorder_only_keeps_frames_while_recording() {
        let mut recorder = InputRecorder::new();
        recorder.record(InputState::default());
        recorder.start();
        recorder.record(InputState {
            move_x: 1.0,
            ..InputState::default()
        });
        recorder.stop();
        recorder.record(InputState::default());
        assert_eq!(recorder.len(), 1);
        assert_eq!(recorder.replay().next().map(|s| s.move_x), Some(1.0));
    }
}
