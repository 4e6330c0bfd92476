//! Gloam Render
//!
//! Turns a simulated `World` into a sorted list of draw commands. The GPU
//! backend is not part of this crate; it consumes `DrawBatch::as_bytes`.

pub mod command;
pub mod extract;
pub mod handles;

pub use command::{DrawBatch, DrawCommand, Layer, SortKey};
pub use extract::{render_world, RenderAssets};
pub use handles::{FontHandle, ShaderHandle, TextureHandle};
