//! Draw commands and their sort key.
//!
//! ```text
//! SortKey (u64)
//! 63      56 55     44 43        28 27    20 19       0
//! ┌─────────┬─────────┬────────────┬────────┬──────────┐
//! │ layer   │ shader  │ texture    │ font   │ depth    │
//! │ 8 bits  │ 12 bits │ 16 bits    │ 8 bits │ 20 bits  │
//! └─────────┴─────────┴────────────┴────────┴──────────┘
//! ```
//!
//! Sorting by the raw key draws layers back to front, then groups state
//! changes, then orders by screen depth so lower sprites overlap higher ones.

use bytemuck::{Pod, Zeroable};

use crate::handles::{FontHandle, ShaderHandle, TextureHandle};

const LAYER_SHIFT: u32 = 56;
const SHADER_SHIFT: u32 = 44;
const TEXTURE_SHIFT: u32 = 28;
const FONT_SHIFT: u32 = 20;

const SHADER_MASK: u64 = 0xFFF;
const TEXTURE_MASK: u64 = 0xFFFF;
const FONT_MASK: u64 = 0xFF;
pub const DEPTH_MASK: u32 = 0xF_FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Layer {
    Floor = 0,
    Wall = 1,
    Entity = 2,
    Particle = 3,
    /// Hitsplats and lights.
    Overlay = 4,
    Debug = 5,
}

impl Layer {
    fn from_bits(bits: u8) -> Option<Self> {
        Some(match bits {
            0 => Layer::Floor,
            1 => Layer::Wall,
            2 => Layer::Entity,
            3 => Layer::Particle,
            4 => Layer::Overlay,
            5 => Layer::Debug,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SortKey(pub u64);

impl SortKey {
    /// Pack a key. Handle ids wider than their field are truncated; depth is
    /// clamped into 20 bits.
    pub fn new(
        layer: Layer,
        shader: ShaderHandle,
        texture: TextureHandle,
        font: FontHandle,
        depth: u32,
    ) -> Self {
        let key = ((layer as u64) << LAYER_SHIFT)
            | ((shader.id as u64 & SHADER_MASK) << SHADER_SHIFT)
            | ((texture.id as u64 & TEXTURE_MASK) << TEXTURE_SHIFT)
            | ((font.id as u64 & FONT_MASK) << FONT_SHIFT)
            | depth.min(DEPTH_MASK) as u64;
        Self(key)
    }

    /// Depth from a screen-space y coordinate; anything above the screen is 0.
    pub fn depth_from_screen_y(y: f32) -> u32 {
        if y.is_nan() || y <= 0.0 {
            0
        } else {
            (y as u32).min(DEPTH_MASK)
        }
    }

    pub fn layer(self) -> Option<Layer> {
        Layer::from_bits((self.0 >> LAYER_SHIFT) as u8)
    }

    pub fn shader(self) -> ShaderHandle {
        ShaderHandle::new(((self.0 >> SHADER_SHIFT) & SHADER_MASK) as u16)
    }

    pub fn texture(self) -> TextureHandle {
        TextureHandle::new(((self.0 >> TEXTURE_SHIFT) & TEXTURE_MASK) as u16)
    }

    pub fn font(self) -> FontHandle {
        FontHandle::new(((self.0 >> FONT_SHIFT) & FONT_MASK) as u16)
    }

    pub fn depth(self) -> u32 {
        (self.0 as u32) & DEPTH_MASK
    }
}

/// One quad (or glyph run) in screen space, laid out for direct upload.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DrawCommand {
    pub sort_key: u64,
    /// x, y, width, height in screen pixels.
    pub rect: [f32; 4],
    pub color: [u8; 4],
    /// Animation frame, hitsplat amount or zero.
    pub param: u32,
}

impl DrawCommand {
    pub fn key(&self) -> SortKey {
        SortKey(self.sort_key)
    }

    pub fn layer(&self) -> Option<Layer> {
        self.key().layer()
    }
}

/// Commands for one frame. Cleared and refilled by `render_world`.
#[derive(Debug, Default)]
pub struct DrawBatch {
    commands: Vec<DrawCommand>,
}

impl DrawBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            commands: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, key: SortKey, rect: [f32; 4], color: [u8; 4], param: u32) {
        self.commands.push(DrawCommand {
            sort_key: key.0,
            rect,
            color,
            param,
        });
    }

    /// Stable sort, so equal keys keep emission order.
    pub fn sort(&mut self) {
        self.commands.sort_by_key(|c| c.sort_key);
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn count_layer(&self, layer: Layer) -> usize {
        self.commands
            .iter()
            .filter(|c| c.layer() == Some(layer))
            .count()
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_fields_round_trip() {
        let key = SortKey::new(
            Layer::Particle,
            ShaderHandle::new(0xABC),
            TextureHandle::new(0xBEEF),
            FontHandle::new(0x42),
            123_456,
        );
        assert_eq!(key.layer(), Some(Layer::Particle));
        assert_eq!(key.shader(), ShaderHandle::new(0xABC));
        assert_eq!(key.texture(), TextureHandle::new(0xBEEF));
        assert_eq!(key.font(), FontHandle::new(0x42));
        assert_eq!(key.depth(), 123_456);
    }

    #[test]
    fn layer_dominates_ordering() {
        let wall = SortKey::new(
            Layer::Wall,
            ShaderHandle::new(0xFFF),
            TextureHandle::new(0xFFFF),
            FontHandle::default(),
            DEPTH_MASK,
        );
        let entity = SortKey::new(
            Layer::Entity,
            ShaderHandle::default(),
            TextureHandle::default(),
            FontHandle::default(),
            0,
        );
        assert!(wall < entity);
    }

    #[test]
    fn depth_is_clamped() {
        assert_eq!(SortKey::depth_from_screen_y(-5.0), 0);
        assert_eq!(SortKey::depth_from_screen_y(1e9), DEPTH_MASK);
        let key = SortKey::new(
            Layer::Floor,
            ShaderHandle::default(),
            TextureHandle::default(),
            FontHandle::default(),
            u32::MAX,
        );
        assert_eq!(key.layer(), Some(Layer::Floor));
        assert_eq!(key.depth(), DEPTH_MASK);
    }

    #[test]
    fn batch_bytes_match_command_layout() {
        assert_eq!(std::mem::size_of::<DrawCommand>(), 32);
        let mut batch = DrawBatch::new();
        batch.push(SortKey(2), [0.0; 4], [255; 4], 0);
        batch.push(SortKey(1), [0.0; 4], [255; 4], 7);
        batch.sort();
        assert_eq!(batch.commands()[0].param, 7);
        assert_eq!(batch.as_bytes().len(), 64);
    }
}
