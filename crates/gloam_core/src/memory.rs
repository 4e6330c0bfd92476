//! Per-frame scratch memory
//!
//! Query result lists and debug text are borrowed from the arena during a frame
//! and recycled by `reset` at the start of the next one.

use crate::ecs::EntityId;

/// Scratch storage reset once per frame.
pub struct FrameArena {
    id_lists: Vec<Vec<EntityId>>,
    text: String,
    lists_handed_out: usize,
    peak_ids: usize,
}

impl FrameArena {
    pub fn new() -> Self {
        Self {
            id_lists: Vec::new(),
            text: String::new(),
            lists_handed_out: 0,
            peak_ids: 0,
        }
    }

    /// Borrow an empty id list. Hand it back with `give_back` to reuse its allocation.
    pub fn take_ids(&mut self) -> Vec<EntityId> {
        self.lists_handed_out += 1;
        let mut list = self.id_lists.pop().unwrap_or_default();
        list.clear();
        list
    }

    pub fn give_back(&mut self, mut list: Vec<EntityId>) {
        self.peak_ids = self.peak_ids.max(list.len());
        list.clear();
        self.id_lists.push(list);
    }

    /// Append formatted debug text for this frame.
    pub fn debug_line(&mut self, args: std::fmt::Arguments<'_>) {
        self.text.push_str(&args.to_string());
        self.text.push('\n');
    }

    pub fn debug_text(&self) -> &str {
        &self.text
    }

    /// Lists borrowed since the last reset.
    pub fn lists_handed_out(&self) -> usize {
        self.lists_handed_out
    }

    /// Longest list returned since creation.
    pub fn peak_ids(&self) -> usize {
        self.peak_ids
    }

    pub fn reset(&mut self) {
        self.text.clear();
        self.lists_handed_out = 0;
    }
}

impl Default for FrameArena {
    fn default() -> Self {
        Self::new()
    }
}
