//! Quadtree spatial index over entity rectangles.
//!
//! Nodes live in an arena and are addressed by index. Each entity is stored once,
//! in the deepest node whose rectangle fully contains its area. Areas that straddle
//! a child boundary (or leave the root bounds) stay in the parent.
//!
//! A `QuadTreeLocation` remembers the node an entity was inserted into. Splits can
//! move entries further down, never up, so lookups walk down from the remembered
//! node along the one child that contains the stored area.

use crate::ecs::EntityId;
use crate::math::Rect;

const ROOT: u32 = 0;
const NO_NODE: u32 = u32::MAX;

/// Where an entity was last inserted, and with which area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadTreeLocation {
    pub node: u32,
    pub area: Rect,
}

impl QuadTreeLocation {
    pub const NULL: QuadTreeLocation = QuadTreeLocation {
        node: NO_NODE,
        area: Rect::ZERO,
    };

    #[inline]
    pub fn is_null(&self) -> bool {
        self.node == NO_NODE
    }
}

impl Default for QuadTreeLocation {
    fn default() -> Self {
        Self::NULL
    }
}

#[derive(Debug, Clone, Copy)]
pub struct QuadTreeConfig {
    /// Leaf entry count above which a leaf splits.
    pub split_threshold: usize,
    /// Leaves at this depth never split.
    pub max_depth: u32,
}

impl Default for QuadTreeConfig {
    fn default() -> Self {
        Self {
            split_threshold: 8,
            max_depth: 8,
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    rect: Rect,
    depth: u32,
    parent: u32,
    /// TL, TR, BR, BL.
    children: Option<[u32; 4]>,
    entries: Vec<(EntityId, Rect)>,
    in_use: bool,
}

impl Node {
    fn new(rect: Rect, depth: u32, parent: u32) -> Self {
        Self {
            rect,
            depth,
            parent,
            children: None,
            entries: Vec::new(),
            in_use: true,
        }
    }

    #[inline]
    fn is_empty_leaf(&self) -> bool {
        self.children.is_none() && self.entries.is_empty()
    }
}

pub struct QuadTree {
    nodes: Vec<Node>,
    free_nodes: Vec<u32>,
    config: QuadTreeConfig,
    len: usize,
    stack: Vec<u32>,
}

impl QuadTree {
    pub fn new(bounds: Rect, config: QuadTreeConfig) -> Self {
        assert!(config.split_threshold > 0, "quadtree split threshold must be positive");
        Self {
            nodes: vec![Node::new(bounds, 0, NO_NODE)],
            free_nodes: Vec::new(),
            config,
            len: 0,
            stack: Vec::new(),
        }
    }

    #[inline]
    pub fn bounds(&self) -> Rect {
        self.nodes[ROOT as usize].rect
    }

    /// Number of stored entities.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Nodes currently in use (root included).
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free_nodes.len()
    }

    /// Rectangles of every live node, for debug overlays.
    pub fn node_rects(&self) -> impl Iterator<Item = Rect> + '_ {
        self.nodes.iter().filter(|n| n.in_use).map(|n| n.rect)
    }

    /// Insert, move or keep an entity so its stored area becomes `new_area`.
    ///
    /// Pass `QuadTreeLocation::NULL` for an entity not yet in the tree. Returns the
    /// location to keep for the next call.
    pub fn set_entity_area(
        &mut self,
        entity: EntityId,
        location: QuadTreeLocation,
        new_area: Rect,
    ) -> QuadTreeLocation {
        if location.is_null() {
            return self.insert(entity, new_area);
        }
        if location.area == new_area {
            return location;
        }

        let Some((node, slot)) = self.find(entity, &location) else {
            panic!("entity {entity} is not stored at its quadtree location");
        };

        if self.owns(node, &new_area) {
            self.nodes[node as usize].entries[slot].1 = new_area;
            return QuadTreeLocation {
                node,
                area: new_area,
            };
        }

        self.remove_at(node, slot);
        self.insert(entity, new_area)
    }

    /// Remove an entity. Returns false when it was not found at `location`.
    pub fn remove_entity(&mut self, entity: EntityId, location: QuadTreeLocation) -> bool {
        if location.is_null() {
            return false;
        }
        match self.find(entity, &location) {
            Some((node, slot)) => {
                self.remove_at(node, slot);
                true
            }
            None => false,
        }
    }

    /// Append every entity whose area overlaps `area` (edges inclusive) to `out`.
    pub fn get_entities_in_area(&mut self, area: &Rect, out: &mut Vec<EntityId>) {
        let mut stack = std::mem::take(&mut self.stack);
        stack.clear();
        stack.push(ROOT);

        while let Some(index) = stack.pop() {
            let node = &self.nodes[index as usize];
            out.extend(
                node.entries
                    .iter()
                    .filter(|(_, entry)| entry.intersects(area))
                    .map(|(id, _)| *id),
            );
            if let Some(children) = node.children {
                stack.extend(
                    children
                        .iter()
                        .copied()
                        .filter(|&c| self.nodes[c as usize].rect.intersects(area)),
                );
            }
        }

        self.stack = stack;
    }

    /// Read-only variant of `get_entities_in_area` for callers holding `&self`.
    pub fn query(&self, area: &Rect, out: &mut Vec<EntityId>) {
        let mut stack = vec![ROOT];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index as usize];
            out.extend(
                node.entries
                    .iter()
                    .filter(|(_, entry)| entry.intersects(area))
                    .map(|(id, _)| *id),
            );
            if let Some(children) = node.children {
                stack.extend(
                    children
                        .iter()
                        .copied()
                        .filter(|&c| self.nodes[c as usize].rect.intersects(area)),
                );
            }
        }
    }

    fn insert(&mut self, entity: EntityId, area: Rect) -> QuadTreeLocation {
        let node = self.descend(ROOT, &area);
        self.nodes[node as usize].entries.push((entity, area));
        self.len += 1;
        self.maybe_split(node);
        QuadTreeLocation { node, area }
    }

    /// Deepest node at or below `start` that fully contains `area`.
    fn descend(&self, start: u32, area: &Rect) -> u32 {
        let mut node = start;
        while let Some(child) = self.containing_child(node, area) {
            node = child;
        }
        node
    }

    fn containing_child(&self, node: u32, area: &Rect) -> Option<u32> {
        let children = self.nodes[node as usize].children?;
        children
            .into_iter()
            .find(|&c| self.nodes[c as usize].rect.contains_rect(area))
    }

    /// True when an insert of `area` would land in `node` itself.
    fn owns(&self, node: u32, area: &Rect) -> bool {
        let holder = &self.nodes[node as usize];
        let inside = holder.rect.contains_rect(area) || (node == ROOT);
        inside && self.containing_child(node, area).is_none()
    }

    fn find(&self, entity: EntityId, location: &QuadTreeLocation) -> Option<(u32, usize)> {
        let mut node = location.node;
        loop {
            let holder = self.nodes.get(node as usize).filter(|n| n.in_use)?;
            if let Some(slot) = holder.entries.iter().position(|(id, _)| *id == entity) {
                return Some((node, slot));
            }
            node = self.containing_child(node, &location.area)?;
        }
    }

    fn remove_at(&mut self, node: u32, slot: usize) {
        self.nodes[node as usize].entries.swap_remove(slot);
        self.len -= 1;
        self.try_merge(node);
    }

    fn maybe_split(&mut self, node: u32) {
        let (rect, depth) = {
            let n = &self.nodes[node as usize];
            if n.children.is_some()
                || n.entries.len() <= self.config.split_threshold
                || n.depth >= self.config.max_depth
            {
                return;
            }
            (n.rect, n.depth)
        };

        let quadrants = rect.quadrants();
        let mut children = [NO_NODE; 4];
        for (child, quadrant) in children.iter_mut().zip(quadrants) {
            *child = self.alloc_node(Node::new(quadrant, depth + 1, node));
        }
        self.nodes[node as usize].children = Some(children);

        let entries = std::mem::take(&mut self.nodes[node as usize].entries);
        let mut stay = Vec::with_capacity(entries.len());
        for (id, area) in entries {
            match children
                .iter()
                .copied()
                .find(|&c| self.nodes[c as usize].rect.contains_rect(&area))
            {
                Some(c) => self.nodes[c as usize].entries.push((id, area)),
                None => stay.push((id, area)),
            }
        }
        self.nodes[node as usize].entries = stay;

        for child in children {
            self.maybe_split(child);
        }
    }

    /// Collapse four empty leaf children back into their parent, walking upward.
    fn try_merge(&mut self, node: u32) {
        let mut current = if self.nodes[node as usize].children.is_some() {
            node
        } else {
            self.nodes[node as usize].parent
        };

        while current != NO_NODE {
            let Some(children) = self.nodes[current as usize].children else {
                break;
            };
            if !children.iter().all(|&c| self.nodes[c as usize].is_empty_leaf()) {
                break;
            }
            for child in children {
                self.free_node(child);
            }
            self.nodes[current as usize].children = None;
            if !self.nodes[current as usize].entries.is_empty() {
                break;
            }
            current = self.nodes[current as usize].parent;
        }
    }

    fn alloc_node(&mut self, node: Node) -> u32 {
        match self.free_nodes.pop() {
            Some(index) => {
                self.nodes[index as usize] = node;
                index
            }
            None => {
                self.nodes.push(node);
                (self.nodes.len() - 1) as u32
            }
        }
    }

    fn free_node(&mut self, index: u32) {
        let node = &mut self.nodes[index as usize];
        node.in_use = false;
        node.children = None;
        node.entries.clear();
        self.free_nodes.push(index);
    }
}
