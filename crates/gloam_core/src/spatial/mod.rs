//! Spatial structures: the entity quadtree and the tile map.

mod quadtree;
mod tilemap;

pub use quadtree::{QuadTree, QuadTreeConfig, QuadTreeLocation};
pub use tilemap::{Tile, Tilemap};
