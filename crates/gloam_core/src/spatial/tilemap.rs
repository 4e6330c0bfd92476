//! Sparse tile map.
//!
//! Tiles are keyed by integer tile coordinates. Anything never written is solid,
//! so the playable area is exactly the set of carved floor tiles.

use std::collections::HashMap;

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::math::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    Floor,
    Wall,
}

impl Tile {
    #[inline]
    pub fn is_solid(self) -> bool {
        matches!(self, Tile::Wall)
    }
}

pub struct Tilemap {
    tiles: HashMap<IVec2, Tile>,
    /// Inclusive tile-space bounding box of every written tile.
    bounds: Option<(IVec2, IVec2)>,
    tile_size: f32,
    /// Chunk edge length in tiles.
    chunk_size: i32,
}

impl Tilemap {
    pub fn new(tile_size: f32, chunk_size: i32) -> Self {
        assert!(tile_size > 0.0, "tile size must be positive");
        assert!(chunk_size > 0, "chunk size must be positive");
        Self {
            tiles: HashMap::new(),
            bounds: None,
            tile_size,
            chunk_size,
        }
    }

    #[inline]
    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    #[inline]
    pub fn chunk_size(&self) -> i32 {
        self.chunk_size
    }

    /// Edge length of one chunk in world units.
    #[inline]
    pub fn chunk_world_size(&self) -> f32 {
        self.tile_size * self.chunk_size as f32
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn bounds(&self) -> Option<(IVec2, IVec2)> {
        self.bounds
    }

    /// World-space rectangle covering every written tile.
    pub fn world_bounds(&self) -> Option<Rect> {
        self.bounds.map(|(min, max)| {
            self.tile_rect(min).union(&self.tile_rect(max))
        })
    }

    pub fn set(&mut self, coord: IVec2, tile: Tile) {
        self.tiles.insert(coord, tile);
        self.bounds = Some(match self.bounds {
            Some((min, max)) => (min.min(coord), max.max(coord)),
            None => (coord, coord),
        });
    }

    #[inline]
    pub fn get(&self, coord: IVec2) -> Option<Tile> {
        self.tiles.get(&coord).copied()
    }

    /// Walls and unwritten tiles block movement.
    #[inline]
    pub fn is_solid(&self, coord: IVec2) -> bool {
        self.get(coord).map_or(true, Tile::is_solid)
    }

    /// Fill an inclusive tile rectangle.
    pub fn fill(&mut self, min: IVec2, max: IVec2, tile: Tile) {
        for y in min.y..=max.y {
            for x in min.x..=max.x {
                self.set(IVec2::new(x, y), tile);
            }
        }
    }

    /// Floor rectangle surrounded by a one-tile wall ring.
    pub fn carve_room(&mut self, min: IVec2, max: IVec2) {
        for y in (min.y - 1)..=(max.y + 1) {
            for x in (min.x - 1)..=(max.x + 1) {
                let coord = IVec2::new(x, y);
                let inside = x >= min.x && x <= max.x && y >= min.y && y <= max.y;
                if inside {
                    self.set(coord, Tile::Floor);
                } else if self.get(coord).is_none() {
                    self.set(coord, Tile::Wall);
                }
            }
        }
    }

    /// Straight floor corridor between two tiles, horizontal leg first.
    pub fn carve_corridor(&mut self, from: IVec2, to: IVec2) {
        let corner = IVec2::new(to.x, from.y);
        self.carve_room(from.min(corner), from.max(corner));
        self.carve_room(corner.min(to), corner.max(to));
    }

    #[inline]
    pub fn world_to_tile(&self, position: Vec2) -> IVec2 {
        (position / self.tile_size).floor().as_ivec2()
    }

    #[inline]
    pub fn tile_rect(&self, coord: IVec2) -> Rect {
        Rect::from_min_size(coord.as_vec2() * self.tile_size, Vec2::splat(self.tile_size))
    }

    #[inline]
    pub fn tile_center(&self, coord: IVec2) -> Vec2 {
        (coord.as_vec2() + Vec2::splat(0.5)) * self.tile_size
    }

    /// Inclusive tile range covering a world rectangle.
    pub fn tile_range(&self, area: &Rect) -> (IVec2, IVec2) {
        (self.world_to_tile(area.min), self.world_to_tile(area.max))
    }

    /// Written tiles inside a world rectangle, row by row.
    pub fn tiles_in(&self, area: &Rect) -> impl Iterator<Item = (IVec2, Tile)> + '_ {
        let (min, max) = self.tile_range(area);
        (min.y..=max.y).flat_map(move |y| {
            (min.x..=max.x).filter_map(move |x| {
                let coord = IVec2::new(x, y);
                self.get(coord).map(|tile| (coord, tile))
            })
        })
    }

    #[inline]
    pub fn chunk_of(&self, position: Vec2) -> IVec2 {
        (position / self.chunk_world_size()).floor().as_ivec2()
    }

    #[inline]
    pub fn chunk_rect(&self, chunk: IVec2) -> Rect {
        let size = self.chunk_world_size();
        Rect::from_min_size(chunk.as_vec2() * size, Vec2::splat(size))
    }

    /// Inclusive chunk range covering a world rectangle.
    pub fn chunk_range(&self, area: &Rect) -> (IVec2, IVec2) {
        (self.chunk_of(area.min), self.chunk_of(area.max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwritten_tiles_are_solid() {
        let mut map = Tilemap::new(16.0, 8);
        map.set(IVec2::new(2, 3), Tile::Floor);
        assert!(!map.is_solid(IVec2::new(2, 3)));
        assert!(map.is_solid(IVec2::new(2, 4)));
        assert!(map.is_solid(IVec2::new(-100, 7)));
    }

    #[test]
    fn negative_coordinates_floor() {
        let map = Tilemap::new(16.0, 8);
        assert_eq!(map.world_to_tile(Vec2::new(-0.5, 15.9)), IVec2::new(-1, 0));
        assert_eq!(map.chunk_of(Vec2::new(-1.0, 128.0)), IVec2::new(-1, 1));
    }

    #[test]
    fn rooms_get_walls_and_bounds() {
        let mut map = Tilemap::new(16.0, 8);
        map.carve_room(IVec2::new(0, 0), IVec2::new(3, 2));
        assert_eq!(map.get(IVec2::new(1, 1)), Some(Tile::Floor));
        assert_eq!(map.get(IVec2::new(-1, 1)), Some(Tile::Wall));
        assert_eq!(map.get(IVec2::new(4, 3)), Some(Tile::Wall));
        assert_eq!(map.bounds(), Some((IVec2::new(-1, -1), IVec2::new(4, 3))));

        // A second room sharing a wall opens it up.
        map.carve_corridor(IVec2::new(3, 1), IVec2::new(8, 1));
        assert_eq!(map.get(IVec2::new(4, 1)), Some(Tile::Floor));
    }

    #[test]
    fn tiles_in_area_skips_unwritten() {
        let mut map = Tilemap::new(10.0, 4);
        map.set(IVec2::new(0, 0), Tile::Floor);
        map.set(IVec2::new(1, 0), Tile::Wall);
        let area = Rect::new(Vec2::ZERO, Vec2::new(25.0, 5.0));
        let found: Vec<_> = map.tiles_in(&area).collect();
        assert_eq!(found, vec![(IVec2::new(0, 0), Tile::Floor), (IVec2::new(1, 0), Tile::Wall)]);
    }
}
