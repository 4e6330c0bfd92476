//! Swept AABB tests.
//!
//! Every test answers the same question: how much of this frame's displacement
//! can be applied before the mover's box enters the obstacle? The answer is a
//! fraction in `[0, 1]`.

use glam::Vec2;

use crate::ecs::EntityId;
use crate::math::Rect;
use crate::spatial::Tilemap;

const EPSILON: f32 = 1e-6;

/// Earliest contact along a sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sweep {
    /// Fraction of the displacement that is safe to apply.
    pub time: f32,
    /// Unit contact normal pointing away from the obstacle (zero when unknown).
    pub normal: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollisionStatus {
    NotColliding,
    Colliding {
        /// 1.0 for boxes that already overlap but are not closing in.
        time_of_impact: f32,
        /// Normal from the first body's point of view.
        normal: Vec2,
    },
}

impl CollisionStatus {
    #[inline]
    pub fn is_colliding(&self) -> bool {
        matches!(self, CollisionStatus::Colliding { .. })
    }

    pub fn time_of_impact(&self) -> f32 {
        match *self {
            CollisionStatus::Colliding { time_of_impact, .. } => time_of_impact,
            CollisionStatus::NotColliding => 1.0,
        }
    }
}

/// Sweep `mover` by `displacement` against a static `obstacle`.
///
/// Boxes that only touch do not block sliding along the shared edge. A mover
/// that already overlaps the obstacle is stopped only while it moves toward
/// the obstacle's center, so it can always back out.
pub fn sweep_aabb(mover: &Rect, displacement: Vec2, obstacle: &Rect) -> Option<Sweep> {
    // Minkowski sum: shrink the mover to a point, grow the obstacle by its half size.
    let half = mover.half_size();
    let expanded = Rect::new(obstacle.min - half, obstacle.max + half);
    let origin = mover.center();

    let inside_x = origin.x > expanded.min.x && origin.x < expanded.max.x;
    let inside_y = origin.y > expanded.min.y && origin.y < expanded.max.y;
    if inside_x && inside_y {
        let offset = origin - expanded.center();
        if displacement.dot(offset) < 0.0 {
            return Some(Sweep {
                time: 0.0,
                normal: penetration_normal(offset, expanded.half_size(), displacement),
            });
        }
        return None;
    }

    let (x_enter, x_exit) = axis_interval(origin.x, displacement.x, expanded.min.x, expanded.max.x)?;
    let (y_enter, y_exit) = axis_interval(origin.y, displacement.y, expanded.min.y, expanded.max.y)?;

    let enter = x_enter.max(y_enter);
    let exit = x_exit.min(y_exit);
    if enter >= exit || enter > 1.0 || exit <= 0.0 || enter < 0.0 {
        return None;
    }

    let normal = if x_enter > y_enter {
        Vec2::new(-displacement.x.signum(), 0.0)
    } else {
        Vec2::new(0.0, -displacement.y.signum())
    };
    Some(Sweep {
        time: enter.clamp(0.0, 1.0),
        normal,
    })
}

/// Entry/exit times of a moving point against one slab, or `None` when a
/// stationary point lies outside (or on the edge of) the slab.
fn axis_interval(origin: f32, delta: f32, min: f32, max: f32) -> Option<(f32, f32)> {
    if delta.abs() < EPSILON {
        if origin > min && origin < max {
            Some((f32::NEG_INFINITY, f32::INFINITY))
        } else {
            None
        }
    } else {
        let t0 = (min - origin) / delta;
        let t1 = (max - origin) / delta;
        Some((t0.min(t1), t0.max(t1)))
    }
}

fn penetration_normal(offset: Vec2, half: Vec2, displacement: Vec2) -> Vec2 {
    let rx = if half.x > 0.0 { offset.x.abs() / half.x } else { 0.0 };
    let ry = if half.y > 0.0 { offset.y.abs() / half.y } else { 0.0 };
    if rx == 0.0 && ry == 0.0 {
        return -displacement.normalize_or_zero();
    }
    if rx >= ry {
        Vec2::new(offset.x.signum(), 0.0)
    } else {
        Vec2::new(0.0, offset.y.signum())
    }
}

/// One side of an entity-vs-entity test.
#[derive(Debug, Clone, Copy)]
pub struct Body {
    pub id: EntityId,
    pub bounds: Rect,
    /// Displacement intended this frame.
    pub displacement: Vec2,
}

/// Swept test between two moving bodies.
///
/// Both bodies move linearly over the frame, so the test runs on the relative
/// displacement and the resulting time applies to both. The pair is always
/// evaluated with the lower slot index as the mover, which makes the result
/// independent of argument order.
pub fn entity_vs_entity_collision(a: &Body, b: &Body) -> CollisionStatus {
    let (first, second, flipped) = if b.id < a.id { (b, a, true) } else { (a, b, false) };
    let relative = first.displacement - second.displacement;

    let status = match sweep_aabb(&first.bounds, relative, &second.bounds) {
        Some(hit) => CollisionStatus::Colliding {
            time_of_impact: hit.time,
            normal: hit.normal,
        },
        None if first.bounds.overlaps_strict(&second.bounds) => CollisionStatus::Colliding {
            time_of_impact: 1.0,
            normal: Vec2::ZERO,
        },
        None => CollisionStatus::NotColliding,
    };

    match status {
        CollisionStatus::Colliding {
            time_of_impact,
            normal,
        } if flipped => CollisionStatus::Colliding {
            time_of_impact,
            normal: -normal,
        },
        other => other,
    }
}

/// Earliest blocking contact against solid tiles (walls and unwritten tiles)
/// touched by the swept box plus a one-tile margin.
pub fn tile_sweep(tilemap: &Tilemap, bounds: &Rect, displacement: Vec2) -> Option<Sweep> {
    let region = bounds.swept(displacement);
    let (min, max) = tilemap.tile_range(&region);
    let mut earliest: Option<Sweep> = None;

    for y in (min.y - 1)..=(max.y + 1) {
        for x in (min.x - 1)..=(max.x + 1) {
            let coord = glam::IVec2::new(x, y);
            if !tilemap.is_solid(coord) {
                continue;
            }
            if let Some(hit) = sweep_aabb(bounds, displacement, &tilemap.tile_rect(coord)) {
                // Only ever lower the fraction.
                if earliest.map_or(true, |e| hit.time < e.time) {
                    earliest = Some(hit);
                }
            }
        }
    }
    earliest
}

/// Reflect `velocity` about a unit `normal`.
#[inline]
pub fn reflect(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}
