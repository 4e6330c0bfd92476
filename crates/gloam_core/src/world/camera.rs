use glam::Vec2;

use crate::ecs::{EntityId, EntityStore, Physics};
use crate::math::Rect;

/// View into the world, in world units (one unit per screen pixel).
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub center: Vec2,
    viewport: Vec2,
    /// Entity the camera centers on after every frame, if any.
    pub target: EntityId,
}

impl Camera {
    pub fn new(center: Vec2, viewport: Vec2) -> Self {
        Self {
            center,
            viewport,
            target: EntityId::NULL,
        }
    }

    #[inline]
    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub(crate) fn set_viewport(&mut self, viewport: Vec2) {
        self.viewport = viewport.max(Vec2::ONE);
    }

    pub fn view_rect(&self) -> Rect {
        Rect::from_center_size(self.center, self.viewport)
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        self.center - self.viewport * 0.5 + screen
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        world - self.center + self.viewport * 0.5
    }

    pub(crate) fn follow(&mut self, store: &EntityStore) {
        if let Some(physics) = store.get::<Physics>(self.target) {
            self.center = physics.position;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_and_world_round_trip() {
        let camera = Camera::new(Vec2::new(100.0, 50.0), Vec2::new(200.0, 100.0));
        assert_eq!(camera.screen_to_world(Vec2::ZERO), Vec2::new(0.0, 0.0));
        assert_eq!(camera.world_to_screen(Vec2::new(100.0, 50.0)), Vec2::new(100.0, 50.0));
        assert_eq!(camera.view_rect(), Rect::new(Vec2::ZERO, Vec2::new(200.0, 100.0)));
    }
}
