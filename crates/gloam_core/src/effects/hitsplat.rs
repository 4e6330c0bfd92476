//! Floating damage and heal numbers.

use glam::Vec2;

use super::CapacityError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitsplatKind {
    Damage,
    Heal,
}

#[derive(Debug, Clone, Copy)]
pub struct Hitsplat {
    pub position: Vec2,
    pub amount: i32,
    pub kind: HitsplatKind,
    pub age: f32,
}

/// Fixed-capacity hitsplat array, culled by swap-with-last.
pub struct Hitsplats {
    items: Vec<Hitsplat>,
    capacity: usize,
    lifetime: f32,
    rise_speed: f32,
}

impl Hitsplats {
    pub fn new(capacity: usize, lifetime: f32, rise_speed: f32) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
            lifetime,
            rise_speed,
        }
    }

    pub fn spawn(&mut self, position: Vec2, amount: i32, kind: HitsplatKind) -> Result<(), CapacityError> {
        if self.items.len() >= self.capacity {
            return Err(CapacityError::HitsplatsFull {
                capacity: self.capacity,
            });
        }
        self.items.push(Hitsplat {
            position,
            amount,
            kind,
            age: 0.0,
        });
        Ok(())
    }

    /// Age, rise and cull.
    pub fn update(&mut self, dt: f32) {
        let mut i = 0;
        while i < self.items.len() {
            let splat = &mut self.items[i];
            splat.age += dt;
            if splat.age >= self.lifetime {
                self.items.swap_remove(i);
                continue;
            }
            // +y is down
            splat.position.y -= self.rise_speed * dt;
            i += 1;
        }
    }

    /// 1.0 when fresh, 0.0 when about to disappear.
    pub fn opacity(&self, splat: &Hitsplat) -> f32 {
        if self.lifetime <= 0.0 {
            0.0
        } else {
            (1.0 - splat.age / self.lifetime).clamp(0.0, 1.0)
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hitsplat> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_buffer_rejects() {
        let mut splats = Hitsplats::new(2, 1.0, 10.0);
        splats.spawn(Vec2::ZERO, 1, HitsplatKind::Damage).unwrap();
        splats.spawn(Vec2::ZERO, 2, HitsplatKind::Damage).unwrap();
        assert_eq!(
            splats.spawn(Vec2::ZERO, 3, HitsplatKind::Heal),
            Err(CapacityError::HitsplatsFull { capacity: 2 })
        );
    }

    #[test]
    fn splats_rise_then_expire() {
        let mut splats = Hitsplats::new(4, 1.0, 10.0);
        splats.spawn(Vec2::new(0.0, 100.0), 5, HitsplatKind::Damage).unwrap();
        splats.update(0.5);
        let splat = *splats.iter().next().unwrap();
        assert_eq!(splat.position.y, 95.0);
        assert!((splats.opacity(&splat) - 0.5).abs() < 1e-6);
        splats.update(0.5);
        assert!(splats.is_empty());
    }
}
