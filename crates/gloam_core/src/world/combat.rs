use tracing::warn;

use super::{GameEvent, World};
use crate::collision::EntityPair;
use crate::ecs::{
    ComponentKind, DamageField, EffectApplier, EntityId, Equipment, Health, ItemStats, Physics,
    StatusEffect, StatusEffects, Stats,
};
use crate::effects::HitsplatKind;

impl World {
    /// Damage `target`, reduced by its armor. Health clamps at zero; death is
    /// picked up by the next death check. Returns the damage actually dealt.
    pub fn deal_damage(&mut self, target: EntityId, amount: i32, source: EntityId) -> Option<i32> {
        if amount <= 0 {
            return None;
        }
        let armor = self.total_armor(target);
        let dealt = (amount - armor).max(0);
        let health = self.store.get_mut::<Health>(target)?;
        health.damage(dealt);
        let remaining = health.current;

        self.spawn_hitsplat(target, dealt, HitsplatKind::Damage);
        self.dispatch_event(GameEvent::Damaged {
            target,
            source,
            amount: dealt,
            remaining,
        });
        Some(dealt)
    }

    pub fn heal(&mut self, target: EntityId, amount: i32) -> Option<i32> {
        let health = self.store.get_mut::<Health>(target)?;
        let before = health.current;
        health.heal(amount);
        let healed = health.current - before;
        if healed > 0 {
            self.spawn_hitsplat(target, healed, HitsplatKind::Heal);
            self.dispatch_event(GameEvent::Healed {
                target,
                amount: healed,
            });
        }
        Some(healed)
    }

    /// Add a status effect, attaching a `StatusEffects` component when missing.
    pub fn apply_status(&mut self, target: EntityId, effect: StatusEffect) -> bool {
        if !self.store.contains(target) {
            return false;
        }
        if !self.store.has_component(target, ComponentKind::StatusEffects) {
            self.store.insert_component(target, StatusEffects::default());
        }
        if let Some(effects) = self.store.get_mut::<StatusEffects>(target) {
            effects.apply(effect);
        }
        self.dispatch_event(GameEvent::StatusApplied {
            target,
            kind: effect.kind,
        });
        true
    }

    /// Armor from stats plus every equipped item.
    fn total_armor(&self, id: EntityId) -> i32 {
        let base = self.store.get::<Stats>(id).map_or(0, |s| s.armor);
        let items: i32 = self
            .store
            .get::<Equipment>(id)
            .map(|equipment| {
                equipment
                    .items
                    .iter()
                    .filter_map(|&item| self.store.get::<ItemStats>(item))
                    .map(|stats| stats.armor)
                    .sum()
            })
            .unwrap_or(0);
        base + items
    }

    fn spawn_hitsplat(&mut self, target: EntityId, amount: i32, kind: HitsplatKind) {
        let Some(position) = self.store.get::<Physics>(target).map(|p| p.position) else {
            return;
        };
        if let Err(err) = self.hitsplats.spawn(position, amount, kind) {
            warn!(%target, %err, "hitsplat dropped");
        }
    }

    /// Fire `source`'s hostile triggers at `target` unless they are cooling down.
    pub(crate) fn fire_triggers(&mut self, source: EntityId, target: EntityId, pair: EntityPair) {
        let hostile = match (self.store.faction(source), self.store.faction(target)) {
            (Some(a), Some(b)) => a.is_hostile_to(b),
            _ => false,
        };
        if !hostile {
            return;
        }

        if let Some(field) = self.store.get::<DamageField>(source).copied() {
            if !self.cooldowns.is_cooling_down(pair, ComponentKind::DamageField)
                && self.store.has_component(target, ComponentKind::Health)
            {
                self.deal_damage(target, field.amount, source);
                self.cooldowns
                    .register(pair, ComponentKind::DamageField, field.retrigger);
            }
        }

        if let Some(applier) = self.store.get::<EffectApplier>(source).copied() {
            if !self.cooldowns.is_cooling_down(pair, ComponentKind::EffectApplier) {
                if self.apply_status(target, applier.effect) {
                    self.cooldowns
                        .register(pair, ComponentKind::EffectApplier, applier.retrigger);
                } else {
                    warn!(%source, %target, "effect applier hit a missing entity");
                }
            }
        }
    }
}
