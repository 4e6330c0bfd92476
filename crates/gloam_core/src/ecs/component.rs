// component.rs - Component tables and presence bitsets
//
// Components are identified by a `ComponentKind` bit, not Rust TypeIds.
// Each kind owns one fixed-capacity table addressed by entity slot index, and
// every stored record remembers the slot index of its owner so algorithms that
// start from a component can find their way back to the entity.

use std::ops::{BitOr, BitOrAssign, Deref, DerefMut};

use super::components::{ComponentKind, ComponentTables};

/// Bitset of component kinds attached to an entity (up to 64 kinds).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ComponentMask(pub u64);

impl ComponentMask {
    pub const EMPTY: ComponentMask = ComponentMask(0);

    pub fn of(kinds: &[ComponentKind]) -> Self {
        kinds
            .iter()
            .fold(ComponentMask::EMPTY, |mask, kind| mask | kind.mask())
    }

    /// True when every bit of `required` is set.
    #[inline]
    pub fn contains_all(self, required: ComponentMask) -> bool {
        self.0 & required.0 == required.0
    }

    #[inline]
    pub fn contains_any(self, wanted: ComponentMask) -> bool {
        self.0 & wanted.0 != 0
    }

    #[inline]
    pub fn contains(self, kind: ComponentKind) -> bool {
        self.0 & kind.bit() != 0
    }

    #[inline]
    pub fn insert(&mut self, kind: ComponentKind) {
        self.0 |= kind.bit();
    }

    #[inline]
    pub fn remove(&mut self, kind: ComponentKind) {
        self.0 &= !kind.bit();
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for ComponentMask {
    type Output = ComponentMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        ComponentMask(self.0 | rhs.0)
    }
}

impl BitOr<ComponentKind> for ComponentMask {
    type Output = ComponentMask;

    fn bitor(self, rhs: ComponentKind) -> Self::Output {
        ComponentMask(self.0 | rhs.bit())
    }
}

impl BitOrAssign<ComponentKind> for ComponentMask {
    fn bitor_assign(&mut self, rhs: ComponentKind) {
        self.0 |= rhs.bit();
    }
}

/// Stored component plus the slot index of the entity that owns it.
#[derive(Debug, Clone)]
pub struct Record<T> {
    owner: u32,
    value: T,
}

impl<T> Record<T> {
    /// Slot index of the owning entity.
    #[inline]
    pub fn owner_index(&self) -> u32 {
        self.owner
    }

    #[inline]
    pub fn value(&self) -> &T {
        &self.value
    }
}

impl<T> Deref for Record<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for Record<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

/// Fixed-capacity table for a single component type, indexed by entity slot.
pub struct ComponentTable<T> {
    records: Vec<Option<Record<T>>>,
    count: usize,
}

impl<T> ComponentTable<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        let mut records = Vec::with_capacity(capacity);
        records.resize_with(capacity, || None);
        Self { records, count: 0 }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.records.len()
    }

    /// Number of entities that currently carry this component.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Store `value` for slot `index`, replacing any previous record.
    pub fn insert(&mut self, index: u32, value: T) -> &mut T {
        let slot = &mut self.records[index as usize];
        if slot.is_none() {
            self.count += 1;
        }
        *slot = Some(Record {
            owner: index,
            value,
        });
        match slot {
            Some(record) => &mut record.value,
            None => unreachable!("record was just written"),
        }
    }

    pub fn remove(&mut self, index: u32) -> Option<T> {
        let removed = self.records.get_mut(index as usize)?.take();
        if removed.is_some() {
            self.count -= 1;
        }
        removed.map(|record| record.value)
    }

    #[inline]
    pub fn contains(&self, index: u32) -> bool {
        matches!(self.records.get(index as usize), Some(Some(_)))
    }

    #[inline]
    pub fn get(&self, index: u32) -> Option<&T> {
        self.record(index).map(|record| &record.value)
    }

    #[inline]
    pub fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        self.records
            .get_mut(index as usize)
            .and_then(|slot| slot.as_mut())
            .map(|record| &mut record.value)
    }

    #[inline]
    pub fn record(&self, index: u32) -> Option<&Record<T>> {
        self.records.get(index as usize).and_then(|slot| slot.as_ref())
    }

    /// Clear the component from an entity slot (used when the entity is destroyed).
    pub(crate) fn clear_slot(&mut self, index: u32) {
        self.remove(index);
    }

    /// Iterate over all (slot index, component) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.records
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|r| (idx as u32, &r.value)))
    }
}

/// Trait implemented by every component type through `declare_components!`.
pub trait Component: Default + 'static {
    const KIND: ComponentKind;

    fn table(tables: &ComponentTables) -> &ComponentTable<Self>;

    fn table_mut(tables: &mut ComponentTables) -> &mut ComponentTable<Self>;
}

/// Declares the closed set of component types.
///
/// Generates `ComponentKind` (one bit per type), the `ComponentTables` struct with
/// one typed table per component, and the `Component` impls wiring both together.
///
/// ```ignore
/// declare_components! {
///     Physics => physics,
///     Collider => colliders,
/// }
/// ```
macro_rules! declare_components {
    ($($ty:ident => $field:ident),+ $(,)?) => {
        /// One variant per component type; the discriminant is the bit index.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum ComponentKind {
            $($ty),+
        }

        impl ComponentKind {
            pub const ALL: &'static [ComponentKind] = &[$(ComponentKind::$ty),+];

            #[inline]
            pub const fn bit(self) -> u64 {
                1u64 << (self as u8)
            }

            #[inline]
            pub const fn mask(self) -> $crate::ecs::ComponentMask {
                $crate::ecs::ComponentMask(self.bit())
            }

            pub const fn name(self) -> &'static str {
                match self {
                    $(ComponentKind::$ty => stringify!($ty)),+
                }
            }
        }

        /// Typed storage for every component kind.
        pub struct ComponentTables {
            $(pub $field: $crate::ecs::ComponentTable<$ty>),+
        }

        impl ComponentTables {
            pub fn with_capacity(capacity: usize) -> Self {
                Self {
                    $($field: $crate::ecs::ComponentTable::with_capacity(capacity)),+
                }
            }

            pub(crate) fn clear_slot(&mut self, index: u32) {
                $(self.$field.clear_slot(index);)+
            }
        }

        $(
            impl $crate::ecs::Component for $ty {
                const KIND: ComponentKind = ComponentKind::$ty;

                #[inline]
                fn table(tables: &ComponentTables) -> &$crate::ecs::ComponentTable<Self> {
                    &tables.$field
                }

                #[inline]
                fn table_mut(tables: &mut ComponentTables) -> &mut $crate::ecs::ComponentTable<Self> {
                    &mut tables.$field
                }
            }
        )+
    };
}

pub(crate) use declare_components;
