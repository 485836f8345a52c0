//! # Entity — Generational Handles Into a Component Store
//!
//! An [`Entity`] names a row across the component pools of one
//! [`ComponentStore`](super::ComponentStore). It carries no data itself.
//!
//! ## Generational Indices
//!
//! Slots are recycled after destruction. Each slot carries a generation that
//! is bumped when the slot is freed, so an old handle can never resolve to the
//! entity that later reuses its slot:
//!
//! ```text
//! Entity { index: 5, generation: 0 }  ← first spawn
//! Entity { index: 5, generation: 1 }  ← after recycle
//! ```
//!
//! ## Store Identity
//!
//! Two stores both hand out `Entity(0v0)`. To keep those apart, every handle
//! also records the [`StoreId`] of the store that minted it. Equality compares
//! index, generation and store, so a handle from one scene never matches an
//! entity of another.
//!
//! ## The Null Entity
//!
//! `Entity::default()` is [`Entity::NULL`]. It belongs to no store and never
//! resolves to a live record, which makes it the natural "no camera" value.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Identifies one [`ComponentStore`](super::ComponentStore) instance.
///
/// `StoreId(0)` is reserved for the null entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreId(u32);

impl StoreId {
    const NONE: StoreId = StoreId(0);

    /// Mint a process-unique id.
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(1);
        StoreId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A lightweight handle to an entity in a [`ComponentStore`](super::ComponentStore).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    pub(crate) index: u32,
    pub(crate) generation: u32,
    pub(crate) store: StoreId,
}

impl Entity {
    /// The canonical "no entity" value.
    pub const NULL: Entity = Entity {
        index: u32::MAX,
        generation: 0,
        store: StoreId::NONE,
    };

    /// True for [`Entity::NULL`] (and anything equal to it).
    pub fn is_null(self) -> bool {
        self == Self::NULL
    }

    /// Raw slot index. Useful for diagnostics and file ids.
    pub fn index(self) -> u32 {
        self.index
    }

    /// Generation of the slot when this handle was minted.
    pub fn generation(self) -> u32 {
        self.generation
    }

    /// Id of the store that minted this handle.
    pub fn store(self) -> StoreId {
        self.store
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Entity(null)")
        } else {
            write!(f, "Entity({}v{})", self.index, self.generation)
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "null")
        } else {
            write!(f, "{}v{}", self.index, self.generation)
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    generation: u32,
    alive: bool,
}

/// Manages entity id allocation and recycling for one store.
///
/// ```text
/// slots:     [0 alive, 1 free, 0 alive, 2 free]
/// free_list: [1, 3]
/// ```
///
/// Allocation pops from `free_list` when possible and grows `slots` otherwise.
/// Deallocation bumps the slot's generation and pushes the index.
pub(crate) struct EntityAllocator {
    store: StoreId,
    slots: Vec<Slot>,
    free_list: Vec<u32>,
}

impl EntityAllocator {
    pub fn new(store: StoreId) -> Self {
        Self {
            store,
            slots: Vec::new(),
            free_list: Vec::new(),
        }
    }

    pub fn allocate(&mut self) -> Entity {
        let index = match self.free_list.pop() {
            Some(index) => index,
            None => {
                let index = u32::try_from(self.slots.len())
                    .ok()
                    .filter(|&i| i != u32::MAX)
                    .expect("entity index space exhausted");
                self.slots.push(Slot {
                    generation: 0,
                    alive: false,
                });
                index
            }
        };

        let slot = &mut self.slots[index as usize];
        slot.alive = true;
        Entity {
            index,
            generation: slot.generation,
            store: self.store,
        }
    }

    /// Returns `false` if the handle was already stale.
    pub fn deallocate(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let slot = &mut self.slots[entity.index as usize];
        slot.alive = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(entity.index);
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        entity.store == self.store
            && self
                .slots
                .get(entity.index as usize)
                .is_some_and(|slot| slot.alive && slot.generation == entity.generation)
    }

    pub fn alive_count(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    /// Live entities in slot order.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        let store = self.store;
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.alive)
            .map(move |(index, slot)| Entity {
                index: index as u32,
                generation: slot.generation,
                store,
            })
    }

    /// Frees every slot, keeping generations so old handles stay stale.
    pub fn clear(&mut self) {
        self.free_list.clear();
        for (index, slot) in self.slots.iter_mut().enumerate().rev() {
            if slot.alive {
                slot.alive = false;
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free_list.push(index as u32);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alloc() -> EntityAllocator {
        EntityAllocator::new(StoreId::next())
    }

    #[test]
    fn allocate_sequential() {
        let mut alloc = alloc();
        let e0 = alloc.allocate();
        let e1 = alloc.allocate();
        assert_eq!(e0.index, 0);
        assert_eq!(e1.index, 1);
        assert_eq!(e0.generation, 0);
    }

    #[test]
    fn recycle_bumps_generation() {
        let mut alloc = alloc();
        let e0 = alloc.allocate();
        assert!(alloc.deallocate(e0));
        let reused = alloc.allocate();
        assert_eq!(reused.index, 0);
        assert_eq!(reused.generation, 1);
        assert_ne!(reused, e0);
        assert!(!alloc.is_alive(e0));
        assert!(alloc.is_alive(reused));
    }

    #[test]
    fn freed_slot_does_not_resolve_with_next_generation() {
        let mut alloc = alloc();
        let e0 = alloc.allocate();
        alloc.deallocate(e0);
        let forged = Entity {
            generation: 1,
            ..e0
        };
        assert!(!alloc.is_alive(forged));
    }

    #[test]
    fn double_free_returns_false() {
        let mut alloc = alloc();
        let e0 = alloc.allocate();
        assert!(alloc.deallocate(e0));
        assert!(!alloc.deallocate(e0));
    }

    #[test]
    fn handles_from_other_store_are_not_alive() {
        let mut a = alloc();
        let mut b = alloc();
        let ea = a.allocate();
        let eb = b.allocate();
        assert_eq!((ea.index, ea.generation), (eb.index, eb.generation));
        assert_ne!(ea, eb);
        assert!(!a.is_alive(eb));
    }

    #[test]
    fn null_is_default_and_never_alive() {
        let mut alloc = alloc();
        alloc.allocate();
        assert!(Entity::default().is_null());
        assert!(!alloc.is_alive(Entity::NULL));
        assert_eq!(format!("{:?}", Entity::NULL), "Entity(null)");
    }

    #[test]
    fn iter_skips_dead_slots() {
        let mut alloc = alloc();
        let e0 = alloc.allocate();
        let e1 = alloc.allocate();
        let e2 = alloc.allocate();
        alloc.deallocate(e1);
        let live: Vec<_> = alloc.iter().collect();
        assert_eq!(live, vec![e0, e2]);
        assert_eq!(alloc.alive_count(), 2);
    }

    #[test]
    fn clear_invalidates_everything() {
        let mut alloc = alloc();
        let e0 = alloc.allocate();
        let _e1 = alloc.allocate();
        alloc.clear();
        assert_eq!(alloc.alive_count(), 0);
        assert!(!alloc.is_alive(e0));
        let again = alloc.allocate();
        assert_eq!(again.index, 0);
        assert_eq!(again.generation, 1);
    }
}
