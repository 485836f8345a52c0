//! # Component Pools — One Sparse Set per Component Type
//!
//! Each component type lives in its own [`ComponentPool<T>`]. A pool is a
//! sparse set: a `sparse` array indexed by entity slot points into three
//! packed arrays that are always the same length.
//!
//! ```text
//! sparse:  [ 1, -, 0, - ]      slot → dense index (or EMPTY)
//! dense:   [ e2, e0 ]          packed owner handles
//! data:    [ T(e2), T(e0) ]    packed component values
//! ```
//!
//! Removal swaps the last element into the hole, so iteration order over a
//! pool is not stable across removals. Nothing in the store promises a stable
//! order.
//!
//! ## Type Erasure
//!
//! The store keeps pools in a `HashMap<TypeId, Box<dyn AnyPool>>`. The
//! [`AnyPool`] trait exposes just what entity destruction and queries need
//! without knowing `T`; typed access downcasts through `Any`.

use std::any::Any;

use super::entity::Entity;

const EMPTY: u32 = u32::MAX;

/// Packed storage for every `T` in one store.
pub struct ComponentPool<T> {
    sparse: Vec<u32>,
    dense: Vec<Entity>,
    data: Vec<T>,
}

impl<T: 'static> ComponentPool<T> {
    pub fn new() -> Self {
        Self {
            sparse: Vec::new(),
            dense: Vec::new(),
            data: Vec::new(),
        }
    }

    fn dense_index(&self, entity: Entity) -> Option<usize> {
        let di = *self.sparse.get(entity.index as usize)?;
        if di == EMPTY {
            return None;
        }
        let di = di as usize;
        (self.dense[di] == entity).then_some(di)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.dense_index(entity).is_some()
    }

    /// Insert a value. The caller has already checked that `entity` has none.
    pub fn insert(&mut self, entity: Entity, value: T) -> &mut T {
        let slot = entity.index as usize;
        if slot >= self.sparse.len() {
            self.sparse.resize(slot + 1, EMPTY);
        }
        debug_assert_eq!(self.sparse[slot], EMPTY, "slot already occupied");
        self.sparse[slot] = self.dense.len() as u32;
        self.dense.push(entity);
        self.data.push(value);
        let last = self.data.len() - 1;
        &mut self.data[last]
    }

    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let di = self.dense_index(entity)?;
        let last = self.dense.len() - 1;
        if di != last {
            let moved = self.dense[last];
            self.sparse[moved.index as usize] = di as u32;
        }
        self.sparse[entity.index as usize] = EMPTY;
        self.dense.swap_remove(di);
        Some(self.data.swap_remove(di))
    }

    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.dense_index(entity).map(|di| &self.data[di])
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.dense_index(entity).map(move |di| &mut self.data[di])
    }

    pub fn entities(&self) -> &[Entity] {
        &self.dense
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.dense.iter().copied().zip(self.data.iter_mut())
    }
}

/// Type-erased view of a [`ComponentPool`].
pub trait AnyPool: Any {
    /// Drop the entity's component, if any.
    fn remove_entity(&mut self, entity: Entity) -> bool;

    fn clear(&mut self);

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: 'static> AnyPool for ComponentPool<T> {
    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.remove(entity).is_some()
    }

    fn clear(&mut self) {
        self.sparse.clear();
        self.dense.clear();
        self.data.clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
