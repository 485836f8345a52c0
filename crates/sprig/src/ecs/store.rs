//! # ComponentStore — Entities and Their Components
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │ ComponentStore (id: StoreId)                          │
//! │                                                       │
//! │  EntityAllocator: generational ids + free list        │
//! │                                                       │
//! │  pools: HashMap<TypeId, Box<dyn AnyPool>>             │
//! │    Transform      → ComponentPool<Transform>          │
//! │    SpriteRenderer → ComponentPool<SpriteRenderer>     │
//! │    ...                                                │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! The store knows nothing about scenes or rendering. Any `'static` type can
//! be a component, and each entity holds at most one of each type.
//!
//! ## Contracts
//!
//! Component access follows the usual "programmer error is fatal" rule:
//!
//! | call | precondition | on violation |
//! |------|--------------|--------------|
//! | [`add`](ComponentStore::add) | entity alive, lacks `T` | panic |
//! | [`get`](ComponentStore::get) / [`get_mut`](ComponentStore::get_mut) | entity has `T` | panic |
//! | [`remove`](ComponentStore::remove) | entity has `T` | panic |
//! | [`destroy`](ComponentStore::destroy) | entity alive | panic |
//!
//! [`try_get`](ComponentStore::try_get) and [`has`](ComponentStore::has)
//! are the non-panicking probes.
//!
//! ## Iteration and Structural Changes
//!
//! [`entities`](ComponentStore::entities), [`each_entity`](ComponentStore::each_entity)
//! and [`each_entity_with`](ComponentStore::each_entity_with) borrow the
//! store shared, so adding or removing components or destroying entities
//! while a traversal is live does not compile. Collect the ids first when a
//! pass needs to restructure:
//!
//! ```ignore
//! let doomed: Vec<Entity> = store.entities().collect();
//! for e in doomed { store.destroy(e); }
//! ```

use std::any::TypeId;
use std::collections::{HashMap, HashSet};

use super::entity::{Entity, EntityAllocator, StoreId};
use super::pool::{AnyPool, ComponentPool};
use super::query::{ComponentFilter, PoolMap, QueryParam};

/// Typed storage mapping entities to zero-or-one instance of each component.
pub struct ComponentStore {
    id: StoreId,
    allocator: EntityAllocator,
    pools: PoolMap,
}

impl ComponentStore {
    pub fn new() -> Self {
        let id = StoreId::next();
        Self {
            id,
            allocator: EntityAllocator::new(id),
            pools: HashMap::new(),
        }
    }

    pub fn id(&self) -> StoreId {
        self.id
    }

    /// Create an entity with no components.
    pub fn create(&mut self) -> Entity {
        self.allocator.allocate()
    }

    /// Destroy an entity, dropping every component it holds.
    ///
    /// # Panics
    ///
    /// Panics if the entity is null, stale, or belongs to another store.
    pub fn destroy(&mut self, entity: Entity) {
        self.assert_alive(entity, "destroy");
        for pool in self.pools.values_mut() {
            pool.remove_entity(entity);
        }
        self.allocator.deallocate(entity);
    }

    /// Destroy every entity. Outstanding handles become stale.
    pub fn clear(&mut self) {
        for pool in self.pools.values_mut() {
            pool.clear();
        }
        self.allocator.clear();
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.allocator.is_alive(entity)
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.allocator.alive_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Attach `component` and return a reference to the stored value.
    ///
    /// # Panics
    ///
    /// Panics if the entity is not alive in this store or already has a `T`.
    pub fn add<T: 'static>(&mut self, entity: Entity, component: T) -> &mut T {
        self.assert_alive(entity, "add");
        let pool = self.pool_mut_or_insert::<T>();
        if pool.contains(entity) {
            panic!(
                "{entity:?} already has a `{}` component",
                std::any::type_name::<T>()
            );
        }
        pool.insert(entity, component)
    }

    /// Detach and return the entity's `T`.
    ///
    /// # Panics
    ///
    /// Panics if the entity has no `T`.
    pub fn remove<T: 'static>(&mut self, entity: Entity) -> T {
        self.pool_mut::<T>()
            .and_then(|pool| pool.remove(entity))
            .unwrap_or_else(|| missing::<T>(entity))
    }

    /// # Panics
    ///
    /// Panics if the entity has no `T`.
    pub fn get<T: 'static>(&self, entity: Entity) -> &T {
        self.try_get::<T>(entity)
            .unwrap_or_else(|| missing::<T>(entity))
    }

    /// # Panics
    ///
    /// Panics if the entity has no `T`.
    pub fn get_mut<T: 'static>(&mut self, entity: Entity) -> &mut T {
        self.try_get_mut::<T>(entity)
            .unwrap_or_else(|| missing::<T>(entity))
    }

    pub fn try_get<T: 'static>(&self, entity: Entity) -> Option<&T> {
        self.pool::<T>()?.get(entity)
    }

    pub fn try_get_mut<T: 'static>(&mut self, entity: Entity) -> Option<&mut T> {
        self.pool_mut::<T>()?.get_mut(entity)
    }

    /// False for null, stale and foreign entities.
    pub fn has<T: 'static>(&self, entity: Entity) -> bool {
        self.pool::<T>().is_some_and(|pool| pool.contains(entity))
    }

    /// Lazy, single-pass traversal of all live entities in slot order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.allocator.iter()
    }

    pub fn each_entity(&self, mut f: impl FnMut(Entity)) {
        for entity in self.allocator.iter() {
            f(entity);
        }
    }

    /// Visit every entity holding all component types in `F`.
    ///
    /// ```ignore
    /// store.each_entity_with::<(Transform, SpriteRenderer)>(|e| { ... });
    /// ```
    pub fn each_entity_with<F: ComponentFilter>(&self, mut f: impl FnMut(Entity)) {
        for &entity in F::driver(self) {
            if F::matches(self, entity) {
                f(entity);
            }
        }
    }

    /// Visit every entity matching `Q`, with shared or exclusive access per
    /// parameter.
    ///
    /// ```ignore
    /// store.query::<(&mut Transform, &Velocity)>(|entity, (t, v)| {
    ///     t.translation += v.0;
    /// });
    /// ```
    ///
    /// # Panics
    ///
    /// Debug builds panic if `Q` names the same component type twice.
    pub fn query<Q: QueryParam>(&mut self, mut f: impl FnMut(Entity, Q::Item<'_>)) {
        if cfg!(debug_assertions) {
            let ids = Q::type_ids();
            let unique: HashSet<&TypeId> = ids.iter().collect();
            if unique.len() != ids.len() {
                panic!(
                    "query `{}` requests the same component more than once",
                    std::any::type_name::<Q>()
                );
            }
        }

        let Some(mut pools) = Q::extract(&mut self.pools) else {
            return;
        };
        for i in 0..Q::driver_len(&pools) {
            let entity = Q::driver_entity(&pools, i);
            if let Some(item) = Q::fetch(&mut pools, entity) {
                f(entity, item);
            }
        }
        Q::restore(pools, &mut self.pools);
    }

    /// Mutable pass over a single component type.
    pub fn for_each_mut<T: 'static>(&mut self, mut f: impl FnMut(Entity, &mut T)) {
        if let Some(pool) = self.pool_mut::<T>() {
            for (entity, component) in pool.iter_mut() {
                f(entity, component);
            }
        }
    }

    /// Number of entities holding a `T`.
    pub fn count<T: 'static>(&self) -> usize {
        self.pool::<T>().map_or(0, |pool| pool.entities().len())
    }

    pub(crate) fn pool<T: 'static>(&self) -> Option<&ComponentPool<T>> {
        self.pools
            .get(&TypeId::of::<T>())
            .and_then(|pool| pool.as_any().downcast_ref::<ComponentPool<T>>())
    }

    fn pool_mut<T: 'static>(&mut self) -> Option<&mut ComponentPool<T>> {
        self.pools
            .get_mut(&TypeId::of::<T>())
            .and_then(|pool| pool.as_any_mut().downcast_mut::<ComponentPool<T>>())
    }

    fn pool_mut_or_insert<T: 'static>(&mut self) -> &mut ComponentPool<T> {
        self.pools
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(ComponentPool::<T>::new()) as Box<dyn AnyPool>)
            .as_any_mut()
            .downcast_mut::<ComponentPool<T>>()
            .unwrap_or_else(|| unreachable!("pool registered under the wrong TypeId"))
    }

    fn assert_alive(&self, entity: Entity, op: &str) {
        if !self.is_alive(entity) {
            panic!("{op}: {entity:?} is not a live entity of this store");
        }
    }
}

impl Default for ComponentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn missing<T>(entity: Entity) -> ! {
    panic!(
        "{entity:?} has no `{}` component",
        std::any::type_name::<T>()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Debug, PartialEq)]
    struct Pos(f32, f32);

    #[derive(Debug, PartialEq)]
    struct Vel(f32, f32);

    #[derive(Debug, PartialEq)]
    struct Name(&'static str);

    #[test]
    fn add_get_has() {
        let mut store = ComponentStore::new();
        let e = store.create();
        store.add(e, Pos(1.0, 2.0));
        assert!(store.has::<Pos>(e));
        assert!(!store.has::<Vel>(e));
        assert_eq!(store.get::<Pos>(e), &Pos(1.0, 2.0));
        store.get_mut::<Pos>(e).0 = 5.0;
        assert_eq!(store.get::<Pos>(e).0, 5.0);
    }

    #[test]
    fn add_returns_stored_value() {
        let mut store = ComponentStore::new();
        let e = store.create();
        store.add(e, Pos(0.0, 0.0)).1 = 9.0;
        assert_eq!(store.get::<Pos>(e), &Pos(0.0, 9.0));
    }

    #[test]
    #[should_panic(expected = "already has a")]
    fn duplicate_add_panics() {
        let mut store = ComponentStore::new();
        let e = store.create();
        store.add(e, Pos(0.0, 0.0));
        store.add(e, Pos(1.0, 1.0));
    }

    #[test]
    #[should_panic(expected = "has no")]
    fn get_missing_panics() {
        let mut store = ComponentStore::new();
        let e = store.create();
        store.get::<Pos>(e);
    }

    #[test]
    #[should_panic(expected = "has no")]
    fn remove_missing_panics() {
        let mut store = ComponentStore::new();
        let e = store.create();
        store.remove::<Pos>(e);
    }

    #[test]
    fn remove_returns_value() {
        let mut store = ComponentStore::new();
        let e = store.create();
        store.add(e, Name("a"));
        assert_eq!(store.remove::<Name>(e), Name("a"));
        assert!(!store.has::<Name>(e));
    }

    #[test]
    fn destroy_drops_components_and_recycles() {
        let dropped = Rc::new(Cell::new(0));
        struct Probe(Rc<Cell<u32>>);
        impl Drop for Probe {
            fn drop(&mut self) {
                self.0.set(self.0.get() + 1);
            }
        }

        let mut store = ComponentStore::new();
        let e = store.create();
        store.add(e, Probe(dropped.clone()));
        store.add(e, Pos(0.0, 0.0));
        store.destroy(e);

        assert_eq!(dropped.get(), 1);
        assert!(!store.is_alive(e));
        assert!(!store.has::<Pos>(e));

        let reused = store.create();
        assert_eq!(reused.index(), e.index());
        assert!(!store.has::<Pos>(reused));
        assert!(!store.has::<Pos>(e));
    }

    #[test]
    #[should_panic(expected = "not a live entity")]
    fn destroy_stale_panics() {
        let mut store = ComponentStore::new();
        let e = store.create();
        store.destroy(e);
        store.destroy(e);
    }

    #[test]
    #[should_panic(expected = "not a live entity")]
    fn add_to_foreign_entity_panics() {
        let mut a = ComponentStore::new();
        let mut b = ComponentStore::new();
        let e = a.create();
        b.create();
        b.add(e, Pos(0.0, 0.0));
    }

    #[test]
    fn null_entity_has_nothing() {
        let mut store = ComponentStore::new();
        let e = store.create();
        store.add(e, Pos(0.0, 0.0));
        assert!(!store.has::<Pos>(Entity::NULL));
        assert!(store.try_get::<Pos>(Entity::NULL).is_none());
    }

    #[test]
    fn each_entity_visits_live_only() {
        let mut store = ComponentStore::new();
        let a = store.create();
        let b = store.create();
        let c = store.create();
        store.destroy(b);

        let mut seen = Vec::new();
        store.each_entity(|e| seen.push(e));
        assert_eq!(seen, vec![a, c]);
        assert_eq!(store.entities().count(), 2);
    }

    #[test]
    fn each_entity_with_filters() {
        let mut store = ComponentStore::new();
        let a = store.create();
        let b = store.create();
        let c = store.create();
        store.add(a, Pos(0.0, 0.0));
        store.add(a, Vel(1.0, 0.0));
        store.add(b, Pos(0.0, 0.0));
        store.add(c, Vel(0.0, 1.0));

        let mut both = Vec::new();
        store.each_entity_with::<(Pos, Vel)>(|e| both.push(e));
        assert_eq!(both, vec![a]);

        let mut vel = Vec::new();
        store.each_entity_with::<(Vel,)>(|e| vel.push(e));
        vel.sort_by_key(|e| e.index());
        assert_eq!(vel, vec![a, c]);

        let mut none = 0;
        store.each_entity_with::<(Name,)>(|_| none += 1);
        assert_eq!(none, 0);
    }

    #[test]
    fn query_mut_and_shared() {
        let mut store = ComponentStore::new();
        let a = store.create();
        let b = store.create();
        store.add(a, Pos(0.0, 0.0));
        store.add(a, Vel(1.0, 2.0));
        store.add(b, Pos(10.0, 10.0));

        store.query::<(&mut Pos, &Vel)>(|_, (pos, vel)| {
            pos.0 += vel.0;
            pos.1 += vel.1;
        });

        assert_eq!(store.get::<Pos>(a), &Pos(1.0, 2.0));
        assert_eq!(store.get::<Pos>(b), &Pos(10.0, 10.0));
        // Pools are back in place after the query.
        assert!(store.has::<Vel>(a));
    }

    #[test]
    fn query_missing_pool_is_empty() {
        let mut store = ComponentStore::new();
        let a = store.create();
        store.add(a, Pos(0.0, 0.0));
        let mut hits = 0;
        store.query::<(&Pos, &Name)>(|_, _| hits += 1);
        assert_eq!(hits, 0);
        assert!(store.has::<Pos>(a));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "more than once")]
    fn query_duplicate_type_panics() {
        let mut store = ComponentStore::new();
        store.query::<(&Pos, &mut Pos)>(|_, _| {});
    }

    #[test]
    fn for_each_mut_single_pool() {
        let mut store = ComponentStore::new();
        for i in 0..3 {
            let e = store.create();
            store.add(e, Pos(i as f32, 0.0));
        }
        store.for_each_mut::<Pos>(|_, p| p.1 = 7.0);
        let mut sevens = 0;
        store.query::<(&Pos,)>(|_, (p,)| {
            if p.1 == 7.0 {
                sevens += 1;
            }
        });
        assert_eq!(sevens, 3);
        assert_eq!(store.count::<Pos>(), 3);
    }

    #[test]
    fn clear_invalidates_handles() {
        let mut store = ComponentStore::new();
        let e = store.create();
        store.add(e, Pos(0.0, 0.0));
        store.clear();
        assert!(store.is_empty());
        assert!(!store.is_alive(e));
        let fresh = store.create();
        assert!(!store.has::<Pos>(fresh));
    }
}
