//! # Query — Iterating Entities by Component Type
//!
//! ```text
//! store.query::<(&mut Transform, &SpriteRenderer)>(|entity, (t, s)| { ... });
//!
//! 1. Take the Transform and SpriteRenderer pools out of the store's map
//! 2. Walk the first pool's packed entity list
//! 3. For each entity, fetch from every pool; skip if any pool misses
//! 4. Put the pools back
//! ```
//!
//! Taking pools out of the map is what lets `&mut A` and `&B` coexist: each
//! pool is owned by the query while it runs, so the borrow checker sees
//! disjoint values instead of two borrows of one map. The first parameter
//! drives iteration, so put the rarest component first.
//!
//! [`ComponentFilter`] is the read-only sibling used by
//! [`ComponentStore::each_entity_with`](super::ComponentStore::each_entity_with):
//! it only tests presence and works through `&self`.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use super::entity::Entity;
use super::pool::{AnyPool, ComponentPool};
use super::store::ComponentStore;

#[doc(hidden)]
pub type PoolMap = HashMap<TypeId, Box<dyn AnyPool>>;

/// Something fetchable per entity: `&T`, `&mut T`, or a tuple of those.
pub trait QueryParam {
    type Item<'w>;

    /// Pool(s) owned by the query while it runs.
    type Pool;

    fn type_ids() -> Vec<TypeId>;

    /// Take the pool(s) out of the map. `None` when a pool does not exist, in
    /// which case nothing matches and the map is left as it was.
    #[doc(hidden)]
    fn extract(pools: &mut PoolMap) -> Option<Self::Pool>;

    #[doc(hidden)]
    fn restore(pool: Self::Pool, pools: &mut PoolMap);

    /// Number of candidates in the driving pool.
    #[doc(hidden)]
    fn driver_len(pool: &Self::Pool) -> usize;

    #[doc(hidden)]
    fn driver_entity(pool: &Self::Pool, index: usize) -> Entity;

    #[doc(hidden)]
    fn fetch(pool: &mut Self::Pool, entity: Entity) -> Option<Self::Item<'_>>;
}

fn take_pool<T: 'static>(pools: &mut PoolMap) -> Option<Box<ComponentPool<T>>> {
    let erased = pools.remove(&TypeId::of::<T>())?;
    match (erased as Box<dyn Any>).downcast::<ComponentPool<T>>() {
        Ok(pool) => Some(pool),
        Err(_) => unreachable!("pool registered under the wrong TypeId"),
    }
}

impl<T: 'static> QueryParam for &T {
    type Item<'w> = &'w T;
    type Pool = Box<ComponentPool<T>>;

    fn type_ids() -> Vec<TypeId> {
        vec![TypeId::of::<T>()]
    }

    fn extract(pools: &mut PoolMap) -> Option<Self::Pool> {
        take_pool::<T>(pools)
    }

    fn restore(pool: Self::Pool, pools: &mut PoolMap) {
        pools.insert(TypeId::of::<T>(), pool);
    }

    fn driver_len(pool: &Self::Pool) -> usize {
        pool.entities().len()
    }

    fn driver_entity(pool: &Self::Pool, index: usize) -> Entity {
        pool.entities()[index]
    }

    fn fetch(pool: &mut Self::Pool, entity: Entity) -> Option<Self::Item<'_>> {
        pool.get(entity)
    }
}

impl<T: 'static> QueryParam for &mut T {
    type Item<'w> = &'w mut T;
    type Pool = Box<ComponentPool<T>>;

    fn type_ids() -> Vec<TypeId> {
        vec![TypeId::of::<T>()]
    }

    fn extract(pools: &mut PoolMap) -> Option<Self::Pool> {
        take_pool::<T>(pools)
    }

    fn restore(pool: Self::Pool, pools: &mut PoolMap) {
        pools.insert(TypeId::of::<T>(), pool);
    }

    fn driver_len(pool: &Self::Pool) -> usize {
        pool.entities().len()
    }

    fn driver_entity(pool: &Self::Pool, index: usize) -> Entity {
        pool.entities()[index]
    }

    fn fetch(pool: &mut Self::Pool, entity: Entity) -> Option<Self::Item<'_>> {
        pool.get_mut(entity)
    }
}

macro_rules! impl_query_param_tuple {
    ($First:ident $(, $Rest:ident)*) => {
        impl<$First: QueryParam $(, $Rest: QueryParam)*> QueryParam for ($First, $($Rest,)*) {
            type Item<'w> = ($First::Item<'w>, $($Rest::Item<'w>,)*);
            type Pool = ($First::Pool, $($Rest::Pool,)*);

            fn type_ids() -> Vec<TypeId> {
                let mut ids = $First::type_ids();
                $(ids.extend($Rest::type_ids());)*
                ids
            }

            #[allow(non_snake_case)]
            fn extract(pools: &mut PoolMap) -> Option<Self::Pool> {
                let $First = $First::extract(pools);
                $(let $Rest = $Rest::extract(pools);)*
                match ($First, $($Rest,)*) {
                    (Some($First), $(Some($Rest),)*) => Some(($First, $($Rest,)*)),
                    ($First, $($Rest,)*) => {
                        if let Some(p) = $First {
                            $First::restore(p, pools);
                        }
                        $(if let Some(p) = $Rest {
                            $Rest::restore(p, pools);
                        })*
                        None
                    }
                }
            }

            #[allow(non_snake_case)]
            fn restore(pool: Self::Pool, pools: &mut PoolMap) {
                let ($First, $($Rest,)*) = pool;
                $First::restore($First, pools);
                $($Rest::restore($Rest, pools);)*
            }

            fn driver_len(pool: &Self::Pool) -> usize {
                $First::driver_len(&pool.0)
            }

            fn driver_entity(pool: &Self::Pool, index: usize) -> Entity {
                $First::driver_entity(&pool.0, index)
            }

            #[allow(non_snake_case)]
            fn fetch(pool: &mut Self::Pool, entity: Entity) -> Option<Self::Item<'_>> {
                let ($First, $($Rest,)*) = pool;
                Some(($First::fetch($First, entity)?, $($Rest::fetch($Rest, entity)?,)*))
            }
        }
    };
}

impl_query_param_tuple!(A);
impl_query_param_tuple!(A, B);
impl_query_param_tuple!(A, B, C);
impl_query_param_tuple!(A, B, C, D);
impl_query_param_tuple!(A, B, C, D, E);

/// Presence-only filter over a tuple of component types, e.g.
/// `(Transform, SpriteRenderer)`.
pub trait ComponentFilter {
    /// Packed entity list of the first type's pool (empty if none exists).
    #[doc(hidden)]
    fn driver(store: &ComponentStore) -> &[Entity];

    fn matches(store: &ComponentStore, entity: Entity) -> bool;
}

macro_rules! impl_component_filter {
    ($First:ident $(, $Rest:ident)*) => {
        impl<$First: 'static $(, $Rest: 'static)*> ComponentFilter for ($First, $($Rest,)*) {
            fn driver(store: &ComponentStore) -> &[Entity] {
                store.pool::<$First>().map_or(&[], |pool| pool.entities())
            }

            fn matches(store: &ComponentStore, entity: Entity) -> bool {
                store.has::<$First>(entity) $(&& store.has::<$Rest>(entity))*
            }
        }
    };
}

impl_component_filter!(A);
impl_component_filter!(A, B);
impl_component_filter!(A, B, C);
impl_component_filter!(A, B, C, D);
impl_component_filter!(A, B, C, D, E);
