//! Entity/component storage.
//!
//! - [`entity`]: generational [`Entity`] handles
//! - [`store`]: [`ComponentStore`], one sparse-set pool per component type
//! - [`query`]: tuple queries and presence filters

pub mod entity;
mod pool;
pub mod query;
pub mod store;

pub use entity::{Entity, StoreId};
pub use query::{ComponentFilter, QueryParam};
pub use store::ComponentStore;
