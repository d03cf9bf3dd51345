//! Handle allocation shared by the dispatcher's manifold slab.

pub mod id_pool;

pub use id_pool::IdPool;
