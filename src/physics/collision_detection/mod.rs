pub mod algorithm_registry;
pub mod collision_algorithms;
pub mod contact_manifold;
pub mod dispatcher;
pub mod manifold_result;
pub mod narrow_phase_callbacks;
pub mod pair_cache;
