pub mod collision_algorithm;
pub mod compound;
pub mod convex_concave;
pub mod convex_convex;
pub mod empty;

pub use collision_algorithm::CollisionAlgorithm;
