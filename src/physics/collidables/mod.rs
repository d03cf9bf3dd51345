pub mod collision_proxy;
pub mod shape;

// Compound shapes
pub mod compound;
