//! Collision pair management, narrow phase dispatch and simulation islands.
//!
//! The broad phase reports overlapping proxies into an [`OverlappingPairCache`]. A
//! [`CollisionDispatcher`] picks a collision strategy for every pair through its
//! [`AlgorithmRegistry`], keeps the strategy cached in the pair and owns the contact manifolds the
//! strategies fill. [`SimulationIslandManager`] and [`IslandDispatcher`] then group bodies into
//! islands connected by contacts, put resting islands to sleep and hand the rest to the solver.
//!
//! [`CollisionPipeline`] runs those stages in order for a single step.

pub mod physics;
pub mod utilities;

pub use physics::body_properties::RigidPose;
pub use physics::collidables::collision_proxy::{CollisionFilterGroups, CollisionProxy};
pub use physics::collidables::compound::{Compound, CompoundChild};
pub use physics::collidables::shape::{ConvexShape, Shape, ShapeCategory, Shapes, TriangleMesh};
pub use physics::collision_body::{ActivationState, Bodies, BodyFlags, CollisionBody};
pub use physics::collision_detection::algorithm_registry::{AlgorithmKind, AlgorithmRegistry};
pub use physics::collision_detection::collision_algorithms::CollisionAlgorithm;
pub use physics::collision_detection::contact_manifold::{ContactPoint, PersistentManifold};
pub use physics::collision_detection::dispatcher::{
    CollisionDispatcher, DispatchFunc, DispatcherInfo, DispatcherStats,
};
pub use physics::collision_detection::manifold_result::ManifoldResult;
pub use physics::collision_detection::narrow_phase_callbacks::{
    BodyView, DispatchContext, INarrowPhaseTester,
};
pub use physics::collision_detection::pair_cache::{OverlappingPair, OverlappingPairCache};
pub use physics::collision_pipeline::{BroadPhaseEvent, CollisionPipeline, StepReport};
pub use physics::configuration::{CollisionConfiguration, ResponseFilter};
pub use physics::error::CollisionError;
pub use physics::handles::{BodyHandle, ManifoldHandle, ProxyHandle, ShapeHandle};
pub use physics::island_dispatcher::{ConstraintLink, IIslandSimulator, Island, IslandDispatcher};
pub use physics::island_manager::{IIslandCallback, IslandStats, SimulationIslandManager};
pub use utilities::bounding_box::BoundingBox;
pub use utilities::thread_dispatcher::{
    IThreadDispatcher, JobCounter, ScopedThreadDispatcher, SequentialThreadDispatcher,
};
