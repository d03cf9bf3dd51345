use super::compound::CompoundAlgorithm;
use super::convex_concave::ConvexConcaveAlgorithm;
use super::convex_convex::ConvexConvexAlgorithm;
use super::empty::EmptyAlgorithm;
use crate::physics::collision_detection::algorithm_registry::AlgorithmKind;
use crate::physics::collision_detection::dispatcher::CollisionDispatcher;
use crate::physics::collision_detection::narrow_phase_callbacks::{BodyView, DispatchContext};
use crate::physics::handles::ManifoldHandle;

/// Persistent per-pair collision strategy.
///
/// Created by [`CollisionDispatcher::find_algorithm`] and stored in the pair's slot for the creating
/// dispatcher until the pair is removed or cleaned. Views are always passed in pair order; strategies
/// that care about orientation remember whether they were created swapped.
#[derive(Debug)]
pub enum CollisionAlgorithm {
    /// Two convex shapes.
    ConvexConvex(ConvexConvexAlgorithm),
    /// Convex shape against a concave surface.
    ConvexConcave(ConvexConcaveAlgorithm),
    /// Compound against anything.
    Compound(CompoundAlgorithm),
    /// Unhandled pair.
    Empty(EmptyAlgorithm),
}

impl CollisionAlgorithm {
    /// Kind this strategy was created as.
    pub fn kind(&self) -> AlgorithmKind {
        match self {
            CollisionAlgorithm::ConvexConvex(_) => AlgorithmKind::ConvexConvex,
            CollisionAlgorithm::ConvexConcave(algorithm) => AlgorithmKind::ConvexConcave {
                swapped: algorithm.is_swapped(),
            },
            CollisionAlgorithm::Compound(algorithm) => AlgorithmKind::Compound {
                swapped: algorithm.is_swapped(),
            },
            CollisionAlgorithm::Empty(_) => AlgorithmKind::Empty,
        }
    }

    /// Generates contacts for the pair `(a, b)` into the strategy's manifolds.
    pub fn process_collision(
        &mut self,
        a: &BodyView<'_>,
        b: &BodyView<'_>,
        dispatcher: &mut CollisionDispatcher,
        context: &DispatchContext<'_>,
    ) {
        match self {
            CollisionAlgorithm::ConvexConvex(algorithm) => {
                algorithm.process_collision(a, b, dispatcher, context)
            }
            CollisionAlgorithm::ConvexConcave(algorithm) => {
                algorithm.process_collision(a, b, dispatcher, context)
            }
            CollisionAlgorithm::Compound(algorithm) => {
                algorithm.process_collision(a, b, dispatcher, context)
            }
            CollisionAlgorithm::Empty(_) => {}
        }
    }

    /// Fraction of the step at which the pair first touches, in `[0, 1]`.
    pub fn calculate_time_of_impact(
        &mut self,
        a: &BodyView<'_>,
        b: &BodyView<'_>,
        dispatcher: &mut CollisionDispatcher,
        context: &DispatchContext<'_>,
    ) -> f32 {
        match self {
            CollisionAlgorithm::ConvexConvex(algorithm) => {
                algorithm.calculate_time_of_impact(a, b, context)
            }
            CollisionAlgorithm::ConvexConcave(algorithm) => {
                algorithm.calculate_time_of_impact(a, b, context)
            }
            CollisionAlgorithm::Compound(algorithm) => {
                algorithm.calculate_time_of_impact(a, b, dispatcher, context)
            }
            CollisionAlgorithm::Empty(algorithm) => algorithm.calculate_time_of_impact(),
        }
    }

    /// Appends every manifold this strategy owns, including those of nested strategies.
    pub fn manifolds(&self, out: &mut Vec<ManifoldHandle>) {
        match self {
            CollisionAlgorithm::ConvexConvex(algorithm) => algorithm.manifolds(out),
            CollisionAlgorithm::ConvexConcave(algorithm) => algorithm.manifolds(out),
            CollisionAlgorithm::Compound(algorithm) => algorithm.manifolds(out),
            CollisionAlgorithm::Empty(_) => {}
        }
    }

    /// Releases the strategy's manifolds and nested strategies back to the dispatcher.
    /// Prefer [`CollisionDispatcher::destroy_algorithm`], which also keeps the dispatcher's counters.
    pub fn destroy(self, dispatcher: &mut CollisionDispatcher) {
        match self {
            CollisionAlgorithm::ConvexConvex(algorithm) => algorithm.release_resources(dispatcher),
            CollisionAlgorithm::ConvexConcave(algorithm) => algorithm.release_resources(dispatcher),
            CollisionAlgorithm::Compound(algorithm) => algorithm.release_resources(dispatcher),
            CollisionAlgorithm::Empty(_) => {}
        }
    }
}
