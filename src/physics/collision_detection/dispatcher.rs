use log::{debug, trace};

use super::algorithm_registry::{AlgorithmKind, AlgorithmRegistry};
use super::collision_algorithms::compound::CompoundAlgorithm;
use super::collision_algorithms::convex_concave::ConvexConcaveAlgorithm;
use super::collision_algorithms::convex_convex::ConvexConvexAlgorithm;
use super::collision_algorithms::empty::EmptyAlgorithm;
use super::collision_algorithms::CollisionAlgorithm;
use super::contact_manifold::PersistentManifold;
use super::narrow_phase_callbacks::{BodyView, DispatchContext, INarrowPhaseTester};
use super::pair_cache::OverlappingPairCache;
use crate::physics::collidables::shape::Shapes;
use crate::physics::collision_body::{Bodies, CollisionBody};
use crate::physics::configuration::{CollisionConfiguration, ResponseFilter};
use crate::physics::error::CollisionError;
use crate::physics::handles::{BodyHandle, ManifoldHandle};
use crate::utilities::memory::id_pool::IdPool;

/// Number of algorithm slots carried by every overlapping pair, and so the number of
/// dispatchers that can keep independent strategies on the same pair.
pub const MAX_DISPATCHERS: usize = 2;

/// Narrow phase mode for one dispatch pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchFunc {
    /// Generate contacts.
    #[default]
    Discrete,
    /// Compute the earliest time of impact.
    Continuous,
}

/// Per-step parameters handed to every strategy and tester.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatcherInfo {
    /// Duration of the step.
    pub time_step: f32,
    /// Index of the step being simulated.
    pub step_count: u64,
    /// Mode of this dispatch pass.
    pub dispatch_func: DispatchFunc,
    /// Earliest time of impact found by the last continuous pass, clamped to `[0, 1]`.
    pub time_of_impact: f32,
    /// Penetration tolerated by continuous queries before reporting an impact.
    pub allowed_ccd_penetration: f32,
}

impl Default for DispatcherInfo {
    fn default() -> Self {
        Self {
            time_step: 1.0 / 60.0,
            step_count: 0,
            dispatch_func: DispatchFunc::Discrete,
            time_of_impact: 1.0,
            allowed_ccd_penetration: 0.04,
        }
    }
}

impl DispatcherInfo {
    /// Creates step parameters for the given mode.
    pub fn new(time_step: f32, dispatch_func: DispatchFunc) -> Self {
        Self {
            time_step,
            dispatch_func,
            ..Default::default()
        }
    }
}

/// Running totals kept by a dispatcher instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatcherStats {
    /// Strategies created, including compound children.
    pub algorithms_created: u64,
    /// Strategies destroyed, including compound children.
    pub algorithms_destroyed: u64,
    /// Manifolds handed out by `get_new_manifold`.
    pub manifolds_created: u64,
    /// Manifolds returned through `release_manifold`.
    pub manifolds_released: u64,
    /// Pairs run through a strategy by `dispatch_all_collision_pairs`.
    pub pairs_dispatched: u64,
}

/// Whether two bodies should be considered for narrow phase work at all.
/// False when both are static, or when neither is active.
#[inline(always)]
pub fn needs_collision(a: &CollisionBody, b: &CollisionBody) -> bool {
    if a.is_static() && b.is_static() {
        return false;
    }
    a.is_active() || b.is_active()
}

/// Resolves strategies for pairs, owns their manifolds and drives narrow phase passes.
#[derive(Debug)]
pub struct CollisionDispatcher {
    unique_id: usize,
    registry: AlgorithmRegistry,
    response_filter: ResponseFilter,
    contact_breaking_threshold: f32,
    manifolds: Vec<Option<PersistentManifold>>,
    manifold_ids: IdPool,
    live_manifolds: Vec<ManifoldHandle>,
    stats: DispatcherStats,
}

impl CollisionDispatcher {
    /// Creates a dispatcher owning slot `unique_id` of every pair.
    pub fn new(unique_id: usize, configuration: &CollisionConfiguration) -> Result<Self, CollisionError> {
        if unique_id >= MAX_DISPATCHERS {
            return Err(CollisionError::InvalidDispatcherId {
                id: unique_id,
                max: MAX_DISPATCHERS,
            });
        }
        configuration.validate()?;
        Ok(Self {
            unique_id,
            registry: AlgorithmRegistry::new(configuration.compound_support),
            response_filter: configuration.response_filter,
            contact_breaking_threshold: configuration.contact_breaking_threshold,
            manifolds: Vec::with_capacity(configuration.initial_manifold_capacity),
            manifold_ids: IdPool::new(configuration.initial_manifold_capacity),
            live_manifolds: Vec::with_capacity(configuration.initial_manifold_capacity),
            stats: DispatcherStats::default(),
        })
    }

    /// Slot index this dispatcher uses on every pair.
    #[inline(always)]
    pub fn unique_id(&self) -> usize {
        self.unique_id
    }

    /// Strategy table used by `find_algorithm`.
    #[inline(always)]
    pub fn registry(&self) -> &AlgorithmRegistry {
        &self.registry
    }

    /// Strategy table, for overriding cells. Existing strategies are not affected.
    #[inline(always)]
    pub fn registry_mut(&mut self) -> &mut AlgorithmRegistry {
        &mut self.registry
    }

    /// Running totals.
    #[inline(always)]
    pub fn stats(&self) -> &DispatcherStats {
        &self.stats
    }

    /// See [`needs_collision`].
    #[inline(always)]
    pub fn needs_collision(&self, a: &CollisionBody, b: &CollisionBody) -> bool {
        needs_collision(a, b)
    }

    /// Whether contacts between two bodies should reach the solver.
    pub fn needs_response(&self, a: &CollisionBody, b: &CollisionBody) -> bool {
        if !a.has_contact_response() || !b.has_contact_response() {
            return false;
        }
        if a.is_static_or_kinematic() && b.is_static_or_kinematic() {
            return false;
        }
        match self.response_filter {
            ResponseFilter::Standard => true,
            ResponseFilter::RequireActiveBody => a.is_active() || b.is_active(),
        }
    }

    /// Creates the strategy the registry assigns to the pair `(a, b)`.
    pub fn find_algorithm(
        &mut self,
        a: &BodyView<'_>,
        b: &BodyView<'_>,
        context: &DispatchContext<'_>,
    ) -> CollisionAlgorithm {
        let kind = self.registry.kind(a.shape.category(), b.shape.category());
        self.stats.algorithms_created += 1;
        trace!(
            "Dispatcher {} created {:?} for ({}, {}).",
            self.unique_id,
            kind,
            a.body,
            b.body
        );
        match kind {
            AlgorithmKind::ConvexConvex => {
                CollisionAlgorithm::ConvexConvex(ConvexConvexAlgorithm::new(self))
            }
            AlgorithmKind::ConvexConcave { swapped } => CollisionAlgorithm::ConvexConcave(
                ConvexConcaveAlgorithm::new(self, a, b, swapped),
            ),
            AlgorithmKind::Compound { swapped } => CollisionAlgorithm::Compound(
                CompoundAlgorithm::new(self, a, b, swapped, context),
            ),
            AlgorithmKind::Empty => CollisionAlgorithm::Empty(EmptyAlgorithm),
        }
    }

    /// Destroys a strategy, releasing every manifold it and its children own.
    pub fn destroy_algorithm(&mut self, algorithm: CollisionAlgorithm) {
        self.stats.algorithms_destroyed += 1;
        trace!(
            "Dispatcher {} destroyed {:?}.",
            self.unique_id,
            algorithm.kind()
        );
        algorithm.destroy(self);
    }

    /// Allocates an empty manifold for `(body_a, body_b)` and registers it as live.
    pub fn get_new_manifold(&mut self, body_a: BodyHandle, body_b: BodyHandle) -> ManifoldHandle {
        let handle = ManifoldHandle(self.manifold_ids.take());
        if handle.0 >= self.manifolds.len() {
            self.manifolds.resize_with(handle.0 + 1, || None);
        }
        let mut manifold = PersistentManifold::new(body_a, body_b, self.contact_breaking_threshold);
        manifold.index_in_dispatcher = self.live_manifolds.len();
        self.manifolds[handle.0] = Some(manifold);
        self.live_manifolds.push(handle);
        self.stats.manifolds_created += 1;
        handle
    }

    /// Clears and frees a manifold. The last live manifold moves into its list position.
    pub fn release_manifold(&mut self, handle: ManifoldHandle) {
        self.clear_manifold(handle);
        let Some(manifold) = self.manifolds.get_mut(handle.0).and_then(Option::take) else {
            debug_assert!(false, "Released {} which is not live.", handle);
            return;
        };
        let index = manifold.index_in_dispatcher;
        self.live_manifolds.swap_remove(index);
        if let Some(&moved) = self.live_manifolds.get(index) {
            if let Some(moved_manifold) = self.manifolds[moved.0].as_mut() {
                moved_manifold.index_in_dispatcher = index;
            }
        }
        self.manifold_ids.return_id(handle.0);
        self.stats.manifolds_released += 1;
    }

    /// Drops every contact point of a manifold without releasing it.
    pub fn clear_manifold(&mut self, handle: ManifoldHandle) {
        match self.manifold_mut(handle) {
            Some(manifold) => manifold.clear_manifold(),
            None => debug_assert!(false, "Cleared {} which is not live.", handle),
        }
    }

    /// Number of live manifolds.
    #[inline(always)]
    pub fn num_manifolds(&self) -> usize {
        self.live_manifolds.len()
    }

    /// Handle of the live manifold at `index` in the live list.
    #[inline(always)]
    pub fn manifold_handle_by_index(&self, index: usize) -> ManifoldHandle {
        self.live_manifolds[index]
    }

    /// Live manifold at `index` in the live list.
    pub fn manifold_by_index(&self, index: usize) -> &PersistentManifold {
        let handle = self.live_manifolds[index];
        match &self.manifolds[handle.0] {
            Some(manifold) => manifold,
            None => unreachable!("live list references a freed manifold"),
        }
    }

    /// Handles of every live manifold, in live list order.
    #[inline(always)]
    pub fn live_manifolds(&self) -> &[ManifoldHandle] {
        &self.live_manifolds
    }

    /// Gets a live manifold.
    #[inline(always)]
    pub fn manifold(&self, handle: ManifoldHandle) -> Option<&PersistentManifold> {
        self.manifolds.get(handle.0).and_then(Option::as_ref)
    }

    /// Gets a live manifold mutably.
    #[inline(always)]
    pub fn manifold_mut(&mut self, handle: ManifoldHandle) -> Option<&mut PersistentManifold> {
        self.manifolds.get_mut(handle.0).and_then(Option::as_mut)
    }

    /// Runs every pair of the cache through its strategy for this dispatcher, creating strategies for
    /// pairs that have none. Pairs failing [`needs_collision`] are skipped but keep their strategies.
    ///
    /// Returns the earliest time of impact for continuous passes, and 1 for discrete passes. The same
    /// value is stored in `info.time_of_impact`.
    pub fn dispatch_all_collision_pairs(
        &mut self,
        pair_cache: &mut OverlappingPairCache,
        bodies: &Bodies,
        shapes: &Shapes,
        tester: &dyn INarrowPhaseTester,
        info: &mut DispatcherInfo,
    ) -> f32 {
        let step_info = *info;
        let context = DispatchContext {
            shapes,
            tester,
            info: &step_info,
        };
        let mut time_of_impact = 1.0f32;
        let mut dispatched = 0u64;
        for pair in pair_cache.pairs_mut() {
            let (Some(body_a), Some(body_b)) = (bodies.get(pair.body_a()), bodies.get(pair.body_b())) else {
                debug_assert!(false, "Pair {} references a missing body.", pair);
                continue;
            };
            if !needs_collision(body_a, body_b) {
                continue;
            }
            let view_a = BodyView::new(pair.body_a(), body_a, shapes);
            let view_b = BodyView::new(pair.body_b(), body_b, shapes);
            let slot = pair.algorithm_slot_mut(self.unique_id);
            if slot.is_none() {
                *slot = Some(self.find_algorithm(&view_a, &view_b, &context));
            }
            let Some(algorithm) = slot.as_mut() else {
                continue;
            };
            match step_info.dispatch_func {
                DispatchFunc::Discrete => {
                    algorithm.process_collision(&view_a, &view_b, self, &context);
                }
                DispatchFunc::Continuous => {
                    let fraction = algorithm.calculate_time_of_impact(&view_a, &view_b, self, &context);
                    time_of_impact = time_of_impact.min(fraction);
                }
            }
            dispatched += 1;
        }
        self.stats.pairs_dispatched += dispatched;
        let time_of_impact = time_of_impact.clamp(0.0, 1.0);
        info.time_of_impact = time_of_impact;
        debug!(
            "Dispatcher {} ran {} of {} pairs ({:?}), time of impact {}.",
            self.unique_id,
            dispatched,
            pair_cache.len(),
            step_info.dispatch_func,
            time_of_impact
        );
        time_of_impact
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::body_properties::RigidPose;
    use crate::physics::collision_body::ActivationState;
    use crate::physics::handles::ShapeHandle;

    fn dispatcher() -> CollisionDispatcher {
        CollisionDispatcher::new(0, &CollisionConfiguration::default()).expect("valid configuration")
    }

    #[test]
    fn rejects_out_of_range_ids() {
        let error = CollisionDispatcher::new(MAX_DISPATCHERS, &CollisionConfiguration::default())
            .expect_err("id out of range");
        assert_eq!(
            error,
            CollisionError::InvalidDispatcherId {
                id: MAX_DISPATCHERS,
                max: MAX_DISPATCHERS
            }
        );
    }

    #[test]
    fn release_compacts_live_list() {
        let mut dispatcher = dispatcher();
        let first = dispatcher.get_new_manifold(BodyHandle(0), BodyHandle(1));
        let second = dispatcher.get_new_manifold(BodyHandle(1), BodyHandle(2));
        let third = dispatcher.get_new_manifold(BodyHandle(2), BodyHandle(3));
        assert_eq!(dispatcher.num_manifolds(), 3);

        dispatcher.release_manifold(first);
        assert_eq!(dispatcher.num_manifolds(), 2);
        assert!(dispatcher.manifold(first).is_none());
        // The last manifold moved into the freed position.
        assert_eq!(dispatcher.manifold_handle_by_index(0), third);
        assert_eq!(dispatcher.manifold_by_index(0).body_a(), BodyHandle(2));
        assert_eq!(dispatcher.manifold_by_index(1).body_a(), BodyHandle(1));

        dispatcher.release_manifold(third);
        assert_eq!(dispatcher.live_manifolds(), &[second]);
        // Freed slots are reused.
        let reused = dispatcher.get_new_manifold(BodyHandle(4), BodyHandle(5));
        assert!(reused == first || reused == third);
        assert_eq!(dispatcher.stats().manifolds_created, 4);
        assert_eq!(dispatcher.stats().manifolds_released, 2);
    }

    #[test]
    fn collision_and_response_filters() {
        let dispatcher = dispatcher();
        let dynamic = CollisionBody::new(ShapeHandle(0), RigidPose::IDENTITY);
        let fixed = CollisionBody::new_static(ShapeHandle(0), RigidPose::IDENTITY);
        let sleeping = dynamic
            .clone()
            .with_activation_state(ActivationState::IslandSleeping);

        assert!(!dispatcher.needs_collision(&fixed, &fixed));
        assert!(dispatcher.needs_collision(&fixed, &dynamic));
        assert!(dispatcher.needs_collision(&dynamic, &fixed));
        assert!(!dispatcher.needs_collision(&sleeping, &sleeping));
        assert!(dispatcher.needs_collision(&sleeping, &dynamic));

        assert!(dispatcher.needs_response(&dynamic, &fixed));
        assert!(dispatcher.needs_response(&sleeping, &sleeping));
        let ghost = dynamic
            .clone()
            .with_flags(crate::physics::collision_body::BodyFlags::NO_CONTACT_RESPONSE);
        assert!(!dispatcher.needs_response(&ghost, &dynamic));

        let strict = CollisionDispatcher::new(
            1,
            &CollisionConfiguration::default().with_response_filter(ResponseFilter::RequireActiveBody),
        )
        .expect("valid configuration");
        assert!(!strict.needs_response(&sleeping, &sleeping));
        assert!(strict.needs_response(&sleeping, &dynamic));
    }
}
