use crate::physics::collision_detection::dispatcher::CollisionDispatcher;
use crate::physics::collision_detection::manifold_result::ManifoldResult;
use crate::physics::collision_detection::narrow_phase_callbacks::{BodyView, DispatchContext};
use crate::physics::handles::ManifoldHandle;

/// Strategy for two convex shapes. Owns one manifold, created on first use.
#[derive(Debug)]
pub struct ConvexConvexAlgorithm {
    dispatcher_id: usize,
    manifold: Option<ManifoldHandle>,
}

impl ConvexConvexAlgorithm {
    /// Creates the strategy for a dispatcher. No manifold is allocated until contacts are requested.
    pub fn new(dispatcher: &CollisionDispatcher) -> Self {
        Self {
            dispatcher_id: dispatcher.unique_id(),
            manifold: None,
        }
    }

    /// Manifold owned by this strategy, if one has been allocated.
    #[inline(always)]
    pub fn manifold(&self) -> Option<ManifoldHandle> {
        self.manifold
    }

    /// Generates contacts into the owned manifold and refreshes it.
    pub fn process_collision(
        &mut self,
        a: &BodyView<'_>,
        b: &BodyView<'_>,
        dispatcher: &mut CollisionDispatcher,
        context: &DispatchContext<'_>,
    ) {
        debug_assert_eq!(self.dispatcher_id, dispatcher.unique_id());
        let handle = match self.manifold {
            Some(handle) => handle,
            None => *self
                .manifold
                .insert(dispatcher.get_new_manifold(a.body, b.body)),
        };
        let Some(manifold) = dispatcher.manifold_mut(handle) else {
            debug_assert!(false, "Strategy manifold {} was released behind its back.", handle);
            return;
        };
        let mut result = ManifoldResult::new(manifold, a, b);
        context
            .tester
            .convex_convex(a, b, context.info, &mut result);
        result.refresh_contact_points();
    }

    /// Time of impact in `[0, 1]`. Pairs moving less than both thresholds skip the query.
    pub fn calculate_time_of_impact(
        &mut self,
        a: &BodyView<'_>,
        b: &BodyView<'_>,
        context: &DispatchContext<'_>,
    ) -> f32 {
        if a.below_ccd_threshold() && b.below_ccd_threshold() {
            return 1.0;
        }
        context
            .tester
            .convex_convex_time_of_impact(a, b, context.info)
            .clamp(0.0, 1.0)
    }

    /// Appends the owned manifold, if any.
    pub fn manifolds(&self, out: &mut Vec<ManifoldHandle>) {
        out.extend(self.manifold);
    }

    pub(crate) fn release_resources(self, dispatcher: &mut CollisionDispatcher) {
        debug_assert_eq!(self.dispatcher_id, dispatcher.unique_id());
        if let Some(handle) = self.manifold {
            dispatcher.release_manifold(handle);
        }
    }
}
