use crate::physics::collision_detection::dispatcher::CollisionDispatcher;
use crate::physics::collision_detection::manifold_result::ManifoldResult;
use crate::physics::collision_detection::narrow_phase_callbacks::{BodyView, DispatchContext};
use crate::physics::handles::ManifoldHandle;

/// Strategy for a convex shape against a concave surface.
///
/// The manifold is always ordered (convex body, concave body) regardless of pair order.
#[derive(Debug)]
pub struct ConvexConcaveAlgorithm {
    dispatcher_id: usize,
    swapped: bool,
    manifold: ManifoldHandle,
}

impl ConvexConcaveAlgorithm {
    /// Creates the strategy and its manifold. `swapped` is set when the concave shape is the pair's first view.
    pub fn new(
        dispatcher: &mut CollisionDispatcher,
        a: &BodyView<'_>,
        b: &BodyView<'_>,
        swapped: bool,
    ) -> Self {
        let (convex, concave) = if swapped { (b, a) } else { (a, b) };
        Self {
            dispatcher_id: dispatcher.unique_id(),
            swapped,
            manifold: dispatcher.get_new_manifold(convex.body, concave.body),
        }
    }

    /// Whether the concave shape comes first in the pair.
    #[inline(always)]
    pub fn is_swapped(&self) -> bool {
        self.swapped
    }

    /// Manifold owned by this strategy.
    #[inline(always)]
    pub fn manifold(&self) -> ManifoldHandle {
        self.manifold
    }

    #[inline(always)]
    fn order<'v, 'a>(
        &self,
        a: &'v BodyView<'a>,
        b: &'v BodyView<'a>,
    ) -> (&'v BodyView<'a>, &'v BodyView<'a>) {
        if self.swapped {
            (b, a)
        } else {
            (a, b)
        }
    }

    /// Generates contacts between the convex view and the concave surface.
    pub fn process_collision(
        &mut self,
        a: &BodyView<'_>,
        b: &BodyView<'_>,
        dispatcher: &mut CollisionDispatcher,
        context: &DispatchContext<'_>,
    ) {
        debug_assert_eq!(self.dispatcher_id, dispatcher.unique_id());
        let (convex, concave) = self.order(a, b);
        let Some(manifold) = dispatcher.manifold_mut(self.manifold) else {
            debug_assert!(false, "Strategy manifold {} was released behind its back.", self.manifold);
            return;
        };
        let mut result = ManifoldResult::new(manifold, convex, concave);
        context
            .tester
            .convex_concave(convex, concave, context.info, &mut result);
        result.refresh_contact_points();
    }

    /// Time of impact in `[0, 1]`. Only the convex body's motion is considered for the early out.
    pub fn calculate_time_of_impact(
        &mut self,
        a: &BodyView<'_>,
        b: &BodyView<'_>,
        context: &DispatchContext<'_>,
    ) -> f32 {
        let (convex, concave) = self.order(a, b);
        if convex.below_ccd_threshold() {
            return 1.0;
        }
        context
            .tester
            .convex_concave_time_of_impact(convex, concave, context.info)
            .clamp(0.0, 1.0)
    }

    /// Appends the owned manifold.
    pub fn manifolds(&self, out: &mut Vec<ManifoldHandle>) {
        out.push(self.manifold);
    }

    pub(crate) fn release_resources(self, dispatcher: &mut CollisionDispatcher) {
        debug_assert_eq!(self.dispatcher_id, dispatcher.unique_id());
        dispatcher.release_manifold(self.manifold);
    }
}
