use log::trace;

use super::collision_algorithm::CollisionAlgorithm;
use crate::physics::collision_detection::dispatcher::CollisionDispatcher;
use crate::physics::collision_detection::narrow_phase_callbacks::{BodyView, DispatchContext};
use crate::physics::handles::ManifoldHandle;
use crate::utilities::bounding_box::BoundingBox;

/// Strategy for a compound against any shape. Holds one child strategy per compound child,
/// each resolved through the same dispatcher.
#[derive(Debug)]
pub struct CompoundAlgorithm {
    dispatcher_id: usize,
    swapped: bool,
    revision: u32,
    children: Vec<CollisionAlgorithm>,
    /// Scratch list of manifolds owned by culled children.
    culled_manifolds: Vec<ManifoldHandle>,
}

impl CompoundAlgorithm {
    /// Creates child strategies for every child of the compound view. `swapped` is set when the compound is
    /// the pair's second view.
    pub fn new(
        dispatcher: &mut CollisionDispatcher,
        a: &BodyView<'_>,
        b: &BodyView<'_>,
        swapped: bool,
        context: &DispatchContext<'_>,
    ) -> Self {
        let mut algorithm = Self {
            dispatcher_id: dispatcher.unique_id(),
            swapped,
            revision: 0,
            children: Vec::new(),
            culled_manifolds: Vec::new(),
        };
        let (compound, other) = if swapped { (b, a) } else { (a, b) };
        algorithm.rebuild_children(compound, other, dispatcher, context);
        algorithm
    }

    /// Whether the compound is the pair's second view.
    #[inline(always)]
    pub fn is_swapped(&self) -> bool {
        self.swapped
    }

    /// Child strategies in compound child order.
    #[inline(always)]
    pub fn children(&self) -> &[CollisionAlgorithm] {
        &self.children
    }

    fn rebuild_children(
        &mut self,
        compound: &BodyView<'_>,
        other: &BodyView<'_>,
        dispatcher: &mut CollisionDispatcher,
        context: &DispatchContext<'_>,
    ) {
        for child in self.children.drain(..) {
            dispatcher.destroy_algorithm(child);
        }
        let Some(shape) = compound.shape.as_compound() else {
            debug_assert!(false, "Compound strategy bound to a non-compound shape.");
            return;
        };
        self.revision = shape.revision();
        self.children.reserve(shape.child_count());
        for child_index in 0..shape.child_count() {
            if let Some(child) = compound.child(child_index, context.shapes) {
                self.children
                    .push(dispatcher.find_algorithm(&child, other, context));
            }
        }
    }

    fn refresh_if_edited(
        &mut self,
        compound: &BodyView<'_>,
        other: &BodyView<'_>,
        dispatcher: &mut CollisionDispatcher,
        context: &DispatchContext<'_>,
    ) {
        let revision = compound
            .shape
            .as_compound()
            .map(|shape| shape.revision());
        if revision != Some(self.revision) {
            trace!(
                "Compound on {} was edited; rebuilding {} child strategies.",
                compound.body,
                self.children.len()
            );
            self.rebuild_children(compound, other, dispatcher, context);
        }
    }

    /// Processes every child whose bounds overlap the other shape and clears the manifolds of the rest.
    pub fn process_collision(
        &mut self,
        a: &BodyView<'_>,
        b: &BodyView<'_>,
        dispatcher: &mut CollisionDispatcher,
        context: &DispatchContext<'_>,
    ) {
        debug_assert_eq!(self.dispatcher_id, dispatcher.unique_id());
        let (compound, other) = if self.swapped { (b, a) } else { (a, b) };
        self.refresh_if_edited(compound, other, dispatcher, context);

        let other_bounds = other.bounds(context.shapes);
        for (child_index, algorithm) in self.children.iter_mut().enumerate() {
            let Some(child) = compound.child(child_index, context.shapes) else {
                continue;
            };
            if BoundingBox::intersects(child.bounds(context.shapes), other_bounds) {
                algorithm.process_collision(&child, other, dispatcher, context);
            } else {
                self.culled_manifolds.clear();
                algorithm.manifolds(&mut self.culled_manifolds);
                for &handle in &self.culled_manifolds {
                    dispatcher.clear_manifold(handle);
                }
            }
        }
    }

    /// Earliest time of impact over all children.
    pub fn calculate_time_of_impact(
        &mut self,
        a: &BodyView<'_>,
        b: &BodyView<'_>,
        dispatcher: &mut CollisionDispatcher,
        context: &DispatchContext<'_>,
    ) -> f32 {
        debug_assert_eq!(self.dispatcher_id, dispatcher.unique_id());
        let (compound, other) = if self.swapped { (b, a) } else { (a, b) };
        self.refresh_if_edited(compound, other, dispatcher, context);

        let mut hit_fraction = 1.0f32;
        for (child_index, algorithm) in self.children.iter_mut().enumerate() {
            if let Some(child) = compound.child(child_index, context.shapes) {
                let fraction = algorithm.calculate_time_of_impact(&child, other, dispatcher, context);
                hit_fraction = hit_fraction.min(fraction);
            }
        }
        hit_fraction
    }

    /// Appends every manifold owned by the child strategies.
    pub fn manifolds(&self, out: &mut Vec<ManifoldHandle>) {
        for child in &self.children {
            child.manifolds(out);
        }
    }

    pub(crate) fn release_resources(self, dispatcher: &mut CollisionDispatcher) {
        debug_assert_eq!(self.dispatcher_id, dispatcher.unique_id());
        for child in self.children {
            dispatcher.destroy_algorithm(child);
        }
    }
}
