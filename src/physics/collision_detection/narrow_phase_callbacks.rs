use super::dispatcher::DispatcherInfo;
use super::manifold_result::ManifoldResult;
use crate::physics::body_properties::RigidPose;
use crate::physics::collidables::shape::{Shape, Shapes};
use crate::physics::collision_body::CollisionBody;
use crate::physics::handles::{BodyHandle, ShapeHandle};
use crate::utilities::bounding_box::BoundingBox;

/// Read-only view of one side of a pair as seen by a collision strategy.
///
/// Compound strategies hand their children a view whose shape and transforms are the child's,
/// so the underlying body is never modified during narrow phase work.
#[derive(Debug, Clone, Copy)]
pub struct BodyView<'a> {
    /// Body the view belongs to.
    pub body: BodyHandle,
    /// Handle of the viewed shape.
    pub shape_handle: ShapeHandle,
    /// Viewed shape.
    pub shape: &'a Shape,
    /// Pose of the viewed shape at the start of the step.
    pub world_transform: RigidPose,
    /// Predicted pose of the viewed shape at the end of the step.
    pub interpolation_world_transform: RigidPose,
    /// Motion below this length skips time of impact queries.
    pub ccd_motion_threshold: f32,
    /// Radius of the sphere swept by continuous queries.
    pub ccd_swept_sphere_radius: f32,
    /// Sub-shape part id, or -1 for the top level shape.
    pub part_id: i32,
    /// Child index within the parent compound, or -1 for the top level shape.
    pub index: i32,
}

impl<'a> BodyView<'a> {
    /// Creates a view of a body's top level shape.
    pub fn new(handle: BodyHandle, body: &CollisionBody, shapes: &'a Shapes) -> Self {
        Self {
            body: handle,
            shape_handle: body.shape,
            shape: &shapes[body.shape],
            world_transform: body.world_transform,
            interpolation_world_transform: body.interpolation_world_transform,
            ccd_motion_threshold: body.ccd_motion_threshold,
            ccd_swept_sphere_radius: body.ccd_swept_sphere_radius,
            part_id: -1,
            index: -1,
        }
    }

    /// Creates a view of a compound child. Both transforms are composed with the child's local pose.
    pub fn child(&self, child_index: usize, shapes: &'a Shapes) -> Option<Self> {
        let child = self.shape.as_compound()?.children().get(child_index)?;
        Some(Self {
            shape_handle: child.shape,
            shape: &shapes[child.shape],
            world_transform: child.world_pose(&self.world_transform),
            interpolation_world_transform: child.world_pose(&self.interpolation_world_transform),
            index: child_index as i32,
            ..*self
        })
    }

    /// World space bounds of the viewed shape at its current pose.
    pub fn bounds(&self, shapes: &Shapes) -> BoundingBox {
        shapes.compute_bounds(self.shape_handle, &self.world_transform)
    }

    /// Squared distance the view travels over the step.
    #[inline(always)]
    pub fn motion_squared(&self) -> f32 {
        (self.interpolation_world_transform.position - self.world_transform.position).length_squared()
    }

    /// Whether the view moves less than its continuous collision threshold.
    #[inline(always)]
    pub fn below_ccd_threshold(&self) -> bool {
        self.motion_squared() < self.ccd_motion_threshold * self.ccd_motion_threshold
    }
}

/// Geometric narrow phase queries the collision strategies delegate to.
///
/// Implementations report contacts through the supplied [`ManifoldResult`]; the strategies take
/// care of manifold ownership, refreshing and swapping.
pub trait INarrowPhaseTester {
    /// Generates contacts between two convex shapes.
    fn convex_convex(
        &self,
        a: &BodyView<'_>,
        b: &BodyView<'_>,
        info: &DispatcherInfo,
        result: &mut ManifoldResult<'_>,
    );

    /// Generates contacts between a convex shape and a concave surface.
    fn convex_concave(
        &self,
        convex: &BodyView<'_>,
        concave: &BodyView<'_>,
        info: &DispatcherInfo,
        result: &mut ManifoldResult<'_>,
    );

    /// Computes the fraction of the step at which two convex shapes first touch, or 1 if they never do.
    fn convex_convex_time_of_impact(
        &self,
        a: &BodyView<'_>,
        b: &BodyView<'_>,
        info: &DispatcherInfo,
    ) -> f32;

    /// Computes the fraction of the step at which a convex shape first touches a concave surface, or 1.
    fn convex_concave_time_of_impact(
        &self,
        convex: &BodyView<'_>,
        concave: &BodyView<'_>,
        info: &DispatcherInfo,
    ) -> f32;
}

/// Everything a strategy needs besides the dispatcher and the two views.
#[derive(Clone, Copy)]
pub struct DispatchContext<'a> {
    /// Shape registry used to resolve compound children.
    pub shapes: &'a Shapes,
    /// Narrow phase collaborator.
    pub tester: &'a dyn INarrowPhaseTester,
    /// Step parameters.
    pub info: &'a DispatcherInfo,
}
