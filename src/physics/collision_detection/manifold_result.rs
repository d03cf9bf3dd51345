use glam::Vec3;

use super::contact_manifold::{ContactPoint, PersistentManifold};
use super::narrow_phase_callbacks::BodyView;
use crate::physics::body_properties::RigidPose;
use crate::physics::handles::BodyHandle;

/// Short-lived sink connecting one narrow phase query to the manifold it fills.
///
/// A fresh result is built for every pair processed. It records which side of the query maps to
/// which body of the manifold, so testers always report in query order.
pub struct ManifoldResult<'a> {
    manifold: &'a mut PersistentManifold,
    body_a: BodyHandle,
    transform_a: RigidPose,
    transform_b: RigidPose,
    part_id_a: i32,
    index_a: i32,
    part_id_b: i32,
    index_b: i32,
}

impl<'a> ManifoldResult<'a> {
    /// Creates a result for the query `(a, b)` writing into `manifold`.
    pub fn new(manifold: &'a mut PersistentManifold, a: &BodyView<'_>, b: &BodyView<'_>) -> Self {
        debug_assert!(
            (manifold.body_a() == a.body && manifold.body_b() == b.body)
                || (manifold.body_a() == b.body && manifold.body_b() == a.body),
            "Manifold does not belong to the queried bodies."
        );
        Self {
            manifold,
            body_a: a.body,
            transform_a: a.world_transform,
            transform_b: b.world_transform,
            part_id_a: a.part_id,
            index_a: a.index,
            part_id_b: b.part_id,
            index_b: b.index,
        }
    }

    /// Whether the query's A side is the manifold's B body.
    #[inline(always)]
    pub fn is_swapped(&self) -> bool {
        self.manifold.body_a() != self.body_a
    }

    /// Manifold being filled.
    #[inline(always)]
    pub fn manifold(&self) -> &PersistentManifold {
        self.manifold
    }

    /// Reports a contact. `normal_on_b` points from the query's B towards its A, `point_on_b` lies on B,
    /// and `depth` is the signed separation. Points beyond the breaking threshold are ignored.
    pub fn add_contact_point(&mut self, normal_on_b: Vec3, point_on_b: Vec3, depth: f32) {
        if !self.manifold.valid_contact_distance(depth) {
            return;
        }
        let point_on_a = point_on_b + normal_on_b * depth;

        let mut point = if self.is_swapped() {
            let mut point = ContactPoint::new(
                self.transform_b.inverse_transform_point(point_on_b),
                self.transform_a.inverse_transform_point(point_on_a),
                -normal_on_b,
                depth,
            );
            point.position_world_on_a = point_on_b;
            point.position_world_on_b = point_on_a;
            point.part_id_a = self.part_id_b;
            point.index_a = self.index_b;
            point.part_id_b = self.part_id_a;
            point.index_b = self.index_a;
            point
        } else {
            let mut point = ContactPoint::new(
                self.transform_a.inverse_transform_point(point_on_a),
                self.transform_b.inverse_transform_point(point_on_b),
                normal_on_b,
                depth,
            );
            point.position_world_on_a = point_on_a;
            point.position_world_on_b = point_on_b;
            point.part_id_a = self.part_id_a;
            point.index_a = self.index_a;
            point.part_id_b = self.part_id_b;
            point.index_b = self.index_b;
            point
        };

        match self.manifold.get_cache_entry(&point) {
            Some(index) => self.manifold.replace_contact_point(point, index),
            None => {
                point.lifetime = 0;
                self.manifold.add_manifold_point(point);
            }
        }
    }

    /// Refreshes the manifold against the query's transforms in the manifold's body order.
    pub fn refresh_contact_points(&mut self) {
        if self.manifold.num_contacts() == 0 {
            return;
        }
        if self.is_swapped() {
            self.manifold
                .refresh_contact_points(&self.transform_b, &self.transform_a);
        } else {
            self.manifold
                .refresh_contact_points(&self.transform_a, &self.transform_b);
        }
    }
}
