use glam::Vec3;

use crate::physics::body_properties::RigidPose;
use crate::physics::handles::BodyHandle;

/// Maximum number of contact points cached per manifold.
pub const MANIFOLD_CACHE_SIZE: usize = 4;

/// Information about a single cached contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactPoint {
    /// Contact location on body A in A's local space.
    pub local_point_a: Vec3,
    /// Contact location on body B in B's local space.
    pub local_point_b: Vec3,
    /// Contact location on body A in world space.
    pub position_world_on_a: Vec3,
    /// Contact location on body B in world space.
    pub position_world_on_b: Vec3,
    /// Surface normal on B, pointing from B towards A.
    pub normal_world_on_b: Vec3,
    /// Signed separation along the normal. Negative values represent penetration.
    pub distance: f32,
    /// Number of refreshes this point has survived.
    pub lifetime: u32,
    /// Impulse applied by the solver last step, kept for warm starting.
    pub applied_impulse: f32,
    /// Sub-shape part of body A, or -1.
    pub part_id_a: i32,
    /// Sub-shape part of body B, or -1.
    pub part_id_b: i32,
    /// Child or triangle index on body A, or -1.
    pub index_a: i32,
    /// Child or triangle index on body B, or -1.
    pub index_b: i32,
}

impl ContactPoint {
    /// Creates a fresh point from local anchors, normal and distance.
    pub fn new(local_point_a: Vec3, local_point_b: Vec3, normal_world_on_b: Vec3, distance: f32) -> Self {
        Self {
            local_point_a,
            local_point_b,
            position_world_on_a: Vec3::ZERO,
            position_world_on_b: Vec3::ZERO,
            normal_world_on_b,
            distance,
            lifetime: 0,
            applied_impulse: 0.0,
            part_id_a: -1,
            part_id_b: -1,
            index_a: -1,
            index_b: -1,
        }
    }
}

impl Default for ContactPoint {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::ZERO, Vec3::ZERO, 0.0)
    }
}

/// Contact-point cache for one ordered body pair, maintained across steps.
///
/// Manifolds are owned by the dispatcher that created them; strategies only hold handles.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistentManifold {
    body_a: BodyHandle,
    body_b: BodyHandle,
    points: [ContactPoint; MANIFOLD_CACHE_SIZE],
    count: usize,
    contact_breaking_threshold: f32,
    /// Position of this manifold in the dispatcher's live list.
    pub(crate) index_in_dispatcher: usize,
}

impl PersistentManifold {
    /// Creates an empty manifold for `(body_a, body_b)`.
    pub fn new(body_a: BodyHandle, body_b: BodyHandle, contact_breaking_threshold: f32) -> Self {
        debug_assert!(body_a != body_b, "A manifold needs two distinct bodies.");
        Self {
            body_a,
            body_b,
            points: [ContactPoint::default(); MANIFOLD_CACHE_SIZE],
            count: 0,
            contact_breaking_threshold,
            index_in_dispatcher: usize::MAX,
        }
    }

    /// First body of the manifold.
    #[inline(always)]
    pub fn body_a(&self) -> BodyHandle {
        self.body_a
    }

    /// Second body of the manifold.
    #[inline(always)]
    pub fn body_b(&self) -> BodyHandle {
        self.body_b
    }

    /// Number of cached points.
    #[inline(always)]
    pub fn num_contacts(&self) -> usize {
        self.count
    }

    /// Cached points.
    #[inline(always)]
    pub fn contacts(&self) -> &[ContactPoint] {
        &self.points[..self.count]
    }

    /// Gets a cached point.
    #[inline(always)]
    pub fn contact(&self, index: usize) -> &ContactPoint {
        debug_assert!(index < self.count, "Contact index out of bounds");
        &self.points[index]
    }

    /// Distance beyond which points are dropped.
    #[inline(always)]
    pub fn contact_breaking_threshold(&self) -> f32 {
        self.contact_breaking_threshold
    }

    /// Whether a separation is small enough to be cached.
    #[inline(always)]
    pub fn valid_contact_distance(&self, distance: f32) -> bool {
        distance <= self.contact_breaking_threshold
    }

    /// Drops every cached point.
    pub fn clear_manifold(&mut self) {
        self.count = 0;
    }

    /// Finds the cached point closest to `point` in A's local space, if one lies within the breaking threshold.
    pub fn get_cache_entry(&self, point: &ContactPoint) -> Option<usize> {
        let mut shortest = self.contact_breaking_threshold * self.contact_breaking_threshold;
        let mut nearest = None;
        for (index, cached) in self.contacts().iter().enumerate() {
            let distance_squared = (cached.local_point_a - point.local_point_a).length_squared();
            if distance_squared < shortest {
                shortest = distance_squared;
                nearest = Some(index);
            }
        }
        nearest
    }

    /// Adds a point and returns its slot. A full cache keeps the deepest point and picks the
    /// replacement that leaves the largest contact area.
    pub fn add_manifold_point(&mut self, point: ContactPoint) -> usize {
        debug_assert!(self.valid_contact_distance(point.distance));
        let index = if self.count == MANIFOLD_CACHE_SIZE {
            self.sort_cached_points(&point)
        } else {
            self.count += 1;
            self.count - 1
        };
        self.points[index] = point;
        index
    }

    /// Overwrites a cached point while keeping its lifetime and warm start impulse.
    pub fn replace_contact_point(&mut self, point: ContactPoint, index: usize) {
        debug_assert!(index < self.count);
        let lifetime = self.points[index].lifetime;
        let applied_impulse = self.points[index].applied_impulse;
        self.points[index] = ContactPoint {
            lifetime,
            applied_impulse,
            ..point
        };
    }

    /// Removes a point by moving the last point into its slot.
    pub fn remove_contact_point(&mut self, index: usize) {
        debug_assert!(index < self.count);
        let last = self.count - 1;
        self.points[index] = self.points[last];
        self.count = last;
    }

    /// Recomputes world positions and distances from the local anchors and drops points that
    /// separated or drifted past the breaking threshold.
    pub fn refresh_contact_points(&mut self, pose_a: &RigidPose, pose_b: &RigidPose) {
        for point in self.points[..self.count].iter_mut() {
            point.position_world_on_a = pose_a.transform_point(point.local_point_a);
            point.position_world_on_b = pose_b.transform_point(point.local_point_b);
            point.distance = (point.position_world_on_a - point.position_world_on_b)
                .dot(point.normal_world_on_b);
            point.lifetime += 1;
        }

        let threshold_squared = self.contact_breaking_threshold * self.contact_breaking_threshold;
        for index in (0..self.count).rev() {
            let point = self.points[index];
            if !self.valid_contact_distance(point.distance) {
                self.remove_contact_point(index);
                continue;
            }
            let projected = point.position_world_on_a - point.normal_world_on_b * point.distance;
            let drift = point.position_world_on_b - projected;
            if drift.length_squared() > threshold_squared {
                self.remove_contact_point(index);
            }
        }
    }

    fn sort_cached_points(&self, point: &ContactPoint) -> usize {
        let mut deepest_index = None;
        let mut deepest_distance = point.distance;
        for (index, cached) in self.points.iter().enumerate() {
            if cached.distance < deepest_distance {
                deepest_distance = cached.distance;
                deepest_index = Some(index);
            }
        }

        let mut best_index = 0;
        let mut best_area = f32::NEG_INFINITY;
        for candidate in 0..MANIFOLD_CACHE_SIZE {
            if Some(candidate) == deepest_index {
                continue;
            }
            let mut quad = self.points.map(|cached| cached.local_point_a);
            quad[candidate] = point.local_point_a;
            let area = area_4_points(&quad);
            if area > best_area {
                best_area = area;
                best_index = candidate;
            }
        }
        best_index
    }
}

fn area_4_points(p: &[Vec3; 4]) -> f32 {
    let a = (p[0] - p[1]).cross(p[2] - p[3]).length_squared();
    let b = (p[0] - p[2]).cross(p[1] - p[3]).length_squared();
    let c = (p[0] - p[3]).cross(p[1] - p[2]).length_squared();
    a.max(b).max(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point_at(local: Vec3, distance: f32) -> ContactPoint {
        ContactPoint::new(local, local, Vec3::Y, distance)
    }

    #[test]
    fn full_cache_keeps_deepest_point() {
        let mut manifold = PersistentManifold::new(BodyHandle(0), BodyHandle(1), 0.1);
        manifold.add_manifold_point(point_at(Vec3::new(-1.0, 0.0, -1.0), -0.5));
        manifold.add_manifold_point(point_at(Vec3::new(1.0, 0.0, -1.0), -0.01));
        manifold.add_manifold_point(point_at(Vec3::new(1.0, 0.0, 1.0), -0.01));
        manifold.add_manifold_point(point_at(Vec3::new(-1.0, 0.0, 1.0), -0.01));
        assert_eq!(manifold.num_contacts(), 4);
        let replaced = manifold.add_manifold_point(point_at(Vec3::new(0.0, 0.0, 0.0), -0.02));
        assert_ne!(replaced, 0);
        assert_eq!(manifold.num_contacts(), 4);
        assert_eq!(manifold.contact(0).distance, -0.5);
    }

    #[test]
    fn refresh_drops_separated_points() {
        let mut manifold = PersistentManifold::new(BodyHandle(0), BodyHandle(1), 0.1);
        manifold.add_manifold_point(ContactPoint::new(Vec3::ZERO, Vec3::ZERO, Vec3::Y, 0.0));
        manifold.refresh_contact_points(&RigidPose::IDENTITY, &RigidPose::IDENTITY);
        assert_eq!(manifold.num_contacts(), 1);
        assert_eq!(manifold.contact(0).lifetime, 1);
        // A moved away along the normal.
        manifold.refresh_contact_points(
            &RigidPose::from_position(Vec3::new(0.0, 1.0, 0.0)),
            &RigidPose::IDENTITY,
        );
        assert_eq!(manifold.num_contacts(), 0);
    }

    #[test]
    fn refresh_drops_tangential_drift() {
        let mut manifold = PersistentManifold::new(BodyHandle(0), BodyHandle(1), 0.1);
        manifold.add_manifold_point(ContactPoint::new(Vec3::ZERO, Vec3::ZERO, Vec3::Y, 0.0));
        manifold.refresh_contact_points(
            &RigidPose::from_position(Vec3::new(0.5, 0.0, 0.0)),
            &RigidPose::IDENTITY,
        );
        assert_eq!(manifold.num_contacts(), 0);
    }

    #[test]
    fn replace_keeps_warm_start_data() {
        let mut manifold = PersistentManifold::new(BodyHandle(0), BodyHandle(1), 0.1);
        let slot = manifold.add_manifold_point(point_at(Vec3::ZERO, 0.0));
        manifold.refresh_contact_points(&RigidPose::IDENTITY, &RigidPose::IDENTITY);
        let nearby = point_at(Vec3::new(0.01, 0.0, 0.0), -0.02);
        assert_eq!(manifold.get_cache_entry(&nearby), Some(slot));
        manifold.replace_contact_point(nearby, slot);
        assert_eq!(manifold.contact(slot).lifetime, 1);
        assert_eq!(manifold.contact(slot).distance, -0.02);
    }
}
