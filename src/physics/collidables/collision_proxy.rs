use crate::physics::handles::{BodyHandle, ProxyHandle};
use crate::utilities::bounding_box::BoundingBox;
use std::fmt;

/// Collision filter group bits. A pair is considered only if each proxy's group is in the other's mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollisionFilterGroups(pub u16);

impl CollisionFilterGroups {
    /// Group of ordinary bodies.
    pub const DEFAULT: Self = Self(1);
    /// Group of static bodies.
    pub const STATIC: Self = Self(1 << 1);
    /// Group of kinematic bodies.
    pub const KINEMATIC: Self = Self(1 << 2);
    /// Group of sensor-like bodies.
    pub const DEBRIS: Self = Self(1 << 3);
    /// Every group.
    pub const ALL: Self = Self(u16::MAX);
    /// Every group except static.
    pub const ALL_BUT_STATIC: Self = Self(u16::MAX ^ (1 << 1));
}

/// Lightweight broad-phase handle describing one body's current bounding volume.
///
/// Created and destroyed by the broad phase; the pair cache only copies what it needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionProxy {
    /// Identity of the proxy within the broad phase.
    pub handle: ProxyHandle,
    /// Body the proxy bounds.
    pub owner: BodyHandle,
    /// Current world space bounds.
    pub aabb: BoundingBox,
    /// Group bits of this proxy.
    pub collision_filter_group: CollisionFilterGroups,
    /// Groups this proxy accepts.
    pub collision_filter_mask: CollisionFilterGroups,
}

impl CollisionProxy {
    /// Creates a proxy in the default group that collides with everything.
    pub fn new(handle: ProxyHandle, owner: BodyHandle, aabb: BoundingBox) -> Self {
        Self {
            handle,
            owner,
            aabb,
            collision_filter_group: CollisionFilterGroups::DEFAULT,
            collision_filter_mask: CollisionFilterGroups::ALL,
        }
    }

    /// Creates a proxy for a static body: static group, never tested against other statics.
    pub fn new_static(handle: ProxyHandle, owner: BodyHandle, aabb: BoundingBox) -> Self {
        Self {
            collision_filter_group: CollisionFilterGroups::STATIC,
            collision_filter_mask: CollisionFilterGroups::ALL_BUT_STATIC,
            ..Self::new(handle, owner, aabb)
        }
    }

    /// Returns the proxy with a different group and mask.
    pub fn with_filter(
        mut self,
        group: CollisionFilterGroups,
        mask: CollisionFilterGroups,
    ) -> Self {
        self.collision_filter_group = group;
        self.collision_filter_mask = mask;
        self
    }
}

impl fmt::Display for CollisionProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.handle, self.owner)
    }
}

/// Group/mask test performed before any body state is consulted. Symmetric in its arguments.
#[inline(always)]
pub fn needs_broadphase_collision(a: &CollisionProxy, b: &CollisionProxy) -> bool {
    (a.collision_filter_group.0 & b.collision_filter_mask.0) != 0
        && (b.collision_filter_group.0 & a.collision_filter_mask.0) != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_proxies_filter_each_other() {
        let aabb = BoundingBox::default();
        let a = CollisionProxy::new_static(ProxyHandle(0), BodyHandle(0), aabb);
        let b = CollisionProxy::new_static(ProxyHandle(1), BodyHandle(1), aabb);
        let c = CollisionProxy::new(ProxyHandle(2), BodyHandle(2), aabb);
        assert!(!needs_broadphase_collision(&a, &b));
        assert!(needs_broadphase_collision(&a, &c));
        assert!(needs_broadphase_collision(&c, &a));
    }
}
