use super::body_properties::RigidPose;
use super::handles::{BodyHandle, ShapeHandle};
use std::ops::{Index, IndexMut};

/// Activation state of a collision body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ActivationState {
    /// Fully active; keeps its island awake.
    #[default]
    Active,
    /// Asleep because every member of its island was ready to sleep.
    IslandSleeping,
    /// Ready to sleep, but wakes with the rest of its island.
    WantsDeactivation,
    /// Never sleeps and keeps its island awake.
    DisableDeactivation,
    /// Excluded from simulation entirely.
    DisableSimulation,
}

impl ActivationState {
    /// States that `set_activation_state` refuses to leave.
    #[inline(always)]
    fn is_sticky(self) -> bool {
        matches!(
            self,
            ActivationState::DisableDeactivation | ActivationState::DisableSimulation
        )
    }
}

/// Bit flags describing how a body takes part in collision handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BodyFlags(pub u32);

impl BodyFlags {
    /// No flags.
    pub const NONE: Self = Self(0);
    /// Immovable body.
    pub const STATIC: Self = Self(1);
    /// Body moved by the user rather than by the solver.
    pub const KINEMATIC: Self = Self(1 << 1);
    /// Body generates contacts but no response.
    pub const NO_CONTACT_RESPONSE: Self = Self(1 << 2);
    /// Body never merges the islands it touches.
    pub const NO_ISLAND_MERGE: Self = Self(1 << 3);

    /// Tests whether every bit of `other` is set.
    #[inline(always)]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Tests whether any bit of `other` is set.
    #[inline(always)]
    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl std::ops::BitOr for BodyFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for BodyFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Per-body collision state read and written by the dispatcher and the island builder.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionBody {
    /// Shape used for narrow phase tests.
    pub shape: ShapeHandle,
    /// Pose at the start of the step.
    pub world_transform: RigidPose,
    /// Predicted pose at the end of the step, used for time of impact.
    pub interpolation_world_transform: RigidPose,
    /// Collision flags.
    pub flags: BodyFlags,
    activation_state: ActivationState,
    /// Time spent below the sleep thresholds, maintained by the integrator.
    pub deactivation_time: f32,
    /// Island id assigned during the last island build, or -1.
    pub island_tag: i32,
    /// Scratch id available to the solver collaborator, reset to -1 each build.
    pub companion_id: i32,
    /// Fraction of the step reached before the earliest impact, reset to 1 each build.
    pub hit_fraction: f32,
    /// Motion below this length skips time of impact queries.
    pub ccd_motion_threshold: f32,
    /// Radius of the sphere swept by continuous queries.
    pub ccd_swept_sphere_radius: f32,
}

impl CollisionBody {
    /// Creates a dynamic, active body at `pose`.
    pub fn new(shape: ShapeHandle, pose: RigidPose) -> Self {
        Self {
            shape,
            world_transform: pose,
            interpolation_world_transform: pose,
            flags: BodyFlags::NONE,
            activation_state: ActivationState::Active,
            deactivation_time: 0.0,
            island_tag: -1,
            companion_id: -1,
            hit_fraction: 1.0,
            ccd_motion_threshold: 0.0,
            ccd_swept_sphere_radius: 0.0,
        }
    }

    /// Creates a static body at `pose`.
    pub fn new_static(shape: ShapeHandle, pose: RigidPose) -> Self {
        Self::new(shape, pose).with_flags(BodyFlags::STATIC)
    }

    /// Returns the body with `flags` added.
    pub fn with_flags(mut self, flags: BodyFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Returns the body in `state`, bypassing the sticky-state rule.
    pub fn with_activation_state(mut self, state: ActivationState) -> Self {
        self.activation_state = state;
        self
    }

    /// Gets the current activation state.
    #[inline(always)]
    pub fn activation_state(&self) -> ActivationState {
        self.activation_state
    }

    /// Sets the activation state unless the body is in a sticky state.
    pub fn set_activation_state(&mut self, state: ActivationState) {
        if !self.activation_state.is_sticky() {
            self.activation_state = state;
        }
    }

    /// Sets the activation state unconditionally.
    pub fn force_activation_state(&mut self, state: ActivationState) {
        self.activation_state = state;
    }

    /// Wakes the body. Static and kinematic bodies are only woken when forced.
    pub fn activate(&mut self, force: bool) {
        if force || !self.is_static_or_kinematic() {
            self.set_activation_state(ActivationState::Active);
            self.deactivation_time = 0.0;
        }
    }

    /// False for island-sleeping and simulation-disabled bodies.
    #[inline(always)]
    pub fn is_active(&self) -> bool {
        !matches!(
            self.activation_state,
            ActivationState::IslandSleeping | ActivationState::DisableSimulation
        )
    }

    /// Whether the body is static.
    #[inline(always)]
    pub fn is_static(&self) -> bool {
        self.flags.contains(BodyFlags::STATIC)
    }

    /// Whether the body is kinematic.
    #[inline(always)]
    pub fn is_kinematic(&self) -> bool {
        self.flags.contains(BodyFlags::KINEMATIC)
    }

    /// Whether the body is static or kinematic.
    #[inline(always)]
    pub fn is_static_or_kinematic(&self) -> bool {
        self.flags
            .intersects(BodyFlags::STATIC | BodyFlags::KINEMATIC)
    }

    /// Whether contacts involving this body are handed to the solver.
    #[inline(always)]
    pub fn has_contact_response(&self) -> bool {
        !self.flags.contains(BodyFlags::NO_CONTACT_RESPONSE)
    }

    /// Whether contacts and constraints on this body join islands together.
    #[inline(always)]
    pub fn merges_simulation_islands(&self) -> bool {
        !self.flags.intersects(
            BodyFlags::STATIC
                | BodyFlags::KINEMATIC
                | BodyFlags::NO_CONTACT_RESPONSE
                | BodyFlags::NO_ISLAND_MERGE,
        )
    }
}

/// Dense storage of every collidable body. A handle is the body's index.
#[derive(Debug, Clone, Default)]
pub struct Bodies {
    bodies: Vec<CollisionBody>,
}

impl Bodies {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a body and returns its handle.
    pub fn add(&mut self, body: CollisionBody) -> BodyHandle {
        self.bodies.push(body);
        BodyHandle(self.bodies.len() - 1)
    }

    /// Number of bodies.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Whether there are no bodies.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Gets a body, if the handle is in range.
    #[inline(always)]
    pub fn get(&self, handle: BodyHandle) -> Option<&CollisionBody> {
        self.bodies.get(handle.0)
    }

    /// Gets a body mutably, if the handle is in range.
    #[inline(always)]
    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut CollisionBody> {
        self.bodies.get_mut(handle.0)
    }

    /// Iterates bodies in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &CollisionBody)> {
        self.bodies
            .iter()
            .enumerate()
            .map(|(index, body)| (BodyHandle(index), body))
    }

    /// Iterates bodies mutably in handle order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (BodyHandle, &mut CollisionBody)> {
        self.bodies
            .iter_mut()
            .enumerate()
            .map(|(index, body)| (BodyHandle(index), body))
    }

    /// Borrows two distinct bodies mutably.
    pub fn pair_mut(
        &mut self,
        a: BodyHandle,
        b: BodyHandle,
    ) -> (&mut CollisionBody, &mut CollisionBody) {
        assert_ne!(a, b, "Cannot borrow the same body twice.");
        if a.0 < b.0 {
            let (low, high) = self.bodies.split_at_mut(b.0);
            (&mut low[a.0], &mut high[0])
        } else {
            let (low, high) = self.bodies.split_at_mut(a.0);
            (&mut high[0], &mut low[b.0])
        }
    }
}

impl Index<BodyHandle> for Bodies {
    type Output = CollisionBody;

    fn index(&self, handle: BodyHandle) -> &CollisionBody {
        &self.bodies[handle.0]
    }
}

impl IndexMut<BodyHandle> for Bodies {
    fn index_mut(&mut self, handle: BodyHandle) -> &mut CollisionBody {
        &mut self.bodies[handle.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sticky_states_ignore_plain_sets() {
        let mut body = CollisionBody::new(ShapeHandle(0), RigidPose::IDENTITY);
        body.force_activation_state(ActivationState::DisableDeactivation);
        body.set_activation_state(ActivationState::IslandSleeping);
        assert_eq!(body.activation_state(), ActivationState::DisableDeactivation);
        body.force_activation_state(ActivationState::IslandSleeping);
        assert!(!body.is_active());
    }

    #[test]
    fn activate_leaves_static_bodies_alone_unless_forced() {
        let mut body = CollisionBody::new_static(ShapeHandle(0), RigidPose::IDENTITY)
            .with_activation_state(ActivationState::IslandSleeping);
        body.activate(false);
        assert_eq!(body.activation_state(), ActivationState::IslandSleeping);
        body.activate(true);
        assert_eq!(body.activation_state(), ActivationState::Active);
    }

    #[test]
    fn merge_rules_follow_flags() {
        let dynamic = CollisionBody::new(ShapeHandle(0), RigidPose::IDENTITY);
        assert!(dynamic.merges_simulation_islands());
        let opted_out = dynamic.clone().with_flags(BodyFlags::NO_ISLAND_MERGE);
        assert!(!opted_out.merges_simulation_islands());
        assert!(opted_out.has_contact_response());
        let ghost = dynamic.with_flags(BodyFlags::NO_CONTACT_RESPONSE);
        assert!(!ghost.has_contact_response());
        assert!(!ghost.merges_simulation_islands());
    }
}
