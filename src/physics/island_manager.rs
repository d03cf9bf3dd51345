use log::debug;

use crate::physics::collision_body::{ActivationState, Bodies, CollisionBody};
use crate::physics::collision_detection::contact_manifold::PersistentManifold;
use crate::physics::collision_detection::dispatcher::CollisionDispatcher;
use crate::physics::handles::{BodyHandle, ManifoldHandle};
use crate::utilities::collections::union_find::UnionFind;

/// Receives the bodies and manifolds of one awake island.
pub trait IIslandCallback {
    /// Processes one island. `island_id` is the island's root body index, or -1 when islands are not split.
    fn process_island(
        &mut self,
        bodies: &[BodyHandle],
        manifolds: &[&PersistentManifold],
        island_id: i32,
    );
}

impl<F> IIslandCallback for F
where
    F: FnMut(&[BodyHandle], &[&PersistentManifold], i32),
{
    #[inline(always)]
    fn process_island(
        &mut self,
        bodies: &[BodyHandle],
        manifolds: &[&PersistentManifold],
        island_id: i32,
    ) {
        self(bodies, manifolds, island_id)
    }
}

/// Whether a body gets an island of its own. Bodies that opted out of merging still form singleton islands;
/// static, kinematic and response-less bodies belong to none.
#[inline(always)]
pub(crate) fn takes_island(body: &CollisionBody) -> bool {
    !body.is_static_or_kinematic() && body.has_contact_response()
}

/// Puts an island to sleep when no member is active or deactivation-disabled, and otherwise moves
/// island-sleeping members to `WantsDeactivation`. Returns whether the island sleeps.
pub(crate) fn apply_island_sleep_state(bodies: &mut Bodies, members: &[BodyHandle]) -> bool {
    let all_sleeping = members.iter().all(|&handle| {
        !matches!(
            bodies[handle].activation_state(),
            ActivationState::Active | ActivationState::DisableDeactivation
        )
    });
    for &handle in members {
        let body = &mut bodies[handle];
        if all_sleeping {
            body.set_activation_state(ActivationState::IslandSleeping);
        } else if body.activation_state() == ActivationState::IslandSleeping {
            body.set_activation_state(ActivationState::WantsDeactivation);
            body.deactivation_time = 0.0;
        }
    }
    all_sleeping
}

/// Island that owns a contact or link between `a` and `b`.
///
/// An awake side wins over an island-sleeping one, then a merging side over an opted-out one, then the
/// larger tag. Returns -1 when neither side belongs to an island.
pub(crate) fn owning_island(a: &CollisionBody, b: &CollisionBody) -> i32 {
    if a.island_tag < 0 || b.island_tag < 0 {
        return a.island_tag.max(b.island_tag);
    }
    let rank = |body: &CollisionBody| {
        (
            body.activation_state() != ActivationState::IslandSleeping,
            body.merges_simulation_islands(),
            body.island_tag,
        )
    };
    if rank(a) >= rank(b) {
        a.island_tag
    } else {
        b.island_tag
    }
}

/// Moves an island-sleeping body that opted out of merging to `WantsDeactivation` when its partner is an
/// awake island member. Returns the tag of the woken body's singleton island.
pub(crate) fn wake_opted_out_partner(a: &mut CollisionBody, b: &mut CollisionBody) -> Option<i32> {
    let awake_member = |body: &CollisionBody| {
        body.island_tag >= 0 && body.activation_state() != ActivationState::IslandSleeping
    };
    let sleeping_opted_out = |body: &CollisionBody| {
        body.island_tag >= 0
            && !body.merges_simulation_islands()
            && body.activation_state() == ActivationState::IslandSleeping
    };
    let sleeper = if awake_member(a) && sleeping_opted_out(b) {
        b
    } else if awake_member(b) && sleeping_opted_out(a) {
        a
    } else {
        return None;
    };
    sleeper.set_activation_state(ActivationState::WantsDeactivation);
    sleeper.deactivation_time = 0.0;
    Some(sleeper.island_tag)
}

/// Counts produced by one island build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IslandStats {
    /// Islands containing at least one merging body.
    pub islands: usize,
    /// Islands put to sleep this step.
    pub sleeping_islands: usize,
    /// Manifolds collected for awake islands.
    pub manifolds: usize,
    /// Callback invocations made by `process_islands`.
    pub processed_islands: usize,
}

/// Partitions bodies into islands through contact connectivity, puts fully resting islands to sleep
/// and hands awake islands to a callback.
///
/// A step runs `update_activation_state`, `store_island_activation_state` and then
/// `build_and_process_islands`.
#[derive(Debug, Clone)]
pub struct SimulationIslandManager {
    union_find: UnionFind,
    split_islands: bool,
    island_manifolds: Vec<(i32, ManifoldHandle)>,
    island_bodies: Vec<BodyHandle>,
    stats: IslandStats,
}

impl Default for SimulationIslandManager {
    fn default() -> Self {
        Self::new(true)
    }
}

impl SimulationIslandManager {
    /// Creates a manager. When `split_islands` is false every awake manifold goes to a single callback.
    pub fn new(split_islands: bool) -> Self {
        Self {
            union_find: UnionFind::new(),
            split_islands,
            island_manifolds: Vec::new(),
            island_bodies: Vec::new(),
            stats: IslandStats::default(),
        }
    }

    /// Whether islands are handed to the callback one by one.
    #[inline(always)]
    pub fn split_islands(&self) -> bool {
        self.split_islands
    }

    /// Chooses whether islands are handed to the callback one by one.
    #[inline(always)]
    pub fn set_split_islands(&mut self, split_islands: bool) {
        self.split_islands = split_islands;
    }

    /// Union-find state of the current step.
    #[inline(always)]
    pub fn union_find(&self) -> &UnionFind {
        &self.union_find
    }

    /// Counts from the last build.
    #[inline(always)]
    pub fn stats(&self) -> &IslandStats {
        &self.stats
    }

    /// Reinitializes the union-find with `n` singleton sets.
    pub fn init_union_find(&mut self, n: usize) {
        self.union_find.reset(n);
    }

    /// Unites the bodies of every manifold that needs response and joins islands on both sides.
    pub fn find_unions(&mut self, dispatcher: &CollisionDispatcher, bodies: &Bodies) {
        for index in 0..dispatcher.num_manifolds() {
            let manifold = dispatcher.manifold_by_index(index);
            let (Some(a), Some(b)) = (bodies.get(manifold.body_a()), bodies.get(manifold.body_b())) else {
                debug_assert!(false, "Manifold references a missing body.");
                continue;
            };
            if a.island_tag < 0 || b.island_tag < 0 {
                continue;
            }
            if dispatcher.needs_response(a, b)
                && a.merges_simulation_islands()
                && b.merges_simulation_islands()
            {
                self.union_find
                    .unite(a.island_tag as usize, b.island_tag as usize);
            }
        }
    }

    /// Gives every body its index as provisional tag, resets per-step scratch values and runs the union pass.
    pub fn update_activation_state(&mut self, bodies: &mut Bodies, dispatcher: &CollisionDispatcher) {
        for (handle, body) in bodies.iter_mut() {
            body.island_tag = handle.0 as i32;
            body.companion_id = -1;
            body.hit_fraction = 1.0;
        }
        self.init_union_find(bodies.len());
        self.find_unions(dispatcher, bodies);
    }

    /// Rewrites each body's tag to its island root, or -1 for bodies that belong to no island.
    pub fn store_island_activation_state(&mut self, bodies: &mut Bodies) {
        debug_assert_eq!(self.union_find.num_elements(), bodies.len());
        for (handle, body) in bodies.iter_mut() {
            body.island_tag = if takes_island(body) {
                self.union_find.find(handle.0) as i32
            } else {
                -1
            };
        }
    }

    /// Decides the sleep state of every island and collects the manifolds of awake ones.
    ///
    /// Islands with no active or deactivation-disabled member fall asleep. Members of awake islands that
    /// were island-sleeping become `WantsDeactivation`. Awake kinematic bodies wake their contact partners.
    pub fn build_islands(&mut self, dispatcher: &CollisionDispatcher, bodies: &mut Bodies) -> IslandStats {
        self.island_manifolds.clear();
        self.stats = IslandStats::default();
        self.union_find.sort_islands();

        let element_count = self.union_find.num_elements();
        let mut start = 0;
        while start < element_count {
            let island_id = self.union_find.element(start).id;
            let mut end = start + 1;
            while end < element_count && self.union_find.element(end).id == island_id {
                end += 1;
            }

            self.island_bodies.clear();
            for index in start..end {
                let handle = BodyHandle(self.union_find.element(index).sz);
                if bodies[handle].island_tag == island_id as i32 {
                    self.island_bodies.push(handle);
                }
            }
            if !self.island_bodies.is_empty() {
                self.stats.islands += 1;
                if apply_island_sleep_state(bodies, &self.island_bodies) {
                    self.stats.sleeping_islands += 1;
                }
            }
            start = end;
        }

        for index in 0..dispatcher.num_manifolds() {
            let handle = dispatcher.manifold_handle_by_index(index);
            let manifold = dispatcher.manifold_by_index(index);
            if manifold.body_a() == manifold.body_b() {
                continue;
            }
            let (body_a, body_b) = bodies.pair_mut(manifold.body_a(), manifold.body_b());
            let sleeping_a = body_a.activation_state() == ActivationState::IslandSleeping;
            let sleeping_b = body_b.activation_state() == ActivationState::IslandSleeping;
            if sleeping_a && sleeping_b {
                continue;
            }
            // Kinematic bodies never merge islands but still wake what they touch.
            if body_a.is_kinematic() && !sleeping_a && body_a.has_contact_response() {
                body_b.activate(false);
            }
            if body_b.is_kinematic() && !sleeping_b && body_b.has_contact_response() {
                body_a.activate(false);
            }
            if dispatcher.needs_response(body_a, body_b) {
                if wake_opted_out_partner(body_a, body_b).is_some() {
                    self.stats.sleeping_islands = self.stats.sleeping_islands.saturating_sub(1);
                }
                let island_id = owning_island(body_a, body_b);
                debug_assert!(island_id >= 0, "A responding manifold has no island.");
                if island_id >= 0 {
                    self.island_manifolds.push((island_id, handle));
                }
            }
        }
        self.island_manifolds.sort_by_key(|&(island_id, _)| island_id);
        self.stats.manifolds = self.island_manifolds.len();
        self.stats
    }

    /// Invokes `callback` for every awake island with at least one manifold. Requires a prior `build_islands`.
    /// Returns the number of invocations.
    pub fn process_islands<C: IIslandCallback + ?Sized>(
        &mut self,
        dispatcher: &CollisionDispatcher,
        bodies: &Bodies,
        callback: &mut C,
    ) -> usize {
        let mut island_manifolds: Vec<&PersistentManifold> = Vec::new();
        let mut processed = 0;

        if !self.split_islands {
            island_manifolds.extend(
                self.island_manifolds
                    .iter()
                    .filter_map(|&(_, handle)| dispatcher.manifold(handle)),
            );
            if !island_manifolds.is_empty() {
                self.island_bodies.clear();
                self.island_bodies.extend(
                    bodies
                        .iter()
                        .filter(|(_, body)| body.is_active())
                        .map(|(handle, _)| handle),
                );
                callback.process_island(&self.island_bodies, &island_manifolds, -1);
                processed += 1;
            }
            self.stats.processed_islands = processed;
            return processed;
        }

        let element_count = self.union_find.num_elements();
        let mut start = 0;
        let mut start_manifold = 0;
        while start < element_count {
            let island_id = self.union_find.element(start).id as i32;
            self.island_bodies.clear();
            let mut island_sleeping = true;
            let mut end = start;
            while end < element_count && self.union_find.element(end).id as i32 == island_id {
                let handle = BodyHandle(self.union_find.element(end).sz);
                let body = &bodies[handle];
                if body.island_tag == island_id {
                    self.island_bodies.push(handle);
                    if body.is_active() {
                        island_sleeping = false;
                    }
                }
                end += 1;
            }

            let mut end_manifold = start_manifold;
            while end_manifold < self.island_manifolds.len()
                && self.island_manifolds[end_manifold].0 == island_id
            {
                end_manifold += 1;
            }

            if !island_sleeping && end_manifold > start_manifold {
                island_manifolds.clear();
                island_manifolds.extend(
                    self.island_manifolds[start_manifold..end_manifold]
                        .iter()
                        .filter_map(|&(_, handle)| dispatcher.manifold(handle)),
                );
                callback.process_island(&self.island_bodies, &island_manifolds, island_id);
                processed += 1;
            }
            start_manifold = end_manifold;
            start = end;
        }
        debug_assert_eq!(
            start_manifold,
            self.island_manifolds.len(),
            "Every collected manifold must belong to an island."
        );
        self.stats.processed_islands = processed;
        processed
    }

    /// Builds islands, then processes the awake ones.
    pub fn build_and_process_islands<C: IIslandCallback + ?Sized>(
        &mut self,
        dispatcher: &CollisionDispatcher,
        bodies: &mut Bodies,
        callback: &mut C,
    ) -> IslandStats {
        self.build_islands(dispatcher, bodies);
        self.process_islands(dispatcher, bodies, callback);
        debug!(
            "Built {} islands ({} asleep), processed {} with {} manifolds.",
            self.stats.islands,
            self.stats.sleeping_islands,
            self.stats.processed_islands,
            self.stats.manifolds
        );
        self.stats
    }
}
