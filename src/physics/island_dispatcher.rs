use log::debug;

use crate::physics::collision_body::{ActivationState, Bodies};
use crate::physics::collision_detection::dispatcher::CollisionDispatcher;
use crate::physics::collision_detection::pair_cache::OverlappingPairCache;
use crate::physics::handles::{BodyHandle, ManifoldHandle};
use crate::physics::island_manager::{
    apply_island_sleep_state, owning_island, takes_island, wake_opted_out_partner,
};
use crate::utilities::collections::union_find::UnionFind;
use crate::utilities::thread_dispatcher::{IThreadDispatcher, JobCounter};

/// A joint or similar link between bodies. Enabled links join islands exactly like contacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstraintLink {
    /// First body.
    pub body_a: BodyHandle,
    /// Second body, or `None` for links anchored to the world.
    pub body_b: Option<BodyHandle>,
    /// Disabled links are ignored.
    pub enabled: bool,
}

impl ConstraintLink {
    /// Creates an enabled link between two bodies.
    pub fn new(body_a: BodyHandle, body_b: BodyHandle) -> Self {
        Self {
            body_a,
            body_b: Some(body_b),
            enabled: true,
        }
    }

    /// Creates an enabled link between a body and the world.
    pub fn to_world(body: BodyHandle) -> Self {
        Self {
            body_a: body,
            body_b: None,
            enabled: true,
        }
    }
}

/// Everything one island's simulation needs, gathered once per step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Island {
    /// Root body index identifying the island.
    pub id: i32,
    /// Member bodies, in handle order.
    pub controllers: Vec<BodyHandle>,
    /// Responding manifolds assigned to this island.
    pub manifolds: Vec<ManifoldHandle>,
    /// Indices into the pair cache of pairs touching this island.
    pub overlapping_pairs: Vec<usize>,
    /// Indices into the constraint list of enabled links in this island.
    pub constraints: Vec<usize>,
    /// Whether the island was put to sleep this step.
    pub sleeping: bool,
}

/// Per-island simulation entry point, invoked from worker threads.
pub trait IIslandSimulator: Sync {
    /// Runs narrow phase refresh, solving and integration for one island.
    fn simulate(&self, worker_index: usize, island: &Island);
}

impl<F> IIslandSimulator for F
where
    F: Fn(usize, &Island) + Sync,
{
    #[inline(always)]
    fn simulate(&self, worker_index: usize, island: &Island) {
        self(worker_index, island)
    }
}

/// Builds explicit islands that include constraints and pair indices, then hands awake ones to workers.
///
/// Islands share no body, manifold, pair or constraint once built, so they can be simulated in any order
/// on any number of threads.
#[derive(Debug, Clone, Default)]
pub struct IslandDispatcher {
    union_find: UnionFind,
    islands: Vec<Island>,
    island_index_by_root: Vec<Option<usize>>,
}

impl IslandDispatcher {
    /// Creates an empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Islands from the last build, ordered by smallest member handle.
    #[inline(always)]
    pub fn islands(&self) -> &[Island] {
        &self.islands
    }

    fn island_of(&self, tag: i32) -> Option<usize> {
        usize::try_from(tag)
            .ok()
            .and_then(|root| self.island_index_by_root.get(root).copied().flatten())
    }

    /// Partitions bodies through manifolds and enabled links, decides sleep states and buckets every
    /// manifold, pair and link into the island of its awake, merging side. Returns the number of islands.
    pub fn build(
        &mut self,
        bodies: &mut Bodies,
        dispatcher: &CollisionDispatcher,
        pair_cache: &OverlappingPairCache,
        constraints: &[ConstraintLink],
    ) -> usize {
        let body_count = bodies.len();
        self.islands.clear();
        self.island_index_by_root.clear();
        self.island_index_by_root.resize(body_count, None);
        self.union_find.reset(body_count);

        for index in 0..dispatcher.num_manifolds() {
            let manifold = dispatcher.manifold_by_index(index);
            let (a, b) = (&bodies[manifold.body_a()], &bodies[manifold.body_b()]);
            if dispatcher.needs_response(a, b)
                && a.merges_simulation_islands()
                && b.merges_simulation_islands()
            {
                self.union_find
                    .unite(manifold.body_a().0, manifold.body_b().0);
            }
        }
        for link in constraints.iter().filter(|link| link.enabled) {
            let Some(body_b) = link.body_b else {
                continue;
            };
            if bodies[link.body_a].merges_simulation_islands()
                && bodies[body_b].merges_simulation_islands()
            {
                self.union_find.unite(link.body_a.0, body_b.0);
            }
        }

        for index in 0..body_count {
            let handle = BodyHandle(index);
            if !takes_island(&bodies[handle]) {
                bodies[handle].island_tag = -1;
                continue;
            }
            let root = self.union_find.find(index);
            bodies[handle].island_tag = root as i32;
            let island_index = match self.island_index_by_root[root] {
                Some(island_index) => island_index,
                None => {
                    self.islands.push(Island {
                        id: root as i32,
                        ..Default::default()
                    });
                    self.island_index_by_root[root] = Some(self.islands.len() - 1);
                    self.islands.len() - 1
                }
            };
            self.islands[island_index].controllers.push(handle);
        }

        for island in self.islands.iter_mut() {
            island.sleeping = apply_island_sleep_state(bodies, &island.controllers);
        }

        for index in 0..dispatcher.num_manifolds() {
            let manifold = dispatcher.manifold_by_index(index);
            if manifold.body_a() == manifold.body_b() {
                continue;
            }
            let (a, b) = bodies.pair_mut(manifold.body_a(), manifold.body_b());
            if a.activation_state() == ActivationState::IslandSleeping
                && b.activation_state() == ActivationState::IslandSleeping
            {
                continue;
            }
            if !dispatcher.needs_response(a, b) {
                continue;
            }
            if let Some(woken) = wake_opted_out_partner(a, b).and_then(|tag| self.island_of(tag)) {
                self.islands[woken].sleeping = false;
            }
            if let Some(island_index) = self.island_of(owning_island(a, b)) {
                self.islands[island_index]
                    .manifolds
                    .push(dispatcher.manifold_handle_by_index(index));
            }
        }

        for (pair_index, pair) in pair_cache.pairs().iter().enumerate() {
            let tag = owning_island(&bodies[pair.body_a()], &bodies[pair.body_b()]);
            if let Some(island_index) = self.island_of(tag) {
                self.islands[island_index].overlapping_pairs.push(pair_index);
            }
        }

        for (constraint_index, link) in constraints.iter().enumerate() {
            if !link.enabled {
                continue;
            }
            let body_a = &bodies[link.body_a];
            let tag = link
                .body_b
                .map_or(body_a.island_tag, |body_b| owning_island(body_a, &bodies[body_b]));
            if let Some(island_index) = self.island_of(tag) {
                self.islands[island_index].constraints.push(constraint_index);
            }
        }

        debug!(
            "Island dispatcher built {} islands ({} asleep).",
            self.islands.len(),
            self.islands.iter().filter(|island| island.sleeping).count()
        );
        self.islands.len()
    }

    /// Runs `simulator` once for every awake island with at least one controller. Workers pull islands
    /// from a shared counter. Returns the number of islands simulated.
    pub fn dispatch_islands<S, D>(&self, simulator: &S, thread_dispatcher: &D) -> usize
    where
        S: IIslandSimulator + ?Sized,
        D: IThreadDispatcher + ?Sized,
    {
        let awake: Vec<&Island> = self
            .islands
            .iter()
            .filter(|island| !island.sleeping && !island.controllers.is_empty())
            .collect();
        if awake.is_empty() {
            return 0;
        }
        let counter = JobCounter::new(awake.len());
        let worker_body = |worker_index: usize| {
            while let Some(job) = counter.claim() {
                simulator.simulate(worker_index, awake[job]);
            }
        };
        thread_dispatcher.dispatch_workers(&worker_body, awake.len());
        awake.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::body_properties::RigidPose;
    use crate::physics::collision_body::{BodyFlags, CollisionBody};
    use crate::physics::configuration::CollisionConfiguration;
    use crate::physics::handles::ShapeHandle;
    use crate::utilities::thread_dispatcher::SequentialThreadDispatcher;
    use std::sync::Mutex;

    #[test]
    fn constraints_join_islands() {
        let mut bodies = Bodies::new();
        let handles: Vec<_> = (0..4)
            .map(|_| bodies.add(CollisionBody::new(ShapeHandle(0), RigidPose::IDENTITY)))
            .collect();
        let mut dispatcher =
            CollisionDispatcher::new(0, &CollisionConfiguration::default()).expect("valid configuration");
        dispatcher.get_new_manifold(handles[0], handles[1]);
        let constraints = vec![
            ConstraintLink::new(handles[1], handles[2]),
            ConstraintLink {
                enabled: false,
                ..ConstraintLink::new(handles[2], handles[3])
            },
            ConstraintLink::to_world(handles[3]),
        ];

        let mut island_dispatcher = IslandDispatcher::new();
        let count = island_dispatcher.build(
            &mut bodies,
            &dispatcher,
            &OverlappingPairCache::default(),
            &constraints,
        );
        assert_eq!(count, 2);
        let islands = island_dispatcher.islands();
        assert_eq!(islands[0].controllers, handles[..3].to_vec());
        assert_eq!(islands[0].manifolds.len(), 1);
        assert_eq!(islands[0].constraints, vec![0]);
        assert_eq!(islands[1].controllers, vec![handles[3]]);
        assert_eq!(islands[1].constraints, vec![2]);

        let seen = Mutex::new(Vec::new());
        let simulated = island_dispatcher.dispatch_islands(
            &|_worker: usize, island: &Island| {
                if let Ok(mut seen) = seen.lock() {
                    seen.push(island.id);
                }
            },
            &SequentialThreadDispatcher,
        );
        assert_eq!(simulated, 2);
        assert_eq!(seen.into_inner().expect("not poisoned").len(), 2);
    }

    #[test]
    fn opted_out_partners_leave_work_with_the_awake_island() {
        let mut bodies = Bodies::new();
        let pusher = bodies.add(CollisionBody::new(ShapeHandle(0), RigidPose::IDENTITY));
        let opted_out = bodies.add(
            CollisionBody::new(ShapeHandle(0), RigidPose::IDENTITY)
                .with_flags(BodyFlags::NO_ISLAND_MERGE)
                .with_activation_state(ActivationState::WantsDeactivation),
        );
        let mut dispatcher =
            CollisionDispatcher::new(0, &CollisionConfiguration::default()).expect("valid configuration");
        let manifold = dispatcher.get_new_manifold(pusher, opted_out);

        let mut island_dispatcher = IslandDispatcher::new();
        let count = island_dispatcher.build(
            &mut bodies,
            &dispatcher,
            &OverlappingPairCache::default(),
            &[ConstraintLink::new(opted_out, pusher)],
        );
        assert_eq!(count, 2);
        let islands = island_dispatcher.islands();
        assert_eq!(islands[0].controllers, vec![pusher]);
        assert_eq!(islands[0].manifolds, vec![manifold]);
        assert_eq!(islands[0].constraints, vec![0]);
        assert!(islands[1].manifolds.is_empty());
        assert!(!islands[1].sleeping);
        assert_eq!(bodies[opted_out].activation_state(), ActivationState::WantsDeactivation);
    }

    #[test]
    fn sleeping_islands_are_not_simulated() {
        let mut bodies = Bodies::new();
        let resting = bodies.add(
            CollisionBody::new(ShapeHandle(0), RigidPose::IDENTITY)
                .with_activation_state(ActivationState::WantsDeactivation),
        );
        let dispatcher =
            CollisionDispatcher::new(0, &CollisionConfiguration::default()).expect("valid configuration");
        let mut island_dispatcher = IslandDispatcher::new();
        island_dispatcher.build(&mut bodies, &dispatcher, &OverlappingPairCache::default(), &[]);
        assert!(island_dispatcher.islands()[0].sleeping);
        assert_eq!(bodies[resting].activation_state(), ActivationState::IslandSleeping);
        let simulated = island_dispatcher
            .dispatch_islands(&|_: usize, _: &Island| panic!("asleep"), &SequentialThreadDispatcher);
        assert_eq!(simulated, 0);
    }
}
