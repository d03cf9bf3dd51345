use log::debug;

use crate::physics::collidables::collision_proxy::CollisionProxy;
use crate::physics::collidables::shape::Shapes;
use crate::physics::collision_body::Bodies;
use crate::physics::collision_detection::dispatcher::{
    CollisionDispatcher, DispatchFunc, DispatcherInfo,
};
use crate::physics::collision_detection::narrow_phase_callbacks::INarrowPhaseTester;
use crate::physics::collision_detection::pair_cache::OverlappingPairCache;
use crate::physics::configuration::CollisionConfiguration;
use crate::physics::error::CollisionError;
use crate::physics::handles::ProxyHandle;
use crate::physics::island_manager::{IIslandCallback, IslandStats, SimulationIslandManager};

/// Change reported by the broad phase since the previous step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BroadPhaseEvent {
    /// Two proxies started overlapping.
    OverlapBegin(CollisionProxy, CollisionProxy),
    /// Two proxies stopped overlapping.
    OverlapEnd(ProxyHandle, ProxyHandle),
    /// A proxy was destroyed.
    ProxyRemoved(ProxyHandle),
    /// A proxy's shape changed; its pairs stay but their strategies are rebuilt.
    ProxyChanged(ProxyHandle),
}

/// Summary of one pipeline step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepReport {
    /// Live pairs after applying events.
    pub pairs: usize,
    /// Pairs added this step.
    pub pairs_added: usize,
    /// Pairs removed this step.
    pub pairs_removed: usize,
    /// Live manifolds after dispatch.
    pub manifolds: usize,
    /// Island counts.
    pub islands: IslandStats,
    /// Earliest time of impact for continuous steps, 1 otherwise.
    pub time_of_impact: f32,
}

/// Owns the pair cache, a dispatcher and an island manager and runs them in step order.
#[derive(Debug)]
pub struct CollisionPipeline {
    pair_cache: OverlappingPairCache,
    dispatcher: CollisionDispatcher,
    island_manager: SimulationIslandManager,
    info: DispatcherInfo,
}

impl CollisionPipeline {
    /// Creates a pipeline whose dispatcher uses slot 0 of every pair.
    pub fn new(configuration: &CollisionConfiguration) -> Result<Self, CollisionError> {
        Ok(Self {
            pair_cache: OverlappingPairCache::new(configuration),
            dispatcher: CollisionDispatcher::new(0, configuration)?,
            island_manager: SimulationIslandManager::new(configuration.split_islands),
            info: DispatcherInfo::default(),
        })
    }

    /// Live pairs.
    #[inline(always)]
    pub fn pair_cache(&self) -> &OverlappingPairCache {
        &self.pair_cache
    }

    /// Dispatcher owning the strategies and manifolds.
    #[inline(always)]
    pub fn dispatcher(&self) -> &CollisionDispatcher {
        &self.dispatcher
    }

    /// Dispatcher, for registry overrides.
    #[inline(always)]
    pub fn dispatcher_mut(&mut self) -> &mut CollisionDispatcher {
        &mut self.dispatcher
    }

    /// Island manager.
    #[inline(always)]
    pub fn island_manager(&self) -> &SimulationIslandManager {
        &self.island_manager
    }

    /// Step parameters passed to strategies.
    #[inline(always)]
    pub fn info(&self) -> &DispatcherInfo {
        &self.info
    }

    /// Step parameters, for changing the time step or penetration allowance.
    #[inline(always)]
    pub fn info_mut(&mut self) -> &mut DispatcherInfo {
        &mut self.info
    }

    /// Applies broad phase events to the pair cache. Returns `(added, removed)`.
    pub fn apply_events(&mut self, events: &[BroadPhaseEvent], bodies: &Bodies) -> (usize, usize) {
        let mut added = 0;
        let mut removed = 0;
        let dispatchers: &mut [&mut CollisionDispatcher] = &mut [&mut self.dispatcher];
        for event in events {
            match event {
                BroadPhaseEvent::OverlapBegin(a, b) => {
                    let before = self.pair_cache.len();
                    self.pair_cache.add_overlapping_pair(a, b, bodies);
                    added += self.pair_cache.len() - before;
                }
                BroadPhaseEvent::OverlapEnd(a, b) => {
                    if self.pair_cache.remove_overlapping_pair(*a, *b, dispatchers) {
                        removed += 1;
                    }
                }
                BroadPhaseEvent::ProxyRemoved(proxy) => {
                    removed += self
                        .pair_cache
                        .remove_overlapping_pairs_containing_proxy(*proxy, dispatchers);
                }
                BroadPhaseEvent::ProxyChanged(proxy) => {
                    self.pair_cache.clean_proxy_from_pairs(*proxy, dispatchers);
                }
            }
        }
        (added, removed)
    }

    /// Runs one step: apply events, dispatch every pair in `mode`, build islands and hand awake islands
    /// to `callback`.
    pub fn step<C: IIslandCallback + ?Sized>(
        &mut self,
        events: &[BroadPhaseEvent],
        bodies: &mut Bodies,
        shapes: &Shapes,
        tester: &dyn INarrowPhaseTester,
        mode: DispatchFunc,
        callback: &mut C,
    ) -> StepReport {
        let (pairs_added, pairs_removed) = self.apply_events(events, bodies);

        self.info.dispatch_func = mode;
        let time_of_impact = self.dispatcher.dispatch_all_collision_pairs(
            &mut self.pair_cache,
            bodies,
            shapes,
            tester,
            &mut self.info,
        );
        self.info.step_count += 1;

        self.island_manager
            .update_activation_state(bodies, &self.dispatcher);
        self.island_manager.store_island_activation_state(bodies);
        let islands = self
            .island_manager
            .build_and_process_islands(&self.dispatcher, bodies, callback);

        let report = StepReport {
            pairs: self.pair_cache.len(),
            pairs_added,
            pairs_removed,
            manifolds: self.dispatcher.num_manifolds(),
            islands,
            time_of_impact,
        };
        debug!("Collision step {}: {:?}", self.info.step_count, report);
        report
    }

    /// Removes every pair and releases every strategy.
    pub fn clear(&mut self) {
        self.pair_cache.clear(&mut [&mut self.dispatcher]);
    }
}
