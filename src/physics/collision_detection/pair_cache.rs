use log::warn;
use std::fmt;

use super::collision_algorithms::CollisionAlgorithm;
use super::dispatcher::{needs_collision, CollisionDispatcher, MAX_DISPATCHERS};
use crate::physics::collidables::collision_proxy::{needs_broadphase_collision, CollisionProxy};
use crate::physics::collision_body::Bodies;
use crate::physics::configuration::CollisionConfiguration;
use crate::physics::error::CollisionError;
use crate::physics::handles::{BodyHandle, ProxyHandle};

/// Unordered pair of overlapping proxies plus one strategy slot per dispatcher id.
///
/// Proxies are stored sorted by handle so that `(a, b)` and `(b, a)` produce the same pair.
#[derive(Debug)]
pub struct OverlappingPair {
    proxy_a: ProxyHandle,
    proxy_b: ProxyHandle,
    body_a: BodyHandle,
    body_b: BodyHandle,
    algorithms: [Option<CollisionAlgorithm>; MAX_DISPATCHERS],
}

impl OverlappingPair {
    fn new(a: &CollisionProxy, b: &CollisionProxy) -> Self {
        let (a, b) = if a.handle <= b.handle { (a, b) } else { (b, a) };
        Self {
            proxy_a: a.handle,
            proxy_b: b.handle,
            body_a: a.owner,
            body_b: b.owner,
            algorithms: Default::default(),
        }
    }

    /// Lower proxy handle of the pair.
    #[inline(always)]
    pub fn proxy_a(&self) -> ProxyHandle {
        self.proxy_a
    }

    /// Higher proxy handle of the pair.
    #[inline(always)]
    pub fn proxy_b(&self) -> ProxyHandle {
        self.proxy_b
    }

    /// Body owning `proxy_a`.
    #[inline(always)]
    pub fn body_a(&self) -> BodyHandle {
        self.body_a
    }

    /// Body owning `proxy_b`.
    #[inline(always)]
    pub fn body_b(&self) -> BodyHandle {
        self.body_b
    }

    /// Whether either side of the pair is `proxy`.
    #[inline(always)]
    pub fn contains_proxy(&self, proxy: ProxyHandle) -> bool {
        self.proxy_a == proxy || self.proxy_b == proxy
    }

    /// Whether the pair is `{a, b}` in either order.
    #[inline(always)]
    pub fn matches(&self, a: ProxyHandle, b: ProxyHandle) -> bool {
        (self.proxy_a == a && self.proxy_b == b) || (self.proxy_a == b && self.proxy_b == a)
    }

    /// Strategy held for a dispatcher id.
    #[inline(always)]
    pub fn algorithm(&self, dispatcher_id: usize) -> Option<&CollisionAlgorithm> {
        self.algorithms.get(dispatcher_id).and_then(Option::as_ref)
    }

    /// Number of occupied strategy slots.
    pub fn algorithm_count(&self) -> usize {
        self.algorithms.iter().filter(|slot| slot.is_some()).count()
    }

    #[inline(always)]
    pub(crate) fn algorithm_slot_mut(&mut self, dispatcher_id: usize) -> &mut Option<CollisionAlgorithm> {
        &mut self.algorithms[dispatcher_id]
    }

    fn destroy_algorithms(&mut self, dispatchers: &mut [&mut CollisionDispatcher]) -> usize {
        let mut destroyed = 0;
        for (dispatcher_id, slot) in self.algorithms.iter_mut().enumerate() {
            let Some(algorithm) = slot.take() else {
                continue;
            };
            match dispatchers
                .iter_mut()
                .find(|dispatcher| dispatcher.unique_id() == dispatcher_id)
            {
                Some(dispatcher) => {
                    dispatcher.destroy_algorithm(algorithm);
                    destroyed += 1;
                }
                None => warn!(
                    "Pair <{}, {}> held a strategy for dispatcher {} which was not supplied; its manifolds leak.",
                    self.proxy_a, self.proxy_b, dispatcher_id
                ),
            }
        }
        destroyed
    }
}

impl fmt::Display for OverlappingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}, {}>", self.proxy_a, self.proxy_b)
    }
}

/// Dense set of currently overlapping proxy pairs.
///
/// Removal moves the last pair into the freed position, so indices held across a removal may
/// refer to a different pair afterwards.
#[derive(Debug)]
pub struct OverlappingPairCache {
    pairs: Vec<OverlappingPair>,
    capacity: Option<usize>,
}

impl Default for OverlappingPairCache {
    fn default() -> Self {
        Self::new(&CollisionConfiguration::default())
    }
}

impl OverlappingPairCache {
    /// Creates an empty cache sized by the configuration.
    pub fn new(configuration: &CollisionConfiguration) -> Self {
        let initial = match configuration.pair_capacity {
            Some(capacity) => capacity.min(configuration.initial_pair_capacity),
            None => configuration.initial_pair_capacity,
        };
        Self {
            pairs: Vec::with_capacity(initial),
            capacity: configuration.pair_capacity,
        }
    }

    /// Number of live pairs.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether there are no live pairs.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Upper bound on live pairs, if any.
    #[inline(always)]
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Live pairs.
    #[inline(always)]
    pub fn pairs(&self) -> &[OverlappingPair] {
        &self.pairs
    }

    #[inline(always)]
    pub(crate) fn pairs_mut(&mut self) -> &mut [OverlappingPair] {
        &mut self.pairs
    }

    /// Gets a pair by index.
    #[inline(always)]
    pub fn pair(&self, index: usize) -> Option<&OverlappingPair> {
        self.pairs.get(index)
    }

    /// Gets a pair by index mutably.
    #[inline(always)]
    pub fn pair_mut(&mut self, index: usize) -> Option<&mut OverlappingPair> {
        self.pairs.get_mut(index)
    }

    /// Finds the index of the pair `{a, b}`. Linear in the number of pairs.
    pub fn find_pair(&self, a: ProxyHandle, b: ProxyHandle) -> Option<usize> {
        self.pairs.iter().position(|pair| pair.matches(a, b))
    }

    /// Adds the pair `{a, b}` unless it is filtered out, returning its index.
    ///
    /// Filtered pairs and proxies owned by the same body return `None`. An existing pair is returned as
    /// is. A full bounded cache drops the pair with a warning; use
    /// [`try_add_overlapping_pair`](Self::try_add_overlapping_pair) to observe that.
    pub fn add_overlapping_pair(
        &mut self,
        a: &CollisionProxy,
        b: &CollisionProxy,
        bodies: &Bodies,
    ) -> Option<usize> {
        match self.try_add_overlapping_pair(a, b, bodies) {
            Ok(index) => index,
            Err(error) => {
                warn!("Dropped overlap between {} and {}: {}.", a, b, error);
                None
            }
        }
    }

    /// Like [`add_overlapping_pair`](Self::add_overlapping_pair), but reports a full cache as an error.
    pub fn try_add_overlapping_pair(
        &mut self,
        a: &CollisionProxy,
        b: &CollisionProxy,
        bodies: &Bodies,
    ) -> Result<Option<usize>, CollisionError> {
        debug_assert_ne!(a.handle, b.handle, "A proxy cannot overlap itself.");
        if a.handle == b.handle || a.owner == b.owner || !needs_broadphase_collision(a, b) {
            return Ok(None);
        }
        let (Some(body_a), Some(body_b)) = (bodies.get(a.owner), bodies.get(b.owner)) else {
            debug_assert!(false, "Proxies {} and {} reference a missing body.", a, b);
            return Ok(None);
        };
        if !needs_collision(body_a, body_b) {
            return Ok(None);
        }
        self.add_overlapping_pair_unfiltered(a, b)
    }

    /// Adds the pair `{a, b}` without consulting any filter. Duplicates and proxies of the same body are
    /// still rejected.
    pub fn add_overlapping_pair_unfiltered(
        &mut self,
        a: &CollisionProxy,
        b: &CollisionProxy,
    ) -> Result<Option<usize>, CollisionError> {
        debug_assert_ne!(a.handle, b.handle, "A proxy cannot overlap itself.");
        if a.handle == b.handle || a.owner == b.owner {
            return Ok(None);
        }
        if let Some(index) = self.find_pair(a.handle, b.handle) {
            return Ok(Some(index));
        }
        if let Some(capacity) = self.capacity {
            if self.pairs.len() >= capacity {
                return Err(CollisionError::PairCacheFull { capacity });
            }
        }
        self.pairs.push(OverlappingPair::new(a, b));
        Ok(Some(self.pairs.len() - 1))
    }

    /// Destroys the strategies of the pair at `index` and removes it. The last pair moves into `index`.
    pub fn remove_pair_at(
        &mut self,
        index: usize,
        dispatchers: &mut [&mut CollisionDispatcher],
    ) -> OverlappingPair {
        let mut pair = self.pairs.swap_remove(index);
        pair.destroy_algorithms(dispatchers);
        pair
    }

    /// Removes the pair `{a, b}` if present.
    pub fn remove_overlapping_pair(
        &mut self,
        a: ProxyHandle,
        b: ProxyHandle,
        dispatchers: &mut [&mut CollisionDispatcher],
    ) -> bool {
        match self.find_pair(a, b) {
            Some(index) => {
                self.remove_pair_at(index, dispatchers);
                true
            }
            None => false,
        }
    }

    /// Destroys the strategies of the pair at `index` but keeps the pair. Returns how many were destroyed.
    pub fn clean_overlapping_pair(
        &mut self,
        index: usize,
        dispatchers: &mut [&mut CollisionDispatcher],
    ) -> usize {
        match self.pairs.get_mut(index) {
            Some(pair) => pair.destroy_algorithms(dispatchers),
            None => 0,
        }
    }

    /// Destroys the strategies of every pair touching `proxy`, keeping the pairs.
    pub fn clean_proxy_from_pairs(
        &mut self,
        proxy: ProxyHandle,
        dispatchers: &mut [&mut CollisionDispatcher],
    ) -> usize {
        self.pairs
            .iter_mut()
            .filter(|pair| pair.contains_proxy(proxy))
            .map(|pair| pair.destroy_algorithms(dispatchers))
            .sum()
    }

    /// Removes every pair touching `proxy`. Returns the number of pairs removed.
    pub fn remove_overlapping_pairs_containing_proxy(
        &mut self,
        proxy: ProxyHandle,
        dispatchers: &mut [&mut CollisionDispatcher],
    ) -> usize {
        self.process_all_overlapping_pairs(|pair| pair.contains_proxy(proxy), dispatchers)
    }

    /// Visits pairs back to front and removes every pair for which `should_remove` returns true.
    /// Returns the number of pairs removed.
    pub fn process_all_overlapping_pairs<F>(
        &mut self,
        mut should_remove: F,
        dispatchers: &mut [&mut CollisionDispatcher],
    ) -> usize
    where
        F: FnMut(&OverlappingPair) -> bool,
    {
        let mut removed = 0;
        for index in (0..self.pairs.len()).rev() {
            if should_remove(&self.pairs[index]) {
                self.remove_pair_at(index, dispatchers);
                removed += 1;
            }
        }
        removed
    }

    /// Destroys every strategy and removes every pair.
    pub fn clear(&mut self, dispatchers: &mut [&mut CollisionDispatcher]) {
        for mut pair in self.pairs.drain(..) {
            pair.destroy_algorithms(dispatchers);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::body_properties::RigidPose;
    use crate::physics::collision_body::CollisionBody;
    use crate::physics::handles::ShapeHandle;
    use crate::utilities::bounding_box::BoundingBox;

    fn world(count: usize) -> (Bodies, Vec<CollisionProxy>) {
        let mut bodies = Bodies::new();
        let proxies = (0..count)
            .map(|index| {
                let owner = bodies.add(CollisionBody::new(ShapeHandle(0), RigidPose::IDENTITY));
                CollisionProxy::new(ProxyHandle(index as u32), owner, BoundingBox::default())
            })
            .collect();
        (bodies, proxies)
    }

    #[test]
    fn pairs_are_unordered_and_unique() {
        let (bodies, proxies) = world(3);
        let mut cache = OverlappingPairCache::default();
        let first = cache.add_overlapping_pair(&proxies[2], &proxies[0], &bodies);
        let again = cache.add_overlapping_pair(&proxies[0], &proxies[2], &bodies);
        assert_eq!(first, Some(0));
        assert_eq!(again, Some(0));
        assert_eq!(cache.len(), 1);
        let pair = cache.pair(0).expect("pair exists");
        assert_eq!(pair.proxy_a(), ProxyHandle(0));
        assert_eq!(pair.body_b(), proxies[2].owner);
        assert_eq!(cache.find_pair(ProxyHandle(2), ProxyHandle(0)), Some(0));
        assert_eq!(cache.find_pair(ProxyHandle(1), ProxyHandle(0)), None);
    }

    #[test]
    fn proxies_of_one_body_never_pair() {
        let (bodies, proxies) = world(2);
        let second_proxy = CollisionProxy::new(ProxyHandle(99), proxies[0].owner, BoundingBox::default());
        let mut cache = OverlappingPairCache::default();
        assert_eq!(cache.try_add_overlapping_pair(&proxies[0], &second_proxy, &bodies), Ok(None));
        assert_eq!(cache.add_overlapping_pair_unfiltered(&second_proxy, &proxies[0]), Ok(None));
        assert!(cache.is_empty());
        assert_eq!(cache.add_overlapping_pair(&second_proxy, &proxies[1], &bodies), Some(0));
    }

    #[test]
    fn removal_moves_last_pair() {
        let (bodies, proxies) = world(4);
        let mut dispatcher =
            CollisionDispatcher::new(0, &CollisionConfiguration::default()).expect("valid configuration");
        let mut cache = OverlappingPairCache::default();
        cache.add_overlapping_pair(&proxies[0], &proxies[1], &bodies);
        cache.add_overlapping_pair(&proxies[1], &proxies[2], &bodies);
        cache.add_overlapping_pair(&proxies[2], &proxies[3], &bodies);
        assert!(cache.remove_overlapping_pair(ProxyHandle(1), ProxyHandle(0), &mut [&mut dispatcher]));
        assert_eq!(cache.len(), 2);
        assert!(cache.pair(0).expect("moved pair").matches(ProxyHandle(2), ProxyHandle(3)));
        assert!(!cache.remove_overlapping_pair(ProxyHandle(1), ProxyHandle(0), &mut [&mut dispatcher]));
    }

    #[test]
    fn removing_a_proxy_removes_all_of_its_pairs() {
        let (bodies, proxies) = world(4);
        let mut cache = OverlappingPairCache::default();
        for other in 1..4 {
            cache.add_overlapping_pair(&proxies[0], &proxies[other], &bodies);
        }
        cache.add_overlapping_pair(&proxies[2], &proxies[3], &bodies);
        let removed = cache.remove_overlapping_pairs_containing_proxy(ProxyHandle(0), &mut []);
        assert_eq!(removed, 3);
        assert_eq!(cache.len(), 1);
        assert!(cache.pair(0).expect("survivor").matches(ProxyHandle(3), ProxyHandle(2)));
    }

    #[test]
    fn bounded_cache_rejects_overflow() {
        let (bodies, proxies) = world(3);
        let configuration = CollisionConfiguration::default().with_pair_capacity(1);
        let mut cache = OverlappingPairCache::new(&configuration);
        assert_eq!(
            cache.try_add_overlapping_pair(&proxies[0], &proxies[1], &bodies),
            Ok(Some(0))
        );
        assert_eq!(
            cache.try_add_overlapping_pair(&proxies[1], &proxies[2], &bodies),
            Err(CollisionError::PairCacheFull { capacity: 1 })
        );
        // Re-adding an existing pair never needs room.
        assert_eq!(
            cache.try_add_overlapping_pair(&proxies[1], &proxies[0], &bodies),
            Ok(Some(0))
        );
        assert_eq!(cache.add_overlapping_pair(&proxies[2], &proxies[0], &bodies), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn static_pairs_are_filtered() {
        let mut bodies = Bodies::new();
        let a = bodies.add(CollisionBody::new_static(ShapeHandle(0), RigidPose::IDENTITY));
        let b = bodies.add(CollisionBody::new_static(ShapeHandle(0), RigidPose::IDENTITY));
        // Default filter groups let the pair through the broad phase test; the body test catches it.
        let proxy_a = CollisionProxy::new(ProxyHandle(0), a, BoundingBox::default());
        let proxy_b = CollisionProxy::new(ProxyHandle(1), b, BoundingBox::default());
        let mut cache = OverlappingPairCache::default();
        assert_eq!(cache.add_overlapping_pair(&proxy_a, &proxy_b, &bodies), None);
        assert!(cache.is_empty());
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic]
    fn self_pairs_are_contract_violations() {
        let (bodies, proxies) = world(1);
        let mut cache = OverlappingPairCache::default();
        cache.add_overlapping_pair(&proxies[0], &proxies[0], &bodies);
    }
}
