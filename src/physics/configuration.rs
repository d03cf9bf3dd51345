use super::error::CollisionError;

/// Chooses how [`needs_response`](crate::physics::collision_detection::dispatcher::CollisionDispatcher::needs_response)
/// treats activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFilter {
    /// A pair needs response unless either body has contact response disabled.
    #[default]
    Standard,
    /// Additionally requires at least one of the two bodies to be active.
    RequireActiveBody,
}

/// The common set of allocation sizes and tuning values for the collision pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionConfiguration {
    /// Upper bound on live overlapping pairs. `None` lets the cache grow.
    pub pair_capacity: Option<usize>,
    /// Number of pairs to preallocate space for.
    pub initial_pair_capacity: usize,
    /// Number of manifolds to preallocate space for in each dispatcher.
    pub initial_manifold_capacity: usize,
    /// Distance beyond which cached contact points are dropped from a manifold.
    pub contact_breaking_threshold: f32,
    /// When false, any pair involving a compound resolves to the empty strategy.
    pub compound_support: bool,
    /// Response rule used by dispatchers built from this configuration.
    pub response_filter: ResponseFilter,
    /// When false, all active manifolds are handed to the island callback in a single batch.
    pub split_islands: bool,
}

impl Default for CollisionConfiguration {
    fn default() -> Self {
        Self {
            pair_capacity: None,
            initial_pair_capacity: 256,
            initial_manifold_capacity: 256,
            contact_breaking_threshold: 0.02,
            compound_support: true,
            response_filter: ResponseFilter::Standard,
            split_islands: true,
        }
    }
}

impl CollisionConfiguration {
    /// Checks that every value is in range.
    pub fn validate(&self) -> Result<(), CollisionError> {
        if self.pair_capacity == Some(0) {
            return Err(CollisionError::InvalidConfiguration(
                "pair capacity must be nonzero",
            ));
        }
        if !(self.contact_breaking_threshold > 0.0) {
            return Err(CollisionError::InvalidConfiguration(
                "contact breaking threshold must be positive",
            ));
        }
        Ok(())
    }

    /// Returns a copy with a bounded pair cache.
    pub fn with_pair_capacity(mut self, capacity: usize) -> Self {
        self.pair_capacity = Some(capacity);
        self
    }

    /// Returns a copy using the given response rule.
    pub fn with_response_filter(mut self, response_filter: ResponseFilter) -> Self {
        self.response_filter = response_filter;
        self
    }
}
