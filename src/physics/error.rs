use thiserror::Error;

/// Errors surfaced by configuration-time constructors and the explicit `try_` operations.
///
/// Per-step operations never return these; they degrade with a log line instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CollisionError {
    /// A bounded pair cache had no room for another pair.
    #[error("overlapping pair cache is full (capacity {capacity})")]
    PairCacheFull {
        /// Configured maximum number of live pairs.
        capacity: usize,
    },
    /// A dispatcher was given an id that does not fit in a pair's algorithm slots.
    #[error("dispatcher id {id} exceeds the maximum of {max} algorithm slots per pair")]
    InvalidDispatcherId {
        /// Requested id.
        id: usize,
        /// Number of slots per pair.
        max: usize,
    },
    /// A configuration value is out of range.
    #[error("invalid collision configuration: {0}")]
    InvalidConfiguration(&'static str),
}
