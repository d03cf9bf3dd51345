/// Strategy for pairs nobody handles. Generates nothing and never reports an impact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmptyAlgorithm;

impl EmptyAlgorithm {
    /// Time of impact of an unhandled pair.
    #[inline(always)]
    pub fn calculate_time_of_impact(&self) -> f32 {
        1.0
    }
}
