use afidesign::engine::config::MIN_SEGMENT_LENGTH;

/// Fallback values for settings the run file and command line leave unset.
pub struct DefaultsConfig {
    pub min_segment_length: usize,
    pub evaluation_budget: usize,
    pub positions_per_move: usize,
    pub random_seed: u64,
    pub exclude_wild_type: bool,
    pub cache_predictions: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            min_segment_length: MIN_SEGMENT_LENGTH,
            evaluation_budget: 500,
            positions_per_move: 2,
            random_seed: 0,
            exclude_wild_type: true,
            cache_predictions: true,
        }
    }
}
