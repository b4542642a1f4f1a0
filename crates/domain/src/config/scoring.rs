use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoringConfig {
    #[serde(default = "d_threshold_warn")]
    pub threshold_warn: f64,
    #[serde(default = "d_threshold_block")]
    pub threshold_block: f64,
    #[serde(default = "d_decay_rate")]
    pub decay_rate: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            threshold_warn: d_threshold_warn(),
            threshold_block: d_threshold_block(),
            decay_rate: d_decay_rate(),
        }
    }
}

fn d_threshold_warn() -> f64 {
    30.0
}

fn d_threshold_block() -> f64 {
    80.0
}

fn d_decay_rate() -> f64 {
    0.1
}
