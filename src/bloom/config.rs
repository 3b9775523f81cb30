use crate::error::{BloomError, BloomResult};
use derive_builder::Builder;
use std::f64::consts::{LN_2, LOG2_E};

/// Smallest accepted target false positive rate.
pub const MIN_ERROR_RATE: f64 = 0.000_001;

#[derive(Clone, Debug, Builder)]
#[builder(pattern = "owned")]
pub struct BloomConfig {
    /// Expected number of items. Used for sizing only, never enforced
    #[builder(default = "1_000")]
    pub expected_items: usize,

    /// Target false positive rate, in [MIN_ERROR_RATE, 1.0)
    #[builder(default = "0.01")]
    pub error_rate: f64,

    /// Seed for drawing the hash family; `None` uses the thread RNG
    #[builder(default = "None")]
    pub seed: Option<u64>,
}

impl BloomConfig {
    pub fn validate(&self) -> BloomResult<()> {
        // written so that NaN is rejected too
        if !(MIN_ERROR_RATE..1.0).contains(&self.error_rate) {
            return Err(BloomError::InvalidParameter {
                rate: self.error_rate,
            });
        }
        Ok(())
    }
}

/// Derived parameters calculated from BloomConfig
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BloomParams {
    /// `m`
    pub num_bits: usize,
    /// `k`
    pub num_hashes: usize,
}

impl From<&BloomConfig> for BloomParams {
    fn from(config: &BloomConfig) -> Self {
        Self {
            num_bits: optimal_bit_vector_size(
                config.expected_items,
                config.error_rate,
            ),
            num_hashes: optimal_num_hashes(config.error_rate),
        }
    }
}

// m = ceil(log2(e) * log2(1/ε) * n)
pub fn optimal_bit_vector_size(n: usize, error_rate: f64) -> usize {
    let c_log_epsilon = LOG2_E * (1.0 / error_rate).log2();
    ((c_log_epsilon * n as f64).ceil() as usize).max(1)
}

// k = (m/n) * ln 2, with m/n = log2(e) * log2(1/ε)
pub fn optimal_num_hashes(error_rate: f64) -> usize {
    let c_log_epsilon = LOG2_E * (1.0 / error_rate).log2();
    ((c_log_epsilon * LN_2).ceil() as usize).max(1)
}
