//! Standard Bloom Filter implementation
pub mod config;
pub mod filter;
pub mod traits;

pub use config::{
    BloomConfig, BloomConfigBuilder, BloomConfigBuilderError, BloomParams,
    MIN_ERROR_RATE, optimal_bit_vector_size, optimal_num_hashes,
};
pub use filter::BloomFilter;
pub use traits::BloomFilterStats;
