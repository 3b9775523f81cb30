use rand::{Rng, SeedableRng, distr::Alphanumeric, rngs::StdRng};
use universal_bloom::{BloomConfigBuilder, BloomFilter};

/// Filter with a fixed hash family so test outcomes are reproducible.
pub fn create_test_filter(expected_items: usize, error_rate: f64) -> BloomFilter {
    let config = BloomConfigBuilder::default()
        .expected_items(expected_items)
        .error_rate(error_rate)
        .seed(Some(0x5EED))
        .build()
        .expect("Failed to build test config");

    BloomFilter::with_config(config).expect("Failed to create test filter")
}

// Helper function to generate consistent test data
#[allow(dead_code)]
pub fn generate_test_items(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("test_item_{:06}", i)).collect()
}

#[allow(dead_code)]
pub fn generate_random_strings(count: usize, len: usize, seed: u64) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            (&mut rng)
                .sample_iter(&Alphanumeric)
                .take(len)
                .map(char::from)
                .collect()
        })
        .collect()
}
