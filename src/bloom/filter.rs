use super::{BloomConfig, BloomConfigBuilder, BloomFilterStats, BloomParams};
use crate::error::BloomResult;
use crate::hash::{HashFamily, MERSENNE_PRIME, Murmur3BuildHasher};
use bitvec::{bitvec, order::Lsb0, slice::BitSlice, vec::BitVec};
use rand::{SeedableRng, rngs::StdRng};
use std::fmt;
use std::hash::{BuildHasher, Hash};
use tracing::debug;

/// Bloom filter whose `k` bit positions come from a universal hash family.
///
/// `S` supplies the base hash `H(x)`; every member of the family is an affine
/// map applied on top of it. The bit array never grows and bits are never
/// cleared, so an item that tests positive once keeps testing positive.
pub struct BloomFilter<S = Murmur3BuildHasher> {
    config: BloomConfig,
    params: BloomParams,
    bits: BitVec<usize, Lsb0>,
    hashes: HashFamily,
    hasher: S,
    seen: usize,
}

impl BloomFilter {
    /// Sizes a filter for `expected_items` at the given false positive rate.
    ///
    /// Fails with [`crate::BloomError::InvalidParameter`] unless
    /// `MIN_ERROR_RATE <= error_rate < 1.0`.
    pub fn new(expected_items: usize, error_rate: f64) -> BloomResult<Self> {
        let config = BloomConfigBuilder::default()
            .expected_items(expected_items)
            .error_rate(error_rate)
            .build()?;
        Self::with_config(config)
    }

    pub fn with_config(config: BloomConfig) -> BloomResult<Self> {
        Self::with_hasher(config, Murmur3BuildHasher::default())
    }
}

impl<S: BuildHasher> BloomFilter<S> {
    /// Builds a filter that uses `hasher` as the base hash of every item.
    pub fn with_hasher(config: BloomConfig, hasher: S) -> BloomResult<Self> {
        config.validate()?;

        let params = BloomParams::from(&config);
        let hashes = match config.seed {
            Some(seed) => HashFamily::generate(
                params.num_hashes,
                &mut StdRng::seed_from_u64(seed),
            )?,
            None => HashFamily::generate(params.num_hashes, &mut rand::rng())?,
        };

        debug!(
            expected_items = config.expected_items,
            error_rate = config.error_rate,
            num_bits = params.num_bits,
            num_hashes = params.num_hashes,
            "created bloom filter"
        );

        Ok(Self {
            bits: bitvec![0; params.num_bits],
            config,
            params,
            hashes,
            hasher,
            seen: 0,
        })
    }

    /// Reduces a 64-bit hash to a bit position in `[0, m)`.
    ///
    /// The hash is masked down to 61 bits before the modulo, which leaves a
    /// small bias whenever `m` does not divide `2^61`.
    #[inline]
    pub(crate) fn offset(&self, raw_hash: u64) -> usize {
        ((raw_hash & MERSENNE_PRIME) % self.params.num_bits as u64) as usize
    }

    pub fn add<T: Hash + ?Sized>(&mut self, item: &T) {
        let raw = self.hasher.hash_one(item);
        for hash in &self.hashes {
            let idx = self.offset(hash.apply(raw));
            self.bits.set(idx, true);
        }
        self.seen += 1;
    }

    /// Adds every item in iteration order.
    pub fn add_all<I>(&mut self, items: I)
    where
        I: IntoIterator,
        I::Item: Hash,
    {
        for item in items {
            self.add(&item);
        }
    }

    pub fn contains<T: Hash + ?Sized>(&self, item: &T) -> bool {
        let raw = self.hasher.hash_one(item);
        self.hashes
            .iter()
            .all(|hash| self.bits[self.offset(hash.apply(raw))])
    }

    // (1 - 1/m)^(k * seen)
    fn bit_clear_probability(&self) -> f64 {
        let m = self.params.num_bits as f64;
        let exponent = self.params.num_hashes as f64 * self.seen as f64;
        (1.0 - 1.0 / m).powf(exponent)
    }

    /// Probability that a given bit is still clear, as a percentage string.
    pub fn theoretical_error_rate(&self) -> String {
        format!("{:.4} %", self.bit_clear_probability() * 100.0)
    }

    /// Estimated false positive probability after `seen` insertions,
    /// `(1 - (1 - 1/m)^(k * seen))^k`.
    pub fn false_positive_probability(&self) -> f64 {
        (1.0 - self.bit_clear_probability()).powi(self.params.num_hashes as i32)
    }
}

impl<S> BloomFilter<S> {
    pub fn config(&self) -> &BloomConfig {
        &self.config
    }

    pub fn params(&self) -> &BloomParams {
        &self.params
    }

    pub fn expected_items(&self) -> usize {
        self.config.expected_items
    }

    pub fn error_rate(&self) -> f64 {
        self.config.error_rate
    }

    pub fn num_bits(&self) -> usize {
        self.params.num_bits
    }

    pub fn num_hashes(&self) -> usize {
        self.params.num_hashes
    }

    /// Number of `add` calls so far, duplicates included.
    pub fn seen(&self) -> usize {
        self.seen
    }

    pub fn hash_family(&self) -> &HashFamily {
        &self.hashes
    }

    pub fn bits(&self) -> &BitSlice<usize, Lsb0> {
        &self.bits
    }

    pub fn count_ones(&self) -> usize {
        self.bits.count_ones()
    }

    /// Fraction of bits set.
    pub fn fill_ratio(&self) -> f64 {
        self.count_ones() as f64 / self.params.num_bits as f64
    }

    /// Bits actually held in memory, rounded up to whole storage words.
    pub fn approx_memory_bits(&self) -> usize {
        self.bits.as_raw_slice().len() * usize::BITS as usize
    }

    pub fn bits_per_item(&self) -> f64 {
        self.params.num_bits as f64 / self.config.expected_items.max(1) as f64
    }
}

impl<S> BloomFilterStats for BloomFilter<S> {
    fn capacity(&self) -> usize {
        self.config.expected_items
    }

    fn false_positive_rate(&self) -> f64 {
        self.config.error_rate
    }

    fn insert_count(&self) -> usize {
        self.seen
    }
}

impl<S: BuildHasher, T: Hash> Extend<T> for BloomFilter<S> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.add_all(iter);
    }
}

/// Renders the bit array as a string of `0`s and `1`s.
impl<S> fmt::Display for BloomFilter<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.bits.iter().by_vals() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl<S> fmt::Debug for BloomFilter<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BloomFilter {{ expected_items: {}, error_rate: {}, num_bits: {}, num_hashes: {}, seen: {}, ones: {} }}",
            self.config.expected_items,
            self.config.error_rate,
            self.params.num_bits,
            self.params.num_hashes,
            self.seen,
            self.count_ones()
        )
    }
}
