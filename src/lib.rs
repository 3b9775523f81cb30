//! Bloom filter built on a Carter-Wegman universal hash family.
//!
//! Construction takes an expected item count `n` and a target false
//! positive rate `ε` and derives:
//!   * `m = ceil(log2(e) * log2(1/ε) * n)` bits, all initially clear.
//!   * `k = ceil(log2(e) * log2(1/ε) * ln 2)` hash functions.
//!
//! Hashing:
//!   * Each item is hashed once with a general purpose base hash `H`
//!     (MurmurHash3 by default, FNV optionally).
//!   * Each of the `k` functions is `h(x) = a * H(x) + b mod 2^64` with a
//!     random odd `a` and `b < 2^61 - 1`. All `(a, b)` pairs are distinct.
//!   * A hash is reduced to a bit position as `(h & (2^61 - 1)) mod m`.
//!
//! Guarantees:
//!   * No false negatives. Bits are never cleared and the array never
//!     resizes, so membership is monotone.
//!   * False positives occur with probability close to `ε` once `n`
//!     items have been added.
//!
//! Not thread safe on its own: `add` needs `&mut self`, so share a filter
//! across threads behind a lock.

pub mod bloom;
pub mod common;
mod error;
mod hash;

pub use bloom::{
    BloomConfig, BloomConfigBuilder, BloomConfigBuilderError, BloomFilter,
    BloomFilterStats, BloomParams, MIN_ERROR_RATE, optimal_bit_vector_size,
    optimal_num_hashes,
};
pub use error::{BloomError, BloomResult};
pub use hash::{
    HashFamily, HashFunction, MERSENNE_PRIME, Murmur3BuildHasher,
    Murmur3Hasher, WORD_BITS,
};
