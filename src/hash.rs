//! Universal hash family used to derive bit positions.
//!
//! Every function in a family has the affine form
//! `h(x) = (a * H(x) + b) mod 2^64`, where `a` is a random odd word, `b` is
//! drawn from `[0, p)` with `p = 2^61 - 1`, and `H` is a general purpose
//! hash of the item. Each item is hashed with `H` once and then pushed
//! through all `k` affine maps.
use crate::error::{BloomError, BloomResult};
use murmur3::murmur3_x64_128;
use rand::Rng;
use std::collections::HashSet;
use std::hash::{BuildHasher, Hash, Hasher};
use std::io::Cursor;
use tracing::{trace, warn};

/// Word size of the hash domain, in bits.
pub const WORD_BITS: u32 = 64;

// `apply` reduces modulo 2^WORD_BITS through u64 wrapping arithmetic
const _: () = assert!(u64::BITS == WORD_BITS);

/// The Mersenne prime `2^61 - 1`.
pub const MERSENNE_PRIME: u64 = (1 << 61) - 1;

/// Random draws allowed per requested function before generation gives up.
const MAX_DRAWS_PER_FUNCTION: usize = 64;

/// Item bytes kept on the stack before [`Murmur3Hasher`] spills to the heap.
const INLINE_BYTES: usize = 32;

/// A single affine hash function `h(x) = a * x + b` over `u64`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HashFunction {
    a: u64,
    b: u64,
}

impl HashFunction {
    /// Odd multiplier.
    pub fn a(&self) -> u64 {
        self.a
    }

    /// Additive offset, always below [`MERSENNE_PRIME`].
    pub fn b(&self) -> u64 {
        self.b
    }

    /// Applies the affine map to an already computed base hash.
    #[inline]
    pub fn apply(&self, raw: u64) -> u64 {
        self.a.wrapping_mul(raw).wrapping_add(self.b)
    }

    /// Hashes `item` with `build_hasher` and applies the affine map.
    pub fn hash_item<T, S>(&self, item: &T, build_hasher: &S) -> u64
    where
        T: Hash + ?Sized,
        S: BuildHasher,
    {
        self.apply(build_hasher.hash_one(item))
    }
}

/// An ordered set of pairwise distinct [`HashFunction`]s.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HashFamily {
    functions: Vec<HashFunction>,
}

impl HashFamily {
    /// Draws `k` distinct `(a, b)` pairs from `rng`.
    ///
    /// `a` is redrawn until it is odd and duplicate pairs are discarded. The
    /// loop is bounded, so a degenerate RNG yields
    /// [`BloomError::HashGenerationExhausted`] instead of spinning forever.
    pub fn generate<R: Rng + ?Sized>(k: usize, rng: &mut R) -> BloomResult<Self> {
        let budget = k.saturating_mul(MAX_DRAWS_PER_FUNCTION);
        let mut pairs = HashSet::with_capacity(k);
        let mut functions = Vec::with_capacity(k);
        let mut draws = 0;

        while functions.len() < k {
            if draws == budget {
                warn!(
                    requested = k,
                    generated = functions.len(),
                    draws,
                    "hash family generation ran out of draws"
                );
                return Err(BloomError::HashGenerationExhausted {
                    requested: k,
                    generated: functions.len(),
                    attempts: draws,
                });
            }
            draws += 1;

            let a: u64 = rng.random();
            if a & 1 == 0 {
                continue;
            }
            let b = rng.random_range(0..MERSENNE_PRIME);

            if pairs.insert((a, b)) {
                functions.push(HashFunction { a, b });
            } else {
                trace!(a, b, "discarding duplicate hash parameters");
            }
        }

        Ok(Self { functions })
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HashFunction> {
        self.functions.iter()
    }
}

impl<'a> IntoIterator for &'a HashFamily {
    type Item = &'a HashFunction;
    type IntoIter = std::slice::Iter<'a, HashFunction>;

    fn into_iter(self) -> Self::IntoIter {
        self.functions.iter()
    }
}

/// [`Hasher`] that collects the bytes fed by a `Hash` impl and digests them
/// with MurmurHash3 x64/128, keeping the low 64 bits.
///
/// Items up to `INLINE_BYTES` bytes are buffered on the stack; longer ones
/// spill into a heap `Vec`. `fnv::FnvBuildHasher` streams without any
/// buffer and is the cheaper choice when mixing quality matters less.
#[derive(Clone, Debug, Default)]
pub struct Murmur3Hasher {
    inline: [u8; INLINE_BYTES],
    len: usize,
    spill: Vec<u8>,
    seed: u32,
}

impl Murmur3Hasher {
    fn bytes(&self) -> &[u8] {
        if self.spill.is_empty() {
            &self.inline[..self.len]
        } else {
            &self.spill
        }
    }
}

impl Hasher for Murmur3Hasher {
    fn write(&mut self, bytes: &[u8]) {
        if self.spill.is_empty() && self.len + bytes.len() <= INLINE_BYTES {
            self.inline[self.len..self.len + bytes.len()].copy_from_slice(bytes);
            self.len += bytes.len();
            return;
        }
        if self.spill.is_empty() {
            self.spill.reserve(self.len + bytes.len());
            self.spill.extend_from_slice(&self.inline[..self.len]);
        }
        self.spill.extend_from_slice(bytes);
    }

    fn finish(&self) -> u64 {
        let mut cursor = Cursor::new(self.bytes());
        // reading from an in-memory cursor cannot fail
        murmur3_x64_128(&mut cursor, self.seed)
            .map(|h| h as u64)
            .unwrap_or_default()
    }
}

/// Default base hash `H` for [`crate::BloomFilter`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Murmur3BuildHasher {
    seed: u32,
}

impl Murmur3BuildHasher {
    pub fn with_seed(seed: u32) -> Self {
        Self { seed }
    }
}

impl BuildHasher for Murmur3BuildHasher {
    type Hasher = Murmur3Hasher;

    fn build_hasher(&self) -> Murmur3Hasher {
        Murmur3Hasher {
            seed: self.seed,
            ..Murmur3Hasher::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fnv::FnvBuildHasher;
    use rand::{RngCore, SeedableRng, rngs::StdRng};

    /// RNG that returns the same word forever.
    struct ConstRng(u64);

    impl RngCore for ConstRng {
        fn next_u32(&mut self) -> u32 {
            self.0 as u32
        }

        fn next_u64(&mut self) -> u64 {
            self.0
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for (i, byte) in dest.iter_mut().enumerate() {
                *byte = self.0.to_le_bytes()[i % 8];
            }
        }
    }

    #[test]
    fn test_generate_produces_k_distinct_pairs() {
        let mut rng = StdRng::seed_from_u64(42);
        let family = HashFamily::generate(32, &mut rng).unwrap();

        assert_eq!(family.len(), 32);
        let pairs: HashSet<(u64, u64)> =
            family.iter().map(|h| (h.a(), h.b())).collect();
        assert_eq!(pairs.len(), 32, "pairs must be pairwise distinct");
    }

    #[test]
    fn test_generated_parameters_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let family = HashFamily::generate(100, &mut rng).unwrap();

        for h in &family {
            assert_eq!(h.a() & 1, 1, "multiplier must be odd");
            assert!(h.b() < MERSENNE_PRIME);
        }
    }

    #[test]
    fn test_same_seed_same_family() {
        let first =
            HashFamily::generate(8, &mut StdRng::seed_from_u64(1)).unwrap();
        let second =
            HashFamily::generate(8, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_even_only_rng_exhausts_budget() {
        let result = HashFamily::generate(1, &mut ConstRng(2));
        assert_eq!(
            result,
            Err(BloomError::HashGenerationExhausted {
                requested: 1,
                generated: 0,
                attempts: MAX_DRAWS_PER_FUNCTION,
            })
        );
    }

    #[test]
    fn test_constant_rng_cannot_fill_family() {
        // one pair is accepted, every later draw is a duplicate
        let result = HashFamily::generate(2, &mut ConstRng(3));
        match result {
            Err(BloomError::HashGenerationExhausted { generated, .. }) => {
                assert_eq!(generated, 1)
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_functions_is_empty() {
        let family =
            HashFamily::generate(0, &mut StdRng::seed_from_u64(5)).unwrap();
        assert!(family.is_empty());
        assert_eq!(family.len(), 0);

        let family =
            HashFamily::generate(3, &mut StdRng::seed_from_u64(5)).unwrap();
        assert!(!family.is_empty());
    }

    #[test]
    fn test_word_bits_matches_wrapping_domain() {
        let h = HashFunction { a: 1, b: 1 };
        // 2^WORD_BITS - 1 + 1 wraps to zero
        assert_eq!(h.apply(u64::MAX), 0);
        assert_eq!(u64::MAX.count_ones(), WORD_BITS);
    }

    #[test]
    fn test_apply_wraps_modulo_word() {
        let h = HashFunction { a: u64::MAX, b: 5 };
        // (2^64 - 1) * 2 + 5 = 2^65 + 3 = 3 (mod 2^64)
        assert_eq!(h.apply(2), 3);
    }

    #[test]
    fn test_hash_is_stable() {
        let h = HashFunction { a: 0x9E37_79B9_7F4A_7C15, b: 11 };
        let build = Murmur3BuildHasher::default();
        assert_eq!(h.hash_item("item", &build), h.hash_item("item", &build));
        assert_eq!(
            h.hash_item(&(1u8, 2u8, 3u8, 4u8), &FnvBuildHasher::default()),
            h.hash_item(&(1u8, 2u8, 3u8, 4u8), &FnvBuildHasher::default())
        );
    }

    #[test]
    fn test_murmur3_seed_changes_output() {
        let a = Murmur3BuildHasher::with_seed(0).hash_one("payload");
        let b = Murmur3BuildHasher::with_seed(1).hash_one("payload");
        assert_ne!(a, b);
    }

    #[test]
    fn test_murmur3_hasher_concatenates_writes() {
        let mut split = Murmur3BuildHasher::default().build_hasher();
        split.write(b"hello ");
        split.write(b"world");

        let mut whole = Murmur3BuildHasher::default().build_hasher();
        whole.write(b"hello world");

        assert_eq!(split.finish(), whole.finish());
    }

    fn murmur3_reference(bytes: &[u8]) -> u64 {
        murmur3_x64_128(&mut Cursor::new(bytes), 0).unwrap() as u64
    }

    #[test]
    fn test_murmur3_hasher_inline_and_spilled_agree() {
        let short = [7u8; INLINE_BYTES];
        let mut hasher = Murmur3BuildHasher::default().build_hasher();
        hasher.write(&short);
        assert!(hasher.spill.is_empty(), "{INLINE_BYTES} bytes stay inline");
        assert_eq!(hasher.finish(), murmur3_reference(&short));

        let long: Vec<u8> = (0..200u8).collect();
        let mut hasher = Murmur3BuildHasher::default().build_hasher();
        for chunk in long.chunks(13) {
            hasher.write(chunk);
        }
        assert_eq!(hasher.spill.len(), long.len());
        assert_eq!(hasher.finish(), murmur3_reference(&long));
    }
}
