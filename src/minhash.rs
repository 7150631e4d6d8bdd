use crate::error::{DedupError, Result};
use rand::prelude::*;
use rayon::prelude::*;
use rustc_hash::FxBuildHasher;
use std::hash::{BuildHasher, Hash, Hasher};

/// Fixed-length MinHash signature of a token set.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MinHash {
    pub hash_values: Vec<u32>,
}

impl MinHash {
    pub fn from_values(hash_values: Vec<u32>) -> Self {
        MinHash { hash_values }
    }

    pub fn len(&self) -> usize {
        self.hash_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hash_values.is_empty()
    }

    /// Rows `band * rows .. (band + 1) * rows` of the signature.
    pub(crate) fn band(&self, band: usize, rows: usize) -> &[u32] {
        let start = band * rows;
        &self.hash_values[start..start + rows]
    }

    /// Fraction of positions where both signatures agree.
    ///
    /// Signatures of different lengths are compared over the longer length,
    /// so missing positions count as disagreements.
    pub fn jaccard_similarity(&self, other: &MinHash) -> f64 {
        let num_perm = self.len().max(other.len());
        if num_perm == 0 {
            return 0.0;
        }
        let equal_count = self
            .hash_values
            .iter()
            .zip(&other.hash_values)
            .filter(|&(a, b)| a == b)
            .count();
        equal_count as f64 / num_perm as f64
    }
}

/// A family of `num_perm` hash functions derived from one base hasher and
/// seeded affine permutations.
///
/// The same `S` is used to hash band slices into bucket keys, so any
/// deterministic [`BuildHasher`] can be plugged in.
#[derive(Clone, Debug)]
pub struct MinHasher<S = FxBuildHasher> {
    build_hasher: S,
    permutations: Vec<(u64, u64)>,
}

impl MinHasher<FxBuildHasher> {
    pub fn new(num_perm: usize, seed: u64) -> Self {
        Self::with_hasher(num_perm, seed, FxBuildHasher::default())
    }
}

impl<S: BuildHasher> MinHasher<S> {
    pub fn with_hasher(num_perm: usize, seed: u64, build_hasher: S) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let permutations = (0..num_perm).map(|_| (rng.gen(), rng.gen())).collect();
        MinHasher {
            build_hasher,
            permutations,
        }
    }

    pub fn num_perm(&self) -> usize {
        self.permutations.len()
    }

    /// Computes the signature of a token set. Repeated tokens do not change it.
    pub fn signature<T, U>(&self, tokens: T) -> Result<MinHash>
    where
        T: IntoIterator<Item = U>,
        U: Hash,
    {
        let mut hash_values = vec![u32::MAX; self.num_perm()];
        let mut token_count = 0usize;
        for token in tokens {
            token_count += 1;
            let item_hash = self.build_hasher.hash_one(&token);
            for (value, &(a, b)) in hash_values.iter_mut().zip(&self.permutations) {
                *value = (*value).min(permute_hash(item_hash, a, b));
            }
        }
        if token_count == 0 {
            return Err(DedupError::EmptyInput("token set is empty".to_string()));
        }
        Ok(MinHash::from_values(hash_values))
    }

    /// Signatures for a batch of token sets, computed in parallel.
    ///
    /// Fails on the first empty token set, naming its position in the batch.
    pub fn bulk_signatures<T, U>(&self, batch: &[T]) -> Result<Vec<MinHash>>
    where
        T: AsRef<[U]> + Sync,
        U: Hash + Sync,
        S: Sync,
    {
        batch
            .par_iter()
            .enumerate()
            .map(|(position, tokens)| {
                self.signature(tokens.as_ref()).map_err(|_| {
                    DedupError::EmptyInput(format!("record at position {position} has no tokens"))
                })
            })
            .collect()
    }

    /// Bucket key of one band slice.
    pub fn band_hash(&self, band: &[u32]) -> u64 {
        let mut hasher = self.build_hasher.build_hasher();
        for &value in band {
            hasher.write_u32(value);
        }
        hasher.finish()
    }
}

#[inline]
fn permute_hash(hash: u64, a: u64, b: u64) -> u32 {
    ((a.wrapping_mul(hash).wrapping_add(b)) >> 32) as u32
}
