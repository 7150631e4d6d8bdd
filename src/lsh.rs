use crate::dto::{IndexConfig, Record};
use crate::error::{check_threshold, DedupError, Result};
use crate::minhash::{MinHash, MinHasher};
use crate::text::whitespace_tokens;
use rayon::prelude::*;
use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use std::hash::{BuildHasher, Hash};
use tracing::debug;

/// Locality-Sensitive Hashing using MinHash for efficient similarity search.
///
/// Built once from a full record collection and read-only afterwards. Records
/// are addressed internally by their position in the input, and the banded
/// hash tables only ever store those positions.
#[derive(Clone, Debug)]
pub struct MinHashLSH<Id, S = FxBuildHasher> {
    config: IndexConfig,
    minhasher: MinHasher<S>,
    /// Record ids in input order
    ids: Vec<Id>,
    /// Reverse lookup from record id to position
    positions: FxHashMap<Id, usize>,
    /// Signatures in input order, for jaccard similarity thresholding
    signatures: Vec<MinHash>,
    /// One table per band mapping a band hash to the positions in that bucket
    hash_tables: Vec<FxHashMap<u64, Vec<usize>>>,
}

impl MinHashLSH<String, FxBuildHasher> {
    /// Builds an index over raw records, tokenizing each text on whitespace.
    pub fn from_records(records: &[Record], config: IndexConfig) -> Result<Self> {
        let token_sets: Vec<(String, Vec<&str>)> = records
            .iter()
            .map(|Record { id, text }| (id.clone(), whitespace_tokens(text).collect()))
            .collect();
        Self::new(&token_sets, config)
    }
}

impl<Id> MinHashLSH<Id, FxBuildHasher>
where
    Id: Hash + Eq + Clone + Sync,
{
    /// Creates a new MinHashLSH instance.
    ///
    /// ## Arguments
    ///
    /// * `records` - `(id, tokens)` pairs to index. Ids must be unique and
    ///   every token set must be non-empty.
    /// * `config` - Signature length, band count and permutation seed.
    pub fn new<T, U>(records: &[(Id, T)], config: IndexConfig) -> Result<Self>
    where
        T: AsRef<[U]> + Sync,
        U: Hash + Sync,
    {
        Self::with_hasher(records, config, FxBuildHasher::default())
    }
}

impl<Id, S> MinHashLSH<Id, S>
where
    Id: Hash + Eq + Clone + Sync,
    S: BuildHasher + Sync,
{
    /// Same as [`MinHashLSH::new`] with a caller-chosen base hasher for both
    /// token hashing and band hashing.
    pub fn with_hasher<T, U>(records: &[(Id, T)], config: IndexConfig, build_hasher: S) -> Result<Self>
    where
        T: AsRef<[U]> + Sync,
        U: Hash + Sync,
    {
        config.validate()?;
        let mut ids = Vec::with_capacity(records.len());
        let mut positions = FxHashMap::with_capacity_and_hasher(records.len(), Default::default());
        for (position, (id, _)) in records.iter().enumerate() {
            if positions.insert(id.clone(), position).is_some() {
                return Err(DedupError::InvalidArgument(format!(
                    "duplicate record id at position {position}"
                )));
            }
            ids.push(id.clone());
        }

        let minhasher = MinHasher::with_hasher(config.num_perm, config.seed, build_hasher);
        let token_sets: Vec<&[U]> = records.iter().map(|(_, tokens)| tokens.as_ref()).collect();
        let signatures = minhasher.bulk_signatures::<&[U], U>(&token_sets)?;

        let hash_tables = build_hash_tables(&minhasher, &signatures, &config);

        debug!(
            records = ids.len(),
            num_perm = config.num_perm,
            num_bands = config.num_bands,
            "built minhash lsh index"
        );
        Ok(MinHashLSH {
            config,
            minhasher,
            ids,
            positions,
            signatures,
            hash_tables,
        })
    }
}

impl<Id, S> MinHashLSH<Id, S>
where
    Id: Hash + Eq + Sync,
    S: BuildHasher + Sync,
{
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// The hash family the index was built with, for signing query records.
    pub fn minhasher(&self) -> &MinHasher<S> {
        &self.minhasher
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.positions.contains_key(id)
    }

    /// Stored signature of a record.
    pub fn signature(&self, id: &Id) -> Option<&MinHash> {
        self.positions.get(id).map(|&position| &self.signatures[position])
    }

    /// Every `(id, signature)` pair, in input order.
    pub fn minhash_map(&self) -> impl Iterator<Item = (&Id, &MinHash)> + '_ {
        self.ids.iter().zip(&self.signatures)
    }

    /// Records sharing at least one band bucket with `minhash`.
    ///
    /// This is a superset of the near-duplicates the banding can find and
    /// always includes every record whose stored signature equals `minhash`.
    /// `minhash` must be the signature of a record in the index.
    pub fn candidates(&self, minhash: &MinHash) -> Result<FxHashSet<&Id>> {
        Ok(self
            .stored_candidates(minhash)?
            .into_iter()
            .map(|position| &self.ids[position])
            .collect())
    }

    /// Query the LSH for (potentially) similar items.
    ///
    /// ## Arguments
    ///
    /// * `minhash` - The MinHash instance to query for.
    /// * `threshold` - threshold (inclusive) for jaccard similarity to apply to query result (optional).
    ///
    /// Without a threshold the banding candidates are returned as is. With one,
    /// every candidate is compared against `minhash` over the full signature
    /// and kept only if the agreement fraction is at least `threshold`.
    ///
    /// Fails with [`DedupError::InvalidArgument`] if no record in the index
    /// has exactly this signature.
    pub fn query(&self, minhash: &MinHash, threshold: Option<f64>) -> Result<FxHashSet<&Id>> {
        let threshold = threshold.map(check_threshold).transpose()?;
        let candidates = self.stored_candidates(minhash)?;
        Ok(self
            .filter_positions(minhash, candidates, threshold)
            .into_iter()
            .map(|position| &self.ids[position])
            .collect())
    }

    /// Queries with the stored signature of a record already in the index.
    pub fn query_id(&self, id: &Id, threshold: Option<f64>) -> Result<FxHashSet<&Id>> {
        let minhash = self
            .signature(id)
            .ok_or_else(|| DedupError::InvalidArgument("record id is not in the index".to_string()))?;
        self.query(minhash, threshold)
    }

    pub(crate) fn id_at(&self, position: usize) -> &Id {
        &self.ids[position]
    }

    /// Positions similar to the record at `position`. `threshold` must already be validated.
    pub(crate) fn similar_positions(&self, position: usize, threshold: Option<f64>) -> Vec<usize> {
        let minhash = &self.signatures[position];
        self.filter_positions(minhash, self.candidate_positions(minhash), threshold)
    }

    fn filter_positions(
        &self,
        minhash: &MinHash,
        candidates: FxHashSet<usize>,
        threshold: Option<f64>,
    ) -> Vec<usize> {
        if let Some(threshold) = threshold {
            candidates
                .into_par_iter()
                .filter(|&position| {
                    minhash.jaccard_similarity(&self.signatures[position]) >= threshold
                })
                .collect()
        } else {
            candidates.into_iter().collect()
        }
    }

    fn candidate_positions(&self, minhash: &MinHash) -> FxHashSet<usize> {
        let band_size = self.config.rows_per_band();
        self.hash_tables
            .iter()
            .enumerate()
            .fold(FxHashSet::default(), |mut doc_set, (band, table)| {
                let band_hash = self.minhasher.band_hash(minhash.band(band, band_size));
                if let Some(docs) = table.get(&band_hash) {
                    doc_set.extend(docs);
                }
                doc_set
            })
    }

    /// Swaps in hand-made signatures and re-bands them.
    #[cfg(test)]
    pub(crate) fn with_signatures(mut self, signatures: Vec<MinHash>) -> Self {
        assert_eq!(signatures.len(), self.ids.len());
        self.hash_tables = build_hash_tables(&self.minhasher, &signatures, &self.config);
        self.signatures = signatures;
        self
    }

    /// Band candidates of a signature stored for some record.
    ///
    /// A stored signature lands in its own buckets in every band, so the
    /// candidate set holds its record whenever it is in the index.
    fn stored_candidates(&self, minhash: &MinHash) -> Result<FxHashSet<usize>> {
        if minhash.len() != self.config.num_perm {
            return Err(DedupError::InvalidArgument(format!(
                "signature has length {}, index expects {}",
                minhash.len(),
                self.config.num_perm
            )));
        }
        let candidates = self.candidate_positions(minhash);
        if !candidates
            .iter()
            .any(|&position| self.signatures[position] == *minhash)
        {
            return Err(DedupError::InvalidArgument(
                "signature is not in the index".to_string(),
            ));
        }
        Ok(candidates)
    }
}

/// Builds one bucket table per band; bands are independent and built in parallel.
fn build_hash_tables<S>(
    minhasher: &MinHasher<S>,
    signatures: &[MinHash],
    config: &IndexConfig,
) -> Vec<FxHashMap<u64, Vec<usize>>>
where
    S: BuildHasher + Sync,
{
    let band_size = config.rows_per_band();
    (0..config.num_bands)
        .into_par_iter()
        .map(|band| {
            let mut table: FxHashMap<u64, Vec<usize>> = FxHashMap::default();
            for (position, minhash) in signatures.iter().enumerate() {
                let band_hash = minhasher.band_hash(minhash.band(band, band_size));
                table.entry(band_hash).or_default().push(position);
            }
            table
        })
        .collect()
}
