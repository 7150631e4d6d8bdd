use crate::error::{check_threshold, Result};
use crate::lsh::MinHashLSH;
use crate::union_find::UnionFind;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::hash::{BuildHasher, Hash};
use tracing::debug;

/// Records queried per parallel batch before their unions are applied.
const QUERY_CHUNK: usize = 256;

///
/// Disjoint groups of records found to be similar by querying a MinHashLSH.
///
/// Membership is the transitive closure of above-threshold pairs: if A is
/// similar to B and B to C, all three share a group even when A and C are not
/// similar to each other.
///
#[derive(Clone, Debug)]
pub struct DeduplicationTable<'a, Id> {
    groups: Vec<Vec<&'a Id>>,
    threshold: f64,
}

/// Record counts before and after deduplication.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct DedupSummary {
    pub total: usize,
    pub unique: usize,
    pub duplicates: usize,
}

impl<'a, Id> DeduplicationTable<'a, Id>
where
    Id: Hash + Eq + Sync,
{
    ///
    /// Constructs a DeduplicationTable using an existing MinHashLSH for querying and clustering.
    ///
    /// ## Arguments
    ///
    /// * `lsh` - A MinHashLSH to use for querying record similarity.
    /// * `threshold` - The jaccard similarity threshold (inclusive) records must reach to be merged.
    ///
    pub fn new<S>(lsh: &'a MinHashLSH<Id, S>, threshold: f64) -> Result<Self>
    where
        S: BuildHasher + Sync,
    {
        let threshold = check_threshold(threshold)?;
        let mut clusters = UnionFind::new(lsh.len());
        // queries run in parallel one chunk at a time, unions stay serial
        for start in (0..lsh.len()).step_by(QUERY_CHUNK) {
            let end = (start + QUERY_CHUNK).min(lsh.len());
            let query_results: Vec<(usize, Vec<usize>)> = (start..end)
                .into_par_iter()
                .map(|position| (position, lsh.similar_positions(position, Some(threshold))))
                .collect();
            for (position, similar) in query_results {
                for other in similar {
                    clusters.union(position, other);
                }
            }
        }
        let groups: Vec<Vec<&'a Id>> = clusters
            .groups()
            .into_iter()
            .map(|group| group.into_iter().map(|position| lsh.id_at(position)).collect())
            .collect();
        debug!(
            records = lsh.len(),
            groups = groups.len(),
            threshold,
            "clustered minhash lsh index"
        );
        Ok(DeduplicationTable { groups, threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    ///
    /// The clustered record ids, one list per group.
    ///
    /// Groups are ordered by the input position of their first record and
    /// members keep input order.
    ///
    pub fn grouped_ids(&self) -> &[Vec<&'a Id>] {
        &self.groups
    }

    pub fn into_groups(self) -> Vec<Vec<&'a Id>> {
        self.groups
    }

    /// Each record id paired with a cluster label of the form `<group index>-<group size>`.
    pub fn cluster_assignments(&self) -> impl Iterator<Item = (&'a Id, String)> + '_ {
        self.groups.iter().enumerate().flat_map(|(idx, group)| {
            let cluster_id = format!("{idx}-{}", group.len());
            group.iter().map(move |&id| (id, cluster_id.clone()))
        })
    }

    pub fn summary(&self) -> DedupSummary {
        let total = self.groups.iter().map(Vec::len).sum();
        let unique = self.groups.len();
        DedupSummary {
            total,
            unique,
            duplicates: total - unique,
        }
    }
}

/// Partitions every record of `lsh` into groups of transitively similar records.
pub fn deduplicate<Id, S>(lsh: &MinHashLSH<Id, S>, threshold: f64) -> Result<Vec<Vec<&Id>>>
where
    Id: Hash + Eq + Sync,
    S: BuildHasher + Sync,
{
    DeduplicationTable::new(lsh, threshold).map(DeduplicationTable::into_groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::IndexConfig;
    use crate::error::DedupError;
    use crate::minhash::MinHash;

    fn records(texts: &[&'static str]) -> Vec<(usize, Vec<&'static str>)> {
        texts
            .iter()
            .enumerate()
            .map(|(id, text)| (id, text.split_whitespace().collect()))
            .collect()
    }

    #[test]
    fn identical_texts_share_a_group() {
        let lsh = MinHashLSH::new(
            &records(&["the cat sat", "the cat sat", "a dog ran"]),
            IndexConfig::new(8, 1),
        )
        .unwrap();
        let groups = deduplicate(&lsh, 1.0).unwrap();
        assert_eq!(groups, vec![vec![&0, &1], vec![&2]]);
    }

    #[test]
    fn single_record_is_one_group() {
        let lsh = MinHashLSH::new(&records(&["alone here"]), IndexConfig::new(8, 2)).unwrap();
        for threshold in [0.0, 0.5, 1.0] {
            assert_eq!(deduplicate(&lsh, threshold).unwrap(), vec![vec![&0]]);
        }
    }

    #[test]
    fn chains_merge_transitively() {
        // a~b and b~c over half the positions, a and c agree on none
        let a = MinHash::from_values(vec![1, 1, 1, 1]);
        let b = MinHash::from_values(vec![1, 1, 2, 2]);
        let c = MinHash::from_values(vec![3, 3, 2, 2]);
        assert_eq!(a.jaccard_similarity(&c), 0.0);

        let lsh = MinHashLSH::new(
            &records(&["x", "y", "z"]),
            IndexConfig::new(4, 2),
        )
        .unwrap()
        .with_signatures(vec![a, b, c]);
        let table = DeduplicationTable::new(&lsh, 0.5).unwrap();
        assert_eq!(table.grouped_ids(), &[vec![&0, &1, &2]]);
        assert_eq!(
            deduplicate(&lsh, 0.75).unwrap(),
            vec![vec![&0], vec![&1], vec![&2]]
        );
    }

    #[test]
    fn identical_records_across_chunks_collapse() {
        let count = QUERY_CHUNK * 2 + 57;
        let texts: Vec<(usize, Vec<&str>)> = (0..count)
            .map(|id| (id, vec!["same", "words", "every", "time"]))
            .collect();
        let lsh = MinHashLSH::new(&texts, IndexConfig::new(8, 1)).unwrap();
        let groups = deduplicate(&lsh, 1.0).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), count);
        assert_eq!(groups[0].first(), Some(&&0));
        assert_eq!(groups[0].last(), Some(&&(count - 1)));
    }

    #[test]
    fn assignments_and_summary() {
        let lsh = MinHashLSH::new(
            &records(&["the cat sat", "the cat sat", "a dog ran"]),
            IndexConfig::new(8, 1),
        )
        .unwrap();
        let table = DeduplicationTable::new(&lsh, 1.0).unwrap();
        let assignments: Vec<(&usize, String)> = table.cluster_assignments().collect();
        assert_eq!(
            assignments,
            vec![
                (&0, "0-2".to_string()),
                (&1, "0-2".to_string()),
                (&2, "1-1".to_string())
            ]
        );
        assert_eq!(
            table.summary(),
            DedupSummary {
                total: 3,
                unique: 2,
                duplicates: 1
            }
        );
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let lsh = MinHashLSH::new(&records(&["a b"]), IndexConfig::new(8, 2)).unwrap();
        for threshold in [-0.1, 1.1, f64::NAN] {
            assert!(matches!(
                DeduplicationTable::new(&lsh, threshold),
                Err(DedupError::InvalidArgument(_))
            ));
        }
    }
}
