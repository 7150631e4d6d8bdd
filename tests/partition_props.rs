use lsh_dedup::{deduplicate, IndexConfig, MinHashLSH};
use proptest::prelude::*;
use std::collections::HashSet;

fn corpus() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-e]{1,2}( [a-e]{1,2}){0,5}", 1..40)
}

fn shape() -> impl Strategy<Value = (usize, usize)> {
    prop_oneof![Just((8, 1)), Just((8, 4)), Just((16, 8)), Just((32, 16))]
}

fn token_sets(texts: &[String]) -> Vec<(usize, Vec<&str>)> {
    texts
        .iter()
        .enumerate()
        .map(|(id, text)| (id, text.split_whitespace().collect()))
        .collect()
}

proptest! {
    #[test]
    fn groups_partition_every_record(
        texts in corpus(),
        (num_perm, num_bands) in shape(),
        threshold in 0.0f64..=1.0,
    ) {
        let records = token_sets(&texts);
        let lsh = MinHashLSH::new(&records, IndexConfig::new(num_perm, num_bands)).unwrap();
        let groups = deduplicate(&lsh, threshold).unwrap();

        let mut seen = HashSet::new();
        for group in &groups {
            prop_assert!(!group.is_empty());
            for &&id in group {
                prop_assert!(seen.insert(id));
            }
        }
        prop_assert_eq!(seen.len(), records.len());
    }

    #[test]
    fn thresholded_queries_never_return_dissimilar_records(
        texts in corpus(),
        (num_perm, num_bands) in shape(),
        threshold in 0.0f64..=1.0,
    ) {
        let records = token_sets(&texts);
        let lsh = MinHashLSH::new(&records, IndexConfig::new(num_perm, num_bands)).unwrap();
        for (id, minhash) in lsh.minhash_map() {
            let found = lsh.query(minhash, Some(threshold)).unwrap();
            prop_assert!(found.contains(id));
            for other in found {
                let similarity = minhash.jaccard_similarity(lsh.signature(other).unwrap());
                prop_assert!(similarity >= threshold);
            }
        }
    }

    #[test]
    fn pairs_above_threshold_share_a_group(
        texts in corpus(),
        threshold in 0.0f64..=1.0,
    ) {
        let records = token_sets(&texts);
        let lsh = MinHashLSH::new(&records, IndexConfig::new(16, 8)).unwrap();
        let groups = deduplicate(&lsh, threshold).unwrap();
        let mut group_of = vec![usize::MAX; records.len()];
        for (idx, group) in groups.iter().enumerate() {
            for &&id in group {
                group_of[id] = idx;
            }
        }
        for (id, minhash) in lsh.minhash_map() {
            for &other in lsh.query(minhash, Some(threshold)).unwrap() {
                prop_assert_eq!(group_of[*id], group_of[other]);
            }
        }
    }
}
