//! Near-duplicate detection with MinHash signatures and LSH banding.
//!
//! Records are hashed into fixed-length [`MinHash`] signatures, indexed into
//! banded hash tables by [`MinHashLSH`], and grouped into disjoint clusters by
//! [`DeduplicationTable`].

pub mod dedup;
pub mod dto;
pub mod error;
pub mod lsh;
pub mod minhash;
pub mod text;
pub mod union_find;

pub use dedup::{deduplicate, DedupSummary, DeduplicationTable};
pub use dto::{IndexConfig, Record};
pub use error::{DedupError, Result};
pub use lsh::MinHashLSH;
pub use minhash::{MinHash, MinHasher};
