use crate::error::{DedupError, Result};
use serde::{Deserialize, Serialize};

/// Seed used when a configuration does not name one.
pub const DEFAULT_SEED: u64 = 0x5eed_1a5d_ed00_0001;

pub fn default_seed() -> u64 {
    DEFAULT_SEED
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Record {
    pub id: String,
    pub text: String,
}

impl Record {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Record {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Shape of a [`crate::MinHashLSH`] index.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IndexConfig {
    /// Signature length (number of hash permutations).
    pub num_perm: usize,
    /// Number of bands the signature is split into (number of hash tables).
    pub num_bands: usize,
    /// Seed of the permutation family; equal seeds give equal signatures.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl IndexConfig {
    pub fn new(num_perm: usize, num_bands: usize) -> Self {
        IndexConfig {
            num_perm,
            num_bands,
            seed: DEFAULT_SEED,
        }
    }

    pub fn with_seed(self, seed: u64) -> Self {
        IndexConfig { seed, ..self }
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_perm == 0 {
            return Err(DedupError::Configuration(
                "num_perm must be positive".to_string(),
            ));
        }
        if self.num_bands == 0 {
            return Err(DedupError::Configuration(
                "num_bands must be positive".to_string(),
            ));
        }
        if self.num_perm % self.num_bands != 0 {
            return Err(DedupError::Configuration(format!(
                "num_perm {} is not divisible by num_bands {}",
                self.num_perm, self.num_bands
            )));
        }
        Ok(())
    }

    /// Rows per band. Only meaningful for a validated configuration.
    pub fn rows_per_band(&self) -> usize {
        self.num_perm / self.num_bands
    }
}
