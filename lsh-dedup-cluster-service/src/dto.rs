use lsh_dedup::IndexConfig;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct DataFile {
    pub bucket: String,
    pub key: String,
}

impl DataFile {
    /// Where results for this input go when the request names no output:
    /// same bucket, with the first `input` segment of the key swapped for `output`.
    pub fn output_location(&self) -> DataFile {
        let key = match self.key.split('/').position(|segment| segment == "input") {
            Some(idx) => self
                .key
                .split('/')
                .enumerate()
                .map(|(i, segment)| if i == idx { "output" } else { segment })
                .collect::<Vec<_>>()
                .join("/"),
            None => format!("output/{}", self.key),
        };
        DataFile {
            bucket: self.bucket.clone(),
            key,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DedupConfig {
    pub data: DataFile,
    #[serde(default)]
    pub output: Option<DataFile>,
    pub num_perm: usize,
    pub num_bands: usize,
    pub threshold: f64,
    #[serde(default = "lsh_dedup::dto::default_seed")]
    pub seed: u64,
}

impl DedupConfig {
    pub fn index_config(&self) -> IndexConfig {
        IndexConfig::new(self.num_perm, self.num_bands).with_seed(self.seed)
    }

    pub fn output_file(&self) -> DataFile {
        self.output
            .clone()
            .unwrap_or_else(|| self.data.output_location())
    }
}
