use crate::error::ConfigError;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

// Loaded once at startup from a JSON file, e.g.:
//
// {
//     "source": { "container": { "account": "mystorageacct", "container": "landing" } },
//     "prefix": "metastore/3f6a.../tables/",
//     "checkpoint": "sorted_subfolders.csv",
//     "report": "sorted_subfolders_final.csv",
//     "batch_size": 10000
// }
//
// or, for a local directory tree:
//
// { "source": { "tree": { "root": "/var/data/blobs" } }, "prefix": "tables/" }
//
// Storage credentials are not part of the config; the container client picks
// them up from the environment.

pub const DEFAULT_BATCH_SIZE: usize = 10_000;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Container { account: String, container: String },
    Tree { root: PathBuf },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: Source,
    #[serde(default)]
    pub prefix: String,
    #[serde(default = "default_checkpoint")]
    pub checkpoint: PathBuf,
    #[serde(default = "default_report")]
    pub report: PathBuf,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;

        let config: Config = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;

        if config.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }

        Ok(config)
    }
}

fn default_checkpoint() -> PathBuf {
    PathBuf::from("sorted_subfolders.csv")
}

fn default_report() -> PathBuf {
    PathBuf::from("sorted_subfolders_final.csv")
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}
