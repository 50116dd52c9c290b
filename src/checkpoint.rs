//! Append-only progress log backing crash recovery.
//!
//! Entries are only ever appended; the same path may appear multiple times
//! across interrupted runs and is collapsed during aggregation. The header is
//! written exactly once, when the file is first created. At most one process
//! may append to a given checkpoint file at a time; concurrent appenders can
//! interleave rows and break the framing.

use crate::error::CheckpointError;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};
use time::{macros::format_description, OffsetDateTime};

pub const PATH_COLUMN: &str = "Subfolder";

/// One row of the checkpoint (and report) files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(rename = "Subfolder")]
    pub path: String,
    #[serde(rename = "Size")]
    pub size: u64,
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
}

pub struct CheckpointFile {
    path: PathBuf,
}

impl CheckpointFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Rebuilds the set of paths already recorded by earlier runs.
    ///
    /// A missing file is a fresh start. An existing file without the path
    /// column is refused outright; resuming from it would silently drop the
    /// dedup guarantee.
    pub fn processed_set(&self) -> Result<HashSet<String>, CheckpointError> {
        if !self.exists() {
            return Ok(HashSet::new());
        }

        let mut reader = csv::Reader::from_path(&self.path).map_err(|source| {
            CheckpointError::Open {
                path: self.path.clone(),
                source,
            }
        })?;

        let column = reader
            .headers()
            .map_err(|source| CheckpointError::Open {
                path: self.path.clone(),
                source,
            })?
            .iter()
            .position(|header| header == PATH_COLUMN)
            .ok_or_else(|| CheckpointError::MissingColumn {
                path: self.path.clone(),
                column: PATH_COLUMN,
            })?;

        let mut processed = HashSet::new();
        for record in reader.into_records() {
            let record = record.map_err(|source| CheckpointError::Row {
                path: self.path.clone(),
                source,
            })?;

            match record.get(column) {
                Some(path) => {
                    processed.insert(path.to_owned());
                }
                None => {
                    return Err(CheckpointError::MissingColumn {
                        path: self.path.clone(),
                        column: PATH_COLUMN,
                    })
                }
            }
        }

        Ok(processed)
    }

    /// Appends a batch, writing the header only when the file is created by
    /// this call. The batch is encoded fully before the file is touched, so a
    /// failed append never leaves a partial row behind.
    pub fn append_batch(&self, entries: &[Entry]) -> Result<(), CheckpointError> {
        if entries.is_empty() {
            return Ok(());
        }

        let write_header = !self.exists();

        let mut encoded = Vec::new();
        {
            let mut encoder = csv::WriterBuilder::new()
                .has_headers(write_header)
                .from_writer(&mut encoded);

            for entry in entries {
                encoder
                    .serialize(entry)
                    .map_err(|source| CheckpointError::Encode {
                        path: self.path.clone(),
                        source,
                    })?;
            }

            encoder.flush().map_err(|source| CheckpointError::Append {
                path: self.path.clone(),
                source,
            })?;
        }

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|source| CheckpointError::Append {
                path: self.path.clone(),
                source,
            })?;

        file.write_all(&encoded)
            .map_err(|source| CheckpointError::Append {
                path: self.path.clone(),
                source,
            })?;

        Ok(())
    }

    /// Iterates every recorded entry in file order.
    pub fn entries(
        &self,
    ) -> Result<impl Iterator<Item = Result<Entry, csv::Error>>, CheckpointError> {
        let reader = csv::Reader::from_path(&self.path).map_err(|source| CheckpointError::Open {
            path: self.path.clone(),
            source,
        })?;

        Ok(reader.into_deserialize())
    }
}

/// Wall-clock timestamp in the column format shared by both output files.
pub fn timestamp() -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

    OffsetDateTime::now_utc()
        .format(&format)
        .expect("timestamp format is valid")
}

#[cfg(test)]
mod does {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn entry(path: &str, size: u64) -> Entry {
        Entry {
            path: path.into(),
            size,
            timestamp: "2026-01-01 00:00:00".into(),
        }
    }

    #[test]
    fn return_an_empty_set_without_a_file() {
        let dir = tempdir().unwrap();
        let checkpoint = CheckpointFile::new(dir.path().join("missing.csv"));

        assert!(checkpoint.processed_set().unwrap().is_empty());
    }

    #[test]
    fn write_the_header_exactly_once() {
        let dir = tempdir().unwrap();
        let checkpoint = CheckpointFile::new(dir.path().join("checkpoint.csv"));

        checkpoint.append_batch(&[entry("a", 1)]).unwrap();
        checkpoint.append_batch(&[entry("b", 2)]).unwrap();

        let text = fs::read_to_string(checkpoint.path()).unwrap();
        assert_eq!(text.matches(PATH_COLUMN).count(), 1);
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn collect_each_path_once() {
        let dir = tempdir().unwrap();
        let checkpoint = CheckpointFile::new(dir.path().join("checkpoint.csv"));

        checkpoint
            .append_batch(&[entry("a", 1), entry("b", 2), entry("a", 3)])
            .unwrap();

        let processed = checkpoint.processed_set().unwrap();
        assert_eq!(processed.len(), 2);
        assert!(processed.contains("a"));
        assert!(processed.contains("b"));
    }

    #[test]
    fn keep_entries_in_append_order() {
        let dir = tempdir().unwrap();
        let checkpoint = CheckpointFile::new(dir.path().join("checkpoint.csv"));

        checkpoint.append_batch(&[entry("a", 1), entry("b", 2)]).unwrap();
        checkpoint.append_batch(&[entry("c", 3)]).unwrap();

        let paths: Vec<_> = checkpoint
            .entries()
            .unwrap()
            .map(|row| row.unwrap().path)
            .collect();

        assert_eq!(paths, vec!["a", "b", "c"]);
    }

    #[test]
    fn reject_a_checkpoint_without_the_path_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkpoint.csv");
        fs::write(&path, "Foo,Bar\n1,2\n").unwrap();

        let checkpoint = CheckpointFile::new(path);
        assert!(matches!(
            checkpoint.processed_set(),
            Err(CheckpointError::MissingColumn { .. })
        ));
    }

    #[test]
    fn reject_an_empty_checkpoint() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkpoint.csv");
        fs::write(&path, "").unwrap();

        let checkpoint = CheckpointFile::new(path);
        assert!(checkpoint.processed_set().is_err());
    }
}
