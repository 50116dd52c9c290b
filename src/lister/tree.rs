use super::{ListItem, ObjectRecord};
use crate::error::ListError;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Lists regular files below `root` as objects, keyed by their slash-separated
/// relative paths. Entries come out in a stable name-sorted order.
pub struct TreeLister {
    root: PathBuf,
    prefix: String,
    walker: walkdir::IntoIter,
}

impl TreeLister {
    pub fn new(root: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        let root = root.into();
        let walker = WalkDir::new(&root).sort_by_file_name().into_iter();

        Self {
            root,
            prefix: prefix.into(),
            walker,
        }
    }
}

impl Iterator for TreeLister {
    type Item = ListItem;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(err) => return Some(Err(err.into())),
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry.path().strip_prefix(&self.root).unwrap_or(entry.path());
            let path = relative.to_string_lossy().replace('\\', "/");
            if !path.starts_with(&self.prefix) {
                continue;
            }

            return Some(match entry.metadata() {
                Ok(meta) => Ok(ObjectRecord {
                    path,
                    size: meta.len(),
                }),
                Err(err) => Err(ListError::Stat {
                    path: entry.path().to_owned(),
                    source: err.into(),
                }),
            });
        }
    }
}
