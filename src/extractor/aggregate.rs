use serde::Serialize;
use std::path::{Path, PathBuf};

/// A record paired with the file it was extracted from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sourced<T> {
    pub source: PathBuf,
    pub value: T,
}

/// Insertion-ordered record collection.
///
/// Records keep file traversal order, then in-file match order. Duplicates
/// are kept verbatim.
#[derive(Debug, Clone)]
pub struct RecordSet<T> {
    records: Vec<Sourced<T>>,
    contributing_files: usize,
}

impl<T> RecordSet<T> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            contributing_files: 0,
        }
    }

    /// Appends every record extracted from `source`; returns how many were added.
    pub fn extend_from<I>(&mut self, source: &Path, values: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        let before = self.records.len();
        self.records.extend(values.into_iter().map(|value| Sourced {
            source: source.to_path_buf(),
            value,
        }));

        let added = self.records.len() - before;
        if added > 0 {
            self.contributing_files += 1;
        }
        added
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contributing_files(&self) -> usize {
        self.contributing_files
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sourced<T>> {
        self.records.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.records.iter().map(|r| &r.value)
    }
}

impl<T> Default for RecordSet<T> {
    fn default() -> Self {
        Self::new()
    }
}
