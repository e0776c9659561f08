//! Fixed-capacity chunk partitioning.
//!
//! Splits the prioritized file list into consecutive groups of
//! `capacity` files. The last chunk holds the remainder. Concatenating the
//! chunks in order reproduces the input exactly.

use crate::models::FileRecord;

/// An ordered group of files sent to the model in one request.
#[derive(Debug, Clone)]
pub struct Chunk<'a> {
    /// Zero-based position in submission order.
    pub index: usize,
    pub files: Vec<&'a FileRecord>,
}

impl Chunk<'_> {
    /// One-based chunk number, as shown to the model and in logs.
    pub fn number(&self) -> usize {
        self.index + 1
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Split `files` into chunks of at most `capacity` files.
///
/// A zero capacity is treated as one; the config loader rejects it before
/// it gets here.
pub fn partition<'a>(files: &[&'a FileRecord], capacity: usize) -> Vec<Chunk<'a>> {
    files
        .chunks(capacity.max(1))
        .enumerate()
        .map(|(index, group)| Chunk {
            index,
            files: group.to_vec(),
        })
        .collect()
}
