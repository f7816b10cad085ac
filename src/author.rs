//! Author index: author identifier to published-paper and co-author
//! sets.
//!
//! Grounded in the original prototype's `author_info_manager.py`, this
//! index is a plain in-memory map held for the lifetime of a single
//! ingestion run and written out as one JSON object at shutdown. None of
//! the paper store's paging or caching machinery applies here — storing
//! `papers` as compact record ids rather than full external paper ids
//! keeps the whole index small enough to live in memory for the
//! workloads this crate targets.
use std::{fs::File, io::BufWriter, path::Path};

use indexmap::{IndexMap, IndexSet};
use log::warn;
use serde::Serialize;

use crate::storage::PagerError;

/// A single author's published-paper and co-author sets.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuthorRecord {
    /// Internal record ids of papers this author has published.
    pub papers: IndexSet<String>,
    /// Every co-author this author has ever shared a byline with.
    pub co_authors: IndexSet<String>,
}

/// In-memory author index, persisted once at shutdown.
#[derive(Debug, Default)]
pub struct AuthorIndex {
    authors: IndexMap<String, AuthorRecord>,
}

impl AuthorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `author_id` published the paper `rid`, alongside
    /// `co_authors` (the paper's other authors, excluding `author_id`
    /// itself).
    ///
    /// A repeated `(author_id, rid)` pair is a no-op: the publication is
    /// already recorded, so re-appending would duplicate no information.
    /// This is warned rather than silently ignored, matching the
    /// treatment of a duplicate `add_paper` call in the paper store.
    pub fn add_author_publication<I>(&mut self, author_id: &str, rid: &str, co_authors: I)
    where
        I: IntoIterator<Item = String>,
    {
        let record = self.authors.entry(author_id.to_string()).or_default();

        if !record.papers.insert(rid.to_string()) {
            warn!("author {author_id} already credited with paper {rid}; ignoring");
            return;
        }

        for co_author in co_authors {
            record.co_authors.insert(co_author);
        }
    }

    /// Number of distinct authors currently indexed.
    pub fn len(&self) -> usize {
        self.authors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.authors.is_empty()
    }

    /// Serialises the full index as a single JSON object and writes it
    /// to `path`. Called exactly once, at shutdown.
    pub fn store(&self, path: &Path) -> Result<(), PagerError> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &self.authors).map_err(|e| PagerError::Io(e.into()))?;
        Ok(())
    }
}
