//! Core abstractions and implementation for the paper store.
//!
//! This module defines the paged, fixed-width paper store: a family of
//! collaborating components (codec, pager, cache, name mapping, facade)
//! that together give random-access read-modify-write over a working set
//! of bibliographic records too large to hold entirely in memory.
//!
//! # Overview
//!
//! - [`codec`]: bijection between a decoded [`PaperRecord`] and its
//!   fixed-width on-disk byte string.
//! - [`pager`]: the family of append-only `papers_{i}.json` files addressed
//!   by record id.
//! - [`names`]: the external-paper-id to internal-record-id mapping.
//! - [`cache`]: the bounded, write-through cache of decoded records.
//! - [`paper_index`]: the facade the ingester drives — `add_paper`,
//!   `add_citation`, `get_paper_record_id`, `flush`.
//!
//! # See Also
//! - [`author`](crate::author): the sibling index keyed by author id.
//! - [`ingest`](crate::ingest): the dataset driver that calls into this facade.
pub mod cache;
pub mod codec;
pub mod names;
pub mod pager;
pub mod paper_index;

use std::io;

use thiserror::Error;

pub use codec::PaperRecord;
pub use paper_index::{PaperIndex, PublishOutcome};

/// List of possible errors thrown by the paper store.
///
/// `DuplicatePublication` is carried here for completeness with the
/// store's error taxonomy, but the facade never constructs it: a
/// duplicate `add_paper` call is non-fatal and is reported through
/// [`PublishOutcome::DuplicatePublication`](paper_index::PublishOutcome::DuplicatePublication)
/// instead, not through the `Err` channel.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("pager error: {0}")]
    Pager(#[from] PagerError),

    #[error("duplicate publication for paper {paper_id}")]
    DuplicatePublication { paper_id: String },
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("citation count for year {year} overflowed the counter width ({count} digits)")]
    CounterOverflow { year: String, count: u32 },

    #[error("malformed record at offset {offset}: {reason}")]
    Malformed { offset: usize, reason: String },
}

#[derive(Debug, Error)]
pub enum PagerError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
