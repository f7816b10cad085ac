//! Disk-backed, fixed-width record storage.
//!
//! The `pager` module defines [`PagedStorage`], which owns the family of
//! append-only files that back the paper store: `papers_0.json`,
//! `papers_1.json`, … Each file holds a dense array of
//! [`RECORD_LENGTH`](super::codec::RECORD_LENGTH)-byte records addressed
//! by `(file_index, record_index)`, derived from a record id by splitting
//! at the underscore.
//!
//! File handles are opened lazily on first access and kept open for the
//! lifetime of the `PagedStorage`: callers deal in logical record ids,
//! never raw byte offsets, and this component owns all I/O against the
//! backing files.
//!
//! # Durability
//!
//! Every write is flushed and synced to disk before `write` returns —
//! there is no write-behind at this layer (that is the record cache's
//! job, one level up).
//!
//! # Failure
//!
//! I/O errors propagate as [`PagerError`](super::PagerError) and are
//! fatal for the current session; there is no retry and no partial-write
//! protection.
use std::{
    collections::HashMap,
    fs::{File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::PathBuf,
};

use log::trace;

use super::{PagerError, codec::RECORD_LENGTH};

const STORAGE_FILE_PREFIX: &str = "papers_";
const STORAGE_FILE_SUFFIX: &str = ".json";

/// Splits a record id of the form `"{file_index}_{record_index}"` into
/// its numeric components.
///
/// # Panics
///
/// Panics if `rid` is not well-formed — record ids are only ever
/// produced by [`NameMapping::assign`](super::names::NameMapping::assign),
/// so a malformed id indicates a caller bug, not an external data error.
pub fn split_record_id(rid: &str) -> (usize, usize) {
    let (file_part, record_part) = rid
        .split_once('_')
        .unwrap_or_else(|| panic!("record id {rid:?} is missing the '_' separator"));

    let file_index: usize = file_part
        .parse()
        .unwrap_or_else(|_| panic!("record id {rid:?} has a non-numeric file index"));
    let record_index: usize = record_part
        .parse()
        .unwrap_or_else(|_| panic!("record id {rid:?} has a non-numeric record index"));

    (file_index, record_index)
}

/// Disk-backed store of fixed-width paper records.
pub struct PagedStorage {
    dir: PathBuf,
    handles: HashMap<usize, File>,
}

impl PagedStorage {
    /// Opens a paged storage rooted at `dir`, creating the directory if
    /// it does not already exist. No backing files are opened until
    /// first access.
    pub fn open(dir: PathBuf) -> Result<Self, PagerError> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            handles: HashMap::new(),
        })
    }

    /// Reads the record at `rid`.
    ///
    /// # Panics
    ///
    /// Panics if the underlying file is shorter than the byte range this
    /// record occupies — the paper index guarantees a write always
    /// precedes a read for any given rid.
    pub fn read(&mut self, rid: &str) -> Result<[u8; RECORD_LENGTH], PagerError> {
        let (file_index, record_index) = split_record_id(rid);
        let offset = (record_index * RECORD_LENGTH) as u64;

        let handle = self.handle(file_index)?;
        handle.seek(SeekFrom::Start(offset))?;

        let mut buf = [0u8; RECORD_LENGTH];
        handle.read_exact(&mut buf)?;
        trace!("read record {rid} ({RECORD_LENGTH} bytes at offset {offset})");
        Ok(buf)
    }

    /// Writes `bytes` at `rid`'s offset, creating the backing file on
    /// first write into it. Flushed and synced before returning.
    pub fn write(&mut self, rid: &str, bytes: &[u8; RECORD_LENGTH]) -> Result<(), PagerError> {
        let (file_index, record_index) = split_record_id(rid);
        let offset = (record_index * RECORD_LENGTH) as u64;

        let handle = self.handle(file_index)?;
        handle.seek(SeekFrom::Start(offset))?;
        handle.write_all(bytes)?;
        handle.flush()?;
        handle.sync_data()?;
        trace!("wrote record {rid} ({RECORD_LENGTH} bytes at offset {offset})");
        Ok(())
    }

    fn handle(&mut self, file_index: usize) -> Result<&mut File, PagerError> {
        if !self.handles.contains_key(&file_index) {
            let path = self
                .dir
                .join(format!("{STORAGE_FILE_PREFIX}{file_index}{STORAGE_FILE_SUFFIX}"));
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(path)?;
            self.handles.insert(file_index, file);
        }

        Ok(self.handles.get_mut(&file_index).expect("just inserted"))
    }
}
