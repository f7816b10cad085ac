//! Bounded, write-through cache of decoded paper records.
//!
//! [`RecordCache`] sits between the [`paper_index`](super::paper_index)
//! facade and [`pager::PagedStorage`](super::pager::PagedStorage). Every
//! entry it holds is decoded and considered dirty; there is no read-only
//! cache state, so an eviction is always a write-back, never a silent
//! drop.
//!
//! # Eviction
//!
//! When an insert would push the resident entry count past
//! `max_cache_size`, a **clean pass** runs first: all resident rids are
//! sorted ascending (lexicographic ordering over zero-padded `"F_S"`
//! strings agrees with numeric `(file_index, record_index)` ordering),
//! and the oldest `max(1, round(clean_factor * current_size))` entries
//! are encoded, written back through the pager, and dropped from the
//! cache. The `max(1, ...)` floor guarantees a clean pass always makes
//! room even when `clean_factor * current_size` rounds to zero, which
//! would otherwise stall eviction forever on a small `max_cache_size`.
use std::collections::HashMap;

use super::{
    StoreError,
    codec::{self, PaperRecord},
    pager::PagedStorage,
};

/// Write-through cache of decoded records, bounded by entry count.
pub struct RecordCache {
    entries: HashMap<String, PaperRecord>,
    max_size: usize,
    clean_factor: f64,
}

impl RecordCache {
    pub fn new(max_size: usize, clean_factor: f64) -> Self {
        Self {
            entries: HashMap::new(),
            max_size,
            clean_factor,
        }
    }

    /// Returns the cached record for `rid`, loading it from `storage` via
    /// the codec on a miss.
    pub fn get_or_load(
        &mut self,
        storage: &mut PagedStorage,
        rid: &str,
    ) -> Result<&PaperRecord, StoreError> {
        if !self.entries.contains_key(rid) {
            self.ensure_room_for_insert(storage, rid)?;
            let bytes = storage.read(rid)?;
            let record = codec::decode(&bytes)?;
            self.entries.insert(rid.to_string(), record);
        }
        Ok(self.entries.get(rid).expect("just inserted or present"))
    }

    /// Inserts or overwrites the cached record for `rid`, running a clean
    /// pass first if the insert would exceed `max_size`.
    pub fn put(
        &mut self,
        storage: &mut PagedStorage,
        rid: &str,
        record: PaperRecord,
    ) -> Result<(), StoreError> {
        self.ensure_room_for_insert(storage, rid)?;
        self.entries.insert(rid.to_string(), record);
        Ok(())
    }

    /// Runs a clean pass if inserting a new entry for `rid` would push the
    /// resident count past `max_size`. A no-op if `rid` is already
    /// resident (an overwrite, not a growth) or if there is already room.
    fn ensure_room_for_insert(
        &mut self,
        storage: &mut PagedStorage,
        rid: &str,
    ) -> Result<(), StoreError> {
        if !self.entries.contains_key(rid) && self.entries.len() >= self.max_size {
            self.clean_pass(storage)?;
        }
        Ok(())
    }

    /// Mutates the cached record for `rid` in place via `f`. The record
    /// must already be resident (callers use `get_or_load` first).
    pub fn with_mut<F>(&mut self, rid: &str, f: F)
    where
        F: FnOnce(&mut PaperRecord),
    {
        let record = self
            .entries
            .get_mut(rid)
            .expect("record must be loaded before mutation");
        f(record);
    }

    /// Writes back and evicts the oldest `max(1, round(clean_factor *
    /// current_size))` resident entries.
    fn clean_pass(&mut self, storage: &mut PagedStorage) -> Result<(), StoreError> {
        let mut rids: Vec<String> = self.entries.keys().cloned().collect();
        rids.sort();

        let evict_count = ((self.entries.len() as f64) * self.clean_factor)
            .round()
            .max(1.0) as usize;

        for rid in rids.into_iter().take(evict_count) {
            self.write_back(storage, &rid)?;
        }
        Ok(())
    }

    /// Encodes and writes every resident entry, then clears the cache.
    /// Equivalent to a clean pass over 100% of entries.
    pub fn flush_all(&mut self, storage: &mut PagedStorage) -> Result<(), StoreError> {
        let rids: Vec<String> = self.entries.keys().cloned().collect();
        for rid in rids {
            self.write_back(storage, &rid)?;
        }
        Ok(())
    }

    fn write_back(&mut self, storage: &mut PagedStorage, rid: &str) -> Result<(), StoreError> {
        if let Some(record) = self.entries.remove(rid) {
            let bytes = codec::encode(&record)?;
            storage.write(rid, &bytes)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use tempdir::TempDir;

    use super::*;

    fn storage() -> (TempDir, PagedStorage) {
        let temp = TempDir::new("cache").unwrap();
        let storage = PagedStorage::open(temp.path().to_path_buf()).unwrap();
        (temp, storage)
    }

    #[test]
    fn put_then_get_or_load_is_a_cache_hit_without_touching_storage() {
        let (_temp, mut storage) = storage();
        let mut cache = RecordCache::new(10, 0.5);

        cache
            .put(&mut storage, "0_0", PaperRecord::complete(2000))
            .unwrap();
        let record = cache.get_or_load(&mut storage, "0_0").unwrap();
        assert_eq!(record.publication_year, Some(2000));
    }

    #[test]
    fn get_or_load_falls_through_to_storage_on_miss() {
        let (_temp, mut storage) = storage();
        let bytes = codec::encode(&PaperRecord::complete(1999)).unwrap();
        storage.write("0_0", &bytes).unwrap();

        let mut cache = RecordCache::new(10, 0.5);
        let record = cache.get_or_load(&mut storage, "0_0").unwrap();
        assert_eq!(record.publication_year, Some(1999));
    }

    #[test]
    fn get_or_load_respects_max_size_on_miss() {
        let (_temp, mut storage) = storage();
        let mut cache = RecordCache::new(2, 0.5);

        for i in 0..5 {
            let rid = format!("0_{i}");
            let bytes = codec::encode(&PaperRecord::complete(2000)).unwrap();
            storage.write(&rid, &bytes).unwrap();
        }

        for i in 0..5 {
            let rid = format!("0_{i}");
            cache.get_or_load(&mut storage, &rid).unwrap();
            assert!(cache.len() <= 2);
        }
    }

    #[test]
    fn eviction_never_stalls_on_tiny_cache_bound() {
        let (_temp, mut storage) = storage();
        let mut cache = RecordCache::new(2, 0.01);

        for i in 0..10 {
            let rid = format!("0_{i}");
            cache
                .put(&mut storage, &rid, PaperRecord::complete(2000))
                .unwrap();
            assert!(cache.len() <= 2);
        }
    }

    #[test]
    fn clean_pass_evicts_oldest_rids_lexicographically() {
        let (_temp, mut storage) = storage();
        let mut cache = RecordCache::new(2, 0.5);

        cache
            .put(&mut storage, "0_0", PaperRecord::complete(2000))
            .unwrap();
        cache
            .put(&mut storage, "0_1", PaperRecord::complete(2001))
            .unwrap();
        cache
            .put(&mut storage, "0_2", PaperRecord::complete(2002))
            .unwrap();

        assert_eq!(cache.len(), 2);
        let record = cache.get_or_load(&mut storage, "0_0").unwrap();
        assert_eq!(record.publication_year, Some(2000));
    }

    #[test]
    fn flush_all_empties_the_cache_and_persists_every_entry() {
        let (_temp, mut storage) = storage();
        let mut cache = RecordCache::new(10, 0.5);

        cache
            .put(&mut storage, "0_0", PaperRecord::complete(2000))
            .unwrap();
        cache
            .put(&mut storage, "0_1", PaperRecord::complete(2001))
            .unwrap();
        cache.flush_all(&mut storage).unwrap();

        assert!(cache.is_empty());
        let record = cache.get_or_load(&mut storage, "0_1").unwrap();
        assert_eq!(record.publication_year, Some(2001));
    }
}
