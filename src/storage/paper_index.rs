//! Facade orchestrating the codec, pager, name mapping and cache into
//! the paper store's public surface: `add_paper`, `add_citation`,
//! `get_paper_record_id`, `flush`.
//!
//! This is the component the ingester drives. It owns every other piece
//! of the store exclusively; nothing outside this module touches the
//! pager, cache or name mapping directly.
use std::path::PathBuf;

use log::warn;

use crate::config::StoreConfig;

use super::{
    StoreError,
    cache::RecordCache,
    codec::{self, PaperRecord},
    names::NameMapping,
    pager::PagedStorage,
};

const NAME_MAPPING_FILE: &str = "papers_name_mapping.json";

/// Outcome of [`PaperIndex::add_paper`], distinguishing a fresh insert
/// from a year update on a placeholder from a rejected duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// No prior record existed; a complete record was created.
    Inserted,
    /// A placeholder (created by an earlier `add_citation`) was
    /// completed with its publication year.
    Updated,
    /// A complete record already existed for this paper id; the call was
    /// a no-op.
    DuplicatePublication,
}

/// The paged paper store's public facade.
pub struct PaperIndex {
    storage: PagedStorage,
    cache: RecordCache,
    names: NameMapping,
    mapping_path: PathBuf,
}

impl PaperIndex {
    /// Opens (or creates) a paper store rooted at `dir`, per `config`.
    pub fn open(dir: PathBuf, config: StoreConfig) -> Result<Self, StoreError> {
        let storage = PagedStorage::open(dir.clone())?;
        let cache = RecordCache::new(config.max_cache_size, config.cache_clean_factor);
        let names = NameMapping::new(config.max_records_per_file);
        Ok(Self {
            storage,
            cache,
            names,
            mapping_path: dir.join(NAME_MAPPING_FILE),
        })
    }

    /// Records `paper_id`'s publication year.
    ///
    /// Allocates a fresh record if `paper_id` is unseen, completes a
    /// placeholder created by an earlier `add_citation`, or — if the
    /// record is already complete — warns and leaves it unchanged.
    pub fn add_paper(&mut self, paper_id: &str, year: u16) -> Result<PublishOutcome, StoreError> {
        match self.names.lookup(paper_id) {
            Some(rid) => {
                let rid = rid.to_string();
                let record = self.cache.get_or_load(&mut self.storage, &rid)?;
                if record.publication_year.is_some() {
                    warn!("duplicate publication for paper {paper_id}; ignoring");
                    return Ok(PublishOutcome::DuplicatePublication);
                }
                self.cache.with_mut(&rid, |record| {
                    record.publication_year = Some(year);
                });
                Ok(PublishOutcome::Updated)
            }
            None => {
                let rid = self.names.assign(paper_id).to_string();
                self.cache
                    .put(&mut self.storage, &rid, PaperRecord::complete(year))?;
                Ok(PublishOutcome::Inserted)
            }
        }
    }

    /// Increments `paper_id`'s citation count for `citing_year`,
    /// allocating a placeholder record if `paper_id` has not been seen
    /// before (it may be published later, or never).
    ///
    /// # Errors
    ///
    /// Returns a codec error if `citing_year` falls outside the valid
    /// `1..=9999` domain rather than allocating a record that can never
    /// be encoded.
    pub fn add_citation(&mut self, paper_id: &str, citing_year: u16) -> Result<(), StoreError> {
        codec::validate_year(citing_year)?;

        let rid = match self.names.lookup(paper_id) {
            Some(rid) => rid.to_string(),
            None => {
                let rid = self.names.assign(paper_id).to_string();
                self.cache
                    .put(&mut self.storage, &rid, PaperRecord::placeholder())?;
                rid
            }
        };

        self.cache.get_or_load(&mut self.storage, &rid)?;
        let year_key = format!("{citing_year:04}");
        self.cache.with_mut(&rid, |record| {
            *record.citations.entry(year_key).or_insert(0) += 1;
        });
        Ok(())
    }

    /// Returns the internal record id bound to `paper_id`, if any.
    pub fn get_paper_record_id(&self, paper_id: &str) -> Option<&str> {
        self.names.lookup(paper_id)
    }

    /// Flushes every resident cache entry to disk, then persists the
    /// name mapping. Must be called for a clean shutdown.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        self.cache.flush_all(&mut self.storage)?;
        self.names.persist(&self.mapping_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempdir::TempDir;

    use super::*;

    fn index() -> (TempDir, PaperIndex) {
        let temp = TempDir::new("paper_index").unwrap();
        let index = PaperIndex::open(temp.path().to_path_buf(), StoreConfig::default()).unwrap();
        (temp, index)
    }

    #[test]
    fn add_paper_on_unseen_id_inserts() {
        let (_temp, mut index) = index();
        let outcome = index.add_paper("p1", 2001).unwrap();
        assert_eq!(outcome, PublishOutcome::Inserted);
        assert!(index.get_paper_record_id("p1").is_some());
    }

    #[test]
    fn add_paper_twice_warns_and_leaves_record_unchanged() {
        let (_temp, mut index) = index();
        index.add_paper("p1", 2001).unwrap();
        let outcome = index.add_paper("p1", 2002).unwrap();
        assert_eq!(outcome, PublishOutcome::DuplicatePublication);
    }

    #[test]
    fn add_citation_before_add_paper_creates_placeholder_then_completes() {
        let (_temp, mut index) = index();
        index.add_citation("p1", 2005).unwrap();
        let outcome = index.add_paper("p1", 2001).unwrap();
        assert_eq!(outcome, PublishOutcome::Updated);
    }

    #[test]
    fn get_paper_record_id_is_stable_across_calls() {
        let (_temp, mut index) = index();
        index.add_paper("p1", 2001).unwrap();
        let rid_a = index.get_paper_record_id("p1").unwrap().to_string();
        let rid_b = index.get_paper_record_id("p1").unwrap().to_string();
        assert_eq!(rid_a, rid_b);
    }

    #[test]
    fn flush_persists_name_mapping_to_disk() {
        let temp = TempDir::new("paper_index").unwrap();
        let dir = temp.path().to_path_buf();
        let mut index = PaperIndex::open(dir.clone(), StoreConfig::default()).unwrap();

        index.add_paper("p1", 2001).unwrap();
        index.flush().unwrap();

        assert!(dir.join(NAME_MAPPING_FILE).exists());
    }

    #[test]
    fn repeated_citations_accumulate_on_the_same_year() {
        let (_temp, mut index) = index();
        index.add_citation("p1", 2005).unwrap();
        index.add_citation("p1", 2005).unwrap();
        index.add_citation("p1", 2006).unwrap();

        let rid = index.get_paper_record_id("p1").unwrap().to_string();
        index.flush().unwrap();

        let mut storage = PagedStorage::open(
            index
                .mapping_path
                .parent()
                .unwrap()
                .to_path_buf(),
        )
        .unwrap();
        let bytes = storage.read(&rid).unwrap();
        let record = super::super::codec::decode(&bytes).unwrap();
        assert_eq!(record.citations.get("2005"), Some(&2));
        assert_eq!(record.citations.get("2006"), Some(&1));
    }

    #[test]
    fn citation_year_below_1000_is_zero_padded_and_survives_flush() {
        let (_temp, mut index) = index();
        index.add_citation("p1", 800).unwrap();

        let rid = index.get_paper_record_id("p1").unwrap().to_string();
        index.flush().unwrap();

        let mut storage = PagedStorage::open(
            index.mapping_path.parent().unwrap().to_path_buf(),
        )
        .unwrap();
        let bytes = storage.read(&rid).unwrap();
        let record = super::super::codec::decode(&bytes).unwrap();
        assert_eq!(record.citations.get("0800"), Some(&1));
    }

    #[test]
    fn add_citation_rejects_year_outside_valid_domain() {
        let (_temp, mut index) = index();
        assert!(index.add_citation("p1", 0).is_err());
        assert!(index.add_citation("p2", 10_000).is_err());
    }
}
