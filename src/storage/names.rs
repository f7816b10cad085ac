//! External paper id to internal record id mapping.
//!
//! [`NameMapping`] allocates a monotonically increasing, never-reused
//! internal record id (an "rid") for each external paper id the first
//! time it is seen, and never relinquishes the binding afterwards.
//!
//! # Allocation policy
//!
//! A cursor `(cur_file, cur_slot)` tracks the next rid to hand out.
//! `assign` emits `"{cur_file}_{cur_slot:0width$}"`, where `width` is the
//! decimal digit width of `max_records_per_file`, then advances the
//! cursor — incrementing `cur_slot`, rolling over into the next file once
//! `cur_slot` reaches `max_records_per_file`.
//!
//! # Persistence
//!
//! The mapping is serialised as a single JSON object (external id to rid
//! string) at shutdown only; it is never read back in. Warm-start is out
//! of scope.
use std::{collections::HashMap, fs::File, io::BufWriter, path::Path};

use log::debug;
use serde::Serialize;

use super::PagerError;

/// External-id-to-rid mapping with monotonic allocation.
#[derive(Debug, Default)]
pub struct NameMapping {
    bindings: HashMap<String, String>,
    record_index_width: usize,
    max_records_per_file: usize,
    cur_file: usize,
    cur_slot: usize,
}

impl NameMapping {
    /// Creates an empty mapping. `max_records_per_file` governs both the
    /// zero-padding width of a slot and the file rollover point.
    pub fn new(max_records_per_file: usize) -> Self {
        Self {
            bindings: HashMap::new(),
            record_index_width: max_records_per_file.to_string().len(),
            max_records_per_file,
            cur_file: 0,
            cur_slot: 0,
        }
    }

    /// Returns the rid already bound to `paper_id`, if any.
    pub fn lookup(&self, paper_id: &str) -> Option<&str> {
        self.bindings.get(paper_id).map(String::as_str)
    }

    /// Allocates the next rid in insertion order and binds it to
    /// `paper_id`.
    ///
    /// # Panics
    ///
    /// Panics if `paper_id` is already bound — callers must `lookup`
    /// first; an already-bound id reaching `assign` is a caller bug.
    pub fn assign(&mut self, paper_id: &str) -> &str {
        assert!(
            !self.bindings.contains_key(paper_id),
            "paper id {paper_id:?} is already bound to a record id"
        );

        let rid = format!(
            "{}_{:0width$}",
            self.cur_file,
            self.cur_slot,
            width = self.record_index_width
        );

        self.cur_slot += 1;
        if self.cur_slot >= self.max_records_per_file {
            self.cur_slot = 0;
            self.cur_file += 1;
        }

        self.bindings.insert(paper_id.to_string(), rid);
        debug!("assigned rid to paper {paper_id}");
        self.bindings.get(paper_id).map(String::as_str).unwrap()
    }

    /// Number of bindings currently held.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Writes the mapping as a single JSON object to `path`.
    pub fn persist(&self, path: &Path) -> Result<(), PagerError> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &Bindings(&self.bindings))
            .map_err(|e| PagerError::Io(e.into()))?;
        Ok(())
    }
}

struct Bindings<'a>(&'a HashMap<String, String>);

impl Serialize for Bindings<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use tempdir::TempDir;

    use super::*;

    #[test]
    fn assign_allocates_monotonically() {
        let mut names = NameMapping::new(3);

        assert_eq!(names.assign("a"), "0_0");
        assert_eq!(names.assign("b"), "0_1");
        assert_eq!(names.assign("c"), "0_2");
        assert_eq!(names.assign("d"), "1_0");
    }

    #[test]
    fn lookup_is_stable_after_assignment() {
        let mut names = NameMapping::new(250_000);
        let rid = names.assign("paper-1").to_string();

        assert_eq!(names.lookup("paper-1"), Some(rid.as_str()));
        assert_eq!(names.lookup("unknown"), None);
    }

    #[test]
    #[should_panic(expected = "already bound")]
    fn assign_twice_panics() {
        let mut names = NameMapping::new(250_000);
        names.assign("paper-1");
        names.assign("paper-1");
    }

    #[test]
    fn slot_is_zero_padded_to_file_capacity_width() {
        let mut names = NameMapping::new(250_000);
        assert_eq!(names.assign("a"), "0_000000");
    }

    #[test]
    fn persist_writes_external_id_to_rid_json() {
        let temp = TempDir::new("names").unwrap();
        let path = temp.path().join("papers_name_mapping.json");

        let mut names = NameMapping::new(250_000);
        let rid = names.assign("paper-1").to_string();
        names.persist(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let parsed: HashMap<String, String> = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed.get("paper-1"), Some(&rid));
    }
}
