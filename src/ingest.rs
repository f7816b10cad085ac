//! Dataset ingester: the line-oriented driver that turns NDJSON
//! bibliographic records into calls against the Paper Index and Author
//! Index.
//!
//! Grounded in the original prototype's `main.py`: one JSON object per
//! line, a malformed line is logged and skipped rather than aborting the
//! run, and multiple dataset files are processed back to back against
//! the same store with no state reset between them.
use std::{
    collections::HashSet,
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use log::{info, warn};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    author::AuthorIndex,
    storage::{PaperIndex, StoreError},
};

const AUTHOR_INDEX_FILE: &str = "authors.json";

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("paper store error: {0}")]
    Store(#[from] StoreError),

    #[error("failed to persist author index: {0}")]
    AuthorIndexIo(#[from] crate::storage::PagerError),
}

/// One bibliographic record as it appears in the NDJSON dataset.
#[derive(Debug, Deserialize)]
struct DatasetRecord {
    id: String,
    #[serde(default)]
    authors: Vec<String>,
    #[serde(deserialize_with = "year_from_int_or_string")]
    year: u16,
    #[serde(default)]
    references: Vec<String>,
}

fn year_from_int_or_string<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum YearField {
        Int(u16),
        Text(String),
    }

    match YearField::deserialize(deserializer)? {
        YearField::Int(year) => Ok(year),
        YearField::Text(text) => text.parse().map_err(serde::de::Error::custom),
    }
}

/// Processes `paths` in order against `paper_index` and `author_index`,
/// then flushes both to `storage_dir`. Each path is read line by line;
/// a line that fails to parse is logged and skipped without aborting
/// the run.
pub fn ingest_dataset(
    storage_dir: &Path,
    paper_index: &mut PaperIndex,
    author_index: &mut AuthorIndex,
    paths: &[PathBuf],
) -> Result<(), IngestError> {
    for path in paths {
        info!("ingesting dataset file {}", path.display());
        process_dataset_file(path, paper_index, author_index)?;
    }

    paper_index.flush()?;
    author_index.store(&storage_dir.join(AUTHOR_INDEX_FILE))?;
    Ok(())
}

fn process_dataset_file(
    path: &Path,
    paper_index: &mut PaperIndex,
    author_index: &mut AuthorIndex,
) -> Result<(), IngestError> {
    let file = File::open(path).map_err(|e| IngestError::Store(StoreError::Pager(e.into())))?;
    let reader = BufReader::new(file);

    for (line_number, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(
                    "{}:{}: failed to read line: {e}",
                    path.display(),
                    line_number + 1
                );
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<DatasetRecord>(&line) {
            Ok(record) => process_record(record, paper_index, author_index)?,
            Err(e) => {
                warn!(
                    "{}:{}: skipping malformed record: {e}",
                    path.display(),
                    line_number + 1
                );
            }
        }
    }

    Ok(())
}

fn process_record(
    record: DatasetRecord,
    paper_index: &mut PaperIndex,
    author_index: &mut AuthorIndex,
) -> Result<(), IngestError> {
    paper_index.add_paper(&record.id, record.year)?;

    for reference in &record.references {
        paper_index.add_citation(reference, record.year)?;
    }

    let rid = paper_index
        .get_paper_record_id(&record.id)
        .expect("just added above")
        .to_string();

    let unique_authors: Vec<String> = {
        let mut seen = HashSet::new();
        record
            .authors
            .into_iter()
            .filter(|author| seen.insert(author.clone()))
            .collect()
    };

    for author in &unique_authors {
        let co_authors = unique_authors
            .iter()
            .filter(|other| *other != author)
            .cloned();
        author_index.add_author_publication(author, &rid, co_authors);
    }

    Ok(())
}
