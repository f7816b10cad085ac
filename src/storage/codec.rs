//! Fixed-width binary layout for a single paper record.
//!
//! This module defines the [`PaperRecord`] struct — a paper's optional
//! publication year plus its citation histogram by year — and the
//! bijection between it and the fixed-width ASCII byte string stored on
//! disk by the [`pager`](super::pager).
//!
//! # Layout
//!
//! ```text
//! [year: 4 digits]['#'][ (year: 4 digits)(count: 4 digits, '#'-padded) ]*K ['#']
//! ```
//!
//! `K` citation slots follow the publication year and separator; unused
//! slots, and unused digits within a used slot's counter, are filled with
//! `'#'`. The terminator byte is always `'#'`. With the canonical
//! constants (`YEAR_WIDTH = 4`, `COUNT_WIDTH = 4`, `CITATION_YEAR_CAPACITY
//! = 60`), `RECORD_LENGTH` is 486 bytes.
//!
//! # Lossiness
//!
//! Encoding is a bijection up to histogram order for any record with at
//! most `CITATION_YEAR_CAPACITY` distinct citation years. A record with
//! more distinct years than that is encoded lossily: the oldest years are
//! dropped, keeping the `CITATION_YEAR_CAPACITY` most recent. Callers
//! that need to know whether truncation happened should use
//! [`encode_lossy`], which reports the dropped count alongside the bytes.
use std::collections::HashMap;

use super::CodecError;

/// Width, in ASCII digits, of an encoded year field.
pub const YEAR_WIDTH: usize = 4;
/// Width, in ASCII digits, of an encoded citation counter field.
pub const COUNT_WIDTH: usize = 4;
/// Maximum number of distinct citation years retained per record.
pub const CITATION_YEAR_CAPACITY: usize = 60;

/// Total on-disk width of one encoded record, in bytes.
pub const RECORD_LENGTH: usize =
    YEAR_WIDTH + 1 + CITATION_YEAR_CAPACITY * (YEAR_WIDTH + COUNT_WIDTH) + 1;

const FILL: u8 = b'#';

const SEPARATOR_OFFSET: usize = YEAR_WIDTH;
const CITATIONS_OFFSET: usize = SEPARATOR_OFFSET + 1;
const SLOT_WIDTH: usize = YEAR_WIDTH + COUNT_WIDTH;

/// A paper's publication year (if known) and citation histogram.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PaperRecord {
    /// `None` means this is a placeholder: a record created by
    /// `add_citation` on a paper id that has not yet had `add_paper`
    /// called on it.
    pub publication_year: Option<u16>,
    /// Year string (4 ASCII digits, e.g. `"2012"`) to citation count.
    pub citations: HashMap<String, u32>,
}

impl PaperRecord {
    pub fn placeholder() -> Self {
        Self::default()
    }

    pub fn complete(year: u16) -> Self {
        Self {
            publication_year: Some(year),
            citations: HashMap::new(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.publication_year.is_none()
    }
}

/// Checks that `year` falls within the valid publication/citation-year
/// domain `1..=9999` — the only range representable by the codec's
/// 4-digit, `0000`-reserved-for-`None` year fields.
pub fn validate_year(year: u16) -> Result<(), CodecError> {
    if year == 0 || year > 9999 {
        return Err(CodecError::Malformed {
            offset: 0,
            reason: format!("year {year} outside the valid domain 1..=9999"),
        });
    }
    Ok(())
}

/// Encodes `record`, dropping the oldest citation years beyond
/// [`CITATION_YEAR_CAPACITY`] if necessary.
///
/// # Errors
///
/// Returns [`CodecError::CounterOverflow`] if any citation count needs
/// more than [`COUNT_WIDTH`] decimal digits to represent.
pub fn encode(record: &PaperRecord) -> Result<[u8; RECORD_LENGTH], CodecError> {
    Ok(encode_lossy(record)?.0)
}

/// As [`encode`], but also reports how many of the oldest citation years
/// were dropped to fit within [`CITATION_YEAR_CAPACITY`].
pub fn encode_lossy(record: &PaperRecord) -> Result<([u8; RECORD_LENGTH], usize), CodecError> {
    let mut buf = [FILL; RECORD_LENGTH];

    match record.publication_year {
        Some(year) => {
            validate_year(year)?;
            let digits = format!("{year:0width$}", width = YEAR_WIDTH);
            buf[0..YEAR_WIDTH].copy_from_slice(digits.as_bytes());
        }
        None => buf[0..YEAR_WIDTH].copy_from_slice(b"0000"),
    }
    buf[SEPARATOR_OFFSET] = FILL;

    let mut years: Vec<&String> = record.citations.keys().collect();
    years.sort_unstable_by(|a, b| b.cmp(a));

    let dropped = years.len().saturating_sub(CITATION_YEAR_CAPACITY);
    let kept = &years[..years.len().min(CITATION_YEAR_CAPACITY)];

    for (slot, year) in kept.iter().enumerate() {
        let count = record.citations[*year];
        let count_str = count.to_string();
        if count_str.len() > COUNT_WIDTH {
            return Err(CodecError::CounterOverflow {
                year: (*year).clone(),
                count,
            });
        }

        let offset = CITATIONS_OFFSET + slot * SLOT_WIDTH;
        buf[offset..offset + YEAR_WIDTH].copy_from_slice(year.as_bytes());

        let count_offset = offset + YEAR_WIDTH;
        let pad = COUNT_WIDTH - count_str.len();
        for i in 0..pad {
            buf[count_offset + i] = FILL;
        }
        buf[count_offset + pad..count_offset + COUNT_WIDTH].copy_from_slice(count_str.as_bytes());
    }

    Ok((buf, dropped))
}

/// Decodes a fixed-width record buffer into a [`PaperRecord`].
///
/// # Errors
///
/// Returns [`CodecError::Malformed`] if a year or count field outside the
/// `'#'` padding convention contains a non-digit byte.
pub fn decode(bytes: &[u8; RECORD_LENGTH]) -> Result<PaperRecord, CodecError> {
    let year_digits = std::str::from_utf8(&bytes[0..YEAR_WIDTH]).map_err(|_| CodecError::Malformed {
        offset: 0,
        reason: "publication year is not valid UTF-8".to_string(),
    })?;
    let year_value: u16 = year_digits.parse().map_err(|_| CodecError::Malformed {
        offset: 0,
        reason: format!("publication year {year_digits:?} is not a 4-digit integer"),
    })?;
    let publication_year = if year_value == 0 { None } else { Some(year_value) };

    let mut citations = HashMap::new();
    for slot in 0..CITATION_YEAR_CAPACITY {
        let offset = CITATIONS_OFFSET + slot * SLOT_WIDTH;
        if bytes[offset] == FILL {
            break;
        }

        let year = std::str::from_utf8(&bytes[offset..offset + YEAR_WIDTH])
            .map_err(|_| CodecError::Malformed {
                offset,
                reason: "citation year is not valid UTF-8".to_string(),
            })?
            .to_string();
        if !year.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CodecError::Malformed {
                offset,
                reason: format!("citation year {year:?} contains a non-digit byte"),
            });
        }

        let count_offset = offset + YEAR_WIDTH;
        let count_field = std::str::from_utf8(&bytes[count_offset..count_offset + COUNT_WIDTH])
            .map_err(|_| CodecError::Malformed {
                offset: count_offset,
                reason: "citation count is not valid UTF-8".to_string(),
            })?;
        let trimmed = count_field.trim_start_matches(FILL as char);
        let count: u32 = trimmed.parse().map_err(|_| CodecError::Malformed {
            offset: count_offset,
            reason: format!("citation count {count_field:?} is not a valid integer"),
        })?;

        citations.insert(year, count);
    }

    Ok(PaperRecord {
        publication_year,
        citations,
    })
}
