//! citeidx: a paged, fixed-width paper store with a bounded
//! write-through cache, plus the author index and dataset ingester
//! that drive it.
//!
//! # See Also
//! - [`storage`]: the paper store — codec, pager, name mapping, cache,
//!   facade.
//! - [`author`]: the author index.
//! - [`ingest`]: the NDJSON dataset driver.
//! - [`config`]: deployment-tunable store parameters.
pub mod author;
pub mod config;
pub mod ingest;
pub mod storage;

pub use author::AuthorIndex;
pub use config::StoreConfig;
pub use ingest::{IngestError, ingest_dataset};
pub use storage::{PaperIndex, PublishOutcome, StoreError};
