//! `bib3gpp-fetch` — retrieval, row parsing, ingestion, and remote lookup.
//!
//! One batch run retrieves the current database export, parses each row into
//! a record, and persists it, deferring to the reconciliation engine when a
//! row collides with an already-emitted output key. `lookup` resolves single
//! references against the published data repository instead.

pub mod driver;
pub mod error;
pub mod lookup;
pub mod parser;
pub mod source;

pub use driver::{DataFetcher, RowOutcome, RunSummary};
pub use error::FetchError;
pub use lookup::{Repository, DEFAULT_REPO};
pub use source::{SourceClient, DEFAULT_SOURCE};
