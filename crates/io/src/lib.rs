//! `bib3gpp-io` — serialization codecs, the record store, and the index.
//!
//! Records persist as `<OUTPUT_KEY>.<ext>` files in one output directory,
//! next to an `index.yaml` mapping document numbers to file names. XML and
//! YAML round-trip; BibXML citations are write-only.

pub mod bibxml;
pub mod index;
pub mod store;
pub mod xml;

pub use index::{Index, IndexEntry, INDEX_FILE};
pub use store::{Format, Store, StoreError};
