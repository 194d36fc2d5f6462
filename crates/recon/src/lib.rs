//! `bib3gpp-recon` — record reconciliation engine.
//!
//! Pure engine crate: decides how to combine a newly parsed record with a
//! previously persisted record sharing the same output key, without losing
//! information. No IO dependencies; the ingestion driver owns persistence.

mod merge;

pub use merge::{add_contributors, merge, resolve_temporal_relation, update_links, Role};
