//! `bib3gpp-model` — the bibliographic record model.
//!
//! Pure data crate: the record, its sub-entities, and the output-key
//! derivation. No IO, no network. Everything is serde-derived so YAML
//! round-trips are structural identities.

pub mod contributor;
pub mod record;
pub mod release;

pub use contributor::{Contributor, Entity, Organization, Person};
pub use record::{
    derive_output_key, BibDate, BiblioNote, BibliographicRecord, DateKind, DocIdentifier,
    DocStatus, NoteKind, RadioTechnology, Relation, Stage, TypedLink, WorkGroup, WorkGroupKind,
    DOCTYPES,
};
pub use release::Release;
