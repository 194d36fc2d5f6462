use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::contributor::Contributor;
use crate::release::Release;

/// Document types carried by the source database.
pub const DOCTYPES: [&str; 2] = ["TS", "TR"];

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One version of a specification document.
///
/// Created fresh per ingested source row and never mutated by the parser
/// afterwards. The reconciliation engine may mutate a record in place (link
/// backfill, relation transplantation, contributor addition) before it is
/// persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BibliographicRecord {
    /// Canonical human-readable identifier: type + spec number + release +
    /// version, e.g. `TS 00.00:REL-99/1.0.0`. Stable and unique per document
    /// version within one ingestion run.
    pub docnumber: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub docid: Vec<DocIdentifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "abstract", default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DocStatus>,
    #[serde(rename = "link", default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<TypedLink>,
    /// Ordered; only the first entry participates in reconciliation, so the
    /// parser must place the most relevant date first.
    #[serde(rename = "date", default, skip_serializing_if = "Vec::is_empty")]
    pub dates: Vec<BibDate>,
    /// Ordered; first entry is conventionally the standards organization.
    #[serde(rename = "contributor", default, skip_serializing_if = "Vec::is_empty")]
    pub contributors: Vec<Contributor>,
    #[serde(rename = "relation", default, skip_serializing_if = "Vec::is_empty")]
    pub relations: Vec<Relation>,
    #[serde(rename = "editorialgroup", default, skip_serializing_if = "Vec::is_empty")]
    pub editorial_group: Vec<WorkGroup>,
    #[serde(rename = "radiotechnology", default, skip_serializing_if = "Option::is_none")]
    pub radio_technology: Option<RadioTechnology>,
    #[serde(rename = "common-ims-spec", default, skip_serializing_if = "std::ops::Not::not")]
    pub common_ims_spec: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<Release>,
    #[serde(rename = "note", default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<BiblioNote>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetched: Option<NaiveDate>,
}

impl BibliographicRecord {
    /// Filesystem-safe storage key derived from the document number.
    pub fn output_key(&self) -> String {
        derive_output_key(&self.docnumber)
    }
}

/// Collapse every run of whitespace, `,`, `:`, `/`, or `_` to a single
/// underscore and uppercase the rest: `TS 00.00:REL-99/1.0.0` becomes
/// `TS_00.00_REL-99_1.0.0`.
pub fn derive_output_key(docnumber: &str) -> String {
    let mut key = String::with_capacity(docnumber.len());
    let mut in_separator = false;
    for c in docnumber.chars() {
        if c.is_whitespace() || matches!(c, ',' | ':' | '/' | '_') {
            if !in_separator {
                key.push('_');
                in_separator = true;
            }
        } else {
            key.extend(c.to_uppercase());
            in_separator = false;
        }
    }
    key
}

// ---------------------------------------------------------------------------
// Sub-entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocIdentifier {
    #[serde(rename = "type")]
    pub scheme: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedLink {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "content")]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BibDate {
    #[serde(rename = "type")]
    pub kind: DateKind,
    pub on: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateKind {
    Created,
    Published,
    Confirmed,
}

impl fmt::Display for DateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Published => write!(f, "published"),
            Self::Confirmed => write!(f, "confirmed"),
        }
    }
}

impl std::str::FromStr for DateKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "published" => Ok(Self::Published),
            "confirmed" => Ok(Self::Confirmed),
            other => Err(format!("unknown date type: {other}")),
        }
    }
}

/// Lineage edge to another record. The only kind produced by reconciliation
/// is [`Relation::ADOPTED_AS`]; stored data may carry others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "bibitem")]
    pub record: Box<BibliographicRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Relation {
    pub const ADOPTED_AS: &'static str = "adoptedAs";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocStatus {
    pub stage: Stage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Published,
    Withdrawn,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Published => write!(f, "published"),
            Self::Withdrawn => write!(f, "withdrawn"),
        }
    }
}

impl std::str::FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "published" => Ok(Self::Published),
            "withdrawn" => Ok(Self::Withdrawn),
            other => Err(format!("unknown status stage: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkGroup {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: WorkGroupKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkGroupKind {
    Prime,
    Other,
    Former,
}

impl fmt::Display for WorkGroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prime => write!(f, "prime"),
            Self::Other => write!(f, "other"),
            Self::Former => write!(f, "former"),
        }
    }
}

impl std::str::FromStr for WorkGroupKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prime" => Ok(Self::Prime),
            "other" => Ok(Self::Other),
            "former" => Ok(Self::Former),
            other => Err(format!("unknown workgroup type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RadioTechnology {
    #[serde(rename = "2G")]
    G2,
    #[serde(rename = "3G")]
    G3,
    #[serde(rename = "LTE")]
    Lte,
    #[serde(rename = "5G")]
    G5,
}

impl fmt::Display for RadioTechnology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::G2 => write!(f, "2G"),
            Self::G3 => write!(f, "3G"),
            Self::Lte => write!(f, "LTE"),
            Self::G5 => write!(f, "5G"),
        }
    }
}

impl std::str::FromStr for RadioTechnology {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "2G" => Ok(Self::G2),
            "3G" => Ok(Self::G3),
            "LTE" => Ok(Self::Lte),
            "5G" => Ok(Self::G5),
            other => Err(format!("unknown radio technology: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiblioNote {
    #[serde(rename = "type")]
    pub kind: NoteKind,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    Remark,
    Comment,
}

impl fmt::Display for NoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remark => write!(f, "remark"),
            Self::Comment => write!(f, "comment"),
        }
    }
}

impl std::str::FromStr for NoteKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "remark" => Ok(Self::Remark),
            "comment" => Ok(Self::Comment),
            other => Err(format!("unknown note type: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
