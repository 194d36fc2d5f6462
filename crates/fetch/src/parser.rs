//! Row parser: one joined CSV row → one bibliographic record.
//!
//! The export is the flat join of the per-version status table with its
//! spec, spec-release, and release reference tables, so every row carries
//! all columns. Pure, stateless mapping; rows whose reference-table linkage
//! is missing map to `None` and are skipped silently by the driver.

use std::collections::HashMap;

use chrono::NaiveDate;

use bib3gpp_model::{
    BibDate, BiblioNote, BibliographicRecord, Contributor, DateKind, DocIdentifier, DocStatus,
    NoteKind, Organization, Person, RadioTechnology, Release, Stage, TypedLink, WorkGroup,
    WorkGroupKind, DOCTYPES,
};

use crate::error::FetchError;

pub const PUBLISHER_NAME: &str = "3rd Generation Partnership Project";
pub const PUBLISHER_ABBREV: &str = "3GPP";

// ── Column access ───────────────────────────────────────────────────

/// Header-index map for the export's columns.
pub struct Columns {
    index: HashMap<String, usize>,
}

impl Columns {
    pub fn from_headers(headers: &csv::StringRecord) -> Self {
        let mut index = HashMap::new();
        for (i, name) in headers.iter().enumerate() {
            // The export starts with a UTF-8 BOM; strip it off the first header.
            index.insert(name.trim_start_matches('\u{feff}').trim().to_string(), i);
        }
        Self { index }
    }

    /// Trimmed, non-empty cell value for a named column.
    fn get<'a>(&self, row: &'a csv::StringRecord, name: &str) -> Option<&'a str> {
        let i = *self.index.get(name)?;
        let value = row.get(i)?.trim();
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }

    fn flag(&self, row: &csv::StringRecord, name: &str) -> bool {
        self.get(row, name) == Some("1")
    }
}

// ── Parse ───────────────────────────────────────────────────────────

/// Parse one row. `Ok(None)` means the row has no spec linkage or no
/// version GUID and carries no document.
pub fn parse(
    columns: &Columns,
    row: &csv::StringRecord,
) -> Result<Option<BibliographicRecord>, FetchError> {
    if columns.get(row, "Number").is_none() || columns.get(row, "3guId").is_none() {
        return Ok(None);
    }

    let doctype = columns.get(row, "Type").unwrap_or_default().to_string();
    if !doctype.is_empty() && !DOCTYPES.contains(&doctype.as_str()) {
        eprintln!("warning: unknown doctype `{doctype}`, expected one of {DOCTYPES:?}");
    }
    let docnumber = docnumber(columns, row);

    let record = BibliographicRecord {
        docnumber: docnumber.clone(),
        docid: parse_docid(columns, row, &docnumber),
        title: columns.get(row, "Title").map(str::to_string),
        abstract_text: columns.get(row, "description").map(str::to_string),
        doctype: (!doctype.is_empty()).then_some(doctype),
        status: parse_status(columns, row),
        links: parse_links(columns, row),
        dates: parse_dates(columns, row)?,
        contributors: parse_contributors(columns, row),
        editorial_group: parse_editorial_group(columns, row),
        radio_technology: parse_radio_technology(columns, row),
        common_ims_spec: columns.flag(row, "ComIMS"),
        release: parse_release(columns, row)?,
        notes: parse_notes(columns, row),
        fetched: Some(chrono::Local::now().date_naive()),
        ..BibliographicRecord::default()
    };

    Ok(Some(record))
}

/// `{Type} {spec}:{release}/{major}.{technical}.{editorial}`.
fn docnumber(columns: &Columns, row: &csv::StringRecord) -> String {
    format!(
        "{} {}:{}/{}",
        columns.get(row, "Type").unwrap_or_default(),
        columns.get(row, "spec").unwrap_or_default(),
        columns.get(row, "release").unwrap_or_default(),
        version(columns, row),
    )
}

fn version(columns: &Columns, row: &csv::StringRecord) -> String {
    format!(
        "{}.{}.{}",
        columns.get(row, "MAJOR_VERSION_NB").unwrap_or_default(),
        columns.get(row, "TECHNICAL_VERSION_NB").unwrap_or_default(),
        columns.get(row, "EDITORIAL_VERSION_NB").unwrap_or_default(),
    )
}

/// Identifying fields for row-level failure logging.
pub fn row_ident(columns: &Columns, row: &csv::StringRecord) -> String {
    format!(
        "{}:{}/{}",
        columns.get(row, "spec").unwrap_or_default(),
        columns.get(row, "release").unwrap_or_default(),
        version(columns, row),
    )
}

fn parse_docid(columns: &Columns, row: &csv::StringRecord, docnumber: &str) -> Vec<DocIdentifier> {
    let mut docid = vec![DocIdentifier {
        scheme: "3GPP".into(),
        id: format!("3GPP {docnumber}"),
    }];
    if let Some(id) = columns.get(row, "rapporteur id") {
        docid.push(DocIdentifier {
            scheme: "rapporteurId".into(),
            id: id.to_string(),
        });
    }
    docid
}

fn parse_links(columns: &Columns, row: &csv::StringRecord) -> Vec<TypedLink> {
    match columns.get(row, "location") {
        // The location cell is an HTML-style composite; the URL is the
        // fragment after the last `#`.
        Some(location) => vec![TypedLink {
            kind: "src".into(),
            url: location.rsplit('#').next().unwrap_or(location).to_string(),
        }],
        None => Vec::new(),
    }
}

/// `completed` first (the date reconciliation keys on), `title verified`
/// after.
fn parse_dates(columns: &Columns, row: &csv::StringRecord) -> Result<Vec<BibDate>, FetchError> {
    let mut dates = Vec::new();
    if let Some(completed) = columns.get(row, "completed") {
        dates.push(BibDate {
            kind: DateKind::Created,
            on: parse_date(completed)?,
        });
    }
    if let Some(verified) = columns.get(row, "title verified") {
        dates.push(BibDate {
            kind: DateKind::Confirmed,
            on: parse_date(verified)?,
        });
    }
    Ok(dates)
}

fn parse_contributors(columns: &Columns, row: &csv::StringRecord) -> Vec<Contributor> {
    let mut contributors = vec![Contributor::organization(
        Organization {
            name: PUBLISHER_NAME.into(),
            abbreviation: Some(PUBLISHER_ABBREV.into()),
        },
        "publisher",
    )];
    if let Some(name) = columns.get(row, "rapporteur") {
        let affiliations = columns
            .get(row, "rapporteur company")
            .map(|company| {
                vec![Organization {
                    name: company.to_string(),
                    abbreviation: None,
                }]
            })
            .unwrap_or_default();
        contributors.push(Contributor::person(
            Person {
                name: name.to_string(),
                affiliations,
            },
            "author",
        ));
    }
    contributors
}

fn parse_status(columns: &Columns, row: &csv::StringRecord) -> Option<DocStatus> {
    if columns.flag(row, "withdrawn") {
        Some(DocStatus {
            stage: Stage::Withdrawn,
        })
    } else if columns.flag(row, "For publication") {
        Some(DocStatus {
            stage: Stage::Published,
        })
    } else {
        None
    }
}

fn parse_radio_technology(columns: &Columns, row: &csv::StringRecord) -> Option<RadioTechnology> {
    if columns.flag(row, "2g") {
        Some(RadioTechnology::G2)
    } else if columns.flag(row, "3g") {
        Some(RadioTechnology::G3)
    } else if columns.flag(row, "LTE") {
        Some(RadioTechnology::Lte)
    } else if columns.flag(row, "5G") {
        Some(RadioTechnology::G5)
    } else {
        None
    }
}

fn parse_editorial_group(columns: &Columns, row: &csv::StringRecord) -> Vec<WorkGroup> {
    let mut groups = Vec::new();
    if let Some(name) = columns.get(row, "WG prime") {
        groups.push(WorkGroup {
            name: name.to_string(),
            kind: WorkGroupKind::Prime,
        });
    }
    if let Some(name) = columns.get(row, "WG other") {
        groups.push(WorkGroup {
            name: name.to_string(),
            kind: WorkGroupKind::Other,
        });
    }
    if let Some(name) = columns.get(row, "former WG") {
        groups.push(WorkGroup {
            name: name.to_string(),
            kind: WorkGroupKind::Former,
        });
    }
    groups
}

fn parse_notes(columns: &Columns, row: &csv::StringRecord) -> Vec<BiblioNote> {
    let mut notes = Vec::new();
    if let Some(remarks) = columns.get(row, "remarks") {
        notes.push(BiblioNote {
            kind: NoteKind::Remark,
            content: remarks.to_string(),
        });
    }
    if let Some(comment) = columns.get(row, "comment") {
        notes.push(BiblioNote {
            kind: NoteKind::Comment,
            content: comment.to_string(),
        });
    }
    notes
}

fn parse_release(
    columns: &Columns,
    row: &csv::StringRecord,
) -> Result<Option<Release>, FetchError> {
    // The release reference table joined on Release_code; no code means the
    // join produced nothing.
    if columns.get(row, "Release_code").is_none() {
        return Ok(None);
    }
    let mut release = Release {
        version2g: columns.get(row, "version_2g").map(str::to_string),
        version3g: columns.get(row, "version_3g").map(str::to_string),
        defunct: columns.flag(row, "defunct"),
        wpm_code_2g: columns.get(row, "wpm_code_2g").map(str::to_string),
        wpm_code_3g: columns.get(row, "wpm_code_3g").map(str::to_string),
        freeze_meeting: columns.get(row, "freeze meeting").map(str::to_string),
        freeze_stage1_meeting: columns.get(row, "Stage1_freeze").map(str::to_string),
        freeze_stage2_meeting: columns.get(row, "Stage2_freeze").map(str::to_string),
        freeze_stage3_meeting: columns.get(row, "Stage3_freeze").map(str::to_string),
        close_meeting: columns.get(row, "Closed").map(str::to_string),
        ..Release::default()
    };
    if let Some(start) = columns.get(row, "rel-proj-start") {
        release.project_start = Some(parse_date(start)?);
    }
    if let Some(end) = columns.get(row, "rel-proj-end") {
        release.project_end = Some(parse_date(end)?);
    }
    Ok(Some(release))
}

/// The export mixes ISO and day-first date spellings.
fn parse_date(value: &str) -> Result<NaiveDate, FetchError> {
    for format in ["%Y-%m-%d", "%d/%m/%Y", "%d/%m/%y"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Ok(date);
        }
    }
    Err(FetchError::Row(format!("cannot parse date '{value}'")))
}

// ── Tests ───────────────────────────────────────────────────────────
