//! File store for serialized records.
//!
//! One record per file, named by the record's output key plus the
//! format-specific extension, all inside a single output directory.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use bib3gpp_model::BibliographicRecord;

use crate::{bibxml, xml};

// ---------------------------------------------------------------------------
// Format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Xml,
    Yaml,
    BibXml,
}

impl Format {
    /// Storage extension. The leading `bib` of the format name is dropped,
    /// so citation files land as `.xml` too.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Xml | Self::BibXml => "xml",
            Self::Yaml => "yaml",
        }
    }

    pub fn serialize(&self, record: &BibliographicRecord) -> Result<String, StoreError> {
        match self {
            Self::Xml => xml::to_string(record).map_err(|e| StoreError::Encode(e.to_string())),
            Self::Yaml => {
                serde_yaml::to_string(record).map_err(|e| StoreError::Encode(e.to_string()))
            }
            Self::BibXml => {
                bibxml::to_string(record).map_err(|e| StoreError::Encode(e.to_string()))
            }
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xml => write!(f, "xml"),
            Self::Yaml => write!(f, "yaml"),
            Self::BibXml => write!(f, "bibxml"),
        }
    }
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "xml" => Ok(Self::Xml),
            "yaml" => Ok(Self::Yaml),
            "bibxml" => Ok(Self::BibXml),
            other => Err(format!("unknown format: {other} (expected xml, yaml, or bibxml)")),
        }
    }
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum StoreError {
    Io { path: PathBuf, message: String },
    Encode(String),
    Decode { path: PathBuf, message: String },
    /// Citation files cannot be deserialized; loading one is always an error.
    CitationReadBack(PathBuf),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, message } => write!(f, "{}: {message}", path.display()),
            Self::Encode(message) => write!(f, "encode error: {message}"),
            Self::Decode { path, message } => {
                write!(f, "cannot decode {}: {message}", path.display())
            }
            Self::CitationReadBack(path) => write!(
                f,
                "cannot read {} back: the citation format is write-only",
                path.display()
            ),
        }
    }
}

impl std::error::Error for StoreError {}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

pub struct Store {
    dir: PathBuf,
    format: Format,
}

impl Store {
    pub fn new(dir: impl Into<PathBuf>, format: Format) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn file_name(&self, record: &BibliographicRecord) -> String {
        format!("{}.{}", record.output_key(), self.format.extension())
    }

    pub fn path_for(&self, record: &BibliographicRecord) -> PathBuf {
        self.dir.join(self.file_name(record))
    }

    /// Serialize and write the record to its keyed path, creating the output
    /// directory on first use.
    pub fn write(&self, record: &BibliographicRecord) -> Result<PathBuf, StoreError> {
        let content = self.format.serialize(record)?;
        fs::create_dir_all(&self.dir).map_err(|e| StoreError::Io {
            path: self.dir.clone(),
            message: e.to_string(),
        })?;
        let path = self.path_for(record);
        fs::write(&path, content).map_err(|e| StoreError::Io {
            path: path.clone(),
            message: e.to_string(),
        })?;
        Ok(path)
    }

    /// Load a previously persisted record. Round-trip fidelity for links,
    /// dates, contributors, and relations is what the reconciliation engine
    /// relies on.
    pub fn load(&self, path: &Path) -> Result<BibliographicRecord, StoreError> {
        match self.format {
            Format::BibXml => Err(StoreError::CitationReadBack(path.to_path_buf())),
            Format::Xml | Format::Yaml => {
                let content = fs::read_to_string(path).map_err(|e| StoreError::Io {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                match self.format {
                    Format::Xml => xml::from_str(&content).map_err(|e| StoreError::Decode {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    }),
                    _ => serde_yaml::from_str(&content).map_err(|e| StoreError::Decode {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    }),
                }
            }
        }
    }

    /// Delete every regular file in the output directory (full-refresh runs).
    pub fn clear(&self) -> Result<usize, StoreError> {
        if !self.dir.exists() {
            return Ok(0);
        }
        let entries = fs::read_dir(&self.dir).map_err(|e| StoreError::Io {
            path: self.dir.clone(),
            message: e.to_string(),
        })?;
        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::Io {
                path: self.dir.clone(),
                message: e.to_string(),
            })?;
            let path = entry.path();
            if path.is_file() {
                fs::remove_file(&path).map_err(|e| StoreError::Io {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use bib3gpp_model::{BibDate, DateKind, TypedLink};
    use chrono::NaiveDate;

    fn record() -> BibliographicRecord {
        BibliographicRecord {
            docnumber: "TS 00.00:REL-99/1.0.0".into(),
            links: vec![TypedLink {
                kind: "src".into(),
                url: "http://example.com/v1".into(),
            }],
            dates: vec![BibDate {
                kind: DateKind::Created,
                on: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            }],
            ..BibliographicRecord::default()
        }
    }

    #[test]
    fn format_extension_strips_bib_prefix() {
        assert_eq!(Format::Xml.extension(), "xml");
        assert_eq!(Format::Yaml.extension(), "yaml");
        assert_eq!(Format::BibXml.extension(), "xml");
    }

    #[test]
    fn format_parses_from_str() {
        assert_eq!("yaml".parse::<Format>().unwrap(), Format::Yaml);
        assert_eq!("bibxml".parse::<Format>().unwrap(), Format::BibXml);
        assert!("toml".parse::<Format>().is_err());
    }

    #[test]
    fn yaml_write_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path(), Format::Yaml);
        let original = record();

        let path = store.write(&original).unwrap();
        assert_eq!(path.file_name().unwrap(), "TS_00.00_REL-99_1.0.0.yaml");
        let loaded = store.load(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn xml_write_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path(), Format::Xml);
        let original = record();

        let path = store.write(&original).unwrap();
        assert_eq!(path.file_name().unwrap(), "TS_00.00_REL-99_1.0.0.xml");
        let loaded = store.load(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn bibxml_load_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path(), Format::BibXml);
        let path = store.write(&record()).unwrap();
        assert_eq!(path.file_name().unwrap(), "TS_00.00_REL-99_1.0.0.xml");

        let err = store.load(&path).unwrap_err();
        assert!(matches!(err, StoreError::CitationReadBack(_)));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path(), Format::Yaml);
        let err = store.load(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    fn clear_removes_written_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path(), Format::Yaml);
        store.write(&record()).unwrap();

        assert_eq!(store.clear().unwrap(), 1);
        assert_eq!(store.clear().unwrap(), 0);
    }
}
