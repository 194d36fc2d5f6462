//! Single-record lookup from the published data repository.
//!
//! The repository is a raw HTTPS file host carrying the same `index.yaml`
//! and per-record YAML files an ingestion run produces.

use std::time::Duration;

use bib3gpp_io::{Index, INDEX_FILE};
use bib3gpp_model::BibliographicRecord;

use crate::error::FetchError;

pub const DEFAULT_REPO: &str = "https://raw.githubusercontent.com/bib3gpp/bib3gpp-data/main/";

const REQUEST_TIMEOUT_SECS: u64 = 15;
const USER_AGENT: &str = concat!("bib3gpp/", env!("CARGO_PKG_VERSION"));

pub struct Repository {
    base: String,
    http: reqwest::blocking::Client,
}

impl Repository {
    pub fn new(base: impl Into<String>) -> Self {
        let mut base = base.into();
        if !base.ends_with('/') {
            base.push('/');
        }
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .expect("failed to build HTTP client");
        Self { base, http }
    }

    /// Resolve a reference like `3GPP TS 00.00:REL-99/1.0.0` to its record:
    /// download the index, pick the lowest-sorting matching id, download and
    /// decode that entry's YAML file.
    pub fn get(&self, reference: &str) -> Result<BibliographicRecord, FetchError> {
        eprintln!("[{reference}] fetching from data repository ...");
        let id = reference.strip_prefix("3GPP ").unwrap_or(reference);

        let index = Index::from_yaml(&self.fetch_text(INDEX_FILE)?)
            .map_err(|e| FetchError::Repo(e.to_string()))?;
        let Some(entry) = index.find(id) else {
            eprintln!("[{reference}] not found");
            return Err(FetchError::NotFound(reference.to_string()));
        };

        let body = self.fetch_text(&entry.file)?;
        let mut record: BibliographicRecord =
            serde_yaml::from_str(&body).map_err(|e| FetchError::Repo(e.to_string()))?;
        record.fetched = Some(chrono::Local::now().date_naive());

        let found = record
            .docid
            .first()
            .map(|docid| docid.id.clone())
            .unwrap_or_else(|| record.docnumber.clone());
        eprintln!("[{reference}] found: `{found}`");
        Ok(record)
    }

    fn fetch_text(&self, file: &str) -> Result<String, FetchError> {
        let url = format!("{}{file}", self.base);
        let response = self.http.get(&url).send().map_err(|e| FetchError::Http {
            url: url.clone(),
            message: e.to_string(),
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }
        response.text().map_err(|e| FetchError::Http {
            url,
            message: e.to_string(),
        })
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    const INDEX_YAML: &str = "\
- id: TS 00.00:REL-99/1.0.0
  file: TS_00.00_REL-99_1.0.0.yaml
- id: TS 00.00:REL-99/1.1.0
  file: TS_00.00_REL-99_1.1.0.yaml
";
    const RECORD_YAML: &str = "\
docnumber: TS 00.00:REL-99/1.0.0
docid:
- type: 3GPP
  id: 3GPP TS 00.00:REL-99/1.0.0
link:
- type: src
  content: http://example.com/v1
";

    #[test]
    fn resolves_reference_through_the_index() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/data/index.yaml");
            then.status(200).body(INDEX_YAML);
        });
        server.mock(|when, then| {
            when.method(GET).path("/data/TS_00.00_REL-99_1.0.0.yaml");
            then.status(200).body(RECORD_YAML);
        });

        let repo = Repository::new(server.url("/data"));
        let record = repo.get("3GPP TS 00.00:REL-99/1.0.0").unwrap();
        assert_eq!(record.docnumber, "TS 00.00:REL-99/1.0.0");
        assert_eq!(record.links[0].url, "http://example.com/v1");
        assert!(record.fetched.is_some());
    }

    #[test]
    fn prefix_reference_picks_lowest_sorting_id() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/data/index.yaml");
            then.status(200).body(INDEX_YAML);
        });
        let file_mock = server.mock(|when, then| {
            when.method(GET).path("/data/TS_00.00_REL-99_1.0.0.yaml");
            then.status(200).body(RECORD_YAML);
        });

        let repo = Repository::new(server.url("/data"));
        repo.get("TS 00.00").unwrap();
        file_mock.assert();
    }

    #[test]
    fn unknown_reference_is_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/data/index.yaml");
            then.status(200).body(INDEX_YAML);
        });

        let repo = Repository::new(server.url("/data"));
        let err = repo.get("TS 99.99").unwrap_err();
        assert!(matches!(err, FetchError::NotFound(_)));
    }

    #[test]
    fn upstream_failure_surfaces_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/data/index.yaml");
            then.status(500);
        });

        let repo = Repository::new(server.url("/data"));
        let err = repo.get("TS 00.00").unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 500, .. }));
    }
}
