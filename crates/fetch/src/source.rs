//! Retrieval of the current database export over HTTPS.
//!
//! Connect → check freshness against the recorded state → stream to a
//! `.part` file → size sanity check → atomic rename → update state. The
//! state file records the export's name and Last-Modified stamp so an
//! unchanged export skips the whole run.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::FetchError;

pub const DEFAULT_SOURCE: &str =
    "https://www.3gpp.org/ftp/Information/Databases/status_smg_3GPP.csv";
pub const CURRENT_FILE: &str = "current.yaml";

const MAX_RETRIES: u32 = 5;
const REQUEST_TIMEOUT_SECS: u64 = 30;
/// A healthy export is tens of megabytes; anything smaller is a truncated
/// download or an upstream error page.
const MIN_EXPORT_BYTES: u64 = 20_000_000;
const USER_AGENT: &str = concat!("bib3gpp/", env!("CARGO_PKG_VERSION"));

// ── State ───────────────────────────────────────────────────────────

/// Last ingested export, as recorded after a successful run.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceState {
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub date: String,
}

impl SourceState {
    /// Missing or unreadable state reads as "never fetched".
    pub fn load(path: &Path) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_yaml::from_str(&content).ok())
            .unwrap_or_default()
    }

    pub fn save(&self, path: &Path) -> Result<(), FetchError> {
        let content = serde_yaml::to_string(self).map_err(|e| FetchError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        fs::write(path, content).map_err(|e| FetchError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

// ── Client ──────────────────────────────────────────────────────────

pub struct SourceClient {
    url: String,
    state_path: PathBuf,
    min_bytes: u64,
    http: reqwest::blocking::Client,
}

impl SourceClient {
    pub fn new(url: impl Into<String>) -> Self {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .expect("failed to build HTTP client");
        Self {
            url: url.into(),
            state_path: PathBuf::from(CURRENT_FILE),
            min_bytes: MIN_EXPORT_BYTES,
            http,
        }
    }

    pub fn with_state_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_path = path.into();
        self
    }

    pub fn with_min_bytes(mut self, min_bytes: u64) -> Self {
        self.min_bytes = min_bytes;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Download the export into `dest_dir` if it changed since the recorded
    /// state. `None` means unchanged and nothing was written.
    pub fn get_file(&self, dest_dir: &Path, force: bool) -> Result<Option<PathBuf>, FetchError> {
        let state = SourceState::load(&self.state_path);
        let file_name = self
            .url
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
            .unwrap_or("export.csv")
            .to_string();

        let mut response = self.get_with_retry()?;
        let last_modified = response
            .headers()
            .get(reqwest::header::LAST_MODIFIED)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if !force
            && file_name == state.file
            && !state.date.is_empty()
            && last_modified == state.date
        {
            return Ok(None);
        }

        fs::create_dir_all(dest_dir).map_err(|e| FetchError::Io {
            path: dest_dir.to_path_buf(),
            message: e.to_string(),
        })?;
        let final_path = dest_dir.join(&file_name);
        let part_path = dest_dir.join(format!("{file_name}.part"));

        let mut file = fs::File::create(&part_path).map_err(|e| FetchError::Io {
            path: part_path.clone(),
            message: e.to_string(),
        })?;
        response.copy_to(&mut file).map_err(|e| {
            let _ = fs::remove_file(&part_path);
            FetchError::Http {
                url: self.url.clone(),
                message: e.to_string(),
            }
        })?;
        drop(file);

        let bytes = fs::metadata(&part_path)
            .map(|meta| meta.len())
            .unwrap_or(0);
        if bytes < self.min_bytes {
            let _ = fs::remove_file(&part_path);
            return Err(FetchError::TruncatedExport {
                bytes,
                min: self.min_bytes,
            });
        }

        fs::rename(&part_path, &final_path).map_err(|e| {
            let _ = fs::remove_file(&part_path);
            FetchError::Io {
                path: final_path.clone(),
                message: e.to_string(),
            }
        })?;

        SourceState {
            file: file_name,
            date: last_modified,
        }
        .save(&self.state_path)?;

        Ok(Some(final_path))
    }

    /// GET with bounded retry on transport errors and 5xx responses.
    fn get_with_retry(&self) -> Result<reqwest::blocking::Response, FetchError> {
        let mut backoff_secs = 1u64;
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.http.get(&self.url).send() {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }
                    if status.is_server_error() && attempt < MAX_RETRIES {
                        thread::sleep(Duration::from_secs(backoff_secs));
                        backoff_secs *= 2;
                        continue;
                    }
                    return Err(FetchError::Status {
                        url: self.url.clone(),
                        status: status.as_u16(),
                    });
                }
                Err(e) => {
                    if attempt < MAX_RETRIES {
                        thread::sleep(Duration::from_secs(backoff_secs));
                        backoff_secs *= 2;
                        continue;
                    }
                    return Err(FetchError::Http {
                        url: self.url.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────
