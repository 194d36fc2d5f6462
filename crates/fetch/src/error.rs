use std::fmt;
use std::path::PathBuf;

use bib3gpp_io::StoreError;

#[derive(Debug)]
pub enum FetchError {
    /// Transport-level HTTP failure, already retried.
    Http { url: String, message: String },
    /// Non-success HTTP status.
    Status { url: String, status: u16 },
    /// Filesystem failure.
    Io { path: PathBuf, message: String },
    /// CSV-level read failure.
    Csv(String),
    /// Row field that cannot be interpreted (bad date etc.).
    Row(String),
    /// Downloaded export smaller than the sanity threshold.
    TruncatedExport { bytes: u64, min: u64 },
    /// Storage or codec failure.
    Store(StoreError),
    /// Reference not present in the published index.
    NotFound(String),
    /// Payload from the data repository that does not decode.
    Repo(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http { url, message } => write!(f, "request to {url} failed: {message}"),
            Self::Status { url, status } => write!(f, "{url} returned HTTP {status}"),
            Self::Io { path, message } => write!(f, "{}: {message}", path.display()),
            Self::Csv(message) => write!(f, "CSV read error: {message}"),
            Self::Row(message) => write!(f, "{message}"),
            Self::TruncatedExport { bytes, min } => {
                write!(f, "export is {bytes} bytes, expected at least {min}")
            }
            Self::Store(err) => write!(f, "{err}"),
            Self::NotFound(reference) => write!(f, "no entry for `{reference}`"),
            Self::Repo(message) => write!(f, "data repository error: {message}"),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<StoreError> for FetchError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}
