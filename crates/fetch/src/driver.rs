//! Ingestion driver: one fetch-parse-reconcile-persist cycle per source row.
//!
//! The driver owns the run-scoped state: the set of output keys already
//! emitted, the store, and the index. Row failures are isolated; they are
//! logged with the row's identifying fields and the run always finishes.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use bib3gpp_io::{Format, Index, Store, INDEX_FILE};
use bib3gpp_model::BibliographicRecord;

use crate::error::FetchError;
use crate::parser::{self, Columns};
use crate::source::SourceClient;

/// What happened to one candidate record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    /// First record with its key this run; persisted verbatim.
    Written,
    /// Key collision with a mergeable change; merged record re-persisted.
    Merged,
    /// Key collision with nothing to merge; storage left untouched.
    Skipped,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub written: usize,
    pub merged: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct DataFetcher {
    store: Store,
    index: Index,
    index_path: PathBuf,
    seen: HashSet<String>,
    quiet: bool,
}

impl DataFetcher {
    pub fn new(output: impl Into<PathBuf>, format: Format) -> Result<Self, FetchError> {
        let output = output.into();
        fs::create_dir_all(&output).map_err(|e| FetchError::Io {
            path: output.clone(),
            message: e.to_string(),
        })?;
        let index_path = output.join(INDEX_FILE);
        let index = Index::load(&index_path)?;
        Ok(Self {
            store: Store::new(output, format),
            index,
            index_path,
            seen: HashSet::new(),
            quiet: false,
        })
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    /// One batch run: retrieve the export (skipping an unchanged one unless
    /// forced) and ingest it.
    pub fn run(&mut self, source: &SourceClient, force: bool) -> Result<RunSummary, FetchError> {
        let Some(file) = source.get_file(self.store.dir(), force)? else {
            if !self.quiet {
                eprintln!("source unchanged, nothing to do");
            }
            return Ok(RunSummary::default());
        };
        self.ingest_file(&file, force)
    }

    /// Ingest one already-downloaded export. A force run clears previously
    /// written output and the index first.
    pub fn ingest_file(&mut self, path: &Path, force: bool) -> Result<RunSummary, FetchError> {
        if force {
            self.store.clear()?;
            self.index.remove_all();
        }
        self.seen.clear();

        let mut reader = csv::Reader::from_path(path).map_err(|e| FetchError::Csv(e.to_string()))?;
        let headers = reader
            .headers()
            .map_err(|e| FetchError::Csv(e.to_string()))?
            .clone();
        let columns = Columns::from_headers(&headers);

        let mut summary = RunSummary::default();
        for row in reader.records() {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    summary.failed += 1;
                    eprintln!("warning: skipping unreadable row: {e}");
                    continue;
                }
            };
            match self.process_row(&columns, &row) {
                Ok(Some(RowOutcome::Written)) => summary.written += 1,
                Ok(Some(RowOutcome::Merged)) => summary.merged += 1,
                Ok(Some(RowOutcome::Skipped)) => summary.skipped += 1,
                Ok(None) => {}
                Err(e) => {
                    summary.failed += 1;
                    eprintln!(
                        "warning: {e}. PubID: {}",
                        parser::row_ident(&columns, &row)
                    );
                }
            }
        }

        self.index.save(&self.index_path)?;
        Ok(summary)
    }

    fn process_row(
        &mut self,
        columns: &Columns,
        row: &csv::StringRecord,
    ) -> Result<Option<RowOutcome>, FetchError> {
        let candidate = parser::parse(columns, row)?;
        self.save(candidate)
    }

    /// Persist one candidate record, deferring to the reconciliation engine
    /// when its output key was already produced in this run.
    pub fn save(
        &mut self,
        candidate: Option<BibliographicRecord>,
    ) -> Result<Option<RowOutcome>, FetchError> {
        let Some(mut candidate) = candidate else {
            return Ok(None);
        };

        if self.seen.insert(candidate.output_key()) {
            self.store.write(&candidate)?;
            self.index
                .add_or_update(&candidate.docnumber, &self.store.file_name(&candidate));
            return Ok(Some(RowOutcome::Written));
        }

        // Collision inside this run: reconcile against what was written.
        let path = self.store.path_for(&candidate);
        let mut existing = self.store.load(&path)?;
        match bib3gpp_recon::merge(&mut candidate, &mut existing) {
            Some(main) => {
                let docnumber = main.docnumber.clone();
                let file_name = self.store.file_name(main);
                self.store.write(main)?;
                self.index.add_or_update(&docnumber, &file_name);
                Ok(Some(RowOutcome::Merged))
            }
            None => {
                eprintln!(
                    "warning: file {} already exists. Document: {}",
                    path.display(),
                    candidate.docnumber
                );
                Ok(Some(RowOutcome::Skipped))
            }
        }
    }
}
