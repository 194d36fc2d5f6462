// bib3gpp CLI - fetch and look up 3GPP bibliographic data

mod exit_codes;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};

use bib3gpp_fetch::{DataFetcher, FetchError, Repository, SourceClient, DEFAULT_REPO, DEFAULT_SOURCE};
use bib3gpp_io::Format;

use exit_codes::{
    EXIT_ERROR, EXIT_FETCH_TRUNCATED, EXIT_FETCH_UPSTREAM, EXIT_GET_NOT_FOUND, EXIT_GET_UPSTREAM,
    EXIT_SUCCESS, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "bib3gpp")]
#[command(about = "3GPP bibliographic data: batch ingestion and reference lookup")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest the current database export into per-record files
    #[command(after_help = "\
Examples:
  bib3gpp fetch
  bib3gpp fetch --output data --format xml
  bib3gpp fetch --force
  bib3gpp fetch https://mirror.example.com/status_smg_3GPP.csv")]
    Fetch {
        /// Export URL (defaults to the 3GPP databases area)
        source: Option<String>,

        /// Directory for record files and the index
        #[arg(long, short = 'o', default_value = "data")]
        output: PathBuf,

        /// Output format
        #[arg(long, short = 'f', default_value = "yaml")]
        format: OutputFormat,

        /// Re-download and rewrite everything, clearing previous output
        #[arg(long)]
        force: bool,

        /// Suppress progress output (warnings still print)
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Look up one reference in the published data repository
    #[command(after_help = "\
Examples:
  bib3gpp get 'TS 00.00:REL-99/1.0.0'
  bib3gpp get '3GPP TR 21.900' --format xml")]
    Get {
        /// Reference, with or without the leading `3GPP `
        reference: String,

        /// Render format for the resolved record
        #[arg(long, short = 'f', default_value = "yaml")]
        format: OutputFormat,

        /// Data repository base URL
        #[arg(long, env = "BIB3GPP_REPO")]
        repo: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Xml,
    Yaml,
    Bibxml,
}

impl From<OutputFormat> for Format {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Xml => Format::Xml,
            OutputFormat::Yaml => Format::Yaml,
            OutputFormat::Bibxml => Format::BibXml,
        }
    }
}

// ── Error type ──────────────────────────────────────────────────────

struct CliError {
    code: u8,
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn fetch(err: FetchError) -> Self {
        let code = match &err {
            FetchError::Http { .. } | FetchError::Status { .. } => EXIT_FETCH_UPSTREAM,
            FetchError::TruncatedExport { .. } => EXIT_FETCH_TRUNCATED,
            _ => EXIT_ERROR,
        };
        Self {
            code,
            message: err.to_string(),
            hint: None,
        }
    }

    fn get(err: FetchError) -> Self {
        let code = match &err {
            FetchError::NotFound(_) => EXIT_GET_NOT_FOUND,
            FetchError::Http { .. } | FetchError::Status { .. } | FetchError::Repo(_) => {
                EXIT_GET_UPSTREAM
            }
            _ => EXIT_ERROR,
        };
        Self {
            code,
            message: err.to_string(),
            hint: None,
        }
    }
}

// ── Entry point ─────────────────────────────────────────────────────

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("error: {}", e.message);
            if let Some(hint) = e.hint {
                eprintln!("hint: {hint}");
            }
            ExitCode::from(e.code)
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Fetch {
            source,
            output,
            format,
            force,
            quiet,
        } => cmd_fetch(source, output, format.into(), force, quiet),
        Commands::Get {
            reference,
            format,
            repo,
        } => cmd_get(reference, format.into(), repo),
    }
}

fn cmd_fetch(
    source: Option<String>,
    output: PathBuf,
    format: Format,
    force: bool,
    quiet: bool,
) -> Result<(), CliError> {
    if let Some(url) = &source {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(CliError {
                code: EXIT_USAGE,
                message: format!("source must be an HTTP(S) URL, got {url}"),
                hint: Some(format!("example: {DEFAULT_SOURCE}")),
            });
        }
    }

    let started = Instant::now();
    if !quiet {
        println!(
            "Started at: {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
    }

    let client = SourceClient::new(source.unwrap_or_else(|| DEFAULT_SOURCE.to_string()));
    let mut fetcher = DataFetcher::new(&output, format)
        .map_err(CliError::fetch)?
        .quiet(quiet);
    let summary = fetcher.run(&client, force).map_err(CliError::fetch)?;

    if !quiet {
        println!(
            "Stopped at: {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        println!("Done in: {} sec.", started.elapsed().as_secs());
        println!(
            "{} written, {} merged, {} duplicates skipped, {} rows failed",
            summary.written, summary.merged, summary.skipped, summary.failed
        );
    }
    Ok(())
}

fn cmd_get(reference: String, format: Format, repo: Option<String>) -> Result<(), CliError> {
    let repo = Repository::new(repo.unwrap_or_else(|| DEFAULT_REPO.to_string()));
    let record = repo.get(&reference).map_err(CliError::get)?;
    let rendered = format.serialize(&record).map_err(|e| CliError {
        code: EXIT_ERROR,
        message: e.to_string(),
        hint: None,
    })?;
    println!("{rendered}");
    Ok(())
}

// ── Tests ───────────────────────────────────────────────────────────
