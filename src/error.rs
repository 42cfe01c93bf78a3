use std::path::PathBuf;

use thiserror::Error;

/// The transfer of the source file failed.
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("{program} exited with {status} while downloading {url}")]
    Exit {
        program: String,
        url: String,
        status: std::process::ExitStatus,
    },
    #[error("download of {url} failed with HTTP status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("io error while downloading: {0}")]
    Io(#[from] std::io::Error),
}

/// The local file can't be opened or decoded as the expected gzip CSV.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("can't open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing column {0} in header")]
    MissingColumn(String),
    #[error("row {row}, column {column}: can't parse {value:?} as {kind}")]
    Value {
        row: u64,
        column: String,
        value: String,
        kind: &'static str,
    },
}

/// Writing to the destination table failed.
#[derive(Error, Debug)]
pub enum InsertError {
    #[error("postgres: {0}")]
    Postgres(#[from] tokio_postgres::Error),
    #[error("duckdb: {0}")]
    DuckDb(#[from] duckdb::Error),
    #[error("chunk {chunk} has columns [{found}], table {table} has [{expected}]")]
    SchemaMismatch {
        table: String,
        chunk: usize,
        expected: String,
        found: String,
    },
}

/// Every way a run can end early.  All of them are terminal.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),
    #[error("Error reading CSV: {0}")]
    Parse(#[from] ParseError),
    #[error("File is empty.")]
    EmptyFile,
    #[error("Insert failed: {0}")]
    Insert(#[from] InsertError),
}
