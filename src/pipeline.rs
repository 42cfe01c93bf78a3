use std::path::PathBuf;

use log::info;

use crate::{
    chunks::{ChunkReader, DEFAULT_CHUNK_SIZE},
    error::IngestError,
    fetch::{ensure_local_file, Download},
    load::{load, LoadReport, TableSink},
    locator::{TripDataSource, DEFAULT_URL_PREFIX},
    schema::Schema,
};

/// One run: locate the monthly file, make sure it's on disk, load it.
#[derive(Debug, Clone)]
pub struct IngestJob {
    pub source: TripDataSource,
    pub url_prefix: String,
    /// Directory where the file is looked for and downloaded to.
    pub data_dir: PathBuf,
    pub table: String,
    pub chunk_size: usize,
    pub schema: Schema,
}

impl IngestJob {
    pub fn new(source: TripDataSource, table: &str) -> Self {
        Self {
            source,
            url_prefix: DEFAULT_URL_PREFIX.to_string(),
            data_dir: PathBuf::from("."),
            table: table.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            schema: Schema::yellow_trip(),
        }
    }

    pub fn url(&self) -> String {
        self.source.url(&self.url_prefix)
    }

    pub fn local_path(&self) -> PathBuf {
        self.data_dir.join(self.source.filename())
    }

    /// Run the three steps in order.  A download failure returns before the
    /// sink is touched.
    pub async fn run<D, S>(&self, downloader: &D, sink: &mut S) -> Result<LoadReport, IngestError>
    where
        D: Download,
        S: TableSink,
    {
        let path = self.local_path();
        info!("Processing: {}", self.source.filename());
        info!("Source URL: {}", self.url());

        ensure_local_file(downloader, &self.url(), &path).await?;

        let chunks = ChunkReader::open_gz(&path, &self.schema, self.chunk_size)?;
        let report = load(sink, &self.table, chunks).await?;
        info!(
            "Loaded {} rows in {} chunks into {}.",
            report.rows, report.chunks, self.table
        );
        Ok(report)
    }
}
