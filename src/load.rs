use itertools::Itertools;
use log::info;

use crate::{
    chunks::RowChunk,
    error::{IngestError, InsertError, ParseError},
    schema::Column,
};

/// A destination table store.  Schema establishment and appends are separate
/// calls, there is no transaction spanning several calls.
#[allow(async_fn_in_trait)]
pub trait TableSink {
    /// Drop `table` if it exists and create it empty with `columns`.
    async fn create_table(&mut self, table: &str, columns: &[Column]) -> Result<(), InsertError>;

    /// Insert all the rows of `chunk` into `table` with one multi-row insert.
    async fn append(&mut self, table: &str, chunk: &RowChunk) -> Result<(), InsertError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Init,
    SchemaEstablished,
    Appending,
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadReport {
    pub chunks: usize,
    pub rows: usize,
}

/// Streams chunks into one table.  The first chunk fixes the table schema,
/// every later chunk must have exactly the same columns.
pub struct Loader<'a, S: TableSink> {
    sink: &'a mut S,
    table: String,
    columns: Vec<Column>,
    state: LoadState,
    report: LoadReport,
}

impl<'a, S: TableSink> Loader<'a, S> {
    pub fn new(sink: &'a mut S, table: &str) -> Self {
        Self {
            sink,
            table: table.to_string(),
            columns: Vec::new(),
            state: LoadState::Init,
            report: LoadReport::default(),
        }
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn report(&self) -> LoadReport {
        self.report
    }

    /// Consume all the chunks.  Nothing is rolled back on failure, the chunks
    /// inserted before the error stay in the table.
    pub async fn run<I>(&mut self, chunks: I) -> Result<LoadReport, IngestError>
    where
        I: IntoIterator<Item = Result<RowChunk, ParseError>>,
    {
        let res = self.consume(chunks).await;
        self.state = if res.is_ok() {
            LoadState::Done
        } else {
            LoadState::Failed
        };
        res.map(|_| self.report)
    }

    async fn consume<I>(&mut self, chunks: I) -> Result<(), IngestError>
    where
        I: IntoIterator<Item = Result<RowChunk, ParseError>>,
    {
        let mut chunks = chunks.into_iter();
        let first = chunks.next().ok_or(IngestError::EmptyFile)??;
        self.establish_schema(&first).await?;
        self.insert(&first).await?;
        info!("First chunk inserted.");

        for chunk in chunks {
            let chunk = chunk?;
            self.append(&chunk).await?;
            info!(
                "Ingesting data: chunk {}, {} rows so far",
                self.report.chunks, self.report.rows
            );
        }
        Ok(())
    }

    /// Drop and recreate the table with the columns of the first chunk.
    pub async fn establish_schema(&mut self, first: &RowChunk) -> Result<(), InsertError> {
        debug_assert_eq!(self.state, LoadState::Init, "schema is established only once");
        self.sink.create_table(&self.table, &first.columns).await?;
        self.columns = first.columns.clone();
        self.state = LoadState::SchemaEstablished;
        Ok(())
    }

    /// Append a chunk after checking it against the established schema.
    pub async fn append(&mut self, chunk: &RowChunk) -> Result<(), InsertError> {
        if chunk.columns != self.columns {
            return Err(InsertError::SchemaMismatch {
                table: self.table.clone(),
                chunk: chunk.index,
                expected: self.columns.iter().map(|c| &c.name).join(", "),
                found: chunk.column_names().join(", "),
            });
        }
        self.insert(chunk).await
    }

    async fn insert(&mut self, chunk: &RowChunk) -> Result<(), InsertError> {
        self.sink.append(&self.table, chunk).await?;
        self.state = LoadState::Appending;
        self.report.chunks += 1;
        self.report.rows += chunk.len();
        Ok(())
    }
}

/// Load `chunks` into `table`, replacing whatever was there.
pub async fn load<S, I>(sink: &mut S, table: &str, chunks: I) -> Result<LoadReport, IngestError>
where
    S: TableSink,
    I: IntoIterator<Item = Result<RowChunk, ParseError>>,
{
    let mut loader = Loader::new(sink, table);
    loader.run(chunks).await
}
