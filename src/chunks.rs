use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use csv::StringRecord;
use flate2::read::MultiGzDecoder;

use crate::{
    error::ParseError,
    schema::{Column, Schema, Value},
};

/// Number of rows inserted with one statement.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// A batch of parsed rows, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct RowChunk {
    /// Zero based position of the chunk in the file.
    pub index: usize,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
}

impl RowChunk {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Reads a csv file forward, `chunk_size` rows at a time.  Each chunk is
/// materialized independently, nothing is kept once it has been handed out.
/// After the first error the iterator is exhausted.
pub struct ChunkReader<R: Read> {
    reader: csv::Reader<R>,
    columns: Vec<Column>,
    chunk_size: usize,
    record: StringRecord,
    row: u64,
    next_index: usize,
    done: bool,
}

impl ChunkReader<MultiGzDecoder<BufReader<File>>> {
    /// Open a gzip compressed csv file and read its header.
    pub fn open_gz(path: &Path, schema: &Schema, chunk_size: usize) -> Result<Self, ParseError> {
        let file = File::open(path).map_err(|source| ParseError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        ChunkReader::new(MultiGzDecoder::new(BufReader::new(file)), schema, chunk_size)
    }
}

impl<R: Read> ChunkReader<R> {
    pub fn new(rdr: R, schema: &Schema, chunk_size: usize) -> Result<Self, ParseError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(rdr);
        let header = reader.headers()?.clone();
        // an empty file has no header at all, it yields no chunks
        let columns = if header.is_empty() {
            Vec::new()
        } else {
            schema.resolve(header.iter())?
        };
        Ok(Self {
            reader,
            columns,
            chunk_size: chunk_size.max(1),
            record: StringRecord::new(),
            row: 0,
            next_index: 0,
            done: false,
        })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn parse_record(&self) -> Result<Vec<Value>, ParseError> {
        self.columns
            .iter()
            .zip(self.record.iter())
            .map(|(column, cell)| {
                Value::parse(cell, column.kind).map_err(|kind| ParseError::Value {
                    row: self.row,
                    column: column.name.clone(),
                    value: cell.to_string(),
                    kind,
                })
            })
            .collect()
    }

    fn read_chunk(&mut self) -> Result<Option<RowChunk>, ParseError> {
        let mut rows = Vec::with_capacity(self.chunk_size);
        while rows.len() < self.chunk_size {
            if !self.reader.read_record(&mut self.record)? {
                break;
            }
            self.row += 1;
            rows.push(self.parse_record()?);
        }
        if rows.is_empty() {
            return Ok(None);
        }
        let chunk = RowChunk {
            index: self.next_index,
            columns: self.columns.clone(),
            rows,
        };
        self.next_index += 1;
        Ok(Some(chunk))
    }
}

impl<R: Read> Iterator for ChunkReader<R> {
    type Item = Result<RowChunk, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_chunk() {
            Ok(Some(chunk)) => Some(Ok(chunk)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::schema::FieldType;
    use flate2::{write::GzEncoder, Compression};
    use std::io::Write;

    pub(crate) fn write_gz(path: &Path, text: &str) {
        let file = File::create(path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap();
    }

    /// A small trip file with `n` rows, `VendorID` counting up from 1.
    pub(crate) fn trip_csv(n: usize) -> String {
        let mut out = String::from(
            "VendorID,tpep_pickup_datetime,tpep_dropoff_datetime,passenger_count,trip_distance,store_and_fwd_flag,total_amount\n",
        );
        for i in 1..=n {
            out.push_str(&format!(
                "{},2021-01-01 00:{:02}:00,2021-01-01 01:{:02}:00,{},{}.5,N,{}.25\n",
                i,
                i % 60,
                i % 60,
                if i % 7 == 0 { String::new() } else { "1".to_string() },
                i % 10,
                i
            ));
        }
        out
    }

    #[test]
    fn read_in_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trips.csv.gz");
        write_gz(&path, &trip_csv(2500));

        let reader = ChunkReader::open_gz(&path, &Schema::yellow_trip(), 1000).unwrap();
        assert_eq!(reader.columns().len(), 7);
        assert_eq!(reader.columns()[5], Column::new("store_and_fwd_flag", FieldType::Text));
        let chunks: Vec<RowChunk> = reader.map(|c| c.unwrap()).collect();
        assert_eq!(
            chunks.iter().map(|c| c.len()).collect::<Vec<_>>(),
            vec![1000, 1000, 500]
        );
        assert_eq!(
            chunks.iter().map(|c| c.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(chunks[1].rows[0][0], Value::Int(Some(1001)));
        assert_eq!(chunks[0].rows[6][3], Value::Int(None));
        assert_eq!(chunks[2].rows[499][6], Value::Float(Some(2500.25)));
    }

    #[test]
    fn header_only_file_has_no_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trips.csv.gz");
        write_gz(&path, &trip_csv(0));
        let mut reader = ChunkReader::open_gz(&path, &Schema::yellow_trip(), 1000).unwrap();
        assert!(reader.next().is_none());
    }

    #[test]
    fn empty_file_has_no_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trips.csv.gz");
        write_gz(&path, "");
        let mut reader = ChunkReader::open_gz(&path, &Schema::yellow_trip(), 1000).unwrap();
        assert!(reader.columns().is_empty());
        assert!(reader.next().is_none());
    }

    #[test]
    fn malformed_gzip_fails_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trips.csv.gz");
        std::fs::write(&path, "VendorID,tpep_pickup_datetime\n1,2\n").unwrap();
        let res = ChunkReader::open_gz(&path, &Schema::yellow_trip(), 1000);
        assert!(matches!(res, Err(ParseError::Csv(_))));
    }

    #[test]
    fn missing_file_fails_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let res = ChunkReader::open_gz(&dir.path().join("nope.csv.gz"), &Schema::yellow_trip(), 10);
        assert!(matches!(res, Err(ParseError::Open { .. })));
    }

    #[test]
    fn bad_value_stops_the_reader() {
        let text = trip_csv(3).replace("\n2,", "\nxyz,");
        let reader = ChunkReader::new(text.as_bytes(), &Schema::yellow_trip(), 2).unwrap();
        let items: Vec<_> = reader.collect();
        assert_eq!(items.len(), 1);
        match &items[0] {
            Err(ParseError::Value { row, column, kind, .. }) => {
                assert_eq!(*row, 2);
                assert_eq!(column, "VendorID");
                assert_eq!(*kind, "integer");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn ragged_row_is_an_error_after_earlier_chunks() {
        let mut text = trip_csv(3);
        text.push_str("4,2021-01-01 00:04:00,2021-01-01 01:04:00,1,4.5,N,4.25,extra\n");
        let reader = ChunkReader::new(text.as_bytes(), &Schema::yellow_trip(), 3).unwrap();
        let items: Vec<_> = reader.collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap().len(), 3);
        assert!(matches!(items[1], Err(ParseError::Csv(_))));
    }
}
