use std::path::Path;

use duckdb::{
    types::{TimeUnit, ToSqlOutput, Value as DuckValue},
    Connection, ToSql,
};

use crate::{
    chunks::RowChunk,
    error::InsertError,
    load::TableSink,
    schema::{Column, Value},
};

use super::{insert_sql, replace_table_sql};

impl ToSql for Value {
    fn to_sql(&self) -> duckdb::Result<ToSqlOutput<'_>> {
        let value = match self {
            Value::Int(Some(v)) => DuckValue::BigInt(*v),
            Value::Float(Some(v)) => DuckValue::Double(*v),
            Value::Text(Some(v)) => DuckValue::Text(v.clone()),
            Value::Timestamp(Some(v)) => {
                DuckValue::Timestamp(TimeUnit::Microsecond, v.and_utc().timestamp_micros())
            }
            _ => DuckValue::Null,
        };
        Ok(ToSqlOutput::Owned(value))
    }
}

/// DuckDB destination, either a database file or in memory.
pub struct DuckSink {
    conn: Connection,
}

impl DuckSink {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, InsertError> {
        Ok(Self {
            conn: Connection::open(path)?,
        })
    }

    pub fn in_memory() -> Result<Self, InsertError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl TableSink for DuckSink {
    async fn create_table(&mut self, table: &str, columns: &[Column]) -> Result<(), InsertError> {
        let (drop, create) = replace_table_sql(table, columns);
        self.conn.execute_batch(&format!("{};\n{};", drop, create))?;
        Ok(())
    }

    async fn append(&mut self, table: &str, chunk: &RowChunk) -> Result<(), InsertError> {
        let sql = insert_sql(table, &chunk.columns, chunk.len(), |_| "?".to_string());
        let params: Vec<&dyn ToSql> = chunk.rows.iter().flatten().map(|v| v as &dyn ToSql).collect();
        self.conn.execute(&sql, params.as_slice())?;
        Ok(())
    }
}
