use log::{error, info};
use tokio::task::JoinHandle;
use tokio_postgres::{types::ToSql, Client, NoTls};

use crate::{
    chunks::RowChunk,
    error::InsertError,
    load::TableSink,
    schema::{Column, Value},
};

use super::{insert_sql, replace_table_sql};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgConfig {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub dbname: String,
}

impl PgConfig {
    /// Typed connection options.  Credentials are passed as is, no url
    /// escaping involved.
    pub fn pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .user(&self.user)
            .password(&self.password)
            .host(&self.host)
            .port(self.port)
            .dbname(&self.dbname);
        config
    }

    /// Url form, for display only.
    pub fn connection_string(&self) -> String {
        format!(
            "postgresql://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.dbname
        )
    }
}

struct PgConnection {
    client: Client,
    handle: JoinHandle<()>,
}

/// Postgres destination.  The connection is opened on first use and lives
/// until [`PgSink::close`] or until the sink is dropped.
pub struct PgSink {
    config: PgConfig,
    conn: Option<PgConnection>,
}

impl PgSink {
    pub fn new(config: PgConfig) -> Self {
        Self { config, conn: None }
    }

    async fn client(&mut self) -> Result<&Client, InsertError> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => {
                info!("Connecting to DB: {}", self.config.dbname);
                let (client, connection) = self.config.pg_config().connect(NoTls).await?;
                let handle = tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        error!("postgres connection error: {}", e);
                    }
                });
                PgConnection { client, handle }
            }
        };
        Ok(&self.conn.insert(conn).client)
    }

    /// Drop the client and wait for the connection task to wind down.
    pub async fn close(mut self) {
        if let Some(PgConnection { client, handle }) = self.conn.take() {
            drop(client);
            let _ = handle.await;
        }
    }
}

fn pg_param(value: &Value) -> &(dyn ToSql + Sync) {
    match value {
        Value::Int(v) => v,
        Value::Float(v) => v,
        Value::Text(v) => v,
        Value::Timestamp(v) => v,
    }
}

impl TableSink for PgSink {
    async fn create_table(&mut self, table: &str, columns: &[Column]) -> Result<(), InsertError> {
        let (drop, create) = replace_table_sql(table, columns);
        let client = self.client().await?;
        client.execute(drop.as_str(), &[]).await?;
        client.execute(create.as_str(), &[]).await?;
        Ok(())
    }

    async fn append(&mut self, table: &str, chunk: &RowChunk) -> Result<(), InsertError> {
        let sql = insert_sql(table, &chunk.columns, chunk.len(), |i| format!("${}", i));
        let params: Vec<&(dyn ToSql + Sync)> = chunk.rows.iter().flatten().map(pg_param).collect();
        let client = self.client().await?;
        client.execute(sql.as_str(), &params).await?;
        Ok(())
    }
}
