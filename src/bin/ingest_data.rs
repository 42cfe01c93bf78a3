use std::{io::Write, path::PathBuf, process::ExitCode};

use clap::{Parser, ValueEnum};
use env_logger::Target;
use log::error;
use taxi_ingest::{
    chunks::DEFAULT_CHUNK_SIZE,
    db::{duck::DuckSink, postgres::PgConfig, postgres::PgSink},
    error::IngestError,
    fetch::{Download, HttpDownload, Wget},
    load::LoadReport,
    locator::{TripDataSource, DEFAULT_URL_PREFIX},
    pipeline::IngestJob,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Downloader {
    /// Shell out to wget
    Wget,
    /// Download in-process
    Http,
}

#[derive(Parser, Debug)]
#[command(version, about = "Load a month of NYC yellow taxi trips into Postgres", long_about = None)]
struct Args {
    /// PostgreSQL user
    #[arg(long, env = "PG_USER", default_value = "root")]
    pg_user: String,

    /// PostgreSQL password
    #[arg(long, env = "PG_PASS", default_value = "root", hide_env_values = true)]
    pg_pass: String,

    /// PostgreSQL host
    #[arg(long, env = "PG_HOST", default_value = "localhost")]
    pg_host: String,

    /// PostgreSQL port
    #[arg(long, env = "PG_PORT", default_value_t = 5432)]
    pg_port: u16,

    /// PostgreSQL database name
    #[arg(long, env = "PG_DB", default_value = "ny_taxi")]
    pg_db: String,

    /// Target table name
    #[arg(long, env = "TARGET_TABLE", default_value = "yellow_taxi_data")]
    target_table: String,

    /// Year of the trip data, e.g. 2021
    #[arg(long, default_value_t = 2021)]
    year: i32,

    /// Month of the trip data, e.g. 1
    #[arg(long, default_value_t = 1)]
    month: u32,

    /// Rows per insert statement
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Where the monthly files are published
    #[arg(long, default_value = DEFAULT_URL_PREFIX)]
    url_prefix: String,

    /// Directory for the downloaded file
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = Downloader::Wget)]
    downloader: Downloader,

    /// Load into this DuckDB file instead of Postgres
    #[arg(long)]
    duckdb: Option<PathBuf>,
}

impl Args {
    fn pg_config(&self) -> PgConfig {
        PgConfig {
            user: self.pg_user.clone(),
            password: self.pg_pass.clone(),
            host: self.pg_host.clone(),
            port: self.pg_port,
            dbname: self.pg_db.clone(),
        }
    }

    fn job(&self) -> IngestJob {
        let mut job = IngestJob::new(TripDataSource::new(self.year, self.month), &self.target_table);
        job.url_prefix = self.url_prefix.clone();
        job.data_dir = self.data_dir.clone();
        job.chunk_size = self.chunk_size;
        job
    }

    fn success_line(&self) -> String {
        format!(
            "[SUCCESS] Finished ingesting {} into {}.",
            TripDataSource::new(self.year, self.month).filename(),
            self.target_table
        )
    }
}

async fn ingest<D: Download>(args: &Args, downloader: &D) -> Result<LoadReport, IngestError> {
    let job = args.job();
    match &args.duckdb {
        Some(path) => {
            let mut sink = DuckSink::open(path)?;
            job.run(downloader, &mut sink).await
        }
        None => {
            let mut sink = PgSink::new(args.pg_config());
            let res = job.run(downloader, &mut sink).await;
            sink.close().await;
            res
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .target(Target::Stdout)
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    let res = match args.downloader {
        Downloader::Wget => ingest(&args, &Wget::default()).await,
        Downloader::Http => ingest(&args, &HttpDownload::default()).await,
    };
    match res {
        Ok(_) => {
            println!("{}", args.success_line());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            if let IngestError::Download(_) = e {
                error!(
                    "Check internet or if file exists for {}.",
                    TripDataSource::new(args.year, args.month)
                );
            }
            ExitCode::FAILURE
        }
    }
}
