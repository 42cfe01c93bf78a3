use std::path::Path;

use log::info;
use reqwest::{header::USER_AGENT, Client, StatusCode};
use tokio::{fs, io::AsyncWriteExt, process::Command};

use crate::error::DownloadError;

/// A way of copying a remote file to a local path.
#[allow(async_fn_in_trait)]
pub trait Download {
    async fn download(&self, url: &str, path: &Path) -> Result<(), DownloadError>;
}

/// Shell out to `wget -O <path> <url>`.  A nonzero exit status is a failure,
/// whatever wget left behind at `path` stays there.
#[derive(Debug, Clone)]
pub struct Wget {
    pub program: String,
}

impl Default for Wget {
    fn default() -> Self {
        Self {
            program: "wget".to_string(),
        }
    }
}

impl Download for Wget {
    async fn download(&self, url: &str, path: &Path) -> Result<(), DownloadError> {
        let status = Command::new(&self.program)
            .arg(url)
            .arg("-O")
            .arg(path)
            .status()
            .await?;
        if !status.success() {
            return Err(DownloadError::Exit {
                program: self.program.clone(),
                url: url.to_string(),
                status,
            });
        }
        Ok(())
    }
}

/// Download in-process with reqwest, streaming the body to disk.
#[derive(Debug, Clone, Default)]
pub struct HttpDownload {
    client: Client,
}

impl Download for HttpDownload {
    async fn download(&self, url: &str, path: &Path) -> Result<(), DownloadError> {
        let mut response = self
            .client
            .get(url)
            .header(USER_AGENT, concat!("taxi_ingest/", env!("CARGO_PKG_VERSION")))
            .send()
            .await?;
        if response.status() != StatusCode::OK {
            return Err(DownloadError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }

        if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await?;
        }
        let mut out = fs::File::create(path).await?;
        let mut size = 0;
        while let Some(bytes) = response.chunk().await? {
            out.write_all(&bytes).await?;
            size += bytes.len();
        }
        out.flush().await?;
        info!("downloaded {} bytes", size);
        Ok(())
    }
}

/// Make sure `path` exists, downloading `url` into it if it doesn't.
/// An existing file is reused as is, there is no freshness or size check.
///
/// Return `true` if a download happened.
pub async fn ensure_local_file<D: Download>(
    downloader: &D,
    url: &str,
    path: &Path,
) -> Result<bool, DownloadError> {
    if path.exists() {
        info!(
            "File '{}' already exists locally. Skipping download.",
            path.display()
        );
        return Ok(false);
    }
    info!("Downloading file...");
    downloader.download(url, path).await?;
    Ok(true)
}
