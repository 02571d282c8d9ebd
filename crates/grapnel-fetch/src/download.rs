//! Streaming downloader executing planned tasks under a byte budget.

use std::path::Path;

use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{FetchError, FetchResult};
use crate::plan::DownloadTask;

/// Executes download tasks by streaming each file to disk.
#[derive(Debug, Clone, Default)]
pub struct Downloader {
    http: Client,
}

impl Downloader {
    /// Build a downloader around the given HTTP client.
    #[must_use]
    pub const fn new(http: Client) -> Self {
        Self { http }
    }

    /// Run `tasks` in destination order.
    ///
    /// Destinations that already exist on disk are skipped and do not
    /// count against `budget`; for the rest the expected sizes are
    /// accumulated and the run stops before the first task that would
    /// push the total past the budget.
    ///
    /// # Errors
    ///
    /// Returns the first fetch or filesystem error. Files completed
    /// before the failure stay on disk.
    pub async fn run(&self, mut tasks: Vec<DownloadTask>, budget: Option<u64>) -> FetchResult<()> {
        tasks.sort_by(|a, b| a.destination.cmp(&b.destination));

        let limit = budget.unwrap_or(u64::MAX);
        let mut planned: u64 = 0;
        for task in tasks {
            if fs::try_exists(&task.destination).await.unwrap_or(false) {
                tracing::debug!(
                    destination = %task.destination.display(),
                    "destination already present, skipping"
                );
                continue;
            }

            planned = planned.saturating_add(task.size);
            if planned > limit {
                tracing::info!(
                    fetched = planned - task.size,
                    limit,
                    "byte budget reached, stopping before the next task"
                );
                return Ok(());
            }

            self.fetch(&task).await?;
        }
        Ok(())
    }

    /// Stream one task's bytes to its destination, creating parent
    /// directories as needed and rendering a byte progress bar.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails, the server answers a
    /// non-success status, or the destination cannot be written. A
    /// partially written destination is removed before returning.
    pub async fn fetch(&self, task: &DownloadTask) -> FetchResult<()> {
        const OPERATION: &str = "fetch";
        if let Some(parent) = task.destination.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| FetchError::io(OPERATION, parent, source))?;
        }

        let response = self
            .http
            .get(&task.url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|source| FetchError::http(OPERATION, source))?;

        let total = if task.size > 0 {
            task.size
        } else {
            response.content_length().unwrap_or(0)
        };
        let bar = progress_bar(total, &task.destination);

        let mut file = fs::File::create(&task.destination)
            .await
            .map_err(|source| FetchError::io(OPERATION, &task.destination, source))?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(source) => {
                    remove_partial(&task.destination).await;
                    return Err(FetchError::http(OPERATION, source));
                }
            };
            if let Err(source) = file.write_all(&chunk).await {
                remove_partial(&task.destination).await;
                return Err(FetchError::io(OPERATION, &task.destination, source));
            }
            written = written.saturating_add(chunk.len() as u64);
            bar.inc(chunk.len() as u64);
        }
        if let Err(source) = file.flush().await {
            remove_partial(&task.destination).await;
            return Err(FetchError::io(OPERATION, &task.destination, source));
        }

        bar.finish_and_clear();
        tracing::info!(
            destination = %task.destination.display(),
            bytes = written,
            "download complete"
        );
        Ok(())
    }
}

async fn remove_partial(path: &Path) {
    if let Err(error) = fs::remove_file(path).await {
        tracing::debug!(
            path = %path.display(),
            error = %error,
            "could not remove partial download"
        );
    }
}

fn progress_bar(total: u64, destination: &Path) -> ProgressBar {
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {bytes}/{total_bytes} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );
    bar.set_message(destination.display().to_string());
    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn task(destination: &Path, url: String, size: u64) -> DownloadTask {
        DownloadTask {
            destination: destination.to_path_buf(),
            url,
            size,
        }
    }

    #[tokio::test]
    async fn run_fetches_every_task_and_writes_payloads() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/a.bin");
            then.status(200).body("alpha");
        });
        server.mock(|when, then| {
            when.method(GET).path("/b.bin");
            then.status(200).body("bravo");
        });

        let dir = tempfile::tempdir().expect("temp dir");
        let tasks = vec![
            task(&dir.path().join("b.bin"), server.url("/b.bin"), 5),
            task(&dir.path().join("a.bin"), server.url("/a.bin"), 5),
        ];

        Downloader::new(Client::new())
            .run(tasks, None)
            .await
            .expect("run should succeed");

        let alpha = std::fs::read(dir.path().join("a.bin")).expect("a.bin written");
        let bravo = std::fs::read(dir.path().join("b.bin")).expect("b.bin written");
        assert_eq!(alpha, b"alpha");
        assert_eq!(bravo, b"bravo");
    }

    #[tokio::test]
    async fn run_skips_existing_files_and_stops_at_budget() {
        let server = MockServer::start_async().await;
        let fetched = server.mock(|when, then| {
            when.method(GET).path("/b.bin");
            then.status(200).body("content");
        });
        let skipped = server.mock(|when, then| {
            when.method(GET).path("/c.bin");
            then.status(200).body("never");
        });

        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("a.bin"), b"already here").expect("seed existing file");

        let tasks = vec![
            task(&dir.path().join("a.bin"), server.url("/a.bin"), 10),
            task(&dir.path().join("b.bin"), server.url("/b.bin"), 10),
            task(&dir.path().join("c.bin"), server.url("/c.bin"), 10),
        ];

        Downloader::new(Client::new())
            .run(tasks, Some(15))
            .await
            .expect("run should succeed");

        fetched.assert();
        skipped.assert_calls(0);
        assert!(dir.path().join("b.bin").exists());
        assert!(!dir.path().join("c.bin").exists());
        let existing = std::fs::read(dir.path().join("a.bin")).expect("existing file intact");
        assert_eq!(existing, b"already here");
    }

    #[tokio::test]
    async fn fetch_creates_parent_directories() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/nested.bin");
            then.status(200).body("deep");
        });

        let dir = tempfile::tempdir().expect("temp dir");
        let destination = dir.path().join("shows").join("s01").join("nested.bin");

        Downloader::new(Client::new())
            .fetch(&task(&destination, server.url("/nested.bin"), 4))
            .await
            .expect("fetch should succeed");

        assert_eq!(
            std::fs::read(&destination).expect("nested file written"),
            b"deep"
        );
    }

    #[tokio::test]
    async fn fetch_surfaces_http_failure_without_leaving_a_file() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/gone.bin");
            then.status(404);
        });

        let dir = tempfile::tempdir().expect("temp dir");
        let destination = dir.path().join("gone.bin");

        let error = Downloader::new(Client::new())
            .fetch(&task(&destination, server.url("/gone.bin"), 4))
            .await
            .expect_err("missing remote file should fail");

        assert!(matches!(error, FetchError::Http { .. }));
        assert!(!destination.exists());
    }
}
