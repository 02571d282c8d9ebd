//! Background loop that uploads watched torrent files to the service.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::context::WatchContext;
use crate::error::WatchResult;
use crate::scanner::DirectoryScanner;

const TORRENT_FILE_PATTERN: &str = r".*?\.torrent";
const SCAN_INTERVAL: Duration = Duration::from_secs(5);

/// Settings for the upload loop.
#[derive(Debug, Clone)]
pub struct UploadLoopConfig {
    /// Directory scanned for torrent files.
    pub watch_dir: PathBuf,
    /// Remove a torrent file from disk once its transfer is created.
    pub remove_local: bool,
}

/// Spawn the upload loop over `config.watch_dir`.
///
/// Every matching file is uploaded as a transfer; the resulting id is
/// recorded in the ledger together with the file's directory relative
/// to the watched root. Failed uploads are logged and the file is left
/// in place for the next scan pass.
///
/// # Errors
///
/// Returns an error if the watch directory cannot be scanned.
pub fn spawn_upload_loop(
    context: WatchContext,
    config: UploadLoopConfig,
) -> WatchResult<JoinHandle<()>> {
    let mut scanner = DirectoryScanner::new(&config.watch_dir, TORRENT_FILE_PATTERN, SCAN_INTERVAL)?;
    let mut events = scanner.subscribe();
    scanner.start();

    Ok(tokio::spawn(async move {
        while let Some(path) = events.recv().await {
            if let Err(error) = handle_torrent_file(&context, &config, &path).await {
                warn!(
                    error = %error,
                    path = %path.display(),
                    "upload failed, leaving file in place"
                );
            }
        }
    }))
}

async fn handle_torrent_file(
    context: &WatchContext,
    config: &UploadLoopConfig,
    path: &Path,
) -> Result<()> {
    let origin = origin_for(&config.watch_dir, path);
    let ticket = if is_torrent_file(path) {
        context
            .remote
            .upload_torrent_file(path)
            .await
            .context("failed to upload torrent file")?
    } else {
        let link = tokio::fs::read_to_string(path)
            .await
            .context("failed to read magnet link file")?;
        context
            .remote
            .upload_magnet(link.trim())
            .await
            .context("failed to upload magnet link")?
    };
    info!(
        transfer_id = %ticket.id,
        name = %ticket.name,
        origin = %origin,
        "transfer created"
    );

    if config.remove_local && let Err(error) = tokio::fs::remove_file(path).await {
        warn!(
            error = %error,
            path = %path.display(),
            "could not remove file after upload"
        );
    }

    match context.ledger.get().await {
        Ok(ledger) => {
            if let Err(error) = ledger.record_upload(&ticket.id, &origin).await {
                warn!(
                    error = %error,
                    transfer_id = %ticket.id,
                    "could not record transfer, it will not be picked up by strict downloads"
                );
            }
        }
        Err(error) => {
            warn!(
                error = %error,
                transfer_id = %ticket.id,
                "could not open upload ledger, transfer not recorded"
            );
        }
    }
    Ok(())
}

fn is_torrent_file(path: &Path) -> bool {
    path.extension().is_some_and(|extension| extension == "torrent")
}

/// Directory of `path` relative to `watch_root`, or an empty string
/// for files sitting directly in the root.
fn origin_for(watch_root: &Path, path: &Path) -> String {
    path.parent()
        .and_then(|parent| parent.strip_prefix(watch_root).ok())
        .map(|relative| relative.to_string_lossy().into_owned())
        .unwrap_or_default()
}
