//! Background loop that mirrors finished transfers to local disk.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use grapnel_fetch::{Downloader, PlanOptions, plan_downloads};
use grapnel_remote::{RemoteClient, Transfer};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::context::WatchContext;
use crate::ledger::LedgerHandle;

const POLL_INTERVAL: Duration = Duration::from_secs(60);
const SYNC_SENTINEL_FILE: &str = ".sync";

/// Settings for the download loop.
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct DownloadLoopConfig {
    /// Directory that finished transfers are mirrored into.
    pub download_dir: PathBuf,
    /// Only fetch transfers recorded in the upload ledger.
    pub strict: bool,
    /// Restrict fetched files to known video extensions.
    pub video_only: bool,
    /// Place every file directly in the target directory.
    pub flatten: bool,
    /// Delete a transfer from the service once it has been mirrored.
    pub remove_remote: bool,
    /// Maintain a `.sync` marker file in the target directory while a
    /// poll pass is running.
    pub write_sentinel: bool,
}

/// Spawn the download loop against `config.download_dir`.
///
/// Each pass lists the account's transfers and mirrors every finished
/// one into the target directory; files already on disk are skipped.
/// Failures are logged and retried on the next pass.
pub fn spawn_download_loop(
    context: WatchContext,
    downloader: Downloader,
    config: DownloadLoopConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            run_download_cycle(&context, &downloader, &config).await;
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    })
}

async fn run_download_cycle(
    context: &WatchContext,
    downloader: &Downloader,
    config: &DownloadLoopConfig,
) {
    let sentinel = config
        .write_sentinel
        .then(|| config.download_dir.join(SYNC_SENTINEL_FILE));
    if let Some(path) = &sentinel {
        create_sentinel(path).await;
    }
    if let Err(error) = fetch_finished_transfers(context, downloader, config).await {
        warn!(error = %error, "transfer poll failed");
    }
    // The marker always comes off again so stalled consumers are not
    // left waiting on a failed pass.
    if let Some(path) = &sentinel {
        remove_sentinel(path).await;
    }
}

async fn fetch_finished_transfers(
    context: &WatchContext,
    downloader: &Downloader,
    config: &DownloadLoopConfig,
) -> Result<()> {
    let transfers = context
        .remote
        .list_transfers()
        .await
        .context("failed to list transfers")?;
    for transfer in transfers {
        if !transfer.status.is_finished() {
            continue;
        }
        if config.strict && !is_recorded(&context.ledger, &transfer.id).await {
            debug!(transfer = %transfer.name, "transfer not in upload ledger, skipping");
            continue;
        }
        if let Err(error) = mirror_transfer(&context.remote, downloader, config, &transfer).await {
            warn!(
                error = %error,
                transfer = %transfer.name,
                "could not mirror finished transfer"
            );
        }
    }
    Ok(())
}

async fn mirror_transfer(
    remote: &RemoteClient,
    downloader: &Downloader,
    config: &DownloadLoopConfig,
    transfer: &Transfer,
) -> Result<()> {
    let tree = remote
        .browse_transfer(&transfer.hash)
        .await
        .context("failed to browse transfer")?;
    let options = PlanOptions {
        video_only: config.video_only,
        flatten: config.flatten,
    };
    let tasks = plan_downloads(&config.download_dir, &tree.content, options);
    downloader
        .run(tasks, None)
        .await
        .context("failed to mirror transfer files")?;

    if config.remove_remote && let Err(error) = remote.delete_transfer(&transfer.id).await {
        warn!(
            error = %error,
            transfer = %transfer.name,
            "could not delete mirrored transfer from the service"
        );
    }
    Ok(())
}

async fn is_recorded(ledger: &LedgerHandle, transfer_id: &str) -> bool {
    match ledger.get().await {
        Ok(ledger) => match ledger.contains(transfer_id).await {
            Ok(found) => found,
            Err(error) => {
                warn!(error = %error, transfer_id, "ledger lookup failed");
                false
            }
        },
        Err(error) => {
            warn!(error = %error, "could not open upload ledger");
            false
        }
    }
}

async fn create_sentinel(path: &Path) {
    let open = tokio::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .open(path)
        .await;
    if let Err(error) = open {
        warn!(error = %error, path = %path.display(), "could not create sync marker");
    }
}

async fn remove_sentinel(path: &Path) {
    if let Err(error) = tokio::fs::remove_file(path).await {
        warn!(error = %error, path = %path.display(), "could not remove sync marker");
    }
}
