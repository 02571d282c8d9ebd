//! Handler wiring the watch command to its reconciliation loops.

use anyhow::{Context, anyhow};
use grapnel_fetch::Downloader;
use grapnel_watch::{
    DEFAULT_LEDGER_FILE, DownloadLoopConfig, LedgerHandle, UploadLoopConfig, WatchContext,
    WatchError, spawn_download_loop, spawn_upload_loop,
};

use crate::cli::{AppContext, CliError, CliResult, WatchArgs};

/// Run the upload and download loops for as long as the process
/// lives. At least one of the two directories must be given.
pub(crate) async fn handle_watch(ctx: &AppContext, args: WatchArgs) -> CliResult<()> {
    if args.upload.is_none() && args.download.is_none() {
        return Err(CliError::validation(
            "watch needs at least one of --upload or --download",
        ));
    }

    let context = WatchContext {
        remote: ctx.remote.clone(),
        ledger: LedgerHandle::new(DEFAULT_LEDGER_FILE),
    };
    run_loops(ctx, context, args).await
}

/// Spawn the configured loops and wait on them. The ledger is opened
/// up front whenever a loop will write to or consult it; a ledger
/// that cannot be opened ends the command.
async fn run_loops(ctx: &AppContext, context: WatchContext, args: WatchArgs) -> CliResult<()> {
    if args.upload.is_some() || (args.download.is_some() && args.strict) {
        context
            .ledger
            .get()
            .await
            .context("could not open the upload ledger")
            .map_err(CliError::failure)?;
    }

    let mut loops = Vec::new();

    if let Some(watch_dir) = args.upload {
        let config = UploadLoopConfig {
            watch_dir,
            remove_local: args.delete,
        };
        let handle = spawn_upload_loop(context.clone(), config).map_err(classify_watch)?;
        loops.push(handle);
    }

    if let Some(download_dir) = args.download {
        let config = DownloadLoopConfig {
            download_dir,
            strict: args.strict,
            video_only: args.video_only,
            flatten: args.flatten,
            remove_remote: args.delete_remote,
            write_sentinel: args.sync_file,
        };
        loops.push(spawn_download_loop(
            context,
            Downloader::new(ctx.http.clone()),
            config,
        ));
    }

    for task in loops {
        task.await
            .map_err(|err| CliError::failure(anyhow!("watch loop ended unexpectedly: {err}")))?;
    }
    Ok(())
}

/// Loop construction failures are argument problems: the path the
/// user gave cannot be watched.
fn classify_watch(error: WatchError) -> CliError {
    match error {
        WatchError::NotADirectory { path } => {
            CliError::validation(format!("{} is not a directory", path.display()))
        }
        WatchError::Io { path, source, .. } => {
            CliError::validation(format!("cannot watch {}: {source}", path.display()))
        }
        other => CliError::failure(other),
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::time::Duration;

    use grapnel_remote::RemoteClient;
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    fn context_for(server: &MockServer) -> AppContext {
        let http = reqwest::Client::new();
        let remote = RemoteClient::new(
            http.clone(),
            server.base_url().parse().expect("valid URL"),
            "cust",
            "1234",
        );
        AppContext { remote, http }
    }

    fn watch_context_for(ctx: &AppContext, ledger: &Path) -> WatchContext {
        WatchContext {
            remote: ctx.remote.clone(),
            ledger: LedgerHandle::new(ledger),
        }
    }

    fn bare_args() -> WatchArgs {
        WatchArgs {
            upload: None,
            delete: false,
            download: None,
            strict: false,
            video_only: false,
            flatten: false,
            delete_remote: false,
            sync_file: false,
        }
    }

    #[tokio::test]
    async fn watch_requires_at_least_one_directory() {
        let server = MockServer::start_async().await;

        let error = handle_watch(&context_for(&server), bare_args())
            .await
            .expect_err("no directories should be rejected");

        assert_eq!(error.exit_code(), 2);
        assert!(error.display_message().contains("--upload"));
    }

    #[tokio::test]
    async fn a_missing_upload_directory_is_a_validation_error() {
        let server = MockServer::start_async().await;
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = context_for(&server);
        let watch = watch_context_for(&ctx, &dir.path().join("grapnel.db"));
        let mut args = bare_args();
        args.upload = Some(dir.path().join("absent"));

        let error = run_loops(&ctx, watch, args)
            .await
            .expect_err("a missing directory should be rejected");

        assert_eq!(error.exit_code(), 2);
        assert!(error.display_message().contains("absent"));
    }

    #[tokio::test]
    async fn watching_a_file_instead_of_a_directory_is_rejected() {
        let server = MockServer::start_async().await;
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("drop.torrent");
        std::fs::write(&file, b"payload").expect("file");
        let ctx = context_for(&server);
        let watch = watch_context_for(&ctx, &dir.path().join("grapnel.db"));
        let mut args = bare_args();
        args.upload = Some(file);

        let error = run_loops(&ctx, watch, args)
            .await
            .expect_err("a plain file should be rejected");

        assert_eq!(error.exit_code(), 2);
        assert!(error.display_message().contains("not a directory"));
    }

    #[tokio::test]
    async fn an_unopenable_ledger_is_fatal_for_uploads() {
        let server = MockServer::start_async().await;
        let create = server.mock(|when, then| {
            when.method(POST).path("/api/transfer/create");
            then.status(200);
        });
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("drop.torrent"), b"d8:announce0:e").expect("torrent file");
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"payload").expect("blocker file");

        let ctx = context_for(&server);
        let watch = watch_context_for(&ctx, &blocker.join("grapnel.db"));
        let mut args = bare_args();
        args.upload = Some(dir.path().to_path_buf());

        let outcome =
            tokio::time::timeout(Duration::from_millis(500), run_loops(&ctx, watch, args)).await;
        let error = outcome
            .expect("the command should end before the deadline")
            .expect_err("an unopenable ledger should end the command");

        assert_eq!(error.exit_code(), 3);
        assert!(error.display_message().contains("upload ledger"));
        create.assert_calls(0);
        assert!(
            dir.path().join("drop.torrent").exists(),
            "the torrent file should be left in place"
        );
    }

    #[tokio::test]
    async fn an_unopenable_ledger_is_fatal_for_strict_downloads() {
        let server = MockServer::start_async().await;
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"payload").expect("blocker file");

        let ctx = context_for(&server);
        let watch = watch_context_for(&ctx, &blocker.join("grapnel.db"));
        let mut args = bare_args();
        args.download = Some(dir.path().to_path_buf());
        args.strict = true;

        let outcome =
            tokio::time::timeout(Duration::from_millis(500), run_loops(&ctx, watch, args)).await;
        let error = outcome
            .expect("the command should end before the deadline")
            .expect_err("an unopenable ledger should end the command");

        assert_eq!(error.exit_code(), 3);
    }

    #[tokio::test]
    async fn non_strict_downloads_run_without_a_ledger() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/transfer/list");
            then.status(200).json_body(json!({"status": "success", "transfers": []}));
        });
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"payload").expect("blocker file");

        let ctx = context_for(&server);
        let watch = watch_context_for(&ctx, &blocker.join("grapnel.db"));
        let mut args = bare_args();
        args.download = Some(dir.path().to_path_buf());

        let outcome =
            tokio::time::timeout(Duration::from_millis(200), run_loops(&ctx, watch, args)).await;

        assert!(outcome.is_err(), "the download loop should stay up");
    }

    #[tokio::test]
    async fn watch_keeps_running_once_the_loops_are_up() {
        let server = MockServer::start_async().await;
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = context_for(&server);
        let watch = watch_context_for(&ctx, &dir.path().join("grapnel.db"));
        let mut args = bare_args();
        args.upload = Some(dir.path().to_path_buf());

        let outcome =
            tokio::time::timeout(Duration::from_millis(200), run_loops(&ctx, watch, args)).await;

        assert!(outcome.is_err(), "the watch loops should not terminate");
    }
}
