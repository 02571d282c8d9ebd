//! Handlers for the list, tree, download, and upload commands.

use std::path::Path;

use bytesize::ByteSize;
use grapnel_fetch::{Downloader, PlanOptions, plan_downloads};

use crate::cli::{
    AppContext, CliError, CliResult, DownloadArgs, TreeArgs, UploadArgs, classify_remote,
};
use crate::output;

pub(crate) async fn handle_list(ctx: &AppContext) -> CliResult<()> {
    let transfers = ctx.remote.list_transfers().await.map_err(classify_remote)?;
    output::render_transfer_list(&transfers);
    Ok(())
}

pub(crate) async fn handle_tree(ctx: &AppContext, args: TreeArgs) -> CliResult<()> {
    let transfer = ctx
        .remote
        .find_transfer(&args.name)
        .await
        .map_err(classify_remote)?;
    let tree = ctx
        .remote
        .browse_transfer(&transfer.hash)
        .await
        .map_err(classify_remote)?;
    output::render_content_tree(&tree.content);
    Ok(())
}

pub(crate) async fn handle_download(ctx: &AppContext, args: DownloadArgs) -> CliResult<()> {
    let budget = args.stop_after.as_deref().map(parse_byte_limit).transpose()?;
    let transfer = ctx
        .remote
        .find_transfer(&args.name)
        .await
        .map_err(classify_remote)?;
    let tree = ctx
        .remote
        .browse_transfer(&transfer.hash)
        .await
        .map_err(classify_remote)?;
    let options = PlanOptions {
        video_only: args.video_only,
        flatten: args.flatten,
    };
    let tasks = plan_downloads(&args.directory, &tree.content, options);
    Downloader::new(ctx.http.clone())
        .run(tasks, budget)
        .await
        .map_err(CliError::failure)
}

pub(crate) async fn handle_upload(ctx: &AppContext, args: UploadArgs) -> CliResult<()> {
    let ticket = if args.source.starts_with("magnet:") {
        ctx.remote.upload_magnet(&args.source).await
    } else {
        ctx.remote
            .upload_torrent_file(Path::new(&args.source))
            .await
    }
    .map_err(classify_remote)?;
    println!("created transfer {} [{}]", ticket.id, ticket.name);
    Ok(())
}

/// Parse a human byte size such as "500mb" or "4gb" into bytes.
fn parse_byte_limit(input: &str) -> CliResult<u64> {
    input
        .parse::<ByteSize>()
        .map(|size| size.as_u64())
        .map_err(|err| CliError::validation(format!("invalid size limit '{input}': {err}")))
}
