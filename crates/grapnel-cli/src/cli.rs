//! Argument surface and the `run` entrypoint.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::anyhow;
use clap::{Args, Parser, Subcommand};
use grapnel_remote::{RemoteClient, RemoteError};
use tracing_subscriber::{EnvFilter, fmt};

use crate::{commands, config};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_LOG_FILTER: &str = "info";

/// Fetch and manage transfers on a remote torrent hosting service.
#[derive(Debug, Parser)]
#[command(name = "grapnel")]
pub(crate) struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true, env = "GRAPNEL_CONFIG", value_name = "FILE")]
    pub(crate) config: Option<PathBuf>,

    /// Log at debug level, including raw service responses.
    #[arg(long, global = true)]
    pub(crate) debug: bool,

    #[command(subcommand)]
    pub(crate) command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// List the account's transfers.
    List,
    /// Print the content tree of a transfer.
    Tree(TreeArgs),
    /// Download the content of a finished transfer.
    Download(DownloadArgs),
    /// Upload a torrent file or magnet link.
    Upload(UploadArgs),
    /// Watch directories to upload torrent files and mirror finished
    /// transfers.
    Watch(WatchArgs),
}

/// Arguments for `grapnel tree`.
#[derive(Debug, Args)]
pub(crate) struct TreeArgs {
    /// Transfer name, matched as a case-insensitive prefix.
    pub(crate) name: String,
}

/// Arguments for `grapnel download`.
#[derive(Debug, Args)]
pub(crate) struct DownloadArgs {
    /// Transfer name, matched as a case-insensitive prefix.
    pub(crate) name: String,

    /// Directory to download into.
    #[arg(short = 'd', long, default_value = ".", value_name = "DIR")]
    pub(crate) directory: PathBuf,

    /// Only download video files, skipping samples.
    #[arg(short = 'v', long)]
    pub(crate) video_only: bool,

    /// Ignore remote directories and place every file directly in the
    /// target directory.
    #[arg(short = 'f', long)]
    pub(crate) flatten: bool,

    /// Stop before the planned total exceeds this size, e.g. "500mb"
    /// or "4gb".
    #[arg(short = 's', long, value_name = "SIZE")]
    pub(crate) stop_after: Option<String>,
}

/// Arguments for `grapnel upload`.
#[derive(Debug, Args)]
pub(crate) struct UploadArgs {
    /// Magnet link or path to a torrent file.
    pub(crate) source: String,
}

/// Arguments for `grapnel watch`.
#[derive(Debug, Args)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct WatchArgs {
    /// Directory to watch for new torrent files to upload.
    #[arg(long, value_name = "DIR")]
    pub(crate) upload: Option<PathBuf>,

    /// Delete a torrent file once it has been uploaded.
    #[arg(long)]
    pub(crate) delete: bool,

    /// Directory that finished transfers are downloaded into.
    #[arg(long, value_name = "DIR")]
    pub(crate) download: Option<PathBuf>,

    /// Only download transfers this tool uploaded itself.
    #[arg(long)]
    pub(crate) strict: bool,

    /// Only download video files, skipping samples.
    #[arg(short = 'v', long)]
    pub(crate) video_only: bool,

    /// Ignore remote directories and place every file directly in the
    /// download directory.
    #[arg(short = 'f', long)]
    pub(crate) flatten: bool,

    /// Delete a transfer from the service once it has been downloaded.
    #[arg(long)]
    pub(crate) delete_remote: bool,

    /// Keep a ".sync" marker file in the download directory while a
    /// poll pass is running.
    #[arg(long)]
    pub(crate) sync_file: bool,
}

/// Classified CLI failure carrying its process exit code.
#[derive(Debug)]
pub(crate) enum CliError {
    /// The command never ran: bad arguments or configuration.
    Validation(String),
    /// The command ran and failed.
    Failure(anyhow::Error),
}

pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cli error: {}", self.display_message())
    }
}

impl std::error::Error for CliError {}

/// Map a remote failure onto the CLI's exit-code taxonomy. Prefix
/// lookups that found nothing or too much are user input problems;
/// everything else is an operational failure.
pub(crate) fn classify_remote(error: RemoteError) -> CliError {
    match error {
        RemoteError::AmbiguousName { prefix } => {
            CliError::validation(format!("more than one transfer name starts with '{prefix}'"))
        }
        RemoteError::NoMatch { prefix } => {
            CliError::validation(format!("no transfer name starts with '{prefix}'"))
        }
        RemoteError::Api { operation, message } => {
            CliError::failure(anyhow!("{operation} rejected by the service: {message}"))
        }
        other => CliError::failure(other),
    }
}

/// Shared handles passed to every command handler.
#[derive(Debug, Clone)]
pub(crate) struct AppContext {
    /// Credentialed client for the hosting service's API.
    pub(crate) remote: RemoteClient,
    /// Plain HTTP client reused for content downloads.
    pub(crate) http: reqwest::Client,
}

/// Parse arguments, execute the selected command, and return the
/// process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    init_logging(cli.debug);
    match dispatch(cli).await {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("error: {}", error.display_message());
            error.exit_code()
        }
    }
}

async fn dispatch(cli: Cli) -> CliResult<()> {
    let settings = config::load(cli.config.as_deref())?;
    let http = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(CliError::failure)?;
    let remote = RemoteClient::new(
        http.clone(),
        settings.base_url,
        settings.customer_id,
        settings.pin,
    )
    .with_debug(cli.debug);
    let ctx = AppContext { remote, http };
    match cli.command {
        Command::List => commands::transfers::handle_list(&ctx).await,
        Command::Tree(args) => commands::transfers::handle_tree(&ctx, args).await,
        Command::Download(args) => commands::transfers::handle_download(&ctx, args).await,
        Command::Upload(args) => commands::transfers::handle_upload(&ctx, args).await,
        Command::Watch(args) => commands::watch::handle_watch(&ctx, args).await,
    }
}

fn init_logging(debug: bool) {
    let default_filter = if debug { "debug" } else { DEFAULT_LOG_FILTER };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    if fmt::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .is_err()
    {
        tracing::debug!("tracing subscriber was already installed");
    }
}
