//! CLI argument definitions using clap.

use crate::pipeline::DEFAULT_ARCHIVE_NAME;
use clap::Parser;
#[cfg(feature = "yt-dlp")]
use eyre::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "tubepack")]
#[command(about = "Serve a browser form that fetches videos and playlists as a file or a ZIP")]
#[command(version)]
pub struct Cli {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:8501")]
    pub bind: SocketAddr,

    /// Directory for per-request workspaces, cookie files and archives (default: system temp dir)
    #[arg(long)]
    pub scratch_dir: Option<PathBuf>,

    /// File name of collection archives
    #[arg(long, default_value = DEFAULT_ARCHIVE_NAME)]
    pub archive_name: String,

    #[command(flatten)]
    pub fetch: FetchArgs,
}

/// Extractor defaults applied to every request.
#[derive(clap::Args, Debug)]
pub struct FetchArgs {
    /// Subtitle language fetched when subtitles are requested
    #[arg(long, default_value = "en")]
    pub subtitle_lang: String,

    /// Container separate video and audio streams are merged into (mp4, mkv, webm)
    #[arg(long, default_value = "mp4")]
    pub merge_format: String,

    /// Socket timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub socket_timeout: u64,

    /// Leave timeout, IPv4, certificate and header settings at yt-dlp defaults
    #[arg(long)]
    pub no_network_tuning: bool,

    /// Seed the user-agent rotation for reproducible runs
    #[arg(long)]
    pub agent_seed: Option<u64>,
}

/// Execute CLI command - separated for testing.
#[cfg(feature = "yt-dlp")]
pub fn run_cli(cli: Cli) -> Result<()> {
    use crate::config::ServeConfig;
    use crate::fetch::ytdlp::YtDlp;
    use color_eyre::Section;
    use std::sync::Arc;

    tracing::debug!(?cli, "parsed arguments");

    let config = ServeConfig::try_from(cli)?;
    let pipeline = Arc::new(config.pipeline(YtDlp));

    tokio::runtime::Runtime::new()
        .wrap_err("failed to start async runtime")?
        .block_on(crate::server::serve(config.bind, pipeline))
        .wrap_err_with(|| format!("server on {} stopped with an error", config.bind))
        .with_suggestion(|| "choose a free address with --bind")
}
