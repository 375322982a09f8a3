//! Browser Utility Media Helper
//!
//! Exposes:
//! - POST /merge: combine downloaded video/audio tracks using ffmpeg
//! - POST /download_youtube: download+merge YouTube media using yt-dlp
//! - POST /download_manifest: download+merge HLS/DASH manifest URLs using yt-dlp
//! - POST /download_page: download media from a generic page URL using yt-dlp

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use media_helper::config::{self, HelperConfig};
use media_helper::process::{self, CommandRunner, SystemRunner, ToolBinary};
use media_helper::server::{self, AppState, ServerConfig};
use media_helper::utils;

/// Local media helper for the Browser Utility extension
#[derive(Parser, Debug)]
#[command(name = "media-helper")]
#[command(about = "Run local media helper service")]
#[command(version)]
struct Args {
    /// Host to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8765")]
    port: u16,

    /// ffmpeg executable
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: String,

    /// yt-dlp executable
    #[arg(long = "yt-dlp", default_value = "yt-dlp")]
    yt_dlp: String,

    /// Default directory for downloads (defaults to ~/Downloads/BrowserUtility)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// JSON file with an ordered list of YouTube extraction strategies
    #[arg(long)]
    strategies: Option<PathBuf>,

    /// Run in background (no banner, no logging)
    #[arg(long)]
    background: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    if !args.background {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(args.log_level.to_lowercase()));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);
    let ffmpeg = ToolBinary::ffmpeg(&args.ffmpeg);
    let ytdlp = ToolBinary::ytdlp(&args.yt_dlp);
    let ytdlp_version = process::probe_version(runner.as_ref(), &ytdlp).await;
    let output_dir = args.output_dir.clone().unwrap_or_else(utils::get_download_dir);

    let mut helper_config = HelperConfig::new(ffmpeg, ytdlp, output_dir).with_version(ytdlp_version);
    if let Some(path) = &args.strategies {
        let strategies = config::load_strategies(path)?;
        info!("Loaded {} strategies from {}", strategies.len(), path.display());
        helper_config = helper_config.with_strategies(strategies);
    }

    // Print startup banner
    if !args.background {
        let strategy_names: Vec<&str> = helper_config.strategies.iter().map(|s| s.name.as_str()).collect();

        println!();
        println!("========================================================");
        println!("  Browser Utility Media Helper v{}", env!("CARGO_PKG_VERSION"));
        println!("========================================================");
        println!("  HTTP:       http://{}:{}", args.host, args.port);
        println!("  ffmpeg:     {}", helper_config.ffmpeg.path);
        println!("  yt-dlp:     {} [version {}]", helper_config.ytdlp.path, helper_config.ytdlp_version);
        println!("  Strategies: {}", strategy_names.join(", "));
        println!("  Downloads:  {}", helper_config.output_dir.display());
        println!("========================================================");
        println!();
    }

    let server_config = ServerConfig {
        host: args.host,
        port: args.port,
    };
    let state = Arc::new(AppState::new(helper_config, runner));

    // Start server
    if let Err(e) = server::run(server_config, state).await {
        error!("Server error: {}", e);
        return Err(e);
    }

    Ok(())
}
