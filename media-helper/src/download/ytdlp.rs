//! yt-dlp download implementation
//!
//! Covers HLS/DASH manifests, generic pages, and YouTube. All three write
//! `<output_dir>/<title>.%(ext)s` and let yt-dlp merge separate audio/video
//! streams into mp4.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::strategy::{run_strategies, Attempt, Outcome, Plan, Strategy};
use crate::config::HelperConfig;
use crate::error::HelperError;
use crate::process::{CommandRunner, ToolBinary};
use crate::protocol::{
    default_titles, ManifestDownloadRequest, PageDownloadRequest, Response, YoutubeDownloadRequest,
};
use crate::utils;

const MERGE_FORMAT: &str = "mp4";

/// Substring yt-dlp prints when its YouTube signature code is stale
const STALE_EXTRACTOR_MARKER: &str = "nsig extraction failed";

const UPDATE_HINT: &str = "Hint: local yt-dlp may be outdated. Re-run installer to fetch latest nightly yt-dlp, restart helper, and retry.";

/// `<dir>/<stem>.%(ext)s`
pub fn output_template(output_dir: &Path, title_stem: &str) -> String {
    output_dir
        .join(format!("{}.%(ext)s", title_stem))
        .to_string_lossy()
        .to_string()
}

fn base_args(ytdlp: &ToolBinary) -> Vec<String> {
    vec![ytdlp.path.clone(), "--no-playlist".to_string()]
}

fn output_args(args: &mut Vec<String>, template: &str) {
    args.extend([
        "--merge-output-format".to_string(),
        MERGE_FORMAT.to_string(),
        "-o".to_string(),
        template.to_string(),
    ]);
}

/// Arguments for a manifest download, with an optional `Referer` override
pub fn manifest_args(
    ytdlp: &ToolBinary,
    template: &str,
    manifest_url: &str,
    referer: Option<&str>,
) -> Vec<String> {
    let mut args = base_args(ytdlp);
    output_args(&mut args, template);
    if let Some(page_url) = referer {
        args.push("--add-header".to_string());
        args.push(format!("Referer: {}", page_url));
    }
    args.push(manifest_url.to_string());
    args
}

/// Arguments for a generic page download
pub fn page_args(ytdlp: &ToolBinary, template: &str, page_url: &str) -> Vec<String> {
    let mut args = base_args(ytdlp);
    output_args(&mut args, template);
    args.push(page_url.to_string());
    args
}

/// Arguments for one YouTube strategy
pub fn strategy_args(ytdlp: &ToolBinary, strategy: &Strategy, template: &str, video_url: &str) -> Vec<String> {
    let mut args = base_args(ytdlp);
    if !strategy.player_clients.is_empty() {
        args.push("--extractor-args".to_string());
        args.push(format!("youtube:player_client={}", strategy.player_clients.join(",")));
    }
    if let Some(format) = &strategy.format {
        args.push("-f".to_string());
        args.push(format.clone());
    }
    output_args(&mut args, template);
    args.push(video_url.to_string());
    args
}

/// Failure text: bounded diagnostic plus the tool identification line
pub fn failure_message(attempt: Option<&Attempt>, fallback: &str, ytdlp: &ToolBinary, version: &str) -> String {
    let diagnostic = attempt.and_then(Attempt::diagnostic).unwrap_or(fallback);
    format!("{}\n[{}:{} version:{}]", diagnostic, ytdlp.label, ytdlp.path, version)
}

/// Append the update hint when the message points at a stale extractor
pub fn with_update_hint(message: String) -> String {
    if message.to_lowercase().contains(STALE_EXTRACTOR_MARKER) {
        format!("{}\n{}", message, UPDATE_HINT)
    } else {
        message
    }
}

fn prepare_output_dir(requested: Option<&PathBuf>, config: &HelperConfig) -> Result<PathBuf, HelperError> {
    let dir = requested.cloned().unwrap_or_else(|| config.output_dir.clone());
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Run a single yt-dlp invocation and turn a failure into a bounded message
async fn run_single(
    name: &str,
    argv: Vec<String>,
    fallback: &str,
    config: &HelperConfig,
    runner: &dyn CommandRunner,
) -> Result<(), HelperError> {
    let output = runner
        .run(&argv)
        .await
        .map_err(|e| HelperError::from_exec(config.ytdlp.label, e))?;

    let attempt = Attempt::record(name, argv, &output);
    if attempt.succeeded() {
        return Ok(());
    }

    let msg = failure_message(Some(&attempt), fallback, &config.ytdlp, &config.ytdlp_version);
    Err(HelperError::ToolFailed(msg))
}

/// Download an HLS/DASH manifest
pub async fn handle_manifest(
    req: &ManifestDownloadRequest,
    config: &HelperConfig,
    runner: &dyn CommandRunner,
) -> Result<Response, HelperError> {
    let stem = utils::sanitize_title(&req.title_hint, default_titles::MANIFEST);
    let output_dir = prepare_output_dir(req.output_dir.as_ref(), config)?;
    let template = output_template(&output_dir, &stem);

    let argv = manifest_args(&config.ytdlp, &template, &req.manifest_url, req.page_url.as_deref());
    info!("Manifest download start: manifest={} out={}", req.manifest_url, template);

    if let Err(e) = run_single("manifest", argv, "yt-dlp manifest download failed", config, runner).await {
        warn!("Manifest download failed: {}", e);
        return Err(e);
    }

    info!("Manifest download success: out_dir={}", output_dir.display());
    Ok(Response::downloaded(
        &output_dir.to_string_lossy(),
        "Manifest download started/completed via yt-dlp helper.",
    ))
}

/// Download media found on a generic page
pub async fn handle_page(
    req: &PageDownloadRequest,
    config: &HelperConfig,
    runner: &dyn CommandRunner,
) -> Result<Response, HelperError> {
    let stem = utils::sanitize_title(&req.title_hint, default_titles::PAGE);
    let output_dir = prepare_output_dir(req.output_dir.as_ref(), config)?;
    let template = output_template(&output_dir, &stem);

    let argv = page_args(&config.ytdlp, &template, &req.page_url);
    info!("Page download start: page={} out={}", req.page_url, template);

    if let Err(e) = run_single("page", argv, "yt-dlp page download failed", config, runner).await {
        warn!("Page download failed: {}", e);
        return Err(e);
    }

    info!("Page download success: out_dir={}", output_dir.display());
    Ok(Response::downloaded(
        &output_dir.to_string_lossy(),
        "Page download started/completed via yt-dlp helper.",
    ))
}

/// Download from YouTube, falling back through the configured strategies
pub async fn handle_youtube(
    req: &YoutubeDownloadRequest,
    config: &HelperConfig,
    runner: &dyn CommandRunner,
) -> Result<Response, HelperError> {
    let stem = utils::sanitize_title(&req.title_hint, default_titles::YOUTUBE);
    let output_dir = prepare_output_dir(req.output_dir.as_ref(), config)?;
    let template = output_template(&output_dir, &stem);

    let plans: Vec<Plan> = config
        .strategies
        .iter()
        .map(|s| Plan {
            strategy: s.name.clone(),
            argv: strategy_args(&config.ytdlp, s, &template, &req.video_url),
        })
        .collect();

    info!(
        "YouTube download start: url={} out={} attempts={}",
        req.video_url,
        template,
        plans.len()
    );

    let outcome = run_strategies(runner, plans)
        .await
        .map_err(|e| HelperError::from_exec(config.ytdlp.label, e))?;

    match outcome {
        Outcome::Succeeded(attempts) => {
            info!(
                "YouTube download success on attempt {}: out_dir={}",
                attempts.len(),
                output_dir.display()
            );
            Ok(Response::downloaded(
                &output_dir.to_string_lossy(),
                "YouTube download started/completed via yt-dlp helper.",
            ))
        }
        Outcome::AllFailed(attempts) => {
            let msg = failure_message(attempts.last(), "yt-dlp failed", &config.ytdlp, &config.ytdlp_version);
            let msg = with_update_hint(msg);
            warn!("YouTube download failed after all attempts: {}", msg);
            Err(HelperError::AllStrategiesFailed(msg))
        }
    }
}
