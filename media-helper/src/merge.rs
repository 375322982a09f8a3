//! Audio/video track merging with ffmpeg
//!
//! Streams are always copied into the output container, never re-encoded.

use std::path::Path;

use tracing::{info, warn};

use crate::config::HelperConfig;
use crate::error::HelperError;
use crate::process::{CommandRunner, ToolBinary};
use crate::protocol::{MergeRequest, Response};
use crate::utils;

/// Bound on ffmpeg stderr returned to the client
const STDERR_TAIL_CHARS: usize = 1000;

/// `ffmpeg -y -i <video> -i <audio> -c:v copy -c:a copy <output>`
pub fn merge_args(ffmpeg: &ToolBinary, video_path: &str, audio_path: &str, output: &Path) -> Vec<String> {
    vec![
        ffmpeg.path.clone(),
        "-y".to_string(),
        "-i".to_string(),
        video_path.to_string(),
        "-i".to_string(),
        audio_path.to_string(),
        "-c:v".to_string(),
        "copy".to_string(),
        "-c:a".to_string(),
        "copy".to_string(),
        output.to_string_lossy().to_string(),
    ]
}

/// Merge one video and one audio file into `output_path`
pub async fn handle_merge(
    req: &MergeRequest,
    config: &HelperConfig,
    runner: &dyn CommandRunner,
) -> Result<Response, HelperError> {
    let output = utils::resolve_output(&req.output_path, &req.video_path)?;
    let argv = merge_args(&config.ffmpeg, &req.video_path, &req.audio_path, &output);

    info!(
        "Merge start: video={} audio={} out={}",
        req.video_path,
        req.audio_path,
        output.display()
    );

    let result = runner
        .run(&argv)
        .await
        .map_err(|e| HelperError::from_exec(config.ffmpeg.label, e));

    let output_proc = match result {
        Ok(o) => o,
        Err(e) => {
            warn!("Merge failed: {}", e);
            return Err(e);
        }
    };

    if !output_proc.success() {
        let stderr = utils::tail(&output_proc.stderr, STDERR_TAIL_CHARS);
        let msg = if stderr.is_empty() { "ffmpeg failed".to_string() } else { stderr };
        warn!("Merge failed: {}", msg);
        return Err(HelperError::ToolFailed(msg));
    }

    let output_path = output.to_string_lossy().to_string();
    info!("Merge success: {}", output_path);
    Ok(Response::merged(&output_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_args_copy_both_streams() {
        let args = merge_args(
            &ToolBinary::ffmpeg("ffmpeg"),
            "/a/b/video.mp4",
            "/a/b/audio.m4a",
            Path::new("/a/b/out.mp4"),
        );
        assert_eq!(
            args,
            vec![
                "ffmpeg", "-y", "-i", "/a/b/video.mp4", "-i", "/a/b/audio.m4a",
                "-c:v", "copy", "-c:a", "copy", "/a/b/out.mp4",
            ]
        );
    }
}
