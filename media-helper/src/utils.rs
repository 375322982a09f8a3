//! Cross-platform path and text helpers

use std::path::{Component, Path, PathBuf};

/// Characters that are not allowed in file names on common platforms
const ILLEGAL_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Get the default download directory for helper downloads
pub fn get_download_dir() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join("Downloads").join("BrowserUtility"),
        None => std::env::temp_dir().join("BrowserUtility"),
    }
}

/// Turn a user supplied title into a file name stem.
pub fn sanitize_title(hint: &str, fallback: &str) -> String {
    let replaced: String = hint
        .chars()
        .map(|c| if ILLEGAL_FILENAME_CHARS.contains(&c) { ' ' } else { c })
        .collect();

    let trimmed = replaced.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Resolve the merge output path and make sure its directory exists.
///
/// Absolute paths are kept as-is. Relative paths are placed next to the input
/// video (or under the working directory when the video has no parent).
pub fn resolve_output(output_path: &str, input_video_path: &str) -> std::io::Result<PathBuf> {
    let output = Path::new(output_path);

    let resolved = if output.is_absolute() {
        output.to_path_buf()
    } else {
        let cwd = std::env::current_dir()?;
        let video = absolutize(Path::new(input_video_path), &cwd);
        let base = match video.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => cwd,
        };
        normalize(&base.join(output))
    };

    if let Some(parent) = resolved.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    Ok(resolved)
}

fn absolutize(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&cwd.join(path))
    }
}

/// Lexically normalize a path: drop `.` and let `..` pop the previous component.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Never pop past the root
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Last `max_chars` characters of `text` after trimming surrounding whitespace.
pub fn tail(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    let count = trimmed.chars().count();
    if count <= max_chars {
        return trimmed.to_string();
    }
    trimmed.chars().skip(count - max_chars).collect()
}
