//! Request types for the HTTP protocol

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::HelperError;

/// Operations the helper exposes, one per POST path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Merge,
    DownloadManifest,
    DownloadPage,
    DownloadYoutube,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Merge,
        Operation::DownloadManifest,
        Operation::DownloadPage,
        Operation::DownloadYoutube,
    ];

    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.path() == path)
    }

    pub fn path(&self) -> &'static str {
        match self {
            Operation::Merge => "/merge",
            Operation::DownloadManifest => "/download_manifest",
            Operation::DownloadPage => "/download_page",
            Operation::DownloadYoutube => "/download_youtube",
        }
    }
}

/// Default title stems when the client sends no usable hint
pub mod default_titles {
    pub const MANIFEST: &str = "stream-video";
    pub const PAGE: &str = "page-video";
    pub const YOUTUBE: &str = "youtube-video";
}

/// Combine separately downloaded video and audio tracks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRequest {
    pub video_path: String,
    pub audio_path: String,
    pub output_path: String,
}

/// Download an HLS/DASH manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestDownloadRequest {
    pub manifest_url: String,
    pub title_hint: String,
    pub page_url: Option<String>,
    pub output_dir: Option<PathBuf>,
}

/// Download media from a generic web page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDownloadRequest {
    pub page_url: String,
    pub title_hint: String,
    pub output_dir: Option<PathBuf>,
}

/// Download from YouTube through the strategy list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YoutubeDownloadRequest {
    pub video_url: String,
    pub title_hint: String,
    pub output_dir: Option<PathBuf>,
}

/// A validated request; the variant is chosen by the request path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Merge(MergeRequest),
    DownloadManifest(ManifestDownloadRequest),
    DownloadPage(PageDownloadRequest),
    DownloadYoutube(YoutubeDownloadRequest),
}

#[derive(Debug, Default, Deserialize)]
struct MergeBody {
    #[serde(default)]
    video_path: Option<String>,
    #[serde(default)]
    audio_path: Option<String>,
    #[serde(default)]
    output_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ManifestBody {
    #[serde(default)]
    manifest_url: Option<String>,
    #[serde(default)]
    title_hint: Option<String>,
    #[serde(default)]
    page_url: Option<String>,
    #[serde(default)]
    output_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PageBody {
    #[serde(default)]
    page_url: Option<String>,
    #[serde(default)]
    title_hint: Option<String>,
    #[serde(default)]
    output_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct YoutubeBody {
    #[serde(default)]
    video_url: Option<String>,
    #[serde(default)]
    title_hint: Option<String>,
    #[serde(default)]
    output_dir: Option<String>,
}

impl Request {
    /// Decode and validate a request body for `op`.
    ///
    /// JSON errors are reported before any field validation runs.
    pub fn parse(op: Operation, body: &[u8]) -> Result<Self, HelperError> {
        let value: serde_json::Value = serde_json::from_slice(body).map_err(invalid_json)?;

        match op {
            Operation::Merge => {
                let body: MergeBody = decode(value)?;
                match (present(body.video_path), present(body.audio_path), present(body.output_path)) {
                    (Some(video_path), Some(audio_path), Some(output_path)) => {
                        Ok(Request::Merge(MergeRequest { video_path, audio_path, output_path }))
                    }
                    _ => Err(HelperError::InvalidRequest(
                        "video_path, audio_path, output_path are required".to_string(),
                    )),
                }
            }
            Operation::DownloadManifest => {
                let body: ManifestBody = decode(value)?;
                let manifest_url = required(body.manifest_url, "manifest_url")?;
                Ok(Request::DownloadManifest(ManifestDownloadRequest {
                    manifest_url,
                    title_hint: title_or(body.title_hint, default_titles::MANIFEST),
                    page_url: body.page_url.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
                    output_dir: present(body.output_dir).map(PathBuf::from),
                }))
            }
            Operation::DownloadPage => {
                let body: PageBody = decode(value)?;
                let page_url = required(body.page_url, "page_url")?;
                Ok(Request::DownloadPage(PageDownloadRequest {
                    page_url,
                    title_hint: title_or(body.title_hint, default_titles::PAGE),
                    output_dir: present(body.output_dir).map(PathBuf::from),
                }))
            }
            Operation::DownloadYoutube => {
                let body: YoutubeBody = decode(value)?;
                let video_url = required(body.video_url, "video_url")?;
                Ok(Request::DownloadYoutube(YoutubeDownloadRequest {
                    video_url,
                    title_hint: title_or(body.title_hint, default_titles::YOUTUBE),
                    output_dir: present(body.output_dir).map(PathBuf::from),
                }))
            }
        }
    }
}

fn invalid_json(e: impl std::fmt::Display) -> HelperError {
    HelperError::InvalidRequest(format!("Invalid JSON: {}", e))
}

fn decode<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, HelperError> {
    serde_json::from_value(value).map_err(invalid_json)
}

/// Empty strings count as missing
fn present(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.is_empty())
}

fn required(field: Option<String>, name: &str) -> Result<String, HelperError> {
    present(field).ok_or_else(|| HelperError::InvalidRequest(format!("{} is required", name)))
}

fn title_or(hint: Option<String>, default: &str) -> String {
    present(hint)
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(op: Operation, body: &str) -> Result<Request, HelperError> {
        Request::parse(op, body.as_bytes())
    }

    #[test]
    fn test_operation_paths() {
        for op in Operation::ALL {
            assert_eq!(Operation::from_path(op.path()), Some(op));
        }
        assert_eq!(Operation::from_path("/"), None);
        assert_eq!(Operation::from_path("/merge/"), None);
    }

    #[test]
    fn test_invalid_json_reported_first() {
        let err = parse(Operation::Merge, "{not json").unwrap_err();
        assert!(err.to_string().starts_with("Invalid JSON: "), "{}", err);
    }

    #[test]
    fn test_empty_body_is_invalid_json() {
        let err = parse(Operation::DownloadPage, "").unwrap_err();
        assert!(err.to_string().starts_with("Invalid JSON: "));
    }

    #[test]
    fn test_non_object_body_rejected() {
        let err = parse(Operation::DownloadYoutube, "[1, 2]").unwrap_err();
        assert!(matches!(err, HelperError::InvalidRequest(_)));
        assert!(err.to_string().starts_with("Invalid JSON: "));
    }

    #[test]
    fn test_merge_requires_all_paths() {
        let err = parse(
            Operation::Merge,
            r#"{"video_path": "/v.mp4", "audio_path": "", "output_path": "out.mp4"}"#,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "video_path, audio_path, output_path are required");
    }

    #[test]
    fn test_merge_ok() {
        let req = parse(
            Operation::Merge,
            r#"{"video_path": "/v.mp4", "audio_path": "/a.m4a", "output_path": "out.mp4"}"#,
        )
        .unwrap();
        assert_eq!(
            req,
            Request::Merge(MergeRequest {
                video_path: "/v.mp4".into(),
                audio_path: "/a.m4a".into(),
                output_path: "out.mp4".into(),
            })
        );
    }

    #[test]
    fn test_manifest_defaults() {
        let req = parse(
            Operation::DownloadManifest,
            r#"{"manifest_url": "https://cdn.example/x.m3u8", "page_url": "   ", "output_dir": ""}"#,
        )
        .unwrap();
        match req {
            Request::DownloadManifest(m) => {
                assert_eq!(m.title_hint, "stream-video");
                assert_eq!(m.page_url, None);
                assert_eq!(m.output_dir, None);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_missing_required_urls() {
        assert_eq!(
            parse(Operation::DownloadManifest, "{}").unwrap_err().to_string(),
            "manifest_url is required"
        );
        assert_eq!(
            parse(Operation::DownloadPage, r#"{"title_hint": "x"}"#).unwrap_err().to_string(),
            "page_url is required"
        );
        assert_eq!(
            parse(Operation::DownloadYoutube, r#"{"video_url": ""}"#).unwrap_err().to_string(),
            "video_url is required"
        );
    }

    #[test]
    fn test_title_hint_trimmed() {
        let req = parse(
            Operation::DownloadYoutube,
            r#"{"video_url": "https://youtu.be/abc", "title_hint": "  Talk  ", "output_dir": "/tmp/dl"}"#,
        )
        .unwrap();
        match req {
            Request::DownloadYoutube(y) => {
                assert_eq!(y.title_hint, "Talk");
                assert_eq!(y.output_dir, Some(PathBuf::from("/tmp/dl")));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_wrong_field_type_rejected() {
        let err = parse(Operation::DownloadPage, r#"{"page_url": 42}"#).unwrap_err();
        assert!(err.to_string().starts_with("Invalid JSON: "));
    }
}
