//! Browser Utility Media Helper
//!
//! A local HTTP service that merges and downloads media on behalf of the
//! Browser Utility extension, using ffmpeg and yt-dlp.

pub mod config;
pub mod download;
pub mod error;
pub mod merge;
pub mod process;
pub mod protocol;
pub mod server;
pub mod utils;
