//! Video download module using yt-dlp

mod strategy;
mod ytdlp;

pub use strategy::{run_strategies, Attempt, Outcome, Plan, Strategy, STDERR_TAIL_CHARS, STDOUT_TAIL_CHARS};
pub use ytdlp::{
    failure_message, handle_manifest, handle_page, handle_youtube, manifest_args, output_template,
    page_args, strategy_args, with_update_hint,
};
