//! Ordered fallback strategies for YouTube downloads
//!
//! YouTube's extraction path changes often, so a single yt-dlp invocation is not
//! reliable. Each strategy is a different argument vector; they run in order and
//! the first zero exit wins. Every strategy runs at most once per request.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ExecError;
use crate::process::{CommandRunner, ProcessOutput};
use crate::utils;

/// Bound on captured stderr kept per attempt
pub const STDERR_TAIL_CHARS: usize = 1500;
/// Bound on captured stdout kept per attempt
pub const STDOUT_TAIL_CHARS: usize = 1000;

/// One yt-dlp extraction approach
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Strategy {
    pub name: String,
    /// Value for `-f`; yt-dlp's own default when absent
    #[serde(default)]
    pub format: Option<String>,
    /// Player clients advertised via `--extractor-args youtube:player_client=...`
    #[serde(default)]
    pub player_clients: Vec<String>,
}

impl Strategy {
    pub fn new(name: &str, format: Option<&str>, player_clients: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            format: format.map(str::to_string),
            player_clients: player_clients.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Built-in strategy order
    pub fn defaults() -> Vec<Self> {
        vec![
            Strategy::new("best-av", Some("bv*+ba/b"), &[]),
            Strategy::new("mobile-clients", None, &["ios", "mweb", "web"]),
            Strategy::new(
                "embedded-mp4",
                Some("bv*[ext=mp4]+ba[ext=m4a]/b[ext=mp4]/bv*+ba/b"),
                &["ios", "web_embedded", "mweb", "web"],
            ),
        ]
    }
}

/// A strategy with its argument vector already built
#[derive(Debug, Clone)]
pub struct Plan {
    pub strategy: String,
    pub argv: Vec<String>,
}

/// Record of one executed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub strategy: String,
    pub argv: Vec<String>,
    pub exit_code: Option<i32>,
    pub stdout_tail: String,
    pub stderr_tail: String,
}

impl Attempt {
    pub fn record(strategy: impl Into<String>, argv: Vec<String>, output: &ProcessOutput) -> Self {
        Self {
            strategy: strategy.into(),
            argv,
            exit_code: output.exit_code,
            stdout_tail: utils::tail(&output.stdout, STDOUT_TAIL_CHARS),
            stderr_tail: utils::tail(&output.stderr, STDERR_TAIL_CHARS),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Stderr tail, or stdout tail when stderr was empty
    pub fn diagnostic(&self) -> Option<&str> {
        if !self.stderr_tail.is_empty() {
            Some(&self.stderr_tail)
        } else if !self.stdout_tail.is_empty() {
            Some(&self.stdout_tail)
        } else {
            None
        }
    }
}

/// Terminal state of a strategy run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded(Vec<Attempt>),
    AllFailed(Vec<Attempt>),
}

impl Outcome {
    pub fn attempts(&self) -> &[Attempt] {
        match self {
            Outcome::Succeeded(attempts) | Outcome::AllFailed(attempts) => attempts,
        }
    }

    pub fn last(&self) -> Option<&Attempt> {
        self.attempts().last()
    }
}

/// Run plans in order until one exits with status 0.
///
/// An executor error (missing binary, spawn failure) stops the run at once.
pub async fn run_strategies(
    runner: &dyn CommandRunner,
    plans: Vec<Plan>,
) -> Result<Outcome, ExecError> {
    let total = plans.len();
    let mut attempts = Vec::with_capacity(total);

    for (idx, plan) in plans.into_iter().enumerate() {
        info!("YouTube attempt {}/{} ({})", idx + 1, total, plan.strategy);

        let output = runner.run(&plan.argv).await?;
        let attempt = Attempt::record(plan.strategy, plan.argv, &output);
        let succeeded = attempt.succeeded();

        if !succeeded {
            warn!(
                "Strategy {} exited with {:?}",
                attempt.strategy, attempt.exit_code
            );
        }
        attempts.push(attempt);

        if succeeded {
            return Ok(Outcome::Succeeded(attempts));
        }
    }

    Ok(Outcome::AllFailed(attempts))
}
