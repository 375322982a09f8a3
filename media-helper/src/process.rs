//! External tool execution
//!
//! Tools are invoked with an explicit argument vector (never through a shell),
//! with stdin closed and both output streams captured. A non-zero exit status is
//! an ordinary result; only failing to start or wait on the child is an error.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command as TokioCommand;
use tracing::debug;

use crate::error::ExecError;

/// An external program, identified by a display label and the path used to invoke it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolBinary {
    pub label: &'static str,
    pub path: String,
}

impl ToolBinary {
    pub fn ffmpeg(path: impl Into<String>) -> Self {
        Self { label: "ffmpeg", path: path.into() }
    }

    pub fn ytdlp(path: impl Into<String>) -> Self {
        Self { label: "yt-dlp", path: path.into() }
    }
}

/// Captured result of a finished child process
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs one argument vector to completion.
///
/// `argv[0]` is the program; the rest are passed verbatim.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, argv: &[String]) -> Result<ProcessOutput, ExecError>;
}

/// Runner backed by real child processes
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, argv: &[String]) -> Result<ProcessOutput, ExecError> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| ExecError::Other("empty argument vector".to_string()))?;

        debug!("Spawning: {:?}", argv);

        let result = TokioCommand::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        match result {
            Ok(output) => Ok(ProcessOutput {
                exit_code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ExecError::NotFound { path: program.clone() })
            }
            Err(e) => Err(ExecError::Other(e.to_string())),
        }
    }
}

/// Ask a tool for its version, e.g. `yt-dlp --version`.
///
/// Returns `"unknown"` when the tool is missing, fails, or prints nothing.
pub async fn probe_version(runner: &dyn CommandRunner, tool: &ToolBinary) -> String {
    let argv = vec![tool.path.clone(), "--version".to_string()];
    match runner.run(&argv).await {
        Ok(output) if output.success() => {
            let version = output.stdout.trim();
            if version.is_empty() {
                "unknown".to_string()
            } else {
                version.to_string()
            }
        }
        _ => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_is_not_found() {
        let argv = vec!["/definitely/not/here/yt-dlp".to_string(), "--version".to_string()];
        match SystemRunner.run(&argv).await {
            Err(ExecError::NotFound { path }) => assert_eq!(path, "/definitely/not/here/yt-dlp"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_argv_is_error() {
        assert!(matches!(SystemRunner.run(&[]).await, Err(ExecError::Other(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_streams_and_exit_code() {
        let argv: Vec<String> = ["sh", "-c", "echo out; echo err >&2; exit 3"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let output = SystemRunner.run(&argv).await.unwrap();

        assert_eq!(output.exit_code, Some(3));
        assert!(!output.success());
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[tokio::test]
    async fn test_probe_version_unknown_when_missing() {
        let tool = ToolBinary::ytdlp("/definitely/not/here/yt-dlp");
        assert_eq!(probe_version(&SystemRunner, &tool).await, "unknown");
    }

    #[cfg(unix)]
    fn write_script(dir: &std::path::Path, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-yt-dlp");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().to_string()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_probe_version_trims_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let tool = ToolBinary::ytdlp(write_script(dir.path(), "printf '  2025.01.01  \\n'"));
        assert_eq!(probe_version(&SystemRunner, &tool).await, "2025.01.01");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_probe_version_unknown_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let tool = ToolBinary::ytdlp(write_script(dir.path(), "echo 2025.01.01; exit 1"));
        assert_eq!(probe_version(&SystemRunner, &tool).await, "unknown");
    }
}
