//! External process execution.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{SweepError, SweepResult};

/// Result of one external process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStatus {
    /// Executable that was launched.
    pub program: String,

    /// Exit code, -1 when terminated by a signal.
    pub exit_code: i32,

    /// Duration in milliseconds.
    pub duration_ms: u64,

    /// Whether the process exited successfully.
    pub success: bool,
}

impl RunStatus {
    /// Convert an unsuccessful exit into [`SweepError::ExternalTool`].
    pub fn check(self) -> SweepResult<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(SweepError::ExternalTool {
                reason: format!("exited with code {}", self.exit_code),
                program: self.program,
            })
        }
    }
}

/// Runs one argument vector to completion.
///
/// A non-zero exit is reported through [`RunStatus`], not as an error; the
/// caller decides what a failed run means.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn execute(&self, argv: &[String]) -> SweepResult<RunStatus>;
}

/// Launches real processes inside a working directory.
#[derive(Debug, Clone)]
pub struct RunExecutor {
    work_dir: PathBuf,
}

impl RunExecutor {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }
}

#[async_trait]
impl CommandRunner for RunExecutor {
    async fn execute(&self, argv: &[String]) -> SweepResult<RunStatus> {
        let start = Instant::now();

        let (exe, args) = argv.split_first().ok_or_else(|| SweepError::ExternalTool {
            program: String::new(),
            reason: "empty command".to_string(),
        })?;

        debug!(program = %exe, args = ?args, "Launching external process");

        // The tools write their reports to files; console output is passed through untouched.
        let status = Command::new(exe)
            .args(args)
            .current_dir(&self.work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| SweepError::ExternalTool {
                program: exe.clone(),
                reason: format!("failed to launch: {}", e),
            })?;

        let duration_ms = start.elapsed().as_millis() as u64;
        let exit_code = status.code().unwrap_or(-1);

        debug!(program = %exe, exit_code, duration_ms, "External process exited");

        Ok(RunStatus {
            program: exe.clone(),
            exit_code,
            duration_ms,
            success: status.success(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_check_passes_success() {
        let status = RunStatus {
            program: "enc".to_string(),
            exit_code: 0,
            duration_ms: 10,
            success: true,
        };
        assert!(status.check().is_ok());
    }

    #[test]
    fn test_status_check_reports_exit_code() {
        let status = RunStatus {
            program: "enc".to_string(),
            exit_code: 3,
            duration_ms: 10,
            success: false,
        };
        let err = status.check().unwrap_err();
        assert!(matches!(err, SweepError::ExternalTool { .. }));
        assert!(err.to_string().contains("code 3"));
    }

    #[tokio::test]
    async fn test_execute_simple_command() {
        let executor = RunExecutor::new(".");
        let status = executor
            .execute(&["true".to_string()])
            .await
            .expect("execute failed");
        assert!(status.success);
        assert_eq!(status.exit_code, 0);
        assert_eq!(status.program, "true");
    }

    #[tokio::test]
    async fn test_execute_failing_command_is_not_an_error() {
        let executor = RunExecutor::new(".");
        let status = executor
            .execute(&["false".to_string()])
            .await
            .expect("execute failed");
        assert!(!status.success);
        assert_ne!(status.exit_code, 0);
    }

    #[tokio::test]
    async fn test_execute_runs_in_work_dir() {
        let dir = tempfile::tempdir().unwrap();
        let executor = RunExecutor::new(dir.path());
        let status = executor
            .execute(&[
                "sh".to_string(),
                "-c".to_string(),
                "echo 1 > marker.txt".to_string(),
            ])
            .await
            .unwrap();
        assert!(status.success);
        assert!(dir.path().join("marker.txt").exists());
    }

    #[tokio::test]
    async fn test_execute_missing_binary() {
        let executor = RunExecutor::new(".");
        let err = executor
            .execute(&["/nonexistent/vmsweep-encoder".to_string()])
            .await
            .unwrap_err();
        assert!(err.is_tool_failure());
    }

    #[tokio::test]
    async fn test_execute_empty_command() {
        let executor = RunExecutor::new(".");
        assert!(executor.execute(&[]).await.is_err());
    }
}
