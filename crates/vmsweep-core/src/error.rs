//! Error types for sweep orchestration.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while enumerating, running, harvesting or aggregating a sweep.
#[derive(Debug, Error)]
pub enum SweepError {
    /// A video path does not follow the `{any}_{title}_{W}x{H}_{fps}.{ext}` convention.
    #[error("cannot parse video name {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    /// An external process could not be launched or exited unsuccessfully.
    #[error("external tool {program} failed: {reason}")]
    ExternalTool { program: String, reason: String },

    /// A file the harvester expected was not produced.
    #[error("expected artifact missing: {path}")]
    ArtifactMissing { path: PathBuf },

    /// A raw report exists but its content could not be harvested.
    #[error("cannot harvest {path}: {reason}")]
    Harvest { path: PathBuf, reason: String },

    /// Appending to the aggregate output failed; the file can no longer be trusted.
    #[error("aggregate write to {path} failed: {source}")]
    AggregateWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Walking the video root failed.
    #[error("video traversal error: {0}")]
    Traversal(#[from] walkdir::Error),

    /// Invalid or unreadable sweep configuration.
    #[error("invalid sweep configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SweepError {
    /// Whether this error must stop the whole sweep rather than a single point.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SweepError::AggregateWrite { .. } | SweepError::Config(_)
        )
    }

    /// Whether retrying the same point may succeed.
    ///
    /// A missing artifact is treated the same as a failing tool.
    pub fn is_tool_failure(&self) -> bool {
        matches!(
            self,
            SweepError::ExternalTool { .. } | SweepError::ArtifactMissing { .. }
        )
    }
}

/// Convenience result alias.
pub type SweepResult<T> = std::result::Result<T, SweepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_displays_path() {
        let err = SweepError::Parse {
            path: PathBuf::from("videos/readme.txt"),
            reason: "expected 4 segments".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("videos/readme.txt"));
        assert!(msg.contains("4 segments"));
    }

    #[test]
    fn test_fatal_classification() {
        let append = SweepError::AggregateWrite {
            path: PathBuf::from("out.txt"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        assert!(append.is_fatal());
        assert!(SweepError::Config("no encoders".to_string()).is_fatal());

        let tool = SweepError::ExternalTool {
            program: "enc".to_string(),
            reason: "exit code 1".to_string(),
        };
        assert!(!tool.is_fatal());
        assert!(tool.is_tool_failure());
    }

    #[test]
    fn test_missing_artifact_counts_as_tool_failure() {
        let err = SweepError::ArtifactMissing {
            path: PathBuf::from("mem_trace.txt"),
        };
        assert!(err.is_tool_failure());
        assert!(!err.is_fatal());
    }
}
