//! How a sweep point is run: plain instrumented encode, or encode under a profiler.

use std::path::PathBuf;

use crate::command::CommandBuilder;

/// Run shape of one sweep variant.
pub trait RunStrategy: Send + Sync {
    /// Short variant name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Final command for the encode run.
    fn encode_command(&self, builder: &CommandBuilder, encode: Vec<String>) -> Vec<String>;

    /// Optional follow-up run that turns raw tool output into the harvested report.
    fn export_command(&self, builder: &CommandBuilder) -> Option<Vec<String>>;

    /// Files and directories a single run leaves behind, relative to the work dir.
    fn transient_artifacts(&self) -> Vec<PathBuf>;
}

/// The encoder itself writes the trace; no wrapping, no export.
#[derive(Debug, Clone)]
pub struct TraceStrategy {
    trace_file: PathBuf,
}

impl TraceStrategy {
    pub fn new(trace_file: impl Into<PathBuf>) -> Self {
        Self {
            trace_file: trace_file.into(),
        }
    }
}

impl RunStrategy for TraceStrategy {
    fn name(&self) -> &'static str {
        "trace"
    }

    fn encode_command(&self, _builder: &CommandBuilder, encode: Vec<String>) -> Vec<String> {
        encode
    }

    fn export_command(&self, _builder: &CommandBuilder) -> Option<Vec<String>> {
        None
    }

    fn transient_artifacts(&self) -> Vec<PathBuf> {
        vec![self.trace_file.clone()]
    }
}

/// The encode runs under the profiler launcher, then the result directory is exported.
#[derive(Debug, Clone)]
pub struct ProfiledExportStrategy {
    result_dir: PathBuf,
    report_file: PathBuf,
}

impl ProfiledExportStrategy {
    pub fn new(result_dir: impl Into<PathBuf>, report_file: impl Into<PathBuf>) -> Self {
        Self {
            result_dir: result_dir.into(),
            report_file: report_file.into(),
        }
    }
}

impl RunStrategy for ProfiledExportStrategy {
    fn name(&self) -> &'static str {
        "profiler"
    }

    fn encode_command(&self, builder: &CommandBuilder, encode: Vec<String>) -> Vec<String> {
        builder.build_profiled_command(encode)
    }

    fn export_command(&self, builder: &CommandBuilder) -> Option<Vec<String>> {
        Some(builder.build_report_export_command())
    }

    fn transient_artifacts(&self) -> Vec<PathBuf> {
        vec![self.report_file.clone(), self.result_dir.clone()]
    }
}
