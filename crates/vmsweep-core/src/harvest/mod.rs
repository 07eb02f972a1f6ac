//! Harvesters turn a tool-specific raw report into one normalized row.
//!
//! A harvester is bound to the report path it reads. The orchestrator calls
//! [`Harvester::read`] after the external run(s) and then [`Harvester::row`];
//! the row must have exactly as many columns as [`Harvester::header_fragment`].

pub mod profiler;
pub mod trace;

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SweepError, SweepResult};
use crate::space::{Encoder, Profile, SweepPoint};

pub use profiler::ProfilerReportHarvester;
pub use trace::TraceHarvester;

/// Sweep metadata handed to a harvester and prefixed to every record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunContext {
    pub encoder: Encoder,
    pub profile: Profile,
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub search_range: String,
}

impl From<&SweepPoint> for RunContext {
    fn from(point: &SweepPoint) -> Self {
        Self {
            encoder: point.encoder,
            profile: point.profile,
            title: point.video.title.clone(),
            width: point.video.width,
            height: point.video.height,
            search_range: point.search_range.clone(),
        }
    }
}

impl RunContext {
    /// Fixed columns matching the default aggregate header.
    pub fn record_prefix(&self) -> String {
        format!(
            "{};{};{};{}x{};{};",
            self.encoder, self.profile, self.title, self.width, self.height, self.search_range
        )
    }
}

/// Reader of one tool-specific report format.
pub trait Harvester: Send {
    /// Raw report this harvester consumes.
    fn report_path(&self) -> &Path;

    /// Column names contributed by this harvester, `;`-separated and newline-terminated.
    fn header_fragment(&self) -> String;

    /// Parse the current report, replacing any previously read state.
    fn read(&mut self, ctx: &RunContext) -> SweepResult<()>;

    /// The last read report as one `;`-separated line, without a newline.
    fn row(&self) -> SweepResult<String>;
}

/// Read a report into memory, mapping an absent file to [`SweepError::ArtifactMissing`].
pub(crate) fn read_report(path: &Path) -> SweepResult<String> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => SweepError::ArtifactMissing {
            path: path.to_path_buf(),
        },
        _ => SweepError::Harvest {
            path: path.to_path_buf(),
            reason: e.to_string(),
        },
    })
}

/// Integers print without a fractional part; everything else with six decimals.
pub(crate) fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.6}", value)
    }
}
