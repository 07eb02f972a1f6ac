//! Memory-access trace written by the instrumented encoder.
//!
//! Each non-empty line describes one candidate block visited by motion
//! estimation: `<block label> <bytes accessed>`. Lines starting with `#` are
//! comments.

use std::path::{Path, PathBuf};

use crate::error::{SweepError, SweepResult};
use crate::harvest::{format_value, read_report, Harvester, RunContext};

const BYTES_PER_GB: f64 = 1_000_000_000.0;

#[derive(Debug, Clone, Default, PartialEq)]
struct TraceTotals {
    candidates: u64,
    bytes: u64,
    per_block: Vec<u64>,
}

/// Summarizes a trace into candidate-block and accessed-data columns.
#[derive(Debug)]
pub struct TraceHarvester {
    report: PathBuf,
    block_sizes: Vec<String>,
    totals: Option<TraceTotals>,
}

impl TraceHarvester {
    pub fn new(report: impl Into<PathBuf>, block_sizes: Vec<String>) -> Self {
        Self {
            report: report.into(),
            block_sizes,
            totals: None,
        }
    }

    fn parse(&self, content: &str) -> SweepResult<TraceTotals> {
        let mut totals = TraceTotals {
            per_block: vec![0; self.block_sizes.len()],
            ..TraceTotals::default()
        };

        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split_whitespace();
            let (label, bytes) = match (fields.next(), fields.next()) {
                (Some(label), Some(bytes)) => (label, bytes),
                _ => return Err(self.malformed(index, "expected '<block> <bytes>'")),
            };
            let bytes: u64 = bytes
                .parse()
                .map_err(|_| self.malformed(index, "byte count is not an integer"))?;

            totals.candidates += 1;
            totals.bytes += bytes;
            if let Some(slot) = self.block_sizes.iter().position(|b| b == label) {
                totals.per_block[slot] += 1;
            }
        }
        Ok(totals)
    }

    fn malformed(&self, index: usize, reason: &str) -> SweepError {
        SweepError::Harvest {
            path: self.report.clone(),
            reason: format!("line {}: {}", index + 1, reason),
        }
    }
}

impl Harvester for TraceHarvester {
    fn report_path(&self) -> &Path {
        &self.report
    }

    fn header_fragment(&self) -> String {
        let mut columns = vec![
            "Candidate blocks".to_string(),
            "Accessed data".to_string(),
            "Accessed data (GB)".to_string(),
        ];
        columns.extend(self.block_sizes.iter().cloned());
        format!("{}\n", columns.join(";"))
    }

    fn read(&mut self, _ctx: &RunContext) -> SweepResult<()> {
        self.totals = None;
        let content = read_report(&self.report)?;
        self.totals = Some(self.parse(&content)?);
        Ok(())
    }

    fn row(&self) -> SweepResult<String> {
        let totals = self.totals.as_ref().ok_or_else(|| SweepError::Harvest {
            path: self.report.clone(),
            reason: "no trace has been read".to_string(),
        })?;

        let mut values = vec![
            totals.candidates.to_string(),
            totals.bytes.to_string(),
            format_value(totals.bytes as f64 / BYTES_PER_GB),
        ];
        values.extend(totals.per_block.iter().map(u64::to_string));
        Ok(values.join(";"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::{Encoder, Profile};

    fn ctx() -> RunContext {
        RunContext {
            encoder: Encoder::Hevc,
            profile: Profile::LowDelay,
            title: "Foreman".to_string(),
            width: 352,
            height: 288,
            search_range: "64".to_string(),
        }
    }

    fn blocks() -> Vec<String> {
        vec!["64x64".to_string(), "8x8".to_string()]
    }

    #[test]
    fn test_header_fragment() {
        let harvester = TraceHarvester::new("mem_trace.txt", blocks());
        assert_eq!(
            harvester.header_fragment(),
            "Candidate blocks;Accessed data;Accessed data (GB);64x64;8x8\n"
        );
    }

    #[test]
    fn test_read_and_row() {
        let dir = tempfile::tempdir().unwrap();
        let trace = dir.path().join("mem_trace.txt");
        std::fs::write(
            &trace,
            "# block bytes\n64x64 500000000\n8x8 250000000\n\n64x64 250000000\n16x16 0\n",
        )
        .unwrap();

        let mut harvester = TraceHarvester::new(&trace, blocks());
        harvester.read(&ctx()).unwrap();
        assert_eq!(harvester.row().unwrap(), "4;1000000000;1;2;1");
    }

    #[test]
    fn test_row_column_count_matches_header() {
        let dir = tempfile::tempdir().unwrap();
        let trace = dir.path().join("mem_trace.txt");
        std::fs::write(&trace, "8x8 12\n").unwrap();

        let mut harvester = TraceHarvester::new(&trace, blocks());
        harvester.read(&ctx()).unwrap();
        let row = harvester.row().unwrap();
        assert_eq!(
            row.split(';').count(),
            harvester.header_fragment().trim_end().split(';').count()
        );
    }

    #[test]
    fn test_malformed_line() {
        let dir = tempfile::tempdir().unwrap();
        let trace = dir.path().join("mem_trace.txt");
        std::fs::write(&trace, "64x64 100\n64x64 lots\n").unwrap();

        let mut harvester = TraceHarvester::new(&trace, blocks());
        let err = harvester.read(&ctx()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
        assert!(harvester.row().is_err());
    }

    #[test]
    fn test_missing_trace() {
        let dir = tempfile::tempdir().unwrap();
        let mut harvester = TraceHarvester::new(dir.path().join("mem_trace.txt"), blocks());
        let err = harvester.read(&ctx()).unwrap_err();
        assert!(matches!(err, SweepError::ArtifactMissing { .. }));
    }
}
