//! Semicolon-delimited top-down report exported by the profiler.

use std::path::{Path, PathBuf};

use crate::error::{SweepError, SweepResult};
use crate::harvest::{format_value, read_report, Harvester, RunContext};

/// Sums metric columns of a profiler report, per module or over all rows.
#[derive(Debug)]
pub struct ProfilerReportHarvester {
    report: PathBuf,
    module_column: String,
    modules: Vec<String>,
    metric_columns: Vec<String>,
    totals: Option<Vec<f64>>,
}

impl ProfilerReportHarvester {
    pub fn new(
        report: impl Into<PathBuf>,
        module_column: impl Into<String>,
        modules: Vec<String>,
        metric_columns: Vec<String>,
    ) -> Self {
        Self {
            report: report.into(),
            module_column: module_column.into(),
            modules,
            metric_columns,
            totals: None,
        }
    }

    fn groups(&self) -> usize {
        self.modules.len().max(1)
    }

    fn error(&self, reason: String) -> SweepError {
        SweepError::Harvest {
            path: self.report.clone(),
            reason,
        }
    }

    fn column_index(&self, header: &[&str], name: &str) -> SweepResult<usize> {
        header
            .iter()
            .position(|column| *column == name)
            .ok_or_else(|| self.error(format!("report has no '{}' column", name)))
    }

    fn parse(&self, content: &str) -> SweepResult<Vec<f64>> {
        let mut lines = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());

        let (_, header_line) = lines
            .next()
            .ok_or_else(|| self.error("report is empty".to_string()))?;
        let header: Vec<&str> = header_line
            .trim_start_matches('\u{feff}')
            .split(';')
            .map(str::trim)
            .collect();

        let metric_indices = self
            .metric_columns
            .iter()
            .map(|name| self.column_index(&header, name))
            .collect::<SweepResult<Vec<_>>>()?;
        let module_index = if self.modules.is_empty() {
            None
        } else {
            Some(self.column_index(&header, &self.module_column)?)
        };

        let width = self.metric_columns.len();
        let mut totals = vec![0.0; self.groups() * width];

        for (index, line) in lines {
            let fields: Vec<&str> = line.split(';').map(str::trim).collect();
            let group = match module_index {
                None => 0,
                Some(column) => {
                    let module = fields.get(column).copied().unwrap_or_default();
                    match self.modules.iter().position(|m| m == module) {
                        Some(group) => group,
                        None => continue,
                    }
                }
            };

            for (slot, &column) in metric_indices.iter().enumerate() {
                let raw = fields.get(column).copied().unwrap_or_default();
                if raw.is_empty() {
                    continue;
                }
                let value: f64 = raw.parse().map_err(|_| {
                    self.error(format!(
                        "line {}: '{}' in column '{}' is not numeric",
                        index + 1,
                        raw,
                        self.metric_columns[slot]
                    ))
                })?;
                totals[group * width + slot] += value;
            }
        }
        Ok(totals)
    }
}

impl Harvester for ProfilerReportHarvester {
    fn report_path(&self) -> &Path {
        &self.report
    }

    fn header_fragment(&self) -> String {
        let columns: Vec<String> = if self.modules.is_empty() {
            self.metric_columns.clone()
        } else {
            self.modules
                .iter()
                .flat_map(|module| {
                    self.metric_columns
                        .iter()
                        .map(move |metric| format!("{} {}", module, metric))
                })
                .collect()
        };
        format!("{}\n", columns.join(";"))
    }

    fn read(&mut self, _ctx: &RunContext) -> SweepResult<()> {
        self.totals = None;
        let content = read_report(&self.report)?;
        self.totals = Some(self.parse(&content)?);
        Ok(())
    }

    fn row(&self) -> SweepResult<String> {
        let totals = self
            .totals
            .as_ref()
            .ok_or_else(|| self.error("no report has been read".to_string()))?;
        Ok(totals
            .iter()
            .map(|v| format_value(*v))
            .collect::<Vec<_>>()
            .join(";"))
    }
}
