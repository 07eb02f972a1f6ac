//! Sweep orchestration.
//!
//! [`SweepOrchestrator`] walks the sweep points strictly one at a time. Each
//! point is a closed transaction: build the command(s), run them, harvest the
//! report, append one record, and remove every transient artifact before the
//! next point starts. Failed points leave a gap in the aggregate output and
//! are reported; only a failed aggregate append stops the sweep.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::aggregate::AggregateWriter;
use crate::cleanup::ArtifactGuard;
use crate::command::CommandBuilder;
use crate::config::SweepConfig;
use crate::error::{SweepError, SweepResult};
use crate::harvest::{Harvester, ProfilerReportHarvester, RunContext, TraceHarvester};
use crate::runner::CommandRunner;
use crate::space::SweepPoint;
use crate::strategy::{ProfiledExportStrategy, RunStrategy, TraceStrategy};

/// Lifecycle of a sweep; the bracketed states repeat once per point.
///
/// `Idle → Initialized → [RunningEncode → RunningExport → Harvesting →
/// Appending → CleaningUp] → Idle`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepState {
    Idle,
    Initialized,
    RunningEncode,
    RunningExport,
    Harvesting,
    Appending,
    CleaningUp,
}

/// A point that produced no record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointFailure {
    /// Point identity: encoder / profile / title / search range.
    pub point: String,
    pub video_path: PathBuf,
    pub attempts: u32,
    pub error: String,
}

/// A video whose file name does not follow the naming convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedVideo {
    pub path: PathBuf,
    pub reason: String,
}

/// Summary of a completed (or interrupted) sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    pub sweep_id: String,
    pub variant: String,
    pub output: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Points attempted, excluding positions of unparseable videos.
    pub points_total: usize,
    pub rows_appended: usize,
    pub failures: Vec<PointFailure>,
    pub skipped_videos: Vec<SkippedVideo>,
    pub interrupted: bool,

    /// SHA-256 of the aggregate output after the last record.
    pub output_digest: String,
}

impl SweepReport {
    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    /// No failed point, no skipped video, not interrupted.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.skipped_videos.is_empty() && !self.interrupted
    }
}

/// File locations and retry policy of one sweep variant.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub work_dir: PathBuf,
    pub header: String,

    /// Per-point record file, relative to `work_dir`.
    pub harvest_output: PathBuf,

    /// Aggregate output, relative to `work_dir`.
    pub aggregate_output: PathBuf,

    pub max_attempts: u32,
}

impl OrchestratorSettings {
    pub fn from_config(
        config: &SweepConfig,
        harvest_output: impl Into<PathBuf>,
        aggregate_output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            work_dir: config.work_dir.clone(),
            header: config.header.clone(),
            harvest_output: harvest_output.into(),
            aggregate_output: aggregate_output.into(),
            max_attempts: config.max_attempts.max(1),
        }
    }
}

/// Drives a sweep through one harvester and one run strategy.
pub struct SweepOrchestrator<H: Harvester, S: RunStrategy> {
    sweep_id: String,
    builder: CommandBuilder,
    strategy: S,
    harvester: H,
    runner: Arc<dyn CommandRunner>,
    writer: AggregateWriter,
    harvest_output: PathBuf,
    artifacts: Vec<PathBuf>,
    max_attempts: u32,
    state: SweepState,
    interrupt: Arc<AtomicBool>,
}

impl<H: Harvester, S: RunStrategy> SweepOrchestrator<H, S> {
    /// Initialize the aggregate output (header plus harvester columns).
    pub fn new(
        settings: OrchestratorSettings,
        builder: CommandBuilder,
        strategy: S,
        harvester: H,
        runner: Arc<dyn CommandRunner>,
    ) -> SweepResult<Self> {
        let output = settings.work_dir.join(&settings.aggregate_output);
        let writer =
            AggregateWriter::initialize(output, &settings.header, &harvester.header_fragment())?;

        let harvest_output = settings.work_dir.join(&settings.harvest_output);
        let mut artifacts: Vec<PathBuf> = strategy
            .transient_artifacts()
            .iter()
            .map(|p| settings.work_dir.join(p))
            .collect();
        artifacts.push(harvest_output.clone());

        let sweep_id = Uuid::new_v4().to_string();
        info!(
            sweep_id = %sweep_id,
            variant = strategy.name(),
            output = %writer.output().display(),
            "Sweep initialized"
        );

        Ok(Self {
            sweep_id,
            builder,
            strategy,
            harvester,
            runner,
            writer,
            harvest_output,
            artifacts,
            max_attempts: settings.max_attempts.max(1),
            state: SweepState::Initialized,
            interrupt: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn state(&self) -> SweepState {
        self.state
    }

    pub fn sweep_id(&self) -> &str {
        &self.sweep_id
    }

    /// Setting the returned flag stops the sweep once the in-flight point has cleaned up.
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        self.interrupt.clone()
    }

    /// Share an externally owned interrupt flag (e.g. one set by a Ctrl-C handler).
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = flag;
        self
    }

    /// Transient paths owned by each point, resolved against the work dir.
    pub fn transient_artifacts(&self) -> &[PathBuf] {
        &self.artifacts
    }

    fn transition(&mut self, next: SweepState) {
        debug!(from = ?self.state, to = ?next, "Sweep state transition");
        self.state = next;
    }

    /// Run every point in order and return the sweep summary.
    ///
    /// Errors only when the sweep cannot continue (aggregate append failure,
    /// traversal error) or was already run.
    pub async fn run<I>(&mut self, points: I) -> SweepResult<SweepReport>
    where
        I: IntoIterator<Item = SweepResult<SweepPoint>>,
    {
        if self.state != SweepState::Initialized {
            return Err(SweepError::Config(
                "sweep already ran; aggregate output is closed".to_string(),
            ));
        }

        let span = info_span!(
            "vmsweep.sweep",
            sweep_id = %self.sweep_id,
            variant = self.strategy.name()
        );
        let result = self.run_points(points).instrument(span).await;
        self.transition(SweepState::Idle);
        result
    }

    async fn run_points<I>(&mut self, points: I) -> SweepResult<SweepReport>
    where
        I: IntoIterator<Item = SweepResult<SweepPoint>>,
    {
        let started_at = Utc::now();
        let mut points_total = 0;
        let mut failures = Vec::new();
        let mut skipped_videos = Vec::new();
        let mut seen_skips = HashSet::new();
        let mut interrupted = false;

        for item in points {
            if self.interrupt.load(Ordering::SeqCst) {
                warn!("Sweep interrupted; stopping before next point");
                interrupted = true;
                break;
            }

            let point = match item {
                Ok(point) => point,
                Err(SweepError::Parse { path, reason }) => {
                    if seen_skips.insert(path.clone()) {
                        warn!(video = %path.display(), reason = %reason, "Skipping video");
                        skipped_videos.push(SkippedVideo { path, reason });
                    }
                    continue;
                }
                Err(e) => return Err(e),
            };

            points_total += 1;
            let span = info_span!(
                "vmsweep.point",
                encoder = %point.encoder,
                profile = %point.profile,
                video = %point.video.title,
                search_range = %point.search_range
            );
            if let Some(failure) = self.drive_point(&point).instrument(span).await? {
                failures.push(failure);
            }
        }

        let report = SweepReport {
            sweep_id: self.sweep_id.clone(),
            variant: self.strategy.name().to_string(),
            output: self.writer.output().to_path_buf(),
            started_at,
            finished_at: Utc::now(),
            points_total,
            rows_appended: self.writer.rows_appended(),
            failures,
            skipped_videos,
            interrupted,
            output_digest: self.writer.digest()?,
        };

        info!(
            points = report.points_total,
            rows = report.rows_appended,
            failed = report.failed_count(),
            skipped_videos = report.skipped_videos.len(),
            interrupted = report.interrupted,
            digest = %report.output_digest,
            "Sweep finished"
        );
        Ok(report)
    }

    /// Run one point with retries. `Ok(Some(_))` is a reported, non-fatal failure.
    async fn drive_point(&mut self, point: &SweepPoint) -> SweepResult<Option<PointFailure>> {
        let mut attempt = 1;
        loop {
            match self.run_point(point).await {
                Ok(()) => return Ok(None),
                Err(e) if e.is_fatal() => {
                    warn!(point = %point, error = %e, "Fatal error; aborting sweep");
                    return Err(e);
                }
                Err(e)
                    if e.is_tool_failure()
                        && attempt < self.max_attempts
                        && !self.interrupt.load(Ordering::SeqCst) =>
                {
                    warn!(attempt, error = %e, "Sweep point failed; retrying");
                    attempt += 1;
                }
                Err(e) => {
                    warn!(point = %point, attempts = attempt, error = %e, "Sweep point failed");
                    return Ok(Some(PointFailure {
                        point: point.to_string(),
                        video_path: point.video_path.clone(),
                        attempts: attempt,
                        error: e.to_string(),
                    }));
                }
            }
        }
    }

    /// One attempt of one point. Transient artifacts are removed on every exit path.
    async fn run_point(&mut self, point: &SweepPoint) -> SweepResult<()> {
        let guard = ArtifactGuard::new(self.artifacts.clone());
        // Leftovers from an aborted earlier run would be harvested as this point's output.
        guard.purge()?;

        let result = self.execute_point(point).await;

        self.transition(SweepState::CleaningUp);
        if let Err(e) = guard.purge() {
            warn!(error = %e, "Cleanup incomplete; retried before the next point");
        }
        drop(guard);
        self.transition(SweepState::Initialized);

        result
    }

    async fn execute_point(&mut self, point: &SweepPoint) -> SweepResult<()> {
        let ctx = RunContext::from(point);

        let encode = self.builder.encode_command_for(point);
        let encode = self.strategy.encode_command(&self.builder, encode);
        self.transition(SweepState::RunningEncode);
        info!("Running encoder");
        let status = self.runner.execute(&encode).await?.check()?;
        debug!(duration_ms = status.duration_ms, "Encoder finished");

        if let Some(export) = self.strategy.export_command(&self.builder) {
            self.transition(SweepState::RunningExport);
            info!("Exporting report");
            self.runner.execute(&export).await?.check()?;
        }

        self.transition(SweepState::Harvesting);
        self.harvester.read(&ctx)?;
        let row = self.harvester.row()?;
        std::fs::write(
            &self.harvest_output,
            format!("{}{}\n", ctx.record_prefix(), row),
        )?;

        self.transition(SweepState::Appending);
        self.writer.append(&self.harvest_output)?;
        info!(rows = self.writer.rows_appended(), "Record appended");
        Ok(())
    }
}

/// Instrumented-trace sweep.
pub type TraceSweep = SweepOrchestrator<TraceHarvester, TraceStrategy>;

/// Profiler sweep with report export.
pub type ProfilerSweep = SweepOrchestrator<ProfilerReportHarvester, ProfiledExportStrategy>;

/// Build the trace sweep described by `config`.
pub fn trace_sweep(config: &SweepConfig, runner: Arc<dyn CommandRunner>) -> SweepResult<TraceSweep> {
    let trace = &config.trace;
    SweepOrchestrator::new(
        OrchestratorSettings::from_config(config, &trace.harvest_output, &trace.aggregate_output),
        CommandBuilder::new(config),
        TraceStrategy::new(&trace.trace_file),
        TraceHarvester::new(config.in_work_dir(&trace.trace_file), trace.block_sizes.clone()),
        runner,
    )
}

/// Build the profiler sweep described by `config`.
pub fn profiler_sweep(
    config: &SweepConfig,
    runner: Arc<dyn CommandRunner>,
) -> SweepResult<ProfilerSweep> {
    let profiler = &config.profiler;
    SweepOrchestrator::new(
        OrchestratorSettings::from_config(
            config,
            &profiler.harvest_output,
            &profiler.aggregate_output,
        ),
        CommandBuilder::new(config),
        ProfiledExportStrategy::new(&profiler.result_dir, &profiler.report_file),
        ProfilerReportHarvester::new(
            config.in_work_dir(&profiler.report_file),
            profiler.module_column.clone(),
            profiler.modules.clone(),
            profiler.metric_columns.clone(),
        ),
        runner,
    )
}
