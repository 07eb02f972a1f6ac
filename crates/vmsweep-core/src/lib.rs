//! vmsweep - sweep orchestration for encoder memory measurements
//!
//! Enumerates every (encoder, profile, search range, sequence) combination,
//! runs the encoder once per combination (directly or under a memory
//! profiler), harvests the tool's report into one row and appends it to a
//! cumulative semicolon-delimited file:
//! - [`space`]: video discovery, name parsing, sweep-point enumeration
//! - [`command`] / [`runner`]: argument vectors and process execution
//! - [`harvest`] / [`aggregate`]: report readers and the append-only output
//! - [`orchestrator`]: the per-point transaction with guaranteed cleanup

pub mod aggregate;
pub mod cleanup;
pub mod command;
pub mod config;
pub mod error;
pub mod harvest;
pub mod orchestrator;
pub mod runner;
pub mod space;
pub mod strategy;
pub mod telemetry;

// Re-export key types
pub use aggregate::AggregateWriter;
pub use cleanup::ArtifactGuard;
pub use command::CommandBuilder;
pub use config::{EncoderConfig, ProfileConfig, SweepConfig};
pub use error::{SweepError, SweepResult};
pub use harvest::{Harvester, ProfilerReportHarvester, RunContext, TraceHarvester};
pub use orchestrator::{
    profiler_sweep, trace_sweep, OrchestratorSettings, PointFailure, ProfilerSweep,
    SkippedVideo, SweepOrchestrator, SweepReport, SweepState, TraceSweep,
};
pub use runner::{CommandRunner, RunExecutor, RunStatus};
pub use space::{
    derive_descriptor, enumerate_videos, sweep_points, Encoder, Profile, SweepPoint,
    VideoDescriptor,
};
pub use strategy::{ProfiledExportStrategy, RunStrategy, TraceStrategy};
pub use telemetry::init_tracing;
