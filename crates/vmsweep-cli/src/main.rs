//! vmsweep - encoder memory measurement sweeps
//!
//! Runs one or both sweep variants over every video under the configured
//! root and writes one aggregate file per variant.
//!
//! - `--trace`: instrumented encoder writing a memory-access trace
//! - `--profile`: encoder under the memory profiler, report exported per run

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn, Level};

use vmsweep_core::{
    enumerate_videos, profiler_sweep, sweep_points, trace_sweep, CommandRunner, Harvester,
    RunExecutor, RunStrategy, SweepConfig, SweepOrchestrator, SweepReport, SweepResult,
};

#[derive(Parser)]
#[command(name = "vmsweep")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Encoder memory measurement sweeps", long_about = None)]
struct Cli {
    /// Run the instrumented-trace sweep
    #[arg(long)]
    trace: bool,

    /// Run the profiler sweep
    #[arg(long)]
    profile: bool,

    /// JSON sweep configuration (defaults to the built-in HM campaign)
    #[arg(short, long, env = "VMSWEEP_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    vmsweep_core::init_tracing(cli.json, level);

    let config = match &cli.config {
        Some(path) => SweepConfig::from_file(path)
            .with_context(|| format!("Failed to load sweep configuration {}", path.display()))?,
        None => {
            let config = SweepConfig::default();
            config.validate().context("Built-in configuration is invalid")?;
            config
        }
    };
    let config = config
        .resolve()
        .context("Failed to resolve sweep paths against the work dir")?;

    if !cli.trace && !cli.profile {
        warn!("No sweep selected; pass --trace and/or --profile");
        return Ok(());
    }

    // Ctrl-C lets the in-flight point finish and clean up before stopping.
    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = interrupted.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received; finishing current sweep point");
                interrupted.store(true, Ordering::SeqCst);
            }
        });
    }

    let videos = enumerate_videos(&config.video_root)
        .collect::<SweepResult<Vec<_>>>()
        .with_context(|| format!("Failed to list videos under {}", config.video_root.display()))?;
    info!(count = videos.len(), root = %config.video_root.display(), "Videos discovered");

    let runner: Arc<dyn CommandRunner> = Arc::new(RunExecutor::new(&config.work_dir));

    if cli.trace {
        let sweep = trace_sweep(&config, runner.clone()).context("Failed to start trace sweep")?;
        let report = run_variant(sweep, &config, &videos, &interrupted).await?;
        print_summary(&report);
    }

    if cli.profile && !interrupted.load(Ordering::SeqCst) {
        let sweep = profiler_sweep(&config, runner).context("Failed to start profiler sweep")?;
        let report = run_variant(sweep, &config, &videos, &interrupted).await?;
        print_summary(&report);
    }

    Ok(())
}

async fn run_variant<H: Harvester, S: RunStrategy>(
    sweep: SweepOrchestrator<H, S>,
    config: &SweepConfig,
    videos: &[PathBuf],
    interrupted: &Arc<AtomicBool>,
) -> Result<SweepReport> {
    let mut sweep = sweep.with_interrupt(interrupted.clone());
    let points = sweep_points(&config.encoders, &config.search_ranges, videos);
    let result = sweep.run(points).await;
    result.with_context(|| format!("Sweep {} aborted", sweep.sweep_id()))
}

fn print_summary(report: &SweepReport) {
    println!(
        "{} sweep: {} record(s) from {} point(s) written to {}",
        report.variant,
        report.rows_appended,
        report.points_total,
        report.output.display()
    );
    for failure in &report.failures {
        println!(
            "  failed: {} ({}) after {} attempt(s): {}",
            failure.point,
            failure.video_path.display(),
            failure.attempts,
            failure.error
        );
    }
    for skipped in &report.skipped_videos {
        println!("  skipped: {}: {}", skipped.path.display(), skipped.reason);
    }
    if report.interrupted {
        println!("  interrupted before completion");
    }
    println!("  sha256 {}", report.output_digest);
}
