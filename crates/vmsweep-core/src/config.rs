//! Sweep configuration.
//!
//! Every path, command template and parameter list the sweep needs lives in
//! one immutable [`SweepConfig`]. The defaults reproduce the HM memory
//! campaign layout; a JSON file can override any field.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{SweepError, SweepResult};
use crate::space::{Encoder, Profile};

/// Header columns written before the harvester fragment in every aggregate file.
pub const DEFAULT_HEADER: &str =
    "Video encoder;Encoder Configuration;Video sequence;Resolution;Search range;";

/// One encoder configuration profile and its config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileConfig {
    pub profile: Profile,
    pub config: PathBuf,
}

/// An encoder binary together with its profiles and per-sequence config directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EncoderConfig {
    pub encoder: Encoder,

    /// Encoder executable.
    pub binary: PathBuf,

    /// Directory holding `<title>.cfg` for every sequence.
    pub sequence_config_dir: PathBuf,

    /// Profiles in sweep order.
    pub profiles: Vec<ProfileConfig>,
}

impl EncoderConfig {
    /// HM reference encoder rooted at `root` (e.g. `../hm-videomem/`).
    pub fn hm(root: &Path) -> Self {
        Self {
            encoder: Encoder::Hevc,
            binary: root.join("bin/TAppEncoderStatic"),
            sequence_config_dir: root.join("cfg/per-sequence"),
            profiles: vec![
                ProfileConfig {
                    profile: Profile::LowDelay,
                    config: root.join("cfg/encoder_lowdelay_main.cfg"),
                },
                ProfileConfig {
                    profile: Profile::RandomAccess,
                    config: root.join("cfg/encoder_randomaccess_main.cfg"),
                },
            ],
        }
    }

    /// VTM reference encoder rooted at `root` (e.g. `../vtm-mem/`).
    pub fn vtm(root: &Path) -> Self {
        Self {
            encoder: Encoder::Vvc,
            binary: root.join("bin/EncoderAppStatic"),
            sequence_config_dir: root.join("cfg/per-sequence"),
            profiles: vec![
                ProfileConfig {
                    profile: Profile::LowDelay,
                    config: root.join("cfg/encoder_lowdelay_vtm.cfg"),
                },
                ProfileConfig {
                    profile: Profile::RandomAccess,
                    config: root.join("cfg/encoder_randomaccess_vtm.cfg"),
                },
            ],
        }
    }
}

/// Files used by the instrumented-trace sweep.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TraceSweepConfig {
    /// Trace log written by the instrumented encoder.
    pub trace_file: PathBuf,

    /// Per-point record produced from the trace.
    pub harvest_output: PathBuf,

    /// Cumulative output of the sweep.
    pub aggregate_output: PathBuf,

    /// Block-size labels reported as individual columns, in column order.
    pub block_sizes: Vec<String>,
}

impl Default for TraceSweepConfig {
    fn default() -> Self {
        Self {
            trace_file: PathBuf::from("mem_trace.txt"),
            harvest_output: PathBuf::from("trace_reader_output.txt"),
            aggregate_output: PathBuf::from("automate_trace_output.txt"),
            block_sizes: ["64x64", "32x32", "16x16", "8x8"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Launcher, files and report columns used by the profiler sweep.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProfilerSweepConfig {
    /// Profiler command-line launcher.
    pub launcher: String,

    /// Arguments selecting the collection mode.
    pub collect_args: Vec<String>,

    /// Result directory the profiler writes into.
    pub result_dir: PathBuf,

    /// Flat report exported from the result directory.
    pub report_file: PathBuf,

    /// Per-point record produced from the report.
    pub harvest_output: PathBuf,

    /// Cumulative output of the sweep.
    pub aggregate_output: PathBuf,

    /// Report column naming the module of each row.
    pub module_column: String,

    /// Modules to report; empty means totals over all rows.
    pub modules: Vec<String>,

    /// Numeric report columns to sum.
    pub metric_columns: Vec<String>,
}

impl Default for ProfilerSweepConfig {
    fn default() -> Self {
        Self {
            launcher: "amplxe-cl".to_string(),
            collect_args: vec!["-collect".to_string(), "memory-access".to_string()],
            result_dir: PathBuf::from("result_dir"),
            report_file: PathBuf::from("report_vtune.csv"),
            harvest_output: PathBuf::from("vtune_reader_output.txt"),
            aggregate_output: PathBuf::from("automate_vtune_output.txt"),
            module_column: "Module".to_string(),
            modules: Vec::new(),
            metric_columns: vec!["Loads".to_string(), "Stores".to_string()],
        }
    }
}

/// Complete, immutable description of a measurement campaign.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SweepConfig {
    /// Working directory of the external tools; relative artifact paths resolve here.
    pub work_dir: PathBuf,

    /// Root directory searched recursively for video sequences.
    pub video_root: PathBuf,

    /// Frames encoded per run (`-f`).
    pub frames: u32,

    /// Motion search ranges (`-sr`), in sweep order.
    pub search_ranges: Vec<String>,

    /// Fixed header preceding the harvester columns.
    pub header: String,

    /// Attempts per point before an external tool failure is reported.
    pub max_attempts: u32,

    /// Encoders in sweep order.
    pub encoders: Vec<EncoderConfig>,

    pub trace: TraceSweepConfig,

    pub profiler: ProfilerSweepConfig,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            video_root: PathBuf::from("../video_sequences"),
            frames: 9,
            search_ranges: ["64", "96", "128", "256"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            header: DEFAULT_HEADER.to_string(),
            max_attempts: 1,
            encoders: vec![EncoderConfig::hm(Path::new("../hm-videomem"))],
            trace: TraceSweepConfig::default(),
            profiler: ProfilerSweepConfig::default(),
        }
    }
}

impl SweepConfig {
    /// Load a JSON configuration file; absent fields keep their defaults.
    pub fn from_file(path: &Path) -> SweepResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SweepError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: SweepConfig = serde_json::from_str(&raw).map_err(|e| {
            SweepError::Config(format!("cannot parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would produce an empty or malformed sweep.
    pub fn validate(&self) -> SweepResult<()> {
        if self.encoders.is_empty() {
            return Err(SweepError::Config("no encoders configured".to_string()));
        }
        for encoder in &self.encoders {
            if encoder.profiles.is_empty() {
                return Err(SweepError::Config(format!(
                    "encoder {} has no profiles",
                    encoder.encoder
                )));
            }
        }
        if self.search_ranges.is_empty() {
            return Err(SweepError::Config("no search ranges configured".to_string()));
        }
        if let Some(bad) = self
            .search_ranges
            .iter()
            .find(|sr| sr.parse::<u32>().is_err())
        {
            return Err(SweepError::Config(format!(
                "search range '{}' is not an integer",
                bad
            )));
        }
        if self.frames == 0 {
            return Err(SweepError::Config("frame count must be positive".to_string()));
        }
        if self.max_attempts == 0 {
            return Err(SweepError::Config("max_attempts must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Resolve a possibly relative artifact path against the working directory.
    pub fn in_work_dir(&self, path: &Path) -> PathBuf {
        self.work_dir.join(path)
    }

    /// Anchor every input path to an absolute working directory.
    ///
    /// Videos are walked from the launching process while the encoders run
    /// inside `work_dir`; after this call both see the same files.
    pub fn resolve(mut self) -> SweepResult<Self> {
        if self.work_dir.is_relative() {
            let cwd = std::env::current_dir().map_err(|e| {
                SweepError::Config(format!("cannot determine current directory: {}", e))
            })?;
            self.work_dir = cwd.join(&self.work_dir);
        }

        self.video_root = self.in_work_dir(&self.video_root);
        let work_dir = self.work_dir.clone();
        for encoder in &mut self.encoders {
            encoder.binary = work_dir.join(&encoder.binary);
            encoder.sequence_config_dir = work_dir.join(&encoder.sequence_config_dir);
            for profile in &mut encoder.profiles {
                profile.config = work_dir.join(&profile.config);
            }
        }
        Ok(self)
    }
}
