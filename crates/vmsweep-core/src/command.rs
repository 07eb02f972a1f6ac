//! Argument vectors for the encoder, the profiler launcher and the report export.

use std::path::{Path, PathBuf};

use crate::config::SweepConfig;
use crate::space::SweepPoint;

fn arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Builds external invocations. The flag layout is part of each tool's contract.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    frames: u32,
    launcher: String,
    collect_args: Vec<String>,
    result_dir: PathBuf,
    report_file: PathBuf,
}

impl CommandBuilder {
    pub fn new(config: &SweepConfig) -> Self {
        Self {
            frames: config.frames,
            launcher: config.profiler.launcher.clone(),
            collect_args: config.profiler.collect_args.clone(),
            result_dir: config.profiler.result_dir.clone(),
            report_file: config.profiler.report_file.clone(),
        }
    }

    /// `binary -c <profile cfg> -c <video cfg> -i <video> -f <frames> -sr <range>`
    pub fn build_encode_command(
        &self,
        binary: &Path,
        video_path: &Path,
        video_config: &Path,
        profile_config: &Path,
        search_range: &str,
    ) -> Vec<String> {
        vec![
            arg(binary),
            "-c".to_string(),
            arg(profile_config),
            "-c".to_string(),
            arg(video_config),
            "-i".to_string(),
            arg(video_path),
            "-f".to_string(),
            self.frames.to_string(),
            "-sr".to_string(),
            search_range.to_string(),
        ]
    }

    /// Encode command for a sweep point.
    pub fn encode_command_for(&self, point: &SweepPoint) -> Vec<String> {
        self.build_encode_command(
            &point.binary,
            &point.video_path,
            &point.video.config_path,
            &point.profile_config,
            &point.search_range,
        )
    }

    /// Prefix `encode` with the profiler launcher collecting into the result directory.
    pub fn build_profiled_command(&self, encode: Vec<String>) -> Vec<String> {
        let mut command = Vec::with_capacity(self.collect_args.len() + encode.len() + 4);
        command.push(self.launcher.clone());
        command.extend(self.collect_args.iter().cloned());
        command.push("-result-dir".to_string());
        command.push(arg(&self.result_dir));
        command.push("--".to_string());
        command.extend(encode);
        command
    }

    /// Export the result directory as a semicolon-delimited top-down CSV report.
    pub fn build_report_export_command(&self) -> Vec<String> {
        vec![
            self.launcher.clone(),
            "-report".to_string(),
            "top-down".to_string(),
            "-result-dir".to_string(),
            arg(&self.result_dir),
            "-report-output".to_string(),
            arg(&self.report_file),
            "-format".to_string(),
            "csv".to_string(),
            "-csv-delimiter".to_string(),
            "semicolon".to_string(),
        ]
    }
}
