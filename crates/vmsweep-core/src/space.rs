//! Parameter space: video discovery, name parsing and sweep-point enumeration.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::config::EncoderConfig;
use crate::error::{SweepError, SweepResult};

/// Video encoders under measurement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Encoder {
    #[serde(rename = "HEVC")]
    Hevc,
    #[serde(rename = "VVC")]
    Vvc,
}

impl Encoder {
    pub fn name(&self) -> &'static str {
        match self {
            Encoder::Hevc => "HEVC",
            Encoder::Vvc => "VVC",
        }
    }
}

impl fmt::Display for Encoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Encoder configuration profiles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Profile {
    #[serde(rename = "Low Delay")]
    LowDelay,
    #[serde(rename = "Random Access")]
    RandomAccess,
}

impl Profile {
    pub fn name(&self) -> &'static str {
        match self {
            Profile::LowDelay => "Low Delay",
            Profile::RandomAccess => "Random Access",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Metadata carried by a video file name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VideoDescriptor {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,

    /// Encoder-specific per-sequence config, `<config root>/<title>.cfg`.
    pub config_path: PathBuf,
}

impl VideoDescriptor {
    /// `WxH` as written in the aggregate output.
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// One concrete combination driving exactly one external invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepPoint {
    pub encoder: Encoder,
    pub profile: Profile,

    /// Encoder config file of `profile`.
    pub profile_config: PathBuf,

    /// Encoder executable.
    pub binary: PathBuf,

    /// Integer-valued search range, passed through verbatim.
    pub search_range: String,

    pub video_path: PathBuf,
    pub video: VideoDescriptor,
}

impl fmt::Display for SweepPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {} / {} / sr {}",
            self.encoder, self.profile, self.video.title, self.search_range
        )
    }
}

/// Lazily walk `root` and yield every regular file below it.
///
/// Entries are sorted by file name within each directory so the sweep order
/// is reproducible. Symlinks are followed. No extension filter is applied.
pub fn enumerate_videos(root: &Path) -> impl Iterator<Item = SweepResult<PathBuf>> {
    WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) if entry.file_type().is_file() => Some(Ok(entry.into_path())),
            Ok(_) => None,
            Err(e) => Some(Err(SweepError::from(e))),
        })
}

/// Parse `{anything}_{title}_{W}x{H}_{fps}.{ext}` from `path`.
///
/// The `{anything}_` prefix is normally part of the file name
/// (`seq_Foreman_352x288_30.yuv`). It may also end in a directory name, as in
/// `../video_sequences/Foreman_352x288_30.yuv`, in which case the file name
/// carries only title, resolution and frame rate.
pub fn derive_descriptor(path: &Path, config_root: &Path) -> SweepResult<VideoDescriptor> {
    let parse_error = |reason: String| SweepError::Parse {
        path: path.to_path_buf(),
        reason,
    };

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| parse_error("file name is not valid UTF-8".to_string()))?;

    let segments: Vec<&str> = file_name.split('_').collect();
    let fields = match segments.len() {
        4 => &segments[1..],
        3 if prefix_in_directory(path) => &segments[..],
        found => {
            return Err(parse_error(format!(
                "expected 4 underscore-delimited segments, found {}",
                found
            )))
        }
    };

    let title = fields[0];
    if title.is_empty() {
        return Err(parse_error("empty title".to_string()));
    }

    let (width, height) = fields[1]
        .split_once('x')
        .ok_or_else(|| parse_error(format!("'{}' is not WxH", fields[1])))?;
    let width: u32 = width
        .parse()
        .map_err(|_| parse_error(format!("invalid width '{}'", width)))?;
    let height: u32 = height
        .parse()
        .map_err(|_| parse_error(format!("invalid height '{}'", height)))?;

    let fps = fields[2].split('.').next().unwrap_or_default();
    let fps: u32 = fps
        .parse()
        .map_err(|_| parse_error(format!("invalid frame rate '{}'", fps)))?;

    Ok(VideoDescriptor {
        title: title.to_string(),
        width,
        height,
        fps,
        config_path: config_root.join(format!("{}.cfg", title)),
    })
}

/// True when a directory above `path` supplies the `{anything}_` prefix.
fn prefix_in_directory(path: &Path) -> bool {
    path.parent()
        .map(|parent| {
            parent.components().any(|component| match component {
                Component::Normal(name) => name.to_string_lossy().contains('_'),
                _ => false,
            })
        })
        .unwrap_or(false)
}

/// Build a file name that [`derive_descriptor`] maps back to `descriptor`.
pub fn conventional_file_name(descriptor: &VideoDescriptor, prefix: &str, ext: &str) -> String {
    format!(
        "{}_{}_{}x{}_{}.{}",
        prefix, descriptor.title, descriptor.width, descriptor.height, descriptor.fps, ext
    )
}

/// Lazily enumerate the full cross-product of the sweep.
///
/// Order is encoder, then profile, then search range, then video, each in
/// declaration (or traversal) order. A video whose name cannot be parsed
/// yields an `Err` at its position; iteration continues past it.
pub fn sweep_points<'a>(
    encoders: &'a [EncoderConfig],
    search_ranges: &'a [String],
    videos: &'a [PathBuf],
) -> impl Iterator<Item = SweepResult<SweepPoint>> + 'a {
    encoders.iter().flat_map(move |encoder| {
        encoder.profiles.iter().flat_map(move |profile| {
            search_ranges.iter().flat_map(move |search_range| {
                videos.iter().map(move |video_path| {
                    let video = derive_descriptor(video_path, &encoder.sequence_config_dir)?;
                    Ok(SweepPoint {
                        encoder: encoder.encoder,
                        profile: profile.profile,
                        profile_config: profile.config.clone(),
                        binary: encoder.binary.clone(),
                        search_range: search_range.clone(),
                        video_path: video_path.clone(),
                        video,
                    })
                })
            })
        })
    })
}
