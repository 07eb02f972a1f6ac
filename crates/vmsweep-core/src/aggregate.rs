//! Append-only aggregate output.

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{SweepError, SweepResult};

/// Sole owner of one sweep's aggregate output file.
#[derive(Debug)]
pub struct AggregateWriter {
    output: PathBuf,
    rows_appended: usize,
}

impl AggregateWriter {
    /// Create (or truncate) `output` and write `header` followed by `fragment`.
    ///
    /// Must be called once per sweep, before any append.
    pub fn initialize(output: impl Into<PathBuf>, header: &str, fragment: &str) -> SweepResult<Self> {
        let output = output.into();
        let write = || -> io::Result<()> {
            let mut file = File::create(&output)?;
            file.write_all(header.as_bytes())?;
            file.write_all(fragment.as_bytes())?;
            file.flush()
        };
        write().map_err(|source| SweepError::AggregateWrite {
            path: output.clone(),
            source,
        })?;

        debug!(output = %output.display(), "Aggregate output initialized");
        Ok(Self {
            output,
            rows_appended: 0,
        })
    }

    /// Copy `source` verbatim to the end of the output, then one blank separator line.
    ///
    /// Content is not validated; a truncated source is appended as-is.
    pub fn append(&mut self, source: &Path) -> SweepResult<()> {
        let output = &self.output;
        let copy = || -> io::Result<()> {
            let mut reader = BufReader::new(File::open(source)?);
            let mut writer = BufWriter::new(OpenOptions::new().append(true).open(output)?);
            io::copy(&mut reader, &mut writer)?;
            writer.write_all(b"\n")?;
            writer.flush()
        };
        copy().map_err(|source| SweepError::AggregateWrite {
            path: self.output.clone(),
            source,
        })?;

        self.rows_appended += 1;
        Ok(())
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Records appended since initialization.
    pub fn rows_appended(&self) -> usize {
        self.rows_appended
    }

    /// SHA-256 of the output file, hex-encoded.
    pub fn digest(&self) -> SweepResult<String> {
        let bytes = std::fs::read(&self.output)?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }
}
