//! Streaming progress ledger
//!
//! Counts processed sequences and reports every `interval` items to a sink.
//! Only the count is reported, never the accumulated tallies: a failed run is
//! restarted from scratch, which is safe because the pass is read-only and
//! deterministic.

use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::util::write_atomically;

/// Default number of sequences between checkpoints.
pub const DEFAULT_INTERVAL: u64 = 1000;

/// Errors raised while reporting progress.
#[derive(Debug, Error)]
pub enum ProgressError {
    /// The progress marker could not be written.
    #[error("failed to write progress marker {}: {source}", path.display())]
    Io {
        /// Marker location.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: io::Error,
    },

    /// A custom sink reported a failure.
    #[error("progress sink failed: {0}")]
    Sink(String),
}

/// Destination of periodic progress reports.
pub trait ProgressSink {
    /// Called with the number of sequences processed so far.
    fn checkpoint(&mut self, processed: u64) -> Result<(), ProgressError>;
}

impl<F> ProgressSink for F
where
    F: FnMut(u64) -> Result<(), ProgressError>,
{
    fn checkpoint(&mut self, processed: u64) -> Result<(), ProgressError> {
        self(processed)
    }
}

/// Sink that drops every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn checkpoint(&mut self, _processed: u64) -> Result<(), ProgressError> {
        Ok(())
    }
}

/// Sink that overwrites a file with the processed count.
#[derive(Debug, Clone)]
pub struct ProgressFile {
    path: PathBuf,
}

impl ProgressFile {
    /// Marker at `path`; the file is created on the first checkpoint.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Marker location.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressSink for ProgressFile {
    fn checkpoint(&mut self, processed: u64) -> Result<(), ProgressError> {
        write_atomically(&self.path, |w| writeln!(w, "{processed}")).map_err(|source| {
            ProgressError::Io {
                path: self.path.clone(),
                source,
            }
        })?;
        info!(processed, "sequences processed");
        Ok(())
    }
}

/// Counter that reports to a [`ProgressSink`] every `interval` items.
pub struct ProgressLedger<S> {
    sink: S,
    interval: u64,
    processed: u64,
    last_reported: u64,
}

impl<S: ProgressSink> ProgressLedger<S> {
    /// Create ledger reporting every `interval` items (at least 1).
    pub fn new(sink: S, interval: u64) -> Self {
        Self {
            sink,
            interval: interval.max(1),
            processed: 0,
            last_reported: 0,
        }
    }

    /// Count one processed item, reporting if a checkpoint is due.
    pub fn record(&mut self) -> Result<(), ProgressError> {
        self.processed += 1;
        if self.processed % self.interval == 0 {
            self.report()?;
        }
        Ok(())
    }

    /// Report the final count unless it was just reported.
    pub fn finish(&mut self) -> Result<u64, ProgressError> {
        if self.processed != self.last_reported {
            self.report()?;
        }
        Ok(self.processed)
    }

    /// Items counted so far.
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Reporting interval.
    pub fn interval(&self) -> u64 {
        self.interval
    }

    /// Release the sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    fn report(&mut self) -> Result<(), ProgressError> {
        self.sink.checkpoint(self.processed)?;
        self.last_reported = self.processed;
        Ok(())
    }
}

impl<S> fmt::Debug for ProgressLedger<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressLedger")
            .field("interval", &self.interval)
            .field("processed", &self.processed)
            .field("last_reported", &self.last_reported)
            .finish_non_exhaustive()
    }
}
