use crate::genomics::{GeneAnnotations, GeneRecord, TrailingRuns};
use crate::ledger::DEFAULT_INTERVAL;

use super::ScanError;

/// Configuration parameters for a counting scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Gene under study (1-based annotation order).
    pub gene_number: u32,

    /// Frame length override; defaults to the gene's coding length.
    pub expected_length: Option<usize>,

    /// Sequences between progress checkpoints.
    pub progress_interval: u64,

    /// Record contributing ids next to substitution counts.
    pub track_groups: bool,

    /// Handling of deletion runs that reach the end of the query.
    pub trailing_runs: TrailingRuns,
}

impl ScanConfig {
    /// Default configuration for a gene.
    pub fn for_gene(gene_number: u32) -> Self {
        Self {
            gene_number,
            expected_length: None,
            progress_interval: DEFAULT_INTERVAL,
            track_groups: true,
            trailing_runs: TrailingRuns::Discard,
        }
    }

    /// Override the frame length.
    pub fn with_expected_length(mut self, expected_length: usize) -> Self {
        self.expected_length = Some(expected_length);
        self
    }

    /// Set the checkpoint interval.
    pub fn with_progress_interval(mut self, progress_interval: u64) -> Self {
        self.progress_interval = progress_interval;
        self
    }

    /// Enable or disable contributing-id tracking.
    pub fn with_group_tracking(mut self, enabled: bool) -> Self {
        self.track_groups = enabled;
        self
    }

    /// Set the trailing deletion policy.
    pub fn with_trailing_runs(mut self, trailing_runs: TrailingRuns) -> Self {
        self.trailing_runs = trailing_runs;
        self
    }

    /// Reject configurations that cannot drive a scan.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.gene_number == 0 {
            return Err(ScanError::InvalidConfiguration(
                "gene numbers start at 1".to_string(),
            ));
        }
        if self.progress_interval == 0 {
            return Err(ScanError::InvalidConfiguration(
                "progress interval must be > 0".to_string(),
            ));
        }
        if self.expected_length == Some(0) {
            return Err(ScanError::InvalidConfiguration(
                "expected length must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Look up the configured gene and the frame length `L` it implies.
    pub fn resolve<'a>(
        &self,
        annotations: &'a GeneAnnotations,
    ) -> Result<(&'a GeneRecord, usize), ScanError> {
        self.validate()?;
        let gene = annotations
            .get(self.gene_number)
            .ok_or(ScanError::UnknownGene(self.gene_number))?;
        let length = self.expected_length.unwrap_or_else(|| gene.coding_len());
        Ok((gene, length))
    }
}
