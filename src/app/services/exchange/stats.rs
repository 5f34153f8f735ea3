//! Reading statistics and result structures

use crate::app::models::DataFile;
use crate::app::services::parameter_catalog::CanonicalizationReport;
use serde::Serialize;

/// A read file together with what happened while reading it
#[derive(Debug, Clone)]
pub struct ReadResult {
    /// The decoded file
    pub file: DataFile,

    /// Codec statistics
    pub stats: ReadStats,

    /// Parameter resolution outcome
    pub report: CanonicalizationReport,
}

/// Counters collected while decoding an Exchange file
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReadStats {
    /// Data rows decoded
    pub data_rows: usize,

    /// Comment lines in the header block
    pub header_lines: usize,

    /// Blank lines skipped in the data section
    pub blank_lines: usize,

    /// Fields replaced by null because they held the out-of-band sentinel
    pub out_of_band_fields: usize,

    /// Flag fields that were not integers
    pub invalid_flags: usize,

    /// Flag columns without a base column
    pub orphan_flag_columns: Vec<String>,

    /// Rows whose DATE/TIME could not be fused
    pub unparsable_datetimes: usize,

    /// Whether the data section was terminated by END_DATA
    pub terminated: bool,
}

impl ReadStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// One-line description for logs
    pub fn summary(&self) -> String {
        format!(
            "{} rows, {} out-of-band fields, {} invalid flags, {} unparsable dates{}",
            self.data_rows,
            self.out_of_band_fields,
            self.invalid_flags,
            self.unparsable_datetimes,
            if self.terminated { "" } else { " (no END_DATA)" }
        )
    }
}
