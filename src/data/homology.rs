//! Homology hits from tabular BLASTP/DIAMOND output (`-outfmt 6`).

use std::path::Path;

use crate::common::strip_peptide_suffix;

use super::{LineOutcome, ParseStats};

/// Number of columns of the standard tabular format.
const N_COLUMNS: usize = 12;

/// Transcripts with at least one homology hit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Data {
    /// Transcript identifiers with the peptide suffix removed.
    transcripts: rustc_hash::FxHashSet<String>,
    /// Line tally of the hit table.
    stats: ParseStats,
}

impl Data {
    /// Load from the given hit table.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the 12 column hit table.
    /// * `evalue_ceiling` - Optional maximal e-value; hits above are dropped.
    ///
    /// # Errors
    ///
    /// If anything goes wrong, it returns a generic `anyhow::Error`.
    pub fn new<P>(path: P, evalue_ceiling: Option<f64>) -> Result<Self, anyhow::Error>
    where
        P: AsRef<Path>,
    {
        let parsed = super::parse_file(path.as_ref(), |cols| parse_line(cols, evalue_ceiling))?;
        let data = Self {
            transcripts: parsed.records.into_iter().collect(),
            stats: parsed.stats,
        };
        tracing::info!(
            "{} hits for {} transcripts in {}",
            data.stats.records,
            data.len(),
            path.as_ref().display()
        );
        if data.is_empty() {
            tracing::warn!(
                "no usable homology hits in {}; the homology sub-score is 0 for every transcript",
                path.as_ref().display()
            );
        }
        Ok(data)
    }

    /// Whether `transcript_id` has a homology hit.
    pub fn has_hit(&self, transcript_id: &str) -> bool {
        self.transcripts.contains(transcript_id)
    }

    /// Number of transcripts with a hit.
    pub fn len(&self) -> usize {
        self.transcripts.len()
    }

    /// Whether no transcript has a hit.
    pub fn is_empty(&self) -> bool {
        self.transcripts.is_empty()
    }

    pub fn stats(&self) -> ParseStats {
        self.stats
    }
}

fn parse_line(cols: &[&str], evalue_ceiling: Option<f64>) -> LineOutcome<String> {
    if cols[0].starts_with('#') || cols.iter().all(|col| col.trim().is_empty()) {
        return LineOutcome::Ignored;
    }
    if cols.len() < N_COLUMNS {
        return LineOutcome::Skipped(format!(
            "expected {} columns, found {}",
            N_COLUMNS,
            cols.len()
        ));
    }
    if let Some(ceiling) = evalue_ceiling {
        match cols[10].trim().parse::<f64>() {
            Ok(evalue) if evalue > ceiling => return LineOutcome::Filtered,
            Ok(_) => (),
            Err(_) => return LineOutcome::Skipped(format!("unparsable e-value {:?}", cols[10])),
        }
    }
    LineOutcome::Record(strip_peptide_suffix(cols[0]).to_string())
}
