//! JSON summary of a run.

use std::io::Write as _;
use std::path::Path;

use crate::data::busco_summary::Assessments;
use crate::data::ParseStats;
use crate::error::InvalidIdentifierError;
use crate::pipeline::resolve::Resolved;
use crate::pipeline::stage::{Stage, StageState};
use crate::score::result::{Quality, TranscriptRecord};
use crate::score::weights::{WeightProfile, Weights};
use crate::score::{MaxOrfLength, Profile};
use crate::select::{DiscardReason, Selection};

/// State of one stage at the end of the run.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StageSummary {
    pub stage: Stage,
    pub state: StageState,
}

/// Line tallies of the evidence files.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct ParseTallies {
    pub orf: ParseStats,
    pub homology: Option<ParseStats>,
    pub ortholog: Option<ParseStats>,
}

/// Scoring parameters in effect.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ScoringSummary {
    pub profile: Profile,
    pub max_orf_length: MaxOrfLength,
    /// The length actually used for normalization.
    pub max_orf_length_nt: u64,
    pub weight_profile: WeightProfile,
    pub weights: Weights,
    pub threshold: f64,
    pub max_per_gene: usize,
}

/// Number of retained transcripts per quality band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct QualityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl QualityCounts {
    pub fn count(records: &[TranscriptRecord]) -> Self {
        records
            .iter()
            .fold(Self::default(), |mut counts, record| {
                match record.quality {
                    Quality::High => counts.high += 1,
                    Quality::Medium => counts.medium += 1,
                    Quality::Low => counts.low += 1,
                }
                counts
            })
    }
}

/// Number of transcripts not retained, by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct DiscardCounts {
    pub gene_cap: usize,
    pub invalid_identifier: usize,
}

/// Everything worth knowing about a finished run.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RunSummary {
    pub version: String,
    pub entry_stage: Stage,
    pub stages: Vec<StageSummary>,
    pub inputs: Vec<Resolved>,
    pub parse: ParseTallies,
    pub scoring: ScoringSummary,
    pub transcripts: usize,
    pub genes: usize,
    pub retained: usize,
    pub quality: QualityCounts,
    pub discarded: DiscardCounts,
    pub invalid_identifiers: Vec<InvalidIdentifierError>,
    /// Number of exported sequences, if the export is enabled.
    pub exported_sequences: Option<usize>,
    pub busco: Option<Assessments>,
}

impl DiscardCounts {
    pub fn count(selection: &Selection, invalid: usize) -> Self {
        Self {
            gene_cap: selection
                .discarded
                .iter()
                .filter(|d| d.reason == DiscardReason::GeneCap)
                .count(),
            invalid_identifier: invalid,
        }
    }
}

/// Write `summary` as pretty-printed JSON.
///
/// # Errors
///
/// If anything goes wrong, it returns a generic `anyhow::Error`.
pub fn write_file<P>(path: P, summary: &RunSummary) -> Result<(), anyhow::Error>
where
    P: AsRef<Path>,
{
    let file = std::fs::File::create(path.as_ref())
        .map_err(|e| anyhow::anyhow!("problem creating {}: {}", path.as_ref().display(), e))?;
    let mut writer = std::io::BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, summary)
        .map_err(|e| anyhow::anyhow!("problem writing run summary: {}", e))?;
    writer
        .flush()
        .map_err(|e| anyhow::anyhow!("problem flushing {}: {}", path.as_ref().display(), e))?;
    Ok(())
}
