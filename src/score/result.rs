//! Scored transcripts.

use crate::data::orf::OrfType;
use crate::data::ortholog::OrthologHit;

/// Confidence band of a transcript.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Deserialize,
    serde::Serialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Quality {
    High,
    Medium,
    Low,
}

impl Quality {
    /// Lower bound of the `high` band.
    pub const HIGH: f64 = 0.7;
    /// Lower bound of the `medium` band.
    pub const MEDIUM: f64 = 0.5;

    /// Band of an absolute score.
    pub fn from_score(total: f64) -> Self {
        if total >= Self::HIGH {
            Quality::High
        } else if total >= Self::MEDIUM {
            Quality::Medium
        } else {
            Quality::Low
        }
    }

    /// Band of an absolute score, forced to `low` below `threshold`.
    pub fn with_threshold(total: f64, threshold: f64) -> Self {
        if total < threshold {
            Quality::Low
        } else {
            Self::from_score(total)
        }
    }
}

/// Sub-scores and their weighted sum, all in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct SubScores {
    pub completeness: f64,
    pub homology: f64,
    pub length: f64,
    pub busco: f64,
    pub total: f64,
}

/// A transcript with its evidence and scores.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TranscriptRecord {
    pub transcript_id: String,
    pub gene_id: String,
    pub orf_type: OrfType,
    pub orf_length: u64,
    pub has_homology: bool,
    /// BUSCO match; `None` is the `none` status.
    pub busco: Option<OrthologHit>,
    pub scores: SubScores,
    pub quality: Quality,
}

impl TranscriptRecord {
    /// BUSCO status token, empty without a match.
    pub fn busco_status_token(&self) -> &'static str {
        self.busco.as_ref().map_or("", |hit| hit.status.token())
    }

    /// BUSCO identifier, empty without a match.
    pub fn busco_gene(&self) -> &str {
        self.busco.as_ref().map_or("", |hit| hit.busco_id.as_str())
    }
}
