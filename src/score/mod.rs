//! Evidence-based confidence scoring of transcripts.

use rayon::prelude::*;

use crate::data::orf::OrfType;
use crate::data::ortholog::BuscoStatus;

pub mod evidence;
pub mod result;
pub mod weights;

use evidence::TranscriptEvidence;
use result::{Quality, SubScores, TranscriptRecord};
use weights::{ValidatedWeights, WeightProfile, Weights};

/// Tables mapping evidence categories to sub-scores.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    clap::ValueEnum,
    serde::Deserialize,
    serde::Serialize,
    strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Profile {
    /// Partial ORFs 0.6, internal 0.3, duplicated BUSCO 0.9.
    #[default]
    Standard,
    /// Partial ORFs 0.5, internal 0.0, duplicated BUSCO 1.0.
    Simple,
}

/// Sub-score of one evidence category.
pub trait SubScore {
    /// The sub-score in `[0, 1]` under `profile`.
    fn sub_score(&self, profile: Profile) -> f64;
}

impl SubScore for OrfType {
    fn sub_score(&self, profile: Profile) -> f64 {
        match (self, profile) {
            (OrfType::Complete, _) => 1.0,
            (OrfType::FivePrimePartial | OrfType::ThreePrimePartial, Profile::Standard) => 0.6,
            (OrfType::FivePrimePartial | OrfType::ThreePrimePartial, Profile::Simple) => 0.5,
            (OrfType::Internal, Profile::Standard) => 0.3,
            (OrfType::Internal, Profile::Simple) => 0.0,
        }
    }
}

impl SubScore for BuscoStatus {
    fn sub_score(&self, profile: Profile) -> f64 {
        match (self, profile) {
            (BuscoStatus::Complete, _) => 1.0,
            (BuscoStatus::Duplicated, Profile::Standard) => 0.9,
            (BuscoStatus::Duplicated, Profile::Simple) => 1.0,
            (BuscoStatus::Fragmented, _) => 0.5,
            (BuscoStatus::Missing, _) => 0.0,
        }
    }
}

impl<T: SubScore> SubScore for Option<T> {
    fn sub_score(&self, profile: Profile) -> f64 {
        self.as_ref().map_or(0.0, |inner| inner.sub_score(profile))
    }
}

/// Normalization length of the length sub-score.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    serde_with::DeserializeFromStr,
    serde_with::SerializeDisplay,
)]
pub enum MaxOrfLength {
    /// Longest ORF of the run.
    #[default]
    Observed,
    /// Fixed length in nucleotides.
    Fixed(u64),
}

impl std::str::FromStr for MaxOrfLength {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "observed" {
            return Ok(MaxOrfLength::Observed);
        }
        match s.strip_prefix("fixed:").map(str::parse::<u64>) {
            Some(Ok(length)) if length > 0 => Ok(MaxOrfLength::Fixed(length)),
            _ => anyhow::bail!(
                "invalid maximal ORF length {:?}, expected `observed` or `fixed:<n>` with n > 0",
                s
            ),
        }
    }
}

impl std::fmt::Display for MaxOrfLength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaxOrfLength::Observed => write!(f, "observed"),
            MaxOrfLength::Fixed(length) => write!(f, "fixed:{}", length),
        }
    }
}

/// Scoring model of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Scorer {
    profile: Profile,
    max_orf_length: u64,
    weight_profile: WeightProfile,
    weights: Weights,
}

impl Scorer {
    /// Fix the scoring model for the transcripts in `evidence`.
    ///
    /// # Arguments
    ///
    /// * `profile` - Sub-score tables.
    /// * `max_orf_length` - Length normalization; `observed` uses the
    ///   longest ORF in `evidence`.
    /// * `weights` - Validated weight sets.
    /// * `has_ortholog_evidence` - Whether a BUSCO table was parsed; selects
    ///   the full or fallback weight set.
    /// * `evidence` - All transcripts of the run.
    pub fn new(
        profile: Profile,
        max_orf_length: MaxOrfLength,
        weights: &ValidatedWeights,
        has_ortholog_evidence: bool,
        evidence: &[TranscriptEvidence],
    ) -> Self {
        let max_orf_length = match max_orf_length {
            MaxOrfLength::Observed => {
                let observed = evidence.iter().map(|t| t.orf_length).max().unwrap_or(0);
                tracing::info!("length normalization: longest observed ORF, {} nt", observed);
                observed
            }
            MaxOrfLength::Fixed(length) => {
                tracing::info!("length normalization: fixed, {} nt", length);
                length
            }
        };
        let (weight_profile, weights) = weights.select(has_ortholog_evidence);
        match weight_profile {
            WeightProfile::Full => tracing::info!(
                "weights: busco {:.3}, completeness {:.3}, homology {:.3}, length {:.3}",
                weights.busco,
                weights.completeness,
                weights.homology,
                weights.length
            ),
            WeightProfile::Fallback => tracing::info!(
                "no BUSCO evidence, using fallback weights: completeness {:.3}, homology {:.3}, \
                 length {:.3}",
                weights.completeness,
                weights.homology,
                weights.length
            ),
        }
        tracing::info!("sub-score profile: {}", profile);

        Self {
            profile,
            max_orf_length,
            weight_profile,
            weights,
        }
    }

    pub fn weight_profile(&self) -> WeightProfile {
        self.weight_profile
    }

    pub fn max_orf_length(&self) -> u64 {
        self.max_orf_length
    }

    /// Score one transcript.
    pub fn score(&self, transcript: &TranscriptEvidence) -> TranscriptRecord {
        let completeness = transcript.orf_type.sub_score(self.profile);
        let homology = if transcript.has_homology { 1.0 } else { 0.0 };
        let length = if self.max_orf_length == 0 {
            0.0
        } else {
            (transcript.orf_length as f64 / self.max_orf_length as f64).min(1.0)
        };
        let busco = match self.weight_profile {
            WeightProfile::Full => transcript
                .busco
                .as_ref()
                .map(|hit| hit.status)
                .sub_score(self.profile),
            WeightProfile::Fallback => 0.0,
        };
        let total = (self.weights.busco * busco
            + self.weights.completeness * completeness
            + self.weights.homology * homology
            + self.weights.length * length)
            .clamp(0.0, 1.0);

        TranscriptRecord {
            transcript_id: transcript.transcript_id.clone(),
            gene_id: transcript.gene_id.clone(),
            orf_type: transcript.orf_type,
            orf_length: transcript.orf_length,
            has_homology: transcript.has_homology,
            busco: transcript.busco.clone(),
            scores: SubScores {
                completeness: completeness.clamp(0.0, 1.0),
                homology,
                length: length.clamp(0.0, 1.0),
                busco: busco.clamp(0.0, 1.0),
                total,
            },
            quality: Quality::from_score(total),
        }
    }

    /// Score all transcripts on the rayon pool, keeping input order.
    pub fn score_all(&self, transcripts: &[TranscriptEvidence]) -> Vec<TranscriptRecord> {
        let records = transcripts
            .par_iter()
            .map(|transcript| self.score(transcript))
            .collect::<Vec<_>>();
        log_distribution(&records);
        records
    }
}

fn log_distribution(records: &[TranscriptRecord]) {
    if records.is_empty() {
        tracing::warn!("no transcripts to score");
        return;
    }
    let totals = records.iter().map(|r| r.scores.total);
    let min = totals.clone().fold(f64::INFINITY, f64::min);
    let max = totals.clone().fold(f64::NEG_INFINITY, f64::max);
    let mean = totals.sum::<f64>() / records.len() as f64;
    let count = |quality: Quality| records.iter().filter(|r| r.quality == quality).count();
    tracing::info!(
        "scored {} transcripts: min {:.4}, mean {:.4}, max {:.4}; {} high, {} medium, {} low",
        records.len(),
        min,
        mean,
        max,
        count(Quality::High),
        count(Quality::Medium),
        count(Quality::Low)
    );
}
