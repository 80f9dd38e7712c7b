//! Configuration file.
//!
//! All fields are optional; command line values override the file.

use std::path::{Path, PathBuf};

use crate::common::MultiMatchPolicy;
use crate::gene_id::DEFAULT_SEPARATOR;
use crate::pipeline::runner::CommandTemplate;
use crate::pipeline::stage::{Artifact, Stage};
use crate::score::weights::{FallbackWeightSet, WeightSet};
use crate::score::{MaxOrfLength, Profile};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding the stage outputs.
    pub work_dir: PathBuf,
    /// Assembled transcripts (FASTA), input of the first stage.
    pub input: Option<PathBuf>,
    /// Stage to start from.
    pub start_from: Stage,
    /// Explicit artifact paths.
    pub paths: ArtifactPaths,
    pub scoring: ScoringConfig,
    pub evidence: EvidenceConfig,
    /// Separator of the transcript identifier segments.
    pub gene_id_separator: char,
    pub outputs: OutputConfig,
    /// External commands per stage; stages without one are skipped.
    pub commands: CommandsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("orpheus_output"),
            input: None,
            start_from: Stage::RedundancyRemoval,
            paths: Default::default(),
            scoring: Default::default(),
            evidence: Default::default(),
            gene_id_separator: DEFAULT_SEPARATOR,
            outputs: Default::default(),
            commands: Default::default(),
        }
    }
}

/// Explicit paths of intermediate artifacts.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArtifactPaths {
    pub clustered_transcripts: Option<PathBuf>,
    pub orf_annotation: Option<PathBuf>,
    pub homology_hits: Option<PathBuf>,
    pub ortholog_table: Option<PathBuf>,
}

impl ArtifactPaths {
    /// The explicit path of `artifact`, if any.
    pub fn get(&self, artifact: Artifact) -> Option<&Path> {
        match artifact {
            Artifact::ClusteredTranscripts => self.clustered_transcripts.as_deref(),
            Artifact::OrfAnnotation => self.orf_annotation.as_deref(),
            Artifact::HomologyHits => self.homology_hits.as_deref(),
            Artifact::OrthologTable => self.ortholog_table.as_deref(),
        }
    }
}

/// Scoring and selection.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringConfig {
    /// Score below which transcripts are `low` and not exported.
    pub threshold: f64,
    /// Transcripts kept per gene; `0` keeps all.
    pub max_per_gene: usize,
    pub profile: Profile,
    pub max_orf_length: MaxOrfLength,
    pub weights: WeightSet,
    pub fallback_weights: FallbackWeightSet,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            max_per_gene: 1,
            profile: Profile::default(),
            max_orf_length: MaxOrfLength::default(),
            weights: WeightSet::default(),
            fallback_weights: FallbackWeightSet::default(),
        }
    }
}

/// Evidence parsing.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvidenceConfig {
    /// ORF model to keep for transcripts with several.
    pub orf_policy: MultiMatchPolicy,
    /// BUSCO match to keep for transcripts with several.
    pub ortholog_policy: MultiMatchPolicy,
    /// Homology hits above this e-value are ignored.
    pub evalue_ceiling: Option<f64>,
}

/// Result files.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Output directory; defaults to `<work_dir>/scoring`.
    pub output_dir: Option<PathBuf>,
    /// Whether to export the high-confidence sequences.
    pub export_fasta: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            export_fasta: true,
        }
    }
}

/// Command templates of the external stages.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CommandsConfig {
    pub redundancy_removal: Option<CommandTemplate>,
    pub orf_prediction: Option<CommandTemplate>,
    pub homology_search: Option<CommandTemplate>,
    pub ortholog_assessment: Option<CommandTemplate>,
}

impl CommandsConfig {
    /// The command of `stage`, if configured.
    pub fn get(&self, stage: Stage) -> Option<&CommandTemplate> {
        match stage {
            Stage::RedundancyRemoval => self.redundancy_removal.as_ref(),
            Stage::OrfPrediction => self.orf_prediction.as_ref(),
            Stage::HomologySearch => self.homology_search.as_ref(),
            Stage::OrthologAssessment => self.ortholog_assessment.as_ref(),
            Stage::Scoring => None,
        }
    }
}

impl Config {
    /// Load the configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// If the file cannot be read or parsed.
    pub fn load<P>(path: P) -> Result<Self, anyhow::Error>
    where
        P: AsRef<Path>,
    {
        let reader = std::fs::File::open(path.as_ref())
            .map_err(|e| anyhow::anyhow!("problem opening config {}: {}", path.as_ref().display(), e))
            .map(std::io::BufReader::new)?;
        serde_json::from_reader(reader).map_err(|e| {
            anyhow::anyhow!("problem parsing config {}: {}", path.as_ref().display(), e)
        })
    }

    /// The directory receiving the result files.
    pub fn output_dir(&self) -> PathBuf {
        self.outputs
            .output_dir
            .clone()
            .unwrap_or_else(|| self.work_dir.join("scoring"))
    }

    /// Check values that serde cannot.
    ///
    /// # Errors
    ///
    /// On the first invalid value.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        let threshold = self.scoring.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            anyhow::bail!("threshold must be within [0, 1], got {}", threshold);
        }
        if let Some(ceiling) = self.evidence.evalue_ceiling {
            if !ceiling.is_finite() || ceiling < 0.0 {
                anyhow::bail!("e-value ceiling must be a non-negative number, got {}", ceiling);
            }
        }
        if self.gene_id_separator.is_whitespace() {
            anyhow::bail!("gene identifier separator must not be whitespace");
        }
        for (stage, command) in [
            (Stage::RedundancyRemoval, &self.commands.redundancy_removal),
            (Stage::OrfPrediction, &self.commands.orf_prediction),
            (Stage::HomologySearch, &self.commands.homology_search),
            (Stage::OrthologAssessment, &self.commands.ortholog_assessment),
        ] {
            if command.as_ref().is_some_and(|c| c.program.trim().is_empty()) {
                anyhow::bail!("command of stage `{}` has an empty program", stage);
            }
        }
        Ok(())
    }
}
