//! Pipeline stages, their artifacts and the stage state machine.

use std::path::{Path, PathBuf};

use strum::IntoEnumIterator as _;

/// The pipeline stages, in execution order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    clap::ValueEnum,
    serde::Deserialize,
    serde::Serialize,
    strum::Display,
    strum::EnumIter,
)]
#[value(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    /// Redundancy removal of the assembled transcripts (CD-HIT-EST).
    RedundancyRemoval,
    /// ORF prediction (TransDecoder).
    OrfPrediction,
    /// Homology search of the predicted peptides (DIAMOND/BLASTP).
    HomologySearch,
    /// Conserved-ortholog assessment (BUSCO).
    OrthologAssessment,
    /// Evidence integration, scoring and selection.
    Scoring,
}

impl Stage {
    /// The artifact this stage produces, if any.
    pub fn produces(self) -> Option<Artifact> {
        match self {
            Stage::RedundancyRemoval => Some(Artifact::ClusteredTranscripts),
            Stage::OrfPrediction => Some(Artifact::OrfAnnotation),
            Stage::HomologySearch => Some(Artifact::HomologyHits),
            Stage::OrthologAssessment => Some(Artifact::OrthologTable),
            Stage::Scoring => None,
        }
    }

    /// Where the stage's command is asked to write its output.
    ///
    /// These match the first conventional location of each artifact, so the
    /// output of a stage that ran is found again by the default search.
    pub fn output_location(self, work_dir: &Path) -> Option<PathBuf> {
        match self {
            Stage::RedundancyRemoval => Some(work_dir.join("cdhit_result.fasta")),
            Stage::OrfPrediction => Some(work_dir.join("transdecoder_results")),
            Stage::HomologySearch => Some(
                work_dir
                    .join("transdecoder_results")
                    .join("blastp_results.outfmt6"),
            ),
            Stage::OrthologAssessment => Some(work_dir.join("busco_after")),
            Stage::Scoring => None,
        }
    }
}

/// State of one stage in a run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StageState {
    /// Not run yet.
    Pending,
    /// Ran in this process and recorded its output.
    Satisfied,
    /// Not run in this process; its output must be located on disk.
    Skipped,
}

/// Intermediate files passed between stages.
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
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum Artifact {
    /// Non-redundant transcripts FASTA.
    ClusteredTranscripts,
    /// ORF annotation GFF3.
    OrfAnnotation,
    /// Homology hit table (outfmt6).
    HomologyHits,
    /// BUSCO full table.
    OrthologTable,
}

impl std::fmt::Display for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Artifact::ClusteredTranscripts => "clustered transcripts FASTA",
            Artifact::OrfAnnotation => "ORF annotation GFF3",
            Artifact::HomologyHits => "homology hit table",
            Artifact::OrthologTable => "BUSCO full table",
        })
    }
}

/// How to recognize a file by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMatcher {
    /// The file name equals the given string.
    Exact(&'static str),
    /// The file name ends with the given string.
    Suffix(&'static str),
    /// The file name starts with the first and ends with the second string.
    PrefixSuffix(&'static str, &'static str),
}

impl FileMatcher {
    /// Whether `file_name` matches.
    pub fn matches(&self, file_name: &str) -> bool {
        match self {
            FileMatcher::Exact(name) => file_name == *name,
            FileMatcher::Suffix(suffix) => {
                file_name.len() > suffix.len() && file_name.ends_with(suffix)
            }
            FileMatcher::PrefixSuffix(prefix, suffix) => {
                file_name.len() >= prefix.len() + suffix.len()
                    && file_name.starts_with(prefix)
                    && file_name.ends_with(suffix)
            }
        }
    }
}

impl std::fmt::Display for FileMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileMatcher::Exact(name) => write!(f, "{}", name),
            FileMatcher::Suffix(suffix) => write!(f, "*{}", suffix),
            FileMatcher::PrefixSuffix(prefix, suffix) => write!(f, "{}*{}", prefix, suffix),
        }
    }
}

/// A conventional location of an artifact below the work directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSpec {
    /// Directory relative to the work directory.
    pub root: &'static str,
    /// File name pattern.
    pub matcher: FileMatcher,
    /// Number of directory levels below `root` to descend; `None` is unlimited.
    pub max_depth: Option<usize>,
    /// Whether a match here is an intermediate product that deserves a warning.
    pub intermediate: bool,
}

impl SearchSpec {
    /// The search root below `work_dir`.
    pub fn root_in(&self, work_dir: &Path) -> PathBuf {
        if self.root == "." {
            work_dir.to_path_buf()
        } else {
            work_dir.join(self.root)
        }
    }
}

impl Artifact {
    /// The stage producing this artifact.
    pub fn producer(self) -> Stage {
        Stage::iter()
            .find(|stage| stage.produces() == Some(self))
            .unwrap_or(Stage::Scoring)
    }

    /// Whether scoring can go ahead without this artifact.
    pub fn is_optional_evidence(self) -> bool {
        matches!(self, Artifact::HomologyHits | Artifact::OrthologTable)
    }

    /// File name pattern shown to users.
    pub fn file_hint(self) -> String {
        self.default_locations()
            .first()
            .map(|spec| spec.matcher.to_string())
            .unwrap_or_default()
    }

    /// Conventional locations, in priority order.
    pub fn default_locations(self) -> Vec<SearchSpec> {
        match self {
            Artifact::ClusteredTranscripts => vec![SearchSpec {
                root: ".",
                matcher: FileMatcher::Exact("cdhit_result.fasta"),
                max_depth: Some(0),
                intermediate: false,
            }],
            Artifact::OrfAnnotation => vec![
                SearchSpec {
                    root: "transdecoder_results",
                    matcher: FileMatcher::Suffix(".transdecoder.gff3"),
                    max_depth: Some(0),
                    intermediate: false,
                },
                SearchSpec {
                    root: "transdecoder_results",
                    matcher: FileMatcher::Exact("longest_orfs.gff3"),
                    max_depth: Some(1),
                    intermediate: true,
                },
            ],
            Artifact::HomologyHits => vec![
                SearchSpec {
                    root: "transdecoder_results",
                    matcher: FileMatcher::Exact("blastp_results.outfmt6"),
                    max_depth: None,
                    intermediate: false,
                },
                SearchSpec {
                    root: ".",
                    matcher: FileMatcher::Exact("blastp_results.outfmt6"),
                    max_depth: Some(0),
                    intermediate: false,
                },
            ],
            Artifact::OrthologTable => vec![
                SearchSpec {
                    root: "busco_after",
                    matcher: FileMatcher::Exact("full_table.tsv"),
                    max_depth: None,
                    intermediate: false,
                },
                SearchSpec {
                    root: "busco_before",
                    matcher: FileMatcher::Exact("full_table.tsv"),
                    max_depth: None,
                    intermediate: false,
                },
            ],
        }
    }
}

/// Per-stage states of one run.
///
/// Created from the requested entry stage: every earlier stage is `Skipped`,
/// the entry stage and everything after it `Pending`.  The only transitions
/// are `Pending -> Satisfied` (the stage ran) and `Pending -> Skipped` (the
/// stage has nothing to run).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StagePlan {
    /// The requested entry stage.
    entry: Stage,
    /// State per stage, in pipeline order.
    states: Vec<(Stage, StageState)>,
}

impl StagePlan {
    /// Plan for resuming at `entry`.
    pub fn for_entry(entry: Stage) -> Self {
        let states = Stage::iter()
            .map(|stage| {
                let state = if stage < entry {
                    StageState::Skipped
                } else {
                    StageState::Pending
                };
                (stage, state)
            })
            .collect();
        Self { entry, states }
    }

    /// The requested entry stage.
    pub fn entry(&self) -> Stage {
        self.entry
    }

    /// State of `stage`.
    pub fn state(&self, stage: Stage) -> StageState {
        self.states
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, state)| *state)
            .unwrap_or(StageState::Pending)
    }

    /// All states in pipeline order.
    pub fn states(&self) -> &[(Stage, StageState)] {
        &self.states
    }

    /// Stages that are still pending, in pipeline order.
    pub fn pending(&self) -> Vec<Stage> {
        self.stages_in(StageState::Pending)
    }

    /// Stages that were skipped, in pipeline order.
    pub fn skipped(&self) -> Vec<Stage> {
        self.stages_in(StageState::Skipped)
    }

    fn stages_in(&self, wanted: StageState) -> Vec<Stage> {
        self.states
            .iter()
            .filter(|(_, state)| *state == wanted)
            .map(|(stage, _)| *stage)
            .collect()
    }

    /// Return the plan with `stage` moved to state `to`.
    ///
    /// # Errors
    ///
    /// If the transition is not `Pending -> Satisfied` or `Pending -> Skipped`.
    pub fn transition(&self, stage: Stage, to: StageState) -> Result<Self, anyhow::Error> {
        let from = self.state(stage);
        if from != StageState::Pending || to == StageState::Pending {
            anyhow::bail!("invalid transition of stage `{}`: {} -> {}", stage, from, to);
        }
        let states = self
            .states
            .iter()
            .map(|(s, state)| if *s == stage { (*s, to) } else { (*s, *state) })
            .collect();
        Ok(Self {
            entry: self.entry,
            states,
        })
    }
}
