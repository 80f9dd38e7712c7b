//! Error taxonomy of the scoring engine and the pipeline driver.
//!
//! Line-local problems ([`MalformedRecordError`]) are recovered and counted by the
//! parsers; all other errors abort either a single transcript
//! ([`InvalidIdentifierError`]) or the whole run.

use std::path::PathBuf;

use crate::pipeline::stage::{Artifact, Stage};

/// One unparsable line in an evidence file.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed record at {}:{}: {}", .path.display(), .line_no, .reason)]
pub struct MalformedRecordError {
    /// Path of the evidence file.
    pub path: PathBuf,
    /// 1-based line number.
    pub line_no: usize,
    /// Why the line was rejected.
    pub reason: String,
}

/// A transcript identifier that does not follow the `<gene><sep><variant>` convention.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[error(
    "invalid transcript identifier {:?}: expected at least two non-empty '{}'-separated segments",
    .transcript_id,
    .separator
)]
pub struct InvalidIdentifierError {
    /// The offending identifier.
    pub transcript_id: String,
    /// The segment separator in use.
    pub separator: char,
}

/// One strategy tried while locating an artifact, with what was found.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Attempt {
    /// The strategy.
    pub strategy: crate::pipeline::resolve::Strategy,
    /// Human readable outcome, including the concrete path(s) probed.
    pub detail: String,
}

impl std::fmt::Display for Attempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.strategy, self.detail)
    }
}

/// Helper for rendering the list of attempted strategies.
fn format_attempts(attempts: &[Attempt]) -> String {
    attempts
        .iter()
        .enumerate()
        .map(|(idx, attempt)| format!("  ({}) {}", idx + 1, attempt))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A required intermediate artifact could not be located.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "could not locate the {} (`{}`) produced by stage `{}`; attempted:\n{}",
    .artifact,
    .artifact.file_hint(),
    .artifact.producer(),
    format_attempts(.attempts)
)]
pub struct MissingArtifactError {
    /// The artifact looked for.
    pub artifact: Artifact,
    /// All strategies that were tried, in priority order.
    pub attempts: Vec<Attempt>,
}

/// Configured scoring weights are unusable.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum WeightConfigurationError {
    /// A weight is below zero.
    #[error("weight `{name}` of the {set} weight set is negative: {value}")]
    Negative {
        /// Weight set name.
        set: &'static str,
        /// Weight name.
        name: &'static str,
        /// The configured value.
        value: f64,
    },
    /// A weight is NaN or infinite.
    #[error("weight `{name}` of the {set} weight set is not a finite number")]
    NonFinite {
        /// Weight set name.
        set: &'static str,
        /// Weight name.
        name: &'static str,
    },
    /// All weights are zero, so there is nothing to renormalize.
    #[error("weights of the {set} weight set sum to {sum}, cannot renormalize to 1.0")]
    ZeroSum {
        /// Weight set name.
        set: &'static str,
        /// The sum of the weights.
        sum: f64,
    },
}

/// An external stage command did not complete.
#[derive(thiserror::Error, Debug)]
pub enum StageError {
    /// The program could not be started.
    #[error("stage `{stage}`: could not start `{program}`: {source}")]
    Spawn {
        /// The stage.
        stage: Stage,
        /// Program name.
        program: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The program exited unsuccessfully.
    #[error("stage `{stage}`: `{program}` exited with {status}")]
    Failed {
        /// The stage.
        stage: Stage,
        /// Program name.
        program: String,
        /// Exit status.
        status: std::process::ExitStatus,
    },
    /// The program did not finish in time.
    #[error("stage `{stage}`: `{program}` did not finish within {secs}s")]
    TimedOut {
        /// The stage.
        stage: Stage,
        /// Program name.
        program: String,
        /// The configured timeout.
        secs: u64,
    },
    /// The program finished but its output artifact is nowhere to be found.
    #[error("stage `{stage}` finished but produced no {artifact} below {}", .output.display())]
    NoOutput {
        /// The stage.
        stage: Stage,
        /// The expected artifact.
        artifact: Artifact,
        /// Where the output was expected.
        output: PathBuf,
    },
    /// The stage has no input to work on.
    #[error("stage `{stage}` needs an input file; pass one with --input")]
    NoInput {
        /// The stage.
        stage: Stage,
    },
}
