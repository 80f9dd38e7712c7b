//! Immutable run state threaded through the stages.

use std::path::{Path, PathBuf};

use super::stage::{Artifact, Stage, StagePlan, StageState};

/// State of one pipeline run.
///
/// Every update returns a new value; a `RunContext` is never mutated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct RunContext {
    /// Work directory holding the stage outputs.
    work_dir: PathBuf,
    /// Assembled transcripts, the input of the first stage.
    input: Option<PathBuf>,
    /// Artifact paths given on the command line or in the configuration.
    explicit: rustc_hash::FxHashMap<Artifact, PathBuf>,
    /// Artifact paths recorded by stages that ran in this process.
    recorded: rustc_hash::FxHashMap<Artifact, PathBuf>,
    /// Stage states.
    plan: StagePlan,
}

impl RunContext {
    /// Fresh context for a run resuming at `entry`.
    pub fn new<P: AsRef<Path>>(work_dir: P, entry: Stage) -> Self {
        Self {
            work_dir: work_dir.as_ref().to_path_buf(),
            input: None,
            explicit: Default::default(),
            recorded: Default::default(),
            plan: StagePlan::for_entry(entry),
        }
    }

    /// Context with the assembled transcripts set.
    pub fn with_input(self, input: Option<PathBuf>) -> Self {
        Self { input, ..self }
    }

    /// Context with an explicit path for `artifact`.
    pub fn with_explicit(self, artifact: Artifact, path: PathBuf) -> Self {
        let mut explicit = self.explicit;
        explicit.insert(artifact, path);
        Self { explicit, ..self }
    }

    /// Context after `stage` ran and produced `path`.
    ///
    /// # Errors
    ///
    /// If `stage` is not pending or does not produce `artifact`.
    pub fn complete(
        self,
        stage: Stage,
        artifact: Artifact,
        path: PathBuf,
    ) -> Result<Self, anyhow::Error> {
        if stage.produces() != Some(artifact) {
            anyhow::bail!("stage `{}` does not produce the {}", stage, artifact);
        }
        let plan = self.plan.transition(stage, StageState::Satisfied)?;
        let mut recorded = self.recorded;
        recorded.insert(artifact, path);
        Ok(Self {
            plan,
            recorded,
            ..self
        })
    }

    /// Context after `stage` was passed over without running.
    ///
    /// # Errors
    ///
    /// If `stage` is not pending.
    pub fn skip(self, stage: Stage) -> Result<Self, anyhow::Error> {
        let plan = self.plan.transition(stage, StageState::Skipped)?;
        Ok(Self { plan, ..self })
    }

    /// Context after `stage`, which produces no artifact, ran.
    ///
    /// # Errors
    ///
    /// If `stage` is not pending or produces an artifact.
    pub fn finish(self, stage: Stage) -> Result<Self, anyhow::Error> {
        if let Some(artifact) = stage.produces() {
            anyhow::bail!("stage `{}` produces the {} and must record it", stage, artifact);
        }
        let plan = self.plan.transition(stage, StageState::Satisfied)?;
        Ok(Self { plan, ..self })
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn input(&self) -> Option<&Path> {
        self.input.as_deref()
    }

    pub fn explicit(&self, artifact: Artifact) -> Option<&Path> {
        self.explicit.get(&artifact).map(PathBuf::as_path)
    }

    pub fn recorded(&self, artifact: Artifact) -> Option<&Path> {
        self.recorded.get(&artifact).map(PathBuf::as_path)
    }

    pub fn plan(&self) -> &StagePlan {
        &self.plan
    }
}
