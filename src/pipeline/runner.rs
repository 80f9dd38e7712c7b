//! Running the external stage commands.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::CommandsConfig;
use crate::error::StageError;

use super::context::RunContext;
use super::resolve::{self, Probe};
use super::stage::{Artifact, Stage};

/// Command line of one stage, with placeholders.
///
/// `{input}`, `{output}`, `{work_dir}` and `{threads}` are replaced in every
/// argument.  Paths are passed as absolute paths; the command runs in the
/// work directory.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct CommandTemplate {
    /// Program to execute.
    pub program: String,
    /// Arguments.
    #[serde(default)]
    pub args: Vec<String>,
    /// Kill the command after this many seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Values substituted into a [`CommandTemplate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholders {
    pub input: PathBuf,
    pub output: PathBuf,
    pub work_dir: PathBuf,
    pub threads: usize,
}

impl CommandTemplate {
    /// The arguments with all placeholders replaced.
    pub fn render(&self, values: &Placeholders) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{input}", &values.input.to_string_lossy())
                    .replace("{output}", &values.output.to_string_lossy())
                    .replace("{work_dir}", &values.work_dir.to_string_lossy())
                    .replace("{threads}", &values.threads.to_string())
            })
            .collect()
    }
}

/// Executes the external stages.
#[allow(async_fn_in_trait)]
pub trait StageRunner {
    /// Whether `stage` has something to run.
    fn has_command(&self, stage: Stage) -> bool;

    /// Run `stage` to completion.
    async fn run_stage(&self, stage: Stage, values: &Placeholders) -> Result<(), StageError>;
}

/// Runs the configured command templates as child processes.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    commands: CommandsConfig,
}

impl CommandRunner {
    pub fn new(commands: CommandsConfig) -> Self {
        Self { commands }
    }
}

impl StageRunner for CommandRunner {
    fn has_command(&self, stage: Stage) -> bool {
        self.commands.get(stage).is_some()
    }

    async fn run_stage(&self, stage: Stage, values: &Placeholders) -> Result<(), StageError> {
        let Some(template) = self.commands.get(stage) else {
            return Ok(());
        };
        let args = template.render(values);
        tracing::info!("stage `{}`: {} {}", stage, template.program, args.join(" "));

        let mut command = tokio::process::Command::new(&template.program);
        command
            .args(&args)
            .current_dir(&values.work_dir)
            .kill_on_drop(true);

        let before = std::time::Instant::now();
        let status = match template.timeout_secs {
            Some(secs) => tokio::time::timeout(Duration::from_secs(secs), command.status())
                .await
                .map_err(|_| StageError::TimedOut {
                    stage,
                    program: template.program.clone(),
                    secs,
                })?,
            None => command.status().await,
        }
        .map_err(|source| StageError::Spawn {
            stage,
            program: template.program.clone(),
            source,
        })?;

        if !status.success() {
            return Err(StageError::Failed {
                stage,
                program: template.program.clone(),
                status,
            });
        }
        tracing::info!(
            "stage `{}` finished in {:?}",
            stage,
            before.elapsed()
        );
        Ok(())
    }
}

/// Make `path` absolute relative to the current directory.
fn absolute(path: &Path) -> Result<PathBuf, anyhow::Error> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        let cwd = std::env::current_dir()
            .map_err(|e| anyhow::anyhow!("cannot determine current directory: {}", e))?;
        Ok(cwd.join(path))
    }
}

/// The input file of `stage`.
fn stage_input<P: Probe>(
    ctx: &RunContext,
    stage: Stage,
    probe: &P,
) -> Result<PathBuf, anyhow::Error> {
    let assembly = || {
        ctx.input()
            .map(Path::to_path_buf)
            .ok_or(StageError::NoInput { stage })
    };
    match stage {
        Stage::RedundancyRemoval => Ok(assembly()?),
        Stage::OrfPrediction | Stage::OrthologAssessment => {
            match resolve::resolve_optional(ctx, Artifact::ClusteredTranscripts, probe) {
                Some(resolved) => Ok(resolved.path),
                None => Ok(assembly()?),
            }
        }
        Stage::HomologySearch => {
            // TransDecoder writes the peptides next to the annotation
            let annotation = resolve::resolve(ctx, Artifact::OrfAnnotation, probe)?;
            Ok(annotation.path.with_extension("pep"))
        }
        Stage::Scoring => Err(StageError::NoInput { stage }.into()),
    }
}

/// Run all pending external stages in order.
///
/// Stages without a command are skipped.  The output of each stage that ran is
/// located at its conventional location and recorded in the returned context.
///
/// # Errors
///
/// If a stage cannot be run, fails, or produces no output.
pub async fn run_pending<R, P>(
    ctx: RunContext,
    runner: &R,
    probe: &P,
    threads: usize,
) -> Result<RunContext, anyhow::Error>
where
    R: StageRunner,
    P: Probe,
{
    let mut ctx = ctx;
    for stage in ctx.plan().pending() {
        let (Some(artifact), Some(output)) =
            (stage.produces(), stage.output_location(ctx.work_dir()))
        else {
            continue;
        };
        if !runner.has_command(stage) {
            tracing::info!("no command configured for stage `{}`, skipping it", stage);
            ctx = ctx.skip(stage)?;
            continue;
        }

        let input = stage_input(&ctx, stage, probe)?;
        let work_dir = absolute(ctx.work_dir())?;
        let output = absolute(&output)?;
        let output_dir = match stage {
            Stage::OrfPrediction | Stage::OrthologAssessment => Some(output.as_path()),
            _ => output.parent(),
        };
        if let Some(dir) = output_dir {
            std::fs::create_dir_all(dir)
                .map_err(|e| anyhow::anyhow!("problem creating {}: {}", dir.display(), e))?;
        }

        let values = Placeholders {
            input: absolute(&input)?,
            output: output.clone(),
            work_dir,
            threads,
        };
        runner.run_stage(stage, &values).await?;

        let produced = artifact
            .default_locations()
            .first()
            .and_then(|spec| resolve::find_at(ctx.work_dir(), spec, probe))
            .ok_or(StageError::NoOutput {
                stage,
                artifact,
                output,
            })?;
        tracing::info!("stage `{}` produced {}", stage, produced.display());
        ctx = ctx.complete(stage, artifact, produced)?;
    }
    Ok(ctx)
}
