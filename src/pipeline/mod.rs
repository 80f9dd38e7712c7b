//! Stage orchestration and the `run` and `resolve` commands.

pub mod context;
pub mod resolve;
pub mod runner;
pub mod stage;

use std::path::PathBuf;

use clap::Parser;
use strum::IntoEnumIterator as _;

use crate::common::MultiMatchPolicy;
use crate::config::Config;
use crate::data::{busco_summary, homology, orf, ortholog};
use crate::gene_id::GeneIdDeriver;
use crate::report::summary::{
    DiscardCounts, ParseTallies, QualityCounts, RunSummary, ScoringSummary, StageSummary,
};
use crate::report::{self, fasta, genes};
use crate::score::{evidence, weights, MaxOrfLength, Profile, Scorer};

use self::context::RunContext;
use self::resolve::{LocalFs, Probe, Resolved};
use self::runner::CommandRunner;
use self::stage::{Artifact, Stage, StageState};

/// Where the configuration comes from and where the stage outputs live.
#[derive(Parser, Debug, Clone, Default)]
pub struct PathArgs {
    /// Path to JSON configuration file; command line values take precedence.
    #[clap(long)]
    pub path_config: Option<PathBuf>,
    /// Work directory holding the stage outputs.
    #[clap(long)]
    pub work_dir: Option<PathBuf>,
    /// Assembled transcripts (FASTA), input of the redundancy removal.
    #[clap(long)]
    pub input: Option<PathBuf>,
    /// Stage to start from; earlier stages are not run.
    #[clap(long, value_enum)]
    pub start_from: Option<Stage>,
    /// Path to the clustered transcripts FASTA.
    #[clap(long)]
    pub path_clustered: Option<PathBuf>,
    /// Path to the ORF annotation GFF3.
    #[clap(long)]
    pub path_gff3: Option<PathBuf>,
    /// Path to the homology hit table (outfmt6).
    #[clap(long)]
    pub path_homology: Option<PathBuf>,
    /// Path to the BUSCO full table.
    #[clap(long)]
    pub path_ortholog_table: Option<PathBuf>,
}

impl PathArgs {
    /// Load the configuration file, if any, and apply the overrides.
    ///
    /// # Errors
    ///
    /// If the configuration file cannot be loaded.
    pub fn load_config(&self) -> Result<Config, anyhow::Error> {
        let mut config = match &self.path_config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(work_dir) = &self.work_dir {
            config.work_dir = work_dir.clone();
        }
        if self.input.is_some() {
            config.input = self.input.clone();
        }
        if let Some(start_from) = self.start_from {
            config.start_from = start_from;
        }
        for (target, value) in [
            (&mut config.paths.clustered_transcripts, &self.path_clustered),
            (&mut config.paths.orf_annotation, &self.path_gff3),
            (&mut config.paths.homology_hits, &self.path_homology),
            (&mut config.paths.ortholog_table, &self.path_ortholog_table),
        ] {
            if value.is_some() {
                *target = value.clone();
            }
        }
        Ok(config)
    }
}

/// Command line arguments for `run` command.
#[derive(Parser, Debug, Clone, Default)]
#[command(about = "Run the pipeline and score the transcripts", long_about = None)]
pub struct Args {
    #[clap(flatten)]
    pub paths: PathArgs,
    /// Directory for the result files; defaults to `<work-dir>/scoring`.
    #[clap(long)]
    pub output_dir: Option<PathBuf>,
    /// Score below which transcripts are `low` and not exported.
    #[clap(long)]
    pub threshold: Option<f64>,
    /// Transcripts to keep per gene; `0` keeps all.
    #[clap(long)]
    pub max_per_gene: Option<usize>,
    /// Ignore homology hits with an e-value above this value.
    #[clap(long)]
    pub evalue_ceiling: Option<f64>,
    /// Sub-score tables to use.
    #[clap(long, value_enum)]
    pub profile: Option<Profile>,
    /// Length normalization, `observed` or `fixed:<n>`.
    #[clap(long)]
    pub max_orf_length: Option<MaxOrfLength>,
    /// ORF model to keep for transcripts with several.
    #[clap(long, value_enum)]
    pub orf_policy: Option<MultiMatchPolicy>,
    /// BUSCO match to keep for transcripts with several.
    #[clap(long, value_enum)]
    pub ortholog_policy: Option<MultiMatchPolicy>,
    /// Separator of the transcript identifier segments.
    #[clap(long)]
    pub gene_id_separator: Option<char>,
    /// Do not export the high-confidence sequences.
    #[clap(long)]
    pub no_fasta: bool,
}

impl Args {
    /// The effective configuration: file, then command line.
    ///
    /// # Errors
    ///
    /// If the configuration cannot be loaded or is invalid.
    pub fn config(&self) -> Result<Config, anyhow::Error> {
        let mut config = self.paths.load_config()?;
        if self.output_dir.is_some() {
            config.outputs.output_dir = self.output_dir.clone();
        }
        if let Some(threshold) = self.threshold {
            config.scoring.threshold = threshold;
        }
        if let Some(max_per_gene) = self.max_per_gene {
            config.scoring.max_per_gene = max_per_gene;
        }
        if self.evalue_ceiling.is_some() {
            config.evidence.evalue_ceiling = self.evalue_ceiling;
        }
        if let Some(profile) = self.profile {
            config.scoring.profile = profile;
        }
        if let Some(max_orf_length) = self.max_orf_length {
            config.scoring.max_orf_length = max_orf_length;
        }
        if let Some(policy) = self.orf_policy {
            config.evidence.orf_policy = policy;
        }
        if let Some(policy) = self.ortholog_policy {
            config.evidence.ortholog_policy = policy;
        }
        if let Some(separator) = self.gene_id_separator {
            config.gene_id_separator = separator;
        }
        if self.no_fasta {
            config.outputs.export_fasta = false;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Command line arguments for `resolve` command.
#[derive(Parser, Debug, Clone, Default)]
#[command(about = "Show where each intermediate artifact would be taken from", long_about = None)]
pub struct ResolveArgs {
    #[clap(flatten)]
    pub paths: PathArgs,
    /// Report the clustered transcripts as optional.
    #[clap(long)]
    pub no_fasta: bool,
}

/// Whether a run cannot proceed without `artifact`.
fn is_required(config: &Config, artifact: Artifact) -> bool {
    match artifact {
        Artifact::ClusteredTranscripts => config.outputs.export_fasta,
        _ => !artifact.is_optional_evidence(),
    }
}

/// Initial run context from the configuration.
fn initial_context(config: &Config) -> RunContext {
    Artifact::iter().fold(
        RunContext::new(&config.work_dir, config.start_from).with_input(config.input.clone()),
        |ctx, artifact| match config.paths.get(artifact) {
            Some(path) => ctx.with_explicit(artifact, path.to_path_buf()),
            None => ctx,
        },
    )
}

fn stage_summaries(ctx: &RunContext) -> Vec<StageSummary> {
    ctx.plan()
        .states()
        .iter()
        .map(|&(stage, state)| StageSummary { stage, state })
        .collect()
}

/// Main entry point for the `run` command.
///
/// # Arguments
///
/// * `common_args` - Commonly used command line arguments.
/// * `args` - Command line arguments specific to `run` command.
///
/// # Errors
///
/// If anything goes wrong, it returns a generic `anyhow::Error`.
pub async fn run(common_args: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!("  running command `run`");
    tracing::info!("  common_args = {:?}", &common_args);
    tracing::info!("  args = {:?}", &args);

    let config = args.config()?;
    let summary = run_with_config(&config, common_args.threads()).await?;
    tracing::info!(
        "retained {} of {} transcripts ({} high, {} medium, {} low) in {} genes",
        summary.retained,
        summary.transcripts,
        summary.quality.high,
        summary.quality.medium,
        summary.quality.low,
        summary.genes
    );

    Ok(())
}

/// Run the pending stages and score the transcripts.
///
/// # Errors
///
/// If a stage fails, a required artifact is missing, or writing fails.
pub async fn run_with_config(config: &Config, threads: usize) -> Result<RunSummary, anyhow::Error> {
    let weights = weights::validate(&config.scoring.weights, &config.scoring.fallback_weights)
        .map_err(|e| anyhow::anyhow!("invalid scoring weights: {}", e))?;

    let ctx = initial_context(config);
    tracing::info!(
        "starting at stage `{}`, skipping {:?}",
        ctx.plan().entry(),
        ctx.plan().skipped()
    );
    let command_runner = CommandRunner::new(config.commands.clone());
    let ctx = runner::run_pending(ctx, &command_runner, &LocalFs, threads).await?;

    score_and_report(config, ctx, &weights, threads)
}

/// The `scoring` stage: parse the evidence, score, select, and write the reports.
fn score_and_report(
    config: &Config,
    ctx: RunContext,
    weights: &weights::ValidatedWeights,
    threads: usize,
) -> Result<RunSummary, anyhow::Error> {
    let probe = LocalFs;

    // locate everything before reading anything
    let orf_annotation = resolve::resolve(&ctx, Artifact::OrfAnnotation, &probe)?;
    let homology_hits = resolve::resolve_optional(&ctx, Artifact::HomologyHits, &probe);
    let ortholog_table = resolve::resolve_optional(&ctx, Artifact::OrthologTable, &probe);
    let clustered = if is_required(config, Artifact::ClusteredTranscripts) {
        Some(resolve::resolve(
            &ctx,
            Artifact::ClusteredTranscripts,
            &probe,
        )?)
    } else {
        None
    };
    let inputs = [
        Some(&orf_annotation),
        homology_hits.as_ref(),
        ortholog_table.as_ref(),
        clustered.as_ref(),
    ]
    .into_iter()
    .flatten()
    .inspect(|resolved| {
        tracing::info!(
            "using {} from {} ({})",
            resolved.artifact,
            resolved.path.display(),
            resolved.strategy
        );
    })
    .cloned()
    .collect::<Vec<_>>();

    let orfs = orf::load_file(&orf_annotation.path, config.evidence.orf_policy)?;
    let homology = homology_hits
        .as_ref()
        .map(|r| homology::Data::new(&r.path, config.evidence.evalue_ceiling))
        .transpose()?;
    let orthologs = ortholog_table
        .as_ref()
        .map(|r| ortholog::Data::new(&r.path, config.evidence.ortholog_policy))
        .transpose()?;
    let assessments = busco_summary::assess(ctx.work_dir(), &probe);

    let parse = ParseTallies {
        orf: orfs.stats,
        homology: homology.as_ref().map(homology::Data::stats),
        ortholog: orthologs.as_ref().map(ortholog::Data::stats),
    };

    let mut deriver = GeneIdDeriver::new(config.gene_id_separator);
    let evidence = evidence::assemble(
        orfs.records,
        homology.as_ref(),
        orthologs.as_ref(),
        &mut deriver,
    );
    let has_ortholog_evidence = orthologs.as_ref().is_some_and(|data| !data.is_empty());
    let scorer = Scorer::new(
        config.scoring.profile,
        config.scoring.max_orf_length,
        weights,
        has_ortholog_evidence,
        &evidence.transcripts,
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| anyhow::anyhow!("problem building thread pool: {}", e))?;
    let records = pool.install(|| scorer.score_all(&evidence.transcripts));
    let n_transcripts = records.len() + evidence.invalid.len();

    let threshold = config.scoring.threshold;
    let selection = crate::select::select(records, threshold, config.scoring.max_per_gene);
    let gene_summaries = genes::summarize(&selection);

    let output_dir = config.output_dir();
    std::fs::create_dir_all(&output_dir).map_err(|e| {
        anyhow::anyhow!(
            "problem creating output directory {}: {}",
            output_dir.display(),
            e
        )
    })?;
    report::write_scores(output_dir.join(report::SCORES_FILE), &selection.retained)?;
    report::write_discarded(
        output_dir.join(report::DISCARDED_FILE),
        &selection.discarded,
        &evidence.invalid,
    )?;
    genes::write_file(output_dir.join(report::GENES_FILE), &gene_summaries)?;
    let exported_sequences = clustered
        .as_ref()
        .map(|clustered| {
            let ids = selection
                .retained
                .iter()
                .filter(|record| record.scores.total >= threshold)
                .map(|record| record.transcript_id.as_str())
                .collect();
            fasta::export(&clustered.path, output_dir.join(report::FASTA_FILE), &ids)
        })
        .transpose()?;

    let ctx = ctx.finish(Stage::Scoring)?;
    let (weight_profile, weights) = weights.select(has_ortholog_evidence);
    let summary = RunSummary {
        version: env!("CARGO_PKG_VERSION").to_string(),
        entry_stage: ctx.plan().entry(),
        stages: stage_summaries(&ctx),
        inputs,
        parse,
        scoring: ScoringSummary {
            profile: config.scoring.profile,
            max_orf_length: config.scoring.max_orf_length,
            max_orf_length_nt: scorer.max_orf_length(),
            weight_profile,
            weights,
            threshold,
            max_per_gene: config.scoring.max_per_gene,
        },
        transcripts: n_transcripts,
        genes: gene_summaries.len(),
        retained: selection.retained.len(),
        quality: QualityCounts::count(&selection.retained),
        discarded: DiscardCounts::count(&selection, evidence.invalid.len()),
        invalid_identifiers: evidence
            .invalid
            .iter()
            .map(|invalid| invalid.error.clone())
            .collect(),
        exported_sequences,
        busco: (assessments.before.is_some() || assessments.after.is_some())
            .then_some(assessments),
    };
    report::summary::write_file(output_dir.join(report::SUMMARY_FILE), &summary)?;
    tracing::info!("results written to {}", output_dir.display());

    Ok(summary)
}

/// Resolution of one artifact as reported by `resolve`.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ArtifactReport {
    pub artifact: Artifact,
    pub required: bool,
    /// The producing stage, if it would run before scoring.
    pub produced_by: Option<Stage>,
    pub resolved: Option<Resolved>,
    /// Why the artifact could not be located.
    pub error: Option<String>,
}

/// Output of the `resolve` command.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ResolveReport {
    pub work_dir: PathBuf,
    pub entry_stage: Stage,
    pub stages: Vec<StageSummary>,
    pub artifacts: Vec<ArtifactReport>,
}

impl ResolveReport {
    /// Artifacts a run would need but could not find.
    pub fn unmet(&self) -> impl Iterator<Item = &ArtifactReport> {
        self.artifacts
            .iter()
            .filter(|a| a.required && a.produced_by.is_none() && a.resolved.is_none())
    }
}

/// Locate all artifacts as a run from `config` would, without running anything.
pub fn build_resolve_report<P: Probe>(config: &Config, probe: &P) -> ResolveReport {
    let ctx = initial_context(config);
    let artifacts = Artifact::iter()
        .map(|artifact| {
            let producer = artifact.producer();
            let produced_by = (ctx.plan().state(producer) == StageState::Pending
                && config.commands.get(producer).is_some())
            .then_some(producer);
            let (resolved, error) = match resolve::resolve(&ctx, artifact, probe) {
                Ok(resolved) => (Some(resolved), None),
                Err(e) => (None, Some(e.to_string())),
            };
            ArtifactReport {
                artifact,
                required: is_required(config, artifact),
                produced_by,
                resolved,
                error,
            }
        })
        .collect();

    ResolveReport {
        work_dir: config.work_dir.clone(),
        entry_stage: config.start_from,
        stages: stage_summaries(&ctx),
        artifacts,
    }
}

/// Main entry point for the `resolve` command.
///
/// Prints the report as JSON to stdout.
///
/// # Errors
///
/// If the configuration cannot be loaded or a required artifact would be missing.
pub fn run_resolve(
    common_args: &crate::common::Args,
    args: &ResolveArgs,
) -> Result<(), anyhow::Error> {
    tracing::info!("  running command `resolve`");
    tracing::info!("  common_args = {:?}", &common_args);
    tracing::info!("  args = {:?}", &args);

    let mut config = args.paths.load_config()?;
    if args.no_fasta {
        config.outputs.export_fasta = false;
    }
    config.validate()?;

    let report = build_resolve_report(&config, &LocalFs);
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(unmet) = report.unmet().next() {
        anyhow::bail!(
            "a run would fail: {}",
            unmet.error.as_deref().unwrap_or_default()
        );
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use std::path::{Path, PathBuf};

    use super::{build_resolve_report, is_required, Args, PathArgs, ResolveArgs};
    use crate::config::Config;
    use crate::pipeline::resolve::{LocalFs, Strategy};
    use crate::pipeline::stage::{Artifact, Stage};
    use crate::score::Profile;

    const WORK_DIR: &str = "tests/data/workdir";

    fn common() -> crate::common::Args {
        crate::common::Args {
            verbose: clap_verbosity_flag::Verbosity::new(1, 0),
            threads: Some(1),
        }
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn run_smoke() -> Result<(), anyhow::Error> {
        let tmp_dir = tempfile::tempdir()?;
        let args = Args {
            paths: PathArgs {
                work_dir: Some(WORK_DIR.into()),
                ..Default::default()
            },
            output_dir: Some(tmp_dir.path().to_path_buf()),
            ..Default::default()
        };

        super::run(&common(), &args).await?;

        let read = |name: &str| std::fs::read_to_string(tmp_dir.path().join(name));
        insta::assert_snapshot!("transcript_scores", read(crate::report::SCORES_FILE)?);
        insta::assert_snapshot!("discarded_transcripts", read(crate::report::DISCARDED_FILE)?);
        insta::assert_snapshot!("gene_summary", read(crate::report::GENES_FILE)?);

        let fasta = read(crate::report::FASTA_FILE)?;
        let headers = fasta
            .lines()
            .filter(|line| line.starts_with('>'))
            .collect::<Vec<_>>();
        assert_eq!(
            headers,
            vec![
                ">TRINITY_DN100_c0_g1_i1 len=1300 path=[0:0-1299]",
                ">TRINITY_DN200_c0_g1_i1 len=760 path=[0:0-759]",
                ">TRINITY_DN300_c0_g1_i1 len=3200 path=[0:0-3199]",
            ]
        );

        let summary: serde_json::Value = serde_json::from_str(&read(crate::report::SUMMARY_FILE)?)?;
        assert_eq!(summary["entry_stage"], "redundancy_removal");
        assert_eq!(summary["transcripts"], 6);
        assert_eq!(summary["genes"], 3);
        assert_eq!(summary["retained"], 3);
        assert_eq!(summary["quality"]["high"], 2);
        assert_eq!(summary["quality"]["medium"], 1);
        assert_eq!(summary["discarded"]["gene_cap"], 2);
        assert_eq!(summary["discarded"]["invalid_identifier"], 1);
        assert_eq!(summary["invalid_identifiers"][0]["transcript_id"], "BADID");
        assert_eq!(summary["exported_sequences"], 3);
        assert_eq!(summary["scoring"]["weight_profile"], "full");
        assert_eq!(summary["scoring"]["max_orf_length_nt"], 3000);
        assert_eq!(summary["parse"]["ortholog"]["skipped"], 1);
        assert_eq!(summary["busco"]["after"]["complete"], 235);
        assert_eq!(summary["stages"][4]["state"], "satisfied");
        assert_eq!(summary["stages"][0]["state"], "skipped");
        assert_eq!(summary["inputs"].as_array().map(Vec::len), Some(4));
        assert!(logs_contain("no command configured for stage `orf_prediction`"));

        Ok(())
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn run_without_ortholog_evidence() -> Result<(), anyhow::Error> {
        let tmp_dir = tempfile::tempdir()?;
        let work_dir = tmp_dir.path().join("work");
        std::fs::create_dir_all(work_dir.join("transdecoder_results"))?;
        std::fs::copy(
            Path::new(WORK_DIR)
                .join("transdecoder_results/cdhit_result.fasta.transdecoder.gff3"),
            work_dir.join("transdecoder_results/assembly.fasta.transdecoder.gff3"),
        )?;
        let args = Args {
            paths: PathArgs {
                work_dir: Some(work_dir.clone()),
                start_from: Some(Stage::Scoring),
                ..Default::default()
            },
            no_fasta: true,
            max_per_gene: Some(0),
            ..Default::default()
        };

        super::run(&common(), &args).await?;

        let output_dir = work_dir.join("scoring");
        let summary: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(
            output_dir.join(crate::report::SUMMARY_FILE),
        )?)?;
        assert_eq!(summary["scoring"]["weight_profile"], "fallback");
        assert_eq!(summary["retained"], 5);
        assert!(summary.get("exported_sequences").is_none());
        assert!(summary["parse"].get("homology").is_none());
        assert!(!output_dir.join(crate::report::FASTA_FILE).exists());

        let scores = std::fs::read_to_string(output_dir.join(crate::report::SCORES_FILE))?;
        let first = scores.lines().nth(1).unwrap_or_default();
        assert!(first.starts_with("TRINITY_DN300_c0_g1_i1\t"));
        assert!(logs_contain("no BUSCO evidence, using fallback weights"));

        Ok(())
    }

    #[tokio::test]
    async fn run_fails_early_without_orf_annotation() -> Result<(), anyhow::Error> {
        let tmp_dir = tempfile::tempdir()?;
        let work_dir = tmp_dir.path().join("work");
        let args = Args {
            paths: PathArgs {
                work_dir: Some(work_dir.clone()),
                ..Default::default()
            },
            ..Default::default()
        };

        let err = super::run(&common(), &args)
            .await
            .expect_err("no ORF annotation present");

        assert!(err.to_string().contains("could not locate the ORF annotation GFF3"));
        assert!(!work_dir.exists());

        Ok(())
    }

    #[rstest::rstest]
    #[case(Artifact::OrfAnnotation, true, true)]
    #[case(Artifact::OrfAnnotation, false, true)]
    #[case(Artifact::ClusteredTranscripts, true, true)]
    #[case(Artifact::ClusteredTranscripts, false, false)]
    #[case(Artifact::HomologyHits, true, false)]
    #[case(Artifact::OrthologTable, true, false)]
    fn required_artifacts(
        #[case] artifact: Artifact,
        #[case] export_fasta: bool,
        #[case] expected: bool,
    ) {
        let mut config = Config::default();
        config.outputs.export_fasta = export_fasta;

        assert_eq!(is_required(&config, artifact), expected);
    }

    #[test]
    fn config_overrides() -> Result<(), anyhow::Error> {
        let args = Args {
            paths: PathArgs {
                path_config: Some("tests/data/config/orpheus.json".into()),
                work_dir: Some("elsewhere".into()),
                path_gff3: Some("orfs.gff3".into()),
                ..Default::default()
            },
            threshold: Some(0.7),
            profile: Some(Profile::Standard),
            no_fasta: false,
            ..Default::default()
        };

        let config = args.config()?;

        assert_eq!(config.work_dir, PathBuf::from("elsewhere"));
        assert_eq!(config.start_from, Stage::HomologySearch);
        assert_eq!(config.scoring.threshold, 0.7);
        assert_eq!(config.scoring.max_per_gene, 2);
        assert_eq!(config.scoring.profile, Profile::Standard);
        assert_eq!(
            config.paths.get(Artifact::OrfAnnotation),
            Some(Path::new("orfs.gff3"))
        );
        assert_eq!(
            config.paths.get(Artifact::OrthologTable),
            Some(Path::new("busco/full_table.tsv"))
        );
        // file value kept as the flag is unset
        assert!(!config.outputs.export_fasta);

        let invalid = Args {
            threshold: Some(2.0),
            ..Default::default()
        };
        assert!(invalid.config().is_err());

        Ok(())
    }

    #[test]
    fn resolve_report() -> Result<(), anyhow::Error> {
        let config = PathArgs {
            work_dir: Some(WORK_DIR.into()),
            path_homology: Some("does/not/exist.outfmt6".into()),
            ..Default::default()
        }
        .load_config()?;

        let report = build_resolve_report(&config, &LocalFs);

        assert_eq!(report.entry_stage, Stage::RedundancyRemoval);
        assert_eq!(report.artifacts.len(), 4);
        assert!(report.unmet().next().is_none());
        for artifact in &report.artifacts {
            let resolved = artifact.resolved.as_ref().expect("all artifacts present");
            assert_eq!(resolved.strategy, Strategy::Default);
            assert!(artifact.produced_by.is_none());
        }
        let homology = &report.artifacts[2];
        assert_eq!(homology.artifact, Artifact::HomologyHits);
        assert!(!homology.required);

        Ok(())
    }

    #[test]
    fn resolve_missing_required() {
        let args = ResolveArgs {
            paths: PathArgs {
                work_dir: Some("tests/data/does-not-exist".into()),
                ..Default::default()
            },
            no_fasta: true,
        };

        let err = super::run_resolve(&common(), &args).expect_err("nothing to find");

        assert!(err.to_string().starts_with("a run would fail: could not locate the ORF"));
    }
}
