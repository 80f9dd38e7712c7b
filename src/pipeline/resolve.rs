//! Locating intermediate artifacts.
//!
//! An artifact is taken from (1) an explicit path, (2) the path recorded by
//! its producing stage if that stage ran in this process, or (3) the first of
//! its conventional locations below the work directory.

use std::path::{Path, PathBuf};

use crate::error::{Attempt, MissingArtifactError};

use super::context::RunContext;
use super::stage::{Artifact, SearchSpec, StageState};

/// Strategy used for locating an artifact.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Deserialize, serde::Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Path from the command line or configuration.
    Explicit,
    /// Path recorded by the producing stage in this process.
    Recorded,
    /// Conventional location below the work directory.
    Default,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Strategy::Explicit => "explicit path",
            Strategy::Recorded => "recorded by earlier stage",
            Strategy::Default => "default location",
        })
    }
}

/// Read-only view of the file system used during resolution.
pub trait Probe {
    /// Whether `path` is an existing regular file.
    fn is_file(&self, path: &Path) -> bool;
    /// Whether `path` is an existing directory.
    fn is_dir(&self, path: &Path) -> bool;
    /// Entries of the directory `path`, sorted by path; empty if unreadable.
    fn list_dir(&self, path: &Path) -> Vec<PathBuf>;
}

/// The local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl Probe for LocalFs {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list_dir(&self, path: &Path) -> Vec<PathBuf> {
        let mut entries = match std::fs::read_dir(path) {
            Ok(read_dir) => read_dir
                .filter_map(|entry| entry.ok().map(|entry| entry.path()))
                .collect::<Vec<_>>(),
            Err(e) => {
                tracing::debug!("cannot list {}: {}", path.display(), e);
                Vec::new()
            }
        };
        entries.sort();
        entries
    }
}

/// A located artifact.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Resolved {
    /// The artifact.
    pub artifact: Artifact,
    /// Where it was found.
    pub path: PathBuf,
    /// How it was found.
    pub strategy: Strategy,
}

/// Locate a required artifact.
///
/// # Arguments
///
/// * `ctx` - The run context.
/// * `artifact` - The artifact to locate.
/// * `probe` - File system view.
///
/// # Errors
///
/// A `MissingArtifactError` listing every attempted strategy if the artifact
/// cannot be found.
pub fn resolve<P: Probe>(
    ctx: &RunContext,
    artifact: Artifact,
    probe: &P,
) -> Result<Resolved, MissingArtifactError> {
    let mut attempts = Vec::new();

    match ctx.explicit(artifact) {
        Some(path) if probe.is_file(path) => {
            return Ok(found(artifact, path, Strategy::Explicit));
        }
        Some(path) => {
            tracing::warn!(
                "explicit path {} for the {} does not exist, trying other locations",
                path.display(),
                artifact
            );
            attempts.push(Attempt {
                strategy: Strategy::Explicit,
                detail: format!("{} does not exist", path.display()),
            });
        }
        None => attempts.push(Attempt {
            strategy: Strategy::Explicit,
            detail: "none given".into(),
        }),
    }

    let producer = artifact.producer();
    match (ctx.plan().state(producer), ctx.recorded(artifact)) {
        (StageState::Satisfied, Some(path)) if probe.is_file(path) => {
            return Ok(found(artifact, path, Strategy::Recorded));
        }
        (StageState::Satisfied, Some(path)) => attempts.push(Attempt {
            strategy: Strategy::Recorded,
            detail: format!(
                "stage `{}` recorded {}, which no longer exists",
                producer,
                path.display()
            ),
        }),
        (StageState::Satisfied, None) => attempts.push(Attempt {
            strategy: Strategy::Recorded,
            detail: format!("stage `{}` recorded no output", producer),
        }),
        (state, _) => attempts.push(Attempt {
            strategy: Strategy::Recorded,
            detail: format!(
                "stage `{}` did not run in this process ({})",
                producer, state
            ),
        }),
    }

    for spec in artifact.default_locations() {
        let root = spec.root_in(ctx.work_dir());
        match walk(probe, &root, &spec, spec.max_depth) {
            Some(path) => {
                if spec.intermediate {
                    tracing::warn!(
                        "using intermediate file {} as the {}; the final output of stage `{}` \
                         was not found",
                        path.display(),
                        artifact,
                        producer
                    );
                }
                return Ok(found(artifact, &path, Strategy::Default));
            }
            None => attempts.push(Attempt {
                strategy: Strategy::Default,
                detail: describe_search(&spec, &root),
            }),
        }
    }

    Err(MissingArtifactError { artifact, attempts })
}

/// Locate an optional artifact, returning `None` if it cannot be found.
pub fn resolve_optional<P: Probe>(
    ctx: &RunContext,
    artifact: Artifact,
    probe: &P,
) -> Option<Resolved> {
    match resolve(ctx, artifact, probe) {
        Ok(resolved) => Some(resolved),
        Err(e) => {
            tracing::info!("continuing without the {}: {}", artifact, e);
            None
        }
    }
}

/// Search the single location `spec` below `work_dir`.
pub fn find_at<P: Probe>(work_dir: &Path, spec: &SearchSpec, probe: &P) -> Option<PathBuf> {
    walk(probe, &spec.root_in(work_dir), spec, spec.max_depth)
}

fn found(artifact: Artifact, path: &Path, strategy: Strategy) -> Resolved {
    tracing::debug!("{} resolved to {} ({})", artifact, path.display(), strategy);
    Resolved {
        artifact,
        path: path.to_path_buf(),
        strategy,
    }
}

fn describe_search(spec: &SearchSpec, root: &Path) -> String {
    match spec.max_depth {
        Some(0) => format!("no {} in {}", spec.matcher, root.display()),
        Some(depth) => format!(
            "no {} in {} or up to {} level(s) below",
            spec.matcher,
            root.display(),
            depth
        ),
        None => format!("no {} anywhere below {}", spec.matcher, root.display()),
    }
}

/// Sorted depth-first walk; files of a directory are checked before its
/// subdirectories.
fn walk<P: Probe>(
    probe: &P,
    dir: &Path,
    spec: &SearchSpec,
    depth_left: Option<usize>,
) -> Option<PathBuf> {
    if !probe.is_dir(dir) {
        return None;
    }
    let entries = probe.list_dir(dir);
    let hit = entries.iter().find(|entry| {
        probe.is_file(entry)
            && entry
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| spec.matcher.matches(name))
    });
    if let Some(hit) = hit {
        return Some(hit.clone());
    }

    let next = match depth_left {
        Some(0) => return None,
        Some(depth) => Some(depth - 1),
        None => None,
    };
    entries
        .iter()
        .filter(|entry| probe.is_dir(entry))
        .find_map(|entry| walk(probe, entry, spec, next))
}

#[cfg(test)]
pub(crate) mod test {
    use std::collections::BTreeSet;
    use std::path::{Path, PathBuf};

    use super::{find_at, resolve, resolve_optional, Probe, Strategy};
    use crate::pipeline::context::RunContext;
    use crate::pipeline::stage::{Artifact, Stage};

    /// In-memory file system holding a set of files.
    #[derive(Debug, Default)]
    pub struct FakeFs {
        files: BTreeSet<PathBuf>,
    }

    impl FakeFs {
        pub fn new(files: &[&str]) -> Self {
            Self {
                files: files.iter().map(PathBuf::from).collect(),
            }
        }
    }

    impl Probe for FakeFs {
        fn is_file(&self, path: &Path) -> bool {
            self.files.contains(path)
        }

        fn is_dir(&self, path: &Path) -> bool {
            self.files
                .iter()
                .any(|file| file != path && file.starts_with(path))
        }

        fn list_dir(&self, path: &Path) -> Vec<PathBuf> {
            self.files
                .iter()
                .filter_map(|file| {
                    let rest = file.strip_prefix(path).ok()?;
                    let first = rest.components().next()?;
                    Some(path.join(first))
                })
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        }
    }

    #[test]
    fn explicit_wins() -> Result<(), anyhow::Error> {
        let fs = FakeFs::new(&[
            "/data/my.gff3",
            "/work/transdecoder_results/a.transdecoder.gff3",
        ]);
        let ctx = RunContext::new("/work", Stage::Scoring)
            .with_explicit(Artifact::OrfAnnotation, "/data/my.gff3".into());

        let resolved = resolve(&ctx, Artifact::OrfAnnotation, &fs)?;

        assert_eq!(resolved.path, PathBuf::from("/data/my.gff3"));
        assert_eq!(resolved.strategy, Strategy::Explicit);

        Ok(())
    }

    #[tracing_test::traced_test]
    #[test]
    fn explicit_missing_falls_through() -> Result<(), anyhow::Error> {
        let fs = FakeFs::new(&["/work/transdecoder_results/a.transdecoder.gff3"]);
        let ctx = RunContext::new("/work", Stage::Scoring)
            .with_explicit(Artifact::OrfAnnotation, "/data/typo.gff3".into());

        let resolved = resolve(&ctx, Artifact::OrfAnnotation, &fs)?;

        assert_eq!(
            resolved.path,
            PathBuf::from("/work/transdecoder_results/a.transdecoder.gff3")
        );
        assert_eq!(resolved.strategy, Strategy::Default);
        assert!(logs_contain("/data/typo.gff3 for the ORF annotation GFF3 does not exist"));

        Ok(())
    }

    #[test]
    fn recorded_requires_satisfied_producer() -> Result<(), anyhow::Error> {
        let fs = FakeFs::new(&[
            "/tmp/run/out.gff3",
            "/work/transdecoder_results/a.transdecoder.gff3",
        ]);
        let ctx = RunContext::new("/work", Stage::OrfPrediction);

        // before the stage ran, the conventional location is used
        let resolved = resolve(&ctx, Artifact::OrfAnnotation, &fs)?;
        assert_eq!(resolved.strategy, Strategy::Default);

        let ctx = ctx.complete(
            Stage::OrfPrediction,
            Artifact::OrfAnnotation,
            "/tmp/run/out.gff3".into(),
        )?;
        let resolved = resolve(&ctx, Artifact::OrfAnnotation, &fs)?;
        assert_eq!(resolved.path, PathBuf::from("/tmp/run/out.gff3"));
        assert_eq!(resolved.strategy, Strategy::Recorded);

        Ok(())
    }

    #[tracing_test::traced_test]
    #[test]
    fn orf_annotation_falls_back_to_longest_orfs() -> Result<(), anyhow::Error> {
        let fs = FakeFs::new(&[
            "/work/transdecoder_results/x.fasta.transdecoder_dir/longest_orfs.gff3",
            "/work/transdecoder_results/x.fasta.transdecoder_dir/longest_orfs.pep",
        ]);
        let ctx = RunContext::new("/work", Stage::Scoring);

        let resolved = resolve(&ctx, Artifact::OrfAnnotation, &fs)?;

        assert_eq!(
            resolved.path,
            PathBuf::from("/work/transdecoder_results/x.fasta.transdecoder_dir/longest_orfs.gff3")
        );
        assert!(logs_contain("using intermediate file"));

        Ok(())
    }

    #[test]
    fn final_gff3_is_not_searched_recursively() {
        let fs = FakeFs::new(&["/work/transdecoder_results/nested/a.transdecoder.gff3"]);
        let ctx = RunContext::new("/work", Stage::Scoring);

        assert!(resolve(&ctx, Artifact::OrfAnnotation, &fs).is_err());
    }

    #[test]
    fn homology_hits_found_recursively() -> Result<(), anyhow::Error> {
        let fs = FakeFs::new(&[
            "/work/blastp_results.outfmt6",
            "/work/transdecoder_results/x.transdecoder_dir/blastp_results.outfmt6",
        ]);
        let ctx = RunContext::new("/work", Stage::Scoring);

        let resolved = resolve(&ctx, Artifact::HomologyHits, &fs)?;

        assert_eq!(
            resolved.path,
            PathBuf::from("/work/transdecoder_results/x.transdecoder_dir/blastp_results.outfmt6")
        );

        Ok(())
    }

    #[rstest::rstest]
    #[case(
        &[
            "/work/busco_before/run_b/run_euk/full_table.tsv",
            "/work/busco_after/run_a/run_euk/full_table.tsv",
        ],
        "/work/busco_after/run_a/run_euk/full_table.tsv"
    )]
    #[case(
        &["/work/busco_before/run_b/run_euk/full_table.tsv"],
        "/work/busco_before/run_b/run_euk/full_table.tsv"
    )]
    #[case(
        &[
            "/work/busco_after/run_b/full_table.tsv",
            "/work/busco_after/run_a/full_table.tsv",
        ],
        "/work/busco_after/run_a/full_table.tsv"
    )]
    fn ortholog_table_priority(#[case] files: &[&str], #[case] expected: &str) {
        let fs = FakeFs::new(files);
        let ctx = RunContext::new("/work", Stage::Scoring);

        let resolved = resolve_optional(&ctx, Artifact::OrthologTable, &fs);

        assert_eq!(resolved.map(|r| r.path), Some(PathBuf::from(expected)));
    }

    #[test]
    fn optional_absent() {
        let fs = FakeFs::new(&["/work/cdhit_result.fasta"]);
        let ctx = RunContext::new("/work", Stage::Scoring);

        assert_eq!(resolve_optional(&ctx, Artifact::HomologyHits, &fs), None);
        assert_eq!(resolve_optional(&ctx, Artifact::OrthologTable, &fs), None);
        assert_eq!(
            find_at(
                Path::new("/work"),
                &Artifact::ClusteredTranscripts.default_locations()[0],
                &fs,
            ),
            Some(PathBuf::from("/work/cdhit_result.fasta"))
        );
    }

    #[test]
    fn missing_orf_annotation() {
        let fs = FakeFs::new(&["/work/cdhit_result.fasta"]);
        let ctx = RunContext::new("/work", Stage::Scoring);

        let err = resolve(&ctx, Artifact::OrfAnnotation, &fs).unwrap_err();

        assert_eq!(err.attempts.len(), 4);
        insta::assert_snapshot!(err.to_string());
    }
}
