//! BUSCO short summaries (`short_summary*.txt`).

use std::path::Path;

use crate::pipeline::resolve::{self, Probe};
use crate::pipeline::stage::{FileMatcher, SearchSpec};

/// BUSCO counts of one assessment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct Summary {
    /// Complete BUSCOs (single-copy and duplicated).
    pub complete: u32,
    /// Complete and single-copy BUSCOs.
    pub single_copy: u32,
    /// Complete and duplicated BUSCOs.
    pub duplicated: u32,
    /// Fragmented BUSCOs.
    pub fragmented: u32,
    /// Missing BUSCOs.
    pub missing: u32,
    /// BUSCO groups searched.
    pub total: u32,
}

impl Summary {
    /// Percentage of `count` among all searched groups.
    pub fn percent(&self, count: u32) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            100.0 * f64::from(count) / f64::from(self.total)
        }
    }

    /// The summary in BUSCO's one-line notation.
    pub fn notation(&self) -> String {
        format!(
            "C:{:.1}%[S:{:.1}%,D:{:.1}%],F:{:.1}%,M:{:.1}%,n:{}",
            self.percent(self.complete),
            self.percent(self.single_copy),
            self.percent(self.duplicated),
            self.percent(self.fragmented),
            self.percent(self.missing),
            self.total
        )
    }
}

/// BUSCO summaries of the assessments before and after redundancy removal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct Assessments {
    /// Assessment of the raw assembly.
    pub before: Option<Summary>,
    /// Assessment of the clustered transcripts.
    pub after: Option<Summary>,
}

/// Parse the text of a short summary.
///
/// The verbose count lines are preferred; the one-line notation is used if
/// they are absent, converting percentages back to counts.
pub fn parse_str(text: &str) -> Option<Summary> {
    parse_counts(text).or_else(|| {
        text.lines()
            .map(str::trim)
            .find(|line| line.starts_with("C:") && line.contains("n:"))
            .and_then(parse_notation)
    })
}

fn parse_counts(text: &str) -> Option<Summary> {
    let mut summary = Summary::default();
    let (mut seen_complete, mut seen_total) = (false, false);
    for line in text.lines() {
        let Some((count, label)) = line.trim().split_once(char::is_whitespace) else {
            continue;
        };
        let Ok(count) = count.parse::<u32>() else {
            continue;
        };
        let label = label.trim();
        if label.starts_with("Complete BUSCOs") {
            summary.complete = count;
            seen_complete = true;
        } else if label.starts_with("Complete and single-copy") {
            summary.single_copy = count;
        } else if label.starts_with("Complete and duplicated") {
            summary.duplicated = count;
        } else if label.starts_with("Fragmented") {
            summary.fragmented = count;
        } else if label.starts_with("Missing") {
            summary.missing = count;
        } else if label.starts_with("Total BUSCO groups") {
            summary.total = count;
            seen_total = true;
        }
    }
    (seen_complete && seen_total).then_some(summary)
}

fn parse_notation(line: &str) -> Option<Summary> {
    let total = value_after(line, "n:")?;
    let count = |key: &str| -> Option<u32> {
        let pct = value_after(line, key)?;
        Some((pct / 100.0 * total).round() as u32)
    };
    Some(Summary {
        complete: count("C:")?,
        single_copy: count("S:")?,
        duplicated: count("D:")?,
        fragmented: count("F:")?,
        missing: count("M:")?,
        total: total as u32,
    })
}

/// The number directly following `key` in `line`.
fn value_after(line: &str, key: &str) -> Option<f64> {
    let pos = line.find(key)?;
    let rest = &line[pos + key.len()..];
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}

/// Load a short summary file.
///
/// # Errors
///
/// If the file cannot be read or contains no BUSCO counts.
pub fn load_file<P>(path: P) -> Result<Summary, anyhow::Error>
where
    P: AsRef<Path>,
{
    let text = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        anyhow::anyhow!("problem reading {}: {}", path.as_ref().display(), e)
    })?;
    parse_str(&text).ok_or_else(|| {
        anyhow::anyhow!("no BUSCO counts found in {}", path.as_ref().display())
    })
}

/// Conventional location of the short summary below the BUSCO output `dir`.
fn summary_location(dir: &'static str) -> SearchSpec {
    SearchSpec {
        root: dir,
        matcher: FileMatcher::PrefixSuffix("short_summary", ".txt"),
        max_depth: None,
        intermediate: false,
    }
}

/// Read the `busco_before` and `busco_after` summaries below `work_dir` and
/// log them, including the before/after comparison if both exist.
pub fn assess<P: Probe>(work_dir: &Path, probe: &P) -> Assessments {
    let read = |name: &'static str| -> Option<Summary> {
        let path = resolve::find_at(work_dir, &summary_location(name), probe)?;
        match load_file(&path) {
            Ok(summary) => {
                tracing::info!("BUSCO {}: {}", name, summary.notation());
                Some(summary)
            }
            Err(e) => {
                tracing::warn!("ignoring BUSCO short summary: {}", e);
                None
            }
        }
    };
    let assessments = Assessments {
        before: read("busco_before"),
        after: read("busco_after"),
    };

    if let (Some(before), Some(after)) = (assessments.before, assessments.after) {
        tracing::info!(
            "BUSCO after redundancy removal: complete {:+.1}%, duplicated {:+.1}%, \
             fragmented {:+.1}%, missing {:+.1}%",
            after.percent(after.complete) - before.percent(before.complete),
            after.percent(after.duplicated) - before.percent(before.duplicated),
            after.percent(after.fragmented) - before.percent(before.fragmented),
            after.percent(after.missing) - before.percent(before.missing),
        );
    }

    assessments
}
