//! Conserved-ortholog status from BUSCO `full_table.tsv` files.

use std::path::Path;

use crate::common::{strip_peptide_suffix, MultiMatchPolicy};

use super::{LineOutcome, ParseStats};

/// BUSCO assessment of one ortholog.
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
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
pub enum BuscoStatus {
    /// Single-copy complete.
    #[strum(serialize = "Complete")]
    Complete,
    /// Complete, but present in several copies.
    #[strum(serialize = "Duplicated")]
    Duplicated,
    /// Partially recovered.
    #[strum(serialize = "Fragmented")]
    Fragmented,
    /// Not found.
    #[strum(serialize = "Missing")]
    Missing,
}

impl BuscoStatus {
    /// Lower-case token used in the reports.
    pub fn token(self) -> &'static str {
        match self {
            BuscoStatus::Complete => "complete",
            BuscoStatus::Duplicated => "duplicated",
            BuscoStatus::Fragmented => "fragmented",
            BuscoStatus::Missing => "missing",
        }
    }

    /// Rank for picking the strongest of several hits; lower is stronger.
    fn rank(self) -> u8 {
        match self {
            BuscoStatus::Complete => 0,
            BuscoStatus::Duplicated => 1,
            BuscoStatus::Fragmented => 2,
            BuscoStatus::Missing => 3,
        }
    }
}

/// One BUSCO match of a transcript.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct OrthologHit {
    /// BUSCO (OrthoDB) identifier.
    pub busco_id: String,
    /// Assessment status.
    pub status: BuscoStatus,
    /// HMM score, if reported.
    pub score: Option<f64>,
}

/// Row of the full table that names a sequence.
#[derive(Debug, Clone, PartialEq)]
struct Row {
    transcript_id: String,
    hit: OrthologHit,
}

/// Where the HMM score sits in the full table.
///
/// BUSCO 5 put gene coordinates and strand between the sequence and the
/// score; BUSCO 3 and 4 transcriptome tables have the score right after
/// the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    score_col: usize,
}

impl Default for Layout {
    fn default() -> Self {
        Self { score_col: 6 }
    }
}

impl Layout {
    /// Update from a comment line: the version line or the column header.
    fn observe(&mut self, cols: &[&str]) {
        let first = cols[0].trim_start_matches('#').trim();
        if let Some(version) = first.strip_prefix("BUSCO version is:") {
            match version.trim().split('.').next().map(str::parse::<u32>) {
                Some(Ok(major)) if major < 5 => self.score_col = 3,
                Some(Ok(_)) => self.score_col = 6,
                _ => tracing::debug!("unrecognized BUSCO version {:?}", version.trim()),
            }
        } else if first == "Busco id" {
            if let Some(idx) = cols.iter().position(|col| col.trim() == "Score") {
                self.score_col = idx;
            }
        }
    }
}

/// Ortholog hits by transcript.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Data {
    /// The hit kept for each transcript.
    hits: rustc_hash::FxHashMap<String, OrthologHit>,
    /// Line tally of the table.
    stats: ParseStats,
}

impl Data {
    /// Load from the given BUSCO full table.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to `full_table.tsv`.
    /// * `policy` - Which hit to keep for transcripts matching several BUSCOs.
    ///
    /// # Errors
    ///
    /// If anything goes wrong, it returns a generic `anyhow::Error`.
    pub fn new<P>(path: P, policy: MultiMatchPolicy) -> Result<Self, anyhow::Error>
    where
        P: AsRef<Path>,
    {
        let mut layout = Layout::default();
        let parsed = super::parse_file(path.as_ref(), |cols| parse_line(cols, &mut layout))?;

        let mut hits = rustc_hash::FxHashMap::<String, OrthologHit>::default();
        let mut n_multi = 0usize;
        for Row { transcript_id, hit } in parsed.records {
            match hits.get_mut(&transcript_id) {
                Some(kept) => {
                    n_multi += 1;
                    if policy == MultiMatchPolicy::Best && is_stronger(&hit, kept) {
                        *kept = hit;
                    }
                }
                None => {
                    hits.insert(transcript_id, hit);
                }
            }
        }
        if n_multi > 0 {
            tracing::info!(
                "{} additional BUSCO matches of already assigned transcripts resolved by policy `{}`",
                n_multi,
                policy
            );
        }
        let data = Self {
            hits,
            stats: parsed.stats,
        };
        tracing::info!(
            "BUSCO status for {} transcripts from {}",
            data.len(),
            path.as_ref().display()
        );

        Ok(data)
    }

    /// The ortholog hit of `transcript_id`, if any.
    pub fn get(&self, transcript_id: &str) -> Option<&OrthologHit> {
        self.hits.get(transcript_id)
    }

    /// Number of transcripts with a hit.
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Whether no transcript has a hit.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn stats(&self) -> ParseStats {
        self.stats
    }
}

fn is_stronger(candidate: &OrthologHit, kept: &OrthologHit) -> bool {
    match candidate.status.rank().cmp(&kept.status.rank()) {
        std::cmp::Ordering::Less => true,
        std::cmp::Ordering::Greater => false,
        std::cmp::Ordering::Equal => {
            candidate.score.unwrap_or(f64::NEG_INFINITY) > kept.score.unwrap_or(f64::NEG_INFINITY)
        }
    }
}

fn parse_line(cols: &[&str], layout: &mut Layout) -> LineOutcome<Row> {
    if cols[0].starts_with('#') {
        layout.observe(cols);
        return LineOutcome::Ignored;
    }
    if cols.iter().all(|col| col.trim().is_empty()) {
        return LineOutcome::Ignored;
    }
    if cols.len() < 2 {
        return LineOutcome::Skipped("expected at least 2 columns".into());
    }
    let status = match cols[1].trim().parse::<BuscoStatus>() {
        Ok(BuscoStatus::Missing) => return LineOutcome::Ignored,
        Ok(status) => status,
        Err(_) => return LineOutcome::Skipped(format!("unknown BUSCO status {:?}", cols[1])),
    };
    let sequence = cols.get(2).map(|s| s.trim()).unwrap_or("-");
    if sequence.is_empty() || sequence == "-" {
        return LineOutcome::Ignored;
    }

    LineOutcome::Record(Row {
        transcript_id: strip_peptide_suffix(strip_coordinates(sequence)).to_string(),
        hit: OrthologHit {
            busco_id: cols[0].trim().to_string(),
            status,
            score: cols
                .get(layout.score_col)
                .and_then(|s| s.trim().parse::<f64>().ok()),
        },
    })
}

/// Strip a `:start-end` coordinate suffix.
fn strip_coordinates(sequence: &str) -> &str {
    match sequence.rsplit_once(':') {
        Some((prefix, range))
            if !prefix.is_empty()
                && range.split_once('-').is_some_and(|(start, end)| {
                    !start.is_empty()
                        && !end.is_empty()
                        && start.bytes().all(|b| b.is_ascii_digit())
                        && end.bytes().all(|b| b.is_ascii_digit())
                }) =>
        {
            prefix
        }
        _ => sequence,
    }
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use super::{parse_line, strip_coordinates, BuscoStatus, Data, Layout, Row};
    use crate::common::MultiMatchPolicy;
    use crate::data::LineOutcome;

    fn parse(line: &str) -> LineOutcome<Row> {
        parse_line(&line.split('\t').collect::<Vec<_>>(), &mut Layout::default())
    }

    const FULL_TABLE: &str = "tests/data/workdir/busco_after/run_orpheus_after/\
                              run_eukaryota_odb10/full_table.tsv";

    #[rstest::rstest]
    #[case("G1_i1:1-400", "G1_i1")]
    #[case("G1_i1.p1", "G1_i1.p1")]
    #[case("chr1:abc-3", "chr1:abc-3")]
    #[case(":1-3", ":1-3")]
    fn coordinates(#[case] sequence: &str, #[case] expected: &str) {
        assert_eq!(strip_coordinates(sequence), expected);
    }

    #[test]
    fn lines() {
        assert_eq!(parse("# Busco id\tStatus"), LineOutcome::Ignored);
        assert_eq!(parse("EOG1\tMissing"), LineOutcome::Ignored);
        assert_eq!(parse("EOG1\tComplete\t-"), LineOutcome::Ignored);
        assert!(matches!(
            parse("EOG1\tcomplete\tG1_i1.p1"),
            LineOutcome::Skipped(_)
        ));
        match parse("EOG1\tDuplicated\tG1_i1.p2:3-900\t3\t900\t+\t55.5\t299") {
            LineOutcome::Record(row) => {
                assert_eq!(row.transcript_id, "G1_i1");
                assert_eq!(row.hit.busco_id, "EOG1");
                assert_eq!(row.hit.status, BuscoStatus::Duplicated);
                assert_eq!(row.hit.score, Some(55.5));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    const V4_TABLE: &str = "\
# BUSCO version is: 4.1.4
# Busco id\tStatus\tSequence\tScore\tLength\tOrthoDB url\tDescription
EOG1\tComplete\tG1_i1.p1\t512.7\t400\thttps://www.orthodb.org/v10?query=EOG1\tNop58
";

    const V5_TABLE: &str = "\
# BUSCO version is: 5.4.3
# Busco id\tStatus\tSequence\tGene Start\tGene End\tStrand\tScore\tLength
EOG1\tComplete\tG1_i1.p1\t51\t1250\t+\t812.3\t400
";

    const V4_NO_HEADER: &str = "\
# BUSCO version is: 4.0.6
EOG1\tComplete\tG1_i1.p1\t99.5\t400
";

    #[rstest::rstest]
    #[case(V4_TABLE, 512.7)]
    #[case(V5_TABLE, 812.3)]
    #[case(V4_NO_HEADER, 99.5)]
    fn score_column_follows_version(
        #[case] table: &str,
        #[case] score: f64,
    ) -> Result<(), anyhow::Error> {
        let mut layout = Layout::default();
        let parsed =
            crate::data::parse_reader(table.as_bytes(), Path::new("full_table.tsv"), |cols| {
                parse_line(cols, &mut layout)
            })?;

        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].transcript_id, "G1_i1");
        assert_eq!(parsed.records[0].hit.score, Some(score));

        Ok(())
    }

    #[rstest::rstest]
    #[case(MultiMatchPolicy::First, "EOG002")]
    #[case(MultiMatchPolicy::Best, "EOG005")]
    fn load_fixture(
        #[case] policy: MultiMatchPolicy,
        #[case] dn200_busco: &str,
    ) -> Result<(), anyhow::Error> {
        let data = Data::new(FULL_TABLE, policy)?;

        assert_eq!(data.len(), 4);
        assert_eq!(
            data.get("TRINITY_DN200_c0_g1_i1").map(|hit| hit.busco_id.as_str()),
            Some(dn200_busco)
        );
        assert_eq!(
            data.get("TRINITY_DN300_c0_g1_i1").map(|hit| hit.status),
            Some(BuscoStatus::Duplicated)
        );
        assert_eq!(data.get("TRINITY_DN100_c0_g1_i2"), None);
        assert_eq!(data.stats().records, 5);
        assert_eq!(data.stats().ignored, 5);
        assert_eq!(data.stats().skipped, 1);

        Ok(())
    }
}
