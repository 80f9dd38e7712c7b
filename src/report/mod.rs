//! Writing the result tables.

use std::path::Path;

use crate::data::orf::OrfType;
use crate::score::evidence::InvalidTranscript;
use crate::score::result::{Quality, TranscriptRecord};
use crate::select::{DiscardReason, Discarded};

pub mod fasta;
pub mod genes;
pub mod summary;

/// File name of the retained transcript table.
pub const SCORES_FILE: &str = "transcript_scores.tsv";
/// File name of the discarded transcript table.
pub const DISCARDED_FILE: &str = "discarded_transcripts.tsv";
/// File name of the per-gene table.
pub const GENES_FILE: &str = "gene_summary.tsv";
/// File name of the high-confidence sequences.
pub const FASTA_FILE: &str = "high_confidence_transcripts.fasta";
/// File name of the JSON run summary.
pub const SUMMARY_FILE: &str = "run_summary.json";

const SCORES_HEADER: [&str; 9] = [
    "transcript_id",
    "gene_id",
    "orf_type",
    "orf_length",
    "homology",
    "busco_gene",
    "busco_status",
    "score",
    "quality",
];

const DISCARDED_HEADER: [&str; 7] = [
    "transcript_id",
    "gene_id",
    "orf_type",
    "orf_length",
    "score",
    "quality",
    "reason",
];

/// Row of the retained transcript table.
#[derive(Debug, serde::Serialize)]
struct ScoreRow<'a> {
    transcript_id: &'a str,
    gene_id: &'a str,
    orf_type: OrfType,
    orf_length: u64,
    homology: &'static str,
    busco_gene: &'a str,
    busco_status: &'static str,
    score: String,
    quality: Quality,
}

impl<'a> From<&'a TranscriptRecord> for ScoreRow<'a> {
    fn from(record: &'a TranscriptRecord) -> Self {
        Self {
            transcript_id: &record.transcript_id,
            gene_id: &record.gene_id,
            orf_type: record.orf_type,
            orf_length: record.orf_length,
            homology: if record.has_homology { "yes" } else { "no" },
            busco_gene: record.busco_gene(),
            busco_status: record.busco_status_token(),
            score: format_score(record.scores.total),
            quality: record.quality,
        }
    }
}

/// Row of the discarded transcript table; invalid identifiers have no score.
#[derive(Debug, serde::Serialize)]
struct DiscardedRow<'a> {
    transcript_id: &'a str,
    gene_id: Option<&'a str>,
    orf_type: OrfType,
    orf_length: u64,
    score: Option<String>,
    quality: Option<Quality>,
    reason: DiscardReason,
}

/// Scores are written with four decimals.
pub fn format_score(total: f64) -> String {
    format!("{:.4}", total)
}

/// Open a tab-separated writer at `path` and write `header`.
pub(crate) fn tsv_writer<P: AsRef<Path>>(
    path: P,
    header: &[&str],
) -> Result<csv::Writer<std::fs::File>, anyhow::Error> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_path(path.as_ref())
        .map_err(|e| anyhow::anyhow!("problem creating {}: {}", path.as_ref().display(), e))?;
    writer
        .write_record(header)
        .map_err(|e| anyhow::anyhow!("problem writing header: {}", e))?;
    Ok(writer)
}

/// Write the retained transcripts, in the given order.
///
/// # Errors
///
/// If anything goes wrong, it returns a generic `anyhow::Error`.
pub fn write_scores<P>(path: P, retained: &[TranscriptRecord]) -> Result<(), anyhow::Error>
where
    P: AsRef<Path>,
{
    let mut writer = tsv_writer(path.as_ref(), &SCORES_HEADER)?;
    for record in retained {
        writer
            .serialize(ScoreRow::from(record))
            .map_err(|e| anyhow::anyhow!("problem writing {}: {}", record.transcript_id, e))?;
    }
    writer
        .flush()
        .map_err(|e| anyhow::anyhow!("problem flushing {}: {}", path.as_ref().display(), e))?;
    tracing::info!(
        "wrote {} transcripts to {}",
        retained.len(),
        path.as_ref().display()
    );
    Ok(())
}

/// Write the transcripts removed by the gene cap followed by those with
/// invalid identifiers.
///
/// # Errors
///
/// If anything goes wrong, it returns a generic `anyhow::Error`.
pub fn write_discarded<P>(
    path: P,
    discarded: &[Discarded],
    invalid: &[InvalidTranscript],
) -> Result<(), anyhow::Error>
where
    P: AsRef<Path>,
{
    let capped = discarded.iter().map(|d| DiscardedRow {
        transcript_id: &d.record.transcript_id,
        gene_id: Some(&d.record.gene_id),
        orf_type: d.record.orf_type,
        orf_length: d.record.orf_length,
        score: Some(format_score(d.record.scores.total)),
        quality: Some(d.record.quality),
        reason: d.reason,
    });
    let invalid = invalid.iter().map(|t| DiscardedRow {
        transcript_id: &t.orf.transcript_id,
        gene_id: None,
        orf_type: t.orf.orf_type,
        orf_length: t.orf.orf_length,
        score: None,
        quality: None,
        reason: DiscardReason::InvalidIdentifier,
    });

    let mut writer = tsv_writer(path.as_ref(), &DISCARDED_HEADER)?;
    for row in capped.chain(invalid) {
        writer
            .serialize(&row)
            .map_err(|e| anyhow::anyhow!("problem writing {}: {}", row.transcript_id, e))?;
    }
    writer
        .flush()
        .map_err(|e| anyhow::anyhow!("problem flushing {}: {}", path.as_ref().display(), e))?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod test {
    use crate::data::orf::{OrfRecord, OrfType};
    use crate::data::ortholog::{BuscoStatus, OrthologHit};
    use crate::error::InvalidIdentifierError;
    use crate::score::evidence::InvalidTranscript;
    use crate::score::result::{Quality, SubScores, TranscriptRecord};
    use crate::select::{DiscardReason, Discarded};

    pub fn record(
        transcript_id: &str,
        gene_id: &str,
        total: f64,
        busco: Option<(&str, BuscoStatus)>,
    ) -> TranscriptRecord {
        TranscriptRecord {
            transcript_id: transcript_id.to_string(),
            gene_id: gene_id.to_string(),
            orf_type: OrfType::FivePrimePartial,
            orf_length: 750,
            has_homology: busco.is_some(),
            busco: busco.map(|(busco_id, status)| OrthologHit {
                busco_id: busco_id.to_string(),
                status,
                score: None,
            }),
            scores: SubScores {
                completeness: 0.6,
                homology: 0.0,
                length: 0.25,
                busco: 0.0,
                total,
            },
            quality: Quality::from_score(total),
        }
    }

    #[test]
    fn write_scores() -> Result<(), anyhow::Error> {
        let tmp_dir = tempfile::tempdir()?;
        let path = tmp_dir.path().join(super::SCORES_FILE);

        super::write_scores(
            &path,
            &[
                record("G1_i1", "G1", 0.81234, Some(("EOG7", BuscoStatus::Duplicated))),
                record("G2_i1", "G2", 0.2, None),
            ],
        )?;

        assert_eq!(
            std::fs::read_to_string(&path)?,
            "transcript_id\tgene_id\torf_type\torf_length\thomology\tbusco_gene\tbusco_status\tscore\tquality\n\
             G1_i1\tG1\t5prime_partial\t750\tyes\tEOG7\tduplicated\t0.8123\thigh\n\
             G2_i1\tG2\t5prime_partial\t750\tno\t\t\t0.2000\tlow\n"
        );

        Ok(())
    }

    #[test]
    fn write_empty_scores() -> Result<(), anyhow::Error> {
        let tmp_dir = tempfile::tempdir()?;
        let path = tmp_dir.path().join(super::SCORES_FILE);

        super::write_scores(&path, &[])?;

        assert_eq!(
            std::fs::read_to_string(&path)?,
            "transcript_id\tgene_id\torf_type\torf_length\thomology\tbusco_gene\tbusco_status\tscore\tquality\n"
        );

        Ok(())
    }

    #[test]
    fn write_discarded() -> Result<(), anyhow::Error> {
        let tmp_dir = tempfile::tempdir()?;
        let path = tmp_dir.path().join(super::DISCARDED_FILE);

        super::write_discarded(
            &path,
            &[Discarded {
                record: record("G1_i2", "G1", 0.35, None),
                reason: DiscardReason::GeneCap,
            }],
            &[InvalidTranscript {
                orf: OrfRecord {
                    transcript_id: "BADID".into(),
                    orf_id: "BADID.p1".into(),
                    orf_type: OrfType::Complete,
                    orf_length: 900,
                },
                error: InvalidIdentifierError {
                    transcript_id: "BADID".into(),
                    separator: '_',
                },
            }],
        )?;

        assert_eq!(
            std::fs::read_to_string(&path)?,
            "transcript_id\tgene_id\torf_type\torf_length\tscore\tquality\treason\n\
             G1_i2\tG1\t5prime_partial\t750\t0.3500\tlow\tgene_cap\n\
             BADID\t\tcomplete\t900\t\t\tinvalid_identifier\n"
        );

        Ok(())
    }
}
