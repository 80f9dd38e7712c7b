//! Per-gene summary table.

use std::path::Path;

use crate::score::result::{Quality, TranscriptRecord};
use crate::select::{rank_order, Selection};

const HEADER: [&str; 8] = [
    "gene_id",
    "transcript_count",
    "retained_count",
    "best_transcript",
    "best_score",
    "best_quality",
    "busco_status",
    "busco_gene",
];

/// Summary of the transcripts of one gene.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct GeneSummary {
    pub gene_id: String,
    pub transcript_count: usize,
    pub retained_count: usize,
    pub best_transcript: String,
    pub best_score: String,
    pub best_quality: Quality,
    /// BUSCO status of the best transcript.
    pub busco_status: &'static str,
    /// BUSCO identifier of the best transcript.
    pub busco_gene: String,
}

/// Summarize the genes of `selection`, best genes first.
pub fn summarize(selection: &Selection) -> Vec<GeneSummary> {
    let mut best = rustc_hash::FxHashMap::<&str, &TranscriptRecord>::default();
    let mut counts = rustc_hash::FxHashMap::<&str, (usize, usize)>::default();
    let all = selection
        .retained
        .iter()
        .map(|record| (record, true))
        .chain(selection.discarded.iter().map(|d| (&d.record, false)));
    for (record, retained) in all {
        let gene_id = record.gene_id.as_str();
        let entry = counts.entry(gene_id).or_default();
        entry.0 += 1;
        if retained {
            entry.1 += 1;
        }
        best.entry(gene_id)
            .and_modify(|current| {
                if rank_order(record, current).is_lt() {
                    *current = record;
                }
            })
            .or_insert(record);
    }

    let mut best = best.into_values().collect::<Vec<_>>();
    best.sort_by(|a, b| rank_order(a, b));
    best.into_iter()
        .map(|record| {
            let (transcript_count, retained_count) = counts
                .get(record.gene_id.as_str())
                .copied()
                .unwrap_or_default();
            GeneSummary {
                gene_id: record.gene_id.clone(),
                transcript_count,
                retained_count,
                best_transcript: record.transcript_id.clone(),
                best_score: super::format_score(record.scores.total),
                best_quality: record.quality,
                busco_status: record.busco_status_token(),
                busco_gene: record.busco_gene().to_string(),
            }
        })
        .collect()
}

/// Write the per-gene table.
///
/// # Errors
///
/// If anything goes wrong, it returns a generic `anyhow::Error`.
pub fn write_file<P>(path: P, genes: &[GeneSummary]) -> Result<(), anyhow::Error>
where
    P: AsRef<Path>,
{
    let mut writer = super::tsv_writer(path.as_ref(), &HEADER)?;
    for gene in genes {
        writer
            .serialize(gene)
            .map_err(|e| anyhow::anyhow!("problem writing gene {}: {}", gene.gene_id, e))?;
    }
    writer
        .flush()
        .map_err(|e| anyhow::anyhow!("problem flushing {}: {}", path.as_ref().display(), e))?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::{summarize, write_file};
    use crate::data::ortholog::BuscoStatus;
    use crate::report::test::record;
    use crate::select::select;

    #[test]
    fn summarize_and_write() -> Result<(), anyhow::Error> {
        let selection = select(
            vec![
                record("G2_i1", "G2", 0.4, None),
                record("G1_i2", "G1", 0.6, None),
                record("G1_i1", "G1", 0.9, Some(("EOG9", BuscoStatus::Complete))),
                record("G1_i3", "G1", 0.1, None),
            ],
            0.5,
            2,
        );

        let genes = summarize(&selection);
        assert_eq!(genes.len(), 2);
        assert_eq!(genes[0].gene_id, "G1");
        assert_eq!(genes[0].transcript_count, 3);
        assert_eq!(genes[0].retained_count, 2);
        assert_eq!(genes[0].best_transcript, "G1_i1");

        let tmp_dir = tempfile::tempdir()?;
        let path = tmp_dir.path().join("genes.tsv");
        write_file(&path, &genes)?;
        assert_eq!(
            std::fs::read_to_string(&path)?,
            "gene_id\ttranscript_count\tretained_count\tbest_transcript\tbest_score\t\
             best_quality\tbusco_status\tbusco_gene\n\
             G1\t3\t2\tG1_i1\t0.9000\thigh\tcomplete\tEOG9\n\
             G2\t1\t1\tG2_i1\t0.4000\tlow\t\t\n"
        );

        Ok(())
    }
}
