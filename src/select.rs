//! Per-gene selection of representative transcripts.

use std::cmp::Ordering;

use itertools::Itertools as _;

use crate::score::result::{Quality, TranscriptRecord};

/// Why a transcript is not in the retained set.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DiscardReason {
    /// Ranked below the per-gene cap.
    GeneCap,
    /// The identifier yields no gene.
    InvalidIdentifier,
}

/// A transcript that was not retained.
#[derive(Debug, Clone, PartialEq)]
pub struct Discarded {
    pub record: TranscriptRecord,
    pub reason: DiscardReason,
}

/// Outcome of the selection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selection {
    /// Retained transcripts in global rank order.
    pub retained: Vec<TranscriptRecord>,
    /// Transcripts beyond the per-gene cap, in global rank order.
    pub discarded: Vec<Discarded>,
}

/// Rank order: score descending, then ORF length descending, then
/// transcript identifier ascending.
pub fn rank_order(a: &TranscriptRecord, b: &TranscriptRecord) -> Ordering {
    b.scores
        .total
        .total_cmp(&a.scores.total)
        .then_with(|| b.orf_length.cmp(&a.orf_length))
        .then_with(|| a.transcript_id.cmp(&b.transcript_id))
}

/// Keep the best `max_per_gene` transcripts of each gene.
///
/// # Arguments
///
/// * `records` - Scored transcripts, in any order.
/// * `threshold` - Score below which the quality is forced to `low`.
/// * `max_per_gene` - Per-gene cap; `0` keeps all transcripts.
pub fn select(records: Vec<TranscriptRecord>, threshold: f64, max_per_gene: usize) -> Selection {
    let mut records = records;
    records.sort_by(|a, b| {
        a.gene_id
            .cmp(&b.gene_id)
            .then_with(|| rank_order(a, b))
    });

    let mut selection = Selection::default();
    let mut n_genes = 0usize;
    for (_, group) in &records.into_iter().chunk_by(|record| record.gene_id.clone()) {
        n_genes += 1;
        for (rank, mut record) in group.enumerate() {
            record.quality = Quality::with_threshold(record.scores.total, threshold);
            if max_per_gene == 0 || rank < max_per_gene {
                selection.retained.push(record);
            } else {
                selection.discarded.push(Discarded {
                    record,
                    reason: DiscardReason::GeneCap,
                });
            }
        }
    }

    selection.retained.sort_by(rank_order);
    selection
        .discarded
        .sort_by(|a, b| rank_order(&a.record, &b.record));

    tracing::info!(
        "selected {} of {} transcripts from {} genes (max {} per gene, threshold {})",
        selection.retained.len(),
        selection.retained.len() + selection.discarded.len(),
        n_genes,
        if max_per_gene == 0 {
            "all".to_string()
        } else {
            max_per_gene.to_string()
        },
        threshold
    );

    selection
}

#[cfg(test)]
mod test {
    use super::{select, DiscardReason};
    use crate::data::orf::OrfType;
    use crate::score::result::{Quality, SubScores, TranscriptRecord};

    fn record(transcript_id: &str, total: f64, orf_length: u64) -> TranscriptRecord {
        let gene_id = transcript_id
            .rsplit_once('_')
            .map(|(gene, _)| gene)
            .unwrap_or(transcript_id);
        TranscriptRecord {
            transcript_id: transcript_id.to_string(),
            gene_id: gene_id.to_string(),
            orf_type: OrfType::Complete,
            orf_length,
            has_homology: false,
            busco: None,
            scores: SubScores {
                completeness: 1.0,
                homology: 0.0,
                length: 0.0,
                busco: 0.0,
                total,
            },
            quality: Quality::from_score(total),
        }
    }

    fn ids(records: &[TranscriptRecord]) -> Vec<&str> {
        records.iter().map(|r| r.transcript_id.as_str()).collect()
    }

    #[test]
    fn one_per_gene() {
        let selection = select(
            vec![
                record("G1_i2", 0.3533, 800),
                record("G1_i1", 0.94, 1200),
            ],
            0.5,
            1,
        );

        assert_eq!(ids(&selection.retained), vec!["G1_i1"]);
        assert_eq!(selection.discarded.len(), 1);
        assert_eq!(selection.discarded[0].record.transcript_id, "G1_i2");
        assert_eq!(selection.discarded[0].reason, DiscardReason::GeneCap);
    }

    #[test]
    fn ties_broken_by_length_then_id() {
        let selection = select(
            vec![
                record("G1_i3", 0.8, 900),
                record("G1_i2", 0.8, 900),
                record("G1_i1", 0.8, 300),
            ],
            0.5,
            0,
        );

        assert_eq!(ids(&selection.retained), vec!["G1_i2", "G1_i3", "G1_i1"]);
        assert!(selection.discarded.is_empty());
    }

    #[test]
    fn stable_under_permutation() {
        let records = vec![
            record("G1_i1", 0.9, 100),
            record("G1_i2", 0.7, 100),
            record("G2_i1", 0.4, 100),
            record("G2_i2", 0.6, 100),
            record("G3_i1", 0.55, 100),
            record("G1_i3", 0.7, 200),
        ];
        let expected = select(records.clone(), 0.5, 2);

        let mut reversed = records.clone();
        reversed.reverse();
        assert_eq!(select(reversed, 0.5, 2), expected);

        let mut rotated = records;
        rotated.rotate_left(2);
        assert_eq!(select(rotated, 0.5, 2), expected);

        assert_eq!(
            ids(&expected.retained),
            vec!["G1_i1", "G1_i3", "G2_i2", "G3_i1", "G2_i1"]
        );
    }

    #[test]
    fn threshold_forces_low_quality() {
        let selection = select(
            vec![record("G1_i1", 0.75, 100), record("G2_i1", 0.45, 100)],
            0.8,
            1,
        );

        assert_eq!(selection.retained.len(), 2);
        assert!(selection.retained.iter().all(|r| r.quality == Quality::Low));
    }

    #[test]
    fn quality_independent_of_rank() {
        let selection = select(
            vec![record("G1_i1", 0.9, 100), record("G1_i2", 0.85, 100)],
            0.5,
            1,
        );

        assert_eq!(selection.retained[0].quality, Quality::High);
        assert_eq!(selection.discarded[0].record.quality, Quality::High);
    }
}
