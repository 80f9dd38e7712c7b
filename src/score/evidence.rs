//! Merging the evidence files into one record per transcript.

use crate::data::orf::{OrfRecord, OrfType};
use crate::data::{homology, ortholog};
use crate::error::InvalidIdentifierError;
use crate::gene_id::GeneIdDeriver;

/// All evidence of one transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEvidence {
    pub transcript_id: String,
    pub gene_id: String,
    pub orf_type: OrfType,
    pub orf_length: u64,
    pub has_homology: bool,
    pub busco: Option<ortholog::OrthologHit>,
}

/// A transcript excluded from scoring because its identifier yields no gene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTranscript {
    pub orf: OrfRecord,
    pub error: InvalidIdentifierError,
}

/// Evidence of all transcripts of one run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Evidence {
    /// Transcripts to score, in ORF annotation order.
    pub transcripts: Vec<TranscriptEvidence>,
    /// Transcripts with unusable identifiers.
    pub invalid: Vec<InvalidTranscript>,
}

/// Join the ORF records with the optional homology and ortholog evidence.
///
/// # Arguments
///
/// * `orfs` - One ORF record per transcript.
/// * `homology` - Homology hits, if available.
/// * `orthologs` - BUSCO matches, if available.
/// * `deriver` - Gene identifier deriver of this run.
pub fn assemble(
    orfs: Vec<OrfRecord>,
    homology: Option<&homology::Data>,
    orthologs: Option<&ortholog::Data>,
    deriver: &mut GeneIdDeriver,
) -> Evidence {
    let mut evidence = Evidence::default();
    for orf in orfs {
        let gene_id = match deriver.derive(&orf.transcript_id) {
            Ok(gene_id) => gene_id,
            Err(error) => {
                tracing::warn!("{}", error);
                evidence.invalid.push(InvalidTranscript { orf, error });
                continue;
            }
        };
        let has_homology = homology.is_some_and(|data| data.has_hit(&orf.transcript_id));
        let busco = orthologs.and_then(|data| data.get(&orf.transcript_id).cloned());
        evidence.transcripts.push(TranscriptEvidence {
            transcript_id: orf.transcript_id,
            gene_id,
            orf_type: orf.orf_type,
            orf_length: orf.orf_length,
            has_homology,
            busco,
        });
    }

    tracing::info!(
        "evidence for {} transcripts ({} with homology, {} with BUSCO match, {} invalid identifiers)",
        evidence.transcripts.len(),
        evidence.transcripts.iter().filter(|t| t.has_homology).count(),
        evidence.transcripts.iter().filter(|t| t.busco.is_some()).count(),
        evidence.invalid.len()
    );

    evidence
}
