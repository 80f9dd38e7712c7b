//! ORF annotation from TransDecoder GFF3 files.

use std::io::Read;
use std::path::Path;
use std::str::FromStr as _;

use crate::common::MultiMatchPolicy;

use super::{LineOutcome, Parsed};

/// Completeness of a predicted ORF.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Deserialize,
    serde::Serialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum OrfType {
    /// Start and stop codon present.
    #[serde(rename = "complete")]
    #[strum(serialize = "complete")]
    Complete,
    /// Start codon missing.
    #[serde(rename = "5prime_partial")]
    #[strum(serialize = "5prime_partial")]
    FivePrimePartial,
    /// Stop codon missing.
    #[serde(rename = "3prime_partial")]
    #[strum(serialize = "3prime_partial")]
    ThreePrimePartial,
    /// Both missing.
    #[serde(rename = "internal")]
    #[strum(serialize = "internal")]
    Internal,
}

/// One ORF model of a transcript.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct OrfRecord {
    /// Transcript (sequence) identifier.
    pub transcript_id: String,
    /// ORF model identifier, e.g., `TRINITY_DN1000_c0_g1_i1.p1`.
    pub orf_id: String,
    /// ORF completeness.
    pub orf_type: OrfType,
    /// Summed length of the coding spans in nucleotides.
    pub orf_length: u64,
}

/// One `CDS` line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CdsSegment {
    transcript_id: String,
    model_id: String,
    orf_type: OrfType,
    span: u64,
}

/// Load ORF records from a GFF3 file, one per transcript.
///
/// # Arguments
///
/// * `path` - Path to the GFF3 file.
/// * `policy` - Which ORF model to keep for transcripts with several.
///
/// # Errors
///
/// If anything goes wrong, it returns a generic `anyhow::Error`.
pub fn load_file<P>(path: P, policy: MultiMatchPolicy) -> Result<Parsed<OrfRecord>, anyhow::Error>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let reader = std::fs::File::open(path)
        .map_err(|e| anyhow::anyhow!("problem opening ORF annotation {}: {}", path.display(), e))
        .map(std::io::BufReader::new)?;
    load_reader(reader, path, policy)
}

/// Like [`load_file`] but reading from `reader`.
///
/// # Errors
///
/// If reading fails.
pub fn load_reader<R: Read>(
    reader: R,
    path: &Path,
    policy: MultiMatchPolicy,
) -> Result<Parsed<OrfRecord>, anyhow::Error> {
    let mut mrna_types = rustc_hash::FxHashMap::<String, OrfType>::default();
    let segments = super::parse_reader(reader, path, |cols| parse_line(cols, &mut mrna_types))?;

    let models = sum_models(segments.records);
    let n_models = models.len();
    let records = pick_per_transcript(models, policy);
    if n_models > records.len() {
        tracing::info!(
            "{} ORF models for {} transcripts in {}, kept one per transcript ({})",
            n_models,
            records.len(),
            path.display(),
            policy
        );
    }

    Ok(Parsed {
        records,
        stats: segments.stats,
    })
}

fn parse_line(
    cols: &[&str],
    mrna_types: &mut rustc_hash::FxHashMap<String, OrfType>,
) -> LineOutcome<CdsSegment> {
    if cols[0].starts_with('#') || cols.iter().all(|col| col.trim().is_empty()) {
        return LineOutcome::Ignored;
    }
    if cols.len() < 9 {
        return LineOutcome::Skipped(format!("expected 9 columns, found {}", cols.len()));
    }
    let attributes = cols[8];

    match cols[2] {
        "mRNA" => {
            // remember the completeness token for the CDS lines below
            if let (Some(id), Some(token)) = (attribute(attributes, "ID"), type_token(attributes))
            {
                if let Ok(orf_type) = OrfType::from_str(token) {
                    mrna_types.insert(id.to_string(), orf_type);
                }
            }
            LineOutcome::Ignored
        }
        "CDS" => {
            let (start, end) = match (cols[3].parse::<u64>(), cols[4].parse::<u64>()) {
                (Ok(start), Ok(end)) => (start, end),
                _ => {
                    return LineOutcome::Skipped(format!(
                        "non-numeric coordinates {:?}..{:?}",
                        cols[3], cols[4]
                    ))
                }
            };
            if end < start {
                return LineOutcome::Skipped(format!("empty coding span {}..{}", start, end));
            }
            let Some(model_id) = attribute(attributes, "Parent")
                .and_then(|parents| parents.split(',').next())
                .or_else(|| attribute(attributes, "ID"))
            else {
                return LineOutcome::Skipped("CDS without Parent or ID attribute".into());
            };
            let orf_type = match type_token(attributes) {
                Some(token) => match OrfType::from_str(token) {
                    Ok(orf_type) => orf_type,
                    Err(_) => return LineOutcome::Skipped(format!("unknown ORF type {:?}", token)),
                },
                None => match mrna_types.get(model_id) {
                    Some(orf_type) => *orf_type,
                    None => {
                        return LineOutcome::Skipped(format!(
                            "no ORF type for model {:?}",
                            model_id
                        ))
                    }
                },
            };
            LineOutcome::Record(CdsSegment {
                transcript_id: cols[0].to_string(),
                model_id: model_id.to_string(),
                orf_type,
                span: end - start + 1,
            })
        }
        _ => LineOutcome::Ignored,
    }
}

/// Value of the GFF3 attribute `key`.
fn attribute<'a>(attributes: &'a str, key: &str) -> Option<&'a str> {
    attributes.split(';').find_map(|entry| {
        let (k, v) = entry.trim().split_once('=')?;
        (k == key && !v.is_empty()).then_some(v)
    })
}

/// The ORF completeness token following `type:` (or its escaped form).
fn type_token(attributes: &str) -> Option<&str> {
    ["type:", "type%3A", "type%3a"]
        .iter()
        .filter_map(|marker| {
            let pos = attributes.find(marker)?;
            let rest = &attributes[pos + marker.len()..];
            let end = rest
                .find(|c: char| matches!(c, ' ' | ';' | ',' | '%' | '(' | '\t'))
                .unwrap_or(rest.len());
            Some(&rest[..end])
        })
        .find(|token| !token.is_empty())
}

/// Sum the spans of each ORF model, keeping first-seen order.
fn sum_models(segments: Vec<CdsSegment>) -> Vec<OrfRecord> {
    let mut models: Vec<OrfRecord> = Vec::new();
    let mut idx = rustc_hash::FxHashMap::<(String, String), usize>::default();
    for segment in segments {
        let key = (segment.transcript_id, segment.model_id);
        match idx.get(&key) {
            Some(&i) => models[i].orf_length += segment.span,
            None => {
                idx.insert(key.clone(), models.len());
                models.push(OrfRecord {
                    transcript_id: key.0,
                    orf_id: key.1,
                    orf_type: segment.orf_type,
                    orf_length: segment.span,
                });
            }
        }
    }
    models
}

/// Keep one ORF model per transcript.
fn pick_per_transcript(models: Vec<OrfRecord>, policy: MultiMatchPolicy) -> Vec<OrfRecord> {
    let mut picked: Vec<OrfRecord> = Vec::new();
    let mut idx = rustc_hash::FxHashMap::<String, usize>::default();
    for model in models {
        match idx.get(&model.transcript_id) {
            Some(&i) => {
                if policy == MultiMatchPolicy::Best && model.orf_length > picked[i].orf_length {
                    picked[i] = model;
                }
            }
            None => {
                idx.insert(model.transcript_id.clone(), picked.len());
                picked.push(model);
            }
        }
    }
    picked
}
