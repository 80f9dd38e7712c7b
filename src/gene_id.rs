//! Deriving gene identifiers from transcript identifiers.
//!
//! Assemblers name transcripts `<gene prefix><sep><variant suffix>`, e.g.,
//! Trinity's `TRINITY_DN1000_c0_g1_i1` for isoform `i1` of gene
//! `TRINITY_DN1000_c0_g1`.

use crate::error::InvalidIdentifierError;

/// The default segment separator.
pub const DEFAULT_SEPARATOR: char = '_';

/// Remove the last `separator`-delimited segment of `transcript_id`.
///
/// # Errors
///
/// If the identifier has fewer than two segments or the prefix or suffix is
/// empty.
pub fn derive_gene_id(
    transcript_id: &str,
    separator: char,
) -> Result<&str, InvalidIdentifierError> {
    match transcript_id.rsplit_once(separator) {
        Some((prefix, suffix)) if !prefix.is_empty() && !suffix.is_empty() => Ok(prefix),
        _ => Err(InvalidIdentifierError {
            transcript_id: transcript_id.to_string(),
            separator,
        }),
    }
}

/// Memoizing gene identifier deriver for one run.
#[derive(Debug, Clone)]
pub struct GeneIdDeriver {
    separator: char,
    cache: rustc_hash::FxHashMap<String, Result<String, InvalidIdentifierError>>,
}

impl Default for GeneIdDeriver {
    fn default() -> Self {
        Self::new(DEFAULT_SEPARATOR)
    }
}

impl GeneIdDeriver {
    pub fn new(separator: char) -> Self {
        Self {
            separator,
            cache: Default::default(),
        }
    }

    /// Gene identifier of `transcript_id`, see [`derive_gene_id`].
    ///
    /// # Errors
    ///
    /// If the identifier does not follow the naming convention.
    pub fn derive(&mut self, transcript_id: &str) -> Result<String, InvalidIdentifierError> {
        if let Some(cached) = self.cache.get(transcript_id) {
            return cached.clone();
        }
        let result = derive_gene_id(transcript_id, self.separator).map(str::to_string);
        self.cache
            .insert(transcript_id.to_string(), result.clone());
        result
    }
}
