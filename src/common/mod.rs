//! Commonly used code.

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

/// Commonly used command line arguments.
#[derive(Parser, Debug)]
pub struct Args {
    /// Verbosity of the program
    #[clap(flatten)]
    pub verbose: Verbosity<InfoLevel>,

    /// Number of worker threads for scoring and external tools.
    #[clap(short = 't', long, global = true)]
    pub threads: Option<usize>,
}

impl Args {
    /// Number of threads to use, defaulting to the available parallelism.
    pub fn threads(&self) -> usize {
        self.threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(std::num::NonZeroUsize::get)
                .unwrap_or(1)
        })
    }
}

/// Strategy to apply when one transcript has several candidate records in one
/// evidence file.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Default,
    clap::ValueEnum,
    serde::Deserialize,
    serde::Serialize,
    strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MultiMatchPolicy {
    /// Keep the first record in file order.
    #[default]
    First,
    /// Keep the strongest record (longest ORF, best BUSCO status).
    Best,
}

/// Strip the TransDecoder peptide suffix (`.p1`, `.p12`, ...) from an identifier.
///
/// Identifiers without such a suffix are returned unchanged.
pub fn strip_peptide_suffix(id: &str) -> &str {
    match id.rsplit_once(".p") {
        Some((prefix, digits))
            if !prefix.is_empty()
                && !digits.is_empty()
                && digits.bytes().all(|b| b.is_ascii_digit()) =>
        {
            prefix
        }
        _ => id,
    }
}
