//! Export of the high-confidence transcript sequences.

use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use itertools::Itertools as _;

/// Copy the FASTA records whose identifier is in `ids` from `source` to `dest`.
///
/// The identifier is the first whitespace-delimited token of the header.
/// Returns the number of records written.
///
/// # Errors
///
/// If anything goes wrong, it returns a generic `anyhow::Error`.
pub fn export<P, Q>(
    source: P,
    dest: Q,
    ids: &rustc_hash::FxHashSet<&str>,
) -> Result<usize, anyhow::Error>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let reader = std::fs::File::open(source.as_ref())
        .map_err(|e| anyhow::anyhow!("problem opening {}: {}", source.as_ref().display(), e))
        .map(BufReader::new)?;
    let mut writer = std::fs::File::create(dest.as_ref())
        .map_err(|e| anyhow::anyhow!("problem creating {}: {}", dest.as_ref().display(), e))
        .map(BufWriter::new)?;

    let mut found = rustc_hash::FxHashSet::<String>::default();
    let mut keep = false;
    for line in reader.lines() {
        let line = line.map_err(|e| {
            anyhow::anyhow!("problem reading {}: {}", source.as_ref().display(), e)
        })?;
        if let Some(header) = line.strip_prefix('>') {
            let id = header.split_whitespace().next().unwrap_or_default();
            keep = ids.contains(id) && !found.contains(id);
            if keep {
                found.insert(id.to_string());
            }
        }
        if keep {
            writeln!(writer, "{}", line)
                .map_err(|e| anyhow::anyhow!("problem writing {}: {}", dest.as_ref().display(), e))?;
        }
    }
    writer
        .flush()
        .map_err(|e| anyhow::anyhow!("problem flushing {}: {}", dest.as_ref().display(), e))?;

    if found.len() < ids.len() {
        let mut missing = ids
            .iter()
            .filter(|id| !found.contains(**id))
            .collect::<Vec<_>>();
        missing.sort();
        tracing::warn!(
            "{} selected transcripts not found in {}: {}",
            missing.len(),
            source.as_ref().display(),
            missing.iter().take(5).join(", ")
        );
    }
    tracing::info!(
        "wrote {} sequences to {}",
        found.len(),
        dest.as_ref().display()
    );

    Ok(found.len())
}

#[cfg(test)]
mod test {
    #[tracing_test::traced_test]
    #[test]
    fn export() -> Result<(), anyhow::Error> {
        let tmp_dir = tempfile::tempdir()?;
        let source = tmp_dir.path().join("in.fasta");
        let dest = tmp_dir.path().join("out.fasta");
        std::fs::write(
            &source,
            ">G1_i1 len=12 path=[0:0-11]\nACGTAC\nGTACGT\n>G1_i2 len=6\nAAAAAA\n>G2_i1\nCCCC\n",
        )?;

        let ids = ["G1_i1", "G2_i1", "G3_i1"].into_iter().collect();
        let n = super::export(&source, &dest, &ids)?;

        assert_eq!(n, 2);
        assert_eq!(
            std::fs::read_to_string(&dest)?,
            ">G1_i1 len=12 path=[0:0-11]\nACGTAC\nGTACGT\n>G2_i1\nCCCC\n"
        );
        assert!(logs_contain("1 selected transcripts not found"));

        Ok(())
    }
}
