//! Readers for the evidence files produced by the external tools.

use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::MalformedRecordError;

pub mod busco_summary;
pub mod homology;
pub mod orf;
pub mod ortholog;

/// What one input line turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome<T> {
    /// A usable record.
    Record(T),
    /// Expected variance of the format (comments, blank lines, other features).
    Ignored,
    /// Well-formed but removed by a configured filter.
    Filtered,
    /// Malformed, with the reason.
    Skipped(String),
}

/// Line tally of one parsed file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ParseStats {
    /// Number of non-empty lines read.
    pub lines: usize,
    /// Number of lines yielding a record.
    pub records: usize,
    /// Number of ignored lines.
    pub ignored: usize,
    /// Number of filtered lines.
    pub filtered: usize,
    /// Number of malformed lines.
    pub skipped: usize,
}

/// Records read from one file together with the line tally.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    /// Records in file order.
    pub records: Vec<T>,
    /// Line tally.
    pub stats: ParseStats,
}

/// Stream the tab-separated lines of the file at `path` through `parse_line`.
///
/// `parse_line` receives the columns of one line, never fewer than one.
/// Empty lines are not passed on and not counted.
///
/// # Errors
///
/// If the file cannot be opened or read.  Malformed lines are not errors;
/// they are logged and counted.
pub fn parse_file<T, F>(path: &Path, parse_line: F) -> Result<Parsed<T>, anyhow::Error>
where
    F: FnMut(&[&str]) -> LineOutcome<T>,
{
    let reader = std::fs::File::open(path)
        .map_err(|e| anyhow::anyhow!("problem opening file {}: {}", path.display(), e))
        .map(BufReader::new)?;
    parse_reader(reader, path, parse_line)
}

/// Like [`parse_file`] but reading from `reader`; `path` is used for messages.
///
/// # Errors
///
/// If reading fails.
pub fn parse_reader<R, T, F>(
    reader: R,
    path: &Path,
    mut parse_line: F,
) -> Result<Parsed<T>, anyhow::Error>
where
    R: Read,
    F: FnMut(&[&str]) -> LineOutcome<T>,
{
    // quotes in GFF3 attributes are literal
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let mut records = Vec::new();
    let mut stats = ParseStats::default();
    let mut record = csv::ByteRecord::new();
    while csv_reader
        .read_byte_record(&mut record)
        .map_err(|e| anyhow::anyhow!("problem reading {}: {}", path.display(), e))?
    {
        stats.lines += 1;
        let line_no = record
            .position()
            .map(|pos| pos.line() as usize)
            .unwrap_or(stats.lines);
        let outcome = match record
            .iter()
            .map(std::str::from_utf8)
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(cols) => parse_line(&cols),
            Err(_) => LineOutcome::Skipped("invalid UTF-8".into()),
        };
        match outcome {
            LineOutcome::Record(value) => {
                stats.records += 1;
                records.push(value);
            }
            LineOutcome::Ignored => stats.ignored += 1,
            LineOutcome::Filtered => stats.filtered += 1,
            LineOutcome::Skipped(reason) => {
                stats.skipped += 1;
                tracing::warn!(
                    "{}",
                    MalformedRecordError {
                        path: path.to_path_buf(),
                        line_no,
                        reason,
                    }
                );
            }
        }
    }

    tracing::debug!(
        "read {}: {} lines, {} records, {} ignored, {} filtered, {} skipped",
        path.display(),
        stats.lines,
        stats.records,
        stats.ignored,
        stats.filtered,
        stats.skipped
    );

    Ok(Parsed { records, stats })
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use super::{parse_reader, LineOutcome, ParseStats};

    fn parse_number(cols: &[&str]) -> LineOutcome<u32> {
        if cols[0].starts_with('#') {
            LineOutcome::Ignored
        } else {
            match cols[0].parse::<u32>() {
                Ok(value) if value > 100 => LineOutcome::Filtered,
                Ok(value) => LineOutcome::Record(value),
                Err(e) => LineOutcome::Skipped(e.to_string()),
            }
        }
    }

    #[tracing_test::traced_test]
    #[test]
    fn tally_outcomes() -> Result<(), anyhow::Error> {
        let input = "# header\n1\nx\n\n20\r\n300\tcomment\n";
        let parsed = parse_reader(input.as_bytes(), Path::new("numbers.txt"), parse_number)?;

        assert_eq!(parsed.records, vec![1, 20]);
        assert_eq!(
            parsed.stats,
            ParseStats {
                lines: 5,
                records: 2,
                ignored: 1,
                filtered: 1,
                skipped: 1,
            }
        );
        assert!(logs_contain("malformed record at numbers.txt:3"));

        Ok(())
    }

    #[tracing_test::traced_test]
    #[test]
    fn invalid_utf8_line_skipped() -> Result<(), anyhow::Error> {
        let input: &[u8] = b"1\n\xff\xfe garbage\n2\n";
        let parsed = parse_reader(input, Path::new("numbers.txt"), parse_number)?;

        assert_eq!(parsed.records, vec![1, 2]);
        assert_eq!(parsed.stats.lines, 3);
        assert_eq!(parsed.stats.skipped, 1);
        assert!(logs_contain("malformed record at numbers.txt:2"));
        assert!(logs_contain("invalid UTF-8"));

        Ok(())
    }

    #[test]
    fn columns_split_on_tabs() -> Result<(), anyhow::Error> {
        let input = "a\tb\t\"c d\"\n";
        let parsed = parse_reader(input.as_bytes(), Path::new("cols.tsv"), |cols| {
            LineOutcome::Record(cols.iter().map(|col| col.to_string()).collect::<Vec<_>>())
        })?;

        assert_eq!(parsed.records, vec![vec!["a", "b", "\"c d\""]]);

        Ok(())
    }

    #[test]
    fn missing_file() {
        let result = super::parse_file(Path::new("tests/data/no-such-file.tsv"), |_| {
            LineOutcome::<()>::Ignored
        });
        assert!(result.is_err());
    }
}
