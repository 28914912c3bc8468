//! Fragment loading from plain line lists, FASTA and FASTQ (optionally gzipped).

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use bio::io::{fasta, fastq};
use flate2::read::MultiGzDecoder;

use crate::fragment::{Fragment, FragmentError, ValidationMode};

/// Prefix of the ids assigned to records of the line format.
pub const LINE_ID_PREFIX: &str = "Frag_";

/// Errors returned while loading fragments.
#[derive(thiserror::Error, Debug)]
pub enum ReaderError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed {format} record {record} in {}: {message}", .path.display())]
    Malformed {
        path: PathBuf,
        format: SequenceFormat,
        record: usize,
        message: String,
    },
    #[error(transparent)]
    Fragment(#[from] FragmentError),
}

/// Input layouts understood by [`read_fragments`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceFormat {
    /// One sequence per line, blank lines skipped.
    Lines,
    Fasta,
    Fastq,
}

impl std::fmt::Display for SequenceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Lines => "line",
            Self::Fasta => "FASTA",
            Self::Fastq => "FASTQ",
        };
        f.write_str(name)
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz") || ext.eq_ignore_ascii_case("bgz"))
        .unwrap_or(false)
}

/// Infer the format from the file extension, looking through `.gz`/`.bgz`.
pub fn infer_format(path: &Path) -> SequenceFormat {
    let mut ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();

    if is_gzip(path) {
        ext = path
            .file_stem()
            .map(Path::new)
            .and_then(|stem| stem.extension())
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase())
            .unwrap_or_default();
    }

    match ext.as_str() {
        "fastq" | "fq" => SequenceFormat::Fastq,
        "fasta" | "fa" | "fna" => SequenceFormat::Fasta,
        _ => SequenceFormat::Lines,
    }
}

fn open_reader(path: &Path) -> Result<Box<dyn BufRead>, ReaderError> {
    let file = File::open(path).map_err(|source| ReaderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if is_gzip(path) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Load every fragment from `path`, validating sequences under `mode`.
pub fn read_fragments(path: &Path, mode: ValidationMode) -> Result<Vec<Fragment>, ReaderError> {
    let format = infer_format(path);
    let reader = open_reader(path)?;
    let fragments = match format {
        SequenceFormat::Lines => parse_line_records(reader, path, mode)?,
        SequenceFormat::Fasta => parse_fasta(reader, path, mode)?,
        SequenceFormat::Fastq => parse_fastq(reader, path, mode)?,
    };
    log::info!(
        "Loaded {} fragments from {} ({} format)",
        fragments.len(),
        path.display(),
        format
    );
    Ok(fragments)
}

/// Parse the line format: ids are `Frag_<n>` counted over non-blank lines.
pub fn parse_lines<R: BufRead>(
    reader: R,
    mode: ValidationMode,
) -> Result<Vec<Fragment>, ReaderError> {
    parse_line_records(reader, Path::new("<stream>"), mode)
}

fn parse_line_records<R: BufRead>(
    reader: R,
    path: &Path,
    mode: ValidationMode,
) -> Result<Vec<Fragment>, ReaderError> {
    let mut fragments = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(|source| ReaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let id = format!("{}{}", LINE_ID_PREFIX, fragments.len());
        fragments.push(Fragment::with_mode(id, trimmed, mode)?);
    }
    Ok(fragments)
}

fn record_id(id: &str, index: usize) -> String {
    if id.is_empty() {
        format!("{}{}", LINE_ID_PREFIX, index)
    } else {
        id.to_string()
    }
}

fn decode_sequence(
    bytes: &[u8],
    path: &Path,
    format: SequenceFormat,
    record: usize,
) -> Result<String, ReaderError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| ReaderError::Malformed {
            path: path.to_path_buf(),
            format,
            record,
            message: "sequence is not valid UTF-8".to_string(),
        })
}

fn parse_fasta(
    reader: Box<dyn BufRead>,
    path: &Path,
    mode: ValidationMode,
) -> Result<Vec<Fragment>, ReaderError> {
    let mut fragments = Vec::new();
    for (index, record) in fasta::Reader::new(reader).records().enumerate() {
        let record = record.map_err(|err| ReaderError::Malformed {
            path: path.to_path_buf(),
            format: SequenceFormat::Fasta,
            record: index,
            message: err.to_string(),
        })?;
        let sequence = decode_sequence(record.seq(), path, SequenceFormat::Fasta, index)?;
        fragments.push(Fragment::with_mode(
            record_id(record.id(), index),
            sequence,
            mode,
        )?);
    }
    Ok(fragments)
}

fn parse_fastq(
    reader: Box<dyn BufRead>,
    path: &Path,
    mode: ValidationMode,
) -> Result<Vec<Fragment>, ReaderError> {
    let mut fragments = Vec::new();
    for (index, record) in fastq::Reader::new(reader).records().enumerate() {
        let record = record.map_err(|err| ReaderError::Malformed {
            path: path.to_path_buf(),
            format: SequenceFormat::Fastq,
            record: index,
            message: err.to_string(),
        })?;
        let sequence = decode_sequence(record.seq(), path, SequenceFormat::Fastq, index)?;
        fragments.push(Fragment::with_mode(
            record_id(record.id(), index),
            sequence,
            mode,
        )?);
    }
    Ok(fragments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn line_format_skips_blanks_and_numbers_in_read_order() {
        let input = "acgt\n\n  GGTA  \n\nTTAC\n";
        let fragments = parse_lines(input.as_bytes(), ValidationMode::Strict).unwrap();
        let ids: Vec<&str> = fragments.iter().map(Fragment::id).collect();
        assert_eq!(ids, vec!["Frag_0", "Frag_1", "Frag_2"]);
        assert_eq!(fragments[0].sequence(), "ACGT");
        assert_eq!(fragments[1].sequence(), "GGTA");
    }

    #[test]
    fn line_format_applies_validation_mode() {
        let input = "ACGT\nACXT\n";
        assert!(matches!(
            parse_lines(input.as_bytes(), ValidationMode::Strict),
            Err(ReaderError::Fragment(FragmentError::InvalidSymbol { .. }))
        ));
        let fragments = parse_lines(input.as_bytes(), ValidationMode::Permissive).unwrap();
        assert_eq!(fragments.len(), 2);
    }

    #[test]
    fn infers_format_from_extension() {
        assert_eq!(infer_format(Path::new("reads.fq.gz")), SequenceFormat::Fastq);
        assert_eq!(infer_format(Path::new("reads.FASTA")), SequenceFormat::Fasta);
        assert_eq!(infer_format(Path::new("reads.fna.bgz")), SequenceFormat::Fasta);
        assert_eq!(infer_format(Path::new("fragments.txt")), SequenceFormat::Lines);
        assert_eq!(infer_format(Path::new("fragments")), SequenceFormat::Lines);
    }

    #[test]
    fn reads_plain_line_file() {
        let tmp = tempfile::Builder::new().suffix(".txt").tempfile().expect("tmpfile");
        writeln!(tmp.as_file(), "AAGCT\nGCTTA\n\nCTTAG").unwrap();
        let fragments = read_fragments(tmp.path(), ValidationMode::Strict).unwrap();
        assert_eq!(fragments.len(), 3);
        assert_eq!(fragments[2].id(), "Frag_2");
    }

    #[test]
    fn reads_fasta_with_record_ids() {
        let tmp = tempfile::Builder::new().suffix(".fa").tempfile().expect("tmpfile");
        writeln!(tmp.as_file(), ">r1 first\nAAG\nCT\n>r2\ngcttA").unwrap();
        let fragments = read_fragments(tmp.path(), ValidationMode::Strict).unwrap();
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].id(), "r1");
        assert_eq!(fragments[0].sequence(), "AAGCT");
        assert_eq!(fragments[1].sequence(), "GCTTA");
    }

    #[test]
    fn reads_gzipped_fastq() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let tmp = tempfile::Builder::new().suffix(".fastq.gz").tempfile().expect("tmpfile");
        let mut encoder = GzEncoder::new(tmp.reopen().unwrap(), Compression::default());
        write!(encoder, "@q1\nAAGCT\n+\nIIIII\n@q2\nGCTTA\n+\nIIIII\n").unwrap();
        encoder.finish().unwrap();

        let fragments = read_fragments(tmp.path(), ValidationMode::Strict).unwrap();
        let ids: Vec<&str> = fragments.iter().map(Fragment::id).collect();
        assert_eq!(ids, vec!["q1", "q2"]);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = read_fragments(Path::new("/definitely/not/here.txt"), ValidationMode::Strict)
            .unwrap_err();
        assert!(matches!(err, ReaderError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here.txt"));
    }
}
