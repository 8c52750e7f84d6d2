//! Parser for FASTA sequence files.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::error::Error;

/// One FASTA record: identifier, full header line (without `>`), residues.
pub type FastaRecord = (String, String, Vec<u8>);

/// Reads gzip-compressed FASTA and yields (identifier, sequence) pairs.
pub fn parse_fasta_gz<R: Read>(reader: R) -> Result<Vec<(String, Vec<u8>)>, Error> {
    let decoder = GzDecoder::new(reader);
    parse_fasta(BufReader::new(decoder))
}

/// Reads FASTA from a buffered reader and yields (identifier, sequence) pairs.
///
/// The identifier is the first whitespace-delimited token of the header with
/// any Ensembl version suffix removed. Residues are uppercased.
pub fn parse_fasta<R: BufRead>(reader: R) -> Result<Vec<(String, Vec<u8>)>, Error> {
    Ok(parse_fasta_with_headers(reader)?
        .into_iter()
        .map(|(id, _, seq)| (id, seq))
        .collect())
}

/// Like [`parse_fasta`] but keeps the header text for cross-reference lookups.
pub fn parse_fasta_with_headers<R: BufRead>(reader: R) -> Result<Vec<FastaRecord>, Error> {
    let mut results: Vec<FastaRecord> = Vec::new();
    let mut current: Option<(String, String)> = None;
    let mut current_sequence: Vec<u8> = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if let Some(header) = line.strip_prefix('>') {
            if let Some((id, header)) = current.take() {
                results.push((id, header, std::mem::take(&mut current_sequence)));
            }
            let id = header_id(header).ok_or_else(|| {
                Error::Parse(format!("empty FASTA header at line {}", line_no + 1))
            })?;
            current = Some((id, header.trim().to_string()));
        } else if current.is_some() {
            let start = current_sequence.len();
            current_sequence.extend_from_slice(line.trim().as_bytes());
            current_sequence[start..].make_ascii_uppercase();
        } else if !line.trim().is_empty() {
            return Err(Error::Format(format!(
                "sequence data before first FASTA header at line {}",
                line_no + 1
            )));
        }
    }

    if let Some((id, header)) = current {
        results.push((id, header, current_sequence));
    }

    Ok(results)
}

/// Open a FASTA file, decompressing when the name ends in `.gz`.
pub fn read_fasta_file(path: &Path) -> Result<Vec<FastaRecord>, Error> {
    let file = File::open(path)?;
    if is_gzip_path(path) {
        parse_fasta_with_headers(BufReader::new(GzDecoder::new(file)))
    } else {
        parse_fasta_with_headers(BufReader::new(file))
    }
}

pub(crate) fn is_gzip_path(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

fn header_id(header: &str) -> Option<String> {
    let token = header.split_whitespace().next()?;
    Some(strip_version(token).to_string())
}

/// `ENST00000288602.11` → `ENST00000288602`; IDs without a numeric suffix are unchanged.
#[must_use]
pub fn strip_version(id: &str) -> &str {
    match id.rsplit_once('.') {
        Some((stem, version))
            if !stem.is_empty()
                && !version.is_empty()
                && version.bytes().all(|b| b.is_ascii_digit()) =>
        {
            stem
        }
        _ => id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    fn make_gz(content: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
        encoder.write_all(content).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn parse_single_sequence() {
        let fasta = b">ENST00000288602.11 cds chromosome:GRCh38:7:140719327:140924929:-1\nATGgcg\nGCG\n";
        let gz = make_gz(fasta);
        let results = parse_fasta_gz(std::io::Cursor::new(gz)).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "ENST00000288602");
        assert_eq!(results[0].1, b"ATGGCGGCG");
    }

    #[test]
    fn parse_multiple_sequences() {
        let fasta = b">t1\nACGT\n>t2\nTTTT\nAAAA\n\n>t3\nGGG\n";
        let results = parse_fasta(std::io::Cursor::new(&fasta[..])).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[1].0, "t2");
        assert_eq!(results[1].1, b"TTTTAAAA");
        assert_eq!(results[2].1, b"GGG");
    }

    #[test]
    fn headers_are_kept() {
        let fasta = b">ENSP0001.2 pep transcript:ENST0001.4 gene:ENSG1\nMAC\n";
        let results = parse_fasta_with_headers(std::io::Cursor::new(&fasta[..])).unwrap();
        assert_eq!(results[0].0, "ENSP0001");
        assert!(results[0].1.contains("transcript:ENST0001.4"));
        assert_eq!(results[0].2, b"MAC");
    }

    #[test]
    fn data_before_header_is_rejected() {
        let fasta = b"ACGT\n>t1\nACGT\n";
        assert!(parse_fasta(std::io::Cursor::new(&fasta[..])).is_err());
        assert!(parse_fasta(std::io::Cursor::new(&b">\nACGT\n"[..])).is_err());
    }

    #[test]
    fn version_suffixes() {
        assert_eq!(strip_version("ENST00000288602.11"), "ENST00000288602");
        assert_eq!(strip_version("NM_004333"), "NM_004333");
        assert_eq!(strip_version("tx.a"), "tx.a");
        assert_eq!(strip_version(".5"), ".5");
    }

    #[test]
    fn read_plain_and_gz_files() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("cds.fa");
        std::fs::write(&plain, b">t1\nATG\n").unwrap();
        let gz = dir.path().join("cds.fa.gz");
        std::fs::write(&gz, make_gz(b">t2\nTGA\n")).unwrap();

        assert_eq!(read_fasta_file(&plain).unwrap()[0].0, "t1");
        assert_eq!(read_fasta_file(&gz).unwrap()[0].2, b"TGA");
    }
}
