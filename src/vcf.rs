//! VCF reader: extracts genomic variants from the fixed columns.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::error::Error;
use crate::fasta::is_gzip_path;
use crate::variant::GenomicVariant;

const MIN_COLUMNS: usize = 5;

/// Result of parsing a single VCF line.
enum ParsedLine {
    Variants(Vec<GenomicVariant>),
    Filtered,
    Comment,
}

/// Parse a gzip-compressed VCF.
pub fn parse_vcf_gz<R: Read>(reader: R, drop_low_quality: bool) -> Result<Vec<GenomicVariant>, Error> {
    let decoder = GzDecoder::new(reader);
    parse_vcf(BufReader::new(decoder), drop_low_quality)
}

/// Parse VCF records from a buffered reader.
///
/// Multi-allelic ALT columns produce one variant per allele. With
/// `drop_low_quality`, records whose FILTER is neither `PASS` nor `.` are skipped.
pub fn parse_vcf<R: BufRead>(reader: R, drop_low_quality: bool) -> Result<Vec<GenomicVariant>, Error> {
    let mut variants = Vec::new();
    let mut filtered = 0usize;

    for (line_num, line) in reader.lines().enumerate() {
        let line_num = line_num + 1;
        let line = line?;
        match parse_line(&line, drop_low_quality)
            .map_err(|e| Error::Parse(format!("{e} (line {line_num}: {line})")))?
        {
            ParsedLine::Variants(mut parsed) => variants.append(&mut parsed),
            ParsedLine::Filtered => filtered += 1,
            ParsedLine::Comment => continue,
        }
    }

    if filtered > 0 {
        log::info!("dropped {filtered} VCF records failing FILTER");
    }
    Ok(variants)
}

/// Open a VCF file, decompressing when the name ends in `.gz`.
pub fn read_vcf_file(path: &Path, drop_low_quality: bool) -> Result<Vec<GenomicVariant>, Error> {
    let file = File::open(path)?;
    if is_gzip_path(path) {
        parse_vcf_gz(file, drop_low_quality)
    } else {
        parse_vcf(BufReader::new(file), drop_low_quality)
    }
}

fn parse_line(line: &str, drop_low_quality: bool) -> Result<ParsedLine, Error> {
    if line.starts_with('#') || line.trim().is_empty() {
        return Ok(ParsedLine::Comment);
    }

    let cols: Vec<&str> = line.split('\t').collect();
    if cols.len() < MIN_COLUMNS {
        return Err(Error::Format(format!(
            "expected at least {MIN_COLUMNS} tab-separated columns, found {}",
            cols.len()
        )));
    }

    if drop_low_quality
        && let Some(filter) = cols.get(6)
        && !matches!(filter.trim(), "PASS" | ".")
    {
        return Ok(ParsedLine::Filtered);
    }

    let position: u32 = cols[1]
        .trim()
        .parse()
        .map_err(|_| Error::Parse(format!("invalid position '{}'", cols[1])))?;
    let id = match cols[2].trim() {
        "." | "" => None,
        id => Some(id.to_string()),
    };

    let variants = cols[4]
        .split(',')
        .map(|alt| {
            GenomicVariant::new(cols[0], position, cols[3], alt).with_id(id.clone())
        })
        .collect();
    Ok(ParsedLine::Variants(variants))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::{Cursor, Write};

    const VCF: &str = "\
##fileformat=VCFv4.1
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO
chr10\t43617416\t.\tT\tC\t50\tPASS\t.
10\t43617417\trs1\tG\tA,T\t.\t.\tDP=4
chrMT\t100\t.\tAC\t-\t.\tLowQual\t.
";

    #[test]
    fn parse_and_split_alleles() {
        let variants = parse_vcf(Cursor::new(VCF), false).unwrap();
        assert_eq!(variants.len(), 4);
        assert_eq!(variants[0].chromosome, "10");
        assert_eq!(variants[0].position, 43617416);
        assert_eq!(variants[0].id, None);
        assert_eq!(variants[1].id.as_deref(), Some("rs1"));
        assert_eq!(variants[1].alternate, "A");
        assert_eq!(variants[2].alternate, "T");
        assert_eq!(variants[3].chromosome, "M");
        assert!(variants[3].alternate.is_empty());
    }

    #[test]
    fn drop_low_quality_records() {
        let variants = parse_vcf(Cursor::new(VCF), true).unwrap();
        assert_eq!(variants.len(), 3);
        assert!(variants.iter().all(|v| v.chromosome == "10"));
    }

    #[test]
    fn malformed_lines() {
        assert!(parse_vcf(Cursor::new("1\t100\t.\tA\n"), false).is_err());
        assert!(parse_vcf(Cursor::new("1\tabc\t.\tA\tG\n"), false).is_err());
    }

    #[test]
    fn gzip_input() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
        encoder.write_all(VCF.as_bytes()).unwrap();
        let gz = encoder.finish().unwrap();
        let variants = parse_vcf_gz(Cursor::new(gz), true).unwrap();
        assert_eq!(variants.len(), 3);
    }
}
