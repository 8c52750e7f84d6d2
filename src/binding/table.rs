//! Precomputed binding predictions read from a tab-separated table.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::allele::normalize_hla_allele_name;
use crate::error::Error;
use crate::fasta::is_gzip_path;

use super::{BindingPrediction, BindingPredictor};

const COLUMNS: [&str; 7] = [
    "source_sequence",
    "epitope",
    "epitope_start",
    "epitope_end",
    "allele",
    "ic50",
    "percentile_rank",
];

/// Binding rows indexed by source sequence.
#[derive(Debug, Default)]
pub struct PrecomputedBindings {
    rows: HashMap<String, Vec<BindingPrediction>>,
}

impl PrecomputedBindings {
    /// Parse a table whose first line is the column header.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        let mut lines = reader.lines();
        let header = lines
            .next()
            .transpose()?
            .ok_or_else(|| Error::Format("empty binding table".to_string()))?;
        let columns: Vec<&str> = header.trim_end().split('\t').collect();
        if columns != COLUMNS {
            return Err(Error::Format(format!(
                "binding table header must be '{}', found '{}'",
                COLUMNS.join("\t"),
                header.trim_end()
            )));
        }

        let mut rows: HashMap<String, Vec<BindingPrediction>> = HashMap::new();
        for (line_num, line) in lines.enumerate() {
            let line_num = line_num + 2;
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let row = parse_row(&line)
                .map_err(|e| Error::Parse(format!("{e} (line {line_num}: {line})")))?;
            rows.entry(row.source_sequence.clone()).or_default().push(row);
        }
        Ok(Self { rows })
    }

    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let file = File::open(path)?;
        if is_gzip_path(path) {
            Self::from_reader(BufReader::new(GzDecoder::new(file)))
        } else {
            Self::from_reader(BufReader::new(file))
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn parse_row(line: &str) -> Result<BindingPrediction, Error> {
    let cols: Vec<&str> = line.trim_end().split('\t').collect();
    if cols.len() != COLUMNS.len() {
        return Err(Error::Format(format!(
            "expected {} columns, found {}",
            COLUMNS.len(),
            cols.len()
        )));
    }
    let integer = |i: usize| {
        cols[i]
            .trim()
            .parse::<usize>()
            .map_err(|_| Error::Parse(format!("invalid {} '{}'", COLUMNS[i], cols[i])))
    };
    let float = |i: usize| {
        cols[i]
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::Parse(format!("invalid {} '{}'", COLUMNS[i], cols[i])))
    };

    let row = BindingPrediction {
        source_sequence: cols[0].trim().to_string(),
        epitope: cols[1].trim().to_string(),
        epitope_start: integer(2)?,
        epitope_end: integer(3)?,
        allele: normalize_hla_allele_name(cols[4])?,
        ic50: float(5)?,
        percentile_rank: float(6)?,
    };
    row.validate()?;
    Ok(row)
}

impl BindingPredictor for PrecomputedBindings {
    /// Rows for the requested sequences and alleles; other rows are ignored.
    fn predict(
        &self,
        sequences: &[&str],
        alleles: &[String],
    ) -> Result<Vec<BindingPrediction>, Error> {
        let mut predictions = Vec::new();
        for &sequence in sequences {
            match self.rows.get(sequence) {
                Some(rows) => predictions.extend(
                    rows.iter()
                        .filter(|row| alleles.contains(&row.allele))
                        .cloned(),
                ),
                None => log::warn!("no precomputed bindings for {sequence}"),
            }
        }
        Ok(predictions)
    }
}
