//! Binding-affinity predictions and their grouping into epitopes.

pub mod random;
pub mod table;
pub mod thymic;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::Error;

pub use random::RandomBindingPredictor;
pub use table::PrecomputedBindings;
pub use thymic::ThymicDeletionFilter;

/// One row of a binding predictor's output.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingPrediction {
    pub source_sequence: String,
    pub epitope: String,
    /// Half-open offsets of the epitope within the source sequence.
    pub epitope_start: usize,
    pub epitope_end: usize,
    pub allele: String,
    pub ic50: f64,
    pub percentile_rank: f64,
}

impl BindingPrediction {
    /// Reject rows no predictor can legitimately produce.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.ic50.is_finite() || self.ic50 < 0.0 {
            return Err(Error::Validation(format!(
                "invalid IC50 {} for {} / {}",
                self.ic50, self.epitope, self.allele
            )));
        }
        if !(0.0..=100.0).contains(&self.percentile_rank) {
            return Err(Error::Validation(format!(
                "invalid percentile rank {} for {} / {}",
                self.percentile_rank, self.epitope, self.allele
            )));
        }
        if self.epitope_end <= self.epitope_start
            || self.epitope_end - self.epitope_start != self.epitope.len()
            || self.source_sequence.get(self.epitope_start..self.epitope_end)
                != Some(self.epitope.as_str())
        {
            return Err(Error::Validation(format!(
                "epitope {} does not occur at {}..{} of {}",
                self.epitope, self.epitope_start, self.epitope_end, self.source_sequence
            )));
        }
        Ok(())
    }
}

/// Produces binding predictions for every epitope of the given sequences.
pub trait BindingPredictor {
    fn predict(
        &self,
        sequences: &[&str],
        alleles: &[String],
    ) -> Result<Vec<BindingPrediction>, Error>;
}

/// Binding of one epitope to one allele.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlleleBinding {
    pub allele: String,
    pub ic50: f64,
    pub percentile_rank: f64,
}

/// An epitope of a source sequence with its per-allele predictions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Epitope {
    pub sequence: String,
    pub start: usize,
    pub end: usize,
    pub bindings: Vec<AlleleBinding>,
    /// Matches a self peptide and is presumed tolerated.
    pub thymically_deleted: bool,
}

impl Epitope {
    #[must_use]
    pub fn new(sequence: &str, start: usize) -> Self {
        Self {
            sequence: sequence.to_string(),
            start,
            end: start + sequence.len(),
            bindings: Vec::new(),
            thymically_deleted: false,
        }
    }

    #[must_use]
    pub fn with_binding(mut self, allele: &str, ic50: f64, percentile_rank: f64) -> Self {
        self.bindings.push(AlleleBinding {
            allele: allele.to_string(),
            ic50,
            percentile_rank,
        });
        self
    }

    /// Half-open overlap test against `[start, end)`.
    #[must_use]
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }
}

/// Group prediction rows into epitopes per source sequence.
///
/// Rows are keyed by `(epitope, start, end)`; the first row for an allele
/// wins and repeats are logged. Epitopes come back ordered by start.
pub fn group_epitopes(predictions: Vec<BindingPrediction>) -> BTreeMap<String, Vec<Epitope>> {
    let mut grouped: BTreeMap<String, Vec<Epitope>> = BTreeMap::new();

    for row in predictions {
        let epitopes = grouped.entry(row.source_sequence).or_default();
        let position = epitopes.iter().position(|e| {
            e.start == row.epitope_start && e.end == row.epitope_end && e.sequence == row.epitope
        });
        let epitope = match position {
            Some(i) => &mut epitopes[i],
            None => {
                epitopes.push(Epitope {
                    sequence: row.epitope,
                    start: row.epitope_start,
                    end: row.epitope_end,
                    bindings: Vec::new(),
                    thymically_deleted: false,
                });
                let last = epitopes.len() - 1;
                &mut epitopes[last]
            }
        };
        if epitope.bindings.iter().any(|b| b.allele == row.allele) {
            log::warn!(
                "repeated prediction for epitope {} and allele {}, keeping the first",
                epitope.sequence,
                row.allele
            );
            continue;
        }
        epitope.bindings.push(AlleleBinding {
            allele: row.allele,
            ic50: row.ic50,
            percentile_rank: row.percentile_rank,
        });
    }

    for epitopes in grouped.values_mut() {
        epitopes.sort_by_key(|e| (e.start, e.end));
    }
    grouped
}
