//! Genomic variants as read from VCF input.

use std::fmt;

use serde::Serialize;

use crate::chromosome::normalize_chromosome_name;

/// A single reference → alternate change at a 1-based genomic position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GenomicVariant {
    pub chromosome: String,
    pub position: u32,
    pub id: Option<String>,
    pub reference: String,
    pub alternate: String,
}

impl GenomicVariant {
    /// Build a variant with normalised chromosome and upper-cased alleles.
    /// `-` and `.` alleles are treated as empty.
    #[must_use]
    pub fn new(chromosome: &str, position: u32, reference: &str, alternate: &str) -> Self {
        Self {
            chromosome: normalize_chromosome_name(chromosome),
            position,
            id: None,
            reference: normalize_allele(reference),
            alternate: normalize_allele(alternate),
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: Option<String>) -> Self {
        self.id = id;
        self
    }

    /// A variant whose alleles agree changes nothing and is never reported as a peptide.
    #[must_use]
    pub fn is_no_op(&self) -> bool {
        self.reference == self.alternate
    }

    /// HGVS-like genomic description, e.g. `chr3 g.41275636G>A`.
    #[must_use]
    pub fn description(&self) -> String {
        let change = if self.reference.is_empty() {
            format!("g.{}ins{}", self.position, self.alternate)
        } else if self.alternate.is_empty() {
            format!("g.{}del{}", self.position, self.reference)
        } else {
            format!("g.{}{}>{}", self.position, self.reference, self.alternate)
        };
        format!("chr{} {change}", self.chromosome)
    }
}

impl fmt::Display for GenomicVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

/// Upper-case an allele, reading `-` and `.` as empty.
pub(crate) fn normalize_allele(allele: &str) -> String {
    let trimmed = allele.trim();
    if trimmed == "-" || trimmed == "." {
        String::new()
    } else {
        trimmed.to_ascii_uppercase()
    }
}
