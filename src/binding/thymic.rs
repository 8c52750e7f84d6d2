//! Thymic deletion: epitopes whose TCR-facing core matches a self peptide.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::Error;

use super::Epitope;

/// Core of a peptide: third residue up to, not including, the last one.
fn core(peptide: &str) -> Option<&str> {
    if peptide.len() < 4 {
        return None;
    }
    peptide.get(2..peptide.len() - 1)
}

/// Set of self-peptide cores presumed tolerated by the immune system.
#[derive(Debug, Default)]
pub struct ThymicDeletionFilter {
    cores: HashSet<String>,
}

impl ThymicDeletionFilter {
    pub fn from_peptides<I, S>(peptides: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let cores = peptides
            .into_iter()
            .filter_map(|p| core(&p.as_ref().trim().to_ascii_uppercase()).map(str::to_string))
            .collect();
        Self { cores }
    }

    /// One self peptide per line; blank lines and `#` comments are skipped.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        let mut peptides = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            peptides.push(trimmed.to_string());
        }
        Ok(Self::from_peptides(peptides))
    }

    pub fn from_file(path: &Path) -> Result<Self, Error> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    #[must_use]
    pub fn is_deleted(&self, epitope: &str) -> bool {
        core(epitope).is_some_and(|c| self.cores.contains(c))
    }

    /// Flag matching epitopes; returns how many were flagged.
    pub fn mark(&self, epitopes: &mut [Epitope]) -> usize {
        let mut flagged = 0;
        for epitope in epitopes.iter_mut() {
            if self.is_deleted(&epitope.sequence) {
                epitope.thymically_deleted = true;
                flagged += 1;
            }
        }
        flagged
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cores.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cores.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn core_match_ignores_anchor_residues() {
        let filter = ThymicDeletionFilter::from_peptides(["SIINFEKLV"]);
        // same core INFEKL, different anchors
        assert!(filter.is_deleted("AAINFEKLY"));
        assert!(!filter.is_deleted("SIINFEKAV"));
        assert!(!filter.is_deleted("SII"));
    }

    #[test]
    fn marks_epitopes() {
        let filter =
            ThymicDeletionFilter::from_reader(Cursor::new("# self\nsiinfeklv\n\nGILGFVFTL\n"))
                .unwrap();
        assert_eq!(filter.len(), 2);
        let mut epitopes = vec![Epitope::new("TTINFEKLT", 0), Epitope::new("NLVPMVATV", 1)];
        assert_eq!(filter.mark(&mut epitopes), 1);
        assert!(epitopes[0].thymically_deleted);
        assert!(!epitopes[1].thymically_deleted);
    }
}
