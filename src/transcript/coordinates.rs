//! Genomic position → spliced transcript index mapping.

use thiserror::Error;

use crate::strand::Strand;

use super::types::Exon;

/// Why a genomic position has no index in the (coding) transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Unmapped {
    #[error("transcript has no exons")]
    NoExons,
    #[error("position precedes the first exon")]
    BeforeFirstExon,
    #[error("position follows the last exon")]
    AfterLastExon,
    #[error("position is intronic")]
    Intron,
    #[error("position is in the 5' UTR")]
    FivePrimeUtr,
    #[error("transcript has no translation start")]
    NoTranslationStart,
}

/// Exons sorted by genomic start, then end.
#[must_use]
pub fn sorted_exons(exons: &[Exon]) -> Vec<&Exon> {
    let mut sorted: Vec<&Exon> = exons.iter().collect();
    sorted.sort_by_key(|e| (e.genomic_start, e.genomic_end));
    sorted
}

/// Exons in transcript (5'→3') order: ascending on the forward strand, descending on reverse.
fn transcript_order(exons: &[Exon], strand: Strand) -> Vec<&Exon> {
    let mut sorted = sorted_exons(exons);
    if strand.is_reverse() {
        sorted.reverse();
    }
    sorted
}

/// Map a 1-based genomic position to a 0-based index in the spliced transcript.
///
/// With `skip_utr` the index is relative to the start of the coding sequence.
/// `cds_start_phase` is added last so the result indexes a CDS that carries
/// `phase` padding bases in front of its first codon.
pub fn transcript_index(
    position: u32,
    exons: &[Exon],
    strand: Strand,
    cds_start_phase: u8,
    skip_utr: bool,
) -> Result<usize, Unmapped> {
    if exons.is_empty() {
        return Err(Unmapped::NoExons);
    }

    let mut offset = 0usize;
    let mut found = None;
    for exon in sorted_exons(exons) {
        if position > exon.genomic_end {
            offset += exon.length();
        } else if exon.contains(position) {
            found = Some(offset + (position - exon.genomic_start) as usize);
            break;
        } else if offset == 0 {
            return Err(Unmapped::BeforeFirstExon);
        } else {
            return Err(Unmapped::Intron);
        }
    }
    let mut idx = found.ok_or(Unmapped::AfterLastExon)?;

    if strand.is_reverse() {
        let total: usize = exons.iter().map(Exon::length).sum();
        idx = total - idx - 1;
    }

    if skip_utr {
        let utr = five_prime_utr_length(exons, strand).ok_or(Unmapped::NoTranslationStart)?;
        idx = idx.checked_sub(utr).ok_or(Unmapped::FivePrimeUtr)?;
    }

    Ok(idx + usize::from(cds_start_phase))
}

/// Bases before the first coding base, in transcript orientation.
///
/// `None` when no exon carries a translation start.
#[must_use]
pub fn five_prime_utr_length(exons: &[Exon], strand: Strand) -> Option<usize> {
    let mut length = 0;
    for exon in transcript_order(exons, strand) {
        match exon.translation_start {
            Some(seq_start) => return Some(length + seq_start.saturating_sub(1) as usize),
            None => length += exon.length(),
        }
    }
    None
}

/// Bases after the last coding base, in transcript orientation.
///
/// `None` when no exon carries a translation end.
#[must_use]
pub fn three_prime_utr_length(exons: &[Exon], strand: Strand) -> Option<usize> {
    let mut length = 0;
    for exon in transcript_order(exons, strand).into_iter().rev() {
        match exon.translation_end {
            Some(seq_end) => {
                return Some(length + exon.length().saturating_sub(seq_end as usize));
            }
            None => length += exon.length(),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interval_exons() -> Vec<Exon> {
        // stored out of order on purpose
        [(35, 45), (7, 13), (60, 70), (17, 19), (47, 50), (21, 24)]
            .iter()
            .enumerate()
            .map(|(i, &(s, e))| Exon::new(&format!("e{i}"), s, e))
            .collect()
    }

    fn cdna(position: u32, strand: Strand) -> Option<usize> {
        transcript_index(position, &interval_exons(), strand, 0, false).ok()
    }

    #[test]
    fn interval_walk() {
        assert_eq!(cdna(7, Strand::Forward), Some(0));
        assert_eq!(cdna(13, Strand::Forward), Some(6));
        assert_eq!(cdna(12, Strand::Forward), Some(5));
        assert_eq!(cdna(14, Strand::Forward), None);
        assert_eq!(cdna(17, Strand::Forward), Some(7));
        assert_eq!(cdna(18, Strand::Forward), Some(8));
        assert_eq!(cdna(23, Strand::Forward), Some(12));
        assert_eq!(cdna(51, Strand::Forward), None);
    }

    #[test]
    fn unmapped_reasons() {
        let exons = interval_exons();
        let map = |p| transcript_index(p, &exons, Strand::Forward, 0, false);
        assert_eq!(map(3), Err(Unmapped::BeforeFirstExon));
        assert_eq!(map(14), Err(Unmapped::Intron));
        assert_eq!(map(71), Err(Unmapped::AfterLastExon));
        assert_eq!(
            transcript_index(10, &[], Strand::Forward, 0, false),
            Err(Unmapped::NoExons)
        );
        assert_eq!(
            transcript_index(10, &exons, Strand::Forward, 0, true),
            Err(Unmapped::NoTranslationStart)
        );
    }

    #[test]
    fn reverse_strand_mirrors_index() {
        let total: usize = interval_exons().iter().map(Exon::length).sum();
        for position in 0..80 {
            match cdna(position, Strand::Forward) {
                Some(idx) => assert_eq!(cdna(position, Strand::Reverse), Some(total - idx - 1)),
                None => assert_eq!(cdna(position, Strand::Reverse), None),
            }
        }
    }

    #[test]
    fn overlapping_exons_first_match_wins() {
        let exons = vec![Exon::new("b", 10, 20), Exon::new("a", 10, 15)];
        // sorted order puts (10, 15) first
        assert_eq!(
            transcript_index(12, &exons, Strand::Forward, 0, false),
            Ok(2)
        );
    }

    fn coding_exons(strand: Strand) -> Vec<Exon> {
        let mut exons = vec![
            Exon::new("e1", 10, 19),
            Exon::new("e2", 30, 39),
            Exon::new("e3", 50, 59),
        ];
        match strand {
            Strand::Forward => {
                exons[1].translation_start = Some(3);
                exons[2].translation_end = Some(5);
            }
            Strand::Reverse => {
                exons[2].translation_start = Some(2);
                exons[0].translation_end = Some(4);
            }
        }
        exons
    }

    #[test]
    fn utr_lengths_forward() {
        let exons = coding_exons(Strand::Forward);
        assert_eq!(five_prime_utr_length(&exons, Strand::Forward), Some(12));
        assert_eq!(three_prime_utr_length(&exons, Strand::Forward), Some(5));
    }

    #[test]
    fn utr_lengths_reverse() {
        let exons = coding_exons(Strand::Reverse);
        assert_eq!(five_prime_utr_length(&exons, Strand::Reverse), Some(1));
        assert_eq!(three_prime_utr_length(&exons, Strand::Reverse), Some(6));
    }

    #[test]
    fn coding_index_skips_utr() {
        let exons = coding_exons(Strand::Forward);
        assert_eq!(transcript_index(32, &exons, Strand::Forward, 0, true), Ok(0));
        assert_eq!(transcript_index(35, &exons, Strand::Forward, 0, true), Ok(3));
        assert_eq!(transcript_index(50, &exons, Strand::Forward, 0, true), Ok(8));
        assert_eq!(
            transcript_index(31, &exons, Strand::Forward, 0, true),
            Err(Unmapped::FivePrimeUtr)
        );
    }

    #[test]
    fn coding_index_reverse_strand() {
        let exons = coding_exons(Strand::Reverse);
        assert_eq!(transcript_index(58, &exons, Strand::Reverse, 0, true), Ok(0));
        assert_eq!(transcript_index(50, &exons, Strand::Reverse, 0, true), Ok(8));
        assert_eq!(transcript_index(39, &exons, Strand::Reverse, 0, true), Ok(9));
        assert_eq!(
            transcript_index(59, &exons, Strand::Reverse, 0, true),
            Err(Unmapped::FivePrimeUtr)
        );
    }

    #[test]
    fn phase_added_last() {
        let exons = coding_exons(Strand::Forward);
        assert_eq!(transcript_index(32, &exons, Strand::Forward, 2, true), Ok(2));
        assert_eq!(
            transcript_index(31, &exons, Strand::Forward, 2, true),
            Err(Unmapped::FivePrimeUtr)
        );
    }
}
