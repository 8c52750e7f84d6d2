//! Vaccine peptide selection: a sliding-window search over each mutant
//! source sequence, ranked by the binding evidence of mutant epitopes.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use serde::Serialize;

use crate::binding::Epitope;
use crate::error::Error;
use crate::mutation::MutatedRegion;
use crate::scoring::EpitopeScorer;

/// One fixed-length window of a source sequence with its ranking quantities.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VaccinePeptideCandidate {
    pub peptide: String,
    /// Window offsets within the source sequence.
    pub start: usize,
    pub end: usize,
    /// Mutation offsets re-based into the window and clamped to it.
    pub mutation_start: usize,
    pub mutation_end: usize,
    pub mutant_score: f64,
    pub wildtype_score: f64,
    pub num_mutant_residues: usize,
    pub mutation_distance_from_edge: usize,
}

/// Mutant epitopes overlap the mutated span and are not thymically deleted.
#[must_use]
pub fn is_mutant_epitope(epitope: &Epitope, mutation_start: usize, mutation_end: usize) -> bool {
    epitope.overlaps(mutation_start, mutation_end) && !epitope.thymically_deleted
}

/// Valid window starts: inside the padding where possible, widened so a
/// window can always cover the whole mutation.
fn candidate_starts(
    length: usize,
    result_length: usize,
    padding: usize,
    mutation_start: usize,
    mutation_end: usize,
) -> RangeInclusive<usize> {
    if length <= result_length {
        return 0..=0;
    }
    let last = length - result_length;
    let (mut lo, mut hi) = if length < result_length + 2 * padding {
        let slack = length - result_length;
        (slack / 2, slack / 2 + slack % 2)
    } else {
        (padding, last - padding)
    };

    let covering_hi = mutation_start.min(last);
    let covering_lo = mutation_end
        .saturating_sub(result_length)
        .min(last)
        .min(covering_hi);
    if hi < covering_lo {
        hi = covering_lo;
    }
    if lo > covering_hi {
        lo = covering_hi;
    }
    lo..=hi
}

/// Ranking: mutant score, then fewer wildtype epitopes, then more mutated
/// residues covered, then the mutation further from the window edge.
fn rank(a: &VaccinePeptideCandidate, b: &VaccinePeptideCandidate) -> Ordering {
    b.mutant_score
        .total_cmp(&a.mutant_score)
        .then(a.wildtype_score.total_cmp(&b.wildtype_score))
        .then(b.num_mutant_residues.cmp(&a.num_mutant_residues))
        .then(
            b.mutation_distance_from_edge
                .cmp(&a.mutation_distance_from_edge),
        )
}

/// Every candidate window of `source`, best first.
pub fn generate_candidate_vaccine_peptides(
    source: &str,
    mutation_start: usize,
    mutation_end: usize,
    epitopes: &[Epitope],
    scorer: &EpitopeScorer,
    result_length: usize,
    padding: usize,
) -> Result<Vec<VaccinePeptideCandidate>, Error> {
    let n = source.len();
    if n == 0 || result_length == 0 {
        return Err(Error::Validation(
            "source sequence and vaccine peptide length must be non-empty".to_string(),
        ));
    }
    if mutation_start > mutation_end || mutation_end > n {
        return Err(Error::Validation(format!(
            "mutation {mutation_start}..{mutation_end} outside source sequence of length {n}"
        )));
    }

    let scored: Vec<(&Epitope, f64, bool)> = epitopes
        .iter()
        .map(|e| {
            (
                e,
                scorer.epitope_score(e),
                is_mutant_epitope(e, mutation_start, mutation_end),
            )
        })
        .collect();

    let window_length = result_length.min(n);
    let mut candidates: Vec<VaccinePeptideCandidate> =
        candidate_starts(n, result_length, padding, mutation_start, mutation_end)
            .map(|start| {
                let end = start + window_length;
                let mut mutant_score = 0.0;
                let mut wildtype_score = 0.0;
                for &(epitope, score, mutant) in &scored {
                    if !epitope.overlaps(start, end) {
                        continue;
                    }
                    if mutant {
                        mutant_score += score;
                    } else {
                        wildtype_score += score;
                    }
                }

                let covered_start = mutation_start.max(start);
                let covered_end = mutation_end.min(end);
                let num_mutant_residues = covered_end.saturating_sub(covered_start);
                let mutation_distance_from_edge = if num_mutant_residues > 0 {
                    mutation_start
                        .saturating_sub(start)
                        .min(end.saturating_sub(mutation_end))
                } else {
                    0
                };

                VaccinePeptideCandidate {
                    peptide: source[start..end].to_string(),
                    start,
                    end,
                    mutation_start: mutation_start.saturating_sub(start).min(window_length),
                    mutation_end: mutation_end.saturating_sub(start).min(window_length),
                    mutant_score,
                    wildtype_score,
                    num_mutant_residues,
                    mutation_distance_from_edge,
                }
            })
            .collect();

    candidates.sort_by(rank);
    Ok(candidates)
}

/// The best window of `source` for a vaccine peptide.
pub fn select_vaccine_peptide(
    source: &str,
    mutation_start: usize,
    mutation_end: usize,
    epitopes: &[Epitope],
    scorer: &EpitopeScorer,
    result_length: usize,
    padding: usize,
) -> Result<VaccinePeptideCandidate, Error> {
    generate_candidate_vaccine_peptides(
        source,
        mutation_start,
        mutation_end,
        epitopes,
        scorer,
        result_length,
        padding,
    )?
    .into_iter()
    .next()
    .ok_or_else(|| Error::Validation(format!("no candidate windows for {source}")))
}

/// A selected vaccine peptide together with the mutation it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VaccinePeptideRecord {
    pub gene_name: String,
    pub transcript_id: String,
    pub variant: String,
    pub annotation: String,
    pub source_sequence: String,
    #[serde(flatten)]
    pub candidate: VaccinePeptideCandidate,
}

/// Select one vaccine peptide per region, sorted by mutant epitope score
/// (highest first, ties keep input order).
pub fn select_vaccine_peptides(
    regions: &[MutatedRegion],
    epitopes_by_source: &BTreeMap<String, Vec<Epitope>>,
    scorer: &EpitopeScorer,
    result_length: usize,
    padding: usize,
) -> Result<Vec<VaccinePeptideRecord>, Error> {
    let mut records = Vec::with_capacity(regions.len());
    for region in regions {
        let epitopes = epitopes_by_source
            .get(&region.sequence)
            .map_or(&[][..], Vec::as_slice);
        if epitopes.is_empty() {
            log::debug!("no epitopes predicted for {}", region.sequence);
        }
        let candidate = select_vaccine_peptide(
            &region.sequence,
            region.mutation_start,
            region.mutation_end,
            epitopes,
            scorer,
            result_length,
            padding,
        )?;
        records.push(VaccinePeptideRecord {
            gene_name: region.gene_name.clone(),
            transcript_id: region.transcript_id.clone(),
            variant: region.variant.clone(),
            annotation: region.annotation.clone(),
            source_sequence: region.sequence.clone(),
            candidate,
        });
    }
    records.sort_by(|a, b| b.candidate.mutant_score.total_cmp(&a.candidate.mutant_score));
    Ok(records)
}
