//! Applies variants to reference transcripts and cuts a padded mutant
//! amino-acid window around the change.

use std::borrow::Cow;

use serde::Serialize;

use crate::codon::{CodonTable, first_invalid_residue, reverse_complement};
use crate::error::{Error, VariantError};
use crate::sequence::SequenceProvider;
use crate::transcript::{
    Transcript, TranscriptProvider, Unmapped, five_prime_utr_length, three_prime_utr_length,
    transcript_index,
};
use crate::variant::{GenomicVariant, normalize_allele};

/// Window shaping for mutant peptides, in amino acids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationOptions {
    /// Wildtype residues kept on each side of the mutated span.
    pub padding: usize,
    /// Upper bound on the window length.
    pub max_length: Option<usize>,
    /// Shorter windows are rejected.
    pub min_length: usize,
}

impl Default for MutationOptions {
    fn default() -> Self {
        Self {
            padding: 30,
            max_length: None,
            min_length: 9,
        }
    }
}

/// A mutant amino-acid window with the mutated residues located inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutatedRegion {
    pub transcript_id: String,
    pub gene_name: String,
    /// Genomic description of the source variant, empty for literal peptides.
    pub variant: String,
    pub annotation: String,
    pub sequence: String,
    /// Half-open offsets of the mutated residues within `sequence`.
    pub mutation_start: usize,
    pub mutation_end: usize,
    /// Residues inserted (positive) or deleted (negative) by an in-frame change.
    pub residue_delta: isize,
}

impl MutatedRegion {
    #[must_use]
    pub fn mutated_residues(&self) -> &str {
        &self.sequence[self.mutation_start..self.mutation_end]
    }
}

/// Absolute window bounds plus mutated span, in residues of the mutant protein.
struct Window {
    lo: usize,
    hi: usize,
    mutation_start: usize,
    mutation_end: usize,
}

impl Window {
    fn padded(mutation_start: usize, mutation_end: usize, limit: usize, padding: usize) -> Self {
        Self {
            lo: mutation_start.saturating_sub(padding),
            hi: limit.min(mutation_end + padding),
            mutation_start,
            mutation_end,
        }
    }

    /// Shrink to `max_length`, cutting the longer flank first and then both evenly.
    fn cap(mut self, max_length: Option<usize>) -> Self {
        let Some(max_length) = max_length else {
            return self;
        };
        let mut left = self.mutation_start - self.lo;
        let mut right = self.hi - self.mutation_end;
        let mut excess = (self.hi - self.lo).saturating_sub(max_length);
        while excess > 0 && left + right > 0 {
            if left >= right {
                left -= 1;
            } else {
                right -= 1;
            }
            excess -= 1;
        }
        self.lo = self.mutation_start - left;
        self.hi = self.mutation_end + right - excess;
        self.mutation_end = self.mutation_end.min(self.hi);
        self
    }
}

/// Applies nucleotide and protein variants against injected reference data.
pub struct MutationApplicator<'a, R: ?Sized> {
    reference: &'a R,
    options: MutationOptions,
}

impl<'a, R> MutationApplicator<'a, R>
where
    R: TranscriptProvider + SequenceProvider + ?Sized,
{
    pub fn new(reference: &'a R, options: MutationOptions) -> Self {
        Self { reference, options }
    }

    #[must_use]
    pub fn options(&self) -> &MutationOptions {
        &self.options
    }

    /// Apply a genomic `ref`→`alt` change at a 1-based position to one transcript.
    ///
    /// Alleles are given on the forward genomic strand. An empty `ref`
    /// inserts `alt` after `position`.
    pub fn apply_point_mutation(
        &self,
        transcript_id: &str,
        position: u32,
        reference_allele: &str,
        alternate_allele: &str,
    ) -> Result<MutatedRegion, VariantError> {
        let mut ref_nt = normalize_allele(reference_allele).into_bytes();
        let mut alt_nt = normalize_allele(alternate_allele).into_bytes();
        if ref_nt == alt_nt {
            return Err(VariantError::NoVariant);
        }

        // VCF anchors indels on a shared leading base; drop it so only the
        // changed bases are spliced. A pure insertion stays after its anchor.
        let shared = ref_nt
            .iter()
            .zip(&alt_nt)
            .take_while(|(r, a)| r == a)
            .count();
        let edit_position = if shared == ref_nt.len() {
            position + shared as u32 - u32::from(shared > 0)
        } else {
            position + shared as u32
        };
        ref_nt.drain(..shared);
        alt_nt.drain(..shared);

        let transcript = self.reference.transcript(transcript_id)?;
        let strand = transcript.strand;
        if strand.is_reverse() {
            ref_nt = reverse_complement(&ref_nt);
            alt_nt = reverse_complement(&alt_nt);
        }

        let coordinate_error = |reason: String| VariantError::Coordinate {
            transcript_id: transcript_id.to_string(),
            position,
            reason,
        };

        // The first transcript-orientation base of `ref` is its last genomic
        // base on the reverse strand.
        let (lookup, insertion_shift) = match (ref_nt.is_empty(), strand.is_reverse()) {
            (false, false) => (edit_position, 0),
            (false, true) => (edit_position + ref_nt.len() as u32 - 1, 0),
            (true, false) => (edit_position, 1),
            (true, true) => (edit_position, 0),
        };
        let idx = transcript_index(
            lookup,
            &transcript.exons,
            strand,
            transcript.cds_start_phase,
            true,
        )
        .map_err(|e| match e {
            Unmapped::NoExons => VariantError::NoExons(transcript_id.to_string()),
            e => coordinate_error(e.to_string()),
        })?
            + insertion_shift;

        let cds = self.coding_sequence(transcript)?;
        if idx + ref_nt.len() > cds.len() {
            return Err(coordinate_error("position is in the 3' UTR".to_string()));
        }
        let found = cds.get(idx..idx + ref_nt.len());
        if found != Some(ref_nt.as_slice()) {
            return Err(VariantError::ReferenceMismatch {
                transcript_id: transcript_id.to_string(),
                index: idx,
                expected: String::from_utf8_lossy(&ref_nt).into_owned(),
                found: found
                    .map(|f| String::from_utf8_lossy(f).into_owned())
                    .unwrap_or_default(),
            });
        }

        let table = CodonTable::for_chromosome(&transcript.chromosome);
        let mut region = self.mutate_coding_sequence(
            transcript,
            &table,
            &cds,
            idx,
            ref_nt.len(),
            &alt_nt,
        )
        .map_err(|e| match e {
            MutateError::OutsideCoding => {
                coordinate_error("outside the coding region".to_string())
            }
            MutateError::Variant(e) => e,
        })?;
        region.variant = GenomicVariant::new(
            &transcript.chromosome,
            position,
            reference_allele,
            alternate_allele,
        )
        .description();
        Ok(region)
    }

    /// Apply an amino-acid substitution at a 1-based residue position.
    ///
    /// Checks against the reference protein, or the translated CDS when no
    /// protein entry exists.
    pub fn apply_protein_mutation(
        &self,
        transcript_id: &str,
        position: usize,
        reference_residues: &str,
        alternate_residues: &str,
    ) -> Result<MutatedRegion, VariantError> {
        let ref_aa = reference_residues.to_ascii_uppercase().into_bytes();
        let alt_aa = alternate_residues.to_ascii_uppercase().into_bytes();
        if ref_aa == alt_aa {
            return Err(VariantError::NoVariant);
        }

        let transcript = self.reference.transcript(transcript_id)?;
        let protein: Cow<'_, [u8]> = match self.reference.protein(transcript_id) {
            Some(protein) => Cow::Borrowed(protein),
            None => {
                let cds = self.coding_sequence(transcript).map_err(|_| {
                    VariantError::MissingSequence {
                        transcript_id: transcript_id.to_string(),
                        kind: "protein",
                    }
                })?;
                let table = CodonTable::for_chromosome(&transcript.chromosome);
                let mut translated = table.translate(&cds);
                if translated.last() == Some(&b'*') {
                    translated.pop();
                }
                Cow::Owned(translated)
            }
        };

        let idx = position.checked_sub(1).ok_or_else(|| VariantError::Coordinate {
            transcript_id: transcript_id.to_string(),
            position: 0,
            reason: "residue positions are 1-based".to_string(),
        })?;
        let found = protein.get(idx..idx + ref_aa.len());
        if found != Some(ref_aa.as_slice()) {
            return Err(VariantError::ReferenceMismatch {
                transcript_id: transcript_id.to_string(),
                index: idx,
                expected: String::from_utf8_lossy(&ref_aa).into_owned(),
                found: found
                    .map(|f| String::from_utf8_lossy(f).into_owned())
                    .unwrap_or_default(),
            });
        }

        let mut mutant = protein[..idx].to_vec();
        mutant.extend_from_slice(&alt_aa);
        mutant.extend_from_slice(&protein[idx + ref_aa.len()..]);

        let mutation_end = (idx + alt_aa.len().max(1)).min(mutant.len());
        let window = Window::padded(idx, mutation_end, mutant.len(), self.options.padding)
            .cap(self.options.max_length);
        let new_residues = String::from_utf8_lossy(&alt_aa).into_owned();
        let annotation = format!(
            "{}{position}{}",
            String::from_utf8_lossy(&ref_aa),
            if new_residues.is_empty() { "del" } else { &new_residues }
        );
        let residue_delta = alt_aa.len() as isize - ref_aa.len() as isize;
        let mut region = self.finish(
            transcript,
            mutant[window.lo..window.hi].to_vec(),
            &window,
            annotation,
            residue_delta,
        )?;
        region.variant = format!("p.{}", region.annotation);
        Ok(region)
    }

    /// CDS for the transcript, derived from the cDNA when no CDS entry exists.
    fn coding_sequence(&self, transcript: &Transcript) -> Result<Cow<'a, [u8]>, VariantError> {
        let reference = self.reference;
        if let Some(cds) = reference.cds(&transcript.id) {
            return Ok(Cow::Borrowed(cds));
        }
        let missing = || VariantError::MissingSequence {
            transcript_id: transcript.id.clone(),
            kind: "CDS",
        };
        let cdna = reference.cdna(&transcript.id).ok_or_else(missing)?;
        let utr5 = five_prime_utr_length(&transcript.exons, transcript.strand).ok_or_else(missing)?;
        let utr3 = three_prime_utr_length(&transcript.exons, transcript.strand).unwrap_or(0);
        let end = cdna.len().saturating_sub(utr3);
        if utr5 >= end {
            return Err(missing());
        }
        let mut cds = vec![b'N'; usize::from(transcript.cds_start_phase)];
        cds.extend_from_slice(&cdna[utr5..end]);
        Ok(Cow::Owned(cds))
    }

    fn mutate_coding_sequence(
        &self,
        transcript: &Transcript,
        table: &CodonTable,
        cds: &[u8],
        idx: usize,
        ref_len: usize,
        alt: &[u8],
    ) -> Result<MutatedRegion, MutateError> {
        let mut mutant = Vec::with_capacity(cds.len() + alt.len());
        mutant.extend_from_slice(&cds[..idx]);
        mutant.extend_from_slice(alt);
        mutant.extend_from_slice(&cds[idx + ref_len..]);

        // Drop the native stop codon unless the edit touches it.
        let total_codons = cds.len() / 3;
        let mut coding_nt = total_codons * 3;
        if total_codons > 0
            && table.is_stop(&cds[coding_nt - 3..coding_nt])
            && idx + ref_len <= coding_nt - 3
        {
            coding_nt -= 3;
        }
        let mutant_coding_nt = if idx + ref_len <= coding_nt {
            coding_nt - ref_len + alt.len()
        } else {
            mutant.len()
        };
        let mutant_codons = mutant_coding_nt / 3;

        let aa_start = idx / 3;
        let ref_end = ((idx + ref_len + 2) / 3).max(aa_start + 1).min(total_codons);
        let ref_residues = String::from_utf8_lossy(&table.translate(&cds[aa_start * 3..ref_end * 3]))
            .into_owned();
        let position = aa_start + 1;

        if (alt.len() as isize - ref_len as isize) % 3 != 0 {
            let tail: Vec<u8> = table
                .translate(&mutant[aa_start * 3..])
                .into_iter()
                .take_while(|&aa| aa != b'*')
                .collect();
            if tail.is_empty() {
                return Err(MutateError::Variant(VariantError::PrematureStop {
                    transcript_id: transcript.id.clone(),
                    peptide: "*".to_string(),
                }));
            }
            let aa_end = aa_start + tail.len();
            let window = Window {
                lo: aa_start.saturating_sub(self.options.padding),
                hi: aa_end,
                mutation_start: aa_start,
                mutation_end: aa_end,
            }
            .cap(self.options.max_length);
            let residues = table.translate(&mutant[window.lo * 3..window.hi * 3]);
            return Ok(self.finish(
                transcript,
                residues,
                &window,
                format!("{ref_residues}{position}fs"),
                0,
            )?);
        }

        let aa_end = if ref_len == alt.len() {
            (idx + alt.len() - 1) / 3 + 1
        } else {
            ((idx + alt.len() + 2) / 3).max(aa_start + 1)
        }
        .min(mutant_codons);
        if aa_start >= aa_end {
            return Err(MutateError::OutsideCoding);
        }

        let new_residues =
            String::from_utf8_lossy(&table.translate(&mutant[aa_start * 3..aa_end * 3]))
                .into_owned();
        let annotation = if ref_len == alt.len() {
            if new_residues == ref_residues {
                return Err(MutateError::Variant(VariantError::Synonymous {
                    transcript_id: transcript.id.clone(),
                    annotation: format!("{ref_residues}{position}{new_residues}"),
                }));
            }
            format!("{ref_residues}{position}{new_residues}")
        } else if alt.len() < ref_len {
            format!("{ref_residues}{position}del")
        } else {
            format!("{ref_residues}{position}ins{new_residues}")
        };

        let window = Window::padded(aa_start, aa_end, mutant_codons, self.options.padding)
            .cap(self.options.max_length);
        let residues = table.translate(&mutant[window.lo * 3..window.hi * 3]);
        let residue_delta = (alt.len() as isize - ref_len as isize) / 3;
        Ok(self.finish(transcript, residues, &window, annotation, residue_delta)?)
    }

    /// Validate the translated window and wrap it in a region record.
    fn finish(
        &self,
        transcript: &Transcript,
        residues: Vec<u8>,
        window: &Window,
        annotation: String,
        residue_delta: isize,
    ) -> Result<MutatedRegion, VariantError> {
        let peptide = String::from_utf8_lossy(&residues).into_owned();
        if residues.contains(&b'*') {
            return Err(VariantError::PrematureStop {
                transcript_id: transcript.id.clone(),
                peptide,
            });
        }
        if let Some(residue) = first_invalid_residue(&residues) {
            return Err(VariantError::InvalidResidue {
                transcript_id: transcript.id.clone(),
                residue: char::from(residue),
                peptide,
            });
        }
        if residues.len() < self.options.min_length {
            return Err(VariantError::TooShort {
                transcript_id: transcript.id.clone(),
                length: residues.len(),
                min_length: self.options.min_length,
            });
        }
        Ok(MutatedRegion {
            transcript_id: transcript.id.clone(),
            gene_name: transcript.gene_name.clone(),
            variant: String::new(),
            annotation,
            sequence: peptide,
            mutation_start: window.mutation_start - window.lo,
            mutation_end: window.mutation_end - window.lo,
            residue_delta,
        })
    }
}

enum MutateError {
    OutsideCoding,
    Variant(VariantError),
}

impl From<VariantError> for MutateError {
    fn from(e: VariantError) -> Self {
        Self::Variant(e)
    }
}

/// Parse a single-residue protein change such as `p.V600E` or `V600E`.
///
/// Returns the 1-based position with the reference and alternate residues.
pub fn parse_protein_change(text: &str) -> Result<(usize, char, char), Error> {
    let malformed = || Error::Parse(format!("malformed protein change: '{text}'"));
    let change = text.trim();
    let change = change.strip_prefix("p.").unwrap_or(change);
    let mut chars = change.chars();
    let reference = chars.next().ok_or_else(malformed)?.to_ascii_uppercase();
    let alternate = chars.next_back().ok_or_else(malformed)?.to_ascii_uppercase();
    let position: usize = chars.as_str().parse().map_err(|_| malformed())?;
    if position == 0
        || !reference.is_ascii_alphabetic()
        || !(alternate.is_ascii_alphabetic() || alternate == '*')
    {
        return Err(malformed());
    }
    Ok((position, reference, alternate))
}

/// Parse a literal mutant peptide using underscore notation.
///
/// `QLSQ_Y_QQ` marks `Y` as mutated, `QLSQ_YQQ` marks everything after the
/// underscore, and a peptide without underscores is mutated throughout.
pub fn parse_mutated_peptide(text: &str) -> Result<MutatedRegion, Error> {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    let parts: Vec<&str> = cleaned.split('_').collect();
    let (sequence, mutation_start, mutation_end) = match parts.as_slice() {
        [all] => (all.to_string(), 0, all.len()),
        [before, after] => (
            format!("{before}{after}"),
            before.len(),
            before.len() + after.len(),
        ),
        [before, mutated, after] => (
            format!("{before}{mutated}{after}"),
            before.len(),
            before.len() + mutated.len(),
        ),
        _ => {
            return Err(Error::Parse(format!(
                "too many underscores in mutated peptide: '{text}'"
            )));
        }
    };
    if sequence.is_empty() {
        return Err(Error::Parse("empty mutated peptide".to_string()));
    }
    if let Some(residue) = first_invalid_residue(sequence.as_bytes()) {
        return Err(Error::Parse(format!(
            "invalid residue '{}' in mutated peptide '{text}'",
            char::from(residue)
        )));
    }
    Ok(MutatedRegion {
        transcript_id: String::new(),
        gene_name: String::new(),
        variant: String::new(),
        annotation: cleaned.clone(),
        sequence,
        mutation_start,
        mutation_end,
        residue_delta: 0,
    })
}
