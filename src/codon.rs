//! Nucleotide helpers: codon translation and reverse complement.

/// The 20 canonical amino acids.
pub const AMINO_ACIDS: &[u8; 20] = b"ACDEFGHIKLMNPQRSTVWY";

/// Standard genetic code, codons ordered AAA, AAC, AAG, AAT, ACA, ... TTT.
const STANDARD_CODE: &[u8; 64] =
    b"KNKNTTTTRSRSIIMIQHQHPPPPRRRRLLLLEDEDAAAAGGGGVVVV*Y*YSSSS*CWCLFLF";

/// Codon-to-residue lookup indexed by `first * 16 + second * 4 + third`
/// with A=0, C=1, G=2, T/U=3.
pub struct CodonTable {
    table: [u8; 64],
}

fn base_index(b: u8) -> Option<usize> {
    match b.to_ascii_uppercase() {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' | b'U' => Some(3),
        _ => None,
    }
}

impl CodonTable {
    #[must_use]
    pub fn standard() -> Self {
        Self {
            table: *STANDARD_CODE,
        }
    }

    /// Vertebrate mitochondrial code (NCBI table 2), used for chrM transcripts.
    #[must_use]
    pub fn mitochondrial() -> Self {
        let mut table = *STANDARD_CODE;
        table[56] = b'W'; // TGA
        table[8] = b'*'; // AGA
        table[10] = b'*'; // AGG
        table[12] = b'M'; // ATA
        Self { table }
    }

    /// Pick the table for a normalised chromosome name.
    #[must_use]
    pub fn for_chromosome(chromosome: &str) -> Self {
        if chromosome == "M" {
            Self::mitochondrial()
        } else {
            Self::standard()
        }
    }

    /// Translate one codon; anything containing an ambiguous base is `X`.
    #[must_use]
    pub fn translate_codon(&self, codon: &[u8]) -> u8 {
        match codon {
            [a, b, c, ..] => match (base_index(*a), base_index(*b), base_index(*c)) {
                (Some(a), Some(b), Some(c)) => self.table[a * 16 + b * 4 + c],
                _ => b'X',
            },
            _ => b'X',
        }
    }

    /// Translate every complete codon; a trailing partial codon is dropped.
    #[must_use]
    pub fn translate(&self, seq: &[u8]) -> Vec<u8> {
        seq.chunks_exact(3)
            .map(|codon| self.translate_codon(codon))
            .collect()
    }

    #[must_use]
    pub fn is_stop(&self, codon: &[u8]) -> bool {
        codon.len() == 3 && self.translate_codon(codon) == b'*'
    }
}

#[must_use]
pub fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'T' => b'A',
        b'G' => b'C',
        b'C' => b'G',
        b'a' => b't',
        b't' => b'a',
        b'g' => b'c',
        b'c' => b'g',
        other => other,
    }
}

#[must_use]
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&b| complement(b)).collect()
}

#[must_use]
pub fn is_amino_acid(residue: u8) -> bool {
    AMINO_ACIDS.contains(&residue)
}

/// First residue outside the canonical alphabet, if any.
#[must_use]
pub fn first_invalid_residue(peptide: &[u8]) -> Option<u8> {
    peptide.iter().copied().find(|&r| !is_amino_acid(r))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_and_stop_codons() {
        let table = CodonTable::standard();
        assert_eq!(table.translate_codon(b"ATG"), b'M');
        assert!(table.is_stop(b"TAA"));
        assert!(table.is_stop(b"TAG"));
        assert!(table.is_stop(b"TGA"));
        assert!(!table.is_stop(b"TGG"));
    }

    #[test]
    fn mitochondrial_differences() {
        let table = CodonTable::for_chromosome("M");
        assert_eq!(table.translate_codon(b"TGA"), b'W');
        assert_eq!(table.translate_codon(b"AGA"), b'*');
        assert_eq!(table.translate_codon(b"ATA"), b'M');
        assert_eq!(CodonTable::for_chromosome("3").translate_codon(b"TGA"), b'*');
    }

    #[test]
    fn translate_drops_partial_codon() {
        let table = CodonTable::standard();
        assert_eq!(table.translate(b"ATGGCATGCTAA"), b"MAC*");
        assert_eq!(table.translate(b"ATGGC"), b"M");
        assert!(table.translate(b"").is_empty());
    }

    #[test]
    fn lowercase_and_ambiguous_bases() {
        let table = CodonTable::standard();
        assert_eq!(table.translate_codon(b"gtg"), b'V');
        assert_eq!(table.translate_codon(b"GNG"), b'X');
    }

    #[test]
    fn reverse_complement_sequence() {
        assert_eq!(complement(b'G'), b'C');
        assert_eq!(
            reverse_complement(b"TCTCATCCAGGTACCAGCCAATG"),
            b"CATTGGCTGGTACCTGGATGAGA"
        );
    }

    #[test]
    fn amino_acid_alphabet() {
        assert!(is_amino_acid(b'W'));
        assert!(!is_amino_acid(b'X'));
        assert!(!is_amino_acid(b'*'));
        assert_eq!(first_invalid_residue(b"SIINFEKL"), None);
        assert_eq!(first_invalid_residue(b"SIIUFEKL"), Some(b'U'));
    }
}
