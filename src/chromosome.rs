//! Chromosome name normalisation.

/// Normalise a contig name so VCF, annotation and FASTA sources agree.
///
/// Drops a leading `chr` (any case), upper-cases the rest and names the
/// mitochondrial genome `M`: `chr17` → `17`, `chrMT` → `M`, `x` → `X`.
#[must_use]
pub fn normalize_chromosome_name(name: &str) -> String {
    let trimmed = name.trim();
    let stripped = match trimmed.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("chr") => &trimmed[3..],
        _ => trimmed,
    };
    let upper = stripped.to_ascii_uppercase();
    if upper == "MT" { "M".to_string() } else { upper }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_prefix() {
        assert_eq!(normalize_chromosome_name("chr17"), "17");
        assert_eq!(normalize_chromosome_name("CHR3"), "3");
        assert_eq!(normalize_chromosome_name("3"), "3");
    }

    #[test]
    fn mitochondrial_aliases() {
        assert_eq!(normalize_chromosome_name("MT"), "M");
        assert_eq!(normalize_chromosome_name("chrM"), "M");
        assert_eq!(normalize_chromosome_name("chrMT"), "M");
    }

    #[test]
    fn sex_chromosomes_upper_cased() {
        assert_eq!(normalize_chromosome_name("chrx"), "X");
        assert_eq!(normalize_chromosome_name(" Y "), "Y");
    }
}
