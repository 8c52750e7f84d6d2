//! HLA allele name normalisation.

use std::path::Path;

use crate::error::Error;

/// Parsed `gene`, `family`, `protein` fields of an HLA class I allele name.
struct AlleleParts {
    gene: String,
    family: String,
    protein: String,
}

fn pad_field(field: &str) -> String {
    if field.len() == 1 {
        format!("0{field}")
    } else {
        field.to_string()
    }
}

fn parse_allele(name: &str) -> Result<AlleleParts, Error> {
    let malformed = || Error::Parse(format!("malformed HLA allele name: '{name}'"));

    let upper = name.trim().to_ascii_uppercase();
    let rest = upper.strip_prefix("HLA-").unwrap_or(&upper);

    let gene_len = rest
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(rest.len());
    if gene_len == 0 {
        return Err(malformed());
    }
    let gene = &rest[..gene_len];
    let rest = &rest[gene_len..];
    let rest = rest
        .strip_prefix('*')
        .or_else(|| rest.strip_prefix(':'))
        .unwrap_or(rest);

    if rest.is_empty() || !rest.chars().all(|c| c.is_ascii_digit() || c == ':') {
        return Err(malformed());
    }

    let (family, protein) = match rest.split_once(':') {
        Some((family, protein)) => (family, protein),
        None if rest.len() == 4 => rest.split_at(2),
        None if rest.len() <= 2 => (rest, "01"),
        None => return Err(malformed()),
    };
    let valid = |f: &str| (1..=2).contains(&f.len()) && f.chars().all(|c| c.is_ascii_digit());
    if !valid(family) || !valid(protein) {
        return Err(malformed());
    }

    Ok(AlleleParts {
        gene: gene.to_string(),
        family: pad_field(family),
        protein: pad_field(protein),
    })
}

/// Normalise an allele name to the `HLA-A*02:01` form.
///
/// Accepts forms such as `HLA-A*0201`, `A*02:01`, `A0201`, `HLA-A02:01`, `A2`.
/// A missing protein field is taken as `01`.
pub fn normalize_hla_allele_name(name: &str) -> Result<String, Error> {
    let parts = parse_allele(name)?;
    Ok(format!(
        "HLA-{}*{}:{}",
        parts.gene, parts.family, parts.protein
    ))
}

/// Compact allele form used by command-line predictors, e.g. `A0201`.
pub fn compact_hla_allele_name(name: &str) -> Result<String, Error> {
    let parts = parse_allele(name)?;
    Ok(format!("{}{}{}", parts.gene, parts.family, parts.protein))
}

/// Parse a comma- or line-separated allele list.
///
/// Trailing columns after a space, tab or quote (typing scores) are dropped,
/// blank entries are skipped and repeats keep their first position.
pub fn parse_hla_alleles(text: &str) -> Result<Vec<String>, Error> {
    let mut alleles: Vec<String> = Vec::new();
    for raw in text.lines().flat_map(|line| line.split(',')) {
        let name = raw
            .trim()
            .split([' ', '\t', '\''])
            .next()
            .unwrap_or_default();
        if name.is_empty() {
            continue;
        }
        let allele = normalize_hla_allele_name(name)?;
        if !alleles.contains(&allele) {
            alleles.push(allele);
        }
    }
    Ok(alleles)
}

/// Read an HLA typing file in the format accepted by [`parse_hla_alleles`].
pub fn read_hla_file(path: &Path) -> Result<Vec<String>, Error> {
    let alleles = parse_hla_alleles(&std::fs::read_to_string(path)?)?;
    if alleles.is_empty() {
        return Err(Error::Format(format!(
            "no HLA alleles in {}",
            path.display()
        )));
    }
    log::info!("read {} HLA alleles from {}", alleles.len(), path.display());
    Ok(alleles)
}
