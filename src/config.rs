use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::allele::normalize_hla_allele_name;
use crate::mutation::MutationOptions;
use crate::scoring::{BindingMeasure, EpitopeScorer, LogisticTransform};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoringConfig {
    pub measure: BindingMeasure,
    pub cutoff: f64,
    pub logistic: Option<LogisticTransform>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            measure: BindingMeasure::Ic50,
            cutoff: 500.0,
            logistic: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub alleles: Vec<String>,
    pub vaccine_peptide_length: usize,
    pub padding: usize,
    pub source_padding: Option<usize>,
    pub min_peptide_length: usize,
    pub max_peptide_length: Option<usize>,
    pub epitope_lengths: Vec<usize>,
    pub scoring: ScoringConfig,
    pub allele_weights: HashMap<String, f64>,
    pub drop_low_quality: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            alleles: vec!["HLA-A*02:01".to_string()],
            vaccine_peptide_length: 31,
            padding: 5,
            source_padding: None,
            min_peptide_length: 9,
            max_peptide_length: None,
            epitope_lengths: vec![8, 9, 10, 11],
            scoring: ScoringConfig::default(),
            allele_weights: HashMap::new(),
            drop_low_quality: true,
        }
    }
}

impl PipelineConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let mut config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        config.normalize_alleles()?;
        config.validate()?;
        Ok(config)
    }

    /// Rewrite allele names, including weight keys, to the `HLA-A*02:01` form.
    pub fn normalize_alleles(&mut self) -> Result<()> {
        let mut alleles = Vec::with_capacity(self.alleles.len());
        for name in &self.alleles {
            let normalized = normalize_hla_allele_name(name)
                .with_context(|| format!("invalid allele in config: '{name}'"))?;
            if !alleles.contains(&normalized) {
                alleles.push(normalized);
            }
        }
        self.alleles = alleles;

        let mut weights = HashMap::with_capacity(self.allele_weights.len());
        for (name, weight) in &self.allele_weights {
            let normalized = normalize_hla_allele_name(name)
                .with_context(|| format!("invalid allele weight key: '{name}'"))?;
            weights.insert(normalized, *weight);
        }
        self.allele_weights = weights;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.alleles.is_empty() {
            bail!("at least one HLA allele is required");
        }
        if self.vaccine_peptide_length == 0 {
            bail!("vaccinePeptideLength must be positive");
        }
        if self.min_peptide_length == 0 {
            bail!("minPeptideLength must be positive");
        }
        if let Some(max) = self.max_peptide_length
            && max < self.min_peptide_length
        {
            bail!(
                "maxPeptideLength {max} is below minPeptideLength {}",
                self.min_peptide_length
            );
        }
        if self.epitope_lengths.is_empty() || self.epitope_lengths.contains(&0) {
            bail!("epitopeLengths must be a non-empty list of positive lengths");
        }
        if !self.scoring.cutoff.is_finite() || self.scoring.cutoff < 0.0 {
            bail!("scoring cutoff must be non-negative, got {}", self.scoring.cutoff);
        }
        if let Some(logistic) = self.scoring.logistic {
            LogisticTransform::new(logistic.midpoint, logistic.width)
                .context("invalid logistic scoring transform")?;
        }
        for (allele, weight) in &self.allele_weights {
            if !weight.is_finite() || *weight < 0.0 {
                bail!("weight for {allele} must be non-negative, got {weight}");
            }
        }
        Ok(())
    }

    /// Flank used when cutting source sequences around a mutation.
    #[must_use]
    pub fn source_padding(&self) -> usize {
        self.source_padding
            .unwrap_or(self.vaccine_peptide_length.saturating_sub(1))
    }

    #[must_use]
    pub fn mutation_options(&self) -> MutationOptions {
        MutationOptions {
            padding: self.source_padding(),
            max_length: self.max_peptide_length,
            min_length: self.min_peptide_length,
        }
    }

    #[must_use]
    pub fn scorer(&self) -> EpitopeScorer {
        EpitopeScorer::new(
            self.scoring.measure,
            self.scoring.cutoff,
            self.scoring.logistic,
        )
        .with_allele_weights(self.allele_weights.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(json: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(json.as_bytes()).unwrap();
        f
    }

    #[test]
    fn valid_config_all_fields() {
        let json = r#"{
            "alleles": ["A*0201", "HLA-B*07:02", "A2"],
            "vaccinePeptideLength": 25,
            "padding": 3,
            "sourcePadding": 20,
            "minPeptideLength": 8,
            "maxPeptideLength": 60,
            "epitopeLengths": [9],
            "scoring": { "measure": "percentileRank", "cutoff": 2.0, "logistic": { "midpoint": 1.0, "width": 0.5 } },
            "alleleWeights": { "B0702": 0.5 },
            "dropLowQuality": false
        }"#;
        let f = write_config(json);
        let config = PipelineConfig::from_file(f.path()).unwrap();
        assert_eq!(config.alleles, vec!["HLA-A*02:01", "HLA-B*07:02"]);
        assert_eq!(config.vaccine_peptide_length, 25);
        assert_eq!(config.source_padding(), 20);
        assert_eq!(config.scoring.measure, BindingMeasure::PercentileRank);
        assert!(!config.drop_low_quality);
        assert_eq!(config.allele_weights["HLA-B*07:02"], 0.5);

        let options = config.mutation_options();
        assert_eq!(options.max_length, Some(60));
        assert_eq!(options.min_length, 8);
        assert_eq!(config.scorer().allele_weight("HLA-B*07:02"), 0.5);
    }

    #[test]
    fn defaults_when_fields_omitted() {
        let f = write_config("{}");
        let config = PipelineConfig::from_file(f.path()).unwrap();
        assert_eq!(config.alleles, vec!["HLA-A*02:01"]);
        assert_eq!(config.vaccine_peptide_length, 31);
        assert_eq!(config.padding, 5);
        assert_eq!(config.source_padding(), 30);
        assert_eq!(config.epitope_lengths, vec![8, 9, 10, 11]);
        assert_eq!(config.scoring.cutoff, 500.0);
        assert!(config.drop_low_quality);
    }

    #[test]
    fn invalid_values_rejected() {
        for json in [
            r#"{ "vaccinePeptideLength": 0 }"#,
            r#"{ "minPeptideLength": 0 }"#,
            r#"{ "minPeptideLength": 10, "maxPeptideLength": 9 }"#,
            r#"{ "epitopeLengths": [] }"#,
            r#"{ "scoring": { "cutoff": -1 } }"#,
            r#"{ "scoring": { "logistic": { "midpoint": 350, "width": 0 } } }"#,
            r#"{ "alleles": ["HLA-"] }"#,
            r#"{ "alleles": [] }"#,
            r#"{ "alleleWeights": { "A0201": -1 } }"#,
            r#"{ "unknownField": 1 }"#,
        ] {
            let f = write_config(json);
            assert!(PipelineConfig::from_file(f.path()).is_err(), "{json}");
        }
    }

    #[test]
    fn missing_file() {
        let result = PipelineConfig::from_file(Path::new("/nonexistent/config.json"));
        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("failed to read config file"));
    }
}
