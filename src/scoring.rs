//! Epitope scoring: binding measurements to normalised [0, 1] scores.

use std::collections::HashMap;

use serde::Deserialize;

use crate::binding::{AlleleBinding, Epitope};
use crate::error::Error;

/// Which predicted quantity decides binding. Lower is stronger for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BindingMeasure {
    Ic50,
    PercentileRank,
}

impl BindingMeasure {
    #[must_use]
    pub fn value(self, binding: &AlleleBinding) -> f64 {
        match self {
            Self::Ic50 => binding.ic50,
            Self::PercentileRank => binding.percentile_rank,
        }
    }

    /// `value <= cutoff` is a binder.
    pub fn value_is_binder(self, value: f64, cutoff: f64) -> Result<bool, Error> {
        if !value.is_finite() || value < 0.0 {
            return Err(Error::Validation(format!("invalid {self} value {value}")));
        }
        if self == Self::PercentileRank && value > 100.0 {
            return Err(Error::Validation(format!(
                "percentile rank {value} exceeds 100"
            )));
        }
        Ok(value <= cutoff)
    }
}

impl std::fmt::Display for BindingMeasure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ic50 => write!(f, "IC50"),
            Self::PercentileRank => write!(f, "percentile rank"),
        }
    }
}

/// Decreasing logistic curve rescaled so that a value of 0 scores exactly 1.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LogisticTransform {
    pub midpoint: f64,
    pub width: f64,
}

impl LogisticTransform {
    pub fn new(midpoint: f64, width: f64) -> Result<Self, Error> {
        if !width.is_finite() || width <= 0.0 || !midpoint.is_finite() {
            return Err(Error::Validation(format!(
                "logistic width must be positive and finite, got {width}"
            )));
        }
        Ok(Self { midpoint, width })
    }

    fn raw(&self, value: f64) -> f64 {
        1.0 / (1.0 + ((value - self.midpoint) / self.width).exp())
    }

    #[must_use]
    pub fn apply(&self, value: f64) -> f64 {
        self.raw(value) / self.raw(0.0)
    }
}

/// Turns binding predictions into epitope scores.
#[derive(Debug, Clone)]
pub struct EpitopeScorer {
    measure: BindingMeasure,
    cutoff: f64,
    transform: Option<LogisticTransform>,
    allele_weights: HashMap<String, f64>,
}

impl EpitopeScorer {
    #[must_use]
    pub fn new(measure: BindingMeasure, cutoff: f64, transform: Option<LogisticTransform>) -> Self {
        Self {
            measure,
            cutoff,
            transform,
            allele_weights: HashMap::new(),
        }
    }

    /// Every IC50 at or below 500nM scores 1.
    #[must_use]
    pub fn simple_ic50() -> Self {
        Self::new(BindingMeasure::Ic50, 500.0, None)
    }

    /// IC50 up to 2000nM through a logistic with midpoint 350nM, width 150nM.
    #[must_use]
    pub fn logistic_ic50() -> Self {
        Self::new(
            BindingMeasure::Ic50,
            2000.0,
            Some(LogisticTransform {
                midpoint: 350.0,
                width: 150.0,
            }),
        )
    }

    #[must_use]
    pub fn with_allele_weights(mut self, weights: HashMap<String, f64>) -> Self {
        self.allele_weights = weights;
        self
    }

    #[must_use]
    pub fn measure(&self) -> BindingMeasure {
        self.measure
    }

    /// Weight of an allele; 1.0 when unweighted.
    #[must_use]
    pub fn allele_weight(&self, allele: &str) -> f64 {
        self.allele_weights.get(allele).copied().unwrap_or(1.0)
    }

    /// Score a raw binding value, optionally for a weighted allele.
    pub fn binding_value_score(&self, value: f64, allele: Option<&str>) -> Result<f64, Error> {
        if !self.measure.value_is_binder(value, self.cutoff)? {
            return Ok(0.0);
        }
        let weight = allele.map_or(1.0, |a| self.allele_weight(a));
        let score = self.transform.map_or(1.0, |t| t.apply(value));
        Ok(weight * score)
    }

    /// Score a raw value; invalid values are logged and score 0.
    #[must_use]
    pub fn score(&self, value: f64) -> f64 {
        self.binding_value_score(value, None).unwrap_or_else(|e| {
            log::warn!("{e}");
            0.0
        })
    }

    /// Sum of the per-allele scores of an epitope.
    #[must_use]
    pub fn epitope_score(&self, epitope: &Epitope) -> f64 {
        epitope
            .bindings
            .iter()
            .map(|b| {
                self.binding_value_score(self.measure.value(b), Some(&b.allele))
                    .unwrap_or_else(|e| {
                        log::warn!("epitope {}: {e}", epitope.sequence);
                        0.0
                    })
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_scorer_boundary() {
        let scorer = EpitopeScorer::simple_ic50();
        assert_eq!(scorer.score(499.0), 1.0);
        assert_eq!(scorer.score(500.0), 1.0);
        assert_eq!(scorer.score(501.0), 0.0);
        assert_eq!(scorer.score(-1.0), 0.0);
    }

    #[test]
    fn logistic_scorer_normalised_and_decreasing() {
        let scorer = EpitopeScorer::logistic_ic50();
        assert_eq!(scorer.score(0.0), 1.0);
        let mut previous = scorer.score(0.0);
        for value in (10..=2000).step_by(10) {
            let score = scorer.score(f64::from(value));
            assert!(score < previous, "{value}");
            assert!(score > 0.0);
            previous = score;
        }
        assert_eq!(scorer.score(2001.0), 0.0);
    }

    #[test]
    fn measure_validation() {
        let measure = BindingMeasure::PercentileRank;
        assert!(measure.value_is_binder(1.5, 2.0).unwrap());
        assert!(!measure.value_is_binder(2.5, 2.0).unwrap());
        assert!(measure.value_is_binder(101.0, 2.0).is_err());
        assert!(BindingMeasure::Ic50.value_is_binder(-3.0, 500.0).is_err());
        assert!(BindingMeasure::Ic50.value_is_binder(f64::NAN, 500.0).is_err());
    }

    #[test]
    fn logistic_width_must_be_positive() {
        assert!(LogisticTransform::new(350.0, 0.0).is_err());
        assert!(LogisticTransform::new(350.0, -1.0).is_err());
        assert!(LogisticTransform::new(350.0, 150.0).is_ok());
    }

    #[test]
    fn epitope_score_sums_alleles() {
        let epitope = Epitope::new("SIINFEKL", 0)
            .with_binding("HLA-A*02:01", 32.0, 0.5)
            .with_binding("HLA-B*08:01", 1900.0, 30.0);
        assert_eq!(EpitopeScorer::simple_ic50().epitope_score(&epitope), 1.0);

        let logistic = EpitopeScorer::logistic_ic50().epitope_score(&epitope);
        assert!((logistic - 0.9795).abs() < 1e-3, "{logistic}");

        let both_binders = Epitope::new("SIINFEKL", 0)
            .with_binding("HLA-A*02:01", 10.0, 0.5)
            .with_binding("HLA-B*08:01", 20.0, 0.5);
        assert_eq!(EpitopeScorer::simple_ic50().epitope_score(&both_binders), 2.0);
    }

    #[test]
    fn allele_weights() {
        let weights = HashMap::from([("HLA-A*02:01".to_string(), 0.5)]);
        let scorer = EpitopeScorer::simple_ic50().with_allele_weights(weights);
        assert_eq!(scorer.allele_weight("HLA-A*02:01"), 0.5);
        assert_eq!(scorer.allele_weight("HLA-B*07:02"), 1.0);
        assert_eq!(
            scorer.binding_value_score(100.0, Some("HLA-A*02:01")).unwrap(),
            0.5
        );
        assert_eq!(scorer.binding_value_score(100.0, None).unwrap(), 1.0);
    }
}
