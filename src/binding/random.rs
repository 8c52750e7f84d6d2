//! Seeded random binding predictor for dry runs.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Error;

use super::{BindingPrediction, BindingPredictor};

const MAX_IC50: f64 = 10_000.0;

/// Emits a prediction for every k-mer of every configured length and allele,
/// with IC50 uniform in `[0, 10000)` and percentile rank uniform in `[0, 100)`.
pub struct RandomBindingPredictor {
    epitope_lengths: Vec<usize>,
    seed: u64,
}

impl RandomBindingPredictor {
    #[must_use]
    pub fn new(epitope_lengths: Vec<usize>, seed: u64) -> Self {
        Self {
            epitope_lengths,
            seed,
        }
    }
}

impl BindingPredictor for RandomBindingPredictor {
    fn predict(
        &self,
        sequences: &[&str],
        alleles: &[String],
    ) -> Result<Vec<BindingPrediction>, Error> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut predictions = Vec::new();

        for &sequence in sequences {
            for &length in &self.epitope_lengths {
                if length == 0 || length > sequence.len() {
                    continue;
                }
                for start in 0..=sequence.len() - length {
                    let epitope = &sequence[start..start + length];
                    for allele in alleles {
                        predictions.push(BindingPrediction {
                            source_sequence: sequence.to_string(),
                            epitope: epitope.to_string(),
                            epitope_start: start,
                            epitope_end: start + length,
                            allele: allele.clone(),
                            ic50: rng.gen_range(0.0..MAX_IC50),
                            percentile_rank: rng.gen_range(0.0..100.0),
                        });
                    }
                }
            }
        }

        log::debug!(
            "random predictor produced {} rows for {} sequences",
            predictions.len(),
            sequences.len()
        );
        Ok(predictions)
    }
}
