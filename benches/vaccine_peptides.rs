use criterion::{Criterion, criterion_group, criterion_main};

use vaxpep::binding::{BindingPredictor, RandomBindingPredictor, group_epitopes};
use vaxpep::scoring::EpitopeScorer;
use vaxpep::strand::Strand;
use vaxpep::transcript::{Exon, transcript_index};
use vaxpep::vaccine::select_vaccine_peptide;

// 61 residues with the mutation in the middle, as produced by the default padding
const SOURCE: &str = "MKTAYIAKQRQISFVKSHFSRQLEERLGLIEVQAPILSRVGDGTQDNLSGAEKAVQVKVKA";
const MUTATION: (usize, usize) = (30, 31);

fn bench_select_vaccine_peptide(c: &mut Criterion) {
    let alleles = vec!["HLA-A*02:01".to_string(), "HLA-B*07:02".to_string()];
    let predictor = RandomBindingPredictor::new(vec![8, 9, 10, 11], 42);
    let predictions = predictor.predict(&[SOURCE], &alleles).unwrap();
    let epitopes = group_epitopes(predictions).remove(SOURCE).unwrap();

    for (name, scorer) in [
        ("simple", EpitopeScorer::simple_ic50()),
        ("logistic", EpitopeScorer::logistic_ic50()),
    ] {
        c.bench_function(&format!("select_vaccine_peptide ({name}, 61 aa)"), |b| {
            b.iter(|| {
                let best = select_vaccine_peptide(
                    SOURCE, MUTATION.0, MUTATION.1, &epitopes, &scorer, 31, 5,
                )
                .unwrap();
                assert_eq!(best.peptide.len(), 31);
            });
        });
    }
}

fn bench_transcript_index(c: &mut Criterion) {
    // 200 exons of 100 bases separated by 900-base introns
    let exons: Vec<Exon> = (0..200u32)
        .map(|i| {
            let start = 1 + i * 1000;
            let mut exon = Exon::new(&format!("e{i}"), start, start + 99);
            if i == 0 {
                exon.translation_start = Some(1);
            }
            exon
        })
        .collect();

    c.bench_function("transcript_index (200 exons, reverse)", |b| {
        b.iter(|| {
            for position in (1..200_000u32).step_by(997) {
                let _ = transcript_index(position, &exons, Strand::Reverse, 0, false);
            }
        });
    });
}

criterion_group!(benches, bench_select_vaccine_peptide, bench_transcript_index);
criterion_main!(benches);
