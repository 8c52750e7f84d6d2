//! Variant-to-vaccine-peptide pipeline: applies variants to every overlapping
//! transcript, keeps an audit report, and selects one peptide per mutant
//! source sequence.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::binding::{BindingPredictor, Epitope, ThymicDeletionFilter, group_epitopes};
use crate::config::PipelineConfig;
use crate::error::{Error, Severity, VariantError};
use crate::mutation::{MutatedRegion, MutationApplicator};
use crate::scoring::EpitopeScorer;
use crate::sequence::SequenceProvider;
use crate::transcript::TranscriptProvider;
use crate::vaccine::{self, VaccinePeptideRecord, is_mutant_epitope};
use crate::variant::GenomicVariant;

/// What became of one variant on one transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Peptide { annotation: String },
    /// Same source sequence as an earlier region.
    Duplicate { annotation: String },
    Skipped(VariantError),
    NoOverlappingTranscript,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Peptide { annotation } => write!(f, "{annotation}"),
            Self::Duplicate { annotation } => {
                write!(f, "{annotation} (duplicate source sequence)")
            }
            Self::Skipped(e) => write!(f, "{}: {e}", e.severity()),
            Self::NoOverlappingTranscript => write!(f, "no overlapping transcript"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub variant: String,
    pub transcript_id: Option<String>,
    pub gene_name: Option<String>,
    pub outcome: Outcome,
}

impl fmt::Display for ReportEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.variant,
            self.transcript_id.as_deref().unwrap_or("-"),
            self.gene_name.as_deref().unwrap_or("-"),
            self.outcome
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub inputs: usize,
    pub peptides: usize,
    pub duplicates: usize,
    pub skipped: usize,
    pub no_transcript: usize,
}

/// Audit trail of a run, one entry per (variant, transcript) pair in input order.
#[derive(Debug, Clone, Default)]
pub struct MutationReport {
    inputs: usize,
    entries: Vec<ReportEntry>,
}

impl MutationReport {
    #[must_use]
    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    #[must_use]
    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary {
            inputs: self.inputs,
            ..ReportSummary::default()
        };
        for entry in &self.entries {
            match entry.outcome {
                Outcome::Peptide { .. } => summary.peptides += 1,
                Outcome::Duplicate { .. } => summary.duplicates += 1,
                Outcome::Skipped(_) => summary.skipped += 1,
                Outcome::NoOverlappingTranscript => summary.no_transcript += 1,
            }
        }
        summary
    }

    fn push(
        &mut self,
        variant: &str,
        transcript_id: Option<&str>,
        gene_name: Option<&str>,
        outcome: Outcome,
    ) {
        self.entries.push(ReportEntry {
            variant: variant.to_string(),
            transcript_id: transcript_id.map(str::to_string),
            gene_name: gene_name.map(str::to_string),
            outcome,
        });
    }
}

impl fmt::Display for MutationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{entry}")?;
        }
        Ok(())
    }
}

fn log_skip(variant: &str, error: &VariantError) {
    if *error == VariantError::NoVariant {
        log::debug!("{variant}: {error}");
        return;
    }
    match error.severity() {
        Severity::Info => log::info!("{variant}: {error}"),
        Severity::Warning => log::warn!("{variant}: {error}"),
        Severity::Error => log::error!("{variant}: {error}"),
    }
}

/// Collects regions, dropping repeated source sequences.
#[derive(Default)]
struct Collector {
    seen: HashSet<String>,
    regions: Vec<MutatedRegion>,
    report: MutationReport,
}

impl Collector {
    fn accept(&mut self, variant: &str, region: MutatedRegion) {
        let transcript_id = Some(region.transcript_id.as_str()).filter(|id| !id.is_empty());
        let gene_name = Some(region.gene_name.as_str()).filter(|name| !name.is_empty());
        let annotation = region.annotation.clone();
        if self.seen.insert(region.sequence.clone()) {
            self.report
                .push(variant, transcript_id, gene_name, Outcome::Peptide { annotation });
            self.regions.push(region);
        } else {
            log::debug!("{variant}: duplicate source sequence {}", region.sequence);
            self.report
                .push(variant, transcript_id, gene_name, Outcome::Duplicate { annotation });
        }
    }
}

/// An epitope with its per-allele and combined scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredEpitope {
    pub source_sequence: String,
    #[serde(flatten)]
    pub epitope: Epitope,
    pub allele_scores: BTreeMap<String, f64>,
    pub score: f64,
    /// Overlaps the mutated residues and is not thymically deleted.
    pub mutant: bool,
}

/// Score every epitope of every region, regions in input order.
#[must_use]
pub fn score_epitopes(
    regions: &[MutatedRegion],
    epitopes_by_source: &BTreeMap<String, Vec<Epitope>>,
    scorer: &EpitopeScorer,
) -> Vec<ScoredEpitope> {
    let mut scored = Vec::new();
    for region in regions {
        let Some(epitopes) = epitopes_by_source.get(&region.sequence) else {
            continue;
        };
        for epitope in epitopes {
            let allele_scores: BTreeMap<String, f64> = epitope
                .bindings
                .iter()
                .map(|b| {
                    let score = scorer
                        .binding_value_score(scorer.measure().value(b), Some(&b.allele))
                        .unwrap_or(0.0);
                    (b.allele.clone(), score)
                })
                .collect();
            scored.push(ScoredEpitope {
                source_sequence: region.sequence.clone(),
                epitope: epitope.clone(),
                score: allele_scores.values().sum(),
                allele_scores,
                mutant: is_mutant_epitope(epitope, region.mutation_start, region.mutation_end),
            });
        }
    }
    scored
}

pub struct Pipeline<'a, R: ?Sized> {
    reference: &'a R,
    applicator: MutationApplicator<'a, R>,
    vaccine_peptide_length: usize,
    padding: usize,
}

impl<'a, R> Pipeline<'a, R>
where
    R: TranscriptProvider + SequenceProvider + ?Sized,
{
    pub fn new(reference: &'a R, config: &PipelineConfig) -> Self {
        Self {
            reference,
            applicator: MutationApplicator::new(reference, config.mutation_options()),
            vaccine_peptide_length: config.vaccine_peptide_length,
            padding: config.padding,
        }
    }

    /// Apply every variant to every transcript it overlaps.
    pub fn process_variants(
        &self,
        variants: &[GenomicVariant],
    ) -> (Vec<MutatedRegion>, MutationReport) {
        self.process(variants, Vec::new())
    }

    /// Like [`Self::process_variants`], followed by literal mutant peptides.
    pub fn process(
        &self,
        variants: &[GenomicVariant],
        peptides: Vec<MutatedRegion>,
    ) -> (Vec<MutatedRegion>, MutationReport) {
        let mut collector = Collector::default();
        collector.report.inputs = variants.len() + peptides.len();

        for variant in variants {
            let description = variant.description();
            if variant.is_no_op() {
                let error = VariantError::NoVariant;
                log_skip(&description, &error);
                collector
                    .report
                    .push(&description, None, None, Outcome::Skipped(error));
                continue;
            }

            let transcript_ids = self
                .reference
                .overlapping_transcripts(&variant.chromosome, variant.position);
            if transcript_ids.is_empty() {
                log::info!("{description}: no overlapping transcript");
                collector.report.push(
                    &description,
                    None,
                    None,
                    Outcome::NoOverlappingTranscript,
                );
                continue;
            }

            for transcript_id in transcript_ids {
                match self.applicator.apply_point_mutation(
                    transcript_id,
                    variant.position,
                    &variant.reference,
                    &variant.alternate,
                ) {
                    Ok(region) => collector.accept(&description, region),
                    Err(error) => {
                        log_skip(&format!("{description} on {transcript_id}"), &error);
                        let gene_name = self
                            .reference
                            .transcript(transcript_id)
                            .ok()
                            .map(|t| t.gene_name.as_str())
                            .filter(|name| !name.is_empty());
                        collector.report.push(
                            &description,
                            Some(transcript_id),
                            gene_name,
                            Outcome::Skipped(error),
                        );
                    }
                }
            }
        }

        for peptide in peptides {
            let label = peptide.annotation.clone();
            collector.accept(&label, peptide);
        }

        (collector.regions, collector.report)
    }

    /// Predict, group and filter epitopes for every region's source sequence.
    pub fn predict_epitopes<P: BindingPredictor + ?Sized>(
        &self,
        regions: &[MutatedRegion],
        predictor: &P,
        alleles: &[String],
        thymic: Option<&ThymicDeletionFilter>,
    ) -> Result<BTreeMap<String, Vec<Epitope>>, Error> {
        let sequences: Vec<&str> = regions.iter().map(|r| r.sequence.as_str()).collect();
        let predictions = predictor.predict(&sequences, alleles)?;
        let mut grouped = group_epitopes(predictions);
        if let Some(filter) = thymic {
            let flagged: usize = grouped.values_mut().map(|e| filter.mark(e)).sum();
            log::info!("{flagged} epitopes flagged as thymically deleted");
        }
        Ok(grouped)
    }

    /// One vaccine peptide per region, highest mutant score first.
    pub fn select_vaccine_peptides(
        &self,
        regions: &[MutatedRegion],
        epitopes_by_source: &BTreeMap<String, Vec<Epitope>>,
        scorer: &EpitopeScorer,
    ) -> Result<Vec<VaccinePeptideRecord>, Error> {
        if regions.is_empty() {
            return Err(Error::NoPeptides(
                "every input was skipped, see the mutation report".to_string(),
            ));
        }
        vaccine::select_vaccine_peptides(
            regions,
            epitopes_by_source,
            scorer,
            self.vaccine_peptide_length,
            self.padding,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::RandomBindingPredictor;
    use crate::mutation::parse_mutated_peptide;
    use crate::reference::ReferenceData;
    use crate::sequence::ReferenceSequences;
    use crate::strand::Strand;
    use crate::transcript::{AnnotationData, Exon, Transcript};

    // M  A  E  V  L  K  R  S  I  I  *
    const CDS: &[u8] = b"ATGGCTGAAGTTCTGAAACGTTCCATCATCTAA";

    fn transcript(id: &str, gene_name: &str) -> Transcript {
        let mut exons = vec![
            Exon::new("e1", 1, 10),
            Exon::new("e2", 21, 40),
            Exon::new("e3", 51, 60),
        ];
        exons[0].translation_start = Some(4);
        exons[2].translation_end = Some(6);
        Transcript {
            id: id.to_string(),
            gene_name: gene_name.to_string(),
            chromosome: "1".to_string(),
            strand: Strand::Forward,
            cds_start_phase: 0,
            exons,
        }
    }

    /// Two transcripts of the same gene with identical coding sequence.
    fn reference() -> ReferenceData {
        let annotation =
            AnnotationData::new(vec![transcript("T1", "GENE1"), transcript("T2", "GENE1")])
                .unwrap();
        let mut sequences = ReferenceSequences::default();
        sequences.cds.insert("T1", CDS);
        sequences.cds.insert("T2", CDS);
        ReferenceData::new(annotation, sequences)
    }

    fn config() -> PipelineConfig {
        PipelineConfig {
            vaccine_peptide_length: 5,
            padding: 1,
            source_padding: Some(3),
            min_peptide_length: 1,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn report_covers_every_variant_transcript_pair() {
        let data = reference();
        let config = config();
        let pipeline = Pipeline::new(&data, &config);
        let variants = vec![
            GenomicVariant::new("chr1", 24, "T", "A"),
            GenomicVariant::new("1", 15, "A", "C"),
            GenomicVariant::new("5", 100, "A", "C"),
            GenomicVariant::new("1", 24, "T", "T"),
        ];
        let (regions, report) = pipeline.process_variants(&variants);

        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].transcript_id, "T1");
        assert_eq!(regions[0].annotation, "V4D");

        let outcomes: Vec<&Outcome> = report.entries().iter().map(|e| &e.outcome).collect();
        assert_eq!(outcomes.len(), 6);
        assert_eq!(
            outcomes[0],
            &Outcome::Peptide {
                annotation: "V4D".to_string()
            }
        );
        assert!(matches!(outcomes[1], Outcome::Duplicate { .. }));
        assert!(matches!(
            outcomes[2],
            Outcome::Skipped(VariantError::Coordinate { .. })
        ));
        assert!(matches!(
            outcomes[3],
            Outcome::Skipped(VariantError::Coordinate { .. })
        ));
        assert_eq!(outcomes[4], &Outcome::NoOverlappingTranscript);
        assert_eq!(outcomes[5], &Outcome::Skipped(VariantError::NoVariant));

        assert_eq!(
            report.summary(),
            ReportSummary {
                inputs: 4,
                peptides: 1,
                duplicates: 1,
                skipped: 3,
                no_transcript: 1,
            }
        );
        assert_eq!(report.entries()[2].gene_name.as_deref(), Some("GENE1"));
    }

    #[test]
    fn report_text() {
        let data = reference();
        let config = config();
        let pipeline = Pipeline::new(&data, &config);
        let (_, report) = pipeline.process_variants(&[
            GenomicVariant::new("1", 24, "T", "A"),
            GenomicVariant::new("5", 100, "A", "C"),
        ]);
        let text = report.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "chr1 g.24T>A\tT1\tGENE1\tV4D");
        assert_eq!(lines[2], "chr5 g.100A>C\t-\t-\tno overlapping transcript");
    }

    #[test]
    fn literal_peptides_join_the_regions() {
        let data = reference();
        let config = config();
        let pipeline = Pipeline::new(&data, &config);
        let peptides = vec![
            parse_mutated_peptide("SIINF_E_KL").unwrap(),
            parse_mutated_peptide("SIINF_E_KL").unwrap(),
        ];
        let (regions, report) = pipeline.process(&[], peptides);
        assert_eq!(regions.len(), 1);
        assert_eq!(report.summary().duplicates, 1);
        assert_eq!(report.entries()[0].transcript_id, None);
    }

    #[test]
    fn select_peptides_end_to_end() {
        let data = reference();
        let config = config();
        let pipeline = Pipeline::new(&data, &config);
        let (regions, _) =
            pipeline.process(&[GenomicVariant::new("1", 24, "T", "A")], Vec::new());
        let predictor = RandomBindingPredictor::new(vec![3], 7);
        let thymic = ThymicDeletionFilter::from_peptides(["XXXXXX"]);
        let epitopes = pipeline
            .predict_epitopes(&regions, &predictor, &config.alleles, Some(&thymic))
            .unwrap();
        let records = pipeline
            .select_vaccine_peptides(&regions, &epitopes, &config.scorer())
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].gene_name, "GENE1");
        assert_eq!(records[0].candidate.peptide.len(), 5);
        assert!(records[0].candidate.peptide.contains('D'));
    }

    #[test]
    fn scored_epitopes_flag_mutant_residues() {
        let region = parse_mutated_peptide("SIINF_E_KLAA").unwrap();
        let epitopes = BTreeMap::from([(
            region.sequence.clone(),
            vec![
                Epitope::new("SIINF", 0)
                    .with_binding("HLA-A*02:01", 100.0, 1.0)
                    .with_binding("HLA-B*07:02", 900.0, 20.0),
                Epitope::new("INFEK", 2).with_binding("HLA-A*02:01", 50.0, 0.5),
            ],
        )]);
        let scored = score_epitopes(&[region], &epitopes, &EpitopeScorer::simple_ic50());
        assert_eq!(scored.len(), 2);
        assert!(!scored[0].mutant);
        assert_eq!(scored[0].score, 1.0);
        assert_eq!(scored[0].allele_scores["HLA-B*07:02"], 0.0);
        assert!(scored[1].mutant);

        let json = serde_json::to_value(&scored[1]).unwrap();
        assert_eq!(json["sequence"], "INFEK");
        assert_eq!(json["sourceSequence"], "SIINFEKLAA");
        assert_eq!(json["alleleScores"]["HLA-A*02:01"], 1.0);
    }

    #[test]
    fn nothing_to_select_is_an_error() {
        let data = reference();
        let config = config();
        let pipeline = Pipeline::new(&data, &config);
        let result =
            pipeline.select_vaccine_peptides(&[], &BTreeMap::new(), &config.scorer());
        assert!(matches!(result, Err(Error::NoPeptides(_))));
    }
}
