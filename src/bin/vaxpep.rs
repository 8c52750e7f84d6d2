use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;

use vaxpep::allele::{parse_hla_alleles, read_hla_file};
use vaxpep::binding::{
    BindingPredictor, PrecomputedBindings, RandomBindingPredictor, ThymicDeletionFilter,
};
use vaxpep::cli;
use vaxpep::config::PipelineConfig;
use vaxpep::mutation::parse_mutated_peptide;
use vaxpep::pipeline::{Pipeline, ScoredEpitope, score_epitopes};
use vaxpep::reference::{ReferenceData, ReferencePaths};
use vaxpep::vaccine::VaccinePeptideRecord;
use vaxpep::vcf::read_vcf_file;

#[derive(Parser)]
#[command(
    name = "vaxpep",
    about = "Select personalised vaccine peptides from somatic variants"
)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// HLA alleles, comma separated; may be repeated. Overrides the config
    #[arg(long = "hla")]
    hla: Vec<String>,

    /// HLA typing file, one or more comma-separated alleles per line
    #[arg(long = "hla-file", conflicts_with = "hla")]
    hla_file: Option<PathBuf>,

    /// Transcript annotation (JSON, optionally gzipped)
    #[arg(short = 'a', long = "annotation")]
    annotation: Option<PathBuf>,

    /// CDS FASTA
    #[arg(long = "cds")]
    cds: Option<PathBuf>,

    /// cDNA FASTA
    #[arg(long = "cdna")]
    cdna: Option<PathBuf>,

    /// Protein FASTA
    #[arg(long = "protein")]
    protein: Option<PathBuf>,

    /// Somatic variants (VCF, optionally gzipped); may be repeated
    #[arg(long = "vcf")]
    vcf: Vec<PathBuf>,

    /// Literal mutant peptide such as QLSQ_Y_QQ; may be repeated
    #[arg(long = "peptide")]
    peptide: Vec<String>,

    /// Precomputed binding predictions (TSV); random predictions otherwise
    #[arg(short = 'b', long = "bindings")]
    bindings: Option<PathBuf>,

    /// Seed for random binding predictions
    #[arg(long = "seed", default_value_t = 0)]
    seed: u64,

    /// Self peptides used for thymic deletion, one per line
    #[arg(long = "self-peptides")]
    self_peptides: Option<PathBuf>,

    /// Number of vaccine peptides to report
    #[arg(short = 'n', long = "count")]
    count: Option<usize>,

    /// Write the selected peptides as JSON
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Write every scored epitope as JSON
    #[arg(long = "output-epitopes")]
    output_epitopes: Option<PathBuf>,

    /// Print scored epitopes per source sequence
    #[arg(long = "print-epitopes")]
    print_epitopes: bool,

    /// Only log warnings and errors
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

fn main() -> Result<()> {
    let start = Instant::now();
    let cli_args = Cli::parse();

    let level = if cli_args.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    cli::banner("Vaccine Peptide Selection");

    // ── Configuration ────────────────────────────────────
    cli::section("Configuration");

    let mut config = match &cli_args.config {
        Some(path) => {
            cli::kv("Config", &path.display().to_string());
            PipelineConfig::from_file(path)?
        }
        None => {
            let mut config = PipelineConfig::default();
            config.normalize_alleles()?;
            config.validate()?;
            config
        }
    };
    let hla_override = match &cli_args.hla_file {
        Some(path) => Some(
            read_hla_file(path)
                .with_context(|| format!("failed to read HLA file: {}", path.display()))?,
        ),
        None if !cli_args.hla.is_empty() => Some(parse_hla_alleles(&cli_args.hla.join(","))?),
        None => None,
    };
    if let Some(alleles) = hla_override {
        config.alleles = alleles;
        config.validate()?;
    }
    cli::kv("Alleles", &config.alleles.join(", "));
    cli::kv(
        "Peptide length",
        &format!("{} (padding {})", config.vaccine_peptide_length, config.padding),
    );
    cli::kv("Scoring", &config.scoring.measure.to_string());

    if cli_args.vcf.is_empty() && cli_args.peptide.is_empty() {
        bail!("no input: supply at least one --vcf or --peptide");
    }

    eprintln!();

    // ── Reference ────────────────────────────────────────
    let reference = if cli_args.vcf.is_empty() {
        ReferenceData::default()
    } else {
        cli::section("Reference");
        let Some(annotation) = cli_args.annotation.as_deref() else {
            bail!("--annotation is required with --vcf");
        };
        let paths = ReferencePaths {
            annotation,
            cds: cli_args.cds.as_deref(),
            cdna: cli_args.cdna.as_deref(),
            protein: cli_args.protein.as_deref(),
        };
        let reference = ReferenceData::load(&paths)
            .with_context(|| format!("failed to load reference from {}", annotation.display()))?;
        cli::kv("Transcripts", &reference.annotation.len().to_string());
        cli::kv("CDS", &reference.sequences.cds.len().to_string());
        cli::kv("cDNA", &reference.sequences.cdna.len().to_string());
        cli::kv("Protein", &reference.sequences.protein.len().to_string());
        eprintln!();
        reference
    };

    // ── Mutations ────────────────────────────────────────
    cli::section("Mutations");

    let mut variants = Vec::new();
    for path in &cli_args.vcf {
        let parsed = read_vcf_file(path, config.drop_low_quality)
            .with_context(|| format!("failed to read VCF: {}", path.display()))?;
        cli::kv("VCF", &format!("{} ({} variants)", path.display(), parsed.len()));
        variants.extend(parsed);
    }
    let peptides = cli_args
        .peptide
        .iter()
        .map(|p| parse_mutated_peptide(p))
        .collect::<Result<Vec<_>, _>>()?;

    let pipeline = Pipeline::new(&reference, &config);
    let (regions, report) = pipeline.process(&variants, peptides);
    let summary = report.summary();

    eprint!("{report}");
    cli::kv("Inputs", &summary.inputs.to_string());
    cli::kv("Peptides", &summary.peptides.to_string());
    if summary.duplicates > 0 {
        cli::kv("Duplicates", &summary.duplicates.to_string());
    }
    if summary.skipped + summary.no_transcript > 0 {
        cli::warning(&format!(
            "{} skipped, {} without an overlapping transcript",
            summary.skipped, summary.no_transcript
        ));
    }

    eprintln!();

    // ── Binding ──────────────────────────────────────────
    cli::section("Binding");

    let predictor: Box<dyn BindingPredictor> = match &cli_args.bindings {
        Some(path) => {
            let table = PrecomputedBindings::from_file(path)
                .with_context(|| format!("failed to read bindings: {}", path.display()))?;
            cli::kv("Bindings", &format!("{} ({} rows)", path.display(), table.len()));
            Box::new(table)
        }
        None => {
            cli::warning(&format!("random binding predictions (seed {})", cli_args.seed));
            Box::new(RandomBindingPredictor::new(
                config.epitope_lengths.clone(),
                cli_args.seed,
            ))
        }
    };
    let thymic = cli_args
        .self_peptides
        .as_deref()
        .map(ThymicDeletionFilter::from_file)
        .transpose()
        .context("failed to read self peptides")?;
    if let Some(filter) = &thymic {
        cli::kv("Self peptides", &filter.len().to_string());
    }

    let epitopes = pipeline.predict_epitopes(
        &regions,
        predictor.as_ref(),
        &config.alleles,
        thymic.as_ref(),
    )?;
    let total: usize = epitopes.values().map(Vec::len).sum();
    cli::kv("Epitopes", &total.to_string());

    let scorer = config.scorer();
    if cli_args.print_epitopes || cli_args.output_epitopes.is_some() {
        let scored = score_epitopes(&regions, &epitopes, &scorer);
        if cli_args.print_epitopes {
            print_epitopes(&scored);
        }
        if let Some(path) = &cli_args.output_epitopes {
            let file = File::create(path)
                .with_context(|| format!("failed to create epitope file: {}", path.display()))?;
            serde_json::to_writer_pretty(BufWriter::new(file), &scored)
                .context("failed to write scored epitopes")?;
            cli::kv("Epitope output", &path.display().to_string());
        }
    }

    eprintln!();

    // ── Selection ────────────────────────────────────────
    cli::section("Selection");

    let mut records = pipeline.select_vaccine_peptides(&regions, &epitopes, &scorer)?;
    if let Some(count) = cli_args.count {
        records.truncate(count);
    }
    print_records(&records);
    cli::success(&format!("{} vaccine peptides selected", records.len().to_string().bold()));

    if let Some(path) = &cli_args.output {
        let file = File::create(path)
            .with_context(|| format!("failed to create output file: {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &records)
            .context("failed to write vaccine peptides")?;
        cli::kv("Output", &path.display().to_string());
    }

    // ── Summary ──────────────────────────────────────────
    cli::print_summary(start);
    Ok(())
}

fn print_records(records: &[VaccinePeptideRecord]) {
    for (i, record) in records.iter().enumerate() {
        let candidate = &record.candidate;
        println!(
            ">{} Gene={}, Transcript={}, Mut={} ({}:{}), Score={:.4}",
            i + 1,
            record.gene_name,
            record.transcript_id,
            record.annotation,
            candidate.mutation_start,
            candidate.mutation_end,
            candidate.mutant_score
        );
        println!("{}", candidate.peptide);
    }
}

fn print_epitopes(scored: &[ScoredEpitope]) {
    let mut source = "";
    for epitope in scored {
        if epitope.source_sequence != source {
            source = &epitope.source_sequence;
            println!("{source}");
        }
        println!(
            "\t{}\t{}..{}\t{:.4}{}",
            epitope.epitope.sequence,
            epitope.epitope.start,
            epitope.epitope.end,
            epitope.score,
            if epitope.mutant { "\t<-- MUTANT" } else { "" }
        );
    }
}
