//! vaxpep: personalised cancer vaccine peptide selection from somatic variants.

pub mod error;

pub mod allele;
pub mod binding;
pub mod chromosome;
pub mod cli;
pub mod codon;
pub mod config;
pub mod fasta;
pub mod mutation;
pub mod pipeline;
pub mod reference;
pub mod scoring;
pub mod sequence;
pub mod strand;
pub mod transcript;
pub mod vaccine;
pub mod variant;
pub mod vcf;
