//! Transcript models, the genomic coordinate mapper, and the annotation store.

pub mod coordinates;
pub mod types;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use serde::Deserialize;

use crate::chromosome::normalize_chromosome_name;
use crate::error::{Error, VariantError};
use crate::fasta::{is_gzip_path, strip_version};
use crate::strand::Strand;

pub use coordinates::{
    Unmapped, five_prime_utr_length, three_prime_utr_length, transcript_index,
};
pub use types::{Exon, Transcript};

/// Read-only access to exon structure by transcript ID.
///
/// An unknown transcript is an error; a known transcript may still have no exons.
pub trait TranscriptProvider {
    fn transcript(&self, transcript_id: &str) -> Result<&Transcript, VariantError>;

    fn exons(&self, transcript_id: &str) -> Result<&[Exon], VariantError> {
        Ok(&self.transcript(transcript_id)?.exons)
    }

    fn strand(&self, transcript_id: &str) -> Result<Strand, VariantError> {
        Ok(self.transcript(transcript_id)?.strand)
    }

    fn cds_start_phase(&self, transcript_id: &str) -> Result<u8, VariantError> {
        Ok(self.transcript(transcript_id)?.cds_start_phase)
    }

    /// IDs of transcripts whose exon span contains the position, sorted.
    fn overlapping_transcripts(&self, chromosome: &str, position: u32) -> Vec<&str>;
}

#[derive(Deserialize)]
struct AnnotationFile {
    transcripts: Vec<Transcript>,
}

/// Transcript annotation keyed by stable ID.
#[derive(Debug, Default)]
pub struct AnnotationData {
    transcripts: HashMap<String, Transcript>,
    /// Per chromosome: (start, end, transcript ID), sorted by start.
    spans: HashMap<String, Vec<(u32, u32, String)>>,
}

impl AnnotationData {
    /// Build from transcripts, normalising chromosome names and versioned IDs.
    pub fn new(transcripts: Vec<Transcript>) -> Result<Self, Error> {
        let mut data = Self::default();
        for mut transcript in transcripts {
            transcript.id = strip_version(&transcript.id).to_string();
            transcript.chromosome = normalize_chromosome_name(&transcript.chromosome);
            validate_transcript(&transcript)?;

            if let Some((start, end)) = transcript.bounds() {
                data.spans
                    .entry(transcript.chromosome.clone())
                    .or_default()
                    .push((start, end, transcript.id.clone()));
            }
            if data.transcripts.contains_key(&transcript.id) {
                return Err(Error::Validation(format!(
                    "duplicate transcript ID in annotation: {}",
                    transcript.id
                )));
            }
            data.transcripts.insert(transcript.id.clone(), transcript);
        }
        for spans in data.spans.values_mut() {
            spans.sort();
        }
        Ok(data)
    }

    /// Read `{"transcripts": [...]}` JSON.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, Error> {
        let file: AnnotationFile = serde_json::from_reader(BufReader::new(reader))?;
        Self::new(file.transcripts)
    }

    /// Read annotation JSON from disk, decompressing `.gz` files.
    pub fn from_json_file(path: &Path) -> Result<Self, Error> {
        let file = File::open(path)?;
        if is_gzip_path(path) {
            Self::from_json_reader(GzDecoder::new(file))
        } else {
            Self::from_json_reader(file)
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.transcripts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transcripts.is_empty()
    }
}

fn validate_transcript(transcript: &Transcript) -> Result<(), Error> {
    if transcript.cds_start_phase > 2 {
        return Err(Error::Validation(format!(
            "transcript {}: CDS start phase {} is not 0, 1 or 2",
            transcript.id, transcript.cds_start_phase
        )));
    }
    for exon in &transcript.exons {
        if exon.genomic_start == 0 || exon.genomic_start > exon.genomic_end {
            return Err(Error::Validation(format!(
                "transcript {}: exon {} has invalid interval {}-{}",
                transcript.id, exon.id, exon.genomic_start, exon.genomic_end
            )));
        }
        let length = exon.length() as u32;
        for offset in [exon.translation_start, exon.translation_end].into_iter().flatten() {
            if offset == 0 || offset > length {
                return Err(Error::Validation(format!(
                    "transcript {}: translation offset {offset} outside exon {} of length {length}",
                    transcript.id, exon.id
                )));
            }
        }
    }
    Ok(())
}

impl TranscriptProvider for AnnotationData {
    fn transcript(&self, transcript_id: &str) -> Result<&Transcript, VariantError> {
        self.transcripts
            .get(transcript_id)
            .ok_or_else(|| VariantError::UnknownTranscript(transcript_id.to_string()))
    }

    fn overlapping_transcripts(&self, chromosome: &str, position: u32) -> Vec<&str> {
        let chromosome = normalize_chromosome_name(chromosome);
        let Some(spans) = self.spans.get(&chromosome) else {
            return Vec::new();
        };
        let mut ids: Vec<&str> = spans
            .iter()
            .take_while(|(start, _, _)| *start <= position)
            .filter(|(_, end, _)| *end >= position)
            .map(|(_, _, id)| id.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }
}
