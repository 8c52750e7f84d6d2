//! Reference data bundle: transcript annotation plus sequences.

use std::path::Path;

use crate::error::{Error, VariantError};
use crate::sequence::{ReferenceSequences, SequenceProvider};
use crate::transcript::{AnnotationData, Transcript, TranscriptProvider};

/// Paths of the reference inputs. Every sequence file is optional.
#[derive(Debug, Clone, Copy)]
pub struct ReferencePaths<'a> {
    pub annotation: &'a Path,
    pub cds: Option<&'a Path>,
    pub cdna: Option<&'a Path>,
    pub protein: Option<&'a Path>,
}

/// Annotation and sequences loaded once per run and only borrowed afterwards.
#[derive(Debug, Default)]
pub struct ReferenceData {
    pub annotation: AnnotationData,
    pub sequences: ReferenceSequences,
}

impl ReferenceData {
    #[must_use]
    pub fn new(annotation: AnnotationData, sequences: ReferenceSequences) -> Self {
        Self {
            annotation,
            sequences,
        }
    }

    pub fn load(paths: &ReferencePaths<'_>) -> Result<Self, Error> {
        let annotation = AnnotationData::from_json_file(paths.annotation)?;
        let sequences = ReferenceSequences::from_files(paths.cds, paths.cdna, paths.protein)?;
        if sequences.is_empty() {
            return Err(Error::Validation(
                "no CDS, cDNA or protein sequences supplied".to_string(),
            ));
        }
        log::info!(
            "loaded {} transcripts, {} CDS, {} cDNA, {} protein sequences",
            annotation.len(),
            sequences.cds.len(),
            sequences.cdna.len(),
            sequences.protein.len()
        );
        Ok(Self::new(annotation, sequences))
    }
}

impl TranscriptProvider for ReferenceData {
    fn transcript(&self, transcript_id: &str) -> Result<&Transcript, VariantError> {
        self.annotation.transcript(transcript_id)
    }

    fn overlapping_transcripts(&self, chromosome: &str, position: u32) -> Vec<&str> {
        self.annotation.overlapping_transcripts(chromosome, position)
    }
}

impl SequenceProvider for ReferenceData {
    fn cds(&self, transcript_id: &str) -> Option<&[u8]> {
        self.sequences.cds(transcript_id)
    }

    fn cdna(&self, transcript_id: &str) -> Option<&[u8]> {
        self.sequences.cdna(transcript_id)
    }

    fn protein(&self, transcript_id: &str) -> Option<&[u8]> {
        self.sequences.protein(transcript_id)
    }
}
