//! CDS, cDNA and protein sequence dictionaries keyed by transcript ID.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use crate::error::Error;
use crate::fasta::{self, FastaRecord, strip_version};

/// Read-only access to reference sequences by transcript ID.
pub trait SequenceProvider {
    fn cds(&self, transcript_id: &str) -> Option<&[u8]>;
    fn cdna(&self, transcript_id: &str) -> Option<&[u8]>;
    fn protein(&self, transcript_id: &str) -> Option<&[u8]>;
}

/// Which cross-reference a FASTA header is indexed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    Cds,
    Cdna,
    Protein,
}

impl SequenceKind {
    fn name(self) -> &'static str {
        match self {
            Self::Cds => "CDS",
            Self::Cdna => "cDNA",
            Self::Protein => "protein",
        }
    }
}

/// Sequence dictionary indexed by transcript ID.
#[derive(Debug, Default)]
pub struct SequenceDictionary {
    sequences: HashMap<String, Vec<u8>>,
}

impl SequenceDictionary {
    /// Index parsed FASTA records.
    ///
    /// Protein records are keyed by the ` transcript:` marker of Ensembl
    /// peptide headers when present, otherwise by their own ID. A trailing
    /// `*` on protein sequences is dropped.
    pub fn from_records(kind: SequenceKind, records: Vec<FastaRecord>) -> Result<Self, Error> {
        let mut sequences = HashMap::with_capacity(records.len());
        for (id, header, mut seq) in records {
            let key = match kind {
                SequenceKind::Protein => {
                    if seq.last() == Some(&b'*') {
                        seq.pop();
                    }
                    transcript_cross_reference(&header).unwrap_or(id)
                }
                SequenceKind::Cds | SequenceKind::Cdna => id,
            };
            if sequences.contains_key(&key) {
                return Err(Error::Validation(format!(
                    "duplicate transcript ID in {} FASTA: {key}",
                    kind.name()
                )));
            }
            sequences.insert(key, seq);
        }
        Ok(Self { sequences })
    }

    pub fn from_reader<R: BufRead>(kind: SequenceKind, reader: R) -> Result<Self, Error> {
        Self::from_records(kind, fasta::parse_fasta_with_headers(reader)?)
    }

    pub fn from_file(kind: SequenceKind, path: &Path) -> Result<Self, Error> {
        Self::from_records(kind, fasta::read_fasta_file(path)?)
    }

    #[must_use]
    pub fn get(&self, transcript_id: &str) -> Option<&[u8]> {
        self.sequences.get(transcript_id).map(|v| v.as_slice())
    }

    pub fn insert(&mut self, transcript_id: &str, sequence: &[u8]) {
        self.sequences
            .insert(transcript_id.to_string(), sequence.to_ascii_uppercase());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

fn transcript_cross_reference(header: &str) -> Option<String> {
    let pos = header.find(" transcript:")?;
    let rest = &header[pos + " transcript:".len()..];
    let tid = rest.split_whitespace().next()?;
    Some(strip_version(tid).to_string())
}

/// The three reference dictionaries used by the mutation applicator.
#[derive(Debug, Default)]
pub struct ReferenceSequences {
    pub cds: SequenceDictionary,
    pub cdna: SequenceDictionary,
    pub protein: SequenceDictionary,
}

impl ReferenceSequences {
    /// Load whichever FASTA files are given; missing ones stay empty.
    pub fn from_files(
        cds: Option<&Path>,
        cdna: Option<&Path>,
        protein: Option<&Path>,
    ) -> Result<Self, Error> {
        let load = |kind, path: Option<&Path>| match path {
            Some(path) => SequenceDictionary::from_file(kind, path),
            None => Ok(SequenceDictionary::default()),
        };
        Ok(Self {
            cds: load(SequenceKind::Cds, cds)?,
            cdna: load(SequenceKind::Cdna, cdna)?,
            protein: load(SequenceKind::Protein, protein)?,
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cds.is_empty() && self.cdna.is_empty() && self.protein.is_empty()
    }
}

impl SequenceProvider for ReferenceSequences {
    fn cds(&self, transcript_id: &str) -> Option<&[u8]> {
        self.cds.get(transcript_id)
    }

    fn cdna(&self, transcript_id: &str) -> Option<&[u8]> {
        self.cdna.get(transcript_id)
    }

    fn protein(&self, transcript_id: &str) -> Option<&[u8]> {
        self.protein.get(transcript_id)
    }
}
