//! Transcript data model types.

use serde::Deserialize;

use crate::strand::Strand;

/// One exon of a transcript, in 1-based inclusive genomic coordinates.
///
/// `translation_start` / `translation_end` are only set on the exons where
/// translation begins and ends; they give the 1-based offset of the first and
/// last coding base within the exon, counted in transcript orientation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exon {
    pub id: String,
    pub genomic_start: u32,
    pub genomic_end: u32,
    #[serde(default)]
    pub translation_start: Option<u32>,
    #[serde(default)]
    pub translation_end: Option<u32>,
}

impl Exon {
    #[must_use]
    pub fn new(id: &str, genomic_start: u32, genomic_end: u32) -> Self {
        Self {
            id: id.to_string(),
            genomic_start,
            genomic_end,
            translation_start: None,
            translation_end: None,
        }
    }

    #[must_use]
    pub fn length(&self) -> usize {
        (self.genomic_end - self.genomic_start) as usize + 1
    }

    #[must_use]
    pub fn contains(&self, position: u32) -> bool {
        position >= self.genomic_start && position <= self.genomic_end
    }
}

/// A spliced transcript with its exon structure.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    pub id: String,
    #[serde(default)]
    pub gene_name: String,
    pub chromosome: String,
    pub strand: Strand,
    #[serde(default)]
    pub cds_start_phase: u8,
    pub exons: Vec<Exon>,
}

impl Transcript {
    /// Genomic span covered by the exons, `None` for a transcript without exons.
    #[must_use]
    pub fn bounds(&self) -> Option<(u32, u32)> {
        let start = self.exons.iter().map(|e| e.genomic_start).min()?;
        let end = self.exons.iter().map(|e| e.genomic_end).max()?;
        Some((start, end))
    }

    #[must_use]
    pub fn spans(&self, position: u32) -> bool {
        self.bounds()
            .is_some_and(|(start, end)| position >= start && position <= end)
    }

    /// Total spliced length.
    #[must_use]
    pub fn length(&self) -> usize {
        self.exons.iter().map(Exon::length).sum()
    }
}
