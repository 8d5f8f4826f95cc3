//! A small in-process protein mapper backed by a plain accession-to-
//! sequence table. The production system uses a dedicated FASTA index;
//! this implementation serves the CLI and the tests through the same
//! [`ProteinMapper`] seam.

use crate::errors::{
    InputReadingError,
    Result,
};
use crate::models::ProteinHit;
use crate::proteins::ProteinMapper;
use serde::{
    Deserialize,
    Serialize,
};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerProteinEntry {
    pub accession: String,
    pub sequence: String,
}

#[derive(Debug, Clone)]
struct IndexEntry {
    accession: Arc<str>,
    sequence: Arc<str>,
    decoy: bool,
}

/// Linear-scan sequence index. Decoy entries are recognized by an
/// accession prefix (conventionally `rev_` or `DECOY_`).
#[derive(Debug, Clone)]
pub struct SequenceIndex {
    entries: Vec<IndexEntry>,
    decoy_tag: String,
}

impl SequenceIndex {
    pub fn new(proteins: Vec<SerProteinEntry>, decoy_tag: &str) -> Self {
        let entries = proteins
            .into_iter()
            .map(|p| IndexEntry {
                decoy: p.accession.starts_with(decoy_tag),
                accession: p.accession.into(),
                sequence: p.sequence.into(),
            })
            .collect();
        Self {
            entries,
            decoy_tag: decoy_tag.to_string(),
        }
    }

    pub fn from_file(path: &Path, decoy_tag: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            InputReadingError::FileReadingError {
                source,
                path: path.to_path_buf(),
            }
        })?;
        let proteins: Vec<SerProteinEntry> =
            serde_json::from_str(&content).map_err(|source| {
                InputReadingError::ResultFileParsingError {
                    source,
                    path: path.to_path_buf(),
                }
            })?;
        Ok(Self::new(proteins, decoy_tag))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn decoy_tag(&self) -> &str {
        &self.decoy_tag
    }
}

impl ProteinMapper for SequenceIndex {
    fn map(&self, sequence: &str) -> Vec<ProteinHit> {
        let mut hits = Vec::new();
        for entry in &self.entries {
            for (offset, _) in entry.sequence.match_indices(sequence) {
                hits.push(ProteinHit {
                    accession: entry.accession.clone(),
                    offset,
                    decoy: entry.decoy,
                });
            }
        }
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> SequenceIndex {
        SequenceIndex::new(
            vec![
                SerProteinEntry {
                    accession: "P1".to_string(),
                    sequence: "MKPEPTIDEKRTTT".to_string(),
                },
                SerProteinEntry {
                    accession: "rev_P1".to_string(),
                    sequence: "TTTRKEDITPEPKM".to_string(),
                },
            ],
            "rev_",
        )
    }

    #[test]
    fn test_target_hit_with_offset() {
        let hits = index().map("PEPTIDEK");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].accession.as_ref(), "P1");
        assert_eq!(hits[0].offset, 2);
        assert!(!hits[0].decoy);
    }

    #[test]
    fn test_decoy_hit() {
        let hits = index().map("EDITPEPK");
        assert_eq!(hits.len(), 1);
        assert!(hits[0].decoy);
    }

    #[test]
    fn test_no_hit() {
        assert!(index().map("WWWWWW").is_empty());
    }
}
