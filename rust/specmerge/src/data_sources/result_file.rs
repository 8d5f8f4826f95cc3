//! Decoded result files: the shape a format adapter hands to the
//! consolidation pipeline. Engine-specific parsing happens upstream; here
//! every engine looks the same.

use crate::errors::{
    InputReadingError,
    Result,
};
use crate::models::{
    Advocate,
    AdvocateId,
    ModificationMatch,
    PeptideAssumption,
    SpectrumKey,
    SpectrumMatch,
    TagAssumption,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::path::{
    Path,
    PathBuf,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerResultFile {
    pub advocates: Vec<Advocate>,
    pub matches: Vec<SerSpectrumMatch>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerSpectrumMatch {
    pub spectrum_file: String,
    pub spectrum_title: String,
    pub precursor_mass: f64,
    #[serde(default)]
    pub peptides: Vec<SerPeptideAssumption>,
    #[serde(default)]
    pub tags: Vec<SerTagAssumption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerPeptideAssumption {
    pub sequence: String,
    pub charge: u8,
    pub score: f64,
    pub advocate: u32,
    pub theoretic_mass: f64,
    #[serde(default)]
    pub modifications: Vec<SerModification>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerModification {
    pub token: String,
    pub mass: f64,
    pub site: usize,
    #[serde(default = "default_variable")]
    pub variable: bool,
}

fn default_variable() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerTagAssumption {
    pub sequence: String,
    pub charge: u8,
    pub score: f64,
    pub advocate: u32,
}

impl From<SerSpectrumMatch> for SpectrumMatch {
    fn from(x: SerSpectrumMatch) -> Self {
        let key = SpectrumKey::new(&x.spectrum_file, &x.spectrum_title);
        let mut out = SpectrumMatch::new(key, x.precursor_mass);
        for p in x.peptides {
            let mut a = PeptideAssumption::new(
                &p.sequence,
                p.charge,
                p.score,
                AdvocateId(p.advocate),
                p.theoretic_mass,
            );
            a.modifications = p
                .modifications
                .into_iter()
                .map(|m| ModificationMatch::raw(&m.token, m.mass, m.site, m.variable))
                .collect();
            out.add_peptide_assumption(a);
        }
        for t in x.tags {
            out.add_tag_assumption(TagAssumption::new(
                &t.sequence,
                t.charge,
                t.score,
                AdvocateId(t.advocate),
            ));
        }
        out
    }
}

/// One decoded result file queued for import.
#[derive(Debug, Clone)]
pub struct ResultFile {
    pub path: Option<PathBuf>,
    pub advocates: Vec<Advocate>,
    pub matches: Vec<SpectrumMatch>,
}

impl ResultFile {
    pub fn new(advocates: Vec<Advocate>, matches: Vec<SpectrumMatch>) -> Self {
        Self {
            path: None,
            advocates,
            matches,
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            InputReadingError::FileReadingError {
                source,
                path: path.to_path_buf(),
            }
        })?;
        let ser: SerResultFile = serde_json::from_str(&content).map_err(|source| {
            InputReadingError::ResultFileParsingError {
                source,
                path: path.to_path_buf(),
            }
        })?;
        Ok(Self {
            path: Some(path.to_path_buf()),
            advocates: ser.advocates,
            matches: ser.matches.into_iter().map(Into::into).collect(),
        })
    }

    pub fn declares(&self, advocate: AdvocateId) -> bool {
        self.advocates.iter().any(|a| a.id == advocate)
    }

    /// Tag-bearing files are scheduled before peptide-only files: tag
    /// mapping is the memory-hungry part and benefits from running while
    /// memory is least fragmented.
    pub fn has_tags(&self) -> bool {
        self.advocates.iter().any(|a| a.de_novo)
            || self.matches.iter().any(|m| m.has_tags())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format_decodes() {
        let json = r#"{
            "advocates": [{"id": 3, "name": "MS-GF+"}],
            "matches": [{
                "spectrum_file": "run1.mgf",
                "spectrum_title": "scan=7",
                "precursor_mass": 900.45,
                "peptides": [{
                    "sequence": "PEPTIDEK",
                    "charge": 2,
                    "score": 1e-5,
                    "advocate": 3,
                    "theoretic_mass": 900.46,
                    "modifications": [
                        {"token": "+42.011", "mass": 42.0106, "site": 1}
                    ]
                }]
            }]
        }"#;
        let ser: SerResultFile = serde_json::from_str(json).unwrap();
        let file = ResultFile::new(
            ser.advocates,
            ser.matches.into_iter().map(Into::into).collect(),
        );
        assert!(file.declares(AdvocateId::MSGF));
        assert!(!file.has_tags());
        let sm = &file.matches[0];
        let peptides = sm.peptide_assumptions(AdvocateId::MSGF);
        assert_eq!(peptides.len(), 1);
        assert!(peptides[0].modifications[0].variable);
    }

    #[test]
    fn test_missing_file_is_an_input_reading_error() {
        let err = ResultFile::from_file(Path::new("/nonexistent/results.json")).unwrap_err();
        assert!(matches!(
            err,
            crate::errors::ConsolidationError::InputReading(
                InputReadingError::FileReadingError { .. }
            )
        ));
    }

    #[test]
    fn test_de_novo_file_sorts_first() {
        let file = ResultFile::new(vec![Advocate::de_novo(AdvocateId::NOVOR, "Novor")], vec![]);
        assert!(file.has_tags());
    }
}
