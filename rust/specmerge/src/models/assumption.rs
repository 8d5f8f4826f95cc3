use super::advocate::AdvocateId;
use serde::{
    Deserialize,
    Serialize,
};
use std::sync::Arc;

/// Sentinel canonical name for a modification that could not be resolved
/// against the catalog. Carried instead of dropping the match silently;
/// never counted as a confident localization.
pub const UNKNOWN_MODIFICATION: &str = "unknown";

/// A modification reported by an engine on a candidate peptide.
///
/// Before reconciliation only the engine token, its implied mass and the
/// reported site are set. Reconciliation fills `canonical` and
/// `confirmed_site` (or tags the match with [`UNKNOWN_MODIFICATION`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModificationMatch {
    /// Engine-specific token, e.g. `"+42.011"` or `"ace@1"`.
    pub token: String,
    /// Monoisotopic mass delta implied by the token, in Da.
    pub mass: f64,
    /// 1-based sequence position reported by the engine.
    pub site: usize,
    pub variable: bool,
    #[serde(default)]
    pub canonical: Option<Arc<str>>,
    #[serde(default)]
    pub confirmed_site: Option<usize>,
}

impl ModificationMatch {
    pub fn raw(token: &str, mass: f64, site: usize, variable: bool) -> Self {
        Self {
            token: token.to_string(),
            mass,
            site,
            variable,
            canonical: None,
            confirmed_site: None,
        }
    }

    pub fn resolve(&mut self, name: Arc<str>, site: usize) {
        self.canonical = Some(name);
        self.confirmed_site = Some(site);
    }

    pub fn mark_unknown(&mut self) {
        self.canonical = Some(UNKNOWN_MODIFICATION.into());
        self.confirmed_site = Some(self.site);
    }

    pub fn is_resolved(&self) -> bool {
        self.canonical.is_some()
    }

    pub fn is_unknown(&self) -> bool {
        self.canonical
            .as_deref()
            .is_some_and(|n| n == UNKNOWN_MODIFICATION)
    }
}

/// A protein accession matched by a peptide sequence, as returned by the
/// protein mapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProteinHit {
    pub accession: Arc<str>,
    /// 0-based offset of the peptide within the protein sequence.
    pub offset: usize,
    pub decoy: bool,
}

/// A candidate peptide for one spectrum, reported by one engine.
///
/// Scores follow the e-value convention: lower is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeptideAssumption {
    pub sequence: Arc<str>,
    pub charge: u8,
    pub score: f64,
    pub advocate: AdvocateId,
    /// Theoretical monoisotopic mass of the peptide including its
    /// modifications, in Da.
    pub theoretic_mass: f64,
    #[serde(default)]
    pub modifications: Vec<ModificationMatch>,
    /// Filled by protein mapping; empty until then.
    #[serde(default)]
    pub proteins: Vec<ProteinHit>,
}

impl PeptideAssumption {
    pub fn new(
        sequence: &str,
        charge: u8,
        score: f64,
        advocate: AdvocateId,
        theoretic_mass: f64,
    ) -> Self {
        Self {
            sequence: sequence.into(),
            charge,
            score,
            advocate,
            theoretic_mass,
            modifications: Vec::new(),
            proteins: Vec::new(),
        }
    }

    pub fn with_modification(mut self, m: ModificationMatch) -> Self {
        self.modifications.push(m);
        self
    }

    /// Canonical identity of this assumption: sequence plus resolved
    /// modification names at their confirmed sites. Raw engine tokens
    /// never leak into the key.
    pub fn key(&self) -> String {
        let mut mods: Vec<(usize, &str)> = self
            .modifications
            .iter()
            .map(|m| {
                (
                    m.confirmed_site.unwrap_or(m.site),
                    m.canonical.as_deref().unwrap_or(UNKNOWN_MODIFICATION),
                )
            })
            .collect();
        mods.sort_unstable();
        let mut key = self.sequence.to_string();
        for (site, name) in mods {
            key.push('|');
            key.push_str(name);
            key.push('@');
            key.push_str(&site.to_string());
        }
        key
    }

    /// Absolute precursor mass deviation from the theoretical mass, in Da.
    pub fn mass_deviation_da(&self, experimental_mass: f64) -> f64 {
        (experimental_mass - self.theoretic_mass).abs()
    }

    /// Absolute precursor mass deviation in ppm of the theoretical mass.
    pub fn mass_deviation_ppm(&self, experimental_mass: f64) -> f64 {
        self.mass_deviation_da(experimental_mass) / self.theoretic_mass * 1e6
    }

    pub fn is_protein_supported(&self) -> bool {
        !self.proteins.is_empty()
    }

    /// A peptide mapping to both a target and a decoy protein is an
    /// unreliable identification and is rejected by selection.
    pub fn has_target_decoy_conflict(&self) -> bool {
        let mut target = false;
        let mut decoy = false;
        for hit in &self.proteins {
            if hit.decoy {
                decoy = true;
            } else {
                target = true;
            }
        }
        target && decoy
    }

    /// Decoy status: true when every mapped protein is a decoy. Unmapped
    /// assumptions are counted as targets.
    pub fn is_decoy(&self) -> bool {
        !self.proteins.is_empty() && self.proteins.iter().all(|p| p.decoy)
    }
}

/// A partial de-novo sequence candidate. Same scoring and charge shape as
/// [`PeptideAssumption`] but never protein-mapped; used only as a fallback
/// when no peptide assumption survives filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagAssumption {
    pub sequence: Arc<str>,
    pub charge: u8,
    pub score: f64,
    pub advocate: AdvocateId,
}

impl TagAssumption {
    pub fn new(sequence: &str, charge: u8, score: f64, advocate: AdvocateId) -> Self {
        Self {
            sequence: sequence.into(),
            charge,
            score,
            advocate,
        }
    }
}
