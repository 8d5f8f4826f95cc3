use serde::{
    Deserialize,
    Serialize,
};
use std::sync::Arc;

/// Where on a peptide a canonical modification may sit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "site")]
pub enum SiteSpecificity {
    /// Any occurrence of one of the listed residues. An empty list means
    /// any residue at all.
    #[serde(rename = "residue")]
    Residue { residues: Vec<char> },
    #[serde(rename = "n_term")]
    NTerminus,
    #[serde(rename = "c_term")]
    CTerminus,
}

impl SiteSpecificity {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SiteSpecificity::NTerminus | SiteSpecificity::CTerminus)
    }
}

/// A catalog entry that engine-specific modification tokens are
/// reconciled against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModificationEntry {
    pub name: Arc<str>,
    /// Monoisotopic mass delta in Da.
    pub mass: f64,
    pub specificity: SiteSpecificity,
}

impl ModificationEntry {
    pub fn new(name: &str, mass: f64, specificity: SiteSpecificity) -> Self {
        Self {
            name: name.into(),
            mass,
            specificity,
        }
    }
}

/// The set of canonical modifications enabled for a run.
///
/// Lookup is by mass within [`ModificationCatalog::MASS_RESOLUTION`], the
/// working resolution of most engine exports.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModificationCatalog {
    entries: Vec<ModificationEntry>,
}

impl ModificationCatalog {
    /// Mass matching resolution in Da.
    pub const MASS_RESOLUTION: f64 = 0.01;

    pub fn new(mut entries: Vec<ModificationEntry>) -> Self {
        // Deterministic candidate enumeration regardless of input order.
        entries.sort_by(|a, b| {
            a.mass
                .total_cmp(&b.mass)
                .then_with(|| a.name.cmp(&b.name))
        });
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ModificationEntry] {
        &self.entries
    }

    pub fn by_name(&self, name: &str) -> Option<&ModificationEntry> {
        self.entries.iter().find(|e| e.name.as_ref() == name)
    }

    /// All enabled entries whose mass is within the working resolution of
    /// the reported mass.
    pub fn by_mass(&self, mass: f64) -> impl Iterator<Item = &ModificationEntry> {
        self.entries
            .iter()
            .filter(move |e| (e.mass - mass).abs() <= Self::MASS_RESOLUTION)
    }

    /// Entries compatible with `site` (1-based) on `sequence`, within the
    /// mass resolution of `mass`.
    ///
    /// Position 1 additionally admits N-terminal entries and the last
    /// position admits C-terminal entries.
    pub fn compatible_at<'a>(
        &'a self,
        mass: f64,
        sequence: &str,
        site: usize,
    ) -> Vec<&'a ModificationEntry> {
        let len = sequence.len();
        if site == 0 || site > len {
            return Vec::new();
        }
        let residue = sequence.as_bytes()[site - 1] as char;
        self.by_mass(mass)
            .filter(|e| match &e.specificity {
                SiteSpecificity::Residue { residues } => {
                    residues.is_empty() || residues.contains(&residue)
                }
                SiteSpecificity::NTerminus => site == 1,
                SiteSpecificity::CTerminus => site == len,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ModificationCatalog {
        ModificationCatalog::new(vec![
            ModificationEntry::new("Acetylation", 42.0106, SiteSpecificity::NTerminus),
            ModificationEntry::new(
                "Trimethylation",
                42.0470,
                SiteSpecificity::Residue {
                    residues: vec!['K'],
                },
            ),
            ModificationEntry::new(
                "Oxidation",
                15.9949,
                SiteSpecificity::Residue {
                    residues: vec!['M'],
                },
            ),
        ])
    }

    #[test]
    fn test_by_mass_resolution() {
        let cat = catalog();
        let hits: Vec<_> = cat.by_mass(42.0106).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name.as_ref(), "Acetylation");

        // 42.0106 vs 42.0470 differ by more than 0.01 Da
        let hits: Vec<_> = cat.by_mass(42.03).collect();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_compatible_at_terminal() {
        let cat = catalog();
        // N-terminal acetylation is only compatible at position 1
        assert_eq!(cat.compatible_at(42.0106, "MKTAYK", 1).len(), 1);
        assert!(cat.compatible_at(42.0106, "MKTAYK", 3).is_empty());
        // Oxidation on M at position 1
        let hits = cat.compatible_at(15.9949, "MKTAYK", 1);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name.as_ref(), "Oxidation");
    }

    #[test]
    fn test_compatible_at_residue() {
        let cat = catalog();
        let hits = cat.compatible_at(42.0470, "MKTAYK", 2);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name.as_ref(), "Trimethylation");
        assert!(cat.compatible_at(42.0470, "MKTAYK", 3).is_empty());
    }
}
