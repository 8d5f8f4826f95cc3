use super::advocate::AdvocateId;
use super::assumption::{
    PeptideAssumption,
    TagAssumption,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Identity of an acquired spectrum: source file plus spectrum title.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SpectrumKey {
    pub file: Arc<str>,
    pub title: Arc<str>,
}

impl SpectrumKey {
    pub fn new(file: &str, title: &str) -> Self {
        Self {
            file: file.into(),
            title: title.into(),
        }
    }
}

impl std::fmt::Display for SpectrumKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}", self.file, self.title)
    }
}

/// All candidate identifications for one spectrum, grouped by advocate.
///
/// Within an advocate, assumptions are kept ordered by score (best first,
/// lower is better). Created by a format adapter, mutated during
/// consolidation (assumptions pruned down to the committed representative)
/// and merged rather than duplicated when a later file contributes
/// assumptions for the same key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumMatch {
    pub key: SpectrumKey,
    /// Experimental (observed) precursor monoisotopic mass in Da.
    pub precursor_mass: f64,
    peptide_assumptions: BTreeMap<AdvocateId, Vec<PeptideAssumption>>,
    tag_assumptions: BTreeMap<AdvocateId, Vec<TagAssumption>>,
}

impl SpectrumMatch {
    pub fn new(key: SpectrumKey, precursor_mass: f64) -> Self {
        Self {
            key,
            precursor_mass,
            peptide_assumptions: BTreeMap::new(),
            tag_assumptions: BTreeMap::new(),
        }
    }

    pub fn add_peptide_assumption(&mut self, assumption: PeptideAssumption) {
        let list = self
            .peptide_assumptions
            .entry(assumption.advocate)
            .or_default();
        if list.contains(&assumption) {
            return;
        }
        let pos = list
            .partition_point(|a| a.score.total_cmp(&assumption.score).is_le());
        list.insert(pos, assumption);
    }

    pub fn add_tag_assumption(&mut self, assumption: TagAssumption) {
        let list = self.tag_assumptions.entry(assumption.advocate).or_default();
        if list.contains(&assumption) {
            return;
        }
        let pos = list
            .partition_point(|a| a.score.total_cmp(&assumption.score).is_le());
        list.insert(pos, assumption);
    }

    /// Advocates that contributed any assumption, in deterministic order.
    pub fn advocates(&self) -> Vec<AdvocateId> {
        let mut ids: Vec<AdvocateId> = self
            .peptide_assumptions
            .keys()
            .chain(self.tag_assumptions.keys())
            .copied()
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    pub fn peptide_assumptions(&self, advocate: AdvocateId) -> &[PeptideAssumption] {
        self.peptide_assumptions
            .get(&advocate)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn tag_assumptions(&self, advocate: AdvocateId) -> &[TagAssumption] {
        self.tag_assumptions
            .get(&advocate)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_tags(&self) -> bool {
        self.tag_assumptions.values().any(|v| !v.is_empty())
    }

    pub fn assumption_count(&self) -> usize {
        self.peptide_assumptions.values().map(Vec::len).sum::<usize>()
            + self.tag_assumptions.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.assumption_count() == 0
    }

    /// Replace the assumptions of `advocate` with the single committed
    /// representative.
    pub fn retain_peptide(&mut self, advocate: AdvocateId, assumption: PeptideAssumption) {
        self.tag_assumptions.remove(&advocate);
        self.peptide_assumptions.insert(advocate, vec![assumption]);
    }

    /// Replace the assumptions of `advocate` with the committed tag.
    pub fn retain_tag(&mut self, advocate: AdvocateId, assumption: TagAssumption) {
        self.peptide_assumptions.remove(&advocate);
        self.tag_assumptions.insert(advocate, vec![assumption]);
    }

    /// Drop every assumption of `advocate`.
    pub fn clear_advocate(&mut self, advocate: AdvocateId) {
        self.peptide_assumptions.remove(&advocate);
        self.tag_assumptions.remove(&advocate);
    }

    /// Union the assumption sets of a record for the same spectrum seen in
    /// another input file. Identical assumptions are not duplicated.
    pub fn merge(&mut self, other: SpectrumMatch) {
        assert_eq!(
            self.key, other.key,
            "Merging spectrum matches with different keys"
        );
        for (_, assumptions) in other.peptide_assumptions {
            for a in assumptions {
                self.add_peptide_assumption(a);
            }
        }
        for (_, assumptions) in other.tag_assumptions {
            for a in assumptions {
                self.add_tag_assumption(a);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> SpectrumKey {
        SpectrumKey::new("run1.mgf", "scan=100")
    }

    #[test]
    fn test_assumptions_sorted_best_first() {
        let mut sm = SpectrumMatch::new(key(), 800.0);
        for score in [0.5, 0.001, 0.01] {
            sm.add_peptide_assumption(PeptideAssumption::new(
                "PEPTIDE",
                2,
                score,
                AdvocateId::MSGF,
                800.0,
            ));
        }
        let scores: Vec<f64> = sm
            .peptide_assumptions(AdvocateId::MSGF)
            .iter()
            .map(|a| a.score)
            .collect();
        assert_eq!(scores, vec![0.001, 0.01, 0.5]);
    }

    #[test]
    fn test_merge_unions_without_duplicates() {
        let mut a = SpectrumMatch::new(key(), 800.0);
        a.add_peptide_assumption(PeptideAssumption::new(
            "PEPTIDE",
            2,
            0.01,
            AdvocateId::MSGF,
            800.0,
        ));

        let mut b = SpectrumMatch::new(key(), 800.0);
        // Same assumption again plus a new one from another engine
        b.add_peptide_assumption(PeptideAssumption::new(
            "PEPTIDE",
            2,
            0.01,
            AdvocateId::MSGF,
            800.0,
        ));
        b.add_tag_assumption(TagAssumption::new("PEPT", 2, 12.0, AdvocateId::NOVOR));

        a.merge(b);
        assert_eq!(a.peptide_assumptions(AdvocateId::MSGF).len(), 1);
        assert_eq!(a.tag_assumptions(AdvocateId::NOVOR).len(), 1);
        assert_eq!(a.assumption_count(), 2);
    }

    #[test]
    fn test_retain_prunes_to_single_representative() {
        let mut sm = SpectrumMatch::new(key(), 800.0);
        sm.add_peptide_assumption(PeptideAssumption::new(
            "PEPTIDE",
            2,
            0.01,
            AdvocateId::MSGF,
            800.0,
        ));
        sm.add_peptide_assumption(PeptideAssumption::new(
            "PEPTIDES",
            2,
            0.5,
            AdvocateId::MSGF,
            900.0,
        ));
        let keep = sm.peptide_assumptions(AdvocateId::MSGF)[0].clone();
        sm.retain_peptide(AdvocateId::MSGF, keep);
        assert_eq!(sm.assumption_count(), 1);
    }
}
