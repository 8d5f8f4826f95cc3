//! Reconciliation of engine-specific modification tokens against the
//! canonical catalog.
//!
//! Each engine encodes chemical modifications its own way; by the time a
//! candidate reaches this module the token has been decoded into a mass
//! delta and a reported site. Reconciliation assigns a canonical catalog
//! name and a confirmed site to every variable modification, in four
//! phases:
//!
//! 1. candidate enumeration per compatible site (mass within the catalog
//!    resolution, terminal/residue specificity honored),
//! 2. terminal lock-in: an unambiguous N-/C-terminal match is assigned
//!    first and removed from further competition,
//! 3. unique interior assignment,
//! 4. greedy nearest-available-site alignment for whatever remains.
//!
//! Phase 4 is a greedy assignment, not an optimal bipartite matching; when
//! two unresolved matches compete for overlapping site sets an optimal
//! assignment could differ. The greedy behavior is kept deliberately.
//!
//! A match that survives no phase is tagged with the `"unknown"` sentinel
//! rather than dropped. Whether that degrades or rejects the assumption is
//! a configuration choice.

use crate::filter::RejectReason;
use crate::models::modification::ModificationCatalog;
use crate::models::{
    ModificationEntry,
    PeptideAssumption,
};
use std::collections::HashSet;
use std::sync::Arc;

/// How each modification match of an assumption was settled. Used by the
/// statistics and asserted on in tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub terminal_locked: usize,
    pub unique_assigned: usize,
    pub greedy_aligned: usize,
    pub unknown: usize,
}

impl ReconcileReport {
    pub fn confident(&self) -> usize {
        self.terminal_locked + self.unique_assigned + self.greedy_aligned
    }
}

pub struct ModificationReconciler<'a> {
    catalog: &'a ModificationCatalog,
    allow_unknown: bool,
}

/// Candidate placements for one unresolved modification match.
struct Candidates<'a> {
    /// Index into `assumption.modifications`.
    mod_idx: usize,
    reported_site: usize,
    /// `(site, entry)` pairs, site-ascending; entries at the same site are
    /// name-ascending (catalog order).
    placements: Vec<(usize, &'a ModificationEntry)>,
}

impl<'a> ModificationReconciler<'a> {
    pub fn new(catalog: &'a ModificationCatalog, allow_unknown: bool) -> Self {
        Self {
            catalog,
            allow_unknown,
        }
    }

    /// Reconcile every variable modification on `assumption` in place.
    ///
    /// Fixed modifications arrive already canonical (the engines are
    /// configured with them by name) and are confirmed at their reported
    /// site as-is.
    pub fn reconcile(
        &self,
        assumption: &mut PeptideAssumption,
    ) -> std::result::Result<ReconcileReport, RejectReason> {
        let mut report = ReconcileReport::default();
        let sequence: Arc<str> = assumption.sequence.clone();
        let len = sequence.len();

        for m in assumption.modifications.iter_mut().filter(|m| !m.variable) {
            let name: Arc<str> = m.token.clone().into();
            let site = m.site;
            m.resolve(name, site);
        }

        let mut unresolved: Vec<Candidates> = assumption
            .modifications
            .iter()
            .enumerate()
            .filter(|(_, m)| m.variable && !m.is_resolved())
            .map(|(i, m)| Candidates {
                mod_idx: i,
                reported_site: m.site,
                placements: (1..=len)
                    .flat_map(|site| {
                        self.catalog
                            .compatible_at(m.mass, &sequence, site)
                            .into_iter()
                            .map(move |e| (site, e))
                    })
                    .collect(),
            })
            .collect();

        // Sites already holding an assignment; no second modification may
        // claim them.
        let mut claimed: HashSet<usize> = HashSet::new();

        // Phase 2: terminal lock-in. A terminal placement wins only when a
        // single terminal-specific entry fits and no other unresolved match
        // of the same mass competes for that terminus.
        let mut assigned: Vec<(usize, Arc<str>, usize)> = Vec::new();
        for ci in 0..unresolved.len() {
            let (reported, mass) = {
                let c = &unresolved[ci];
                (
                    c.reported_site,
                    assumption.modifications[c.mod_idx].mass,
                )
            };
            if reported != 1 && reported != len {
                continue;
            }
            let terminal_entries: Vec<&ModificationEntry> = unresolved[ci]
                .placements
                .iter()
                .filter(|(site, e)| *site == reported && e.specificity.is_terminal())
                .map(|(_, e)| *e)
                .collect();
            if terminal_entries.len() != 1 {
                continue;
            }
            let competing = unresolved.iter().enumerate().any(|(cj, other)| {
                cj != ci
                    && (assumption.modifications[other.mod_idx].mass - mass).abs()
                        <= ModificationCatalog::MASS_RESOLUTION
                    && other.placements.iter().any(|(site, _)| *site == reported)
            });
            if competing {
                continue;
            }
            assigned.push((ci, terminal_entries[0].name.clone(), reported));
            claimed.insert(reported);
            report.terminal_locked += 1;
        }
        Self::apply(&mut unresolved, &mut assigned, assumption);

        // Phase 3: interior sites with exactly one unclaimed candidate.
        for ci in 0..unresolved.len() {
            let open: Vec<(usize, &ModificationEntry)> = unresolved[ci]
                .placements
                .iter()
                .filter(|(site, _)| !claimed.contains(site))
                .map(|(site, e)| (*site, *e))
                .collect();
            if open.len() == 1 {
                let (site, entry) = open[0];
                assigned.push((ci, entry.name.clone(), site));
                claimed.insert(site);
                report.unique_assigned += 1;
            }
        }
        Self::apply(&mut unresolved, &mut assigned, assumption);

        // Phase 4: greedy alignment of leftovers to the nearest compatible
        // unclaimed site. Reported-site order keeps the pass deterministic.
        unresolved.sort_by_key(|c| (c.reported_site, c.mod_idx));
        for ci in 0..unresolved.len() {
            let reported = unresolved[ci].reported_site;
            let best = unresolved[ci]
                .placements
                .iter()
                .filter(|(site, _)| !claimed.contains(site))
                .min_by_key(|(site, e)| {
                    let dist = site.abs_diff(reported);
                    (dist, *site, e.name.clone())
                });
            if let Some((site, entry)) = best {
                assigned.push((ci, entry.name.clone(), *site));
                claimed.insert(*site);
                report.greedy_aligned += 1;
            }
        }
        Self::apply(&mut unresolved, &mut assigned, assumption);

        // Whatever is left has no compatible open site.
        for c in &unresolved {
            assumption.modifications[c.mod_idx].mark_unknown();
            report.unknown += 1;
        }
        if report.unknown > 0 && !self.allow_unknown {
            return Err(RejectReason::Modification);
        }

        Ok(report)
    }

    /// Write pending assignments into the assumption and drop the settled
    /// entries from the unresolved set.
    fn apply(
        unresolved: &mut Vec<Candidates>,
        assigned: &mut Vec<(usize, Arc<str>, usize)>,
        assumption: &mut PeptideAssumption,
    ) {
        if assigned.is_empty() {
            return;
        }
        let mut settled: Vec<usize> = Vec::with_capacity(assigned.len());
        for (ci, name, site) in assigned.drain(..) {
            let mod_idx = unresolved[ci].mod_idx;
            assumption.modifications[mod_idx].resolve(name, site);
            settled.push(ci);
        }
        settled.sort_unstable();
        for ci in settled.into_iter().rev() {
            unresolved.remove(ci);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AdvocateId,
        ModificationMatch,
        SiteSpecificity,
    };

    fn catalog() -> ModificationCatalog {
        ModificationCatalog::new(vec![
            ModificationEntry::new("Acetylation", 42.0106, SiteSpecificity::NTerminus),
            ModificationEntry::new(
                "Oxidation",
                15.9949,
                SiteSpecificity::Residue {
                    residues: vec!['M'],
                },
            ),
            ModificationEntry::new(
                "Phosphorylation",
                79.9663,
                SiteSpecificity::Residue {
                    residues: vec!['S', 'T', 'Y'],
                },
            ),
            ModificationEntry::new("Amidation", -0.9840, SiteSpecificity::CTerminus),
        ])
    }

    fn assumption(seq: &str, mods: Vec<ModificationMatch>) -> PeptideAssumption {
        let mut a = PeptideAssumption::new(seq, 2, 0.001, AdvocateId::MSGF, 1000.0);
        a.modifications = mods;
        a
    }

    #[test]
    fn test_nterm_acetylation_locked_without_fallback() {
        let cat = catalog();
        let rec = ModificationReconciler::new(&cat, true);
        let mut a = assumption(
            "MKTAYK",
            vec![ModificationMatch::raw("+42.0106", 42.0106, 1, true)],
        );
        let report = rec.reconcile(&mut a).unwrap();
        assert_eq!(report.terminal_locked, 1);
        assert_eq!(report.greedy_aligned, 0);
        assert_eq!(report.unknown, 0);
        let m = &a.modifications[0];
        assert_eq!(m.canonical.as_deref(), Some("Acetylation"));
        assert_eq!(m.confirmed_site, Some(1));
    }

    #[test]
    fn test_unique_interior_assignment() {
        let cat = catalog();
        let rec = ModificationReconciler::new(&cat, true);
        // Single M in the sequence: oxidation has exactly one possible site
        let mut a = assumption(
            "PEMTIDEK",
            vec![ModificationMatch::raw("ox", 15.9949, 5, true)],
        );
        let report = rec.reconcile(&mut a).unwrap();
        assert_eq!(report.unique_assigned, 1);
        assert_eq!(a.modifications[0].canonical.as_deref(), Some("Oxidation"));
        // Confirmed at the actual M, not the misreported site
        assert_eq!(a.modifications[0].confirmed_site, Some(3));
    }

    #[test]
    fn test_greedy_alignment_nearest_site() {
        let cat = catalog();
        let rec = ModificationReconciler::new(&cat, true);
        // Two phosphorylations, three compatible sites (S2, T4, S6); both
        // reported at the same position must spread deterministically.
        let mut a = assumption(
            "ASATASK",
            vec![
                ModificationMatch::raw("p1", 79.9663, 4, true),
                ModificationMatch::raw("p2", 79.9663, 4, true),
            ],
        );
        let report = rec.reconcile(&mut a).unwrap();
        assert_eq!(report.greedy_aligned, 2);
        let sites: Vec<usize> = a
            .modifications
            .iter()
            .map(|m| m.confirmed_site.unwrap())
            .collect();
        // First claims T4 (distance 0), second claims S2 (distance 2,
        // smaller site wins over S6)
        assert_eq!(sites, vec![4, 2]);
    }

    #[test]
    fn test_unresolvable_tagged_unknown() {
        let cat = catalog();
        let rec = ModificationReconciler::new(&cat, true);
        // No catalog entry within 0.01 Da of 100.0
        let mut a = assumption(
            "PEPTIDEK",
            vec![ModificationMatch::raw("x100", 100.0, 3, true)],
        );
        let report = rec.reconcile(&mut a).unwrap();
        assert_eq!(report.unknown, 1);
        assert!(a.modifications[0].is_unknown());
        assert_eq!(a.modifications[0].confirmed_site, Some(3));
    }

    #[test]
    fn test_unknown_rejected_when_disallowed() {
        let cat = catalog();
        let rec = ModificationReconciler::new(&cat, false);
        let mut a = assumption(
            "PEPTIDEK",
            vec![ModificationMatch::raw("x100", 100.0, 3, true)],
        );
        assert_eq!(rec.reconcile(&mut a), Err(RejectReason::Modification));
    }

    #[test]
    fn test_fixed_modifications_pass_through() {
        let cat = catalog();
        let rec = ModificationReconciler::new(&cat, true);
        let mut a = assumption(
            "PECTIDEK",
            vec![ModificationMatch::raw("Carbamidomethylation", 57.0215, 3, false)],
        );
        let report = rec.reconcile(&mut a).unwrap();
        assert_eq!(report.confident(), 0);
        assert_eq!(
            a.modifications[0].canonical.as_deref(),
            Some("Carbamidomethylation")
        );
        assert_eq!(a.modifications[0].confirmed_site, Some(3));
    }

    #[test]
    fn test_resolved_mass_within_resolution() {
        let cat = catalog();
        let rec = ModificationReconciler::new(&cat, true);
        let mut a = assumption(
            "MKTAYSK",
            vec![
                ModificationMatch::raw("+42.011", 42.0106, 1, true),
                ModificationMatch::raw("+79.966", 79.9663, 6, true),
            ],
        );
        rec.reconcile(&mut a).unwrap();
        for m in a.modifications.iter().filter(|m| !m.is_unknown()) {
            let entry = cat.by_name(m.canonical.as_deref().unwrap()).unwrap();
            assert!((entry.mass - m.mass).abs() <= ModificationCatalog::MASS_RESOLUTION);
        }
    }
}
