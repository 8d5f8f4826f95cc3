//! Selection of a single representative candidate per spectrum per engine.
//!
//! Candidates are walked score-tier by score-tier (best first). Within a
//! tier, target+decoy conflicted assumptions are discarded, then a
//! protein-supported assumption is preferred. The commit priority across
//! the whole walk is: protein-supported peptide, then protein-unsupported
//! peptide, then de-novo tag.
//!
//! The "richer get richer" occurrence tie-break stabilizes protein-group
//! assignment across spectra. It is a policy choice, not an invariant, and
//! can be swapped for plain lexicographic ordering.

use crate::models::{
    PeptideAssumption,
    TagAssumption,
};
use crate::proteins::ProteinOccurrenceRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreakPolicy {
    /// Prefer the assumption whose protein set holds the accession with
    /// the highest current occurrence count; ties fall through to the
    /// lexicographically smallest peptide key.
    #[default]
    OccurrenceWeighted,
    /// Lexicographically smallest peptide key only.
    Lexicographic,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectedMatch {
    Peptide(PeptideAssumption),
    Tag(TagAssumption),
}

impl SelectedMatch {
    pub fn score(&self) -> f64 {
        match self {
            SelectedMatch::Peptide(p) => p.score,
            SelectedMatch::Tag(t) => t.score,
        }
    }

    /// Decoy status recorded into the input map. Tags are never
    /// protein-mapped and count as targets.
    pub fn is_decoy(&self) -> bool {
        match self {
            SelectedMatch::Peptide(p) => p.is_decoy(),
            SelectedMatch::Tag(_) => false,
        }
    }
}

/// Result of one per-advocate selection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selection {
    pub committed: Option<SelectedMatch>,
    /// Assumptions discarded for mapping to both a target and a decoy.
    pub conflict_rejections: usize,
    /// Considered assumptions without any protein mapping.
    pub unmapped_candidates: usize,
}

pub struct BestMatchSelector<'a> {
    registry: &'a ProteinOccurrenceRegistry,
    policy: TieBreakPolicy,
}

impl<'a> BestMatchSelector<'a> {
    pub fn new(registry: &'a ProteinOccurrenceRegistry, policy: TieBreakPolicy) -> Self {
        Self { registry, policy }
    }

    /// Select at most one representative among the filtered, reconciled
    /// candidates of one advocate for one spectrum.
    ///
    /// `peptides` must be ordered by score, best (lowest) first, as
    /// maintained by `SpectrumMatch`. The outcome is deterministic for a
    /// fixed occurrence-counter snapshot regardless of the order of
    /// equal-scored candidates.
    pub fn select(
        &self,
        peptides: &[PeptideAssumption],
        tags: &[TagAssumption],
    ) -> Selection {
        let mut selection = Selection::default();
        let mut best_unsupported: Option<&PeptideAssumption> = None;

        for tier in score_tiers(peptides) {
            let mut viable: Vec<&PeptideAssumption> = Vec::with_capacity(tier.len());
            for a in tier {
                if a.has_target_decoy_conflict() {
                    selection.conflict_rejections += 1;
                } else {
                    if !a.is_protein_supported() {
                        selection.unmapped_candidates += 1;
                    }
                    viable.push(a);
                }
            }

            let supported = viable
                .iter()
                .filter(|a| a.is_protein_supported())
                .copied()
                .min_by(|a, b| self.rank(a).cmp(&self.rank(b)));
            if let Some(winner) = supported {
                selection.committed = Some(SelectedMatch::Peptide(winner.clone()));
                return selection;
            }

            if best_unsupported.is_none() {
                // Remember, but keep walking: a protein-supported match in
                // a worse tier still outranks this one.
                best_unsupported = viable
                    .iter()
                    .filter(|a| !a.is_protein_supported())
                    .copied()
                    .min_by(|a, b| a.key().cmp(&b.key()));
            }
        }

        if let Some(winner) = best_unsupported {
            selection.committed = Some(SelectedMatch::Peptide(winner.clone()));
            return selection;
        }

        let best_tag = tags.iter().min_by(|a, b| {
            a.score
                .total_cmp(&b.score)
                .then_with(|| a.sequence.cmp(&b.sequence))
        });
        if let Some(tag) = best_tag {
            selection.committed = Some(SelectedMatch::Tag(tag.clone()));
        }
        selection
    }

    /// Ranking key within a tier: lower wins. Occurrence counts are
    /// negated so richer proteins sort first.
    fn rank(&self, a: &PeptideAssumption) -> (i64, String) {
        let occurrence = match self.policy {
            TieBreakPolicy::OccurrenceWeighted => a
                .proteins
                .iter()
                .map(|hit| self.registry.count(&hit.accession))
                .max()
                .unwrap_or(0),
            TieBreakPolicy::Lexicographic => 0,
        };
        (-(occurrence as i64), a.key())
    }
}

/// Split a best-first slice into runs of equal score.
fn score_tiers(peptides: &[PeptideAssumption]) -> impl Iterator<Item = &[PeptideAssumption]> {
    peptides.chunk_by(|a, b| a.score.total_cmp(&b.score).is_eq())
}
