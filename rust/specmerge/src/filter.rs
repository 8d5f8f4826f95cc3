use crate::config::FilterConfig;
use crate::models::PeptideAssumption;
use serde::Serialize;

/// Why a candidate assumption was not retained. Every rejected candidate
/// carries exactly one reason, which increments exactly one statistics
/// counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RejectReason {
    PrecursorDeviation,
    PeptideLength,
    MissedCleavages,
    ScoreCeiling,
    ProteinConflict,
    Modification,
    /// No assumption at all could be committed for an advocate that had
    /// candidates.
    NoCandidate,
}

impl RejectReason {
    pub const ALL: [RejectReason; 7] = [
        RejectReason::PrecursorDeviation,
        RejectReason::PeptideLength,
        RejectReason::MissedCleavages,
        RejectReason::ScoreCeiling,
        RejectReason::ProteinConflict,
        RejectReason::Modification,
        RejectReason::NoCandidate,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RejectReason::PrecursorDeviation => "precursor deviation",
            RejectReason::PeptideLength => "peptide length",
            RejectReason::MissedCleavages => "missed cleavages",
            RejectReason::ScoreCeiling => "score ceiling",
            RejectReason::ProteinConflict => "target+decoy conflict",
            RejectReason::Modification => "modification issue",
            RejectReason::NoCandidate => "no retainable candidate",
        }
    }
}

/// Count of tryptic missed cleavages: internal K/R not followed by P.
pub fn tryptic_missed_cleavages(sequence: &str) -> u16 {
    let bytes = sequence.as_bytes();
    let mut count = 0u16;
    for i in 0..bytes.len().saturating_sub(1) {
        if (bytes[i] == b'K' || bytes[i] == b'R') && bytes[i + 1] != b'P' {
            count += 1;
        }
    }
    count
}

/// Stateless predicate over a single candidate assumption.
///
/// Checks run in a fixed order and short-circuit on the first failure:
/// precursor deviation, peptide length, missed cleavages, per-advocate
/// score ceiling. The caller records the returned reason in the run
/// statistics; the filter itself is purely functional.
#[derive(Debug, Clone)]
pub struct ImportFilter {
    config: FilterConfig,
}

impl ImportFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn check(
        &self,
        assumption: &PeptideAssumption,
        precursor_mass: f64,
    ) -> std::result::Result<(), RejectReason> {
        if !self
            .config
            .precursor_tolerance
            .within(assumption.theoretic_mass, precursor_mass)
        {
            return Err(RejectReason::PrecursorDeviation);
        }

        let len = assumption.sequence.len();
        if len < self.config.min_peptide_length || len > self.config.max_peptide_length {
            return Err(RejectReason::PeptideLength);
        }

        if let Some(max_mc) = self.config.max_missed_cleavages {
            if tryptic_missed_cleavages(&assumption.sequence) > max_mc {
                return Err(RejectReason::MissedCleavages);
            }
        }

        if let Some(ceiling) = self.config.score_ceilings.get(&assumption.advocate.0) {
            if assumption.score > *ceiling {
                return Err(RejectReason::ScoreCeiling);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PrecursorTolerance;
    use crate::models::AdvocateId;

    fn filter() -> ImportFilter {
        ImportFilter::new(FilterConfig {
            min_peptide_length: 6,
            max_peptide_length: 40,
            max_missed_cleavages: Some(2),
            precursor_tolerance: PrecursorTolerance::Da(0.5),
            score_ceilings: [(AdvocateId::MSGF.0, 0.1)].into(),
            allow_unknown_modifications: true,
        })
    }

    #[test]
    fn test_short_peptide_rejected_with_length_reason() {
        // Length 3 against bounds [6, 40]
        let a = PeptideAssumption::new("PKR", 2, 0.001, AdvocateId::MSGF, 399.25);
        assert_eq!(
            filter().check(&a, 399.25),
            Err(RejectReason::PeptideLength)
        );
    }

    #[test]
    fn test_precursor_checked_before_length() {
        // Both checks would fail; the precursor one fires first
        let a = PeptideAssumption::new("PKR", 2, 0.001, AdvocateId::MSGF, 399.25);
        assert_eq!(
            filter().check(&a, 405.0),
            Err(RejectReason::PrecursorDeviation)
        );
    }

    #[test]
    fn test_missed_cleavages() {
        assert_eq!(tryptic_missed_cleavages("PEPTIDE"), 0);
        assert_eq!(tryptic_missed_cleavages("PEKTIDE"), 1);
        // Trailing K does not count, K before P does not count
        assert_eq!(tryptic_missed_cleavages("PEKPIDEK"), 0);
        let a = PeptideAssumption::new("KAKAKAKA", 2, 0.001, AdvocateId::MSGF, 800.0);
        assert_eq!(
            filter().check(&a, 800.0),
            Err(RejectReason::MissedCleavages)
        );
    }

    #[test]
    fn test_score_ceiling_per_advocate() {
        let a = PeptideAssumption::new("PEPTIDEK", 2, 0.5, AdvocateId::MSGF, 900.0);
        assert_eq!(filter().check(&a, 900.0), Err(RejectReason::ScoreCeiling));
        // Another advocate has no ceiling configured
        let b = PeptideAssumption::new("PEPTIDEK", 2, 0.5, AdvocateId::XTANDEM, 900.0);
        assert_eq!(filter().check(&b, 900.0), Ok(()));
    }

    #[test]
    fn test_passing_candidate() {
        let a = PeptideAssumption::new("PEPTIDEK", 2, 0.001, AdvocateId::MSGF, 900.0);
        assert_eq!(filter().check(&a, 900.2), Ok(()));
    }
}
