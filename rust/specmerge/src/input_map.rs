//! Per-engine aggregate of retained scores, read by the downstream
//! significance calibration after the import completes.

use crate::models::AdvocateId;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreSample {
    pub score: f64,
    pub decoy: bool,
}

/// Append-only multiset of `(score, decoy)` samples per advocate.
///
/// Workers never touch this directly: per-batch samples are collected
/// through the batch accumulator and merged here between batches, so reads
/// by the calibration step only begin once the content is final. The
/// guarantee is completeness (one sample per committed representative),
/// not ordering.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InputMap {
    samples: BTreeMap<u32, Vec<ScoreSample>>,
}

impl InputMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, advocate: AdvocateId, score: f64, decoy: bool) {
        self.samples
            .entry(advocate.0)
            .or_default()
            .push(ScoreSample { score, decoy });
    }

    pub fn extend(&mut self, samples: impl IntoIterator<Item = (AdvocateId, ScoreSample)>) {
        for (advocate, sample) in samples {
            self.samples.entry(advocate.0).or_default().push(sample);
        }
    }

    pub fn advocates(&self) -> impl Iterator<Item = AdvocateId> + '_ {
        self.samples.keys().map(|k| AdvocateId(*k))
    }

    pub fn sample_count(&self, advocate: AdvocateId) -> usize {
        self.samples.get(&advocate.0).map(Vec::len).unwrap_or(0)
    }

    pub fn total_samples(&self) -> usize {
        self.samples.values().map(Vec::len).sum()
    }

    pub fn decoy_count(&self, advocate: AdvocateId) -> usize {
        self.samples
            .get(&advocate.0)
            .map(|v| v.iter().filter(|s| s.decoy).count())
            .unwrap_or(0)
    }

    /// Samples of one advocate sorted best first (lowest score first under
    /// the e-value convention), the order calibration expects.
    pub fn sorted_samples(&self, advocate: AdvocateId) -> Vec<ScoreSample> {
        let mut out = self
            .samples
            .get(&advocate.0)
            .cloned()
            .unwrap_or_default();
        out.sort_by(|a, b| a.score.total_cmp(&b.score));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_counts() {
        let mut map = InputMap::new();
        map.add(AdvocateId::MSGF, 0.01, false);
        map.add(AdvocateId::MSGF, 0.5, true);
        map.add(AdvocateId::XTANDEM, 0.2, false);
        assert_eq!(map.sample_count(AdvocateId::MSGF), 2);
        assert_eq!(map.decoy_count(AdvocateId::MSGF), 1);
        assert_eq!(map.sample_count(AdvocateId::XTANDEM), 1);
        assert_eq!(map.total_samples(), 3);
    }

    #[test]
    fn test_extend_preserves_every_sample() {
        let mut map = InputMap::new();
        let batch = vec![
            (
                AdvocateId::MSGF,
                ScoreSample {
                    score: 0.1,
                    decoy: false,
                },
            ),
            (
                AdvocateId::MSGF,
                ScoreSample {
                    score: 0.1,
                    decoy: false,
                },
            ),
        ];
        // Duplicated values are distinct samples, both must survive
        map.extend(batch);
        assert_eq!(map.sample_count(AdvocateId::MSGF), 2);
    }

    #[test]
    fn test_sorted_samples_best_first() {
        let mut map = InputMap::new();
        map.add(AdvocateId::MSGF, 0.5, true);
        map.add(AdvocateId::MSGF, 0.001, false);
        map.add(AdvocateId::MSGF, 0.01, false);
        let sorted = map.sorted_samples(AdvocateId::MSGF);
        assert_eq!(sorted[0].score, 0.001);
        assert_eq!(sorted[2].score, 0.5);
    }
}
