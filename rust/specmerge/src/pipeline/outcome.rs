//! Accumulator for parallel per-spectrum outcomes.
//!
//! Workers produce one [`SpectrumOutcome`] per spectrum; the fold-reduce
//! pattern merges them into a single batch result with no shared mutable
//! state: each thread folds into a local accumulator, local accumulators
//! are then reduced pairwise.

use crate::input_map::ScoreSample;
use crate::models::{
    AdvocateId,
    SpectrumMatch,
};
use rayon::iter::{
    FromParallelIterator,
    IntoParallelIterator,
    ParallelIterator,
};

/// Everything one worker decided about one spectrum.
#[derive(Debug, Default)]
pub(crate) struct SpectrumOutcome {
    /// The pruned record to persist, if anything was committed.
    pub(crate) write: Option<SpectrumMatch>,
    /// One `(advocate, sample)` per committed representative.
    pub(crate) samples: Vec<(AdvocateId, ScoreSample)>,
}

#[derive(Debug, Default)]
pub(crate) struct BatchAccumulator {
    pub(crate) writes: Vec<SpectrumMatch>,
    pub(crate) samples: Vec<(AdvocateId, ScoreSample)>,
}

impl BatchAccumulator {
    fn fold(mut self, outcome: SpectrumOutcome) -> Self {
        if let Some(write) = outcome.write {
            self.writes.push(write);
        }
        self.samples.extend(outcome.samples);
        self
    }

    fn reduce(mut self, other: Self) -> Self {
        self.writes.extend(other.writes);
        self.samples.extend(other.samples);
        self
    }
}

impl FromParallelIterator<SpectrumOutcome> for BatchAccumulator {
    fn from_par_iter<I>(par_iter: I) -> Self
    where
        I: IntoParallelIterator<Item = SpectrumOutcome>,
    {
        par_iter
            .into_par_iter()
            .fold(BatchAccumulator::default, BatchAccumulator::fold)
            .reduce(BatchAccumulator::default, BatchAccumulator::reduce)
    }
}
