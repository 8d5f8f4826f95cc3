//! The concurrency coordinator: drains the queue of decoded result files,
//! runs the per-spectrum consolidation pipeline on a bounded worker pool
//! and performs batched writes to the identification store.
//!
//! Per spectrum the full pipeline (filter, reconcile, map, select) runs
//! atomically within one worker; the only structures touched by more than
//! one worker are the protein occurrence registry (atomic increments), the
//! statistics counters (atomic) and the cancellation flag. Score samples
//! and store writes travel through the per-batch fold/reduce accumulator
//! instead of a contended lock.

use super::outcome::{
    BatchAccumulator,
    SpectrumOutcome,
};
use crate::config::ImportConfig;
use crate::data_sources::ResultFile;
use crate::errors::{
    ConsolidationError,
    Result,
};
use crate::filter::{
    ImportFilter,
    RejectReason,
};
use crate::input_map::{
    InputMap,
    ScoreSample,
};
use crate::memory::{
    MemoryGovernor,
    MemoryProbe,
    PressureState,
};
use crate::models::{
    ModificationCatalog,
    PeptideAssumption,
    SpectrumKey,
    SpectrumMatch,
};
use crate::modifications::ModificationReconciler;
use crate::pipeline::RunReport;
use crate::progress::{
    CancellationToken,
    FaultSink,
    ProgressSink,
    TracingFaultSink,
    TracingProgress,
};
use crate::proteins::{
    CachedProteinMapper,
    ProteinMapper,
    ProteinOccurrenceRegistry,
};
use crate::selection::{
    BestMatchSelector,
    SelectedMatch,
    TieBreakPolicy,
};
use crate::stats::ImportStats;
use crate::store::IdentificationStore;
use fnv::FnvHashMap;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

pub struct ImportCoordinator<M: ProteinMapper + 'static, S: IdentificationStore> {
    config: ImportConfig,
    catalog: ModificationCatalog,
    filter: ImportFilter,
    mapper: Arc<CachedProteinMapper<M>>,
    store: Arc<S>,
    registry: ProteinOccurrenceRegistry,
    stats: ImportStats,
    governor: MemoryGovernor,
    cancellation: CancellationToken,
    progress: Arc<dyn ProgressSink>,
    faults: Arc<dyn FaultSink>,
    policy: TieBreakPolicy,
}

impl<M: ProteinMapper + 'static, S: IdentificationStore> ImportCoordinator<M, S> {
    pub fn new(
        config: ImportConfig,
        catalog: ModificationCatalog,
        mapper: M,
        store: Arc<S>,
    ) -> Self {
        let mapper = Arc::new(CachedProteinMapper::new(mapper));
        let mut governor = MemoryGovernor::with_default_probe(config.memory_high_water);
        governor.register(mapper.clone());
        Self {
            filter: ImportFilter::new(config.filter.clone()),
            config,
            catalog,
            mapper,
            store,
            registry: ProteinOccurrenceRegistry::new(),
            stats: ImportStats::new(),
            governor,
            cancellation: CancellationToken::new(),
            progress: Arc::new(TracingProgress),
            faults: Arc::new(TracingFaultSink),
            policy: TieBreakPolicy::default(),
        }
    }

    pub fn with_memory_probe(mut self, probe: Box<dyn MemoryProbe>) -> Self {
        let mut governor = MemoryGovernor::new(probe, self.config.memory_high_water);
        governor.register(self.mapper.clone());
        self.governor = governor;
        self
    }

    pub fn with_tie_break(mut self, policy: TieBreakPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_fault_sink(mut self, faults: Arc<dyn FaultSink>) -> Self {
        self.faults = faults;
        self
    }

    /// Token shared with the host; cancelling it stops the run between
    /// spectrum items.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    pub fn stats(&self) -> &ImportStats {
        &self.stats
    }

    pub fn registry(&self) -> &ProteinOccurrenceRegistry {
        &self.registry
    }

    /// Import every file, consolidating into the store. Returns the run
    /// report with the input map for downstream calibration.
    pub fn run(&self, files: Vec<ResultFile>) -> Result<RunReport> {
        if self.config.threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.threads)
                .build()
                .map_err(|e| ConsolidationError::ThreadPool { msg: e.to_string() })?;
            pool.install(|| self.run_inner(files))
        } else {
            self.run_inner(files)
        }
    }

    fn run_inner(&self, mut files: Vec<ResultFile>) -> Result<RunReport> {
        self.validate(&files)?;

        // Tag-bearing (de novo) files first; stable path order after that
        // keeps reruns reproducible.
        files.sort_by_key(|f| (!f.has_tags(), f.path.clone()));

        let mut input_map = InputMap::new();
        for file in &files {
            if self.cancellation.is_canceled() {
                break;
            }
            self.check_memory()?;

            let label = file
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<in-memory>".to_string());
            self.progress
                .report(&format!("Importing {} ({} spectra)", label, file.matches.len()));

            let start = Instant::now();
            let mut nwritten = 0usize;
            for chunk in file.matches.chunks(self.config.batch_size.max(1)) {
                if self.cancellation.is_canceled() {
                    break;
                }
                let acc: BatchAccumulator = chunk
                    .par_iter()
                    .map(|sm| self.process_spectrum(sm))
                    .collect();

                input_map.extend(acc.samples);
                nwritten += acc.writes.len();
                if let Err(e) = self.flush(acc.writes) {
                    self.faults.catch(&e);
                    self.cancellation.cancel();
                    return Err(e);
                }
                self.check_memory()?;
            }

            let elapsed = start.elapsed();
            info!(
                "Imported {}/{} spectra from {} in {:?} ({:.0}/s)",
                nwritten,
                file.matches.len(),
                label,
                elapsed,
                file.matches.len() as f64 / elapsed.as_secs_f64().max(1e-9),
            );
        }

        let completed = !self.cancellation.is_canceled();
        let stats = self.stats.snapshot();
        info!("{}", stats.summary());
        Ok(RunReport {
            completed,
            stats,
            input_map,
        })
    }

    /// Structural input validation: every assumption must reference an
    /// advocate its file declared. Runs before anything is committed so a
    /// failure never leaves a partial batch behind.
    fn validate(&self, files: &[ResultFile]) -> Result<()> {
        for file in files {
            for m in &file.matches {
                for advocate in m.advocates() {
                    if !file.declares(advocate) {
                        return Err(ConsolidationError::MissingAdvocateTable {
                            advocate,
                            path: file.path.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn check_memory(&self) -> Result<()> {
        match self.governor.check() {
            PressureState::Ok => Ok(()),
            PressureState::Evicted { .. } => {
                self.stats.record_eviction_round();
                Ok(())
            }
            PressureState::Critical {
                used_bytes,
                available_bytes,
            } => {
                let err = ConsolidationError::OutOfMemory {
                    used_bytes,
                    available_bytes,
                };
                self.faults.catch(&err);
                self.cancellation.cancel();
                Err(err)
            }
        }
    }

    /// Union against existing records, then write the batch.
    ///
    /// A file may repeat a spectrum key within one chunk; those records are
    /// unioned with each other first so the batch holds at most one record
    /// per key before the store lookup.
    fn flush(&self, writes: Vec<SpectrumMatch>) -> Result<()> {
        if writes.is_empty() {
            return Ok(());
        }
        let mut batch: Vec<SpectrumMatch> = Vec::with_capacity(writes.len());
        let mut seen: FnvHashMap<SpectrumKey, usize> = FnvHashMap::default();
        for write in writes {
            if let Some(&i) = seen.get(&write.key) {
                batch[i].merge(write);
            } else {
                seen.insert(write.key.clone(), batch.len());
                batch.push(write);
            }
        }
        let batch = batch
            .into_iter()
            .map(|write| match self.store.get(&write.key) {
                Some(mut existing) => {
                    existing.merge(write);
                    existing
                }
                None => write,
            })
            .collect();
        self.store.add_batch(batch)
    }

    /// The per-spectrum pipeline, run entirely within one worker.
    fn process_spectrum(&self, sm: &SpectrumMatch) -> SpectrumOutcome {
        if self.cancellation.is_canceled() {
            return SpectrumOutcome::default();
        }
        let selector = BestMatchSelector::new(&self.registry, self.policy);
        let reconciler = ModificationReconciler::new(
            &self.catalog,
            self.config.filter.allow_unknown_modifications,
        );

        let mut out = sm.clone();
        let mut samples = Vec::new();
        let mut committed_any = false;
        for advocate in sm.advocates() {
            let mut survivors: Vec<PeptideAssumption> = Vec::new();
            for assumption in sm.peptide_assumptions(advocate) {
                if let Err(reason) = self.filter.check(assumption, sm.precursor_mass) {
                    self.stats.record_rejection(reason);
                    continue;
                }
                let mut assumption = assumption.clone();
                if let Err(reason) = reconciler.reconcile(&mut assumption) {
                    self.stats.record_rejection(reason);
                    continue;
                }
                assumption.proteins = self.mapper.map(&assumption.sequence);
                survivors.push(assumption);
            }

            let selection = selector.select(&survivors, sm.tag_assumptions(advocate));
            self.stats.record_rejections(
                RejectReason::ProteinConflict,
                selection.conflict_rejections,
            );
            match selection.committed {
                Some(SelectedMatch::Peptide(p)) => {
                    for hit in &p.proteins {
                        self.registry.increment(&hit.accession);
                    }
                    samples.push((
                        advocate,
                        ScoreSample {
                            score: p.score,
                            decoy: p.is_decoy(),
                        },
                    ));
                    self.stats.record_retained();
                    // Conflict-rejected candidates are already counted as
                    // rejections, not as beaten runner-ups.
                    self.stats.record_secondary_hits(
                        survivors
                            .len()
                            .saturating_sub(1 + selection.conflict_rejections),
                    );
                    out.retain_peptide(advocate, p);
                    committed_any = true;
                }
                Some(SelectedMatch::Tag(t)) => {
                    samples.push((
                        advocate,
                        ScoreSample {
                            score: t.score,
                            decoy: false,
                        },
                    ));
                    self.stats.record_retained();
                    out.retain_tag(advocate, t);
                    committed_any = true;
                }
                None => {
                    self.stats.record_rejection(RejectReason::NoCandidate);
                    out.clear_advocate(advocate);
                }
            }
        }

        SpectrumOutcome {
            write: committed_any.then_some(out),
            samples,
        }
    }
}
