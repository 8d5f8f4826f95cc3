use crate::memory::EvictableCache;
use crate::models::ProteinHit;
use fnv::FnvHashMap;
use std::sync::atomic::{
    AtomicU64,
    Ordering,
};
use std::sync::{
    Mutex,
    RwLock,
};

/// External protein lookup: given a plain peptide sequence, every matching
/// protein accession with the in-protein offset and target/decoy status.
pub trait ProteinMapper: Send + Sync {
    fn map(&self, sequence: &str) -> Vec<ProteinHit>;
}

/// Concurrent `accession -> occurrence count` used by the best-match
/// tie-break and by downstream protein inference.
///
/// Increments are atomic so no update is ever lost; readers may observe a
/// count that is slightly stale relative to concurrent increments from
/// other workers, which is accepted (the tie-break is a heuristic).
#[derive(Debug, Default)]
pub struct ProteinOccurrenceRegistry {
    inner: RwLock<FnvHashMap<String, AtomicU64>>,
}

impl ProteinOccurrenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self, accession: &str) {
        {
            let guard = self.inner.read().unwrap();
            if let Some(counter) = guard.get(accession) {
                counter.fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
        let mut guard = self.inner.write().unwrap();
        guard
            .entry(accession.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self, accession: &str) -> u64 {
        self.inner
            .read()
            .unwrap()
            .get(accession)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn snapshot(&self) -> FnvHashMap<String, u64> {
        self.inner
            .read()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), v.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Memoizing wrapper around a [`ProteinMapper`].
///
/// Peptides recur across spectra and engines, and the underlying lookup is
/// a synchronous foreign call; the cache is registered with the memory
/// governor and shrinks under pressure.
pub struct CachedProteinMapper<M> {
    inner: M,
    cache: Mutex<FnvHashMap<String, Vec<ProteinHit>>>,
}

impl<M: ProteinMapper> CachedProteinMapper<M> {
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            cache: Mutex::new(FnvHashMap::default()),
        }
    }
}

impl<M: ProteinMapper> ProteinMapper for CachedProteinMapper<M> {
    fn map(&self, sequence: &str) -> Vec<ProteinHit> {
        if let Some(hits) = self.cache.lock().unwrap().get(sequence) {
            return hits.clone();
        }
        let hits = self.inner.map(sequence);
        self.cache
            .lock()
            .unwrap()
            .insert(sequence.to_string(), hits.clone());
        hits
    }
}

impl<M: Send + Sync> EvictableCache for CachedProteinMapper<M> {
    fn name(&self) -> &'static str {
        "protein-mapping cache"
    }

    fn len(&self) -> usize {
        self.cache.lock().unwrap().len()
    }

    fn evict(&self, count: usize) -> usize {
        let mut guard = self.cache.lock().unwrap();
        if count >= guard.len() {
            let evicted = guard.len();
            guard.clear();
            return evicted;
        }
        let victims: Vec<String> = guard.keys().take(count).cloned().collect();
        for key in &victims {
            guard.remove(key);
        }
        victims.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct CountingMapper {
        calls: AtomicUsize,
    }

    impl ProteinMapper for CountingMapper {
        fn map(&self, sequence: &str) -> Vec<ProteinHit> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            vec![ProteinHit {
                accession: format!("P_{}", sequence).into(),
                offset: 0,
                decoy: false,
            }]
        }
    }

    #[test]
    fn test_registry_counts() {
        let reg = ProteinOccurrenceRegistry::new();
        assert_eq!(reg.count("P1"), 0);
        reg.increment("P1");
        reg.increment("P1");
        reg.increment("P2");
        assert_eq!(reg.count("P1"), 2);
        assert_eq!(reg.count("P2"), 1);
        assert_eq!(reg.snapshot().len(), 2);
    }

    #[test]
    fn test_registry_concurrent_increments() {
        let reg = std::sync::Arc::new(ProteinOccurrenceRegistry::new());
        std::thread::scope(|s| {
            for _ in 0..4 {
                let reg = reg.clone();
                s.spawn(move || {
                    for _ in 0..1000 {
                        reg.increment("SHARED");
                    }
                });
            }
        });
        assert_eq!(reg.count("SHARED"), 4000);
    }

    #[test]
    fn test_cached_mapper_memoizes_and_evicts() {
        let mapper = CachedProteinMapper::new(CountingMapper {
            calls: AtomicUsize::new(0),
        });
        mapper.map("PEPTIDE");
        mapper.map("PEPTIDE");
        assert_eq!(mapper.inner.calls.load(Ordering::SeqCst), 1);
        mapper.map("OTHERSEQ");
        assert_eq!(mapper.len(), 2);

        // Eviction is bounded by the cache size
        assert_eq!(mapper.evict(10), 2);
        assert_eq!(mapper.len(), 0);
        mapper.map("PEPTIDE");
        assert_eq!(mapper.inner.calls.load(Ordering::SeqCst), 3);
    }
}
