//! Persistent identification store contract.
//!
//! The storage engine itself is an external collaborator; the core only
//! needs batched writes plus point lookups to union assumption sets for
//! spectra seen in more than one input file.

use crate::errors::Result;
use crate::models::{
    SpectrumKey,
    SpectrumMatch,
};
use fnv::FnvHashMap;
use std::sync::Mutex;

pub trait IdentificationStore: Send + Sync {
    /// Write a batch of records, replacing any existing record with the
    /// same key. Insertion order is preserved within a batch.
    fn add_batch(&self, batch: Vec<SpectrumMatch>) -> Result<()>;

    fn get(&self, key: &SpectrumKey) -> Option<SpectrumMatch>;

    fn contains(&self, key: &SpectrumKey) -> bool {
        self.get(key).is_some()
    }

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Store used by the CLI and the tests.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: Mutex<FnvHashMap<SpectrumKey, SpectrumMatch>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records sorted by key, for deterministic output.
    pub fn all_matches(&self) -> Vec<SpectrumMatch> {
        let guard = self.inner.lock().unwrap();
        let mut out: Vec<SpectrumMatch> = guard.values().cloned().collect();
        out.sort_by(|a, b| a.key.cmp(&b.key));
        out
    }
}

impl IdentificationStore for InMemoryStore {
    fn add_batch(&self, batch: Vec<SpectrumMatch>) -> Result<()> {
        let mut guard = self.inner.lock().unwrap();
        for m in batch {
            guard.insert(m.key.clone(), m);
        }
        Ok(())
    }

    fn get(&self, key: &SpectrumKey) -> Option<SpectrumMatch> {
        self.inner.lock().unwrap().get(key).cloned()
    }

    fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_batch_and_get() {
        let store = InMemoryStore::new();
        let key = SpectrumKey::new("run1.mgf", "scan=1");
        store
            .add_batch(vec![SpectrumMatch::new(key.clone(), 800.0)])
            .unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.contains(&key));
        assert_eq!(store.get(&key).unwrap().key, key);
    }

    #[test]
    fn test_replace_keeps_single_record_per_key() {
        let store = InMemoryStore::new();
        let key = SpectrumKey::new("run1.mgf", "scan=1");
        store
            .add_batch(vec![SpectrumMatch::new(key.clone(), 800.0)])
            .unwrap();
        store
            .add_batch(vec![SpectrumMatch::new(key.clone(), 800.0)])
            .unwrap();
        assert_eq!(store.len(), 1);
    }
}
