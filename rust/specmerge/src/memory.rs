//! Memory governance: bounded, best-effort eviction of auxiliary caches
//! when the process approaches a configured high-water mark.

use std::sync::Arc;
use tracing::{
    info,
    warn,
};

/// A cache the governor may shrink between batches.
pub trait EvictableCache: Send + Sync {
    fn name(&self) -> &'static str;
    fn len(&self) -> usize;
    /// Drop up to `count` entries; returns how many were actually dropped.
    fn evict(&self, count: usize) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryUsage {
    pub rss_bytes: u64,
    pub total_bytes: u64,
    pub available_bytes: u64,
}

impl MemoryUsage {
    pub fn used_fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        self.rss_bytes as f64 / self.total_bytes as f64
    }
}

/// Source of memory readings. Separated from the governor so tests can
/// simulate pressure without touching the host.
pub trait MemoryProbe: Send + Sync {
    fn usage(&self) -> Option<MemoryUsage>;
}

/// Reads `VmRSS` from `/proc/self/status` and totals from `/proc/meminfo`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcMemoryProbe;

/// Parse a `kB` line of the form `Key:   12345 kB` into bytes.
fn parse_kb_line(content: &str, key: &str) -> Option<u64> {
    for line in content.lines() {
        if let Some(rest) = line.strip_prefix(key) {
            let rest = rest.trim_start_matches(':').trim();
            if let Some(kb) = rest.split_whitespace().next() {
                if let Ok(kb) = kb.parse::<u64>() {
                    return Some(kb * 1024);
                }
            }
        }
    }
    None
}

/// Parse resident set size in bytes from `/proc/self/status` content.
pub fn parse_rss_bytes(status_content: &str) -> Option<u64> {
    parse_kb_line(status_content, "VmRSS")
}

/// Parse `(total, available)` bytes from `/proc/meminfo` content.
pub fn parse_meminfo_bytes(meminfo_content: &str) -> Option<(u64, u64)> {
    let total = parse_kb_line(meminfo_content, "MemTotal")?;
    let available = parse_kb_line(meminfo_content, "MemAvailable")?;
    Some((total, available))
}

impl MemoryProbe for ProcMemoryProbe {
    fn usage(&self) -> Option<MemoryUsage> {
        let status = std::fs::read_to_string("/proc/self/status").ok()?;
        let meminfo = std::fs::read_to_string("/proc/meminfo").ok()?;
        let rss_bytes = parse_rss_bytes(&status)?;
        let (total_bytes, available_bytes) = parse_meminfo_bytes(&meminfo)?;
        Some(MemoryUsage {
            rss_bytes,
            total_bytes,
            available_bytes,
        })
    }
}

/// Outcome of one governor check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PressureState {
    /// Below the high-water mark; nothing done.
    Ok,
    /// Above the mark; caches were shrunk by `evicted` entries total.
    Evicted { evicted: usize },
    /// Above the mark with nothing left to evict. The caller should cancel
    /// the run and report the condition.
    Critical {
        used_bytes: u64,
        available_bytes: u64,
    },
}

/// Monitors process memory and shrinks registered caches proportionally
/// when usage exceeds the high-water fraction of total memory.
///
/// Eviction is best effort and never fatal by itself; only persistent
/// pressure with empty caches is surfaced as [`PressureState::Critical`].
pub struct MemoryGovernor {
    probe: Box<dyn MemoryProbe>,
    high_water_fraction: f64,
    caches: Vec<Arc<dyn EvictableCache>>,
}

impl MemoryGovernor {
    pub fn new(probe: Box<dyn MemoryProbe>, high_water_fraction: f64) -> Self {
        Self {
            probe,
            high_water_fraction,
            caches: Vec::new(),
        }
    }

    pub fn with_default_probe(high_water_fraction: f64) -> Self {
        Self::new(Box::new(ProcMemoryProbe), high_water_fraction)
    }

    pub fn register(&mut self, cache: Arc<dyn EvictableCache>) {
        self.caches.push(cache);
    }

    /// Fraction of cache entries to drop for the observed overshoot,
    /// capped at 100%.
    fn eviction_fraction(&self, usage: &MemoryUsage) -> f64 {
        let high_water_bytes = self.high_water_fraction * usage.total_bytes as f64;
        let overshoot = usage.rss_bytes as f64 - high_water_bytes;
        if overshoot <= 0.0 {
            return 0.0;
        }
        // Free twice the overshoot, assuming entries release memory roughly
        // uniformly. Over-eviction only costs cache refills.
        (2.0 * overshoot / usage.rss_bytes as f64).min(1.0)
    }

    pub fn check(&self) -> PressureState {
        let Some(usage) = self.probe.usage() else {
            return PressureState::Ok;
        };
        let fraction = self.eviction_fraction(&usage);
        if fraction <= 0.0 {
            return PressureState::Ok;
        }

        let mut evicted_total = 0usize;
        for cache in &self.caches {
            let len = cache.len();
            if len == 0 {
                continue;
            }
            let count = ((len as f64 * fraction).ceil() as usize).min(len);
            let evicted = cache.evict(count);
            evicted_total += evicted;
            info!(
                "Memory governor evicted {}/{} entries from {}",
                evicted,
                len,
                cache.name()
            );
        }

        if evicted_total == 0 {
            warn!(
                "Memory pressure with empty caches: rss {} / total {} bytes",
                usage.rss_bytes, usage.total_bytes
            );
            return PressureState::Critical {
                used_bytes: usage.rss_bytes,
                available_bytes: usage.available_bytes,
            };
        }
        PressureState::Evicted {
            evicted: evicted_total,
        }
    }
}
