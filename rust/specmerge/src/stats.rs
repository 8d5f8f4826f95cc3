//! Run-level import statistics: per-reason rejection counters and the
//! operator-facing summary. High-volume filter rejections are counted,
//! never logged per occurrence.

use crate::filter::RejectReason;
use serde::Serialize;
use std::sync::atomic::{
    AtomicUsize,
    Ordering,
};

fn reason_index(reason: RejectReason) -> usize {
    RejectReason::ALL
        .iter()
        .position(|r| *r == reason)
        .expect("Reason missing from RejectReason::ALL")
}

/// Counters shared by all workers; increments are atomic, the snapshot is
/// taken after the run completes.
#[derive(Debug, Default)]
pub struct ImportStats {
    rejections: [AtomicUsize; RejectReason::ALL.len()],
    retained: AtomicUsize,
    secondary_hits: AtomicUsize,
    eviction_rounds: AtomicUsize,
}

impl ImportStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_rejection(&self, reason: RejectReason) {
        self.rejections[reason_index(reason)].fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejections(&self, reason: RejectReason, count: usize) {
        if count > 0 {
            self.rejections[reason_index(reason)].fetch_add(count, Ordering::Relaxed);
        }
    }

    pub fn record_retained(&self) {
        self.retained.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_secondary_hits(&self, count: usize) {
        if count > 0 {
            self.secondary_hits.fetch_add(count, Ordering::Relaxed);
        }
    }

    pub fn record_eviction_round(&self) {
        self.eviction_rounds.fetch_add(1, Ordering::Relaxed);
    }

    pub fn rejection_count(&self, reason: RejectReason) -> usize {
        self.rejections[reason_index(reason)].load(Ordering::Relaxed)
    }

    pub fn retained(&self) -> usize {
        self.retained.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> ImportStatsSnapshot {
        ImportStatsSnapshot {
            retained: self.retained.load(Ordering::Relaxed),
            secondary_hits: self.secondary_hits.load(Ordering::Relaxed),
            eviction_rounds: self.eviction_rounds.load(Ordering::Relaxed),
            rejections: RejectReason::ALL
                .iter()
                .map(|r| RejectionCount {
                    reason: r.label(),
                    count: self.rejection_count(*r),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RejectionCount {
    pub reason: &'static str,
    pub count: usize,
}

/// Immutable view of the counters, serialized into the run report.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ImportStatsSnapshot {
    pub retained: usize,
    pub secondary_hits: usize,
    pub eviction_rounds: usize,
    pub rejections: Vec<RejectionCount>,
}

impl ImportStatsSnapshot {
    pub fn total_rejected(&self) -> usize {
        self.rejections.iter().map(|r| r.count).sum()
    }

    /// Operator-facing summary with the rejection share per reason.
    pub fn summary(&self) -> String {
        let rejected = self.total_rejected();
        let mut out = format!(
            "{} PSMs retained, {} rejected, {} secondary hits",
            self.retained, rejected, self.secondary_hits
        );
        for r in self.rejections.iter().filter(|r| r.count > 0) {
            let share = 100.0 * r.count as f64 / rejected as f64;
            out.push_str(&format!("\n  {}: {} ({:.1}%)", r.reason, r.count, share));
        }
        if self.eviction_rounds > 0 {
            out.push_str(&format!(
                "\n  memory governor eviction rounds: {}",
                self.eviction_rounds
            ));
        }
        out
    }
}
