//! Progress, cancellation and fault routing. These three small seams are
//! the only coupling between the consolidation core and a host UI layer.

use crate::errors::ConsolidationError;
use std::sync::atomic::{
    AtomicBool,
    Ordering,
};
use std::sync::Arc;
use tracing::{
    error,
    info,
};

pub trait ProgressSink: Send + Sync {
    fn report(&self, message: &str);
}

/// Progress sink that forwards to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn report(&self, message: &str) {
        info!("{}", message);
    }
}

/// Shared run-cancellation flag, polled cooperatively between spectrum
/// items. Once set, no new work begins; in-flight items finish so no
/// partial writes are produced.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Single sink for unexpected faults. The core routes faults here and
/// cancels the run rather than terminating the process.
pub trait FaultSink: Send + Sync {
    fn catch(&self, fault: &ConsolidationError);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingFaultSink;

impl FaultSink for TracingFaultSink {
    fn catch(&self, fault: &ConsolidationError) {
        error!("Unexpected fault: {}", fault);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_is_shared() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!token.is_canceled());
        clone.cancel();
        assert!(token.is_canceled());
    }
}
