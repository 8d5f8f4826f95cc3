pub mod coordinator;
mod outcome;

use crate::input_map::InputMap;
use crate::stats::ImportStatsSnapshot;

pub use coordinator::ImportCoordinator;

/// What a finished (or canceled) run hands back to the host.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// False when the run was canceled before draining every file.
    pub completed: bool,
    pub stats: ImportStatsSnapshot,
    pub input_map: InputMap,
}
