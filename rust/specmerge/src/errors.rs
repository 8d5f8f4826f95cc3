use crate::models::AdvocateId;
use std::path::PathBuf;

#[derive(Debug)]
pub enum InputReadingError {
    FileReadingError {
        source: std::io::Error,
        path: PathBuf,
    },
    ResultFileParsingError {
        source: serde_json::Error,
        path: PathBuf,
    },
}

/// Errors that abort a consolidation run. High-volume filter rejections
/// are never errors; they are counted in the import statistics instead.
#[derive(Debug)]
pub enum ConsolidationError {
    /// An assumption references an advocate the input file never declared.
    /// Structural configuration error: the run aborts cleanly with no
    /// partial commit of the current batch.
    MissingAdvocateTable {
        advocate: AdvocateId,
        path: Option<PathBuf>,
    },
    /// Memory pressure persisted after governor eviction.
    OutOfMemory {
        used_bytes: u64,
        available_bytes: u64,
    },
    ThreadPool {
        msg: String,
    },
    InputReading(InputReadingError),
}

impl std::fmt::Display for ConsolidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsolidationError::MissingAdvocateTable { advocate, path } => write!(
                f,
                "No modification index table for advocate {} (file: {:?})",
                advocate, path
            ),
            ConsolidationError::OutOfMemory {
                used_bytes,
                available_bytes,
            } => write!(
                f,
                "Out of memory: {} bytes in use, {} bytes available",
                used_bytes, available_bytes
            ),
            _ => write!(f, "{:?}", self),
        }
    }
}

impl std::error::Error for ConsolidationError {}

pub type Result<T> = std::result::Result<T, ConsolidationError>;

impl From<InputReadingError> for ConsolidationError {
    fn from(x: InputReadingError) -> Self {
        Self::InputReading(x)
    }
}
