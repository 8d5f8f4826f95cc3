pub mod config;
pub mod data_sources;
pub mod errors;
pub mod filter;
pub mod input_map;
pub mod memory;
pub mod models;
pub mod modifications;
pub mod pipeline;
pub mod progress;
pub mod proteins;
pub mod selection;
pub mod stats;
pub mod store;

pub use config::ImportConfig;
pub use errors::{
    ConsolidationError,
    Result,
};
pub use pipeline::{
    ImportCoordinator,
    RunReport,
};
