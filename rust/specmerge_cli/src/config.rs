use serde::{
    Deserialize,
    Serialize,
};
use specmerge::models::ModificationEntry;
use specmerge::ImportConfig;
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub result_files: Vec<PathBuf>,
    pub sequence_index: Option<SequenceIndexConfig>,
    /// Canonical modifications enabled for the run.
    #[serde(default)]
    pub modifications: Vec<ModificationEntry>,
    #[serde(default)]
    pub import: ImportConfig,
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SequenceIndexConfig {
    pub path: PathBuf,
    #[serde(default = "default_decoy_tag")]
    pub decoy_tag: String,
}

fn default_decoy_tag() -> String {
    "rev_".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OutputConfig {
    pub directory: PathBuf,
}
