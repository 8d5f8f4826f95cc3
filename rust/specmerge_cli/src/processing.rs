use super::config::{
    Config,
    OutputConfig,
};
use super::errors::CliError;
use indicatif::{
    ProgressIterator,
    ProgressStyle,
};
use specmerge::data_sources::{
    ResultFile,
    SequenceIndex,
};
use specmerge::models::ModificationCatalog;
use specmerge::store::{
    IdentificationStore,
    InMemoryStore,
};
use specmerge::{
    ImportCoordinator,
    RunReport,
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

fn write_json<T: Serialize>(data: &T, path: &Path) -> Result<(), CliError> {
    let file = std::fs::File::create(path).map_err(|e| CliError::Io {
        source: e.to_string(),
        path: Some(path.to_string_lossy().to_string()),
    })?;
    serde_json::to_writer_pretty(file, data).map_err(|e| CliError::Io {
        source: e.to_string(),
        path: Some(path.to_string_lossy().to_string()),
    })
}

pub fn process(config: Config, output: &OutputConfig) -> Result<RunReport, CliError> {
    let index_config = config.sequence_index.as_ref().ok_or(CliError::Config {
        source: "No sequence index provided, please provide one in either the config file or with the --sequence-index flag".to_string(),
    })?;
    let index = SequenceIndex::from_file(&index_config.path, &index_config.decoy_tag)?;
    info!(
        "Loaded sequence index with {} proteins from {}",
        index.len(),
        index_config.path.display()
    );

    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})",
    )
    .unwrap();
    let start = Instant::now();
    let mut files = Vec::with_capacity(config.result_files.len());
    for path in config.result_files.iter().progress_with_style(style) {
        files.push(ResultFile::from_file(path)?);
    }
    let nspectra: usize = files.iter().map(|f| f.matches.len()).sum();
    info!(
        "Decoded {} result files ({} spectrum matches) in {:?}",
        files.len(),
        nspectra,
        start.elapsed()
    );

    let catalog = ModificationCatalog::new(config.modifications.clone());
    let store = Arc::new(InMemoryStore::new());
    let coordinator = ImportCoordinator::new(config.import, catalog, index, store.clone());
    let report = coordinator.run(files)?;

    write_json(&store.all_matches(), &output.directory.join("matches.json"))?;
    write_json(&report.input_map, &output.directory.join("input_map.json"))?;
    write_json(&report.stats, &output.directory.join("summary.json"))?;
    println!("{}", report.stats.summary());
    println!(
        "Consolidated {} spectra into {} records in {:?}",
        nspectra,
        store.len(),
        start.elapsed()
    );
    Ok(report)
}
