mod cli;
mod config;
mod errors;
mod processing;

use clap::Parser;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::{
    Config,
    OutputConfig,
    SequenceIndexConfig,
};

fn main() -> std::result::Result<(), errors::CliError> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        ) // This uses RUST_LOG environment variable
        .init();

    // Parse command line arguments
    let args = Cli::parse();

    // Load and parse configuration
    let conf = match std::fs::File::open(args.config.clone()) {
        Ok(x) => x,
        Err(e) => {
            return Err(errors::CliError::Io {
                source: e.to_string(),
                path: Some(args.config.to_string_lossy().to_string()),
            });
        }
    };
    let config: Result<Config, _> = serde_json::from_reader(conf);
    let mut config = match config {
        Ok(x) => x,
        Err(e) => {
            return Err(errors::CliError::ParseError { msg: e.to_string() });
        }
    };

    // Override config with command line arguments if provided
    if !args.result_file.is_empty() {
        config.result_files = args.result_file;
    }
    if config.result_files.is_empty() {
        return Err(errors::CliError::Config {
            source: "No result files provided, please provide them in either the config file or with the --result-file flag".to_string(),
        });
    }
    if let Some(sequence_index) = args.sequence_index {
        config.sequence_index = Some(SequenceIndexConfig {
            path: sequence_index,
            decoy_tag: config
                .sequence_index
                .map(|c| c.decoy_tag)
                .unwrap_or_else(|| "rev_".to_string()),
        });
    }
    if let Some(threads) = args.threads {
        config.import.threads = threads;
    }
    if let Some(output_dir) = args.output_dir {
        config.output = Some(OutputConfig {
            directory: output_dir,
        });
    }

    let output_config = match config.output {
        Some(ref x) => x.clone(),
        None => {
            return Err(errors::CliError::Config {
                source: "No output directory provided, please provide one in either the config file or with the --output-dir flag".to_string(),
            });
        }
    };
    info!("Parsed configuration: {:#?}", config.clone());

    match std::fs::create_dir_all(&output_config.directory) {
        Ok(_) => println!("Created output directory"),
        Err(e) => {
            return Err(errors::CliError::Io {
                source: e.to_string(),
                path: Some(output_config.directory.to_string_lossy().to_string()),
            });
        }
    };

    let report = processing::process(config, &output_config)?;
    if !report.completed {
        return Err(errors::CliError::Canceled);
    }
    Ok(())
}
