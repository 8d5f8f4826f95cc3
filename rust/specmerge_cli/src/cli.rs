use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Result files to import (will over-write the config file)
    #[arg(short, long)]
    pub result_file: Vec<PathBuf>,

    /// Path to the protein sequence index (will over-write the config file)
    #[arg(short, long)]
    pub sequence_index: Option<PathBuf>,

    /// Path to the output directory
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Worker thread count; 0 means one per available processing unit
    #[arg(short, long)]
    pub threads: Option<usize>,
}
