use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "opteyes")]
#[command(about = "Keeps the image dataset index in sync with the data directory", long_about = None)]
pub struct Cli {
    /// Data directory to index (overrides configuration)
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    /// SQLite index file (overrides configuration)
    #[arg(long, global = true)]
    pub database: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Reconcile the index with the data directory
    Sync {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a datapoint with the given images to a dataset label
    Add {
        #[arg(long)]
        dataset: String,
        #[arg(long)]
        label: String,
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// List indexed datasets with their datapoint counts
    List,
    /// Print configuration values
    PrintConfig,
    /// Truncate all database tables
    TruncateDb,
}
