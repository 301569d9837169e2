//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::commands::index::IndexArgs;
use crate::cli::commands::init::InitArgs;
use crate::cli::commands::query::QueryArgs;
use crate::cli::commands::stats::StatsArgs;
use crate::cli::commands::store::StoreCommands;

#[derive(Parser)]
#[command(name = "mrag")]
#[command(about = "Multimodal retrieval-augmented product QA", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Load configuration from a specific file instead of .mrag/
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize mrag configuration and a starter dataset template
    Init(InitArgs),

    /// Index a dataset into the vector store
    Index(IndexArgs),

    /// Ask a question against the indexed collection
    Query(QueryArgs),

    /// Summarize a dataset's annotation coverage
    Stats(StatsArgs),

    /// Vector store management commands
    #[command(subcommand)]
    Store(StoreCommands),
}
