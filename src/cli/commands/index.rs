//! Implementation of the `mrag index` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use crate::application::AppContext;
use crate::cli::load_config;
use crate::cli::output::{create_progress_bar, output, CommandOutput};

#[derive(Args, Debug)]
pub struct IndexArgs {
    /// Dataset file (.csv or .xlsx) with url/desc/category columns
    pub dataset: PathBuf,

    /// Override the configured batch size
    #[arg(short, long)]
    pub batch_size: Option<usize>,
}

#[derive(Debug, serde::Serialize)]
pub struct IndexOutput {
    pub success: bool,
    pub indexed: usize,
    pub dataset: PathBuf,
}

impl CommandOutput for IndexOutput {
    fn to_human(&self) -> String {
        format!(
            "Indexed {} items from {}.",
            self.indexed,
            self.dataset.display()
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: IndexArgs, config_path: Option<&Path>, json_mode: bool) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(batch_size) = args.batch_size {
        config.indexing.batch_size = batch_size;
    }

    let context = AppContext::from_config(config)
        .await
        .context("Failed to initialize backends")?;

    let bar = (!json_mode).then(|| create_progress_bar(0));
    let indexed = context
        .indexer()
        .run(&args.dataset, |done, total| {
            if let Some(bar) = &bar {
                if bar.length() == Some(0) {
                    bar.set_length(total as u64);
                }
                bar.set_position(done as u64);
            }
        })
        .await
        .context("Indexing failed")?;

    if let Some(bar) = bar {
        bar.finish_with_message("done");
    }

    context.shutdown().await.ok();

    output(
        &IndexOutput {
            success: true,
            indexed,
            dataset: args.dataset,
        },
        json_mode,
    );
    Ok(())
}
