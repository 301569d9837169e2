//! Implementation of the `mrag stats` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

use crate::cli::output::{output, CommandOutput};
use crate::services::{dataset_stats, read_dataset, DatasetStats};

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Dataset file (.csv or .xlsx) to summarize
    pub dataset: PathBuf,
}

#[derive(Debug, serde::Serialize)]
pub struct StatsOutput {
    pub dataset: PathBuf,
    #[serde(flatten)]
    pub stats: DatasetStats,
}

impl CommandOutput for StatsOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("Dataset: {}", self.dataset.display()),
            format!("Total rows:   {}", self.stats.total),
            format!("Annotated:    {}", self.stats.annotated),
            format!("Unannotated:  {}", self.stats.unannotated),
        ];

        if !self.stats.categories.is_empty() {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["Category", "Items"]);
            for (category, count) in &self.stats.categories {
                table.add_row(vec![category.clone(), count.to_string()]);
            }
            lines.push(String::new());
            lines.push(table.to_string());
        }

        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: StatsArgs, json_mode: bool) -> Result<()> {
    let rows = read_dataset(&args.dataset).context("Failed to read dataset")?;
    let stats = dataset_stats(&rows);

    output(
        &StatsOutput {
            dataset: args.dataset,
            stats,
        },
        json_mode,
    );
    Ok(())
}
