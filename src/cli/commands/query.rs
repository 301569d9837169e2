//! Implementation of the `mrag query` command.

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Args;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

use crate::application::AppContext;
use crate::cli::load_config;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Answer;

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Query image (URL or local path)
    #[arg(short, long)]
    pub image: Option<String>,

    /// Query text / instruction
    #[arg(short, long)]
    pub text: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct QueryOutput {
    #[serde(flatten)]
    pub answer: Answer,
}

impl CommandOutput for QueryOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![self.answer.answer_text.clone(), String::new()];

        if let Some(recommended) = self.answer.recommended() {
            lines.push(format!(
                "Recommended: {}",
                recommended.url().unwrap_or("(no image)")
            ));
            lines.push(String::new());
        }

        if self.answer.references.is_empty() {
            lines.push("No references.".to_string());
        } else {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "Url", "Desc", "Category", "Distance"]);

            for (index, reference) in self.answer.references.iter().enumerate() {
                table.add_row(vec![
                    index.to_string(),
                    reference.url().unwrap_or_default().to_string(),
                    reference.field_str("desc").unwrap_or_default().to_string(),
                    reference
                        .field_str("category")
                        .unwrap_or_default()
                        .to_string(),
                    reference
                        .distance
                        .map_or_else(|| "-".to_string(), |d| format!("{d:.4}")),
                ]);
            }
            lines.push(table.to_string());
        }

        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: QueryArgs, config_path: Option<&Path>, json_mode: bool) -> Result<()> {
    if args.image.is_none() && args.text.as_deref().is_none_or(|t| t.trim().is_empty()) {
        bail!("Provide --image and/or --text to query");
    }

    let config = load_config(config_path)?;
    let context = AppContext::from_config(config)
        .await
        .context("Failed to initialize backends")?;

    let answer = context
        .query(args.image.as_deref(), args.text.as_deref())
        .await
        .context("Query failed")?;

    context.shutdown().await.ok();

    output(&QueryOutput { answer }, json_mode);
    Ok(())
}
