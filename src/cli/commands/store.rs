//! Implementation of the `mrag store` commands.

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Subcommand;

use crate::application::AppContext;
use crate::cli::load_config;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::StoreConfig;

#[derive(Subcommand, Debug)]
pub enum StoreCommands {
    /// Irreversibly clear the collection and reinitialize it empty
    Clear {
        /// Confirm the destructive operation
        #[arg(long)]
        yes: bool,
    },

    /// Show the configured store backend
    Info,
}

#[derive(Debug, serde::Serialize)]
struct StoreOutput {
    success: bool,
    message: String,
}

impl CommandOutput for StoreOutput {
    fn to_human(&self) -> String {
        self.message.clone()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(
    command: StoreCommands,
    config_path: Option<&Path>,
    json_mode: bool,
) -> Result<()> {
    let config = load_config(config_path)?;

    match command {
        StoreCommands::Clear { yes } => {
            if !yes {
                bail!("Refusing to clear the collection without --yes");
            }

            let context = AppContext::from_config(config)
                .await
                .context("Failed to initialize backends")?;
            context
                .store()
                .delete_collection()
                .await
                .context("Failed to clear collection")?;
            context.shutdown().await.ok();

            output(
                &StoreOutput {
                    success: true,
                    message: "Collection cleared and reinitialized.".to_string(),
                },
                json_mode,
            );
        }
        StoreCommands::Info => {
            let message = match &config.store {
                StoreConfig::Flat {
                    index_path,
                    metadata_path,
                    dimension,
                } => format!(
                    "Store: flat (dimension {dimension})\n  index:    {index_path}\n  metadata: {metadata_path}"
                ),
                StoreConfig::Http {
                    url,
                    collection,
                    dimension,
                    ..
                } => format!(
                    "Store: http (dimension {dimension})\n  url:        {url}\n  collection: {collection}"
                ),
            };
            output(
                &StoreOutput {
                    success: true,
                    message,
                },
                json_mode,
            );
        }
    }

    Ok(())
}
