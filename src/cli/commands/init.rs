//! Implementation of the `mrag init` command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tokio::fs;

use crate::cli::output::{output, CommandOutput};

const CONFIG_TEMPLATE: &str = r#"# mrag configuration
#
# Backend selection happens through the `type` tag of each section and
# is resolved once at startup. Environment variables with the MRAG_
# prefix override any value here (e.g. MRAG_LLM__API_KEY).

encoder:
  type: clip
  model_id: openai/clip-vit-base-patch32
  revision: refs/pr/15
  dimension: 512

store:
  type: flat
  index_path: .mrag/index.bin
  metadata_path: .mrag/metadata.json
  dimension: 512
  # Remote alternative:
  # type: http
  # url: http://localhost:6333
  # collection: mrag_items
  # dimension: 512

llm:
  type: openai
  model: gpt-4o-mini
  # api_key: sk-...          # or set OPENAI_API_KEY
  # base_url: https://...    # or set OPENAI_BASE_URL

indexing:
  batch_size: 32

query:
  search_top_k: 5
  rerank_top_k: 3

logging:
  level: info
  format: pretty
"#;

/// Starter dataset matching the expected columns. Image links point at
/// stable Wikimedia Commons media.
const DATASET_TEMPLATE: &str = "\
url,desc,category
https://upload.wikimedia.org/wikipedia/commons/8/87/Chefs-knife.jpg,Standard western chef's knife with no locking mechanism; compliant kitchenware.,kitchenware/knife
https://upload.wikimedia.org/wikipedia/commons/7/7b/Kitchen-spatula.jpg,Plain stainless-and-silicone kitchen spatula; ordinary cookware.,kitchenware
https://upload.wikimedia.org/wikipedia/commons/a/a2/Super_Soaker_50_20th_Anniversary_Edition_-_Soak-a-thon_2009.jpg,Brightly colored toy water gun with a non-realistic shape; safe toy.,toys/water_gun
https://upload.wikimedia.org/wikipedia/commons/thumb/e/e0/Foam_sword.jpg/1200px-Foam_sword.jpg,Soft foam toy sword with no sharp edges; meets toy safety standards.,toys/foam_sword
https://upload.wikimedia.org/wikipedia/commons/1/1a/Zippo-Street-Chrome-207.jpg,Zippo metal kerosene lighter; restricted item that ships by ground only.,restricted/lighters
";

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Force reinitialization even if already initialized
    #[arg(long, short)]
    pub force: bool,
}

#[derive(Debug, serde::Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    pub files_created: Vec<PathBuf>,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![self.message.clone()];
        if !self.files_created.is_empty() {
            lines.push("\nCreated files:".to_string());
            for file in &self.files_created {
                lines.push(format!("  - {}", file.display()));
            }
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: InitArgs, json_mode: bool) -> Result<()> {
    let mrag_dir = PathBuf::from(".mrag");
    let config_path = mrag_dir.join("config.yaml");
    let dataset_path = PathBuf::from("dataset").join("template.csv");

    if config_path.exists() && !args.force {
        let output_data = InitOutput {
            success: false,
            message: "Project already initialized. Use --force to reinitialize.".to_string(),
            files_created: vec![],
        };
        output(&output_data, json_mode);
        return Ok(());
    }

    fs::create_dir_all(&mrag_dir)
        .await
        .context("Failed to create .mrag directory")?;
    fs::create_dir_all("dataset")
        .await
        .context("Failed to create dataset directory")?;

    fs::write(&config_path, CONFIG_TEMPLATE)
        .await
        .context("Failed to write config template")?;
    fs::write(&dataset_path, DATASET_TEMPLATE)
        .await
        .context("Failed to write dataset template")?;

    let output_data = InitOutput {
        success: true,
        message: "Initialized mrag project. Edit .mrag/config.yaml, then run `mrag index dataset/template.csv`.".to_string(),
        files_created: vec![config_path, dataset_path],
    };
    output(&output_data, json_mode);
    Ok(())
}
