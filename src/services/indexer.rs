//! Batch indexing pipeline: tabular dataset -> encoder -> vector store.
//!
//! Rows are processed in fixed-size sequential batches with no
//! partial-failure recovery: a mid-batch error aborts the run and
//! propagates to the caller.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use calamine::Reader as _;
use serde::Serialize;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Metadata;
use crate::domain::ports::{Encoder, VectorStore};

/// Default rows per sequential batch.
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Batch indexing driver.
pub struct Indexer {
    encoder: Arc<dyn Encoder>,
    store: Arc<dyn VectorStore>,
    batch_size: usize,
}

impl Indexer {
    pub fn new(encoder: Arc<dyn Encoder>, store: Arc<dyn VectorStore>, batch_size: usize) -> Self {
        Self {
            encoder,
            store,
            batch_size: batch_size.max(1),
        }
    }

    /// Rebuild the collection from a dataset file.
    ///
    /// Clears the existing collection first, then encodes and writes
    /// each row (image from `url`, text from `desc`), finalizing with
    /// `build_index`. `on_progress` receives (rows done, rows total)
    /// after every batch. Returns the number of rows indexed.
    pub async fn run<F>(&self, dataset: &Path, mut on_progress: F) -> DomainResult<usize>
    where
        F: FnMut(usize, usize),
    {
        let rows = read_dataset(dataset)?;
        tracing::info!("Indexing {} rows from {}", rows.len(), dataset.display());

        self.store.delete_collection().await?;

        let total = rows.len();
        let mut done = 0usize;
        for batch in rows.chunks(self.batch_size) {
            let mut vectors = Vec::with_capacity(batch.len());
            for row in batch {
                let url = row
                    .get("url")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or_default();
                let desc = row
                    .get("desc")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or_default();
                vectors.push(self.encoder.encode(Some(url), Some(desc)).await?);
            }

            self.store.add(&vectors, batch).await?;

            done += batch.len();
            on_progress(done, total);
        }

        self.store.build_index().await?;
        tracing::info!("Indexing complete: {total} rows");
        Ok(total)
    }
}

/// Read a tabular dataset into metadata rows.
///
/// CSV and XLSX are interchangeable. The `url` column is required;
/// rows with a blank `url` are skipped; `desc` and `category` default
/// to empty strings; any extra columns ride along as auxiliary fields.
pub fn read_dataset(path: &Path) -> DomainResult<Vec<Metadata>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let table = match extension.as_deref() {
        Some("csv") => read_csv(path)?,
        Some("xlsx") => read_xlsx(path)?,
        _ => {
            return Err(DomainError::InvalidInput(format!(
                "Unsupported dataset format for {}; use .csv or .xlsx",
                path.display()
            )))
        }
    };

    rows_from_table(table, path)
}

/// Raw table: header row plus string cells.
struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

fn read_csv(path: &Path) -> DomainResult<Table> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| DomainError::InvalidInput(format!("Failed to open {}: {e}", path.display())))?;

    let headers = reader
        .headers()
        .map_err(|e| DomainError::InvalidInput(format!("Failed to read CSV header: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record
            .map_err(|e| DomainError::InvalidInput(format!("Failed to read CSV record: {e}")))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Table { headers, rows })
}

fn read_xlsx(path: &Path) -> DomainResult<Table> {
    let mut workbook: calamine::Xlsx<_> = calamine::open_workbook(path)
        .map_err(|e| DomainError::InvalidInput(format!("Failed to open {}: {e}", path.display())))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DomainError::InvalidInput("Workbook contains no sheets".to_string()))?
        .map_err(|e| DomainError::InvalidInput(format!("Failed to read worksheet: {e}")))?;

    let mut rows_iter = range.rows();
    let headers: Vec<String> = rows_iter
        .next()
        .ok_or_else(|| DomainError::InvalidInput("Worksheet is empty".to_string()))?
        .iter()
        .map(render_cell)
        .collect();

    let rows = rows_iter
        .map(|row| row.iter().map(render_cell).collect())
        .collect();

    Ok(Table { headers, rows })
}

fn render_cell(cell: &calamine::Data) -> String {
    match cell {
        calamine::Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn rows_from_table(table: Table, path: &Path) -> DomainResult<Vec<Metadata>> {
    if !table.headers.iter().any(|h| h == "url") {
        return Err(DomainError::InvalidInput(format!(
            "Dataset {} is missing the required 'url' column",
            path.display()
        )));
    }

    let mut rows = Vec::with_capacity(table.rows.len());
    let mut skipped = 0usize;

    for cells in table.rows {
        let mut fields = Metadata::new();
        for (header, cell) in table.headers.iter().zip(cells.iter()) {
            fields.insert(header.clone(), serde_json::Value::String(cell.clone()));
        }
        // Optional columns default to empty
        for key in ["desc", "category"] {
            fields
                .entry(key.to_string())
                .or_insert_with(|| serde_json::Value::String(String::new()));
        }

        let has_url = fields
            .get("url")
            .and_then(serde_json::Value::as_str)
            .is_some_and(|url| !url.trim().is_empty());
        if has_url {
            rows.push(fields);
        } else {
            skipped += 1;
        }
    }

    if skipped > 0 {
        tracing::warn!("Skipped {skipped} rows with a blank 'url'");
    }

    Ok(rows)
}

/// Dataset/annotation coverage summary.
///
/// A row counts as annotated when both `desc` and `category` are
/// non-blank.
#[derive(Debug, Serialize)]
pub struct DatasetStats {
    pub total: usize,
    pub annotated: usize,
    pub unannotated: usize,
    /// Items per non-empty category label.
    pub categories: BTreeMap<String, usize>,
}

pub fn dataset_stats(rows: &[Metadata]) -> DatasetStats {
    let mut annotated = 0usize;
    let mut categories: BTreeMap<String, usize> = BTreeMap::new();

    for row in rows {
        let desc = row.get("desc").and_then(serde_json::Value::as_str).unwrap_or_default();
        let category = row
            .get("category")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default();

        if !desc.trim().is_empty() && !category.trim().is_empty() {
            annotated += 1;
        }
        if !category.trim().is_empty() {
            *categories.entry(category.to_string()).or_insert(0) += 1;
        }
    }

    DatasetStats {
        total: rows.len(),
        annotated,
        unannotated: rows.len() - annotated,
        categories,
    }
}
