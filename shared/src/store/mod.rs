use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

// Expose the Google Sheets store module
pub mod sheets;

/// One rectangular write against the spreadsheet.
#[derive(Clone, Debug, PartialEq)]
pub struct CellUpdate {
    /// Full `TABLE!A1`-style range.
    pub range: String,
    pub rows: Vec<Vec<Value>>,
}

impl CellUpdate {
    /// Update targeting a single cell.
    pub fn cell(table: &str, col: &str, row_number: usize, value: Value) -> Self {
        Self {
            range: format!("{}!{}{}", table, col, row_number),
            rows: vec![vec![value]],
        }
    }
}

/// RowStore trait defining the interface for tabular storage implementations
#[async_trait]
pub trait RowStore: Send + Sync + 'static {
    /// Reads a rectangular range of cells from a named table. Rows the
    /// backing sheet has no data for are absent from the result.
    async fn get(&self, table: &str, range: &str) -> Result<Vec<Vec<Value>>>;

    /// Appends rows after the last data row of a named table.
    async fn append(&self, table: &str, rows: Vec<Vec<Value>>) -> Result<()>;

    /// Writes specific cells across the spreadsheet in one batch.
    async fn batch_update(&self, updates: Vec<CellUpdate>) -> Result<()>;
}
