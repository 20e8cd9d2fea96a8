use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Result, ServiceError};
use crate::store::{CellUpdate, RowStore};

/// Mock implementation of RowStore for testing
///
/// Tables are held in memory with index 0 standing for sheet row 1, ranges
/// are interpreted the way the live store does, and every write is recorded
/// so tests can assert on exactly what was persisted.
pub struct MockRowStore {
    tables: Mutex<HashMap<String, Vec<Vec<Value>>>>,
    appended: Mutex<Vec<(String, Vec<Vec<Value>>)>>,
    updates: Mutex<Vec<CellUpdate>>,
    error_mode: bool,
    failing_writes: Mutex<usize>,
}

impl MockRowStore {
    /// Create a new empty MockRowStore
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            appended: Mutex::new(Vec::new()),
            updates: Mutex::new(Vec::new()),
            error_mode: false,
            failing_writes: Mutex::new(0),
        }
    }

    /// Seeds one table with rows; row 1 of the sheet is `rows[0]`.
    pub fn with_table(self, table: &str, rows: Vec<Vec<Value>>) -> Self {
        self.tables.lock().unwrap().insert(table.to_string(), rows);
        self
    }

    /// Create a new MockRowStore where every operation fails
    pub fn new_error() -> Self {
        Self {
            error_mode: true,
            ..Self::new()
        }
    }

    /// Makes the next `failures` write calls fail before behaving normally,
    /// for exercising retry paths.
    pub fn failing_next_writes(self, failures: usize) -> Self {
        *self.failing_writes.lock().unwrap() = failures;
        self
    }

    /// Rows appended to one table so far, in call order.
    pub fn appended_rows(&self, table: &str) -> Vec<Vec<Value>> {
        self.appended
            .lock()
            .unwrap()
            .iter()
            .filter(|(appended_table, _)| appended_table == table)
            .flat_map(|(_, rows)| rows.clone())
            .collect()
    }

    /// Every cell update issued so far, in call order.
    pub fn cell_updates(&self) -> Vec<CellUpdate> {
        self.updates.lock().unwrap().clone()
    }

    fn take_write_failure(&self) -> bool {
        if self.error_mode {
            return true;
        }
        let mut remaining = self.failing_writes.lock().unwrap();
        if *remaining > 0 {
            *remaining -= 1;
            true
        } else {
            false
        }
    }
}

impl Default for MockRowStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RowStore for MockRowStore {
    async fn get(&self, table: &str, range: &str) -> Result<Vec<Vec<Value>>> {
        if self.error_mode {
            return Err(ServiceError::Internal("Mock".into()));
        }
        let (start, end) = parse_row_span(range)?;
        let tables = self.tables.lock().unwrap();
        let rows = match tables.get(table) {
            Some(rows) => rows,
            None => return Ok(Vec::new()),
        };
        if start > rows.len() {
            return Ok(Vec::new());
        }
        Ok(rows[start - 1..end.min(rows.len())].to_vec())
    }

    async fn append(&self, table: &str, rows: Vec<Vec<Value>>) -> Result<()> {
        if self.take_write_failure() {
            return Err(ServiceError::StoreWrite("Mock".into()));
        }
        self.appended
            .lock()
            .unwrap()
            .push((table.to_string(), rows.clone()));
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .extend(rows);
        Ok(())
    }

    async fn batch_update(&self, updates: Vec<CellUpdate>) -> Result<()> {
        if self.take_write_failure() {
            return Err(ServiceError::StoreWrite("Mock".into()));
        }
        let mut tables = self.tables.lock().unwrap();
        for update in &updates {
            let (table, anchor) = update
                .range
                .split_once('!')
                .ok_or_else(|| ServiceError::StoreWrite(format!("range {:?} has no table", update.range)))?;
            let col = col_index(anchor)?;
            let row = row_number(anchor)?;
            let rows = tables.entry(table.to_string()).or_default();
            for (row_offset, update_row) in update.rows.iter().enumerate() {
                let row_index = row - 1 + row_offset;
                if rows.len() <= row_index {
                    rows.resize(row_index + 1, Vec::new());
                }
                for (col_offset, value) in update_row.iter().enumerate() {
                    let col_index = col + col_offset;
                    if rows[row_index].len() <= col_index {
                        rows[row_index].resize(col_index + 1, Value::Null);
                    }
                    rows[row_index][col_index] = value.clone();
                }
            }
        }
        self.updates.lock().unwrap().extend(updates);
        Ok(())
    }
}

// `A2:J240` -> (2, 240); a single cell ref spans one row.
fn parse_row_span(range: &str) -> Result<(usize, usize)> {
    let mut bounds = range.split(':');
    let start = row_number(bounds.next().unwrap_or_default())?;
    let end = match bounds.next() {
        Some(cell_ref) => row_number(cell_ref)?,
        None => start,
    };
    Ok((start, end))
}

fn row_number(cell_ref: &str) -> Result<usize> {
    let digits: String = cell_ref.chars().filter(char::is_ascii_digit).collect();
    digits
        .parse()
        .map_err(|_| ServiceError::Internal(format!("cell ref {:?} has no row number", cell_ref)))
}

fn col_index(cell_ref: &str) -> Result<usize> {
    let letters: String = cell_ref
        .chars()
        .take_while(char::is_ascii_alphabetic)
        .collect();
    if letters.is_empty() {
        return Err(ServiceError::Internal(format!(
            "cell ref {:?} has no column letter",
            cell_ref
        )));
    }
    let index = letters
        .chars()
        .fold(0usize, |acc, c| acc * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1));
    Ok(index - 1)
}
