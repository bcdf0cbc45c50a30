use crate::error::StoreError;
use async_trait::async_trait;
use std::sync::Mutex;

/// Spreadsheet-like row storage. Row and column numbers are 1-based and the
/// first row is the header.
#[async_trait]
pub trait RowStore: Send + Sync {
    async fn append_row(&self, fields: Vec<String>) -> Result<(), StoreError>;

    async fn read_all_rows(&self) -> Result<Vec<Vec<String>>, StoreError>;

    async fn update_cell(&self, row: usize, column: usize, value: String)
        -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
struct MemoryState {
    rows: Vec<Vec<String>>,
    fail_reads: bool,
    fail_appends: bool,
    fail_updates: bool,
    updates_until_failure: Option<usize>,
}

/// In-process row store used by tests and local runs.
#[derive(Debug, Default)]
pub struct MemoryRowStore {
    state: Mutex<MemoryState>,
}

impl MemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<Vec<String>>) -> Self {
        let store = Self::default();
        store.lock().rows = rows;
        store
    }

    pub fn rows(&self) -> Vec<Vec<String>> {
        self.lock().rows.clone()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    pub fn fail_appends(&self, fail: bool) {
        self.lock().fail_appends = fail;
    }

    pub fn fail_updates(&self, fail: bool) {
        self.lock().fail_updates = fail;
    }

    /// Lets `count` more updates through, then refuses the rest.
    pub fn fail_updates_after(&self, count: usize) {
        self.lock().updates_until_failure = Some(count);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // rows stay consistent even if a holder panicked
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl RowStore for MemoryRowStore {
    async fn append_row(&self, fields: Vec<String>) -> Result<(), StoreError> {
        let mut state = self.lock();
        if state.fail_appends {
            return Err(StoreError::Injected("append refused".to_string()));
        }
        state.rows.push(fields);
        Ok(())
    }

    async fn read_all_rows(&self) -> Result<Vec<Vec<String>>, StoreError> {
        let state = self.lock();
        if state.fail_reads {
            return Err(StoreError::Injected("read refused".to_string()));
        }
        Ok(state.rows.clone())
    }

    async fn update_cell(
        &self,
        row: usize,
        column: usize,
        value: String,
    ) -> Result<(), StoreError> {
        let mut state = self.lock();
        if state.fail_updates || state.updates_until_failure == Some(0) {
            return Err(StoreError::Injected("update refused".to_string()));
        }
        if let Some(remaining) = state.updates_until_failure.as_mut() {
            *remaining -= 1;
        }
        if row == 0 || column == 0 {
            return Err(StoreError::Api {
                status: 400,
                body: format!("invalid cell ({}, {})", row, column),
            });
        }
        if state.rows.len() < row {
            state.rows.resize(row, Vec::new());
        }
        let cells = &mut state.rows[row - 1];
        if cells.len() < column {
            cells.resize(column, String::new());
        }
        cells[column - 1] = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_update_cell_pads_short_rows() {
        let store = MemoryRowStore::with_rows(vec![vec!["a".into()], vec!["b".into()]]);

        store.update_cell(2, 3, "x".to_string()).await.unwrap();

        assert_eq!(
            store.rows(),
            vec![
                vec!["a".to_string()],
                vec!["b".to_string(), String::new(), "x".to_string()],
            ]
        );
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = MemoryRowStore::new();
        store.fail_appends(true);
        assert!(store.append_row(vec!["a".into()]).await.is_err());
        assert!(store.rows().is_empty());

        store.fail_reads(true);
        assert!(store.read_all_rows().await.is_err());
    }

    #[tokio::test]
    async fn test_fail_updates_after_count() {
        let store = MemoryRowStore::with_rows(vec![vec!["a".into()]]);
        store.fail_updates_after(1);

        assert!(store.update_cell(1, 1, "b".to_string()).await.is_ok());
        assert!(store.update_cell(1, 2, "c".to_string()).await.is_err());
        assert_eq!(store.rows(), vec![vec!["b".to_string()]]);
    }
}
