//! A handle to a statement execution's outcome: either a plain
//! `OK` (affected rows / last insert id, no rows) or a streamed row set fed
//! by a background task through a bounded channel.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::protocol::ColumnDefinition;
use crate::value::MySqlColumnValue;

pub type Row = Vec<MySqlColumnValue>;

/// One statement execution's result. `fetch`/`fetch_all` drain the row
/// channel; `close_cursor` is idempotent and may be called even after the
/// rows are fully drained.
pub struct ResultSet {
    pub affected_rows: u64,
    pub last_insert_id: u64,
    columns: Arc<Vec<ColumnDefinition>>,
    rows: Option<mpsc::Receiver<Result<Row>>>,
    closed: bool,
}

impl ResultSet {
    pub(crate) fn ok_only(affected_rows: u64, last_insert_id: u64) -> Self {
        ResultSet {
            affected_rows,
            last_insert_id,
            columns: Arc::new(Vec::new()),
            rows: None,
            closed: true,
        }
    }

    pub(crate) fn streaming(columns: Arc<Vec<ColumnDefinition>>, rows: mpsc::Receiver<Result<Row>>) -> Self {
        ResultSet {
            affected_rows: 0,
            last_insert_id: 0,
            columns,
            rows: Some(rows),
            closed: false,
        }
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    /// The next row, or `None` once the server's row stream has ended
    /// normally.
    pub async fn fetch(&mut self) -> Result<Option<Row>> {
        let Some(rx) = self.rows.as_mut() else {
            return Ok(None);
        };
        match rx.recv().await {
            None => {
                self.closed = true;
                self.rows = None;
                Ok(None)
            }
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => {
                self.closed = true;
                self.rows = None;
                Err(e)
            }
        }
    }

    pub async fn fetch_all(&mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.fetch().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    fn column_index(&self, alias: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name() == alias)
            .ok_or_else(|| Error::usage(format!("no such column: {alias:?}")))
    }

    pub async fn fetch_column(&mut self, alias: &str) -> Result<Option<MySqlColumnValue>> {
        let index = self.column_index(alias)?;
        Ok(self.fetch().await?.map(|mut row| row.swap_remove(index)))
    }

    pub async fn fetch_column_all(&mut self, alias: &str) -> Result<Vec<MySqlColumnValue>> {
        let index = self.column_index(alias)?;
        let mut values = Vec::new();
        while let Some(mut row) = self.fetch().await? {
            values.push(row.swap_remove(index));
        }
        Ok(values)
    }

    /// Idempotent. If rows are still being produced, drains them: the
    /// producer task is still reading the server's stream until its own
    /// EOF, and dropping the receiver mid-stream would desynchronize the
    /// underlying Client.
    pub async fn close_cursor(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if let Some(mut rx) = self.rows.take() {
            while rx.recv().await.is_some() {}
        }
        Ok(())
    }
}
