//! Test double that rejects selected writes and forwards everything else to
//! a [`MemoryClient`].

use async_trait::async_trait;
use serde_json::Value;

use crate::client::{Client, Table};
use crate::error::{StoreError, StoreResult};
use crate::memory::MemoryClient;

#[derive(Clone, Default)]
pub struct FailingClient {
    pub inner: MemoryClient,
    rules: Vec<(Table, Option<(String, Value)>)>,
    unhealthy: bool,
}

impl FailingClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an already populated store.
    pub fn wrapping(inner: MemoryClient) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// Fail the health check while still serving reads and writes.
    pub fn unhealthy(mut self) -> Self {
        self.unhealthy = true;
        self
    }

    /// Reject every write to `table`.
    pub fn reject_table(mut self, table: Table) -> Self {
        self.rules.push((table, None));
        self
    }

    /// Reject writes to `table` carrying `column = value`.
    pub fn reject_row(mut self, table: Table, column: &str, value: impl Into<Value>) -> Self {
        self.rules
            .push((table, Some((column.to_string(), value.into()))));
        self
    }

    fn check(&self, table: Table, row: &Value) -> StoreResult<()> {
        let rejected = self.rules.iter().any(|(t, rule)| {
            *t == table
                && match rule {
                    None => true,
                    Some((column, value)) => row.get(column) == Some(value),
                }
        });

        if rejected {
            Err(StoreError::Rejected {
                table,
                reason: "rejected by test".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Client for FailingClient {
    async fn health_check(&self) -> StoreResult<()> {
        if self.unhealthy {
            return Err(StoreError::Unhealthy("auth endpoint returned HTTP 503".into()));
        }
        self.inner.health_check().await
    }

    async fn upsert(
        &self,
        table: Table,
        rows: Vec<Value>,
        on_conflict: &[&str],
    ) -> StoreResult<()> {
        for row in &rows {
            self.check(table, row)?;
        }
        self.inner.upsert(table, rows, on_conflict).await
    }

    async fn insert(&self, table: Table, row: Value) -> StoreResult<Value> {
        self.check(table, &row)?;
        self.inner.insert(table, row).await
    }

    async fn select(&self, table: Table, columns: &[&str]) -> StoreResult<Vec<Value>> {
        self.inner.select(table, columns).await
    }
}
