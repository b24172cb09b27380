use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::client::{Client, Table};
use crate::error::{StoreError, StoreResult};

/// In-process store used for dry runs. Rows are JSON objects; every row gets
/// a UUID `id` on creation.
#[derive(Clone, Default)]
pub struct MemoryClient {
    tables: Arc<Mutex<HashMap<Table, Vec<Map<String, Value>>>>>,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn row_count(&self, table: Table) -> usize {
        self.tables.lock().await.get(&table).map_or(0, Vec::len)
    }

    /// Snapshot of a table, in insertion order.
    #[cfg(test)]
    pub async fn rows(&self, table: Table) -> Vec<Value> {
        self.tables
            .lock()
            .await
            .get(&table)
            .map(|rows| rows.iter().cloned().map(Value::Object).collect())
            .unwrap_or_default()
    }

    fn object(table: Table, row: Value) -> StoreResult<Map<String, Value>> {
        match row {
            Value::Object(map) => Ok(map),
            other => Err(StoreError::Rejected {
                table,
                reason: format!("row must be a JSON object, got {other}"),
            }),
        }
    }

    fn new_id() -> Value {
        Value::String(uuid::Uuid::new_v4().to_string())
    }

    // Missing columns compare as null, so (name, NULL) matches (name, NULL).
    fn same_key(existing: &Map<String, Value>, row: &Map<String, Value>, key: &[&str]) -> bool {
        key.iter().all(|column| {
            existing.get(*column).unwrap_or(&Value::Null) == row.get(*column).unwrap_or(&Value::Null)
        })
    }
}

#[async_trait]
impl Client for MemoryClient {
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn upsert(
        &self,
        table: Table,
        rows: Vec<Value>,
        on_conflict: &[&str],
    ) -> StoreResult<()> {
        // Validate the whole batch first; a bad row rejects the request.
        let rows = rows
            .into_iter()
            .map(|row| Self::object(table, row))
            .collect::<StoreResult<Vec<_>>>()?;

        let key: &[&str] = if on_conflict.is_empty() {
            &["id"]
        } else {
            on_conflict
        };

        // Postgres refuses a batch that would update the same row twice.
        if !on_conflict.is_empty() {
            for (i, row) in rows.iter().enumerate() {
                if rows[..i].iter().any(|earlier| Self::same_key(earlier, row, key)) {
                    return Err(StoreError::Rejected {
                        table,
                        reason: format!("batch repeats the key ({})", key.join(", ")),
                    });
                }
            }
        }

        let mut tables = self.tables.lock().await;
        let stored = tables.entry(table).or_default();

        for mut row in rows {
            let matched = if key == ["id"] && !row.contains_key("id") {
                None
            } else {
                stored.iter_mut().find(|existing| Self::same_key(existing, &row, key))
            };

            match matched {
                Some(existing) => {
                    row.remove("id");
                    existing.extend(row);
                }
                None => {
                    row.entry("id").or_insert_with(Self::new_id);
                    stored.push(row);
                }
            }
        }

        Ok(())
    }

    async fn insert(&self, table: Table, row: Value) -> StoreResult<Value> {
        let mut row = Self::object(table, row)?;
        row.entry("id").or_insert_with(Self::new_id);

        let mut tables = self.tables.lock().await;
        tables.entry(table).or_default().push(row.clone());

        Ok(Value::Object(row))
    }

    async fn select(&self, table: Table, columns: &[&str]) -> StoreResult<Vec<Value>> {
        let tables = self.tables.lock().await;
        let rows = tables
            .get(&table)
            .map(|rows| {
                rows.iter()
                    .map(|row| {
                        let projected = columns
                            .iter()
                            .map(|c| (c.to_string(), row.get(*c).cloned().unwrap_or(Value::Null)))
                            .collect();
                        Value::Object(projected)
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(rows)
    }
}
