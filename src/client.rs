use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreResult;

/// Tables written by the seeder, in foreign-key order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Table {
    MaterialTypes,
    FishSpecies,
    Materials,
    Flies,
    FlySpecies,
    FlyMaterials,
    Tutorials,
    HookEquivalents,
}

impl Table {
    pub const ALL: [Table; 8] = [
        Table::MaterialTypes,
        Table::FishSpecies,
        Table::Materials,
        Table::Flies,
        Table::FlySpecies,
        Table::FlyMaterials,
        Table::Tutorials,
        Table::HookEquivalents,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Table::MaterialTypes => "material_types",
            Table::FishSpecies => "fish_species",
            Table::Materials => "materials",
            Table::Flies => "flies",
            Table::FlySpecies => "fly_species",
            Table::FlyMaterials => "fly_materials",
            Table::Tutorials => "tutorials",
            Table::HookEquivalents => "hook_equivalents",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Surrogate key assigned by the store. Postgres identity columns come back
/// as numbers, `uuid` columns as strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Int(id) => write!(f, "{id}"),
            RowId::Text(id) => f.write_str(id),
        }
    }
}

/// Pull the `id` column out of a returned row.
pub fn row_id(row: &Value) -> Option<RowId> {
    row.get("id")
        .and_then(|id| serde_json::from_value(id.clone()).ok())
}

#[async_trait]
pub trait Client: Send + Sync {
    /// Check that the store is reachable with the configured credentials
    async fn health_check(&self) -> StoreResult<()>;

    /// Insert rows, updating any existing row that matches on `on_conflict`
    async fn upsert(&self, table: Table, rows: Vec<Value>, on_conflict: &[&str])
        -> StoreResult<()>;

    /// Insert a single row and return it as stored
    async fn insert(&self, table: Table, row: Value) -> StoreResult<Value>;

    /// Read every row of a table, projected to `columns`
    async fn select(&self, table: Table, columns: &[&str]) -> StoreResult<Vec<Value>>;
}
