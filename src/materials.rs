//! Material rows derived from the materials nested under every fly.
//!
//! The same physical material ("olive dubbing") shows up on many flies, so
//! entries are collapsed on the stored key (name, type id, color) before
//! anything is written. [`MaterialKey`] is the same identity with the type
//! given by name, as fly records spell it.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::catalog::name_index;
use crate::client::{Client, RowId, Table};
use crate::metrics::LoadReport;
use crate::reference::{FlyReference, MaterialEntry};

/// Columns that identify a material row.
pub const MATERIAL_KEY_COLUMNS: [&str; 3] = ["name", "material_type_id", "color"];

/// Identity of a material: (name, type name, color).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MaterialKey {
    pub name: String,
    pub material_type: String,
    pub color: Option<String>,
}

impl MaterialKey {
    pub fn new(name: &str, material_type: &str, color: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            material_type: material_type.to_string(),
            color: color.map(str::to_string),
        }
    }
}

impl From<&MaterialEntry> for MaterialKey {
    fn from(entry: &MaterialEntry) -> Self {
        Self::new(&entry.name, &entry.material_type, entry.color.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialRow {
    pub name: String,
    pub material_type_id: Option<RowId>,
    pub color: Option<String>,
    pub substitutable: bool,
    pub substitute_note: Option<String>,
}

/// Collapse every material entry in the document to one row per
/// `(name, material_type_id, color)`, keeping the first occurrence. Entries
/// whose types are both unknown resolve to the same null type id and collapse
/// too, since the store would treat them as one row.
pub fn collect_materials(
    reference: &FlyReference,
    type_ids: &HashMap<String, RowId>,
) -> Vec<MaterialRow> {
    let mut seen: HashSet<(&str, Option<&RowId>, Option<&str>)> = HashSet::new();
    let mut rows = Vec::new();

    for entry in reference.material_entries() {
        let material_type_id = type_ids.get(&entry.material_type);
        if !seen.insert((entry.name.as_str(), material_type_id, entry.color.as_deref())) {
            continue;
        }

        if material_type_id.is_none() {
            warn!(
                material = %entry.name,
                material_type = %entry.material_type,
                "unknown material type; material stored without one"
            );
        }

        rows.push(MaterialRow {
            name: entry.name.clone(),
            material_type_id: material_type_id.cloned(),
            color: entry.color.clone(),
            substitutable: entry.substitutable,
            substitute_note: entry.substitute_note.clone(),
        });
    }

    rows
}

/// Upsert the collapsed materials in batches. Returns how many rows this
/// call wrote.
pub async fn seed_materials<C: Client>(
    client: &C,
    reference: &FlyReference,
    batch_size: usize,
    report: &mut LoadReport,
) -> usize {
    let batch_size = batch_size.max(1);
    info!("Extracting materials from flies...");
    let type_ids = name_index(client, Table::MaterialTypes).await;
    let materials = collect_materials(reference, &type_ids);
    info!("Found {} unique materials", materials.len());

    let mut written = 0;
    for (index, batch) in materials.chunks(batch_size).enumerate() {
        let offset = index * batch_size;
        let rows = match batch
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<Value>, _>>()
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!(offset, error = %e, "could not encode materials batch");
                report.record_failure(Table::Materials, batch.len());
                continue;
            }
        };

        let start = Instant::now();
        match client
            .upsert(Table::Materials, rows, &MATERIAL_KEY_COLUMNS)
            .await
        {
            Ok(()) => {
                report.record_write(Table::Materials, batch.len(), start.elapsed());
                written += batch.len();
            }
            Err(e) => {
                warn!(offset, size = batch.len(), error = %e, "materials batch failed");
                report.record_failure(Table::Materials, batch.len());
            }
        }
    }

    info!("✓ Seeded {written} materials");
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::seed_material_types;
    use crate::memory::MemoryClient;
    use crate::testing::FailingClient;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn reference(value: Value) -> FlyReference {
        serde_json::from_value(value).unwrap()
    }

    fn fly(name: &str, materials: Value) -> Value {
        json!({
            "name": name,
            "category": "nymph",
            "sizes": [14],
            "difficulty": "beginner",
            "materials": materials
        })
    }

    fn type_ids() -> HashMap<String, RowId> {
        HashMap::from([
            ("dubbing".to_string(), RowId::Int(5)),
            ("synthetic".to_string(), RowId::Int(8)),
        ])
    }

    #[test]
    fn identical_keys_collapse_to_the_first_entry() {
        let doc = reference(json!({"flies": [
            fly("Hare's Ear", json!([
                {"name": "Dubbing", "type": "dubbing", "color": "olive", "substitutable": true}
            ])),
            fly("Scud", json!([
                {"name": "Dubbing", "type": "dubbing", "color": "olive"},
                {"name": "Dubbing", "type": "dubbing", "color": "tan"},
                {"name": "Dubbing", "type": "dubbing"}
            ])),
        ]}));

        let rows = collect_materials(&doc, &type_ids());

        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0],
            MaterialRow {
                name: "Dubbing".into(),
                material_type_id: Some(RowId::Int(5)),
                color: Some("olive".into()),
                substitutable: true,
                substitute_note: None,
            }
        );
        assert_eq!(rows[2].color, None);
    }

    #[test]
    fn untyped_entries_fall_under_synthetic() {
        let doc = reference(json!({"flies": [
            fly("A", json!([{"name": "Krystal Flash"}])),
            fly("B", json!([{"name": "Krystal Flash", "type": "synthetic"}])),
        ]}));

        let rows = collect_materials(&doc, &type_ids());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].material_type_id, Some(RowId::Int(8)));
    }

    #[test]
    fn separator_characters_do_not_collide() {
        let a = MaterialKey::new("wire_gold", "wire", None);
        let b = MaterialKey::new("wire", "gold_wire", None);
        assert_ne!(a, b);

        let doc = reference(json!({"flies": [fly("A", json!([
            {"name": "a_b", "type": "c"},
            {"name": "a", "type": "b_c"}
        ]))]}));
        assert_eq!(collect_materials(&doc, &HashMap::new()).len(), 2);
    }

    #[test]
    fn unknown_type_keeps_the_material() {
        let doc = reference(json!({"flies": [fly("A", json!([{"name": "Mystery", "type": "exotic"}]))]}));
        let rows = collect_materials(&doc, &type_ids());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].material_type_id, None);
    }

    #[test]
    fn unknown_types_with_the_same_name_share_one_row() {
        let doc = reference(json!({"flies": [fly("A", json!([
            {"name": "Hook", "type": "hooks"},
            {"name": "Hook", "type": "hoook"}
        ]))]}));

        let rows = collect_materials(&doc, &HashMap::new());

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].material_type_id, None);
    }

    #[tokio::test]
    async fn unknown_types_do_not_break_a_batch() {
        let client = MemoryClient::new();
        let mut report = LoadReport::default();
        let doc = reference(json!({"flies": [fly("A", json!([
            {"name": "Hook", "type": "hooks"},
            {"name": "Hook", "type": "hoook"},
            {"name": "Thread", "type": "thread"}
        ]))]}));

        let written = seed_materials(&client, &doc, 100, &mut report).await;

        assert_eq!(written, 2);
        assert_eq!(report.stats(Table::Materials).failed, 0);
        assert_eq!(client.row_count(Table::Materials).await, 2);
    }

    #[tokio::test]
    async fn each_call_reports_its_own_writes() {
        let client = MemoryClient::new();
        let mut report = LoadReport::default();
        let first = reference(json!({"flies": [fly("A", json!([
            {"name": "Bead"}, {"name": "Wire"}, {"name": "Foam"}
        ]))]}));
        let second = reference(json!({"flies": [fly("B", json!([{"name": "Tinsel"}]))]}));

        assert_eq!(seed_materials(&client, &first, 100, &mut report).await, 3);
        assert_eq!(seed_materials(&client, &second, 100, &mut report).await, 1);
        assert_eq!(report.stats(Table::Materials).written, 4);
    }

    #[tokio::test]
    async fn seeding_twice_keeps_one_row_per_key() {
        let client = MemoryClient::new();
        let mut report = LoadReport::default();
        seed_material_types(&client, &mut report).await;

        let doc = reference(json!({"flies": [
            fly("A", json!([
                {"name": "Peacock herl", "type": "herl"},
                {"name": "Bead", "type": "bead", "color": "gold"}
            ])),
            fly("B", json!([{"name": "Peacock herl", "type": "herl"}])),
        ]}));

        seed_materials(&client, &doc, 100, &mut report).await;
        seed_materials(&client, &doc, 100, &mut report).await;

        assert_eq!(client.row_count(Table::Materials).await, 2);
    }

    #[tokio::test]
    async fn batches_are_split_by_size() {
        let client = MemoryClient::new();
        let mut report = LoadReport::default();
        let materials: Vec<Value> = (0..5)
            .map(|i| json!({"name": format!("Material {i}")}))
            .collect();
        let doc = reference(json!({"flies": [fly("A", Value::Array(materials))]}));

        seed_materials(&client, &doc, 2, &mut report).await;

        assert_eq!(client.row_count(Table::Materials).await, 5);
        assert_eq!(report.stats(Table::Materials).written, 5);
    }

    #[tokio::test]
    async fn failed_batch_does_not_block_later_batches() {
        let client = FailingClient::new().reject_row(Table::Materials, "name", "Material 0");
        let mut report = LoadReport::default();
        let materials: Vec<Value> = (0..5)
            .map(|i| json!({"name": format!("Material {i}")}))
            .collect();
        let doc = reference(json!({"flies": [fly("A", Value::Array(materials))]}));

        seed_materials(&client, &doc, 2, &mut report).await;

        let stats = report.stats(Table::Materials);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.written, 3);
        assert_eq!(client.inner.row_count(Table::Materials).await, 3);
    }
}
