//! Fly patterns and everything hanging off them: target species, material
//! links and tutorials.
//!
//! Flies are insert-only. Running this stage twice against the same store
//! creates a second copy of every fly and its links.

use std::collections::HashMap;
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::catalog::name_index;
use crate::client::{row_id, Client, RowId, Table};
use crate::error::{StoreError, StoreResult};
use crate::materials::MaterialKey;
use crate::metrics::LoadReport;
use crate::reference::{FlyRecord, FlyReference, HookSize, MaterialEntry, TutorialEntry};

#[derive(Debug, Serialize)]
struct FlyRow<'a> {
    name: &'a str,
    category: &'a str,
    sizes: &'a [HookSize],
    difficulty: &'a str,
    is_custom: bool,
}

#[derive(Debug, Serialize)]
struct FlySpeciesRow<'a> {
    fly_id: &'a RowId,
    species_id: &'a RowId,
}

#[derive(Debug, Serialize)]
struct FlyMaterialRow<'a> {
    fly_id: &'a RowId,
    material_id: &'a RowId,
    required: bool,
    substitutable: bool,
    substitute_note: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct TutorialRow<'a> {
    fly_id: &'a RowId,
    url: &'a str,
    title: Option<&'a str>,
    tutorial_type: &'a str,
}

/// Surrogate ids the composer resolves natural keys against.
#[derive(Debug, Default, Clone)]
pub struct FlyLinks {
    pub species: HashMap<String, RowId>,
    pub materials: HashMap<MaterialKey, RowId>,
}

impl FlyLinks {
    pub async fn fetch<C: Client>(client: &C) -> Self {
        let species = name_index(client, Table::FishSpecies).await;
        let materials = match material_index(client).await {
            Ok(materials) => materials,
            Err(e) => {
                warn!(error = %e, "material lookup failed; material links will be skipped");
                HashMap::new()
            }
        };

        Self { species, materials }
    }
}

/// `MaterialKey -> id` for every stored material. Type ids are turned back
/// into type names with one read of `material_types`; materials whose type
/// cannot be resolved are left out.
pub async fn material_index<C: Client>(client: &C) -> StoreResult<HashMap<MaterialKey, RowId>> {
    let type_names: HashMap<RowId, String> = name_index(client, Table::MaterialTypes)
        .await
        .into_iter()
        .map(|(name, id)| (id, name))
        .collect();

    let rows = client
        .select(Table::Materials, &["id", "name", "material_type_id", "color"])
        .await?;

    let mut index = HashMap::new();
    for row in &rows {
        let Some(id) = row_id(row) else {
            return Err(StoreError::Decode {
                table: Table::Materials,
                reason: format!("row without id: {row}"),
            });
        };
        let Some(name) = row.get("name").and_then(Value::as_str) else {
            continue;
        };
        let type_name = row
            .get("material_type_id")
            .and_then(|v| serde_json::from_value::<RowId>(v.clone()).ok())
            .and_then(|type_id| type_names.get(&type_id));
        let Some(type_name) = type_name else {
            continue;
        };
        let color = row.get("color").and_then(Value::as_str);

        index.insert(MaterialKey::new(name, type_name, color), id);
    }

    Ok(index)
}

/// Insert every fly with its links. Returns how many flies were created.
pub async fn compose_flies<C: Client>(
    client: &C,
    reference: &FlyReference,
    report: &mut LoadReport,
) -> usize {
    info!("Seeding fly patterns...");
    let links = FlyLinks::fetch(client).await;

    for invalid in &reference.invalid {
        warn!(
            index = invalid.index,
            fly = invalid.name.as_deref().unwrap_or("<unnamed>"),
            reason = %invalid.reason,
            "✗ fly record is malformed; skipped"
        );
        report.record_failure(Table::Flies, 1);
    }

    let mut inserted = 0;
    for fly in &reference.flies {
        match insert_fly(client, fly, report).await {
            Ok(fly_id) => {
                link_species(client, &fly_id, &fly.target_species, &links, report).await;
                link_materials(client, &fly_id, &fly.materials, &links, report).await;
                add_tutorials(client, &fly_id, &fly.tutorials, report).await;
                inserted += 1;
                info!("  ✓ {}", fly.name);
            }
            Err(e) => {
                warn!(fly = %fly.name, error = %e, "✗ could not insert fly");
                report.record_failure(Table::Flies, 1);
            }
        }
    }

    info!("✓ Seeded {inserted} fly patterns");
    inserted
}

async fn insert_fly<C: Client>(
    client: &C,
    fly: &FlyRecord,
    report: &mut LoadReport,
) -> StoreResult<RowId> {
    let row = FlyRow {
        name: &fly.name,
        category: &fly.category,
        sizes: &fly.sizes,
        difficulty: &fly.difficulty,
        is_custom: false,
    };

    let start = Instant::now();
    let stored = client.insert(Table::Flies, encode(Table::Flies, &row)?).await?;
    let id = row_id(&stored).ok_or(StoreError::MissingId { table: Table::Flies })?;
    report.record_write(Table::Flies, 1, start.elapsed());
    Ok(id)
}

async fn link_species<C: Client>(
    client: &C,
    fly_id: &RowId,
    target_species: &[String],
    links: &FlyLinks,
    report: &mut LoadReport,
) {
    for species in target_species {
        let Some(species_id) = links.species.get(species) else {
            debug!(%species, "species not seeded; link skipped");
            report.record_skip(Table::FlySpecies);
            continue;
        };

        let row = FlySpeciesRow {
            fly_id,
            species_id,
        };
        insert_link(client, Table::FlySpecies, &row, report).await;
    }
}

async fn link_materials<C: Client>(
    client: &C,
    fly_id: &RowId,
    materials: &[MaterialEntry],
    links: &FlyLinks,
    report: &mut LoadReport,
) {
    for entry in materials {
        let Some(material_id) = links.materials.get(&MaterialKey::from(entry)) else {
            debug!(material = %entry.name, "material not seeded; link skipped");
            report.record_skip(Table::FlyMaterials);
            continue;
        };

        let row = FlyMaterialRow {
            fly_id,
            material_id,
            required: entry.required,
            substitutable: entry.substitutable,
            substitute_note: entry.substitute_note.as_deref(),
        };
        insert_link(client, Table::FlyMaterials, &row, report).await;
    }
}

async fn add_tutorials<C: Client>(
    client: &C,
    fly_id: &RowId,
    tutorials: &[TutorialEntry],
    report: &mut LoadReport,
) {
    for tutorial in tutorials {
        let row = TutorialRow {
            fly_id,
            url: &tutorial.url,
            title: tutorial.title.as_deref(),
            tutorial_type: &tutorial.tutorial_type,
        };
        insert_link(client, Table::Tutorials, &row, report).await;
    }
}

async fn insert_link<C: Client, T: Serialize>(
    client: &C,
    table: Table,
    row: &T,
    report: &mut LoadReport,
) {
    let start = Instant::now();
    let result = match encode(table, row) {
        Ok(value) => client.insert(table, value).await.map(drop),
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => report.record_write(table, 1, start.elapsed()),
        Err(e) => {
            warn!(%table, error = %e, "insert failed");
            report.record_failure(table, 1);
        }
    }
}

fn encode<T: Serialize>(table: Table, row: &T) -> StoreResult<Value> {
    serde_json::to_value(row).map_err(|e| StoreError::Decode {
        table,
        reason: e.to_string(),
    })
}
