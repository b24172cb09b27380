//! Fixed enumerations: material categories and target fish species.

use std::collections::HashMap;
use std::time::Instant;

use serde_json::{json, Value};
use tracing::{info, warn};

use crate::client::{row_id, Client, RowId, Table};
use crate::metrics::LoadReport;

pub const MATERIAL_TYPES: &[(&str, &str)] = &[
    ("thread", "Fly tying thread"),
    ("hook", "Fly hooks"),
    ("bead", "Beads and cones"),
    ("wire", "Wire and tinsel"),
    ("dubbing", "Dubbing materials"),
    ("feather", "Feathers and hackle"),
    ("hair", "Hair and fur"),
    ("synthetic", "Synthetic materials"),
    ("flash", "Flash and flashabou"),
    ("herl", "Herl and peacock"),
    ("body_material", "Body materials (chenille, etc)"),
    ("tinsel", "Tinsel and mylar"),
    ("foam", "Foam materials"),
    ("eyes", "Eyes (dumbbell, bead chain, 3D)"),
    ("shank", "Hook shanks"),
    ("finish", "Finishing materials (epoxy, resin)"),
    ("chenille", "Chenille"),
    ("tool", "Tools"),
    ("fur", "Fur strips"),
    ("body", "Body materials"),
    ("head", "Heads (Fish-Skull, etc)"),
];

pub const FISH_SPECIES: &[(&str, &[&str])] = &[
    ("trout", &["rainbow", "brown", "brook", "cutthroat"]),
    ("bass", &["largemouth", "smallmouth", "spotted"]),
    ("pike", &["northern pike"]),
    ("muskie", &["muskellunge", "musky"]),
    ("panfish", &["bluegill", "crappie", "sunfish"]),
    ("saltwater", &["general saltwater"]),
    ("striped_bass", &["striper"]),
    ("redfish", &["red drum"]),
    ("snook", &[]),
    ("tarpon", &["silver king"]),
    ("bonefish", &["bones"]),
    ("permit", &[]),
    ("carp", &["common carp"]),
    ("steelhead", &["sea-run rainbow"]),
    ("salmon", &["chinook", "coho", "sockeye"]),
    ("bluefish", &["blues"]),
    ("GT", &["giant trevally"]),
    ("walleye", &["walleyed pike"]),
    ("marlin", &[]),
    ("swordfish", &[]),
    ("grayling", &["arctic grayling"]),
];

pub async fn seed_material_types<C: Client>(client: &C, report: &mut LoadReport) {
    info!("Seeding material types...");
    let rows = MATERIAL_TYPES
        .iter()
        .map(|(name, description)| (*name, json!({"name": name, "description": description})));
    upsert_by_name(client, Table::MaterialTypes, rows, report).await;
    info!("✓ Seeded {} material types", MATERIAL_TYPES.len());
}

pub async fn seed_fish_species<C: Client>(client: &C, report: &mut LoadReport) {
    info!("Seeding fish species...");
    let rows = FISH_SPECIES
        .iter()
        .map(|(name, aliases)| (*name, json!({"name": name, "common_names": aliases})));
    upsert_by_name(client, Table::FishSpecies, rows, report).await;
    info!("✓ Seeded {} fish species", FISH_SPECIES.len());
}

/// `name -> id` for a table keyed by name. A failed read yields an empty map,
/// so everything that depends on it is skipped instead of aborting the run.
pub async fn name_index<C: Client>(client: &C, table: Table) -> HashMap<String, RowId> {
    let rows = match client.select(table, &["id", "name"]).await {
        Ok(rows) => rows,
        Err(e) => {
            warn!(%table, error = %e, "lookup failed; dependent rows will be skipped");
            return HashMap::new();
        }
    };

    rows.iter()
        .filter_map(|row| {
            let name = row.get("name")?.as_str()?;
            Some((name.to_string(), row_id(row)?))
        })
        .collect()
}

/// One request per row, so a rejected row never blocks the rest.
async fn upsert_by_name<C, I>(client: &C, table: Table, rows: I, report: &mut LoadReport)
where
    C: Client,
    I: Iterator<Item = (&'static str, Value)>,
{
    for (name, row) in rows {
        let start = Instant::now();
        match client.upsert(table, vec![row], &["name"]).await {
            Ok(()) => report.record_write(table, 1, start.elapsed()),
            Err(e) => {
                warn!(%table, row = name, error = %e, "upsert failed");
                report.record_failure(table, 1);
            }
        }
    }
}
