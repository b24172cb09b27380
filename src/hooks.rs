//! Links equivalent hooks from different manufacturers.

use std::time::Instant;

use clap::ValueEnum;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::client::{row_id, Client, RowId, Table};
use crate::metrics::LoadReport;

pub const HOOK_EQUIVALENTS: &[(&str, &str)] = &[
    ("Tiemco 100", "Umpqua U200"),
    ("Tiemco 5263", "Umpqua U506"),
    ("Tiemco 5263", "Mustad 9672"),
    ("Tiemco 3761", "Umpqua U203"),
    ("Tiemco 2457", "Umpqua U202"),
    ("Gamakatsu SL11-3H", "Mustad 34007"),
    ("Gamakatsu SL11-3H", "Owner SSW"),
];

pub const EQUIVALENCE_NOTE: &str = "Similar size and style";

/// How a hook name from [`HOOK_EQUIVALENTS`] is found among stored materials.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookMatch {
    /// The `name_brand` label contains the hook name
    Substring,
    /// The material name equals the hook name, ignoring case
    Exact,
}

/// A stored material considered as a hook endpoint.
#[derive(Debug, Clone)]
pub struct HookCandidate {
    pub id: RowId,
    pub name: String,
    pub brand: Option<String>,
}

impl HookCandidate {
    fn from_row(row: &Value) -> Option<Self> {
        Some(Self {
            id: row_id(row)?,
            name: row.get("name")?.as_str()?.to_string(),
            brand: row.get("brand").and_then(Value::as_str).map(str::to_string),
        })
    }

    pub fn label(&self) -> String {
        format!("{}_{}", self.name, self.brand.as_deref().unwrap_or(""))
    }

    fn matches(&self, hook: &str, mode: HookMatch) -> bool {
        match mode {
            HookMatch::Substring => self.label().contains(hook),
            HookMatch::Exact => self.name.trim().eq_ignore_ascii_case(hook.trim()),
        }
    }
}

/// Find the material for `hook`. Candidates are scanned in store order and
/// the last match wins.
pub fn resolve_hook<'a>(
    candidates: &'a [HookCandidate],
    hook: &str,
    mode: HookMatch,
) -> Option<&'a RowId> {
    candidates
        .iter()
        .rev()
        .find(|c| c.matches(hook, mode))
        .map(|c| &c.id)
}

pub async fn link_hook_equivalents<C: Client>(
    client: &C,
    pairs: &[(&str, &str)],
    mode: HookMatch,
    report: &mut LoadReport,
) -> usize {
    info!("Seeding hook equivalents...");
    let candidates: Vec<HookCandidate> = match client
        .select(Table::Materials, &["id", "name", "brand"])
        .await
    {
        Ok(rows) => rows.iter().filter_map(HookCandidate::from_row).collect(),
        Err(e) => {
            warn!(error = %e, "material lookup failed; no hook equivalents linked");
            Vec::new()
        }
    };

    let mut inserted = 0;
    for (first, second) in pairs {
        let (Some(hook_1_id), Some(hook_2_id)) = (
            resolve_hook(&candidates, first, mode),
            resolve_hook(&candidates, second, mode),
        ) else {
            debug!(first, second, "hook not found; equivalence skipped");
            report.record_skip(Table::HookEquivalents);
            continue;
        };

        let row = json!({
            "hook_1_id": hook_1_id,
            "hook_2_id": hook_2_id,
            "equivalence_note": EQUIVALENCE_NOTE,
        });

        let start = Instant::now();
        match client.insert(Table::HookEquivalents, row).await {
            Ok(_) => {
                report.record_write(Table::HookEquivalents, 1, start.elapsed());
                inserted += 1;
            }
            Err(e) => {
                warn!(first, second, error = %e, "could not insert hook equivalent");
                report.record_failure(Table::HookEquivalents, 1);
            }
        }
    }

    info!("✓ Seeded {inserted} hook equivalents");
    inserted
}
