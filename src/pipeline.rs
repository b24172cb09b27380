use tracing::info;

use crate::catalog::{seed_fish_species, seed_material_types};
use crate::client::Client;
use crate::flies::compose_flies;
use crate::hooks::{link_hook_equivalents, HookMatch, HOOK_EQUIVALENTS};
use crate::materials::seed_materials;
use crate::metrics::LoadReport;
use crate::reference::FlyReference;

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub batch_size: usize,
    pub hook_match: HookMatch,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            batch_size: 100,
            hook_match: HookMatch::Substring,
        }
    }
}

/// Run every stage in foreign-key order. Row-level failures are recorded in
/// the report; the run itself always completes.
pub async fn run<C: Client>(client: &C, reference: &FlyReference, options: RunOptions) -> LoadReport {
    let mut report = LoadReport::default();
    info!("Loaded {} flies from reference", reference.flies.len());

    seed_material_types(client, &mut report).await;
    seed_fish_species(client, &mut report).await;
    seed_materials(client, reference, options.batch_size, &mut report).await;
    compose_flies(client, reference, &mut report).await;
    link_hook_equivalents(client, HOOK_EQUIVALENTS, options.hook_match, &mut report).await;

    report.finish();
    report
}
