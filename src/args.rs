use std::path::PathBuf;

use crate::database::Database;
use crate::hooks::HookMatch;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(term_width = 0, about = "Seed the fly pattern reference tables")]
pub struct Args {
    /// Reference document describing flies, their materials and tutorials
    #[arg(short, long, default_value = "fly_reference.json")]
    pub input: PathBuf,

    /// The backing store to seed
    #[arg(short, long, default_value = "rest")]
    pub database: Database,

    /// Base URL of the hosted database project
    #[arg(long, env = "SUPABASE_URL", hide_env_values = true)]
    pub url: Option<String>,

    /// Service credential used for every request
    #[arg(long, env = "SUPABASE_SERVICE_KEY", hide_env_values = true)]
    pub service_key: Option<String>,

    /// Number of materials sent per upsert request
    #[arg(long, default_value = "100", value_parser = clap::value_parser!(u32).range(1..))]
    pub batch_size: u32,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout_secs: u64,

    /// How hook names are matched against stored materials
    #[arg(long, default_value = "substring")]
    pub hook_match: HookMatch,

    /// Do not check that the store is reachable before seeding
    #[arg(long)]
    pub skip_health_check: bool,

    /// Log at debug level
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}
