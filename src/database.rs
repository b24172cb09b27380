use clap::ValueEnum;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Database {
    /// Hosted Postgres reached through its PostgREST endpoint
    Rest,
    /// In-process store; nothing is sent anywhere (dry run)
    Memory,
}
