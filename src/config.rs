//! Connection settings for the REST backend.

use std::fmt;
use std::time::Duration;

use crate::error::SeedError;

pub const URL_VAR: &str = "SUPABASE_URL";
pub const SERVICE_KEY_VAR: &str = "SUPABASE_SERVICE_KEY";

#[derive(Clone)]
pub struct StoreConfig {
    pub url: String,
    pub service_key: String,
    pub timeout: Duration,
}

impl StoreConfig {
    /// Validate the connection parameters. Both must be present and non-empty.
    pub fn new(
        url: Option<String>,
        service_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, SeedError> {
        let url = non_empty(url).ok_or(SeedError::MissingConfig(URL_VAR))?;
        let service_key = non_empty(service_key).ok_or(SeedError::MissingConfig(SERVICE_KEY_VAR))?;

        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(SeedError::InvalidConfig {
                field: URL_VAR,
                reason: format!("expected an http(s) URL, got {url:?}"),
            });
        }
        if timeout_secs == 0 {
            return Err(SeedError::InvalidConfig {
                field: "timeout",
                reason: "must be at least one second".to_string(),
            });
        }

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            service_key,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// Keep the credential out of logs.
impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url)
            .field("service_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Load `.env` from the working directory, if there is one.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}
