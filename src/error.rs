use std::path::PathBuf;

use thiserror::Error;

use crate::client::Table;

/// Errors that stop the run before or between stages.
#[derive(Error, Debug)]
pub enum SeedError {
    #[error("reference document not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read reference document {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed reference document {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} must be set")]
    MissingConfig(&'static str),

    #[error("invalid value for {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

/// Failure of a single remote operation. Callers log these and move on.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("request to {table} failed: {source}")]
    Transport {
        table: Table,
        #[source]
        source: reqwest::Error,
    },

    #[error("{table} returned HTTP {status}: {body}")]
    Status {
        table: Table,
        status: u16,
        body: String,
    },

    #[error("unexpected response from {table}: {reason}")]
    Decode { table: Table, reason: String },

    #[error("health check failed: {0}")]
    Unhealthy(String),

    #[error("{table} did not return the id of the inserted row")]
    MissingId { table: Table },

    #[error("{table} rejected the write: {reason}")]
    Rejected { table: Table, reason: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_name_the_table() {
        let status = StoreError::Status {
            table: Table::FlyMaterials,
            status: 409,
            body: "duplicate key".into(),
        };
        assert_eq!(
            status.to_string(),
            "fly_materials returned HTTP 409: duplicate key"
        );

        let decode = StoreError::Decode {
            table: Table::Materials,
            reason: "row without id".into(),
        };
        assert_eq!(
            decode.to_string(),
            "unexpected response from materials: row without id"
        );
    }

    #[test]
    fn health_failures_are_not_tied_to_a_table() {
        let err = StoreError::Unhealthy("auth endpoint returned HTTP 503 Service Unavailable".into());
        assert_eq!(
            err.to_string(),
            "health check failed: auth endpoint returned HTTP 503 Service Unavailable"
        );
    }
}
