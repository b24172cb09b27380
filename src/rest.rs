use crate::client::{Client, Table};
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{RequestBuilder, Response};
use serde_json::Value;

/// Client for a PostgREST endpoint as served by Supabase (`{url}/rest/v1`).
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
}

impl RestClient {
    pub fn new(config: &StoreConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(&config.service_key)?;
        key.set_sensitive(true);
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.service_key))?;
        bearer.set_sensitive(true);
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.url.clone(),
        })
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    async fn send(&self, table: Table, request: RequestBuilder) -> StoreResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|source| StoreError::Transport { table, source })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Status {
            table,
            status: status.as_u16(),
            body,
        })
    }

    async fn rows(table: Table, response: Response) -> StoreResult<Vec<Value>> {
        let body: Value = response.json().await.map_err(|e| StoreError::Decode {
            table,
            reason: e.to_string(),
        })?;

        match body {
            Value::Array(rows) => Ok(rows),
            other => Err(StoreError::Decode {
                table,
                reason: format!("expected an array of rows, got {other}"),
            }),
        }
    }
}

#[async_trait]
impl Client for RestClient {
    async fn health_check(&self) -> StoreResult<()> {
        let url = format!("{}/auth/v1/health", self.base_url);
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| StoreError::Unhealthy(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Unhealthy(format!("auth endpoint returned HTTP {status}")));
        }
        Ok(())
    }

    async fn upsert(
        &self,
        table: Table,
        rows: Vec<Value>,
        on_conflict: &[&str],
    ) -> StoreResult<()> {
        let mut request = self
            .http
            .post(self.table_url(table))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&rows);
        if !on_conflict.is_empty() {
            request = request.query(&[("on_conflict", on_conflict.join(","))]);
        }

        self.send(table, request).await?;
        Ok(())
    }

    async fn insert(&self, table: Table, row: Value) -> StoreResult<Value> {
        let request = self
            .http
            .post(self.table_url(table))
            .header("Prefer", "return=representation")
            .json(&row);

        let response = self.send(table, request).await?;
        Self::rows(table, response)
            .await?
            .into_iter()
            .next()
            .ok_or(StoreError::MissingId { table })
    }

    async fn select(&self, table: Table, columns: &[&str]) -> StoreResult<Vec<Value>> {
        let request = self
            .http
            .get(self.table_url(table))
            .query(&[("select", columns.join(","))]);

        let response = self.send(table, request).await?;
        Self::rows(table, response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config() -> StoreConfig {
        StoreConfig {
            url: "https://example.supabase.co".into(),
            service_key: "service-key".into(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn table_urls_follow_the_rest_prefix() {
        let client = RestClient::new(&config()).unwrap();
        assert_eq!(
            client.table_url(Table::FlyMaterials),
            "https://example.supabase.co/rest/v1/fly_materials"
        );
    }

    #[tokio::test]
    async fn unreachable_store_fails_the_health_check() {
        let mut closed = config();
        closed.url = "http://127.0.0.1:1".into();
        closed.timeout = Duration::from_secs(2);
        let client = RestClient::new(&closed).unwrap();

        let err = client.health_check().await.unwrap_err();
        assert!(matches!(err, StoreError::Unhealthy(_)));
    }

    #[test]
    fn service_key_must_be_a_valid_header() {
        let mut bad = config();
        bad.service_key = "line\nbreak".into();
        assert!(RestClient::new(&bad).is_err());
    }
}
