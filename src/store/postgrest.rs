//! Hosted relational backend over its REST interface.
//!
//! Each lookup is a single filtered read:
//! `GET {base}/rest/v1/{relation}?select=*&{column}=eq.{value}&limit=1`.

use crate::store::{
    AliasRecord, CanonicalTarget, CanonicalView, DataStore, LookupError, Row, StoreRelations,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub struct PostgrestStore {
    client: reqwest::Client,
    base_url: String,
    relations: StoreRelations,
    timeout: Duration,
}

impl PostgrestStore {
    /// Build a store client. `timeout` bounds each HTTP request.
    pub fn new(
        base_url: &str,
        api_key: &str,
        relations: StoreRelations,
        timeout: Duration,
    ) -> Result<Self> {
        relations
            .validate()
            .context("Invalid relation names for REST store")?;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("apikey", api_key.parse().context("Invalid API key format")?);
        headers.insert(
            reqwest::header::AUTHORIZATION,
            format!("Bearer {}", api_key)
                .parse()
                .context("Invalid API key format")?,
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client for REST store")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            relations,
            timeout,
        })
    }

    /// First row of `relation` where `column` equals `value`.
    async fn fetch_first(
        &self,
        relation: &str,
        column: &str,
        value: &str,
    ) -> Result<Option<Value>, LookupError> {
        let url = format!("{}/rest/v1/{}", self.base_url, relation);
        let filter = format!("eq.{}", value);

        let response = self
            .client
            .get(&url)
            .query(&[("select", "*"), (column, filter.as_str()), ("limit", "1")])
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LookupError::Status {
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }

        let rows: Vec<Value> = response
            .json()
            .await
            .map_err(|e| LookupError::Decode(e.to_string()))?;

        debug!(
            "REST store {}.{} = '{}': {} row(s)",
            relation,
            column,
            value,
            rows.len()
        );

        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl DataStore for PostgrestStore {
    async fn lookup_by_slug(
        &self,
        view: CanonicalView,
        slug: &str,
    ) -> Result<Option<Row>, LookupError> {
        self.fetch_first(self.relations.for_view(view), "slug", slug)
            .await?
            .map(Row::from_json)
            .transpose()
    }

    async fn lookup_alias(&self, old_slug: &str) -> Result<Option<AliasRecord>, LookupError> {
        Ok(self
            .fetch_first(&self.relations.alias_table, "old_slug", old_slug)
            .await?
            .map(|value| AliasRecord::from_json(&value)))
    }

    async fn lookup_canonical_slug_by_id(
        &self,
        target_id: &str,
    ) -> Result<Option<CanonicalTarget>, LookupError> {
        self.fetch_first(&self.relations.target_table, "id", target_id)
            .await?
            .map(|value| CanonicalTarget::from_json(&value))
            .transpose()
    }
}

fn map_reqwest_error(error: reqwest::Error, timeout: Duration) -> LookupError {
    if error.is_timeout() {
        LookupError::Timeout(timeout)
    } else if error.is_decode() {
        LookupError::Decode(error.to_string())
    } else {
        LookupError::Backend(error.to_string())
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slug::ResourceClass;
    use serde_json::json;
    use wiremock::{
        matchers::{header, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn store(server: &MockServer) -> PostgrestStore {
        PostgrestStore::new(
            &server.uri(),
            "anon-key",
            StoreRelations::default(),
            Duration::from_secs(2),
        )
        .expect("store")
    }

    #[tokio::test]
    async fn test_lookup_by_slug_hit() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/concert_pages"))
            .and(query_param("slug", "eq.coldplay-madrid"))
            .and(query_param("limit", "1"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer anon-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "slug": "coldplay-madrid", "resource_class": "concert", "venue": "Metropolitano" }
            ])))
            .mount(&server)
            .await;

        let row = store(&server)
            .lookup_by_slug(CanonicalView::ConcertView, "coldplay-madrid")
            .await
            .expect("lookup")
            .expect("row");

        assert_eq!(row.slug, "coldplay-madrid");
        assert_eq!(row.resource_class, Some(ResourceClass::Concert));
        assert_eq!(row.payload["venue"], "Metropolitano");
    }

    #[tokio::test]
    async fn test_lookup_by_slug_miss() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/event_pages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let row = store(&server)
            .lookup_by_slug(CanonicalView::UnifiedView, "nobody")
            .await
            .expect("lookup");
        assert!(row.is_none());
    }

    #[tokio::test]
    async fn test_lookup_alias_and_target() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/slug_redirects"))
            .and(query_param("old_slug", "eq.old-festival-name-2024-03-15"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "old_slug": "old-festival-name-2024-03-15", "new_slug": "stale", "target_id": 99 }
            ])))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/events"))
            .and(query_param("id", "eq.99"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 99, "slug": "new-festival-name-2026", "resource_class": "festival" }
            ])))
            .mount(&server)
            .await;

        let store = store(&server);
        let alias = store
            .lookup_alias("old-festival-name-2024-03-15")
            .await
            .expect("alias lookup")
            .expect("alias");
        assert_eq!(alias.target_id.as_deref(), Some("99"));

        let target = store
            .lookup_canonical_slug_by_id("99")
            .await
            .expect("target lookup")
            .expect("target");
        assert_eq!(target.slug, "new-festival-name-2026");
        assert_eq!(target.resource_class, ResourceClass::Festival);
    }

    #[tokio::test]
    async fn test_server_error_is_retryable_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let err = store(&server).lookup_alias("x").await.unwrap_err();
        match &err {
            LookupError::Status { status, body } => {
                assert_eq!(*status, 503);
                assert_eq!(body, "upstream down");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = store(&server)
            .lookup_by_slug(CanonicalView::ConcertView, "x")
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::Decode(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let store = PostgrestStore::new(
            &server.uri(),
            "anon-key",
            StoreRelations::default(),
            Duration::from_millis(50),
        )
        .expect("store");

        let err = store.lookup_alias("x").await.unwrap_err();
        assert!(matches!(err, LookupError::Timeout(_)));
    }

    #[test]
    fn test_rejects_invalid_relations() {
        let relations = StoreRelations {
            unified_view: "event pages".to_string(),
            ..StoreRelations::default()
        };
        let result = PostgrestStore::new(
            "http://localhost",
            "key",
            relations,
            Duration::from_secs(1),
        );
        assert!(result.is_err());
    }
}
