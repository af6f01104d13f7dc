//! Direct SQL backend (PostgreSQL via sqlx).
//!
//! Rows are read as `to_jsonb(r) AS record` so the same JSON decoding serves both
//! this backend and the REST one.

use crate::store::{
    AliasRecord, CanonicalTarget, CanonicalView, DataStore, LookupError, Row, StoreRelations,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row as _;
use std::time::Duration;

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
    relations: StoreRelations,
}

impl PostgresStore {
    /// Connect a small pool. `acquire_timeout` bounds waiting for a
    /// connection; per-lookup timeouts are applied by the resolver.
    pub async fn connect(
        database_url: &str,
        relations: StoreRelations,
        acquire_timeout: Duration,
    ) -> Result<Self> {
        relations
            .validate()
            .context("Invalid relation names for SQL store")?;

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await
            .context("Failed to connect to PostgreSQL")?;

        Ok(Self { pool, relations })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool, relations: StoreRelations) -> Result<Self> {
        relations
            .validate()
            .context("Invalid relation names for SQL store")?;
        Ok(Self { pool, relations })
    }

    async fn fetch_first(
        &self,
        relation: &str,
        column: &str,
        value: &str,
    ) -> Result<Option<Value>, LookupError> {
        let sql = select_one_sql(relation, column);
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, self.pool.options().get_acquire_timeout()))?;

        row.map(|row| {
            row.try_get::<Value, _>("record")
                .map_err(|e| LookupError::Decode(e.to_string()))
        })
        .transpose()
    }
}

/// `relation` must already be validated by `StoreRelations::validate`;
/// `column` is always one of our fixed column names.
fn select_one_sql(relation: &str, column: &str) -> String {
    format!(
        "SELECT to_jsonb(r) AS record FROM {} r WHERE r.{}::text = $1 LIMIT 1",
        relation, column
    )
}

fn map_sqlx_error(error: sqlx::Error, acquire_timeout: Duration) -> LookupError {
    match error {
        sqlx::Error::PoolTimedOut => LookupError::Timeout(acquire_timeout),
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            LookupError::Decode(error.to_string())
        }
        other => LookupError::Backend(other.to_string()),
    }
}

#[async_trait]
impl DataStore for PostgresStore {
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
