//! Data store contract consumed by the resolver.
//!
//! The store is an external, eventually consistent table service. The
//! resolver only needs three key lookups; backends live in submodules:
//!
//! - `memory`: in-process tables (tests, fixtures, local development)
//! - `postgrest`: hosted relational backend over its REST interface
//! - `postgres`: direct SQL through a connection pool

pub mod memory;
pub mod postgres;
pub mod postgrest;

pub use memory::{InMemoryStore, LookupCall};
pub use postgres::PostgresStore;
pub use postgrest::PostgrestStore;

use crate::slug::ResourceClass;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// Which relation a slug lookup runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalView {
    ConcertView,
    FestivalView,
    /// Concerts and festivals together
    UnifiedView,
}

impl CanonicalView {
    /// The class every row of this view has, `None` for the unified view.
    pub fn class(&self) -> Option<ResourceClass> {
        match self {
            CanonicalView::ConcertView => Some(ResourceClass::Concert),
            CanonicalView::FestivalView => Some(ResourceClass::Festival),
            CanonicalView::UnifiedView => None,
        }
    }
}

/// A page record. Only `slug` and `resource_class` are inspected; the rest
/// travels to the caller untouched in `payload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub slug: String,
    pub resource_class: Option<ResourceClass>,
    pub payload: Value,
}

impl Row {
    /// Decode a JSON object as returned by the backend.
    pub fn from_json(value: Value) -> Result<Self, LookupError> {
        let slug = required_str(&value, "slug")?;
        let resource_class = optional_str(&value, "resource_class")
            .and_then(|field| ResourceClass::from_field(&field));
        Ok(Self {
            slug,
            resource_class,
            payload: value,
        })
    }
}

/// Legacy slug mapping. Read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRecord {
    pub new_slug: Option<String>,
    pub target_id: Option<String>,
}

impl AliasRecord {
    pub fn to_slug(new_slug: &str) -> Self {
        Self {
            new_slug: Some(new_slug.to_string()),
            target_id: None,
        }
    }

    pub fn to_target(target_id: &str) -> Self {
        Self {
            new_slug: None,
            target_id: Some(target_id.to_string()),
        }
    }

    pub fn from_json(value: &Value) -> Self {
        Self {
            new_slug: optional_str(value, "new_slug"),
            target_id: optional_str(value, "target_id"),
        }
    }
}

/// Live slug of a stable resource identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalTarget {
    pub slug: String,
    pub resource_class: ResourceClass,
}

impl CanonicalTarget {
    pub fn from_json(value: &Value) -> Result<Self, LookupError> {
        let slug = required_str(value, "slug")?;
        let field = required_str(value, "resource_class")?;
        let resource_class = ResourceClass::from_field(&field)
            .ok_or_else(|| LookupError::Decode(format!("unknown resource_class '{}'", field)))?;
        Ok(Self {
            slug,
            resource_class,
        })
    }
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("store unavailable: {0}")]
    Backend(String),

    #[error("store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed store response: {0}")]
    Decode(String),

    #[error("invalid store configuration: {0}")]
    Config(String),
}

impl LookupError {
    /// Transient failures worth one more attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            LookupError::Timeout(_) | LookupError::Backend(_) => true,
            LookupError::Status { status, .. } => *status >= 500 || *status == 429,
            LookupError::Decode(_) | LookupError::Config(_) => false,
        }
    }
}

#[async_trait]
pub trait DataStore: Send + Sync {
    /// Exact-match slug lookup in one view.
    async fn lookup_by_slug(
        &self,
        view: CanonicalView,
        slug: &str,
    ) -> Result<Option<Row>, LookupError>;

    /// Alias record for a legacy slug.
    async fn lookup_alias(&self, old_slug: &str) -> Result<Option<AliasRecord>, LookupError>;

    /// Current slug and class of a stable resource identifier.
    async fn lookup_canonical_slug_by_id(
        &self,
        target_id: &str,
    ) -> Result<Option<CanonicalTarget>, LookupError>;
}

/// Relation names backing each lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreRelations {
    pub concert_view: String,
    pub festival_view: String,
    pub unified_view: String,
    /// Columns: `old_slug`, `new_slug`, `target_id`
    pub alias_table: String,
    /// Columns: `id`, `slug`, `resource_class`
    pub target_table: String,
}

impl Default for StoreRelations {
    fn default() -> Self {
        Self {
            concert_view: "concert_pages".to_string(),
            festival_view: "festival_pages".to_string(),
            unified_view: "event_pages".to_string(),
            alias_table: "slug_redirects".to_string(),
            target_table: "events".to_string(),
        }
    }
}

static RELATION_REGEX: OnceLock<Regex> = OnceLock::new();

impl StoreRelations {
    pub fn for_view(&self, view: CanonicalView) -> &str {
        match view {
            CanonicalView::ConcertView => &self.concert_view,
            CanonicalView::FestivalView => &self.festival_view,
            CanonicalView::UnifiedView => &self.unified_view,
        }
    }

    /// Relation names end up in URLs and SQL text; only plain (optionally
    /// schema-qualified) identifiers are accepted.
    pub fn validate(&self) -> Result<(), LookupError> {
        let regex = RELATION_REGEX.get_or_init(|| {
            Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$").unwrap()
        });

        for name in [
            &self.concert_view,
            &self.festival_view,
            &self.unified_view,
            &self.alias_table,
            &self.target_table,
        ] {
            if !regex.is_match(name) {
                return Err(LookupError::Config(format!(
                    "'{}' is not a valid relation name",
                    name
                )));
            }
        }
        Ok(())
    }
}

fn required_str(value: &Value, field: &str) -> Result<String, LookupError> {
    optional_str(value, field)
        .ok_or_else(|| LookupError::Decode(format!("missing field '{}'", field)))
}

/// String or numeric field, blank strings treated as absent.
fn optional_str(value: &Value, field: &str) -> Option<String> {
    match value.get(field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
