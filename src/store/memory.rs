//! In-process store.
//!
//! Holds the three lookup tables in memory and can simulate a slow or
//! failing backend. Every call is recorded so callers can assert which
//! lookups ran and in what order.

use crate::slug::ResourceClass;
use crate::store::{AliasRecord, CanonicalTarget, CanonicalView, DataStore, LookupError, Row};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::sleep;

/// One recorded store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupCall {
    BySlug(CanonicalView, String),
    Alias(String),
    ById(String),
}

#[derive(Default)]
pub struct InMemoryStore {
    views: HashMap<CanonicalView, HashMap<String, Row>>,
    aliases: HashMap<String, AliasRecord>,
    targets: HashMap<String, CanonicalTarget>,
    latency: Option<Duration>,
    failures_remaining: AtomicU32,
    calls: Mutex<Vec<LookupCall>>,
}

/// JSON fixture layout for `InMemoryStore::from_json_file`.
#[derive(Debug, Deserialize)]
struct Fixture {
    #[serde(default)]
    events: Vec<FixtureEvent>,
    #[serde(default)]
    aliases: Vec<FixtureAlias>,
}

#[derive(Debug, Deserialize)]
struct FixtureEvent {
    id: Option<String>,
    slug: String,
    resource_class: ResourceClass,
    #[serde(default)]
    payload: Value,
}

#[derive(Debug, Deserialize)]
struct FixtureAlias {
    old_slug: String,
    new_slug: Option<String>,
    target_id: Option<String>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load events and aliases from a JSON fixture file.
    ///
    /// Each event lands in its class view and the unified view; events with
    /// an `id` are also registered as alias targets.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read store fixture {}", path.display()))?;
        let fixture: Fixture = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse store fixture {}", path.display()))?;

        let mut store = Self::new();
        for event in fixture.events {
            if let Some(id) = &event.id {
                store = store.with_target(id, &event.slug, event.resource_class);
            }
            store = store.with_event(event.resource_class, &event.slug, event.payload);
        }
        for alias in fixture.aliases {
            store = store.with_alias(
                &alias.old_slug,
                AliasRecord {
                    new_slug: alias.new_slug,
                    target_id: alias.target_id,
                },
            );
        }
        Ok(store)
    }

    /// Insert a row into one view only.
    pub fn with_row(mut self, view: CanonicalView, row: Row) -> Self {
        self.views
            .entry(view)
            .or_default()
            .insert(row.slug.clone(), row);
        self
    }

    /// Insert an event into its class view and the unified view.
    pub fn with_event(self, class: ResourceClass, slug: &str, payload: Value) -> Self {
        let row = Row {
            slug: slug.to_string(),
            resource_class: Some(class),
            payload,
        };
        self.with_row(class.view(), row.clone())
            .with_row(CanonicalView::UnifiedView, row)
    }

    pub fn with_alias(mut self, old_slug: &str, record: AliasRecord) -> Self {
        self.aliases.insert(old_slug.to_string(), record);
        self
    }

    pub fn with_target(mut self, target_id: &str, slug: &str, class: ResourceClass) -> Self {
        self.targets.insert(
            target_id.to_string(),
            CanonicalTarget {
                slug: slug.to_string(),
                resource_class: class,
            },
        );
        self
    }

    /// Delay every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail the next `count` calls with a backend error.
    pub fn failing(self, count: u32) -> Self {
        self.failures_remaining.store(count, Ordering::SeqCst);
        self
    }

    /// Calls made so far, in order.
    pub fn calls(&self) -> Vec<LookupCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    async fn enter(&self, call: LookupCall) -> Result<(), LookupError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }

        if let Some(latency) = self.latency {
            sleep(latency).await;
        }

        let failed = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
                remaining.checked_sub(1)
            })
            .is_ok();

        if failed {
            Err(LookupError::Backend("simulated outage".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DataStore for InMemoryStore {
    async fn lookup_by_slug(
        &self,
        view: CanonicalView,
        slug: &str,
    ) -> Result<Option<Row>, LookupError> {
        self.enter(LookupCall::BySlug(view, slug.to_string()))
            .await?;
        Ok(self
            .views
            .get(&view)
            .and_then(|rows| rows.get(slug))
            .cloned())
    }

    async fn lookup_alias(&self, old_slug: &str) -> Result<Option<AliasRecord>, LookupError> {
        self.enter(LookupCall::Alias(old_slug.to_string())).await?;
        Ok(self.aliases.get(old_slug).cloned())
    }

    async fn lookup_canonical_slug_by_id(
        &self,
        target_id: &str,
    ) -> Result<Option<CanonicalTarget>, LookupError> {
        self.enter(LookupCall::ById(target_id.to_string())).await?;
        Ok(self.targets.get(target_id).cloned())
    }
}
