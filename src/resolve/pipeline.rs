//! Slug resolution state machine.
//!
//! ```text
//! Start -> DirectLookup -> AliasLookup -> TargetLookup -> Done
//!              |               |            |    ^
//!              +---------------+------------+    | (slug alias chains,
//!                     (terminal outcomes)        +  bounded by hop limit)
//! ```
//!
//! Every store call is bounded by a timeout and gets at most one retry.
//! A lookup that still fails ends the run with `NotFound`; no error ever
//! reaches the caller.

use crate::resolve::outcome::{Resolution, ResolutionOutcome, ResolveIssue};
use crate::resolve::placeholder::PlaceholderMarkers;
use crate::retry::{with_retry_if, RetryConfig};
use crate::slug::{CleanedSlug, ResourceClass, RouteClassifier, SlugCleaner};
use crate::store::{AliasRecord, CanonicalView, DataStore, LookupError};
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Upper bound for a single store call
    pub lookup_timeout: Duration,
    pub retry: RetryConfig,
    /// Slug-to-slug alias links followed before giving up
    pub max_alias_hops: usize,
    /// Also probe the unified view when the class view misses
    pub probe_unified_view: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            lookup_timeout: Duration::from_secs(3),
            retry: RetryConfig::lookup(),
            max_alias_hops: 4,
            probe_unified_view: true,
        }
    }
}

/// Where an alias points.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AliasPointer {
    ById(String),
    BySlug(String),
}

#[derive(Debug)]
enum Stage {
    Start,
    /// `fallback` is the cleaned slug, probed only when `slug` misses
    DirectLookup {
        slug: String,
        fallback: Option<String>,
    },
    AliasLookup { keys: Vec<String> },
    TargetLookup { pointer: AliasPointer, from: String, hops: usize },
    Done(ResolutionOutcome),
}

/// Per-request state carried between stages.
struct Run<'a> {
    raw: &'a str,
    assumed: ResourceClass,
    cleaned: CleanedSlug,
    visited: HashSet<String>,
    issues: Vec<ResolveIssue>,
}

pub struct ResolutionPipeline {
    store: Arc<dyn DataStore>,
    cleaner: SlugCleaner,
    classifier: RouteClassifier,
    placeholders: PlaceholderMarkers,
    config: PipelineConfig,
}

impl ResolutionPipeline {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self {
            store,
            cleaner: SlugCleaner::default(),
            classifier: RouteClassifier::default(),
            placeholders: PlaceholderMarkers::default(),
            config: PipelineConfig::default(),
        }
    }

    pub fn with_cleaner(mut self, cleaner: SlugCleaner) -> Self {
        self.cleaner = cleaner;
        self
    }

    pub fn with_classifier(mut self, classifier: RouteClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_placeholders(mut self, placeholders: PlaceholderMarkers) -> Self {
        self.placeholders = placeholders;
        self
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn classifier(&self) -> &RouteClassifier {
        &self.classifier
    }

    /// Resolve `raw_slug`, routed as `assumed`, to a terminal outcome.
    ///
    /// # Arguments
    /// * `raw_slug` - The slug segment exactly as requested
    /// * `assumed` - The class implied by the route section
    ///
    /// # Returns
    /// `Found`, `Redirect` or `NotFound`; store failures end in `NotFound`
    pub async fn resolve(&self, raw_slug: &str, assumed: ResourceClass) -> ResolutionOutcome {
        self.resolve_traced(raw_slug, assumed).await.outcome
    }

    /// Like `resolve`, also returning the cleaned slug and every issue
    /// recovered along the way.
    ///
    /// # Returns
    /// A `Resolution` whose `issues` are in the order they were recorded
    pub async fn resolve_traced(&self, raw_slug: &str, assumed: ResourceClass) -> Resolution {
        let mut run = Run {
            raw: raw_slug,
            assumed,
            cleaned: self.cleaner.clean(raw_slug),
            visited: HashSet::new(),
            issues: Vec::new(),
        };

        let mut stage = Stage::Start;
        loop {
            stage = match stage {
                Stage::Start => self.start(&mut run),
                Stage::DirectLookup { slug, fallback } => {
                    self.direct_lookup(&mut run, slug, fallback).await
                }
                Stage::AliasLookup { keys } => self.alias_lookup(&mut run, &keys).await,
                Stage::TargetLookup {
                    pointer,
                    from,
                    hops,
                } => self.target_lookup(&mut run, pointer, &from, hops).await,
                Stage::Done(outcome) => {
                    for issue in &run.issues {
                        warn!("Resolving '{}': {}", run.raw, issue);
                    }
                    info!("Resolved '{}' ({}): {}", run.raw, run.assumed, outcome);
                    return Resolution {
                        outcome,
                        cleaned: run.cleaned,
                        issues: run.issues,
                    };
                }
            };
        }
    }

    /// Resolve several candidate interpretations concurrently. The first
    /// candidate to produce something other than `NotFound` wins and the
    /// rest are dropped.
    ///
    /// # Arguments
    /// * `candidates` - (raw slug, assumed class) pairs
    pub async fn resolve_first(&self, candidates: &[(&str, ResourceClass)]) -> ResolutionOutcome {
        let mut pending: FuturesUnordered<_> = candidates
            .iter()
            .map(|(slug, class)| self.resolve(slug, *class))
            .collect();

        while let Some(outcome) = pending.next().await {
            if !outcome.is_not_found() {
                return outcome;
            }
        }
        ResolutionOutcome::NotFound
    }

    fn start(&self, run: &mut Run<'_>) -> Stage {
        if run.cleaned.collapsed_to_empty {
            run.issues.push(ResolveIssue::MalformedSlug {
                raw: run.raw.to_string(),
            });
        }

        let raw = run.raw.trim().to_string();
        if raw.is_empty() {
            return Stage::Done(ResolutionOutcome::NotFound);
        }

        let cleaned = run.cleaned.cleaned.trim().to_string();
        run.visited.insert(raw.clone());
        run.visited.insert(cleaned.clone());

        // A page may legitimately live under a slug the cleaner would
        // rewrite, so the raw slug is always tried first.
        let fallback = if run.cleaned.changed && !cleaned.is_empty() && cleaned != raw {
            debug!("Cleaned '{}' to '{}'", raw, cleaned);
            Some(cleaned)
        } else {
            None
        };
        Stage::DirectLookup {
            slug: raw,
            fallback,
        }
    }

    async fn direct_lookup(
        &self,
        run: &mut Run<'_>,
        slug: String,
        fallback: Option<String>,
    ) -> Stage {
        let mut views = vec![run.assumed.view()];
        if self.config.probe_unified_view {
            views.push(CanonicalView::UnifiedView);
        }

        for view in views {
            let found = self
                .lookup("lookup_by_slug", || self.store.lookup_by_slug(view, &slug))
                .await;

            let row = match found {
                Ok(Some(row)) => row,
                Ok(None) => continue,
                Err(source) => return fail(run, "direct lookup", source),
            };

            let authoritative = self.classifier.classify_row(&row, view);
            if authoritative == run.assumed {
                return Stage::Done(ResolutionOutcome::Found {
                    class: authoritative,
                    row,
                });
            }

            run.issues.push(ResolveIssue::AmbiguousClass {
                slug: row.slug.clone(),
                assumed: run.assumed,
                authoritative,
            });
            return Stage::Done(ResolutionOutcome::Redirect {
                location: authoritative.canonical_path(&row.slug),
            });
        }

        if let Some(cleaned) = fallback {
            return Stage::DirectLookup {
                slug: cleaned,
                fallback: None,
            };
        }

        let raw = run.raw.trim().to_string();
        let cleaned = run.cleaned.cleaned.trim();
        let mut keys = vec![raw.clone()];
        if !cleaned.is_empty() && cleaned != raw {
            keys.push(cleaned.to_string());
        }
        Stage::AliasLookup { keys }
    }

    async fn alias_lookup(&self, run: &mut Run<'_>, keys: &[String]) -> Stage {
        for key in keys {
            match self
                .lookup("lookup_alias", || self.store.lookup_alias(key))
                .await
            {
                Ok(Some(record)) => return self.follow_alias(run, key, record, 0),
                Ok(None) => continue,
                Err(source) => return fail(run, "alias lookup", source),
            }
        }

        debug!("No page or alias for '{}'", run.raw);
        Stage::Done(ResolutionOutcome::NotFound)
    }

    /// A stable identifier always wins over a recorded slug, which may
    /// itself have been renamed since.
    fn follow_alias(
        &self,
        run: &mut Run<'_>,
        from: &str,
        record: AliasRecord,
        hops: usize,
    ) -> Stage {
        let pointer = match (record.target_id, record.new_slug) {
            (Some(id), _) => AliasPointer::ById(id),
            (None, Some(slug)) => AliasPointer::BySlug(slug),
            (None, None) => {
                debug!("Alias '{}' has no target", from);
                return Stage::Done(ResolutionOutcome::NotFound);
            }
        };

        let target = match &pointer {
            AliasPointer::ById(id) | AliasPointer::BySlug(id) => id,
        };
        if self.placeholders.is_placeholder(target) {
            return placeholder(run, from, target);
        }

        Stage::TargetLookup {
            pointer,
            from: from.to_string(),
            hops,
        }
    }

    async fn target_lookup(
        &self,
        run: &mut Run<'_>,
        pointer: AliasPointer,
        from: &str,
        hops: usize,
    ) -> Stage {
        match pointer {
            AliasPointer::ById(id) => {
                let target = match self
                    .lookup("lookup_canonical_slug_by_id", || {
                        self.store.lookup_canonical_slug_by_id(&id)
                    })
                    .await
                {
                    Ok(Some(target)) => target,
                    Ok(None) => {
                        debug!("Alias '{}' points at unknown id '{}'", from, id);
                        return Stage::Done(ResolutionOutcome::NotFound);
                    }
                    Err(source) => return fail(run, "target lookup", source),
                };

                if self.placeholders.is_placeholder(&target.slug) {
                    return placeholder(run, from, &target.slug);
                }
                Stage::Done(ResolutionOutcome::Redirect {
                    location: target.resource_class.canonical_path(&target.slug),
                })
            }
            AliasPointer::BySlug(slug) => {
                if hops >= self.config.max_alias_hops || !run.visited.insert(slug.clone()) {
                    run.issues.push(ResolveIssue::AliasChainExhausted {
                        slug: run.raw.to_string(),
                        hops: self.config.max_alias_hops,
                    });
                    return Stage::Done(ResolutionOutcome::NotFound);
                }

                for view in self.target_views(&slug) {
                    match self
                        .lookup("lookup_by_slug", || self.store.lookup_by_slug(view, &slug))
                        .await
                    {
                        Ok(Some(row)) => {
                            let class = self.classifier.classify_row(&row, view);
                            return Stage::Done(ResolutionOutcome::Redirect {
                                location: class.canonical_path(&row.slug),
                            });
                        }
                        Ok(None) => continue,
                        Err(source) => return fail(run, "target lookup", source),
                    }
                }

                // The recorded slug was renamed again: follow its own alias.
                match self
                    .lookup("lookup_alias", || self.store.lookup_alias(&slug))
                    .await
                {
                    Ok(Some(record)) => self.follow_alias(run, &slug, record, hops + 1),
                    Ok(None) => {
                        debug!("Alias '{}' points at missing slug '{}'", from, slug);
                        Stage::Done(ResolutionOutcome::NotFound)
                    }
                    Err(source) => fail(run, "alias lookup", source),
                }
            }
        }
    }

    fn target_views(&self, slug: &str) -> Vec<CanonicalView> {
        if self.config.probe_unified_view {
            return vec![CanonicalView::UnifiedView];
        }
        let guess = self.classifier.heuristic(slug);
        let other = match guess {
            ResourceClass::Concert => ResourceClass::Festival,
            ResourceClass::Festival => ResourceClass::Concert,
        };
        vec![guess.view(), other.view()]
    }

    /// Run one store call under the lookup timeout and retry policy.
    async fn lookup<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, LookupError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LookupError>>,
    {
        let limit = self.config.lookup_timeout;
        with_retry_if(
            &self.config.retry,
            operation,
            || {
                let pending = call();
                async move {
                    match tokio::time::timeout(limit, pending).await {
                        Ok(result) => result,
                        Err(_) => Err(LookupError::Timeout(limit)),
                    }
                }
            },
            LookupError::is_retryable,
        )
        .await
    }
}

fn fail(run: &mut Run<'_>, stage: &'static str, source: LookupError) -> Stage {
    run.issues.push(ResolveIssue::Lookup { stage, source });
    Stage::Done(ResolutionOutcome::NotFound)
}

fn placeholder(run: &mut Run<'_>, from: &str, target: &str) -> Stage {
    run.issues.push(ResolveIssue::PlaceholderTarget {
        slug: from.to_string(),
        target: target.to_string(),
    });
    Stage::Done(ResolutionOutcome::NotFound)
}
