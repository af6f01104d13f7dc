//! Integration tests for the slug resolver
//!
//! These tests drive full request paths through the public API: locale
//! router, cleaner, classifier, pipeline and the store backends together.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use slug_resolver::i18n::{canonicalize, localize, Locale};
use slug_resolver::resolve::{
    NavigationSession, PathResolver, PipelineConfig, ResolutionOutcome, ResolutionPipeline,
};
use slug_resolver::retry::RetryConfig;
use slug_resolver::slug::{clean, ResourceClass};
use slug_resolver::store::{
    AliasRecord, CanonicalView, InMemoryStore, LookupCall, PostgrestStore, Row, StoreRelations,
};

// ==================== Test Helpers ====================

/// Store with the catalogue used across these tests
fn catalogue() -> InMemoryStore {
    InMemoryStore::new()
        .with_event(
            ResourceClass::Concert,
            "bad-bunny-madrid",
            json!({ "venue": "Santiago Bernabeu" }),
        )
        .with_event(ResourceClass::Concert, "coldplay-madrid-2026", json!({}))
        .with_event(ResourceClass::Festival, "new-festival-name-2026", json!({}))
        .with_target("X", "new-festival-name-2026", ResourceClass::Festival)
        .with_alias("old-festival-name-2024-03-15", AliasRecord::to_target("X"))
        .with_alias("coldplay-madrid", AliasRecord::to_target("C"))
        .with_target("C", "coldplay-madrid-2026", ResourceClass::Concert)
}

fn resolver_over(store: Arc<InMemoryStore>) -> PathResolver {
    let config = PipelineConfig {
        lookup_timeout: Duration::from_millis(250),
        retry: RetryConfig::new(2, Duration::from_millis(5)),
        ..PipelineConfig::default()
    };
    PathResolver::new(ResolutionPipeline::new(store).with_config(config))
}

// ==================== End-to-end Scenarios ====================

#[tokio::test]
async fn test_scenario_noisy_suffix_renders_page() {
    let resolver = resolver_over(Arc::new(catalogue()));

    let outcome = resolver.resolve_path("/conciertos/Bad-Bunny-Madrid-1").await;

    match outcome {
        ResolutionOutcome::Found { class, row } => {
            assert_eq!(class, ResourceClass::Concert);
            assert_eq!(row.slug, "bad-bunny-madrid");
            assert_eq!(row.payload["venue"], "Santiago Bernabeu");
        }
        other => panic!("expected Found, got {:?}", other),
    }
}

#[tokio::test]
async fn test_pages_stored_under_uncleaned_slugs_render() {
    let store = Arc::new(
        catalogue()
            .with_event(ResourceClass::Concert, "sum-41-madrid-2", json!({}))
            .with_event(ResourceClass::Festival, "fib-2019-07-18", json!({})),
    );
    let resolver = resolver_over(store);

    for path in ["/conciertos/sum-41-madrid-2", "/en/festivals/fib-2019-07-18"] {
        let outcome = resolver.resolve_path(path).await;
        assert!(outcome.is_found(), "{} should render, got {:?}", path, outcome);
    }
}

#[tokio::test]
async fn test_scenario_legacy_dated_alias_redirects_to_live_festival() {
    let resolver = resolver_over(Arc::new(catalogue()));

    let outcome = resolver
        .resolve_path("/concierto/old-festival-name-2024-03-15")
        .await;

    assert_eq!(
        outcome,
        ResolutionOutcome::Redirect {
            location: "/festivales/new-festival-name-2026".to_string()
        }
    );
}

#[tokio::test]
async fn test_scenario_english_request_redirects_in_english() {
    let resolver = resolver_over(Arc::new(catalogue()));

    let outcome = resolver.resolve_path("/en/tickets/coldplay-madrid").await;

    assert_eq!(
        outcome.redirect_location(),
        Some("/en/tickets/coldplay-madrid-2026")
    );
}

#[tokio::test]
async fn test_scenarios_over_rest_backend() {
    let server = MockServer::start().await;

    // Any relation without a more specific mock is empty
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .with_priority(10)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/slug_redirects"))
        .and(query_param("old_slug", "eq.old-festival-name-2024-03-15"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "old_slug": "old-festival-name-2024-03-15", "new_slug": null, "target_id": 314 }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/events"))
        .and(query_param("id", "eq.314"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 314, "slug": "new-festival-name-2026", "resource_class": "festival" }
        ])))
        .mount(&server)
        .await;

    let store = PostgrestStore::new(
        &server.uri(),
        "anon-key",
        StoreRelations::default(),
        Duration::from_secs(2),
    )
    .expect("store");
    let resolver = PathResolver::new(ResolutionPipeline::new(Arc::new(store)));

    let outcome = resolver
        .resolve_path("/concierto/old-festival-name-2024-03-15")
        .await;
    assert_eq!(
        outcome.redirect_location(),
        Some("/festivales/new-festival-name-2026")
    );

    let outcome = resolver.resolve_path("/festivales/unknown-fest").await;
    assert!(outcome.is_not_found());
}

#[tokio::test]
async fn test_backend_outage_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let store = PostgrestStore::new(
        &server.uri(),
        "anon-key",
        StoreRelations::default(),
        Duration::from_secs(2),
    )
    .expect("store");
    let config = PipelineConfig {
        retry: RetryConfig::new(2, Duration::from_millis(5)),
        ..PipelineConfig::default()
    };
    let resolver = PathResolver::new(ResolutionPipeline::new(Arc::new(store)).with_config(config));

    let outcome = resolver.resolve_path("/conciertos/coldplay-madrid").await;
    assert!(outcome.is_not_found());

    // First lookup plus one retry, then the run stops
    let requests = server.received_requests().await.expect("recorded requests");
    assert_eq!(requests.len(), 2);
}

// ==================== Redirect Properties ====================

#[tokio::test]
async fn test_no_double_hop_through_slug_aliases() {
    let store = Arc::new(
        InMemoryStore::new()
            .with_alias("gira-a", AliasRecord::to_slug("gira-b"))
            .with_alias("gira-b", AliasRecord::to_slug("gira-c"))
            .with_event(ResourceClass::Concert, "gira-c", json!({})),
    );
    let resolver = resolver_over(store);

    let outcome = resolver.resolve_path("/conciertos/gira-a").await;
    let location = outcome.redirect_location().expect("redirect");
    assert_eq!(location, "/conciertos/gira-c");

    // Following the redirect renders immediately
    assert!(resolver.resolve_path(location).await.is_found());
}

#[tokio::test]
async fn test_redirect_targets_never_redirect_again() {
    let store = Arc::new(catalogue());
    let resolver = resolver_over(store);

    for path in [
        "/concierto/old-festival-name-2024-03-15",
        "/en/tickets/coldplay-madrid",
        "/eventos/bad-bunny-madrid",
    ] {
        let outcome = resolver.resolve_path(path).await;
        let location = outcome.redirect_location().expect("redirect");
        assert!(location.starts_with('/'));
        assert!(
            resolver.resolve_path(location).await.is_found(),
            "{} -> {} should render",
            path,
            location
        );
    }
}

#[tokio::test]
async fn test_class_mismatch_redirects() {
    let row = Row {
        slug: "mad-cool-2026".to_string(),
        resource_class: Some(ResourceClass::Festival),
        payload: json!({}),
    };
    let store = Arc::new(InMemoryStore::new().with_row(CanonicalView::UnifiedView, row));
    let resolver = resolver_over(store);

    let outcome = resolver.resolve_path("/en/tickets/mad-cool-2026").await;
    assert_eq!(
        outcome.redirect_location(),
        Some("/en/festivals/mad-cool-2026")
    );
}

#[tokio::test]
async fn test_placeholder_alias_is_not_found() {
    let store = Arc::new(
        InMemoryStore::new().with_alias("nueva-gira", AliasRecord::to_slug("por-confirmar")),
    );
    let resolver = resolver_over(store.clone());

    assert!(resolver
        .resolve_path("/conciertos/nueva-gira")
        .await
        .is_not_found());
    // The placeholder itself is never looked up
    assert!(!store
        .calls()
        .iter()
        .any(|call| matches!(call, LookupCall::BySlug(_, slug) if slug == "por-confirmar")));
}

// ==================== Navigation Guards ====================

#[tokio::test]
async fn test_last_navigation_wins() {
    let store = Arc::new(catalogue().with_latency(Duration::from_millis(40)));
    let resolver = Arc::new(resolver_over(store));
    let session = NavigationSession::new();

    let earlier = {
        let session = session.clone();
        let resolver = resolver.clone();
        tokio::spawn(async move {
            session
                .resolve(&resolver, "/en/tickets/coldplay-madrid")
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(5)).await;
    let latest = session
        .resolve(&resolver, "/conciertos/bad-bunny-madrid")
        .await
        .expect("latest navigation");

    assert!(earlier.await.unwrap().is_none());
    assert!(latest.is_found());
}

// ==================== Cleaning and Locale Properties ====================

#[test]
fn test_cleaning_examples() {
    assert_eq!(clean("coldplay-madrid-2026").cleaned, "coldplay-madrid-2026");
    assert_eq!(clean("coldplay-madrid-2026-1").cleaned, "coldplay-madrid-2026");
    assert_eq!(clean("bad-bunny-madrid-parking").cleaned, "bad-bunny-madrid");
    assert_eq!(clean("rosalia-tickets-barcelona").cleaned, "rosalia-barcelona");
}

#[test]
fn test_locale_round_trip_examples() {
    for path in [
        "/conciertos/coldplay-madrid",
        "/festivales/mad-cool-2026",
        "/destinos/madrid",
        "/",
    ] {
        let english = localize(path, Locale::ENGLISH);
        assert_eq!(canonicalize(&english), path);
        assert_eq!(localize(path, Locale::SPANISH), path);
    }
}
