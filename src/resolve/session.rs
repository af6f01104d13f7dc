//! Per-view guards for a UI driving the resolver.
//!
//! A session belongs to one client. Each navigation issues a new request
//! token; outcomes carrying an older token are discarded, so the last
//! navigation always wins. The redirect latch lets a page view act on at
//! most one redirect, and prefetches are issued once per view.

use crate::resolve::outcome::ResolutionOutcome;
use crate::resolve::request::PathResolver;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

#[derive(Default)]
struct SessionState {
    latest: AtomicU64,
    redirect_fired: AtomicBool,
    prefetched: Mutex<HashSet<String>>,
}

#[derive(Clone, Default)]
pub struct NavigationSession {
    state: Arc<SessionState>,
}

impl NavigationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new page view: supersedes in-flight requests and resets the
    /// redirect latch and prefetch set.
    pub fn navigate(&self) -> RequestToken {
        self.state.redirect_fired.store(false, Ordering::SeqCst);
        if let Ok(mut prefetched) = self.state.prefetched.lock() {
            prefetched.clear();
        }
        RequestToken(self.state.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.state.latest.load(Ordering::SeqCst) == token.0
    }

    /// Keep `outcome` only if `token` is still the latest navigation.
    pub fn accept(
        &self,
        token: RequestToken,
        outcome: ResolutionOutcome,
    ) -> Option<ResolutionOutcome> {
        if self.is_current(token) {
            Some(outcome)
        } else {
            debug!("Discarding stale outcome for request {:?}", token);
            None
        }
    }

    /// Location to navigate to, at most once per page view.
    pub fn take_redirect(
        &self,
        token: RequestToken,
        outcome: &ResolutionOutcome,
    ) -> Option<String> {
        let location = outcome.redirect_location()?;
        if !self.is_current(token) {
            return None;
        }
        if self.state.redirect_fired.swap(true, Ordering::SeqCst) {
            debug!("Redirect to {} suppressed, already redirected", location);
            return None;
        }
        Some(location.to_string())
    }

    /// Record `key` as prefetched. False when it already was this view.
    pub fn mark_prefetched(&self, key: &str) -> bool {
        match self.state.prefetched.lock() {
            Ok(mut prefetched) => prefetched.insert(key.to_string()),
            Err(_) => false,
        }
    }

    /// Navigate to `path` and resolve it. `None` when a later navigation
    /// started before this one finished.
    pub async fn resolve(
        &self,
        resolver: &PathResolver,
        path: &str,
    ) -> Option<ResolutionOutcome> {
        let token = self.navigate();
        let outcome = resolver.resolve_path(path).await;
        self.accept(token, outcome)
    }

    /// Resolve `paths` concurrently, skipping any already prefetched during
    /// this view.
    pub async fn prefetch(
        &self,
        resolver: &PathResolver,
        paths: &[&str],
    ) -> Vec<(String, ResolutionOutcome)> {
        let fresh: Vec<&str> = paths
            .iter()
            .copied()
            .filter(|path| self.mark_prefetched(path))
            .collect();

        join_all(fresh.into_iter().map(|path| async move {
            (path.to_string(), resolver.resolve_path(path).await)
        }))
        .await
    }
}
