//! Terminal outcomes and the internal issues recorded on the way to them.

use crate::i18n::{localize, Locale};
use crate::slug::{CleanedSlug, ResourceClass};
use crate::store::{LookupError, Row};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// What the caller does next: render, navigate, or show the not-found page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResolutionOutcome {
    Found {
        class: ResourceClass,
        #[serde(rename = "data")]
        row: Row,
    },
    Redirect {
        location: String,
    },
    NotFound,
}

impl ResolutionOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, ResolutionOutcome::Found { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolutionOutcome::NotFound)
    }

    pub fn redirect_location(&self) -> Option<&str> {
        match self {
            ResolutionOutcome::Redirect { location } => Some(location),
            _ => None,
        }
    }

    /// Re-express a canonical redirect target in `locale`.
    pub fn localized(self, locale: Locale) -> Self {
        match self {
            ResolutionOutcome::Redirect { location } => ResolutionOutcome::Redirect {
                location: localize(&location, locale),
            },
            other => other,
        }
    }
}

impl fmt::Display for ResolutionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionOutcome::Found { class, row } => write!(f, "found {} '{}'", class, row.slug),
            ResolutionOutcome::Redirect { location } => write!(f, "redirect to {}", location),
            ResolutionOutcome::NotFound => f.write_str("not found"),
        }
    }
}

/// Conditions recovered inside the pipeline. None of these reach the user;
/// they are logged and returned by `resolve_traced` for inspection.
#[derive(Debug, Error)]
pub enum ResolveIssue {
    #[error("{stage} failed: {source}")]
    Lookup {
        stage: &'static str,
        #[source]
        source: LookupError,
    },

    #[error("alias '{slug}' points at placeholder '{target}'")]
    PlaceholderTarget { slug: String, target: String },

    #[error("'{slug}' was routed as {assumed} but is a {authoritative}")]
    AmbiguousClass {
        slug: String,
        assumed: ResourceClass,
        authoritative: ResourceClass,
    },

    #[error("slug '{raw}' cleans to nothing")]
    MalformedSlug { raw: String },

    #[error("alias chain from '{slug}' looped or exceeded {hops} hops")]
    AliasChainExhausted { slug: String, hops: usize },
}

/// Outcome plus everything recorded while producing it.
#[derive(Debug)]
pub struct Resolution {
    pub outcome: ResolutionOutcome,
    pub cleaned: CleanedSlug,
    pub issues: Vec<ResolveIssue>,
}
