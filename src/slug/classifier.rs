//! Route classification: concert or festival.
//!
//! A keyword heuristic guesses the class from slug text. A record's explicit
//! class always wins over the guess.

use crate::slug::normalize::normalize;
use crate::store::{CanonicalView, Row};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceClass {
    Concert,
    Festival,
}

impl ResourceClass {
    /// Canonical (unlocalized) path prefix for this class.
    pub fn path_prefix(&self) -> &'static str {
        match self {
            ResourceClass::Concert => "/conciertos",
            ResourceClass::Festival => "/festivales",
        }
    }

    /// Canonical path for a slug of this class, e.g. `/festivales/mad-cool`.
    pub fn canonical_path(&self, slug: &str) -> String {
        format!("{}/{}", self.path_prefix(), slug)
    }

    /// Class-specific view to query first for this class.
    pub fn view(&self) -> CanonicalView {
        match self {
            ResourceClass::Concert => CanonicalView::ConcertView,
            ResourceClass::Festival => CanonicalView::FestivalView,
        }
    }

    /// Parse the store's class field (`"concert"`, `"festival"`, case-insensitive).
    pub fn from_field(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "concert" | "concierto" => Some(ResourceClass::Concert),
            "festival" => Some(ResourceClass::Festival),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceClass::Concert => "concert",
            ResourceClass::Festival => "festival",
        }
    }
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the classifier gets to look at.
#[derive(Debug, Clone, Copy)]
pub enum ClassEvidence<'a> {
    /// Bare slug text: heuristic mode
    Slug(&'a str),
    /// A looked-up record: its class field, when present, is authoritative
    Record {
        slug: &'a str,
        class: Option<ResourceClass>,
    },
}

/// Festival markers: brand phrases matched as whole tokens, plus token
/// suffixes (`resurrectionfest`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FestivalKeywords {
    phrases: Vec<Vec<String>>,
    suffixes: Vec<String>,
}

const FESTIVAL_PHRASES: &[&str] = &[
    "festival", "festivales", "fest", "primavera-sound", "mad-cool", "bbk-live", "sonar",
    "arenal-sound", "medusa", "rototom", "vina-rock", "cruilla", "dcode", "tomavistas",
    "o-son-do-camino", "fib", "sansan", "cala-mijas", "jazzaldia", "reggaeton-beach",
];

const FESTIVAL_SUFFIXES: &[&str] = &["fest", "festival"];

impl FestivalKeywords {
    pub fn new<I, J, S, T>(phrases: I, suffixes: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        Self {
            phrases: phrases
                .into_iter()
                .map(|phrase| normalize(phrase.as_ref()))
                .filter(|phrase| !phrase.is_empty())
                .map(|phrase| phrase.split('-').map(str::to_string).collect())
                .collect(),
            suffixes: suffixes
                .into_iter()
                .map(|suffix| normalize(suffix.as_ref()))
                .filter(|suffix| !suffix.is_empty())
                .collect(),
        }
    }

    fn matches(&self, slug: &str) -> bool {
        let normalized = normalize(slug);
        let tokens: Vec<&str> = normalized.split('-').filter(|t| !t.is_empty()).collect();

        let phrase_hit = self.phrases.iter().any(|phrase| {
            !phrase.is_empty()
                && tokens.windows(phrase.len()).any(|window| {
                    window.iter().zip(phrase).all(|(token, word)| token == word)
                })
        });

        phrase_hit
            || tokens.iter().any(|token| {
                self.suffixes
                    .iter()
                    .any(|suffix| token.ends_with(suffix.as_str()))
            })
    }
}

impl Default for FestivalKeywords {
    fn default() -> Self {
        Self::new(FESTIVAL_PHRASES, FESTIVAL_SUFFIXES)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RouteClassifier {
    keywords: FestivalKeywords,
}

impl RouteClassifier {
    pub fn new(keywords: FestivalKeywords) -> Self {
        Self { keywords }
    }

    pub fn classify(&self, evidence: ClassEvidence<'_>) -> ResourceClass {
        match evidence {
            ClassEvidence::Record {
                class: Some(class), ..
            } => class,
            ClassEvidence::Record { slug, class: None } | ClassEvidence::Slug(slug) => {
                self.heuristic(slug)
            }
        }
    }

    /// Best-effort guess from slug text alone.
    pub fn heuristic(&self, slug: &str) -> ResourceClass {
        if self.keywords.matches(slug) {
            ResourceClass::Festival
        } else {
            ResourceClass::Concert
        }
    }

    /// Authoritative class of a row returned from `view`.
    ///
    /// Explicit field first, then the class implied by a class-specific
    /// view, and the heuristic only for unified-view rows without a field.
    pub fn classify_row(&self, row: &Row, view: CanonicalView) -> ResourceClass {
        match (row.resource_class, view.class()) {
            (Some(class), _) => class,
            (None, Some(class)) => class,
            (None, None) => self.classify(ClassEvidence::Slug(&row.slug)),
        }
    }
}
