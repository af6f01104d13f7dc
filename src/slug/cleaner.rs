//! Slug cleaning: turns a raw path segment into a canonical slug candidate.
//!
//! Stages run in a fixed order: normalization, then repeated passes of
//! noise-word removal, numeric-suffix removal and stale-date removal until
//! nothing changes. The result is idempotent.

use crate::slug::normalize::{collapse_hyphens, normalize};
use crate::slug::vocabulary::NoiseVocabulary;
use chrono::{Datelike, NaiveDate, Utc};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use tracing::debug;

static NUMERIC_SUFFIX_REGEX: OnceLock<Regex> = OnceLock::new();
static DATE_TAIL_REGEX: OnceLock<Regex> = OnceLock::new();
static DATED_SLUG_REGEX: OnceLock<Regex> = OnceLock::new();

fn numeric_suffix_regex() -> &'static Regex {
    NUMERIC_SUFFIX_REGEX.get_or_init(|| Regex::new(r"^(.+)-\d{1,2}$").unwrap())
}

fn date_tail_regex() -> &'static Regex {
    DATE_TAIL_REGEX.get_or_init(|| Regex::new(r"(?:^|-)\d{4}-\d{2}-\d{2}$").unwrap())
}

fn dated_slug_regex() -> &'static Regex {
    DATED_SLUG_REGEX
        .get_or_init(|| Regex::new(r"^(.+)-(\d{4})-(\d{2})-(\d{2})$").unwrap())
}

/// Inclusive year window in which a `-YYYY-MM-DD` suffix counts as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaleDateRange {
    pub min_year: i32,
    pub max_year: i32,
}

impl StaleDateRange {
    pub fn new(min_year: i32, max_year: i32) -> Self {
        Self { min_year, max_year }
    }

    /// Every year before the current one, back to 2000.
    pub fn before_current_year() -> Self {
        Self::new(2000, Utc::now().year() - 1)
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.min_year..=self.max_year).contains(&year)
    }
}

impl Default for StaleDateRange {
    fn default() -> Self {
        Self::before_current_year()
    }
}

/// Result of cleaning one raw slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanedSlug {
    pub raw: String,
    pub cleaned: String,
    /// `cleaned != raw`
    pub changed: bool,
    /// Cleaning produced nothing; `cleaned` fell back to `raw`.
    pub collapsed_to_empty: bool,
}

/// Configured slug cleaner.
#[derive(Debug, Clone, Default)]
pub struct SlugCleaner {
    vocabulary: NoiseVocabulary,
    stale_dates: StaleDateRange,
}

impl SlugCleaner {
    pub fn new(vocabulary: NoiseVocabulary, stale_dates: StaleDateRange) -> Self {
        Self {
            vocabulary,
            stale_dates,
        }
    }

    pub fn vocabulary(&self) -> &NoiseVocabulary {
        &self.vocabulary
    }

    pub fn stale_dates(&self) -> StaleDateRange {
        self.stale_dates
    }

    /// Clean a raw slug.
    pub fn clean(&self, raw: &str) -> CleanedSlug {
        let mut current = normalize(raw);

        loop {
            let next = self.pass(&current);
            if next == current {
                break;
            }
            current = next;
        }

        if current.is_empty() {
            debug!("Slug '{}' cleaned to nothing, keeping raw form", raw);
            return CleanedSlug {
                raw: raw.to_string(),
                cleaned: raw.to_string(),
                changed: false,
                collapsed_to_empty: true,
            };
        }

        CleanedSlug {
            raw: raw.to_string(),
            changed: current != raw,
            cleaned: current,
            collapsed_to_empty: false,
        }
    }

    fn pass(&self, slug: &str) -> String {
        let without_noise = collapse_hyphens(&self.vocabulary.strip(slug));
        let without_suffix = strip_numeric_suffix(&without_noise);
        self.strip_stale_date(&without_suffix)
    }

    /// Strip a trailing `-YYYY-MM-DD` whose year is stale.
    fn strip_stale_date(&self, slug: &str) -> String {
        let Some(captures) = dated_slug_regex().captures(slug) else {
            return slug.to_string();
        };

        let parse = |index: usize| captures[index].parse::<u32>().ok();
        let date = match (parse(2), parse(3), parse(4)) {
            (Some(year), Some(month), Some(day)) => {
                NaiveDate::from_ymd_opt(year as i32, month, day)
            }
            _ => None,
        };

        match date {
            Some(date) if self.stale_dates.contains(date.year()) => captures[1].to_string(),
            _ => slug.to_string(),
        }
    }
}

/// Strip a trailing `-N` (1-2 digits). Four-digit years never match, and a
/// trailing full date is left for the stale-date stage.
fn strip_numeric_suffix(slug: &str) -> String {
    if date_tail_regex().is_match(slug) {
        return slug.to_string();
    }
    match numeric_suffix_regex().captures(slug) {
        Some(captures) => captures[1].to_string(),
        None => slug.to_string(),
    }
}

static DEFAULT_CLEANER: OnceLock<SlugCleaner> = OnceLock::new();

/// Clean with the default vocabulary and stale-date window.
pub fn clean(raw: &str) -> CleanedSlug {
    DEFAULT_CLEANER.get_or_init(SlugCleaner::default).clean(raw)
}
