//! Locale-aware path handling.
//!
//! Every path has exactly one locale: an enabled locale's reserved prefix
//! selects it, and no prefix means the canonical locale. Only the section
//! segment (the first one) is translated; everything after it is an
//! identifier and passes through untouched.

use crate::i18n::{Locale, LocaleRegistry, SegmentDictionary};

/// A path split into its locale and bare segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePath {
    pub locale: Locale,
    pub segments: Vec<String>,
}

impl RoutePath {
    /// Parse a request path. The locale prefix is removed from `segments`.
    pub fn parse(path: &str) -> Self {
        let locale = detect_locale(path);
        let bare = strip_locale_prefix(path);
        Self {
            locale,
            segments: split_segments(&bare),
        }
    }

    /// Bare path (no locale prefix), e.g. `/tickets/coldplay-madrid`.
    pub fn bare_path(&self) -> String {
        join_segments(&self.segments)
    }
}

/// Detect the locale of a path from its prefix.
pub fn detect_locale(path: &str) -> Locale {
    let path = without_query(path);
    LocaleRegistry::get()
        .get_by_path(path)
        .and_then(|config| Locale::from_code(config.code).ok())
        .unwrap_or_else(Locale::canonical)
}

/// Remove the locale prefix, if any. `/en` becomes `/`.
pub fn strip_locale_prefix(path: &str) -> String {
    let path = without_query(path);
    let stripped = LocaleRegistry::get()
        .get_by_path(path)
        .and_then(|config| config.path_prefix)
        .and_then(|prefix| path.strip_prefix(prefix))
        .unwrap_or(path);

    if stripped.is_empty() {
        "/".to_string()
    } else {
        stripped.to_string()
    }
}

/// Translate a single route segment into `target`.
///
/// Translating into the canonical locale accepts a segment written in any
/// enabled alternate locale. Unmapped segments pass through unchanged.
pub fn translate_segment(segment: &str, target: Locale) -> String {
    let dictionary = SegmentDictionary::get();

    if !target.is_canonical() {
        return dictionary.to_locale(segment, target).to_string();
    }

    LocaleRegistry::get()
        .list_enabled()
        .into_iter()
        .filter(|config| !config.is_canonical)
        .filter_map(|config| Locale::from_code(config.code).ok())
        .map(|source| dictionary.to_canonical(segment, source))
        .find(|translated| *translated != segment)
        .unwrap_or(segment)
        .to_string()
}

/// Render a canonical path in `target`'s locale.
pub fn localize(canonical_path: &str, target: Locale) -> String {
    let mut segments = split_segments(without_query(canonical_path));
    if let Some(section) = segments.first_mut() {
        *section = SegmentDictionary::get()
            .to_locale(section, target)
            .to_string();
    }

    let bare = join_segments(&segments);
    match target.path_prefix() {
        Some(prefix) if bare == "/" => prefix.to_string(),
        Some(prefix) => format!("{}{}", prefix, bare),
        None => bare,
    }
}

/// Map a path in any locale to its canonical, unprefixed form.
pub fn canonicalize(path: &str) -> String {
    let route = RoutePath::parse(path);
    let mut segments = route.segments;
    if let Some(section) = segments.first_mut() {
        *section = SegmentDictionary::get()
            .to_canonical(section, route.locale)
            .to_string();
    }
    join_segments(&segments)
}

fn without_query(path: &str) -> &str {
    match path.find(['?', '#']) {
        Some(index) => &path[..index],
        None => path,
    }
}

fn split_segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

fn join_segments(segments: &[String]) -> String {
    format!("/{}", segments.join("/"))
}
