//! Route segment dictionary.
//!
//! Maps the canonical (Spanish) route sections to their localized
//! equivalents and back. Resource identifiers are never in this table, so
//! they always translate to themselves.

use crate::i18n::Locale;
use std::sync::OnceLock;

/// One canonical section and its localized spellings.
#[derive(Debug, Clone)]
pub struct SegmentEntry {
    pub canonical: &'static str,
    /// (locale code, localized segment)
    pub localized: &'static [(&'static str, &'static str)],
}

pub struct SegmentDictionary {
    entries: Vec<SegmentEntry>,
}

static DICTIONARY: OnceLock<SegmentDictionary> = OnceLock::new();

impl SegmentDictionary {
    pub fn get() -> &'static SegmentDictionary {
        DICTIONARY.get_or_init(|| SegmentDictionary {
            entries: default_entries(),
        })
    }

    /// Translate a canonical segment into `target`.
    ///
    /// # Arguments
    /// * `segment` - A canonical section such as `conciertos`
    /// * `target` - The locale to render it in
    ///
    /// # Returns
    /// The localized spelling, or `segment` itself when it is unmapped or
    /// `target` is canonical.
    pub fn to_locale<'a>(&self, segment: &'a str, target: Locale) -> &'a str {
        if target.is_canonical() {
            return segment;
        }
        self.entries
            .iter()
            .find(|entry| entry.canonical == segment)
            .and_then(|entry| {
                entry
                    .localized
                    .iter()
                    .find(|(code, _)| *code == target.code())
                    .map(|(_, localized)| *localized)
            })
            .unwrap_or(segment)
    }

    /// Translate a segment written in `source` back to its canonical form.
    ///
    /// # Arguments
    /// * `segment` - A section as written in a `source` URL
    /// * `source` - The locale the segment is written in
    ///
    /// # Returns
    /// The canonical section, or `segment` itself when it is unmapped.
    pub fn to_canonical<'a>(&self, segment: &'a str, source: Locale) -> &'a str {
        if source.is_canonical() {
            return segment;
        }
        self.entries
            .iter()
            .find(|entry| {
                entry
                    .localized
                    .iter()
                    .any(|(code, localized)| *code == source.code() && *localized == segment)
            })
            .map(|entry| entry.canonical)
            .unwrap_or(segment)
    }

    /// Whether `segment` is a known canonical section.
    pub fn is_canonical_segment(&self, segment: &str) -> bool {
        self.entries.iter().any(|entry| entry.canonical == segment)
    }

    pub fn entries(&self) -> &[SegmentEntry] {
        &self.entries
    }
}

fn default_entries() -> Vec<SegmentEntry> {
    vec![
        SegmentEntry {
            canonical: "conciertos",
            localized: &[("en", "tickets")],
        },
        SegmentEntry {
            canonical: "festivales",
            localized: &[("en", "festivals")],
        },
        SegmentEntry {
            canonical: "destinos",
            localized: &[("en", "destinations")],
        },
        SegmentEntry {
            canonical: "artistas",
            localized: &[("en", "artists")],
        },
        SegmentEntry {
            canonical: "hoteles",
            localized: &[("en", "hotels")],
        },
        SegmentEntry {
            canonical: "ciudades",
            localized: &[("en", "cities")],
        },
        SegmentEntry {
            canonical: "buscar",
            localized: &[("en", "search")],
        },
        SegmentEntry {
            canonical: "favoritos",
            localized: &[("en", "favorites")],
        },
    ]
}
