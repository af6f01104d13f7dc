//! Request layer: turns a full request path into an outcome.
//!
//! Detects the locale, maps the section to an assumed class, resolves the
//! slug and re-expresses any redirect in the request's locale.

use crate::i18n::{Locale, RoutePath, SegmentDictionary};
use crate::resolve::outcome::ResolutionOutcome;
use crate::resolve::pipeline::ResolutionPipeline;
use crate::slug::ResourceClass;
use percent_encoding::percent_decode_str;
use tracing::{debug, warn};

/// Retired section names. Pages under them are never rendered in place;
/// a hit becomes a redirect to the canonical section.
const LEGACY_SECTIONS: &[&str] = &[
    "concierto", "festival", "evento", "eventos", "concert", "concerts", "event", "events",
];

/// How a section segment routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteSection {
    /// A canonical section: the class is fixed by the URL
    Canonical(ResourceClass),
    /// A retired section: the class is guessed from the slug
    Legacy,
}

impl RouteSection {
    /// Section of a canonical (unlocalized) segment.
    pub fn from_segment(segment: &str) -> Option<Self> {
        let segment = segment.to_ascii_lowercase();
        match segment.as_str() {
            "conciertos" => Some(RouteSection::Canonical(ResourceClass::Concert)),
            "festivales" => Some(RouteSection::Canonical(ResourceClass::Festival)),
            other if LEGACY_SECTIONS.contains(&other) => Some(RouteSection::Legacy),
            _ => None,
        }
    }
}

pub struct PathResolver {
    pipeline: ResolutionPipeline,
}

impl PathResolver {
    pub fn new(pipeline: ResolutionPipeline) -> Self {
        Self { pipeline }
    }

    /// Resolve a request path such as `/en/tickets/coldplay-madrid`.
    ///
    /// Paths that are not `/{section}/{slug}` under a known section are
    /// `NotFound` without touching the store. A canonical section written
    /// in another locale's spelling (`/en/conciertos/...`) resolves like a
    /// legacy one: a hit redirects to the localized URL.
    pub async fn resolve_path(&self, path: &str) -> ResolutionOutcome {
        let route = RoutePath::parse(path);
        let locale = route.locale;
        let segments: Vec<String> = route.segments.iter().map(|s| decode_segment(s)).collect();

        let [written, slug] = segments.as_slice() else {
            debug!("Path '{}' is not a section/slug route", path);
            return ResolutionOutcome::NotFound;
        };
        let section = SegmentDictionary::get().to_canonical(written, locale);
        let Some(route_section) = RouteSection::from_segment(section) else {
            debug!("Path '{}' has unknown section '{}'", path, written);
            return ResolutionOutcome::NotFound;
        };

        let (assumed, in_place) = match route_section {
            RouteSection::Canonical(class) => {
                let spelled = spelled_for(written, section, locale);
                if !spelled {
                    debug!("Section '{}' is off-locale for {}", written, locale.code());
                }
                (class, spelled)
            }
            RouteSection::Legacy => (self.pipeline.classifier().heuristic(slug), false),
        };

        let outcome = match self.pipeline.resolve(slug, assumed).await {
            ResolutionOutcome::Found { class, row } if !in_place => ResolutionOutcome::Redirect {
                location: class.canonical_path(&row.slug),
            },
            outcome => outcome,
        };
        let outcome = outcome.localized(locale);

        let requested = request_path(locale, &segments);
        if outcome.redirect_location() == Some(requested.as_str()) {
            warn!("Redirect for '{}' points back at itself", path);
            return ResolutionOutcome::NotFound;
        }
        outcome
    }
}

/// Whether `written` is how `locale` spells the canonical `section`.
fn spelled_for(written: &str, section: &str, locale: Locale) -> bool {
    let section = section.to_ascii_lowercase();
    SegmentDictionary::get()
        .to_locale(&section, locale)
        .eq_ignore_ascii_case(written)
}

/// The request path as received, decoded and without query.
fn request_path(locale: Locale, segments: &[String]) -> String {
    let bare = format!("/{}", segments.join("/"));
    match locale.path_prefix() {
        Some(prefix) => format!("{}{}", prefix, bare),
        None => bare,
    }
}

/// Percent-decode one path segment. Invalid escapes are kept literally.
fn decode_segment(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}
