//! Locale routing for the site's URL scheme.
//!
//! # Architecture
//!
//! - `registry`: single source of truth for served locales and their prefixes
//! - `locale`: validated `Locale` type
//! - `segments`: bidirectional dictionary of route sections
//! - `router`: detect/strip/translate/localize/canonicalize operations
//!
//! # Example
//!
//! ```rust,ignore
//! use slug_resolver::i18n::{canonicalize, localize, Locale};
//!
//! assert_eq!(canonicalize("/en/tickets/coldplay-madrid"), "/conciertos/coldplay-madrid");
//! assert_eq!(localize("/conciertos/coldplay-madrid", Locale::ENGLISH), "/en/tickets/coldplay-madrid");
//! ```

mod locale;
mod registry;
mod router;
mod segments;

pub use locale::Locale;
pub use registry::{LocaleConfig, LocaleRegistry};
pub use router::{
    canonicalize, detect_locale, localize, strip_locale_prefix, translate_segment, RoutePath,
};
pub use segments::{SegmentDictionary, SegmentEntry};
