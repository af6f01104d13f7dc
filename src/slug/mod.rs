//! Slug primitives shared by the resolver and batch tooling.
//!
//! - `normalize`: case/diacritic folding
//! - `vocabulary`: data-driven noise phrases
//! - `cleaner`: the ordered cleaning stages
//! - `classifier`: concert vs festival

pub mod classifier;
pub mod cleaner;
pub mod normalize;
pub mod vocabulary;

pub use classifier::{ClassEvidence, FestivalKeywords, ResourceClass, RouteClassifier};
pub use cleaner::{clean, CleanedSlug, SlugCleaner, StaleDateRange};
pub use normalize::normalize;
pub use vocabulary::NoiseVocabulary;
