//! Resolution: from a request path or slug to render, redirect or not-found.

pub mod outcome;
pub mod pipeline;
pub mod placeholder;
pub mod request;
pub mod session;

pub use outcome::{Resolution, ResolutionOutcome, ResolveIssue};
pub use pipeline::{PipelineConfig, ResolutionPipeline};
pub use placeholder::PlaceholderMarkers;
pub use request::{PathResolver, RouteSection};
pub use session::{NavigationSession, RequestToken};
