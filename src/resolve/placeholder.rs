//! "Not yet scheduled" markers that are never valid redirect targets.

use crate::slug::normalize;

const DEFAULT_MARKERS: &[&str] = &[
    "tbd", "tba", "por-confirmar", "por-determinar", "proximamente", "placeholder",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderMarkers {
    markers: Vec<String>,
}

impl PlaceholderMarkers {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            markers: markers
                .into_iter()
                .map(|marker| normalize(marker.as_ref()))
                .filter(|marker| !marker.is_empty())
                .collect(),
        }
    }

    /// True when `value` is a marker, or starts or ends with one as whole
    /// tokens (`tbd-madrid`, `festival-tbd`).
    pub fn is_placeholder(&self, value: &str) -> bool {
        let value = normalize(value);
        if value.is_empty() {
            return true;
        }
        self.markers.iter().any(|marker| {
            value == *marker
                || value.starts_with(&format!("{}-", marker))
                || value.ends_with(&format!("-{}", marker))
        })
    }
}

impl Default for PlaceholderMarkers {
    fn default() -> Self {
        Self::new(DEFAULT_MARKERS)
    }
}
