//! Locale registry: single source of truth for the locales the site serves.
//!
//! The registry is a lazily initialized singleton (`OnceLock`). Exactly one
//! locale is canonical and carries no path prefix; every other locale is
//! identified by a reserved prefix such as `/en`.

use std::sync::OnceLock;

/// Configuration for a supported locale.
#[derive(Debug, Clone)]
pub struct LocaleConfig {
    /// ISO 639-1 code (e.g., "es", "en")
    pub code: &'static str,

    /// English name of the locale (e.g., "Spanish")
    pub name: &'static str,

    /// Native name of the locale (e.g., "Español")
    pub native_name: &'static str,

    /// Reserved path prefix, `None` for the canonical locale
    pub path_prefix: Option<&'static str>,

    /// Whether this is the canonical (unprefixed) locale
    pub is_canonical: bool,

    /// Whether this locale is served
    pub enabled: bool,
}

/// Global locale registry.
pub struct LocaleRegistry {
    locales: Vec<LocaleConfig>,
}

static REGISTRY: OnceLock<LocaleRegistry> = OnceLock::new();

impl LocaleRegistry {
    /// Get the global registry instance.
    pub fn get() -> &'static LocaleRegistry {
        REGISTRY.get_or_init(|| LocaleRegistry {
            locales: default_locales(),
        })
    }

    /// Get a locale configuration by its code.
    ///
    /// # Arguments
    /// * `code` - The ISO 639-1 locale code (e.g., "es", "en")
    ///
    /// # Returns
    /// * `Some(&LocaleConfig)` if the locale exists
    /// * `None` if the locale is not registered
    pub fn get_by_code(&self, code: &str) -> Option<&LocaleConfig> {
        self.locales.iter().find(|locale| locale.code == code)
    }

    /// Find the enabled, prefixed locale whose prefix starts `path`.
    ///
    /// A prefix only matches on a segment boundary: `/en` and `/en/...`
    /// match, `/entradas` does not.
    ///
    /// # Arguments
    /// * `path` - A request path, without query string
    ///
    /// # Returns
    /// * `Some(&LocaleConfig)` for a prefixed, enabled locale
    /// * `None` when the path belongs to the canonical locale
    pub fn get_by_path(&self, path: &str) -> Option<&LocaleConfig> {
        self.locales
            .iter()
            .filter(|locale| locale.enabled)
            .find(|locale| match locale.path_prefix {
                Some(prefix) => match path.strip_prefix(prefix) {
                    Some(rest) => rest.is_empty() || rest.starts_with('/'),
                    None => false,
                },
                None => false,
            })
    }

    /// Get all enabled locales.
    pub fn list_enabled(&self) -> Vec<&LocaleConfig> {
        self.locales.iter().filter(|locale| locale.enabled).collect()
    }

    /// Get the canonical locale configuration.
    ///
    /// Falls back to the first registered locale if none is flagged
    /// canonical; `default_locales` always flags exactly one.
    pub fn canonical(&self) -> &LocaleConfig {
        self.locales
            .iter()
            .find(|locale| locale.is_canonical)
            .unwrap_or(&self.locales[0])
    }

    /// Check if a locale code is supported and enabled.
    ///
    /// # Arguments
    /// * `code` - The ISO 639-1 locale code to check
    ///
    /// # Returns
    /// `true` if the locale exists and is enabled, `false` otherwise.
    pub fn is_enabled(&self, code: &str) -> bool {
        self.get_by_code(code)
            .map(|locale| locale.enabled)
            .unwrap_or(false)
    }
}

/// Spanish is canonical (unprefixed), English lives under `/en`.
fn default_locales() -> Vec<LocaleConfig> {
    vec![
        LocaleConfig {
            code: "es",
            name: "Spanish",
            native_name: "Español",
            path_prefix: None,
            is_canonical: true,
            enabled: true,
        },
        LocaleConfig {
            code: "en",
            name: "English",
            native_name: "English",
            path_prefix: Some("/en"),
            is_canonical: false,
            enabled: true,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_get_returns_singleton() {
        let registry1 = LocaleRegistry::get();
        let registry2 = LocaleRegistry::get();
        assert!(std::ptr::eq(registry1, registry2));
    }

    #[test]
    fn test_canonical_is_spanish_without_prefix() {
        let canonical = LocaleRegistry::get().canonical();
        assert_eq!(canonical.code, "es");
        assert!(canonical.path_prefix.is_none());
    }

    #[test]
    fn test_exactly_one_canonical_locale() {
        let count = LocaleRegistry::get()
            .list_enabled()
            .iter()
            .filter(|locale| locale.is_canonical)
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_get_by_path_matches_segment_boundary() {
        let registry = LocaleRegistry::get();
        assert_eq!(registry.get_by_path("/en").map(|l| l.code), Some("en"));
        assert_eq!(
            registry.get_by_path("/en/tickets/x").map(|l| l.code),
            Some("en")
        );
        assert!(registry.get_by_path("/entradas/x").is_none());
        assert!(registry.get_by_path("/conciertos/en").is_none());
    }

    #[test]
    fn test_is_enabled() {
        let registry = LocaleRegistry::get();
        assert!(registry.is_enabled("es"));
        assert!(registry.is_enabled("en"));
        assert!(!registry.is_enabled("fr"));
    }
}
