//! Locale type: validated locale representation backed by the registry.

use crate::i18n::{LocaleConfig, LocaleRegistry};
use anyhow::{bail, Result};

/// A validated locale.
///
/// Only locales present and enabled in the registry can be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Locale {
    code: &'static str,
}

impl Locale {
    pub const SPANISH: Locale = Locale { code: "es" };
    pub const ENGLISH: Locale = Locale { code: "en" };

    /// Create a Locale from its ISO 639-1 code.
    ///
    /// # Returns
    /// * `Ok(Locale)` if the code is known and enabled
    /// * `Err` otherwise
    pub fn from_code(code: &str) -> Result<Locale> {
        match LocaleRegistry::get().get_by_code(code) {
            Some(config) if config.enabled => Ok(Locale { code: config.code }),
            Some(_) => bail!("Locale '{}' is not enabled", code),
            None => bail!("Unknown locale code: '{}'", code),
        }
    }

    /// The canonical (unprefixed) locale.
    pub fn canonical() -> Locale {
        Locale {
            code: LocaleRegistry::get().canonical().code,
        }
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Registry entry for this locale, if it is still registered.
    pub fn config(&self) -> Option<&'static LocaleConfig> {
        LocaleRegistry::get().get_by_code(self.code)
    }

    /// Reserved path prefix (`/en`), `None` for the canonical locale.
    pub fn path_prefix(&self) -> Option<&'static str> {
        self.config().and_then(|config| config.path_prefix)
    }

    pub fn is_canonical(&self) -> bool {
        self.config().map(|config| config.is_canonical).unwrap_or(false)
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::canonical()
    }
}
