//! Language type: validated handle onto a registry entry.

use crate::i18n::{LanguageConfig, LanguageRegistry};
use anyhow::{bail, Result};
use serde::{Serialize, Serializer};
use std::fmt;

/// A storefront language.
///
/// Can only be constructed from a code present in the registry, so every
/// `Language` resolves to a `LanguageConfig`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Language {
    /// ISO 639-1 language code (e.g., "sv", "en")
    code: &'static str,
}

impl Language {
    pub const SWEDISH: Language = Language { code: "sv" };
    pub const ENGLISH: Language = Language { code: "en" };
    pub const NORWEGIAN: Language = Language { code: "no" };
    pub const DANISH: Language = Language { code: "da" };
    pub const GERMAN: Language = Language { code: "de" };
    pub const FINNISH: Language = Language { code: "fi" };
    pub const DUTCH: Language = Language { code: "nl" };
    pub const FRENCH: Language = Language { code: "fr" };
    pub const SPANISH: Language = Language { code: "es" };
    pub const POLISH: Language = Language { code: "pl" };

    /// Create a Language from a language code string.
    ///
    /// # Returns
    /// * `Ok(Language)` if the code is one of the storefront languages
    /// * `Err` otherwise
    pub fn from_code(code: &str) -> Result<Language> {
        match LanguageRegistry::get().get_by_code(code) {
            Some(config) => Ok(Language { code: config.code }),
            None => bail!("Unknown language code: '{}'", code),
        }
    }

    /// The language catalog text is authored in by default (Swedish).
    pub fn default_source() -> Language {
        Language {
            code: LanguageRegistry::get().default_source().code,
        }
    }

    /// Every storefront language, in registry order.
    pub fn all() -> Vec<Language> {
        LanguageRegistry::get()
            .codes()
            .into_iter()
            .map(|code| Language { code })
            .collect()
    }

    /// Every storefront language except `source`.
    ///
    /// `source` does not need to be a known code: an unknown source simply
    /// excludes nothing.
    pub fn targets_excluding(source: &str) -> Vec<Language> {
        Self::all()
            .into_iter()
            .filter(|lang| lang.code != source)
            .collect()
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Get the full language configuration from the registry.
    ///
    /// # Panics
    /// Panics if the code is missing from the registry, which cannot happen
    /// for a `Language` built through `from_code`, `all` or the constants.
    pub fn config(&self) -> &'static LanguageConfig {
        LanguageRegistry::get()
            .get_by_code(self.code)
            .expect("Language code should always be valid")
    }

    /// English name of the language (e.g., "Swedish").
    pub fn name(&self) -> &'static str {
        self.config().name
    }

    /// Native name of the language (e.g., "Svenska").
    pub fn native_name(&self) -> &'static str {
        self.config().native_name
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code)
    }
}

impl Serialize for Language {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code)
    }
}
