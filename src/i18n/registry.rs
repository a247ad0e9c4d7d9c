//! Language registry: Single source of truth for all storefront languages.
//!
//! The set is closed: ten languages, in a fixed order that also determines the
//! order of translation targets. It is built once on first access with
//! `OnceLock` and never changes afterwards.

use serde::Serialize;
use std::sync::OnceLock;

/// Metadata for one storefront language.
#[derive(Debug, Clone, Serialize)]
pub struct LanguageConfig {
    /// ISO 639-1 language code (e.g., "sv", "en")
    pub code: &'static str,

    /// English name of the language (e.g., "Swedish")
    pub name: &'static str,

    /// Native name of the language (e.g., "Svenska")
    pub native_name: &'static str,

    /// Whether catalog text is authored in this language by default
    pub is_default_source: bool,
}

/// Global language registry.
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

/// Global registry instance (initialized lazily)
static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    /// Get the global language registry instance.
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    /// Get a language configuration by its code.
    ///
    /// # Returns
    /// * `Some(&LanguageConfig)` if the language exists
    /// * `None` if the code is not one of the storefront languages
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// All languages in registry order.
    pub fn list_all(&self) -> Vec<&LanguageConfig> {
        self.languages.iter().collect()
    }

    /// All language codes in registry order.
    pub fn codes(&self) -> Vec<&'static str> {
        self.languages.iter().map(|lang| lang.code).collect()
    }

    /// The language catalog text is written in unless stated otherwise.
    ///
    /// # Panics
    /// Panics if the table does not mark exactly one default source language.
    pub fn default_source(&self) -> &LanguageConfig {
        let sources: Vec<_> = self
            .languages
            .iter()
            .filter(|lang| lang.is_default_source)
            .collect();

        match sources.len() {
            0 => panic!("No default source language found in registry"),
            1 => sources[0],
            _ => panic!("Multiple default source languages found in registry"),
        }
    }

    pub fn is_supported(&self, code: &str) -> bool {
        self.get_by_code(code).is_some()
    }
}

fn lang(
    code: &'static str,
    name: &'static str,
    native_name: &'static str,
    is_default_source: bool,
) -> LanguageConfig {
    LanguageConfig {
        code,
        name,
        native_name,
        is_default_source,
    }
}

/// The storefront's languages, Swedish first.
fn default_languages() -> Vec<LanguageConfig> {
    vec![
        lang("sv", "Swedish", "Svenska", true),
        lang("en", "English", "English", false),
        lang("no", "Norwegian", "Norsk", false),
        lang("da", "Danish", "Dansk", false),
        lang("de", "German", "Deutsch", false),
        lang("fi", "Finnish", "Suomi", false),
        lang("nl", "Dutch", "Nederlands", false),
        lang("fr", "French", "Français", false),
        lang("es", "Spanish", "Español", false),
        lang("pl", "Polish", "Polski", false),
    ]
}
