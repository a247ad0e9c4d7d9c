use anyhow::{bail, Context, Result};
use std::path::PathBuf;

use crate::remote::AUTO_TRANSLATE;

/// Where the recently-viewed snapshot is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Session-local only
    Memory,
    /// One JSON file per key under `store_path`
    File,
    /// SQLite database at `store_path`
    Sqlite,
}

impl StoreBackend {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "file" => Ok(StoreBackend::File),
            "sqlite" => Ok(StoreBackend::Sqlite),
            other => bail!(
                "Invalid STORE_BACKEND '{}'. Expected one of: memory, file, sqlite",
                other
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Remote translation function
    pub translate_functions_url: Option<String>,
    pub translate_api_key: Option<String>,
    pub translate_function_name: String,
    pub translate_timeout_secs: u64,

    // Durable store
    pub store_backend: StoreBackend,
    pub store_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // Remote translation - optional so the cache works without it
            translate_functions_url: non_empty_var("TRANSLATE_FUNCTIONS_URL"),
            translate_api_key: non_empty_var("TRANSLATE_API_KEY"),
            translate_function_name: non_empty_var("TRANSLATE_FUNCTION_NAME")
                .unwrap_or_else(|| AUTO_TRANSLATE.to_string()),
            translate_timeout_secs: match std::env::var("TRANSLATE_TIMEOUT_SECS") {
                Ok(v) => v
                    .trim()
                    .parse()
                    .context("TRANSLATE_TIMEOUT_SECS must be a whole number of seconds")?,
                Err(_) => 30,
            },

            // Durable store
            store_backend: match std::env::var("STORE_BACKEND") {
                Ok(v) => StoreBackend::parse(&v)?,
                Err(_) => StoreBackend::File,
            },
            store_path: non_empty_var("STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/store")),
        })
    }

    /// Whether enough is configured to reach the translation function.
    pub fn translation_enabled(&self) -> bool {
        self.translate_functions_url.is_some() && self.translate_api_key.is_some()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
