//! Storefront languages and translation observability.
//!
//! # Architecture
//!
//! - `registry`: Single source of truth for the fixed set of storefront languages
//! - `language`: Type-safe `Language` handle validated against the registry
//! - `metrics`: Per-orchestrator translation counters
//!
//! # Example
//!
//! ```rust,ignore
//! use storefront_support::i18n::Language;
//!
//! // Everything except Swedish
//! let targets = Language::targets_excluding("sv");
//! assert_eq!(targets.len(), 9);
//! ```

mod language;
mod metrics;
mod registry;

pub use language::Language;
pub use metrics::{MetricsReport, TranslationMetrics};
pub use registry::{LanguageConfig, LanguageRegistry};
