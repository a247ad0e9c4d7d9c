//! Storefront support layer: a bounded recently-viewed cache persisted through a
//! pluggable durable store, and a translation orchestrator that fans one text
//! out to every storefront language through a remote translation function.

pub mod catalog;
pub mod config;
pub mod i18n;
pub mod personalization;
pub mod remote;
pub mod retry;
pub mod store;
pub mod translation;

pub use catalog::{CatalogEntry, CatalogItem};
pub use personalization::PersonalizationCache;
pub use store::{DurableStore, StoreError};
pub use translation::{TranslationOrchestrator, TranslationOutcome, TranslationResult};
