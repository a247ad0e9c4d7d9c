//! Translation fan-out.
//!
//! One catalog text goes out in a single remote call and comes back as a
//! mapping with one entry per storefront language other than the source. The
//! orchestrator never surfaces an error to its caller: every failure is logged
//! and the call resolves to "no result".
//!
//! A busy flag is raised for the duration of the remote call. It is released
//! by a guard, so it drops back to `false` however the call ends, including
//! when the service panics or the caller drops the future.

use futures::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::i18n::{Language, TranslationMetrics};
use crate::remote::{
    RemoteError, RemoteTranslationService, TranslateRequestBody, TranslateResponse,
    AUTO_TRANSLATE,
};

/// Context sent when the caller does not supply one.
pub const DEFAULT_CONTEXT: &str = "e-commerce product/category";

/// A text to translate, with its source language and a free-form hint about
/// where the text appears.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub text: String,
    pub source_language: String,
    pub context: String,
}

impl TranslationRequest {
    /// Swedish source and the default context.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_language: Language::default_source().code().to_string(),
            context: DEFAULT_CONTEXT.to_string(),
        }
    }

    pub fn from_language(mut self, source_language: impl Into<String>) -> Self {
        self.source_language = source_language.into();
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Languages the text is translated into: everything but the source.
    pub fn target_languages(&self) -> Vec<Language> {
        Language::targets_excluding(&self.source_language)
    }
}

/// Translations keyed by language code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TranslationResult {
    translations: BTreeMap<String, String>,
}

impl TranslationResult {
    pub fn get(&self, language: Language) -> Option<&str> {
        self.get_code(language.code())
    }

    pub fn get_code(&self, code: &str) -> Option<&str> {
        self.translations.get(code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.translations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translations.is_empty()
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.translations.keys().map(String::as_str)
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.translations
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.translations
    }
}

/// Why a translation produced nothing.
#[derive(Debug, Error)]
pub enum TranslateFailure {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("translation service panicked: {0}")]
    Fault(String),

    #[error("response did not contain a translations mapping")]
    MissingTranslations,

    #[error("response is missing translations for: {}", .missing.join(", "))]
    IncompleteTranslations { missing: Vec<String> },
}

impl TranslateFailure {
    /// The call went through but the response could not be used. A body that
    /// fails to parse only ever comes from a 2xx response.
    pub fn is_malformed_response(&self) -> bool {
        matches!(
            self,
            TranslateFailure::MissingTranslations
                | TranslateFailure::IncompleteTranslations { .. }
                | TranslateFailure::Remote(RemoteError::InvalidBody(_))
        )
    }
}

/// How a translate call was resolved.
#[derive(Debug)]
pub enum TranslationOutcome {
    Translated(TranslationResult),
    /// Blank input; the remote service was not called.
    Skipped,
    Failed(TranslateFailure),
}

impl TranslationOutcome {
    pub fn into_result(self) -> Option<TranslationResult> {
        match self {
            TranslationOutcome::Translated(result) => Some(result),
            TranslationOutcome::Skipped | TranslationOutcome::Failed(_) => None,
        }
    }

    pub fn is_translated(&self) -> bool {
        matches!(self, TranslationOutcome::Translated(_))
    }
}

/// Raises the busy flag on creation and lowers it on drop.
struct BusyGuard<'a> {
    busy: &'a watch::Sender<bool>,
}

impl<'a> BusyGuard<'a> {
    fn acquire(busy: &'a watch::Sender<bool>) -> Self {
        busy.send_replace(true);
        Self { busy }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.busy.send_replace(false);
    }
}

/// Fans catalog text out to every storefront language through the remote
/// translation function.
///
/// Calls on one instance share the busy flag. Overlapping calls race on it:
/// the first to finish lowers it while the other is still in flight.
pub struct TranslationOrchestrator {
    service: Arc<dyn RemoteTranslationService>,
    function_name: String,
    busy: watch::Sender<bool>,
    metrics: TranslationMetrics,
}

impl TranslationOrchestrator {
    pub fn new(service: Arc<dyn RemoteTranslationService>) -> Self {
        let (busy, _) = watch::channel(false);
        Self {
            service,
            function_name: AUTO_TRANSLATE.to_string(),
            busy,
            metrics: TranslationMetrics::new(),
        }
    }

    /// Call a differently named remote function.
    pub fn with_function_name(mut self, name: impl Into<String>) -> Self {
        self.function_name = name.into();
        self
    }

    /// Whether a remote call is in flight.
    pub fn is_busy(&self) -> bool {
        *self.busy.borrow()
    }

    /// Watch the busy flag.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.busy.subscribe()
    }

    pub fn metrics(&self) -> &TranslationMetrics {
        &self.metrics
    }

    /// Translate `text` from `source_language` into every other storefront
    /// language. `None` for blank input or any failure.
    pub async fn translate(
        &self,
        text: &str,
        source_language: &str,
        context: &str,
    ) -> Option<TranslationResult> {
        let request = TranslationRequest::new(text)
            .from_language(source_language)
            .with_context(context);
        self.translate_outcome(&request).await.into_result()
    }

    /// [`translate`](Self::translate) from Swedish with the default context.
    pub async fn translate_default(&self, text: &str) -> Option<TranslationResult> {
        self.translate_outcome(&TranslationRequest::new(text))
            .await
            .into_result()
    }

    /// Translate and report how the call was resolved.
    pub async fn translate_outcome(&self, request: &TranslationRequest) -> TranslationOutcome {
        if request.text.trim().is_empty() {
            debug!("skipping translation of blank text");
            self.metrics.record_skipped_input();
            return TranslationOutcome::Skipped;
        }

        let targets = request.target_languages();
        let body = TranslateRequestBody {
            text: request.text.clone(),
            source_language: request.source_language.clone(),
            target_languages: targets.clone(),
            context: request.context.clone(),
        };

        let settled = {
            let _busy = BusyGuard::acquire(&self.busy);
            self.metrics.record_remote_call();
            AssertUnwindSafe(self.service.invoke(&self.function_name, &body))
                .catch_unwind()
                .await
        };

        let result = match settled {
            Ok(Ok(response)) => check_coverage(response, &targets),
            Ok(Err(e)) => Err(TranslateFailure::Remote(e)),
            Err(panic) => Err(TranslateFailure::Fault(panic_message(panic.as_ref()))),
        };

        match result {
            Ok(translations) => {
                info!(
                    source = %request.source_language,
                    languages = translations.len(),
                    "translation complete"
                );
                TranslationOutcome::Translated(translations)
            }
            Err(failure) => {
                if failure.is_malformed_response() {
                    self.metrics.record_malformed_response();
                } else {
                    self.metrics.record_remote_failure();
                }
                warn!(
                    error = %failure,
                    source = %request.source_language,
                    function = %self.function_name,
                    "translation failed"
                );
                TranslationOutcome::Failed(failure)
            }
        }
    }
}

/// Accept the mapping only if every requested language is present. Extra
/// entries are passed through untouched.
fn check_coverage(
    response: TranslateResponse,
    targets: &[Language],
) -> Result<TranslationResult, TranslateFailure> {
    let translations = response
        .translations
        .ok_or(TranslateFailure::MissingTranslations)?;

    let missing: Vec<String> = targets
        .iter()
        .filter(|lang| !translations.contains_key(lang.code()))
        .map(|lang| lang.code().to_string())
        .collect();

    if !missing.is_empty() {
        return Err(TranslateFailure::IncompleteTranslations { missing });
    }

    Ok(TranslationResult { translations })
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
