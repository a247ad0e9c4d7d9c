//! Remote translation service.
//!
//! The storefront does not translate anything itself. It hands text to a
//! remote function (`auto-translate`) that returns one translation per
//! requested language. `RemoteTranslationService` is the seam; the HTTP
//! implementation talks to a serverless functions endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::i18n::Language;
use crate::retry::{with_retry_if, RetryConfig};

/// Logical name of the translation function.
pub const AUTO_TRANSLATE: &str = "auto-translate";

/// JSON body sent to the translation function.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequestBody {
    pub text: String,
    pub source_language: String,
    pub target_languages: Vec<Language>,
    pub context: String,
}

/// JSON body returned by the translation function.
///
/// `translations` is optional on the wire so a response without it can be
/// told apart from a transport failure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TranslateResponse {
    #[serde(default)]
    pub translations: Option<BTreeMap<String, String>>,
}

/// Error envelope some function runtimes use for failures.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Explicit failure signalled by the remote service.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("failed to reach translation service: {0}")]
    Transport(String),

    #[error("translation service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("translation service reported an error: {0}")]
    Service(String),

    #[error("failed to parse translation service response: {0}")]
    InvalidBody(String),
}

impl RemoteError {
    /// Network errors, rate limiting and 5xx responses are worth another try.
    /// Other 4xx responses and service-reported errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            RemoteError::Transport(_) => true,
            RemoteError::Status { status, .. } => *status == 429 || *status >= 500,
            RemoteError::Service(_) | RemoteError::InvalidBody(_) => false,
        }
    }
}

/// Something that can run a named translation function.
#[async_trait]
pub trait RemoteTranslationService: Send + Sync {
    async fn invoke(
        &self,
        name: &str,
        body: &TranslateRequestBody,
    ) -> Result<TranslateResponse, RemoteError>;
}

/// Calls translation functions over HTTP: `POST {functions_url}/{name}`.
pub struct HttpTranslationService {
    client: reqwest::Client,
    functions_url: String,
    api_key: String,
    retry: RetryConfig,
}

impl HttpTranslationService {
    pub fn new(
        functions_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            functions_url: functions_url.into(),
            api_key: api_key.into(),
            retry: RetryConfig::api_call(),
        })
    }

    /// Build from configuration. Fails when the translation endpoint or key is missing.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let functions_url = config
            .translate_functions_url
            .clone()
            .ok_or_else(|| anyhow::anyhow!("TRANSLATE_FUNCTIONS_URL not set"))?;
        let api_key = config
            .translate_api_key
            .clone()
            .ok_or_else(|| anyhow::anyhow!("TRANSLATE_API_KEY not set"))?;

        Ok(Self::new(
            functions_url,
            api_key,
            Duration::from_secs(config.translate_timeout_secs),
        )?)
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn function_url(&self, name: &str) -> String {
        format!("{}/{}", self.functions_url.trim_end_matches('/'), name)
    }

    async fn invoke_once(
        &self,
        url: &str,
        body: &TranslateRequestBody,
    ) -> Result<TranslateResponse, RemoteError> {
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body: text.chars().take(200).collect(),
            });
        }

        if let Ok(ErrorBody { error }) = serde_json::from_str::<ErrorBody>(&text) {
            return Err(RemoteError::Service(error));
        }

        serde_json::from_str(&text).map_err(|e| RemoteError::InvalidBody(e.to_string()))
    }
}

#[async_trait]
impl RemoteTranslationService for HttpTranslationService {
    async fn invoke(
        &self,
        name: &str,
        body: &TranslateRequestBody,
    ) -> Result<TranslateResponse, RemoteError> {
        let url = self.function_url(name);
        debug!(url = %url, targets = body.target_languages.len(), "invoking translation function");

        with_retry_if(
            &self.retry,
            &format!("Invoke {}", name),
            || self.invoke_once(&url, body),
            RemoteError::is_retryable,
        )
        .await
    }
}
