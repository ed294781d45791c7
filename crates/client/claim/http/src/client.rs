use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;

use client_claim_core::{
    Claim, ProgressSnapshot, RunApi, SubmissionError, SubmitRunResponse, SyncRequest,
};

use crate::config::ApiConfig;

/// `RunApi` over HTTP.
pub struct HttpRunApi {
    config: ApiConfig,
    http_client: reqwest::Client,
}

impl HttpRunApi {
    /// # Errors
    ///
    /// Returns [`SubmissionError::Config`] if the HTTP client cannot be built.
    pub fn new(config: ApiConfig) -> Result<Self, SubmissionError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SubmissionError::Config(e.to_string()))?;
        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, SubmissionError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let url = self.config.endpoint(path);
        tracing::debug!("POST {}", url);

        let mut request = self.http_client.post(&url).json(body);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SubmissionError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SubmissionError::Network(e.to_string()))?;
        tracing::debug!("POST {} -> {}: {}", url, status, text);

        if !status.is_success() {
            return Err(status_error(status, &text));
        }

        serde_json::from_str(&text).map_err(|e| {
            SubmissionError::Decode(format!("{e} (body: {})", truncate(&text, 200)))
        })
    }
}

#[async_trait]
impl RunApi for HttpRunApi {
    async fn submit_run(&self, claim: &Claim) -> Result<SubmitRunResponse, SubmissionError> {
        self.post("run/submit", claim).await
    }

    async fn sync_progress(
        &self,
        request: &SyncRequest,
    ) -> Result<ProgressSnapshot, SubmissionError> {
        self.post("run/sync", request).await
    }
}

fn status_error(status: StatusCode, body: &str) -> SubmissionError {
    let message = error_message(body)
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| "request failed".to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SubmissionError::Unauthorized(message),
        _ => SubmissionError::Backend {
            status: status.as_u16(),
            message,
        },
    }
}

/// Server-provided error text: JSON `message`/`error` field, else the raw body.
fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str(body) {
        for key in ["message", "error"] {
            if let Some(serde_json::Value::String(text)) = map.get(key) {
                return Some(text.clone());
            }
        }
    }
    Some(truncate(body, 200).to_string())
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
