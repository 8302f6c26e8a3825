use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value as JsonValue};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult, InsightErrorCode};
use crate::models::insight::{EmployeeScore, EmployeeSkillGap, Recommendation};
use crate::services::prompt_templates::{
    assignment_prompt, skill_gap_prompt, team_productivity_prompt,
};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY_MS: u64 = 250;

/// Injected configuration for the summary provider. Leaving `api_key` unset
/// disables summaries entirely; numeric results are unaffected.
#[derive(Debug, Clone)]
pub struct InsightConfig {
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub model: String,
    pub http_timeout: StdDuration,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            http_timeout: StdDuration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[async_trait]
pub trait InsightProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> AppResult<String>;
}

/// Gemini-backed provider speaking the generateContent REST surface.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    api_base_url: String,
    model: String,
}

impl GeminiProvider {
    pub fn try_new(config: &InsightConfig, api_key: String) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|err| {
                AppError::insight(
                    InsightErrorCode::Unknown,
                    format!("failed to build http client: {err}"),
                )
            })?;
        Ok(Self {
            client,
            api_key,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    fn map_request_error(err: reqwest::Error) -> AppError {
        if err.is_timeout() {
            AppError::insight(InsightErrorCode::HttpTimeout, "insight request timed out")
        } else {
            AppError::insight(
                InsightErrorCode::ProviderUnavailable,
                format!("insight request failed: {err}"),
            )
        }
    }

    fn map_http_status(status: StatusCode) -> AppError {
        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                AppError::insight(InsightErrorCode::RateLimited, "insight provider rate limited")
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::insight(
                InsightErrorCode::MissingApiKey,
                "insight provider rejected the api key",
            ),
            status if status.is_server_error() => AppError::insight(
                InsightErrorCode::ProviderUnavailable,
                format!("insight provider returned {status}"),
            ),
            status => AppError::insight(
                InsightErrorCode::Unknown,
                format!("insight provider returned {status}"),
            ),
        }
    }

    fn extract_text(body: &JsonValue) -> AppResult<String> {
        let text = body
            .pointer("/candidates/0/content/parts")
            .and_then(JsonValue::as_array)
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|part| part.get("text").and_then(JsonValue::as_str))
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AppError::insight(
                InsightErrorCode::InvalidResponse,
                "insight response carried no text",
            ));
        }
        Ok(text.trim().to_string())
    }

    async fn invoke_once(&self, prompt: &str) -> AppResult<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base_url, self.model
        );
        let payload = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await
            .map_err(Self::map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::map_http_status(status));
        }

        let body: JsonValue = response.json().await.map_err(|err| {
            AppError::insight(
                InsightErrorCode::InvalidResponse,
                format!("insight response was not json: {err}"),
            )
        })?;
        Self::extract_text(&body)
    }
}

#[async_trait]
impl InsightProvider for GeminiProvider {
    /// Transient provider trouble gets a short backoff before giving up.
    async fn generate(&self, prompt: &str) -> AppResult<String> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.invoke_once(prompt).await {
                Ok(text) => return Ok(text),
                Err(err) if attempt < MAX_ATTEMPTS && is_retryable(&err) => {
                    debug!(
                        target: "app::insight",
                        attempt,
                        error = %err,
                        "retrying insight request"
                    );
                    sleep(StdDuration::from_millis(
                        RETRY_BASE_DELAY_MS * u64::from(attempt),
                    ))
                    .await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn is_retryable(err: &AppError) -> bool {
    matches!(
        err.insight_code(),
        Some(
            InsightErrorCode::HttpTimeout
                | InsightErrorCode::RateLimited
                | InsightErrorCode::ProviderUnavailable
        )
    )
}

/// Best-effort natural-language layer over the numeric reports. Every public
/// operation returns `None` instead of an error: an unconfigured provider, a
/// network failure or a malformed response must never block the numbers.
pub struct InsightService {
    provider: Option<Arc<dyn InsightProvider>>,
}

impl InsightService {
    pub fn new(config: InsightConfig) -> AppResult<Self> {
        let provider = match &config.api_key {
            Some(api_key) => Some(
                Arc::new(GeminiProvider::try_new(&config, api_key.clone())?)
                    as Arc<dyn InsightProvider>,
            ),
            None => {
                debug!(target: "app::insight", "no api key configured, summaries disabled");
                None
            }
        };
        Ok(Self { provider })
    }

    /// Test seam and extension point for alternative providers.
    pub fn with_provider(provider: Arc<dyn InsightProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    pub fn disabled() -> Self {
        Self { provider: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn team_productivity_summary(&self, rows: &[EmployeeScore]) -> Option<String> {
        self.generate(team_productivity_prompt(rows)).await
    }

    pub async fn skill_gap_summary(&self, rows: &[EmployeeSkillGap]) -> Option<String> {
        self.generate(skill_gap_prompt(rows)).await
    }

    pub async fn assignment_summary(
        &self,
        title: &str,
        recommendations: &[Recommendation],
    ) -> Option<String> {
        self.generate(assignment_prompt(title, recommendations)).await
    }

    async fn generate(&self, prompt: String) -> Option<String> {
        let provider = self.provider.as_ref()?;
        match provider.generate(&prompt).await {
            Ok(text) => Some(text),
            Err(err) => {
                warn!(
                    target: "app::insight",
                    error = %err,
                    "summary generation failed, returning numeric results only"
                );
                None
            }
        }
    }
}
