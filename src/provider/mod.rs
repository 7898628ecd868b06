pub mod anthropic;
pub mod openai;

use std::future::Future;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::ProviderError;

const MAX_RAW_MESSAGE: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Anthropic,
    #[serde(alias = "open_ai")]
    #[value(name = "openai")]
    OpenAi,
}

impl ProviderKind {
    pub fn label(self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "Anthropic Claude",
            ProviderKind::OpenAi => "OpenAI GPT",
        }
    }

    fn name(self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "Anthropic",
            ProviderKind::OpenAi => "OpenAI",
        }
    }
}

/// The one external call the correction cycle makes: prompt in, raw text
/// out.
pub trait Completer {
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String, ProviderError>>;
}

pub struct ProviderClient {
    kind: ProviderKind,
    api_key: String,
    model: String,
    http: reqwest::Client,
}

impl ProviderClient {
    pub fn new(
        kind: ProviderKind,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ProviderError::Http {
                provider: kind.name(),
                source,
            })?;
        Ok(ProviderClient {
            kind,
            api_key,
            model,
            http,
        })
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }
}

impl Completer for ProviderClient {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let provider = self.kind.name();
        let request = match self.kind {
            ProviderKind::Anthropic => self
                .http
                .post(anthropic::MESSAGES_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", anthropic::API_VERSION)
                .json(&anthropic::request_body(&self.model, prompt)),
            ProviderKind::OpenAi => self
                .http
                .post(openai::CHAT_URL)
                .bearer_auth(&self.api_key)
                .json(&openai::request_body(&self.model, prompt)),
        };

        let start = Instant::now();
        info!("Sending {} request ({}, {} prompt chars)", provider, self.model, prompt.len());
        let response = request
            .send()
            .await
            .map_err(|source| ProviderError::Http { provider, source })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| ProviderError::Http { provider, source })?;
        let text = interpret(self.kind, status, &body)?;

        info!(
            "{} answered in {:.1}s ({} chars)",
            provider,
            start.elapsed().as_secs_f64(),
            text.len()
        );
        Ok(text)
    }
}

/// Turn a status and raw body into the answer text or a typed failure.
/// Failure bodies need not be JSON: gateways answer with HTML or plain text.
fn interpret(kind: ProviderKind, status: StatusCode, body: &str) -> Result<String, ProviderError> {
    let provider = kind.name();
    if !status.is_success() {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| error_message(&v))
            .unwrap_or_else(|| raw_message(status, body));
        warn!("{} returned {}: {}", provider, status, message);
        return Err(ProviderError::Api {
            provider,
            status: status.as_u16(),
            message,
        });
    }

    let body: Value =
        serde_json::from_str(body).map_err(|source| ProviderError::Decode { provider, source })?;
    match kind {
        ProviderKind::Anthropic => anthropic::response_text(&body),
        ProviderKind::OpenAi => openai::response_text(&body),
    }
    .ok_or(ProviderError::EmptyResponse { provider })
}

/// Both providers report failures as `{"error": {"message": ...}}`.
fn error_message(body: &Value) -> Option<String> {
    body.get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

fn raw_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return status.canonical_reason().unwrap_or("no response body").to_string();
    }
    if body.chars().count() <= MAX_RAW_MESSAGE {
        body.to_string()
    } else {
        let cut: String = body.chars().take(MAX_RAW_MESSAGE).collect();
        format!("{}...", cut)
    }
}
