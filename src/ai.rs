// src/ai.rs
//! AI provider abstraction. One trait, three implementations: the real
//! OpenAI chat-completions provider, a disabled client (no key / opted out),
//! and a deterministic mock for tests (`AI_TEST_MODE=mock`).
//!
//! Callers always treat a `None` as "plan without AI" — a provider failure is
//! never an error, it just narrows the pipeline to its heuristic stage.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::net;

/// A single chat completion: system prompt + user content in, raw text out.
pub trait AiClient: Send + Sync {
    fn complete<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>>;
    /// Provider name for diagnostics/headers.
    fn provider_name(&self) -> &'static str;
}

pub type DynAiClient = Arc<dyn AiClient>;

/// Factory honoring the environment:
/// * `AI_TEST_MODE=mock` wins and returns the fixed mock client;
/// * otherwise an `OPENAI_API_KEY` enables the real provider;
/// * otherwise planning runs heuristics-only via the disabled client.
pub fn build_ai_client() -> DynAiClient {
    if std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Arc::new(MockClient::default());
    }
    let key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
    if key.is_empty() {
        return Arc::new(DisabledClient);
    }
    Arc::new(OpenAiClient::new(key, None))
}

/// OpenAI Chat Completions provider.
pub struct OpenAiClient {
    api_key: String,
    model: String,
}

impl OpenAiClient {
    /// `model_override`: pass Some("gpt-4o") to override; defaults to gpt-4o-mini.
    pub fn new(api_key: String, model_override: Option<&str>) -> Self {
        Self {
            api_key,
            model: model_override.unwrap_or("gpt-4o-mini").to_string(),
        }
    }
}

impl AiClient for OpenAiClient {
    fn complete<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>> {
        Box::pin(async move {
            if self.api_key.is_empty() {
                return None;
            }

            #[derive(Serialize)]
            struct Msg<'a> {
                role: &'a str,
                content: &'a str,
            }
            #[derive(Serialize)]
            struct Req<'a> {
                model: &'a str,
                messages: Vec<Msg<'a>>,
                temperature: f32,
                max_tokens: u32,
            }
            #[derive(Deserialize)]
            struct Resp {
                choices: Vec<Choice>,
            }
            #[derive(Deserialize)]
            struct Choice {
                message: ChoiceMsg,
            }
            #[derive(Deserialize)]
            struct ChoiceMsg {
                content: String,
            }

            // Low temperature: the callers expect schema-following JSON.
            let req = Req {
                model: &self.model,
                messages: vec![
                    Msg {
                        role: "system",
                        content: system,
                    },
                    Msg {
                        role: "user",
                        content: user,
                    },
                ],
                temperature: 0.2,
                max_tokens: 600,
            };

            let resp = net::client()
                .post("https://api.openai.com/v1/chat/completions")
                .bearer_auth(&self.api_key)
                .json(&req)
                .send()
                .await
                .ok()?;
            if !resp.status().is_success() {
                return None;
            }
            let body: Resp = resp.json().await.ok()?;
            let content = body
                .choices
                .first()
                .map(|c| c.message.content.trim())
                .unwrap_or("");
            if content.is_empty() {
                None
            } else {
                Some(content.to_string())
            }
        })
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

/// Returns `None` always; used when AI is unavailable.
pub struct DisabledClient;

impl AiClient for DisabledClient {
    fn complete<'a>(
        &'a self,
        _system: &'a str,
        _user: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>> {
        Box::pin(async { None })
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Deterministic mock for tests and local runs. Returns the fixed payload,
/// or `None` when constructed with `MockClient::silent()`.
#[derive(Clone, Default)]
pub struct MockClient {
    pub fixed: Option<String>,
}

impl MockClient {
    pub fn with_payload(payload: &str) -> Self {
        Self {
            fixed: Some(payload.to_string()),
        }
    }
    pub fn silent() -> Self {
        Self { fixed: None }
    }
}

impl AiClient for MockClient {
    fn complete<'a>(
        &'a self,
        _system: &'a str,
        _user: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>> {
        let out = self.fixed.clone();
        Box::pin(async move { out })
    }
    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
