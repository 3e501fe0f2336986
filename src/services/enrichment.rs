use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Message returned by "answer question" whenever the provider is not used
pub const FALLBACK_ANSWER: &str = "I'm sorry, I can't answer questions about the menu right now. \
     Please ask a member of our staff and they will be happy to help.";

const DESCRIPTION_SYSTEM_PROMPT: &str = "You are a culinary copywriter for a restaurant. \
     Rewrite dish descriptions so they are appetizing and accurate. \
     Never invent ingredients. Answer with the description only, at most two sentences.";

const ANSWER_SYSTEM_PROMPT: &str = "You are a friendly restaurant assistant. \
     Answer the customer's question using only the menu information provided. \
     If the menu information does not answer the question, say so briefly.";

/// Provider call failures; absorbed inside the client, never returned to callers
#[derive(Debug, Error)]
enum EnrichmentError {
    #[error("request timed out")]
    Timeout,

    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("provider returned status {0}")]
    ApiError(StatusCode),

    #[error("invalid response format: {0}")]
    InvalidResponse(String),
}

/// Terminal state of one enrichment call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentOutcome {
    /// No credential configured; no request was made
    ShortCircuit,
    Success,
    Timeout,
    Error,
}

/// Value produced by an enrichment call plus how it was obtained
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentResult<T> {
    pub outcome: EnrichmentOutcome,
    pub value: T,
    pub fallback_used: bool,
}

impl<T> EnrichmentResult<T> {
    fn success(value: T) -> Self {
        Self {
            outcome: EnrichmentOutcome::Success,
            value,
            fallback_used: false,
        }
    }

    fn fallback(outcome: EnrichmentOutcome, value: T) -> Self {
        Self {
            outcome,
            value,
            fallback_used: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerSource {
    Ai,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub source: AnswerSource,
}

impl Answer {
    fn fallback() -> Self {
        Self {
            text: FALLBACK_ANSWER.to_string(),
            source: AnswerSource::Fallback,
        }
    }
}

/// Provider configuration
#[derive(Debug, Clone)]
pub struct EnrichmentConfig {
    /// `None` or empty disables every provider call
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 300,
            temperature: 0.7,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat completion API
///
/// Every operation returns an [`EnrichmentResult`]; provider failures are
/// logged and degrade to the original text or [`FALLBACK_ANSWER`].
pub struct EnrichmentClient {
    config: EnrichmentConfig,
    client: Client,
}

impl EnrichmentClient {
    pub fn new(config: EnrichmentConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key().is_some()
    }

    fn api_key(&self) -> Option<&str> {
        self.config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Rewrite a dish description; falls back to `description` unchanged
    pub async fn enhance_description(
        &self,
        name: &str,
        description: &str,
        ingredients: &[String],
    ) -> EnrichmentResult<String> {
        let Some(api_key) = self.api_key() else {
            return EnrichmentResult::fallback(EnrichmentOutcome::ShortCircuit, description.to_string());
        };

        let prompt = format!(
            "Dish: {}\nIngredients: {}\nCurrent description: {}\n\nWrite an improved menu description.",
            name,
            if ingredients.is_empty() {
                "not listed".to_string()
            } else {
                ingredients.join(", ")
            },
            description
        );

        match self.complete(api_key, DESCRIPTION_SYSTEM_PROMPT, &prompt).await {
            Ok(text) => EnrichmentResult::success(text),
            Err(e) => {
                tracing::warn!("Description enhancement for '{}' failed: {}", name, e);
                EnrichmentResult::fallback(outcome_for(&e), description.to_string())
            }
        }
    }

    /// Answer a free-form question from a menu context summary
    pub async fn answer_question(&self, question: &str, context: &str) -> EnrichmentResult<Answer> {
        let Some(api_key) = self.api_key() else {
            return EnrichmentResult::fallback(EnrichmentOutcome::ShortCircuit, Answer::fallback());
        };

        let prompt = format!("Menu information:\n{}\n\nCustomer question: {}", context, question);

        match self.complete(api_key, ANSWER_SYSTEM_PROMPT, &prompt).await {
            Ok(text) => EnrichmentResult::success(Answer {
                text,
                source: AnswerSource::Ai,
            }),
            Err(e) => {
                tracing::warn!("Question answering failed: {}", e);
                EnrichmentResult::fallback(outcome_for(&e), Answer::fallback())
            }
        }
    }

    async fn complete(&self, api_key: &str, system: &str, prompt: &str) -> Result<String, EnrichmentError> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));

        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        tracing::debug!("Sending enrichment request to {} (model {})", url, self.config.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(classify)?;

        if !response.status().is_success() {
            return Err(EnrichmentError::ApiError(response.status()));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EnrichmentError::Timeout
                } else {
                    EnrichmentError::InvalidResponse(e.to_string())
                }
            })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| EnrichmentError::InvalidResponse("empty completion".into()))
    }
}

fn classify(err: reqwest::Error) -> EnrichmentError {
    if err.is_timeout() {
        EnrichmentError::Timeout
    } else {
        EnrichmentError::RequestError(err)
    }
}

fn outcome_for(err: &EnrichmentError) -> EnrichmentOutcome {
    match err {
        EnrichmentError::Timeout => EnrichmentOutcome::Timeout,
        _ => EnrichmentOutcome::Error,
    }
}
