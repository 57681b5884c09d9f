use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-001";

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation request rejected: {0}")]
    InvalidRequest(String),
    #[error("generation credentials rejected: {0}")]
    Auth(String),
    #[error("generation rate limit exceeded: {0}")]
    RateLimited(String),
    #[error("generation provider error: {0}")]
    Provider(String),
    #[error("generation request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("generation response contained no text")]
    EmptyResponse,
    #[error("expected {expected} questions, got {actual}")]
    CountMismatch { expected: usize, actual: usize },
}

/// Text generation behind a trait so workflows can run against a canned
/// implementation in tests.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    fn model(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

fn extract_candidate_text(response: GenerateContentResponse) -> Option<String> {
    let text = response
        .candidates
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts)
        .map(|part| part.text)
        .collect::<Vec<_>>()
        .join("");
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn map_provider_error(status: StatusCode, body: &str) -> GenerationError {
    let detail: String = body.chars().take(200).collect();
    match status {
        StatusCode::BAD_REQUEST => GenerationError::InvalidRequest(detail),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GenerationError::Auth(detail),
        StatusCode::TOO_MANY_REQUESTS => GenerationError::RateLimited(detail),
        status if status.is_server_error() => {
            GenerationError::Provider(format!("{}: {}", status, detail))
        }
        status => GenerationError::Provider(format!("unexpected status {}: {}", status, detail)),
    }
}

/// Gemini client for question and feedback generation.
pub struct GeminiGenerator {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiGenerator {
    pub fn new(api_key: String, model: String) -> Self {
        GeminiGenerator {
            client: Client::new(),
            api_key,
            model,
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    /// Points the client at a proxy or regional endpoint.
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self.client.post(&url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_provider_error(status, &body));
        }

        let response: GenerateContentResponse = response.json().await?;
        extract_candidate_text(response).ok_or(GenerationError::EmptyResponse)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
