//! Client for the Gemini `generateContent` endpoint, behind the `LlmClient`
//! trait so the chat route can run against a mock.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::GeminiConfig;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("AI assistant is not configured")]
    NotConfigured,

    #[error("Cannot reach Gemini at {0}")]
    Connection(String),

    #[error("Gemini request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Gemini returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Failed to parse Gemini response: {0}")]
    ResponseParsing(String),

    #[error("Gemini returned no candidates")]
    EmptyResponse,
}

/// Upstream conversation roles. Gemini calls the assistant `model`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Model,
            text: text.into(),
        }
    }
}

/// Text generation abstraction (allows mocking).
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a reply to `contents` (oldest first, ending with the user's message).
    async fn generate(&self, system: &str, contents: &[ChatTurn]) -> Result<String, LlmError>;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct SystemInstruction<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: TurnRole,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    system_instruction: SystemInstruction<'a>,
    contents: Vec<Content<'a>>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

// ---------------------------------------------------------------------------
// Gemini HTTP client
// ---------------------------------------------------------------------------

pub struct GeminiClient {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl GeminiClient {
    /// Build a client from configuration. Fails with `NotConfigured` when no
    /// API key is set.
    pub fn from_config(config: &GeminiConfig) -> Result<Self, LlmError> {
        let api_key = config.api_key.clone().ok_or(LlmError::NotConfigured)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            client,
            timeout_secs: config.timeout_secs,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(&self, system: &str, contents: &[ChatTurn]) -> Result<String, LlmError> {
        let body = GenerateRequest {
            system_instruction: SystemInstruction {
                parts: vec![Part { text: system }],
            },
            contents: contents
                .iter()
                .map(|turn| Content {
                    role: turn.role,
                    parts: vec![Part { text: &turn.text }],
                })
                .collect(),
        };

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    LlmError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    LlmError::Timeout(self.timeout_secs)
                } else {
                    LlmError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::ResponseParsing(e.to_string()))?;

        let candidate = parsed.candidates.into_iter().next().ok_or(LlmError::EmptyResponse)?;
        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(text)
    }
}

// ---------------------------------------------------------------------------
// Mock
// ---------------------------------------------------------------------------

/// Mock LLM client for testing: returns a fixed reply (or failure) and
/// records the last request it saw.
pub struct MockLlmClient {
    reply: Option<String>,
    last_request: Mutex<Option<(String, Vec<ChatTurn>)>>,
}

impl MockLlmClient {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            last_request: Mutex::new(None),
        }
    }

    /// A client whose every call fails like an unreachable upstream.
    pub fn failing() -> Self {
        Self {
            reply: None,
            last_request: Mutex::new(None),
        }
    }

    /// System prompt and contents of the most recent call.
    pub fn last_request(&self) -> Option<(String, Vec<ChatTurn>)> {
        self.last_request.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn generate(&self, system: &str, contents: &[ChatTurn]) -> Result<String, LlmError> {
        if let Ok(mut guard) = self.last_request.lock() {
            *guard = Some((system.to_string(), contents.to_vec()));
        }
        self.reply
            .clone()
            .ok_or_else(|| LlmError::Connection("mock".to_string()))
    }
}
