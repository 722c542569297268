//! Client for the external text-generation service (OpenAI Responses API).

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::OpenAiSettings;
use crate::http_client::http_client;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("no text service credential configured")]
    MissingCredential,
    #[error("request failed: {0}")]
    Transport(String),
    #[error("http {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("text service returned no text")]
    EmptyResponse,
}

/// Turns a prompt into text. Implemented by the live client and by test doubles.
#[cfg_attr(test, mockall::automock)]
pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> Result<String, ReportError>;
}

pub struct OpenAiClient {
    api_key: String,
    settings: OpenAiSettings,
}

impl OpenAiClient {
    pub fn new(settings: OpenAiSettings) -> Result<Self, ReportError> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ReportError::MissingCredential)?;
        Ok(Self { api_key, settings })
    }

    /// `None` when no credential is configured.
    pub fn from_settings(settings: &OpenAiSettings) -> Option<Self> {
        Self::new(settings.clone()).ok()
    }

    fn endpoint(&self) -> String {
        format!("{}/responses", self.settings.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsesBody {
    #[serde(default)]
    output: Vec<OutputItem>,
    #[serde(default)]
    output_text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Debug, Default, Deserialize)]
struct ContentPart {
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl TextGenerator for OpenAiClient {
    fn generate(&self, prompt: &str) -> Result<String, ReportError> {
        let client = http_client(self.settings.timeout)
            .map_err(|err| ReportError::Transport(format!("{err:#}")))?;
        let url = self.endpoint();
        debug!(%url, model = %self.settings.model, "requesting team report");

        let resp = client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
            .json(&ResponsesRequest {
                model: &self.settings.model,
                input: prompt,
            })
            .send()
            .map_err(|err| ReportError::Transport(err.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .map_err(|err| ReportError::Transport(err.to_string()))?;
        if !status.is_success() {
            return Err(ReportError::Status {
                status: status.as_u16(),
                body,
            });
        }
        extract_output_text(&body)
    }
}

/// First output text in a Responses API body.
pub fn extract_output_text(raw: &str) -> Result<String, ReportError> {
    let body = serde_json::from_str::<ResponsesBody>(raw.trim())
        .map_err(|err| ReportError::Decode(err.to_string()))?;
    let text = body
        .output
        .iter()
        .flat_map(|item| item.content.iter())
        .filter(|part| part.kind.is_empty() || part.kind == "output_text")
        .find_map(|part| part.text.as_deref())
        .or(body.output_text.as_deref())
        .map(str::trim)
        .unwrap_or_default();
    if text.is_empty() {
        return Err(ReportError::EmptyResponse);
    }
    Ok(text.to_string())
}
