//! Gemini-backed task generation.
//!
//! Turns a natural-language request into a structured task list via the
//! `generateContent` REST endpoint. The model is asked for a JSON array of
//! `{title, duration}` objects, but models wrap arrays in markdown fences
//! and sometimes answer in prose, so parsing degrades gracefully down to
//! line splitting.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::TaskGenError;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const SYSTEM_PROMPT: &str = "You are a professional task list organizer. Based on the user's request, break down the task into a logical series of steps. Return a JSON array of objects with 'title' and 'duration' fields. Example: [{\"title\":\"Task 1\",\"duration\":\"30 mins\"},{\"title\":\"Task 2\",\"duration\":\"1 hour\"}]";

/// One generated task suggestion.
///
/// `duration` is advisory text from the model ("30 mins", "1 hour"); it is
/// shown to the user, never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedTask {
    pub title: String,
    #[serde(default = "default_duration")]
    pub duration: String,
}

fn default_duration() -> String {
    "N/A".into()
}

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    http_client: Client,
}

impl GeminiClient {
    /// Build a client from the GEMINI_API_KEY environment variable.
    ///
    /// # Errors
    /// Returns `MissingApiKey` when the variable is unset or empty.
    pub fn from_env(model: impl Into<String>) -> Result<Self, TaskGenError> {
        let api_key = std::env::var("GEMINI_API_KEY").unwrap_or_default();
        if api_key.is_empty() {
            return Err(TaskGenError::MissingApiKey);
        }
        Ok(Self::new(api_key, model))
    }

    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            http_client: Client::new(),
        }
    }

    /// Point the client at a different host (tests use a local mock).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Generate a structured task list for a natural-language request.
    pub async fn generate_tasks(&self, prompt: &str) -> Result<Vec<GeneratedTask>, TaskGenError> {
        let url = format!(
            "{}/v1/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let body = json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [{ "text": format!("{SYSTEM_PROMPT}\n\nUser request: {prompt}") }]
                }
            ],
            "generationConfig": {
                "temperature": 0.7,
                "topK": 40,
                "topP": 0.95,
                "maxOutputTokens": 1024,
            }
        });

        let resp = self.http_client.post(&url).json(&body).send().await?;
        let status = resp.status();
        let data: serde_json::Value = resp.json().await?;

        if !status.is_success() {
            let message = data
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .unwrap_or("external API call failed");
            return Err(TaskGenError::Api(message.to_string()));
        }

        let text = data["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .filter(|t| !t.trim().is_empty())
            .ok_or(TaskGenError::EmptyResponse)?;

        Ok(parse_task_list(text))
    }
}

/// Parse the model's text into tasks.
///
/// Strict first: the first `[` through the last `]` as a JSON array, then
/// the whole text. If neither parses, up to five line-split tasks.
fn parse_task_list(text: &str) -> Vec<GeneratedTask> {
    if let Some(raw) = extract_json_array(text) {
        if let Ok(tasks) = serde_json::from_str::<Vec<GeneratedTask>>(raw) {
            return tasks;
        }
    }
    if let Ok(tasks) = serde_json::from_str::<Vec<GeneratedTask>>(text) {
        return tasks;
    }

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(5)
        .map(|line| GeneratedTask {
            title: strip_list_prefix(line).to_string(),
            duration: "N/A".into(),
        })
        .collect()
}

fn extract_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Drop a leading "1. " and/or "- " / "* " list marker.
fn strip_list_prefix(line: &str) -> &str {
    let mut s = line;
    let digits = s.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        if let Some(rest) = s[digits..].strip_prefix('.') {
            s = rest.trim_start();
        }
    }
    if let Some(rest) = s.strip_prefix(['-', '*']) {
        s = rest.trim_start();
    }
    s
}
