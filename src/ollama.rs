use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::config::OllamaConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    #[error("request timed out: {detail}")]
    Timeout { detail: String },
    #[error("could not reach the model server: {detail}")]
    Transport { detail: String },
    #[error("HTTP {code}: {}", snippet(.body))]
    Status { code: u16, body: String },
    #[error("reply has no `response` field")]
    MissingResponse,
    #[error("reply is not valid JSON: {detail}")]
    Decode { detail: String },
    #[error("could not build HTTP client: {detail}")]
    Client { detail: String },
}

impl InferenceError {
    fn from_send(err: reqwest::Error) -> Self {
        let detail = describe(&err);
        if err.is_timeout() {
            InferenceError::Timeout { detail }
        } else {
            InferenceError::Transport { detail }
        }
    }
}

/// Error chain of a reqwest failure on one line. reqwest's own Display stops
/// at the outermost layer, which hides "connection refused" and friends.
fn describe(err: &(dyn std::error::Error + 'static)) -> String {
    let mut detail = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !detail.contains(&text) {
            detail.push_str(": ");
            detail.push_str(&text);
        }
        source = cause.source();
    }
    detail
}

pub type CompletionResult = Result<String, InferenceError>;

/// Longest body excerpt carried by a [`InferenceError::Status`].
const BODY_SNIPPET_LEN: usize = 300;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Clone)]
pub struct OllamaClient {
    url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(config: &OllamaConfig) -> Result<Self, InferenceError> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs));
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let client = builder.build().map_err(|e| InferenceError::Client {
            detail: describe(&e),
        })?;

        Ok(OllamaClient {
            url: config.url.clone(),
            model: config.model.clone(),
            client,
        })
    }

    pub fn get_model(&self) -> &str {
        &self.model
    }

    pub async fn complete(&self, prompt: &str) -> CompletionResult {
        self.complete_with_model(prompt, &self.model).await
    }

    /// One non-streaming generate call. No retries.
    pub async fn complete_with_model(&self, prompt: &str, model: &str) -> CompletionResult {
        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
        };

        tracing::info!(url = %self.url, model, prompt_len = prompt.len(), "sending generate request");

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(InferenceError::from_send)?;

        let status = response.status();
        let body = response.text().await.map_err(InferenceError::from_send)?;

        if status != reqwest::StatusCode::OK {
            tracing::warn!(%status, "generate request failed");
            return Err(InferenceError::Status {
                code: status.as_u16(),
                body,
            });
        }

        let reply = extract_response(&body)?;
        tracing::info!(reply_len = reply.len(), "generate request completed");
        Ok(reply)
    }
}

/// Pulls the `response` string out of a generate reply body.
pub fn extract_response(body: &str) -> CompletionResult {
    let value: Value = serde_json::from_str(body).map_err(|e| InferenceError::Decode {
        detail: e.to_string(),
    })?;

    value
        .get("response")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or(InferenceError::MissingResponse)
}

fn snippet(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(BODY_SNIPPET_LEN) {
        Some((cut, _)) => format!("{}…", &body[..cut]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_matches_generate_api() {
        let body = serde_json::to_value(GenerateRequest {
            model: "qwen2.5-coder:3b",
            prompt: "2+2?",
            stream: false,
        })
        .unwrap();

        assert_eq!(
            body,
            serde_json::json!({"model": "qwen2.5-coder:3b", "prompt": "2+2?", "stream": false})
        );
    }

    #[test]
    fn extracts_response_field() {
        assert_eq!(extract_response(r#"{"response":"4","done":true}"#), Ok("4".to_string()));
    }

    #[test]
    fn missing_or_non_string_response_is_an_error() {
        assert_eq!(extract_response(r#"{"done":true}"#), Err(InferenceError::MissingResponse));
        assert_eq!(extract_response(r#"{"response":null}"#), Err(InferenceError::MissingResponse));
        assert!(matches!(extract_response("not json"), Err(InferenceError::Decode { .. })));
    }

    #[test]
    fn status_error_keeps_raw_body_but_displays_a_snippet() {
        let err = InferenceError::Status {
            code: 500,
            body: "y".repeat(1000),
        };
        let InferenceError::Status { body, .. } = &err else {
            unreachable!()
        };
        assert_eq!(body.len(), 1000);
        assert!(err.to_string().starts_with("HTTP 500: yyy"));
        assert!(err.to_string().len() < 400);
    }

    #[test]
    fn long_bodies_are_cut() {
        let body = "x".repeat(1000);
        let cut = snippet(&body);
        assert_eq!(cut.chars().count(), BODY_SNIPPET_LEN + 1);
        assert_eq!(snippet("  short  "), "short");
    }
}
