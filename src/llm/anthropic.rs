use reqwest::blocking::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::Settings;
use crate::llm::{Completion, UpstreamError};

const MESSAGES_PATH: &str = "/v1/messages";
const API_VERSION: &str = "2023-06-01";

/// Anthropic Messages API client.
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl AnthropicClient {
    pub fn from_settings(settings: &Settings) -> Result<Self, UpstreamError> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(UpstreamError::MissingApiKey)?;
        Ok(Self {
            client: Client::new(),
            api_key,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        })
    }
}

impl Completion for AnthropicClient {
    fn complete(&self, system_prompt: &str, user_message: &str) -> Result<String, UpstreamError> {
        let payload = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "system": system_prompt,
            "messages": [
                { "role": "user", "content": user_message }
            ]
        });
        debug!(
            model = %self.model,
            system_chars = system_prompt.len(),
            user_chars = user_message.len(),
            "sending completion request"
        );

        let response = self
            .client
            .post(format!("{}{}", self.base_url, MESSAGES_PATH))
            .header("x-api-key", self.api_key.as_str())
            .header("anthropic-version", API_VERSION)
            .json(&payload)
            .send()?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(UpstreamError::Status { status, body });
        }

        let value: Value = response.json()?;
        extract_text(&value)
    }
}

fn extract_text(value: &Value) -> Result<String, UpstreamError> {
    let first = value
        .get("content")
        .and_then(Value::as_array)
        .and_then(|blocks| blocks.first())
        .ok_or_else(|| UpstreamError::UnexpectedContent("response has no content blocks".to_string()))?;

    match first.get("type").and_then(Value::as_str) {
        Some("text") => {}
        other => {
            return Err(UpstreamError::UnexpectedContent(format!(
                "expected a text block, found {}",
                other.unwrap_or("untyped block")
            )))
        }
    }

    match first.get("text").and_then(Value::as_str) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(UpstreamError::UnexpectedContent("text block is empty".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client_for(server: &mockito::ServerGuard) -> AnthropicClient {
        let settings = Settings {
            api_key: Some("sk-test".to_string()),
            base_url: format!("{}/", server.url()),
            model: "claude-test".to_string(),
            ..Settings::default()
        };
        AnthropicClient::from_settings(&settings).unwrap()
    }

    #[test]
    fn requires_api_key() {
        let settings = Settings {
            api_key: Some("   ".to_string()),
            ..Settings::default()
        };
        assert!(matches!(
            AnthropicClient::from_settings(&settings),
            Err(UpstreamError::MissingApiKey)
        ));
    }

    #[test]
    fn returns_first_text_block() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "sk-test")
            .match_header("anthropic-version", API_VERSION)
            .match_body(Matcher::PartialJson(json!({
                "model": "claude-test",
                "system": "be terse",
                "messages": [{"role": "user", "content": "hello"}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"content": [{"type": "text", "text": "{\"ok\": true}"}]}"#)
            .create();

        let text = client_for(&server).complete("be terse", "hello").unwrap();
        assert_eq!(text, r#"{"ok": true}"#);
        mock.assert();
    }

    #[test]
    fn surfaces_http_failures() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/v1/messages")
            .with_status(529)
            .with_body("overloaded")
            .create();

        let err = client_for(&server).complete("s", "u").unwrap_err();
        match err {
            UpstreamError::Status { status, body } => {
                assert_eq!(status, 529);
                assert_eq!(body, "overloaded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_text_content_is_a_hard_failure() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"content": [{"type": "tool_use", "name": "x"}]}"#)
            .create();

        let err = client_for(&server).complete("s", "u").unwrap_err();
        assert!(matches!(err, UpstreamError::UnexpectedContent(_)));
    }

    #[test]
    fn empty_text_is_rejected() {
        assert!(extract_text(&json!({"content": [{"type": "text", "text": ""}]})).is_err());
        assert!(extract_text(&json!({"content": []})).is_err());
    }
}
