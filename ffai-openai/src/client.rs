use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::{OpenAiConfig, Provider};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("no API key for {provider}; set {var} or FFAI_API_KEY")]
    MissingApiKey { provider: Provider, var: &'static str },
    #[error("provider '{0}' requires base_url to be set")]
    MissingBaseUrl(Provider),
    #[error("unknown provider '{0}' (expected openai, openrouter, groq, ollama or custom)")]
    UnknownProvider(String),
    #[error("authentication failed ({status}): {message}")]
    Auth { status: u16, message: String },
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("unexpected response: {0}")]
    Response(String),
}

#[derive(Debug)]
pub struct ChatGptClient {
    provider: Provider,
    api_key: Option<String>,
    default_model: String,
    chat_endpoint: String,
}

impl ChatGptClient {
    pub fn try_from_config(config: &OpenAiConfig) -> Result<Self, ClientError> {
        let provider = config.provider();
        if provider.requires_key() && config.api_key().is_none() {
            return Err(ClientError::MissingApiKey {
                provider,
                var: provider.key_var().unwrap_or("FFAI_API_KEY"),
            });
        }
        let chat_endpoint = config
            .chat_endpoint()
            .ok_or(ClientError::MissingBaseUrl(provider))?;

        let client = Self {
            provider,
            api_key: config.api_key().map(str::to_string),
            default_model: config.default_model().to_string(),
            chat_endpoint,
        };

        let _ = client.build_client()?;
        Ok(client)
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Send one user message with an optional system message and return the reply text.
    pub fn generate(
        &self,
        prompt: &str,
        system_message: Option<&str>,
        model: Option<&str>,
    ) -> Result<String, ClientError> {
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            tokio::task::block_in_place(move || {
                handle.block_on(self.generate_inner(prompt, system_message, model))
            })
        } else {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| ClientError::Response(format!("failed to start runtime: {e}")))?;
            runtime.block_on(self.generate_inner(prompt, system_message, model))
        }
    }

    async fn generate_inner(
        &self,
        prompt: &str,
        system_message: Option<&str>,
        model: Option<&str>,
    ) -> Result<String, ClientError> {
        let messages = Self::build_messages(prompt, system_message);
        let builder = self.request_builder_from_messages(messages, model)?;

        let res = builder.send().await?;
        let status = res.status();
        let data: Value = res.json().await.unwrap_or(Value::Null);
        debug!("res: {} {:?}", status, data);

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ClientError::Auth {
                status: status.as_u16(),
                message: error_message(&data),
            });
        }
        if !status.is_success() {
            return Err(ClientError::Response(format!(
                "{status}: {}",
                error_message(&data)
            )));
        }
        extract_content(&data)
    }

    fn build_client(&self) -> Result<Client, ClientError> {
        let client = Client::builder().timeout(CONNECT_TIMEOUT).build()?;
        Ok(client)
    }

    fn request_builder_from_messages(
        &self,
        messages: Vec<Value>,
        model: Option<&str>,
    ) -> Result<RequestBuilder, ClientError> {
        let selected_model = model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(&self.default_model);

        let body = json!({
            "model": selected_model,
            "messages": messages,
        });

        debug!("req: {} {:?}", self.chat_endpoint, body);

        let mut builder = self.build_client()?.post(&self.chat_endpoint).json(&body);
        if let Some(api_key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {api_key}"));
        }
        Ok(builder)
    }

    fn build_messages(content: &str, system_message: Option<&str>) -> Vec<Value> {
        let mut messages = Vec::new();
        if let Some(system) = system_message
            && !system.trim().is_empty()
        {
            messages.push(json!({ "role": "system", "content": system.trim() }));
        }
        messages.push(json!({ "role": "user", "content": content }));
        messages
    }
}

fn extract_content(data: &Value) -> Result<String, ClientError> {
    data["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ClientError::Response(format!("no message content in {data}")))
}

fn error_message(data: &Value) -> String {
    data["error"]["message"]
        .as_str()
        .or_else(|| data["error"].as_str())
        .map(str::to_string)
        .unwrap_or_else(|| "no error details".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_reported_with_variable() {
        let cfg = OpenAiConfig::new(Provider::OpenRouter, None, None, None);
        let err = ChatGptClient::try_from_config(&cfg).unwrap_err();
        assert!(matches!(
            err,
            ClientError::MissingApiKey {
                var: "OPENROUTER_API_KEY",
                ..
            }
        ));
        assert!(err.to_string().contains("OPENROUTER_API_KEY"));
    }

    #[test]
    fn local_provider_needs_no_key() {
        let cfg = OpenAiConfig::new(Provider::Ollama, None, None, Some("qwen2.5".to_string()));
        let client = ChatGptClient::try_from_config(&cfg).unwrap();
        assert_eq!(client.default_model(), "qwen2.5");
        assert_eq!(client.chat_endpoint, "http://localhost:11434/v1/chat/completions");
    }

    #[test]
    fn custom_provider_requires_base_url() {
        let cfg = OpenAiConfig::new(Provider::Custom, Some("k".to_string()), None, None);
        assert!(matches!(
            ChatGptClient::try_from_config(&cfg),
            Err(ClientError::MissingBaseUrl(Provider::Custom))
        ));
    }

    #[test]
    fn system_message_precedes_user_message() {
        let messages = ChatGptClient::build_messages("trim a.mp4", Some("  be brief  "));
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[0]["content"], "be brief");
        assert_eq!(messages[1]["content"], "trim a.mp4");

        let messages = ChatGptClient::build_messages("x", Some(" "));
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn content_is_extracted_from_first_choice() {
        let data = json!({
            "choices": [{ "message": { "role": "assistant", "content": "ffmpeg -i a.mp4 a.gif" } }]
        });
        assert_eq!(extract_content(&data).unwrap(), "ffmpeg -i a.mp4 a.gif");
        assert!(matches!(
            extract_content(&json!({ "choices": [] })),
            Err(ClientError::Response(_))
        ));
    }

    #[test]
    fn error_message_reads_nested_or_flat_errors() {
        assert_eq!(
            error_message(&json!({ "error": { "message": "bad key" } })),
            "bad key"
        );
        assert_eq!(error_message(&json!({ "error": "quota" })), "quota");
        assert_eq!(error_message(&Value::Null), "no error details");
    }
}
