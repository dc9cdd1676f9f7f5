use crate::config::LlmConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("missing gateway url")]
    MissingGateway,
    #[error("http error: {0}")]
    Http(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// One block of a chat message. Image parts carry the data URI untouched;
/// the gateway resolves them.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    Image { url: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct LlmMessage {
    pub role: String,
    pub content: Vec<ContentPart>,
}

impl LlmMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: vec![ContentPart::Text {
                text: content.into(),
            }],
        }
    }

    pub fn user(content: Vec<ContentPart>) -> Self {
        Self {
            role: "user".into(),
            content,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    #[allow(dead_code)]
    #[serde(default)]
    pub usage: Option<LlmUsage>,
}

#[allow(dead_code)]
#[derive(Debug, Deserialize)]
pub struct LlmUsage {
    pub input_tokens: Option<u32>,
    pub output_tokens: Option<u32>,
}

pub struct LlmClient {
    http: Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(http: Client, config: LlmConfig) -> Self {
        Self { http, config }
    }

    pub async fn chat(
        &self,
        messages: &[LlmMessage],
        max_tokens: Option<u32>,
    ) -> Result<LlmResponse, LlmError> {
        let gateway = self.config.gateway_url.trim();
        if gateway.is_empty() {
            return Err(LlmError::MissingGateway);
        }

        let function_name = self
            .config
            .function_name
            .as_deref()
            .unwrap_or("listing_copy");

        let body = ChatRequest {
            function_name: function_name.to_string(),
            model_name: self.config.model.clone(),
            max_tokens,
            input: ChatInput {
                messages: messages.to_vec(),
            },
        };

        let mut request = self.http.post(format!("{gateway}/inference")).json(&body);

        if let Some(key) = &self.config.api_key {
            request = request.header("X-API-Key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|err| LlmError::Http(err.to_string()))?;

        if !response.status().is_success() {
            return Err(LlmError::Http(format!("HTTP {}", response.status())));
        }

        let payload: GatewayResponse = response
            .json()
            .await
            .map_err(|err| LlmError::InvalidResponse(err.to_string()))?;

        let text = payload
            .content
            .into_iter()
            .find(|item| item.r#type == "text")
            .map(|item| item.text)
            .ok_or_else(|| LlmError::InvalidResponse("missing text".into()))?;

        Ok(LlmResponse {
            text,
            usage: payload.usage,
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    function_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    model_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    input: ChatInput,
}

#[derive(Debug, Serialize)]
struct ChatInput {
    messages: Vec<LlmMessage>,
}

#[derive(Debug, Deserialize)]
struct GatewayResponse {
    content: Vec<ResponseContent>,
    #[serde(default)]
    usage: Option<LlmUsage>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    r#type: String,
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(gateway: &str) -> LlmConfig {
        LlmConfig {
            gateway_url: gateway.to_string(),
            api_key: None,
            function_name: None,
            model: None,
        }
    }

    #[tokio::test]
    async fn chat_returns_first_text_block() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/inference"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": "Generated copy"}]
            })))
            .mount(&server)
            .await;

        let client = LlmClient::new(Client::new(), config(&server.uri()));
        let response = client
            .chat(&[LlmMessage::system("sys")], Some(500))
            .await
            .expect("chat ok");
        assert_eq!(response.text, "Generated copy");
    }

    #[tokio::test]
    async fn chat_surfaces_http_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/inference"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = LlmClient::new(Client::new(), config(&server.uri()));
        let err = client
            .chat(&[LlmMessage::system("sys")], None)
            .await
            .expect_err("rate limited");
        assert!(matches!(err, LlmError::Http(_)));
    }

    #[tokio::test]
    async fn blank_gateway_fails_without_request() {
        let client = LlmClient::new(Client::new(), config("  "));
        let err = client
            .chat(&[LlmMessage::system("sys")], None)
            .await
            .expect_err("no gateway");
        assert!(matches!(err, LlmError::MissingGateway));
    }

    #[test]
    fn image_parts_serialize_with_type_tag() {
        let message = LlmMessage::user(vec![
            ContentPart::Text {
                text: "describe".into(),
            },
            ContentPart::Image {
                url: "data:image/png;base64,AAAA".into(),
            },
        ]);
        let value = serde_json::to_value(&message).expect("serializable");
        assert_eq!(value["content"][0]["type"], json!("text"));
        assert_eq!(value["content"][1]["type"], json!("image"));
        assert_eq!(value["content"][1]["url"], json!("data:image/png;base64,AAAA"));
    }
}
