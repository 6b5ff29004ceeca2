//! Chat model abstraction and the Gemini `generateContent` client.
//!
//! Role agents talk to the model through the [`ChatModel`] trait so the
//! workflow can run against scripted fakes in tests. The production
//! implementation targets the Google Generative Language API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::{CompanyPrepError, SecretValue};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// One declared tool the model may request a call to.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// A function call requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

/// A tool result fed back to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub name: String,
    pub response: Value,
}

/// One part of a conversation turn, mirroring the Gemini wire shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    FunctionCall {
        #[serde(rename = "functionCall")]
        function_call: FunctionCall,
    },
    FunctionResponse {
        #[serde(rename = "functionResponse")]
        function_response: FunctionResponse,
    },
}

/// One conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part::Text { text: text.into() }],
        }
    }

    /// Echo a model reply back into the history, keeping both the text
    /// and the function-call parts so no part of the turn is lost.
    pub fn model_reply(reply: &ChatReply) -> Self {
        let mut parts = Vec::new();
        if !reply.text.is_empty() {
            parts.push(Part::Text {
                text: reply.text.clone(),
            });
        }
        parts.extend(
            reply
                .calls
                .iter()
                .cloned()
                .map(|function_call| Part::FunctionCall { function_call }),
        );
        Self {
            role: "model".to_string(),
            parts,
        }
    }

    pub fn tool_responses(responses: Vec<FunctionResponse>) -> Self {
        Self {
            role: "user".to_string(),
            parts: responses
                .into_iter()
                .map(|function_response| Part::FunctionResponse { function_response })
                .collect(),
        }
    }
}

/// A single model invocation: system instructions, conversation so far, and
/// the tools the calling role is allowed to expose.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: String,
    pub contents: Vec<Content>,
    pub tools: Vec<ToolDeclaration>,
}

/// Model output: free text plus any requested function calls.
#[derive(Debug, Clone, Default)]
pub struct ChatReply {
    pub text: String,
    pub calls: Vec<FunctionCall>,
}

impl ChatReply {
    pub fn wants_tools(&self) -> bool {
        !self.calls.is_empty()
    }
}

/// Object-safe seam between role agents and a concrete LLM endpoint.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn generate(&self, request: ChatRequest) -> Result<ChatReply, CompanyPrepError>;

    fn model_name(&self) -> &str;
}

/// Gemini client over `generateContent`.
pub struct GeminiChat {
    http: reqwest::Client,
    model: String,
    api_key: SecretValue,
    base_url: String,
}

impl GeminiChat {
    pub fn new(
        model: impl Into<String>,
        api_key: SecretValue,
        timeout_ms: u64,
    ) -> Result<Self, CompanyPrepError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .build()
            .map_err(|err| CompanyPrepError::Model(format!("http client: {err}")))?;

        Ok(Self {
            http,
            model: model.into(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Override the API host, used by tests against a local mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request_body(request: &ChatRequest) -> Value {
        let mut body = json!({
            "system_instruction": { "parts": [{ "text": request.system }] },
            "contents": request.contents,
        });
        if !request.tools.is_empty() {
            body["tools"] = json!([{ "functionDeclarations": request.tools }]);
        }
        body
    }

    fn parse_reply(body: &Value) -> Result<ChatReply, CompanyPrepError> {
        let parts = body
            .get("candidates")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(Value::as_array)
            .ok_or_else(|| {
                CompanyPrepError::Model(
                    "response contained no candidate content parts".to_string(),
                )
            })?;

        let mut reply = ChatReply::default();
        for part in parts {
            if let Some(text) = part.get("text").and_then(Value::as_str) {
                if !reply.text.is_empty() {
                    reply.text.push('\n');
                }
                reply.text.push_str(text);
            }
            if let Some(call) = part.get("functionCall") {
                let call: FunctionCall = serde_json::from_value(call.clone()).map_err(|err| {
                    CompanyPrepError::Model(format!("malformed function call: {err}"))
                })?;
                reply.calls.push(call);
            }
        }

        Ok(reply)
    }
}

#[async_trait]
impl ChatModel for GeminiChat {
    #[instrument(name = "llm.generate", skip(self, request))]
    async fn generate(&self, request: ChatRequest) -> Result<ChatReply, CompanyPrepError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose())
            .json(&Self::request_body(&request))
            .send()
            .await
            .map_err(|err| CompanyPrepError::Model(format!("request failed: {err}")))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|err| CompanyPrepError::Model(format!("invalid JSON response: {err}")))?;

        if !status.is_success() {
            let message = body
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("unknown API error");
            return Err(CompanyPrepError::Model(format!(
                "endpoint returned {status}: {message}"
            )));
        }

        let reply = Self::parse_reply(&body)?;
        debug!(
            model = %self.model,
            text_len = reply.text.len(),
            calls = reply.calls.len(),
            "model reply parsed"
        );
        Ok(reply)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_parts_serialize_to_gemini_shape() {
        let reply = ChatReply {
            text: "Searching now.".to_string(),
            calls: vec![FunctionCall {
                name: "web_search".to_string(),
                args: json!({"query": "Acme Corp"}),
            }],
        };
        let content = Content::model_reply(&reply);
        let value = serde_json::to_value(&content).unwrap();
        assert_eq!(value["role"], "model");
        assert_eq!(value["parts"][0]["text"], "Searching now.");
        assert_eq!(value["parts"][1]["functionCall"]["name"], "web_search");
    }

    #[test]
    fn model_reply_without_text_has_only_call_parts() {
        let reply = ChatReply {
            text: String::new(),
            calls: vec![FunctionCall {
                name: "finance_data".to_string(),
                args: json!({"company": "Acme"}),
            }],
        };
        let content = Content::model_reply(&reply);
        assert_eq!(content.parts.len(), 1);
    }

    #[test]
    fn parse_reply_collects_text_and_calls() {
        let body = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "text": "Looking up the ticker." },
                        { "functionCall": { "name": "finance_data", "args": { "company": "Acme" } } }
                    ]
                }
            }]
        });
        let reply = GeminiChat::parse_reply(&body).unwrap();
        assert_eq!(reply.text, "Looking up the ticker.");
        assert_eq!(reply.calls.len(), 1);
        assert_eq!(reply.calls[0].name, "finance_data");
    }

    #[test]
    fn parse_reply_rejects_unexpected_shapes() {
        let body = json!({ "candidates": [] });
        assert!(matches!(
            GeminiChat::parse_reply(&body),
            Err(CompanyPrepError::Model(_))
        ));
    }

    #[test]
    fn tools_are_omitted_when_empty() {
        let request = ChatRequest {
            system: "sys".to_string(),
            contents: vec![Content::user_text("hi")],
            tools: Vec::new(),
        };
        let body = GeminiChat::request_body(&request);
        assert!(body.get("tools").is_none());
    }
}
