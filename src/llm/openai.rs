//! OpenAI-compatible API client.
//!
//! HTTP client for the chat completions API of OpenAI, Ollama, vLLM and other
//! compatible endpoints.

use crate::llm::client::{Completion, CompletionClient};
use crate::llm::config::ProviderConfig;
use crate::llm::error::LLMError;
use crate::messages::{Message, StopReason, ToolCall, ToolDefinition};
use crate::types::CallId;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Client for OpenAI-compatible APIs.
#[derive(Debug, Clone)]
pub struct OpenAIClient {
    /// HTTP client
    client: Client,
    /// Endpoint settings
    config: ProviderConfig,
}

/// Request body for the chat completions API.
#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage>,
    max_completion_tokens: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<OpenAITool>,
}

/// A message in OpenAI format.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAIToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

/// A tool definition in OpenAI format.
#[derive(Debug, Clone, Serialize)]
struct OpenAITool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: OpenAIFunction,
}

/// A function definition in OpenAI format.
#[derive(Debug, Clone, Serialize)]
struct OpenAIFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

/// A tool call in OpenAI format.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAIToolCall {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: OpenAIFunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

/// A function call in OpenAI format; `arguments` is a JSON-encoded string.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAIFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

/// Non-streaming response from the API.
#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

/// A choice in the response.
#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionChoice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

/// Error response from the API.
#[derive(Debug, Clone, Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIErrorDetail,
}

/// Error detail from the API.
#[derive(Debug, Clone, Deserialize)]
struct OpenAIErrorDetail {
    #[serde(rename = "type")]
    error_type: Option<String>,
    #[serde(default)]
    code: Option<String>,
    message: String,
}

impl OpenAIClient {
    /// Creates a new OpenAI-compatible client.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the HTTP client cannot be created.
    pub fn new(config: ProviderConfig) -> Result<Self, LLMError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LLMError::transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Returns the endpoint configuration.
    #[must_use]
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Converts transcript messages to OpenAI API format.
    fn convert_messages(messages: &[Message]) -> Vec<OpenAIMessage> {
        messages
            .iter()
            .map(|msg| match msg {
                Message::System { content } => OpenAIMessage {
                    role: "system".to_string(),
                    content: Some(content.clone()),
                    tool_calls: None,
                    tool_call_id: None,
                },
                Message::User { content } => OpenAIMessage {
                    role: "user".to_string(),
                    content: Some(content.clone()),
                    tool_calls: None,
                    tool_call_id: None,
                },
                Message::Assistant {
                    content,
                    tool_calls,
                } => OpenAIMessage {
                    role: "assistant".to_string(),
                    content: (!content.is_empty()).then(|| content.clone()),
                    tool_calls: (!tool_calls.is_empty()).then(|| {
                        tool_calls
                            .iter()
                            .map(|tc| OpenAIToolCall {
                                id: tc.id.clone(),
                                call_type: function_type(),
                                function: OpenAIFunctionCall {
                                    name: tc.name.clone(),
                                    arguments: encode_arguments(&tc.arguments),
                                },
                            })
                            .collect()
                    }),
                    tool_call_id: None,
                },
                Message::ToolResult(result) => OpenAIMessage {
                    role: "tool".to_string(),
                    content: Some(result.to_model_content()),
                    tool_calls: None,
                    tool_call_id: Some(result.call_id.clone()),
                },
            })
            .collect()
    }

    /// Converts tool definitions to OpenAI API format.
    fn convert_tools(tools: &[ToolDefinition]) -> Vec<OpenAITool> {
        tools
            .iter()
            .map(|t| OpenAITool {
                tool_type: "function",
                function: OpenAIFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.input_schema.clone(),
                },
            })
            .collect()
    }

    /// Converts an API tool call, keeping malformed argument text verbatim.
    ///
    /// Unparseable arguments become a JSON string, which fails schema
    /// validation and comes back to the model as `invalid_arguments`.
    fn convert_tool_call(call: OpenAIToolCall) -> ToolCall {
        let arguments = if call.function.arguments.trim().is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(&call.function.arguments)
                .unwrap_or(serde_json::Value::String(call.function.arguments))
        };
        let id = if call.id.is_empty() {
            CallId::new().into()
        } else {
            call.id
        };
        ToolCall {
            id,
            name: call.function.name,
            arguments,
        }
    }

    /// Parses OpenAI stop reason to internal format.
    #[must_use]
    pub fn parse_stop_reason(reason: Option<&str>) -> StopReason {
        match reason {
            Some("length") => StopReason::MaxTokens,
            Some("tool_calls" | "function_call") => StopReason::ToolUse,
            Some("content_filter") => StopReason::StopSequence,
            _ => StopReason::EndTurn,
        }
    }

    /// Builds the request with optional authorization header.
    fn build_request(&self, body: &ChatCompletionRequest<'_>) -> reqwest::RequestBuilder {
        let request = self
            .client
            .post(self.config.chat_completions_endpoint())
            .json(body);

        if self.config.api_key.is_empty() {
            request
        } else {
            request.bearer_auth(&self.config.api_key)
        }
    }

    /// Maps a transport failure.
    fn transport_error(&self, error: &reqwest::Error) -> LLMError {
        if error.is_timeout() {
            LLMError::timeout(self.config.timeout)
        } else {
            LLMError::transport(format!("request failed: {error}"))
        }
    }

    /// Parses an error response from the API.
    async fn parse_error_response(&self, response: reqwest::Response) -> LLMError {
        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return LLMError::rate_limited(retry_after);
        }

        let error_body = response.text().await.unwrap_or_default();
        let model = &self.config.model;
        match serde_json::from_str::<OpenAIErrorResponse>(&error_body) {
            Ok(api_error) => {
                let detail = api_error.error;
                let error_type = detail.error_type.as_deref().or(detail.code.as_deref());
                LLMError::from_status(status.as_u16(), error_type, detail.message, model)
            }
            Err(_) if error_body.trim().is_empty() => LLMError::from_status(
                status.as_u16(),
                None,
                status.canonical_reason().unwrap_or("unknown error"),
                model,
            ),
            Err(_) => LLMError::from_status(status.as_u16(), None, error_body, model),
        }
    }
}

/// Encodes arguments as the JSON string the API expects.
fn encode_arguments(arguments: &serde_json::Value) -> String {
    match arguments {
        serde_json::Value::String(raw) => raw.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl CompletionClient for OpenAIClient {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<Completion, LLMError> {
        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: Self::convert_messages(messages),
            max_completion_tokens: self.config.max_tokens,
            tools: Self::convert_tools(tools),
        };

        let response = self
            .build_request(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        if !response.status().is_success() {
            return Err(self.parse_error_response(response).await);
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LLMError::malformed_response(format!("failed to parse response: {e}")))?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::malformed_response("response contained no choices"))?;

        let tool_calls: Vec<ToolCall> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(Self::convert_tool_call)
            .collect();

        let stop_reason = if tool_calls.is_empty() {
            Self::parse_stop_reason(choice.finish_reason.as_deref())
        } else {
            StopReason::ToolUse
        };

        Ok(Completion {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
            stop_reason,
        })
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::ToolResult;
    use serde_json::json;

    fn create_test_client() -> OpenAIClient {
        OpenAIClient::new(ProviderConfig::openai_compatible(
            "http://localhost:11434/v1",
            "llama3.2",
        ))
        .unwrap()
    }

    #[test]
    fn openai_client_reports_model() {
        let client = create_test_client();
        assert_eq!(client.model(), "llama3.2");
        assert_eq!(client.provider_name(), "openai");
    }

    #[test]
    fn convert_system_and_user() {
        let api = OpenAIClient::convert_messages(&[
            Message::system("You are helpful."),
            Message::user("Hello!"),
        ]);
        assert_eq!(api[0].role, "system");
        assert_eq!(api[1].role, "user");
        assert_eq!(api[1].content.as_deref(), Some("Hello!"));
    }

    #[test]
    fn convert_assistant_with_tools_omits_empty_content() {
        let call = ToolCall::new("tc_123", "run_shell", json!({"command": "ls"}));
        let api = OpenAIClient::convert_messages(&[Message::assistant_with_tools("", vec![call])]);

        assert!(api[0].content.is_none());
        let calls = api[0].tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].id, "tc_123");
        assert_eq!(calls[0].call_type, "function");
        assert_eq!(calls[0].function.arguments, r#"{"command":"ls"}"#);
    }

    #[test]
    fn convert_tool_result_carries_call_id() {
        let call = ToolCall::new("tc_9", "run_shell", json!({"command": "false"}));
        let result = ToolResult::failed(&call, "", 1);
        let api = OpenAIClient::convert_messages(&[Message::ToolResult(result)]);

        assert_eq!(api[0].role, "tool");
        assert_eq!(api[0].tool_call_id.as_deref(), Some("tc_9"));
        assert!(api[0].content.as_deref().unwrap().starts_with("[exit code 1]"));
    }

    #[test]
    fn convert_tools_wraps_functions() {
        let tools = vec![ToolDefinition {
            name: "read_file".to_string(),
            description: "Read a file".to_string(),
            input_schema: json!({"type": "object"}),
        }];
        let api = OpenAIClient::convert_tools(&tools);
        assert_eq!(api[0].tool_type, "function");
        assert_eq!(api[0].function.name, "read_file");
    }

    #[test]
    fn malformed_arguments_are_kept_verbatim() {
        let call = OpenAIClient::convert_tool_call(OpenAIToolCall {
            id: "c1".into(),
            call_type: function_type(),
            function: OpenAIFunctionCall {
                name: "read_file".into(),
                arguments: "{\"path\": ".into(),
            },
        });
        assert_eq!(call.arguments, json!("{\"path\": "));
        assert_eq!(encode_arguments(&call.arguments), "{\"path\": ");
    }

    #[test]
    fn empty_arguments_become_empty_object_and_ids_are_minted() {
        let call = OpenAIClient::convert_tool_call(OpenAIToolCall {
            id: String::new(),
            call_type: function_type(),
            function: OpenAIFunctionCall {
                name: "list_directory".into(),
                arguments: String::new(),
            },
        });
        assert_eq!(call.arguments, json!({}));
        assert!(call.id.starts_with("call_"));
    }

    #[test]
    fn parse_stop_reasons() {
        assert_eq!(OpenAIClient::parse_stop_reason(Some("stop")), StopReason::EndTurn);
        assert_eq!(OpenAIClient::parse_stop_reason(Some("length")), StopReason::MaxTokens);
        assert_eq!(OpenAIClient::parse_stop_reason(Some("tool_calls")), StopReason::ToolUse);
        assert_eq!(
            OpenAIClient::parse_stop_reason(Some("content_filter")),
            StopReason::StopSequence
        );
        assert_eq!(OpenAIClient::parse_stop_reason(None), StopReason::EndTurn);
    }

    #[test]
    fn response_parses_tool_calls() {
        let body = r#"{
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "finish_reason": "tool_calls",
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {"name": "run_shell", "arguments": "{\"command\":\"docker ps\"}"}
                    }]
                }
            }]
        }"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        let calls = parsed.choices[0].message.tool_calls.clone().unwrap();
        let call = OpenAIClient::convert_tool_call(calls[0].clone());
        assert_eq!(call.id, "call_abc");
        assert_eq!(call.arguments["command"], "docker ps");
    }

    #[test]
    fn request_uses_max_completion_tokens() {
        let body = ChatCompletionRequest {
            model: "o4-mini",
            messages: vec![],
            max_completion_tokens: 4096,
            tools: vec![],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["max_completion_tokens"], 4096);
        assert!(json.get("max_tokens").is_none());
        assert!(json.get("tools").is_none());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error() {
        let client = OpenAIClient::new(ProviderConfig::openai_compatible(
            "http://127.0.0.1:9/v1",
            "m",
        ))
        .unwrap();
        let error = client
            .complete(&[Message::user("hi")], &[])
            .await
            .unwrap_err();
        assert!(error.is_retriable());
    }
}
