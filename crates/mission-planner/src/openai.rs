use crate::{ConversationTurn, Error, Planner, PlannerResponse, Result, Role, ToolCall};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the OpenAI-compatible chat-completions planner.
///
/// The defaults target the xAI endpoint the original deployment used, but
/// any OpenAI-compatible server works.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub system_prompt: Option<String>,
    pub timeout_secs: u64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.x.ai/v1".to_string(),
            api_key: String::new(),
            model: "grok-3-fast".to_string(),
            system_prompt: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Planner backed by an OpenAI-compatible `/chat/completions` endpoint with
/// function calling.
pub struct OpenAiPlanner {
    config: PlannerConfig,
    client: reqwest::Client,
}

impl OpenAiPlanner {
    pub fn new(config: PlannerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn build_messages(&self, text: &str, context: &[ConversationTurn]) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(context.len() + 2);
        if let Some(prompt) = &self.config.system_prompt {
            messages.push(ChatMessage {
                role: "system",
                content: prompt.clone(),
            });
        }
        for turn in context {
            messages.push(ChatMessage {
                role: match turn.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                },
                content: turn.content.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: text.to_string(),
        });
        messages
    }
}

#[async_trait]
impl Planner for OpenAiPlanner {
    async fn plan(
        &self,
        text: &str,
        context: &[ConversationTurn],
        tool_schemas: &[Value],
    ) -> Result<PlannerResponse> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: self.build_messages(text, context),
            tools: tool_schemas,
            tool_choice: "auto",
        };

        debug!(model = %self.config.model, tools = tool_schemas.len(), "requesting plan");
        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;
        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidResponse("no choices in completion".to_string()))?;

        let mut tool_calls = Vec::new();
        for raw in choice.message.tool_calls.unwrap_or_default() {
            let arguments = serde_json::from_str(&raw.function.arguments).map_err(|e| {
                Error::InvalidResponse(format!(
                    "tool call '{}' has unparseable arguments: {e}",
                    raw.function.name
                ))
            })?;
            tool_calls.push(ToolCall {
                name: raw.function.name,
                arguments,
            });
        }

        info!(
            tool_calls = tool_calls.len(),
            "plan received from language model"
        );
        Ok(PlannerResponse {
            assistant_text: choice.message.content.unwrap_or_default(),
            tool_calls,
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    tools: &'a [Value],
    tool_choice: &'a str,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    tool_calls: Option<Vec<RawToolCall>>,
}

#[derive(Deserialize)]
struct RawToolCall {
    function: RawFunction,
}

#[derive(Deserialize)]
struct RawFunction {
    name: String,
    arguments: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_parsing() {
        let raw = r#"{
            "choices": [{
                "message": {
                    "content": "Taking off now.",
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "takeoff", "arguments": "{}"}
                    }]
                }
            }]
        }"#;
        let completion: ChatCompletion = serde_json::from_str(raw).unwrap();
        let choice = &completion.choices[0];
        assert_eq!(choice.message.content.as_deref(), Some("Taking off now."));
        let calls = choice.message.tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].function.name, "takeoff");
    }

    #[test]
    fn test_messages_include_context_in_order() {
        let planner = OpenAiPlanner::new(PlannerConfig {
            system_prompt: Some("You fly a drone.".to_string()),
            ..PlannerConfig::default()
        })
        .unwrap();

        let context = vec![
            ConversationTurn::user("take off"),
            ConversationTurn::assistant("Airborne."),
        ];
        let messages = planner.build_messages("now land", &context);
        let roles: Vec<&str> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
        assert_eq!(messages.last().map(|m| m.content.as_str()), Some("now land"));
    }
}
