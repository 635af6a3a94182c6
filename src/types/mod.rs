use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ============= API Request/Response Types =============

/// Inbound chat turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Existing conversation to continue; empty or unknown starts a new one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub message: String,
}

impl ChatRequest {
    /// Request that starts a new conversation.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            conversation_id: None,
            message: message.into(),
        }
    }

    /// Request that continues `conversation_id`.
    pub fn continuing(conversation_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            conversation_id: Some(conversation_id.into()),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub content: String,
    pub agent: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Message,
    Handoff,
    ToolCall,
    ToolOutput,
    ContextUpdate,
}

/// One entry of the per-turn event stream shown to the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub agent: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

impl AgentEvent {
    pub fn new(kind: EventKind, agent: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            kind,
            agent: agent.into(),
            content: content.into(),
            metadata: None,
            timestamp: Some(now_millis()),
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Audit row for an input guardrail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardrailCheck {
    pub id: String,
    pub name: String,
    pub input: String,
    pub reasoning: String,
    pub passed: bool,
    pub timestamp: f64,
}

impl GuardrailCheck {
    pub fn passed(name: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            input: input.into(),
            reasoning: String::new(),
            passed: true,
            timestamp: now_millis(),
        }
    }

    pub fn failed(
        name: impl Into<String>,
        input: impl Into<String>,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            reasoning: reasoning.into(),
            passed: false,
            ..Self::passed(name, input)
        }
    }
}

/// Audit row for an output guardrail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputGuardrailCheck {
    pub id: String,
    pub name: String,
    pub input_text: String,
    pub output: String,
    pub reasoning: String,
    pub final_text: String,
    pub tripwire_triggered: bool,
    pub timestamp: f64,
}

/// Agent metadata exposed to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentInfo {
    pub name: String,
    pub description: String,
    pub handoffs: Vec<String>,
    pub tools: Vec<String>,
    pub input_guardrails: Vec<String>,
    pub output_guardrails: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub conversation_id: String,
    pub current_agent: String,
    pub messages: Vec<MessageResponse>,
    pub events: Vec<AgentEvent>,
    pub context: Value,
    pub agents: Vec<AgentInfo>,
    #[serde(default)]
    pub guardrails: Vec<GuardrailCheck>,
    #[serde(default)]
    pub output_guardrails: Vec<OutputGuardrailCheck>,
}

// ============= Transcript Types =============

/// Canonical conversation item replayed into the agent capability each turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TranscriptItem {
    User {
        content: String,
    },
    Assistant {
        agent: String,
        content: String,
    },
    ToolCall {
        call_id: String,
        name: String,
        arguments: String,
    },
    ToolResult {
        call_id: String,
        output: String,
    },
}

impl TranscriptItem {
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    pub fn assistant(agent: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Assistant {
            agent: agent.into(),
            content: content.into(),
        }
    }
}

// ============= Tool Types =============

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// A tool invocation requested by the model. `arguments` is the raw JSON text.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn add(&mut self, other: &TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

// ============= Helpers =============

/// Fresh opaque identifier (hyphen-less UUID v4).
pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Wall clock in milliseconds since the epoch, as the UI expects.
pub fn now_millis() -> f64 {
    Utc::now().timestamp_millis() as f64
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Store error: {0}")]
    Store(String),

    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Guardrail error: {0}")]
    Guardrail(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::NotFound(_) => axum::http::StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => axum::http::StatusCode::BAD_REQUEST,
            AppError::Cancelled(_) => axum::http::StatusCode::REQUEST_TIMEOUT,
            AppError::Store(_)
            | AppError::LLM(_)
            | AppError::Guardrail(_)
            | AppError::Configuration(_)
            | AppError::Internal(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({
            "error": self.to_string()
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_type_tag() {
        let event = AgentEvent::new(EventKind::ToolOutput, "FAQ Agent", "ok");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "tool_output");
        assert!(json.get("metadata").is_none());
        assert!(json["timestamp"].is_number());
    }

    #[test]
    fn test_transcript_item_round_trips_through_json() {
        let item = TranscriptItem::ToolCall {
            call_id: "call_1".to_string(),
            name: "update_seat".to_string(),
            arguments: r#"{"new_seat":"12A"}"#.to_string(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "tool_call");
        let back: TranscriptItem = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_chat_request_without_conversation_id() {
        let req: ChatRequest = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
        assert!(req.conversation_id.is_none());
        assert_eq!(req.message, "hi");
    }

    #[test]
    fn test_failed_check_keeps_reasoning() {
        let check = GuardrailCheck::failed("Relevance Guardrail", "poem?", "off topic");
        assert!(!check.passed);
        assert_eq!(check.reasoning, "off topic");
        assert_eq!(check.id.len(), 32);
    }
}
