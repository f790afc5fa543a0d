//! Core type definitions shared across the orchestration engine.
//!
//! Two families of types live here:
//!
//! - **Domain types** (`Message`, `ModelSpec`, `ModelReply`, `AppConfig`): the
//!   semantic vocabulary steps operate on, independent of any wire format.
//! - **Backend wire types** (`BackendMessage`, `BackendRequest`, `BackendChunk`, ...):
//!   the OpenAI-compatible chat-completions format spoken to the Cerebras-compatible
//!   endpoint. Kept distinct from the domain types so the backend protocol can
//!   change without touching step logic.

use serde::{Deserialize, Serialize};

// ============================================================================
// DOMAIN TYPES
// ============================================================================

/// Who sent a message in the conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A single turn of the conversation. Carries no server-side identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(MessageRole::System, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(MessageRole::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, text)
    }
}

/// Configuration for one backend model slot in a request.
///
/// `id` is opaque and caller-assigned; when the same `modelName` participates
/// more than once in a request (virtual duplicates, e.g. `execute_subtasks`),
/// distinct `id`s are required to keep per-id message overrides unambiguous.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSpec {
    pub id: String,
    pub model_name: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default, rename = "maxTokens")]
    pub max_output_tokens: Option<u32>,
    pub enabled: bool,
    #[serde(default)]
    pub role: Option<String>,
}

fn default_temperature() -> f32 {
    0.7
}

impl ModelSpec {
    /// Derive a virtual copy of this spec carrying a synthetic id, used when a
    /// single model is assigned more than one subtask in the same fan-out.
    pub fn with_virtual_id(&self, suffix: &str) -> Self {
        Self {
            id: format!("{}__{}", self.id, suffix),
            model_name: self.model_name.clone(),
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
            enabled: self.enabled,
            role: self.role.clone(),
        }
    }
}

/// One backend model's contribution to a fan-out, as surfaced to the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelReply {
    pub model: String,
    pub provider: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thought: Option<String>,
}

impl ModelReply {
    pub fn new(model: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            provider: "cerebras".to_string(),
            content: content.into(),
            thought: None,
        }
    }

    pub fn with_thought(mut self, thought: impl Into<String>) -> Self {
        self.thought = Some(thought.into());
        self
    }
}

/// A single configured model role (summariser or integrator).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ModelRoleConfig {
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default, rename = "maxTokens")]
    pub max_output_tokens: Option<u32>,
}

/// Application-wide model configuration. The integrator model is reused as
/// planner, router, role-generator, hypothesis-generator, and meta-analyser.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub summarizer_model: Option<ModelRoleConfig>,
    #[serde(default)]
    pub integrator_model: Option<ModelRoleConfig>,
}

impl AppConfig {
    pub fn summarizer(&self) -> ModelRoleConfig {
        self.summarizer_model.clone().unwrap_or_default()
    }

    pub fn integrator(&self) -> ModelRoleConfig {
        self.integrator_model.clone().unwrap_or_default()
    }
}

// ============================================================================
// REQUEST ENVELOPE (wire format, §6)
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RequestEnvelope {
    pub messages: Vec<Message>,
    pub data: RequestData,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestData {
    #[serde(default = "default_agent_mode")]
    pub agent_mode: String,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub model_settings: Vec<ModelSpec>,
    #[serde(default)]
    pub app_settings: AppConfig,
    #[serde(default)]
    pub total_content_length: usize,
}

fn default_agent_mode() -> String {
    "standard".to_string()
}

// ============================================================================
// BACKEND WIRE TYPES (OpenAI-compatible chat completions)
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct BackendMessage {
    pub role: String,
    pub content: String,
}

impl From<&Message> for BackendMessage {
    fn from(m: &Message) -> Self {
        let role = match m.role {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        };
        Self {
            role: role.to_string(),
            content: m.content.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BackendRequest {
    pub model: String,
    pub messages: Vec<BackendMessage>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendChunk {
    #[serde(default)]
    pub choices: Vec<BackendChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendChoice {
    pub delta: BackendDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct BackendDelta {
    #[serde(default)]
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let m = Message::user("hi");
        assert_eq!(m.role, MessageRole::User);
        assert_eq!(m.content, "hi");
    }

    #[test]
    fn test_model_spec_virtual_id() {
        let spec = ModelSpec {
            id: "m1".to_string(),
            model_name: "A".to_string(),
            temperature: 0.5,
            max_output_tokens: None,
            enabled: true,
            role: None,
        };
        let virt = spec.with_virtual_id("subtask_0");
        assert_eq!(virt.id, "m1__subtask_0");
        assert_eq!(virt.model_name, "A");
    }

    #[test]
    fn test_backend_message_from_role() {
        let m = Message::system("be nice");
        let b = BackendMessage::from(&m);
        assert_eq!(b.role, "system");
        assert_eq!(b.content, "be nice");
    }

    #[test]
    fn test_request_envelope_parses_defaults() {
        let json = serde_json::json!({
            "messages": [{"role": "user", "content": "hi"}],
            "data": {}
        });
        let env: RequestEnvelope = serde_json::from_value(json).unwrap();
        assert_eq!(env.data.agent_mode, "standard");
        assert!(env.data.model_settings.is_empty());
    }

    #[test]
    fn test_app_config_defaults_when_role_missing() {
        let config = AppConfig::default();
        assert!(config.summarizer().model_name.is_none());
        assert!(config.integrator().model_name.is_none());
    }
}
