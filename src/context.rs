//! The shared mutable record threaded through an agent's step sequence.
//!
//! The pure-context-in/context-out step signature is expressed here as
//! `&mut AgentContext` passed to each `async fn(&mut AgentContext) -> Result<()>`
//! step, rather than cloning and replacing the whole record at every step
//! boundary — idiomatic for a large, append-only pipeline record in Rust,
//! and grounded in the teacher's `Client` methods that mutate `&mut self` and
//! return `Result<()>`.

use crate::key_pool::KeyPool;
use crate::protocol::Frame;
use crate::types::{AppConfig, Message, ModelReply, ModelSpec};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

/// Inputs set once at context construction, plus outputs progressively
/// filled in by each step as it runs.
pub struct AgentContext {
    // --- inputs, set once ---
    pub pool: Arc<KeyPool>,
    pub llm_messages: Vec<Message>,
    pub enabled_models: Vec<ModelSpec>,
    pub app_config: AppConfig,
    pub stream_sink: UnboundedSender<Frame>,
    pub total_content_length: usize,
    pub agent_mode: String,
    pub system_prompt: Option<String>,
    pub cancellation: CancellationToken,

    // --- outputs, progressively filled ---
    pub parallel_responses: Vec<ModelReply>,
    pub critiques: Vec<ModelReply>,
    pub sub_tasks: Vec<String>,
    pub is_hypothesis: bool,
    pub final_content: String,
    pub model_responses: Option<Vec<ModelReply>>,
    pub summary_executed: bool,
    pub new_history_context: Vec<Message>,
    pub final_content_streamed: bool,
}

impl AgentContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pool: Arc<KeyPool>,
        llm_messages: Vec<Message>,
        enabled_models: Vec<ModelSpec>,
        app_config: AppConfig,
        stream_sink: UnboundedSender<Frame>,
        total_content_length: usize,
        agent_mode: String,
        system_prompt: Option<String>,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            pool,
            llm_messages,
            enabled_models,
            app_config,
            stream_sink,
            total_content_length,
            agent_mode,
            system_prompt,
            cancellation,
            parallel_responses: Vec::new(),
            critiques: Vec::new(),
            sub_tasks: Vec::new(),
            is_hypothesis: false,
            final_content: String::new(),
            model_responses: None,
            summary_executed: false,
            new_history_context: Vec::new(),
            final_content_streamed: false,
        }
    }

    /// Replies the UI should display: `modelResponses` if a step set it,
    /// otherwise the raw fan-out results.
    pub fn display_responses(&self) -> &[ModelReply] {
        self.model_responses
            .as_deref()
            .unwrap_or(&self.parallel_responses)
    }
}

#[cfg(test)]
impl AgentContext {
    /// Builds a minimal context for unit tests that only exercise a single
    /// step in isolation (no real key pool or sink needed by the assertions).
    pub fn for_test(
        llm_messages: Vec<Message>,
        total_content_length: usize,
        app_config: AppConfig,
    ) -> Self {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        Self::new(
            Arc::new(KeyPool::new(vec!["test-key".to_string()]).unwrap()),
            llm_messages,
            Vec::new(),
            app_config,
            tx,
            total_content_length,
            "standard".to_string(),
            None,
            CancellationToken::new(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessageRole;

    #[test]
    fn test_display_responses_falls_back_to_parallel() {
        let mut ctx = AgentContext::for_test(vec![Message::user("hi")], 2, AppConfig::default());
        ctx.parallel_responses.push(ModelReply::new("a", "reply"));
        assert_eq!(ctx.display_responses().len(), 1);
    }

    #[test]
    fn test_display_responses_prefers_model_responses_when_set() {
        let mut ctx = AgentContext::for_test(vec![Message::user("hi")], 2, AppConfig::default());
        ctx.parallel_responses.push(ModelReply::new("a", "draft"));
        ctx.model_responses = Some(vec![ModelReply::new("a", "final"), ModelReply::new("b", "final2")]);
        assert_eq!(ctx.display_responses().len(), 2);
    }

    #[test]
    fn test_new_context_has_empty_outputs() {
        let ctx = AgentContext::for_test(vec![Message::user("hi")], 0, AppConfig::default());
        assert!(ctx.parallel_responses.is_empty());
        assert!(!ctx.summary_executed);
        assert!(!ctx.is_hypothesis);
        assert_eq!(ctx.llm_messages[0].role, MessageRole::User);
    }
}
