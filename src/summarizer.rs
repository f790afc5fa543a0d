//! Pre-step that compresses long conversation history before the agent's own
//! steps run. Best-effort: failure here is never fatal to the request.
//!
//! Kept deliberately separate from the teacher's token-estimation
//! `context.rs` helpers (`estimate_tokens`/`is_approaching_limit`): those
//! operate on token counts, while this component's trigger is message-count
//! and char-length based, matching the engine's wire contract rather than any
//! tokenizer.

use crate::context::AgentContext;
use crate::integration;
use crate::protocol::Frame;
use crate::types::{Message, ModelRoleConfig};

const MESSAGE_THRESHOLD: usize = 10;
const CHAR_THRESHOLD: usize = 30_000;

fn should_summarise(ctx: &AgentContext) -> bool {
    ctx.llm_messages.len() > MESSAGE_THRESHOLD || ctx.total_content_length > CHAR_THRESHOLD
}

/// Runs the summarisation pre-step. No-op (and no error) if the trigger
/// conditions are not met.
pub async fn run(http: &reqwest::Client, ctx: &mut AgentContext) {
    if !should_summarise(ctx) {
        return;
    }

    let Some((messages_to_summarise, last_user)) = split_history(&ctx.llm_messages) else {
        return;
    };

    let role = summarizer_role(ctx);
    let spec = role.into_model_spec("summariser");

    let mut prompt_messages = messages_to_summarise;
    prompt_messages.push(Message::user(
        "compress to a detailed third-person summary, preserving system-prompt intent",
    ));

    match integration::call_buffered(http, &ctx.pool, &spec, &prompt_messages, &ctx.cancellation)
        .await
    {
        Ok(summary) => {
            let summary_message =
                Message::system(format!("[summary of prior conversation]\n{}", summary));
            ctx.llm_messages = vec![summary_message.clone(), last_user];
            ctx.summary_executed = true;
            ctx.new_history_context = vec![summary_message.clone()];
            let _ = ctx
                .stream_sink
                .send(Frame::SummaryExecuted(vec![summary_message]));
        }
        Err(e) => {
            tracing::warn!(error = %e, "summarisation failed, proceeding with uncompressed history");
        }
    }
}

fn split_history(messages: &[Message]) -> Option<(Vec<Message>, Message)> {
    if messages.is_empty() {
        return None;
    }
    let last = messages.last().cloned()?;
    let head = messages[..messages.len() - 1].to_vec();
    Some((head, last))
}

fn summarizer_role(ctx: &AgentContext) -> ModelRoleConfig {
    ctx.app_config.summarizer()
}

trait IntoModelSpec {
    fn into_model_spec(self, id: &str) -> crate::types::ModelSpec;
}

impl IntoModelSpec for ModelRoleConfig {
    fn into_model_spec(self, id: &str) -> crate::types::ModelSpec {
        crate::types::ModelSpec {
            id: id.to_string(),
            model_name: self
                .model_name
                .unwrap_or_else(|| "llama-3.3-70b".to_string()),
            temperature: self.temperature.unwrap_or(0.3),
            max_output_tokens: self.max_output_tokens,
            enabled: true,
            role: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AppConfig, MessageRole};

    fn make_ctx(message_count: usize, total_content_length: usize) -> AgentContext {
        let messages: Vec<Message> = (0..message_count)
            .map(|i| {
                if i % 2 == 0 {
                    Message::user(format!("msg {}", i))
                } else {
                    Message::assistant(format!("reply {}", i))
                }
            })
            .collect();
        AgentContext::for_test(messages, total_content_length, AppConfig::default())
    }

    #[test]
    fn test_triggers_on_message_count() {
        let ctx = make_ctx(MESSAGE_THRESHOLD + 1, 0);
        assert!(should_summarise(&ctx));
    }

    #[test]
    fn test_triggers_on_char_length() {
        let ctx = make_ctx(2, CHAR_THRESHOLD + 1);
        assert!(should_summarise(&ctx));
    }

    #[test]
    fn test_does_not_trigger_below_thresholds() {
        let ctx = make_ctx(2, 10);
        assert!(!should_summarise(&ctx));
    }

    #[test]
    fn test_split_history_separates_last_user_turn() {
        let messages = vec![Message::user("a"), Message::assistant("b"), Message::user("c")];
        let (head, last) = split_history(&messages).unwrap();
        assert_eq!(head.len(), 2);
        assert_eq!(last.role, MessageRole::User);
        assert_eq!(last.content, "c");
    }
}
