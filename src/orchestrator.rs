//! Per-request coordinator: parses the envelope, builds the `KeyPool` and
//! `AgentContext`, runs the summarisation pre-step and the agent's step
//! sequence, and maps outcomes onto the wire protocol.

use crate::context::AgentContext;
use crate::error::{Error, Result};
use crate::key_pool::KeyPool;
use crate::protocol::Frame;
use crate::types::{Message, MessageRole, RequestEnvelope};
use crate::{registry, summarizer};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

/// Validates the envelope's structural invariants before any stream opens:
/// `messages` non-empty and ending in `role=user`.
pub fn validate_envelope(envelope: &RequestEnvelope) -> Result<()> {
    match envelope.messages.last() {
        Some(last) if last.role == MessageRole::User => Ok(()),
        Some(_) => Err(Error::bad_request("messages must end with role=user")),
        None => Err(Error::bad_request("messages must not be empty")),
    }
}

/// Runs a full request to completion, writing frames to `sink` as they are
/// produced. Errors encountered before this call returns are pre-stream
/// errors (mapped to an HTTP status by the caller); errors raised by steps
/// after the stream has opened are instead turned into an `ERROR` frame and
/// swallowed here, matching the "ERROR frame ends the stream" contract.
pub async fn run(
    http: &reqwest::Client,
    api_keys: Vec<String>,
    envelope: RequestEnvelope,
    sink: UnboundedSender<Frame>,
    cancellation: CancellationToken,
) -> Result<()> {
    validate_envelope(&envelope)?;
    let pool = Arc::new(KeyPool::new(api_keys)?);

    let enabled_models: Vec<_> = envelope
        .data
        .model_settings
        .into_iter()
        .filter(|m| m.enabled)
        .collect();

    let mut ctx = AgentContext::new(
        pool,
        envelope.messages,
        enabled_models,
        envelope.data.app_settings,
        sink.clone(),
        envelope.data.total_content_length,
        envelope.data.agent_mode.clone(),
        envelope.data.system_prompt,
        cancellation.clone(),
    );

    // Step 4 (summarise) must run before step 5 (prepend system prompt): the
    // summariser replaces `llm_messages` wholesale, which would otherwise
    // fold a pre-prepended system prompt into the text it summarises away.
    summarizer::run(http, &mut ctx).await;

    if let Some(system_prompt) = ctx.system_prompt.clone().filter(|s| !s.is_empty()) {
        ctx.llm_messages.insert(0, Message::system(system_prompt));
    }

    let steps = registry::steps_for(&ctx.agent_mode);
    for step in steps {
        if cancellation.is_cancelled() {
            return Ok(());
        }
        let _ = sink.send(Frame::Status { step: step.name() });
        if let Err(e) = step.run(http, &mut ctx).await {
            let _ = sink.send(Frame::Error(e.to_string()));
            return Ok(());
        }
    }

    if !ctx.final_content_streamed && !ctx.final_content.is_empty() {
        let _ = sink.send(Frame::Data(ctx.final_content.clone()));
    }

    let responses = ctx
        .model_responses
        .clone()
        .unwrap_or_else(|| ctx.parallel_responses.clone());
    let _ = sink.send(Frame::ModelResponses(responses));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AppConfig, Message, MessageRole, RequestData};

    fn envelope_with(messages: Vec<Message>) -> RequestEnvelope {
        RequestEnvelope {
            messages,
            data: RequestData {
                agent_mode: "standard".to_string(),
                system_prompt: None,
                model_settings: vec![],
                app_settings: AppConfig::default(),
                total_content_length: 0,
            },
        }
    }

    #[test]
    fn test_validate_envelope_accepts_trailing_user_message() {
        let envelope = envelope_with(vec![Message::user("hi")]);
        assert!(validate_envelope(&envelope).is_ok());
    }

    #[test]
    fn test_validate_envelope_rejects_empty_messages() {
        let envelope = envelope_with(vec![]);
        assert!(matches!(validate_envelope(&envelope), Err(Error::BadRequest(_))));
    }

    #[test]
    fn test_validate_envelope_rejects_trailing_assistant_message() {
        let envelope = envelope_with(vec![Message::user("hi"), Message::assistant("yo")]);
        let err = validate_envelope(&envelope).unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
        assert_ne!(MessageRole::Assistant, MessageRole::User);
    }
}
