//! Integration steps: turn a fan-out's replies into the final streamed
//! answer and decide what the UI sees as `modelResponses`.

use crate::context::AgentContext;
use crate::error::Result;
use crate::integration;
use crate::protocol::Frame;
use crate::types::{Message, ModelReply, ModelRoleConfig, ModelSpec};

fn integrator_spec(role: ModelRoleConfig, id: &str) -> ModelSpec {
    ModelSpec {
        id: id.to_string(),
        model_name: role.model_name.unwrap_or_else(|| "llama-3.3-70b".to_string()),
        temperature: role.temperature.unwrap_or(0.5),
        max_output_tokens: role.max_output_tokens,
        enabled: true,
        role: None,
    }
}

fn original_question(ctx: &AgentContext) -> String {
    ctx.llm_messages
        .last()
        .map(|m| m.content.clone())
        .unwrap_or_default()
}

async fn stream_final(
    http: &reqwest::Client,
    ctx: &mut AgentContext,
    prompt_messages: Vec<Message>,
) -> Result<()> {
    let spec = integrator_spec(ctx.app_config.integrator(), "integrator");
    let final_text =
        integration::call_streaming(
            http,
            &ctx.pool,
            &spec,
            &prompt_messages,
            &ctx.stream_sink,
            &ctx.cancellation,
        )
        .await?;
    ctx.final_content = final_text;
    ctx.final_content_streamed = true;
    Ok(())
}

/// If exactly one reply came back from the fan-out, stream it directly.
/// Otherwise integrate a numbered listing of replies into a single answer.
pub async fn integrate_standard(http: &reqwest::Client, ctx: &mut AgentContext) -> Result<()> {
    if ctx.parallel_responses.len() == 1 {
        let content = ctx.parallel_responses[0].content.clone();
        let _ = ctx.stream_sink.send(Frame::Data(content.clone()));
        ctx.final_content = content;
        ctx.final_content_streamed = true;
    } else {
        let listing = number_replies(&ctx.parallel_responses);
        let mut prompt = ctx.llm_messages.clone();
        prompt.push(Message::user(format!(
            "Original question: {}\n\nCandidate replies:\n{}\n\nSynthesise the single best final answer.",
            original_question(ctx),
            listing
        )));
        stream_final(http, ctx, prompt).await?;
    }
    ctx.model_responses = Some(ctx.parallel_responses.clone());
    Ok(())
}

/// Like `integrate_standard` but the listing includes both `thought` and
/// `content` per reply.
pub async fn integrate_deep_thought(http: &reqwest::Client, ctx: &mut AgentContext) -> Result<()> {
    let listing = ctx
        .parallel_responses
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                "{}. ({}) thought: {}\n   answer: {}",
                i + 1,
                r.model,
                r.thought.as_deref().unwrap_or(""),
                r.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut prompt = ctx.llm_messages.clone();
    prompt.push(Message::user(format!(
        "Original question: {}\n\nCandidate replies with reasoning:\n{}\n\nSynthesise the single best final answer.",
        original_question(ctx),
        listing
    )));
    stream_final(http, ctx, prompt).await?;
    ctx.model_responses = Some(ctx.parallel_responses.clone());
    Ok(())
}

/// Final-editor integration given both drafts and their critiques.
pub async fn integrate_with_critiques(http: &reqwest::Client, ctx: &mut AgentContext) -> Result<()> {
    let drafts = number_replies(&ctx.parallel_responses);
    let critiques = number_replies(&ctx.critiques);
    let mut prompt = ctx.llm_messages.clone();
    prompt.push(Message::user(format!(
        "You are the final editor. Drafts:\n{}\n\nCritiques:\n{}\n\nApply all critiques and produce the final answer.",
        drafts, critiques
    )));
    stream_final(http, ctx, prompt).await?;

    let mut combined = ctx.parallel_responses.clone();
    combined.extend(ctx.critiques.clone());
    ctx.model_responses = Some(combined);
    Ok(())
}

/// Integration over a report of `{subTask_i, reply_i}` pairs, used by
/// `manager` and `hypothesis` modes.
pub async fn integrate_report(http: &reqwest::Client, ctx: &mut AgentContext) -> Result<()> {
    let report = ctx
        .sub_tasks
        .iter()
        .zip(ctx.parallel_responses.iter())
        .enumerate()
        .map(|(i, (subtask, reply))| {
            format!("{}. subtask: {}\n   reply: {}", i + 1, subtask, reply.content)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut prompt = ctx.llm_messages.clone();
    prompt.push(Message::user(format!(
        "Report of completed subtasks:\n{}\n\nSynthesise the final answer to the original request.",
        report
    )));
    stream_final(http, ctx, prompt).await?;
    ctx.model_responses = Some(ctx.parallel_responses.clone());
    Ok(())
}

/// Integration rewriting the answer in the tone identified by
/// `execute_emotion_analysis`'s analyser output (`critiques[0]`).
pub async fn integrate_with_emotion(http: &reqwest::Client, ctx: &mut AgentContext) -> Result<()> {
    let analysis = ctx
        .critiques
        .first()
        .map(|r| r.content.clone())
        .unwrap_or_default();
    let drafts = number_replies(&ctx.parallel_responses);

    let mut prompt = ctx.llm_messages.clone();
    prompt.push(Message::user(format!(
        "Emotional analysis of the user's message: {}\n\nDrafts:\n{}\n\nRewrite the final answer in the tone indicated by the analysis.",
        analysis, drafts
    )));
    stream_final(http, ctx, prompt).await?;
    ctx.model_responses = Some(ctx.parallel_responses.clone());
    Ok(())
}

fn number_replies(replies: &[ModelReply]) -> String {
    replies
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. ({}) {}", i + 1, r.model, r.content))
        .collect::<Vec<_>>()
        .join("\n")
}
