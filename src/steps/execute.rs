//! Fan-out steps: each runs the ParallelExecutor (or a pair of concurrent
//! fan-outs) and populates `parallelResponses` and/or `critiques`.

use crate::context::AgentContext;
use crate::error::Result;
use crate::integration;
use crate::parallel::{self, MessageSource};
use crate::types::{Message, ModelReply, ModelSpec};
use std::collections::HashMap;
use std::sync::OnceLock;

fn deep_thought_pattern() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| {
        regex::Regex::new(r"(?s)\[思考\](.*?)\[/思考\]\[最終回答\](.*)").unwrap()
    })
}

fn integrator_spec(role: crate::types::ModelRoleConfig, id: &str) -> ModelSpec {
    ModelSpec {
        id: id.to_string(),
        model_name: role.model_name.unwrap_or_else(|| "llama-3.3-70b".to_string()),
        temperature: role.temperature.unwrap_or(0.3),
        max_output_tokens: role.max_output_tokens,
        enabled: true,
        role: None,
    }
}

/// Parallel fan-out of all enabled models against the shared history.
pub async fn execute_standard(http: &reqwest::Client, ctx: &mut AgentContext) -> Result<()> {
    if ctx.enabled_models.is_empty() {
        return Err(crate::error::Error::NoEnabledModels);
    }
    let source = MessageSource::Shared(&ctx.llm_messages);
    ctx.parallel_responses =
        parallel::run(http, &ctx.pool, &ctx.enabled_models, &source, &ctx.cancellation).await?;
    Ok(())
}

/// Generates one persona per enabled model, then fans out with each model
/// given its persona as a leading system message.
pub async fn execute_expert_team(http: &reqwest::Client, ctx: &mut AgentContext) -> Result<()> {
    if ctx.enabled_models.is_empty() {
        return Err(crate::error::Error::NoEnabledModels);
    }
    let spec = integrator_spec(ctx.app_config.integrator(), "role_generator");
    let hint_roles: Vec<&str> = ctx
        .enabled_models
        .iter()
        .filter_map(|m| m.role.as_deref())
        .collect();

    let mut prompt = ctx.llm_messages.clone();
    let hint_text = if hint_roles.is_empty() {
        String::new()
    } else {
        format!(" User-supplied role hints: {}.", hint_roles.join(", "))
    };
    prompt.push(Message::user(format!(
        "Respond with a strict JSON array of {} distinct expert personas suited to answering this request.{} No prose, no code fences.",
        ctx.enabled_models.len(),
        hint_text
    )));

    let raw =
        integration::call_buffered(http, &ctx.pool, &spec, &prompt, &ctx.cancellation).await?;
    let personas = crate::steps::planning::parse_string_array_or_raw(&raw);
    let personas = if personas.is_empty() {
        vec!["a helpful expert".to_string()]
    } else {
        personas
    };

    let mut overrides = HashMap::new();
    for (i, model) in ctx.enabled_models.iter().enumerate() {
        let persona = &personas[i % personas.len()];
        let mut messages = vec![Message::system(format!("act as {}", persona))];
        messages.extend(ctx.llm_messages.clone());
        overrides.insert(model.id.clone(), messages);
    }

    let source = MessageSource::PerId(overrides);
    ctx.parallel_responses =
        parallel::run(http, &ctx.pool, &ctx.enabled_models, &source, &ctx.cancellation).await?;
    Ok(())
}

/// Parallel fan-out requiring the `[思考]...[/思考][最終回答]...` format,
/// splitting each reply into `thought` and `content` after the round
/// completes.
pub async fn execute_deep_thought(http: &reqwest::Client, ctx: &mut AgentContext) -> Result<()> {
    if ctx.enabled_models.is_empty() {
        return Err(crate::error::Error::NoEnabledModels);
    }
    let mut messages = ctx.llm_messages.clone();
    messages.push(Message::system(
        "Respond strictly in this format: [思考]<your reasoning>[/思考][最終回答]<your final answer>",
    ));
    let source = MessageSource::Shared(&messages);
    let raw_replies =
        parallel::run(http, &ctx.pool, &ctx.enabled_models, &source, &ctx.cancellation).await?;

    ctx.parallel_responses = raw_replies
        .into_iter()
        .map(|reply| {
            if let Some(captures) = deep_thought_pattern().captures(&reply.content) {
                let thought = captures.get(1).map(|m| m.as_str().trim().to_string());
                let answer = captures
                    .get(2)
                    .map(|m| m.as_str().trim().to_string())
                    .unwrap_or_default();
                ModelReply {
                    model: reply.model,
                    provider: reply.provider,
                    content: answer,
                    thought,
                }
            } else {
                ModelReply {
                    thought: Some("(extraction failed)".to_string()),
                    ..reply
                }
            }
        })
        .collect();
    Ok(())
}

/// Parallel fan-out of all enabled models with the unchanged history,
/// producing draft answers for `execute_critics` to review.
pub async fn execute_generators(http: &reqwest::Client, ctx: &mut AgentContext) -> Result<()> {
    if ctx.enabled_models.is_empty() {
        return Err(crate::error::Error::NoEnabledModels);
    }
    let source = MessageSource::Shared(&ctx.llm_messages);
    ctx.parallel_responses =
        parallel::run(http, &ctx.pool, &ctx.enabled_models, &source, &ctx.cancellation).await?;
    Ok(())
}

/// Parallel fan-out asking each enabled model to critique the drafts in
/// `parallelResponses`.
pub async fn execute_critics(http: &reqwest::Client, ctx: &mut AgentContext) -> Result<()> {
    if ctx.enabled_models.is_empty() {
        return Err(crate::error::Error::NoEnabledModels);
    }
    let question = ctx
        .llm_messages
        .last()
        .map(|m| m.content.clone())
        .unwrap_or_default();
    let drafts = format_drafts(&ctx.parallel_responses);
    let mut prompt = ctx.llm_messages.clone();
    prompt.push(Message::user(format!(
        "Original question: {}\n\nDrafts to critique:\n{}\n\nProvide a critique of each draft.",
        question, drafts
    )));
    let source = MessageSource::Shared(&prompt);
    ctx.critiques =
        parallel::run(http, &ctx.pool, &ctx.enabled_models, &source, &ctx.cancellation).await?;
    Ok(())
}

/// Buffered integrator call producing a strategic system instruction,
/// prepended to history. Does not run inference itself.
pub async fn execute_router(http: &reqwest::Client, ctx: &mut AgentContext) -> Result<()> {
    let spec = integrator_spec(ctx.app_config.integrator(), "router");
    let mut prompt = ctx.llm_messages.clone();
    prompt.push(Message::user(
        "Respond with a single strategic system instruction that should guide how a team of expert models handles this request. No prose beyond the instruction itself.",
    ));
    let instruction =
        integration::call_buffered(http, &ctx.pool, &spec, &prompt, &ctx.cancellation).await?;
    ctx.llm_messages.insert(0, Message::system(instruction));
    Ok(())
}

/// Round-robin assigns each planned subtask to an enabled model, synthesising
/// virtual ModelSpec copies when a model receives more than one subtask.
pub async fn execute_subtasks(http: &reqwest::Client, ctx: &mut AgentContext) -> Result<()> {
    if ctx.enabled_models.is_empty() {
        return Err(crate::error::Error::NoEnabledModels);
    }

    let mut virtual_specs = Vec::with_capacity(ctx.sub_tasks.len());
    let mut overrides = HashMap::new();

    for (index, subtask) in ctx.sub_tasks.iter().enumerate() {
        let base = &ctx.enabled_models[index % ctx.enabled_models.len()];
        let virtual_spec = base.with_virtual_id(&format!("subtask_{}", index));
        let mut messages = ctx.llm_messages.clone();
        messages.push(Message::user(subtask.clone()));
        overrides.insert(virtual_spec.id.clone(), messages);
        virtual_specs.push(virtual_spec);
    }

    let source = MessageSource::PerId(overrides);
    ctx.parallel_responses =
        parallel::run(http, &ctx.pool, &virtual_specs, &source, &ctx.cancellation).await?;
    Ok(())
}

/// Launches an analyser fan-out (first enabled model, emotion/tone prompt)
/// concurrently with a standard answer fan-out; falls back to the analyser's
/// own output as the answer if the answer fan-out yields nothing.
pub async fn execute_emotion_analysis(http: &reqwest::Client, ctx: &mut AgentContext) -> Result<()> {
    let analyser = ctx
        .enabled_models
        .first()
        .cloned()
        .ok_or(crate::error::Error::NoEnabledModels)?;

    let mut analyser_prompt = ctx.llm_messages.clone();
    analyser_prompt.push(Message::user(
        "Respond with a strict JSON object {\"emotion\": ..., \"tone\": ...} describing the emotional content and tone of the user's message. No prose, no code fences.",
    ));

    let analyser_source = MessageSource::Shared(&analyser_prompt);
    let answer_source = MessageSource::Shared(&ctx.llm_messages);

    let (analysis_result, answer_result) = tokio::join!(
        parallel::run(
            http,
            &ctx.pool,
            std::slice::from_ref(&analyser),
            &analyser_source,
            &ctx.cancellation,
        ),
        parallel::run(
            http,
            &ctx.pool,
            &ctx.enabled_models,
            &answer_source,
            &ctx.cancellation,
        )
    );

    ctx.critiques = analysis_result.unwrap_or_default();

    ctx.parallel_responses = match answer_result {
        Ok(replies) if !replies.is_empty() => replies,
        _ => ctx.critiques.clone(),
    };
    Ok(())
}

fn format_drafts(replies: &[ModelReply]) -> String {
    replies
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. ({}) {}", i + 1, r.model, r.content))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deep_thought_pattern_extracts_both_sections() {
        let text = "[思考]reasoning here[/思考][最終回答]the answer";
        let captures = deep_thought_pattern().captures(text).unwrap();
        assert_eq!(captures.get(1).unwrap().as_str(), "reasoning here");
        assert_eq!(captures.get(2).unwrap().as_str(), "the answer");
    }

    #[test]
    fn test_deep_thought_pattern_no_match_on_plain_text() {
        assert!(deep_thought_pattern().captures("just an answer").is_none());
    }

    #[test]
    fn test_format_drafts_numbers_entries() {
        let replies = vec![ModelReply::new("a", "one"), ModelReply::new("b", "two")];
        let formatted = format_drafts(&replies);
        assert!(formatted.starts_with("1. (a) one"));
        assert!(formatted.contains("2. (b) two"));
    }
}
