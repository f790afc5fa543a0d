//! Steps that ask the integrator model to produce a structured plan before
//! any fan-out runs.

use crate::context::AgentContext;
use crate::error::Result;
use crate::integration;
use crate::types::{Message, ModelRoleConfig, ModelSpec};

fn integrator_spec(role: ModelRoleConfig, id: &str) -> ModelSpec {
    ModelSpec {
        id: id.to_string(),
        model_name: role.model_name.unwrap_or_else(|| "llama-3.3-70b".to_string()),
        temperature: role.temperature.unwrap_or(0.3),
        max_output_tokens: role.max_output_tokens,
        enabled: true,
        role: None,
    }
}

/// Strips a leading/trailing Markdown code fence, if present, then attempts
/// to parse the remainder as a JSON array of strings. On any failure the raw
/// text is returned as a single-element array — parse failures are never
/// promoted to a hard error.
pub(crate) fn parse_string_array_or_raw(text: &str) -> Vec<String> {
    let stripped = strip_code_fence(text);
    match serde_json::from_str::<Vec<String>>(stripped) {
        Ok(items) if !items.is_empty() => items,
        _ => vec![text.trim().to_string()],
    }
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open.strip_suffix("```").unwrap_or(without_open).trim()
}

/// Asks the integrator for a strict JSON array of actionable subtasks.
pub async fn plan_subtasks(http: &reqwest::Client, ctx: &mut AgentContext) -> Result<()> {
    let spec = integrator_spec(ctx.app_config.integrator(), "planner");
    let mut prompt = ctx.llm_messages.clone();
    prompt.push(Message::user(
        "Respond with a strict JSON array of strings, each one an actionable subtask that together accomplish the request. No prose, no code fences.",
    ));
    let text =
        integration::call_buffered(http, &ctx.pool, &spec, &prompt, &ctx.cancellation).await?;
    ctx.sub_tasks = parse_string_array_or_raw(&text);
    Ok(())
}

/// As `plan_subtasks`, but asks for exactly three competing interpretations
/// of the request and marks the context as hypothesis-driven.
pub async fn generate_hypotheses(http: &reqwest::Client, ctx: &mut AgentContext) -> Result<()> {
    let spec = integrator_spec(ctx.app_config.integrator(), "hypothesis_generator");
    let mut prompt = ctx.llm_messages.clone();
    prompt.push(Message::user(
        "Respond with a strict JSON array of exactly three strings, each a distinct interpretation of the request. No prose, no code fences.",
    ));
    let text =
        integration::call_buffered(http, &ctx.pool, &spec, &prompt, &ctx.cancellation).await?;
    ctx.sub_tasks = parse_string_array_or_raw(&text);
    ctx.is_hypothesis = true;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_json_array() {
        let result = parse_string_array_or_raw(r#"["a", "b", "c"]"#);
        assert_eq!(result, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_strips_code_fence() {
        let result = parse_string_array_or_raw("```json\n[\"a\", \"b\"]\n```");
        assert_eq!(result, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_failure_demotes_to_raw_single_element() {
        let result = parse_string_array_or_raw("not json at all");
        assert_eq!(result, vec!["not json at all"]);
    }

    #[test]
    fn test_parse_empty_array_demotes_to_raw() {
        let result = parse_string_array_or_raw("[]");
        assert_eq!(result, vec!["[]"]);
    }
}
