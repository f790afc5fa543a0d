//! Fan-out of a single inference call across enabled models, with key-pool
//! backed retry.
//!
//! Grounded in the teacher's `retry.rs` retry-loop shape, restructured around
//! a per-task attempt budget tied to `KeyPool::count()` instead of a fixed
//! exponential-backoff schedule, since a shrinking key pool must raise every
//! pending task's ceiling (monotonic max) rather than sleep-and-retry in place.

use crate::classifier::classify;
use crate::error::Error;
use crate::key_pool::KeyPool;
use crate::model_client::ModelClient;
use crate::types::{Message, ModelReply, ModelSpec};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

const MIN_RETRY: usize = 3;

/// Per-id message override, used by steps like `execute_expert_team` and
/// `execute_subtasks` where each model receives a distinct prompt.
pub enum MessageSource<'a> {
    Shared(&'a [Message]),
    PerId(HashMap<String, Vec<Message>>),
}

impl<'a> MessageSource<'a> {
    fn for_id(&self, id: &str) -> Option<Vec<Message>> {
        match self {
            MessageSource::Shared(messages) => Some(messages.to_vec()),
            MessageSource::PerId(map) => map.get(id).cloned(),
        }
    }
}

struct Task {
    spec: ModelSpec,
    attempts: usize,
    max_attempts: usize,
    failed: bool,
    result: Option<ModelReply>,
}

/// Fans out `specs` concurrently against the backend, retrying transient
/// failures within a per-task budget derived from the live key count.
///
/// Returns successful replies in the input order of `specs`. Fails with
/// `AllFailed` only if every task ultimately failed.
pub async fn run(
    http: &reqwest::Client,
    pool: &KeyPool,
    specs: &[ModelSpec],
    messages: &MessageSource<'_>,
    cancellation: &CancellationToken,
) -> crate::error::Result<Vec<ModelReply>> {
    let mut tasks: Vec<Task> = specs
        .iter()
        .map(|spec| {
            let has_messages = messages.for_id(&spec.id).is_some();
            Task {
                spec: spec.clone(),
                attempts: 0,
                max_attempts: pool.count().max(MIN_RETRY),
                failed: !has_messages,
                result: None,
            }
        })
        .collect();

    let client = ModelClient::new(http);

    while tasks
        .iter()
        .any(|t| !t.failed && t.result.is_none())
        && pool.count() > 0
        && !cancellation.is_cancelled()
    {
        let pending_indices: Vec<usize> = tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.failed && t.result.is_none())
            .map(|(i, _)| i)
            .collect();

        let mut round = Vec::with_capacity(pending_indices.len());
        for &idx in &pending_indices {
            let spec = tasks[idx].spec.clone();
            let msgs = messages.for_id(&spec.id).unwrap_or_default();
            let key = pool.next();
            let client_ref = &client;
            round.push(async move {
                let key = key?;
                let content = client_ref.call_buffered(&key, &spec, &msgs, cancellation).await;
                Ok::<_, Error>((idx, key, content))
            });
        }

        let outcomes = futures::future::join_all(round).await;

        for outcome in outcomes {
            let (idx, key, content) = match outcome {
                Ok(v) => v,
                Err(_) => continue,
            };
            tasks[idx].attempts += 1;
            match content {
                Ok(reply_text) => {
                    tasks[idx].result = Some(ModelReply::new(&tasks[idx].spec.model_name, reply_text));
                }
                Err(Error::Cancelled) => {
                    tasks[idx].failed = true;
                }
                Err(Error::Api { status, .. }) => {
                    let decision = classify(Some(status));
                    if decision.evict_key {
                        pool.evict(&key);
                        let new_count = pool.count();
                        for task in tasks.iter_mut() {
                            if !task.failed && task.result.is_none() {
                                task.max_attempts = task.max_attempts.max(task.attempts + new_count);
                            }
                        }
                    }
                    if decision.permanent && decision.drop_model {
                        tasks[idx].failed = true;
                    } else if tasks[idx].attempts >= tasks[idx].max_attempts {
                        tasks[idx].failed = true;
                    }
                }
                Err(_) => {
                    if tasks[idx].attempts >= tasks[idx].max_attempts {
                        tasks[idx].failed = true;
                    }
                }
            }
        }
    }

    let successes: Vec<ModelReply> = tasks.into_iter().filter_map(|t| t.result).collect();
    if successes.is_empty() {
        return Err(Error::all_failed("no model produced a reply"));
    }
    Ok(successes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_source_shared_applies_to_every_id() {
        let messages = vec![Message::user("hi")];
        let source = MessageSource::Shared(&messages);
        assert!(source.for_id("anything").is_some());
    }

    #[test]
    fn test_message_source_per_id_is_selective() {
        let mut map = HashMap::new();
        map.insert("a".to_string(), vec![Message::user("for a")]);
        let source = MessageSource::PerId(map);
        assert!(source.for_id("a").is_some());
        assert!(source.for_id("b").is_none());
    }
}
