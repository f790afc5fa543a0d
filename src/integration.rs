//! A single logical call with the same retry/eviction discipline as one
//! ParallelExecutor task, used for every integration, planning, and
//! summarisation call in the engine.

use crate::classifier::classify;
use crate::error::{Error, Result};
use crate::key_pool::KeyPool;
use crate::model_client::ModelClient;
use crate::protocol::Frame;
use crate::types::{Message, ModelSpec};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

const MIN_RETRY: usize = 3;

/// Runs `spec` against `messages`, retrying within a budget derived from the
/// live key count, returning the fully buffered reply text.
pub async fn call_buffered(
    http: &reqwest::Client,
    pool: &KeyPool,
    spec: &ModelSpec,
    messages: &[Message],
    cancellation: &CancellationToken,
) -> Result<String> {
    call(http, pool, spec, messages, None, cancellation).await
}

/// As `call_buffered`, but forwards each token to `sink` as it arrives.
pub async fn call_streaming(
    http: &reqwest::Client,
    pool: &KeyPool,
    spec: &ModelSpec,
    messages: &[Message],
    sink: &UnboundedSender<Frame>,
    cancellation: &CancellationToken,
) -> Result<String> {
    call(http, pool, spec, messages, Some(sink), cancellation).await
}

async fn call(
    http: &reqwest::Client,
    pool: &KeyPool,
    spec: &ModelSpec,
    messages: &[Message],
    sink: Option<&UnboundedSender<Frame>>,
    cancellation: &CancellationToken,
) -> Result<String> {
    let client = ModelClient::new(http);
    let mut attempts = 0usize;
    let mut max_attempts = pool.count().max(MIN_RETRY);

    loop {
        if cancellation.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if pool.count() == 0 {
            return Err(Error::integration_failed("key pool exhausted"));
        }
        let key = pool.next()?;
        let outcome = match sink {
            Some(sink) => {
                client
                    .call_streaming(&key, spec, messages, sink, cancellation)
                    .await
            }
            None => client.call_buffered(&key, spec, messages, cancellation).await,
        };
        attempts += 1;

        match outcome {
            Ok(text) => return Ok(text),
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(Error::Api { status, .. }) => {
                let decision = classify(Some(status));
                if decision.evict_key {
                    pool.evict(&key);
                    max_attempts = max_attempts.max(attempts + pool.count());
                }
                if decision.permanent && decision.drop_model {
                    return Err(Error::integration_failed(format!(
                        "model {} rejected the request (status {})",
                        spec.model_name, status
                    )));
                }
                if attempts >= max_attempts {
                    return Err(Error::integration_failed(format!(
                        "retry budget exhausted for model {}",
                        spec.model_name
                    )));
                }
            }
            Err(e) => {
                if attempts >= max_attempts {
                    return Err(Error::integration_failed(e.to_string()));
                }
            }
        }
    }
}
