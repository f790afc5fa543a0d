//! Axum HTTP transport. Grounded in `querymt-service`'s `main.rs` shape: a
//! single-binary Axum app with `TraceLayer`/`CorsLayer` and a streaming
//! response body built from a channel rather than buffering the whole reply.

use crate::error::Error;
use crate::orchestrator;
use crate::protocol::Frame;
use crate::types::RequestEnvelope;
use axum::body::Body;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use futures::{Stream, StreamExt};
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Process-wide state: the shared HTTP client used for every backend call
/// and the seed credential list parsed once at startup.
pub struct AppState {
    pub http: reqwest::Client,
    pub api_keys: Vec<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(orchestrate_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn orchestrate_handler(
    State(state): State<Arc<AppState>>,
    envelope: Result<Json<RequestEnvelope>, axum::extract::rejection::JsonRejection>,
) -> Response {
    let envelope = match envelope {
        Ok(Json(envelope)) => envelope,
        Err(rejection) => {
            return (StatusCode::BAD_REQUEST, rejection.body_text()).into_response();
        }
    };

    if let Err(e) = orchestrator::validate_envelope(&envelope) {
        return pre_stream_error_response(e);
    }

    if state.api_keys.is_empty() {
        return pre_stream_error_response(Error::config("no API keys configured"));
    }

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<Frame>();
    let cancellation = CancellationToken::new();
    let http = state.http.clone();
    let api_keys = state.api_keys.clone();
    let guard = cancellation.clone();

    tokio::spawn(async move {
        let _ = orchestrator::run(&http, api_keys, envelope, tx, cancellation).await;
    });

    let byte_stream = UnboundedReceiverStream::new(rx)
        .map(|frame: Frame| Ok::<_, Infallible>(axum::body::Bytes::from(frame.encode())));

    let body = Body::from_stream(CancelOnDrop {
        inner: byte_stream,
        guard,
    });

    Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "text/plain; charset=utf-8")
        .body(body)
        .unwrap()
}

fn pre_stream_error_response(err: Error) -> Response {
    let status = err
        .pre_stream_status()
        .unwrap_or(500);
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, err.to_string()).into_response()
}

/// Cancels the orchestrator's in-flight work when the response body stream
/// is dropped before completion (client disconnect).
struct CancelOnDrop<S> {
    inner: S,
    guard: CancellationToken,
}

impl<S: Stream + Unpin> Stream for CancelOnDrop<S> {
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl<S> Drop for CancelOnDrop<S> {
    fn drop(&mut self) {
        self.guard.cancel();
    }
}
